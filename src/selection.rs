//! Format/quality negotiation
//!
//! [`FormatSelector`] holds the user's current choice and keeps it inside the
//! catalog subset for the selected media kind. Switching the media kind always
//! resets quality and extension to the defaults.

use serde::{Deserialize, Serialize};

use crate::catalog::{BEST_QUALITY, FormatCatalog};
use crate::error::{Error, Result};
use crate::types::MediaFormat;

/// The (format, quality, extension) triple sent with a submission
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Media kind
    pub format: MediaFormat,
    /// Quality label, `"best"` unless chosen in the advanced panel
    pub quality: String,
    /// Container/extension
    pub extension: String,
}

impl Selection {
    /// Default selection for a media kind: best quality, default extension
    pub fn defaults_for(format: MediaFormat) -> Self {
        Self {
            format,
            quality: BEST_QUALITY.to_string(),
            extension: format.default_extension().to_string(),
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::defaults_for(MediaFormat::Video)
    }
}

/// Selection state plus the catalog that constrains it
#[derive(Clone, Debug)]
pub struct FormatSelector {
    catalog: FormatCatalog,
    catalog_loaded: bool,
    selection: Selection,
    advanced_visible: bool,
}

impl FormatSelector {
    /// Create a selector; `None` means the catalog fetch failed
    pub fn new(catalog: Option<FormatCatalog>) -> Self {
        let catalog_loaded = catalog.is_some();
        Self {
            catalog: catalog.unwrap_or_else(FormatCatalog::fallback),
            catalog_loaded,
            selection: Selection::default(),
            advanced_visible: false,
        }
    }

    /// Current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Switch media kind, discarding any advanced choice
    pub fn set_format(&mut self, format: MediaFormat) -> &Selection {
        self.selection = Selection::defaults_for(format);
        &self.selection
    }

    /// Pick a quality from [`quality_options`](Self::quality_options)
    pub fn set_quality(&mut self, quality: &str) -> Result<&Selection> {
        let format = self.selection.format;
        if !self.accepts(self.catalog.qualities(format), quality, BEST_QUALITY) {
            return Err(Error::InvalidSelection {
                field: "quality",
                value: quality.to_string(),
                format,
            });
        }
        self.selection.quality = quality.to_string();
        Ok(&self.selection)
    }

    /// Pick an extension from [`extension_options`](Self::extension_options)
    pub fn set_extension(&mut self, extension: &str) -> Result<&Selection> {
        let format = self.selection.format;
        if !self.accepts(
            self.catalog.extensions(format),
            extension,
            format.default_extension(),
        ) {
            return Err(Error::InvalidSelection {
                field: "extension",
                value: extension.to_string(),
                format,
            });
        }
        self.selection.extension = extension.to_string();
        Ok(&self.selection)
    }

    // The default is always valid, even if a catalog omits it.
    fn accepts(&self, options: &[String], value: &str, default: &str) -> bool {
        value == default || options.iter().any(|o| o == value)
    }

    /// Quality choices for the current media kind
    pub fn quality_options(&self) -> &[String] {
        self.catalog.qualities(self.selection.format)
    }

    /// Extension choices for the current media kind
    pub fn extension_options(&self) -> &[String] {
        self.catalog.extensions(self.selection.format)
    }

    /// Whether the backend catalog loaded (otherwise options are the fallback)
    pub fn advanced_available(&self) -> bool {
        self.catalog_loaded
    }

    /// Whether the advanced panel is shown
    pub fn advanced_visible(&self) -> bool {
        self.advanced_visible
    }

    /// Show or hide the advanced panel. The selection is kept either way.
    pub fn set_advanced_visible(&mut self, visible: bool) {
        self.advanced_visible = visible;
    }
}

impl Default for FormatSelector {
    fn default() -> Self {
        Self::new(None)
    }
}
