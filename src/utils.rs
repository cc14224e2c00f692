//! Utility functions for filenames, paths and display formatting

use crate::config::FileCollisionAction;
use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Maximum length of a sanitized filename stem, in characters
const MAX_STEM_CHARS: usize = 200;

/// Create a new file at `path`, handling collisions according to the specified action
///
/// For Rename, `name.ext` becomes `name (1).ext`, `name (2).ext`, and so on.
/// For Skip, an existing file is an error. Overwrite truncates any existing file.
///
/// Rename and Skip open with `create_new`, so the existence check and the
/// creation are one filesystem operation and two concurrent callers never get
/// the same path.
///
/// # Examples
///
/// ```
/// use media_dl::utils::create_unique_file;
/// use media_dl::config::FileCollisionAction;
///
/// # #[tokio::main]
/// # async fn main() -> media_dl::Result<()> {
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("Song.mp3");
/// let (_first, first_path) = create_unique_file(&path, FileCollisionAction::Rename).await?;
/// let (_second, second_path) = create_unique_file(&path, FileCollisionAction::Rename).await?;
/// assert_eq!(first_path, path);
/// assert_eq!(second_path, dir.path().join("Song (1).mp3"));
/// # Ok(())
/// # }
/// ```
pub async fn create_unique_file(
    path: &Path,
    action: FileCollisionAction,
) -> Result<(File, PathBuf)> {
    match action {
        FileCollisionAction::Overwrite => Ok((File::create(path).await?, path.to_path_buf())),
        FileCollisionAction::Skip => match create_new(path).await? {
            Some(file) => Ok((file, path.to_path_buf())),
            None => Err(Error::FileCollision {
                path: path.to_path_buf(),
            }),
        },
        FileCollisionAction::Rename => {
            if let Some(file) = create_new(path).await? {
                return Ok((file, path.to_path_buf()));
            }

            for i in 1..=MAX_RENAME_ATTEMPTS {
                let candidate = numbered_path(path, i);
                if let Some(file) = create_new(&candidate).await? {
                    return Ok((file, candidate));
                }
            }

            Err(Error::FileCollision {
                path: path.to_path_buf(),
            })
        }
    }
}

/// Open `path` only if it does not exist yet; `None` when it already does
async fn create_new(path: &Path) -> Result<Option<File>> {
    match OpenOptions::new().write(true).create_new(true).open(path).await {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn numbered_path(path: &Path, i: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("download");
    let new_name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{} ({}).{}", stem, i, ext),
        None => format!("{} ({})", stem, i),
    };
    path.with_file_name(new_name)
}

/// Make a title safe to use as a filename stem
///
/// Removes `<>:"/\|?*` and control characters, collapses whitespace runs to a
/// single space, trims, and caps the result at 200 characters. May return an
/// empty string.
///
/// # Examples
///
/// ```
/// use media_dl::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename("AC/DC:  Back in Black?"), "ACDC Back in Black");
/// ```
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;

    for c in name.chars() {
        if matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || c.is_control()
        {
            // Tabs and newlines are whitespace first, control characters second.
            if c.is_whitespace() {
                pending_space = true;
            }
            continue;
        }
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }

    out.chars().take(MAX_STEM_CHARS).collect::<String>().trim_end().to_string()
}

/// Format a duration in whole seconds for display
///
/// `45` becomes `"45s"`, `125` becomes `"2m 5s"`.
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{}s", seconds);
    }
    format!("{}m {}s", seconds / 60, seconds % 60)
}
