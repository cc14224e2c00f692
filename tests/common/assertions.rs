//! Waiting helpers for session state

use media_dl::{DownloadJob, DownloadSession, JobId};
use std::time::Duration;

/// Wait until job `id` is present in the session's store and satisfies `predicate`
///
/// Returns the matching job, or `None` on timeout.
pub async fn wait_for_job(
    session: &DownloadSession,
    id: &JobId,
    timeout: Duration,
    predicate: impl Fn(&DownloadJob) -> bool,
) -> Option<DownloadJob> {
    let mut jobs = session.subscribe();

    tokio::time::timeout(timeout, async {
        jobs.wait_for(|snapshot| snapshot.get(id).is_some_and(&predicate))
            .await
            .ok()
            .and_then(|snapshot| snapshot.get(id).cloned())
    })
    .await
    .ok()
    .flatten()
}
