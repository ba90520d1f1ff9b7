//! Polling refresh subscriptions.
//!
//! Two flavors, both built on the same watch-channel shape: a
//! per-project subscription that re-reads one project's submissions and
//! disputes for an observer's UI, and an aggregate counts loop for the
//! operator dashboard. Each subscription owns its own task; there is no
//! global timer. A missed tick is overwritten by the next one, so slow
//! consumers only ever see fresh data. Dropping the handle cancels the
//! loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use esc_core::{Caller, ProjectId, Timestamp};
use esc_mirror::MirrorCounts;
use esc_state::{Dispute, MilestoneSubmission};

use crate::engine::Engine;

/// Default polling interval.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// One poll of a single project's review-relevant rows.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ProjectSnapshot {
    pub taken_at: Option<Timestamp>,
    pub submissions: Vec<MilestoneSubmission>,
    pub disputes: Vec<Dispute>,
}

/// One poll of the mirror's aggregate counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Snapshot {
    pub taken_at: Timestamp,
    pub counts: MirrorCounts,
}

/// Owns the polling task; aborts it on drop or explicit [`cancel`].
///
/// [`cancel`]: RefreshHandle::cancel
#[derive(Debug)]
pub struct RefreshHandle {
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Stop the polling loop.
    pub fn cancel(self) {
        self.task.abort();
    }

    /// Alias kept for call sites that read better as a shutdown.
    pub fn stop(self) {
        self.cancel();
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Subscribe an observer to one project's submissions and disputes.
///
/// Polls are plain reads through the engine's query surface, so the
/// caller's authorization applies on every tick; a caller who loses
/// access (or a deleted project) surfaces as a logged poll failure with
/// the previous snapshot staying current.
pub fn watch_project(
    engine: Arc<Engine>,
    caller: Caller,
    id: ProjectId,
    interval: Duration,
) -> (watch::Receiver<ProjectSnapshot>, RefreshHandle) {
    let (tx, rx) = watch::channel(ProjectSnapshot::default());

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let poll = async {
                let submissions = engine.submissions(&caller, id, None).await?;
                let disputes = engine.disputes(&caller, id).await?;
                Ok::<_, crate::error::EngineError>((submissions, disputes))
            };
            match poll.await {
                Ok((submissions, disputes)) => {
                    let snapshot = ProjectSnapshot {
                        taken_at: Some(Timestamp::now()),
                        submissions,
                        disputes,
                    };
                    // Send fails only when every receiver is gone.
                    if tx.send(snapshot).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(project = %id, error = %e, "project refresh poll failed");
                }
            }
        }
    });

    (rx, RefreshHandle { task })
}

/// Start the aggregate counts loop and subscribe to its snapshots.
///
/// The first snapshot is published on the interval's immediate first
/// tick; store failures are logged and the previous snapshot stays
/// current until the next successful poll.
pub fn subscribe(
    engine: Arc<Engine>,
    interval: Duration,
) -> (watch::Receiver<Snapshot>, RefreshHandle) {
    let initial = Snapshot {
        taken_at: Timestamp::now(),
        counts: MirrorCounts::default(),
    };
    let (tx, rx) = watch::channel(initial);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match engine.counts_unchecked().await {
                Ok(counts) => {
                    let snapshot = Snapshot {
                        taken_at: Timestamp::now(),
                        counts,
                    };
                    if tx.send(snapshot).is_err() {
                        tracing::debug!("all refresh subscribers dropped; stopping loop");
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "dashboard refresh poll failed");
                }
            }
        }
    });

    (rx, RefreshHandle { task })
}
