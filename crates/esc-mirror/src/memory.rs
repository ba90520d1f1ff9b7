//! In-memory [`MirrorStore`] backend.
//!
//! One async mutex over plain maps. Used by tests and by `escd serve`
//! when no database URL is configured; state does not survive restarts.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use esc_core::{ProjectId, Timestamp, WalletAddress};
use esc_state::{
    Dispute, DisputeStatus, MilestoneSubmission, Ordinal, Project, ProjectStatus,
    SubmissionStatus,
};

use crate::error::StoreError;
use crate::store::{MirrorCounts, MirrorStore, ReviewOutcome};

#[derive(Debug, Default)]
struct Inner {
    projects: HashMap<ProjectId, Project>,
    submissions: Vec<MilestoneSubmission>,
    disputes: Vec<Dispute>,
}

/// In-memory mirror store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MirrorStore for MemoryStore {
    async fn insert_project(&self, project: &Project) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.projects.insert(project.id, project.clone());
        Ok(())
    }

    async fn project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.projects.get(&id).cloned())
    }

    async fn update_project(&self, project: &Project) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.projects.insert(project.id, project.clone());
        Ok(())
    }

    async fn projects_for_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<Project>, StoreError> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<Project> = inner
            .projects
            .values()
            .filter(|p| &p.client == wallet || p.freelancer.as_ref() == Some(wallet))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn all_projects(&self) -> Result<Vec<Project>, StoreError> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<Project> = inner.projects.values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn abandoned_projects(&self, cutoff: Timestamp) -> Result<Vec<Project>, StoreError> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<Project> = inner
            .projects
            .values()
            .filter(|p| p.status == ProjectStatus::Active && p.updated_at < cutoff)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        Ok(rows)
    }

    async fn insert_submission(
        &self,
        submission: &MilestoneSubmission,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.submissions.push(submission.clone());
        Ok(())
    }

    async fn submissions(
        &self,
        project: ProjectId,
        ordinal: Option<Ordinal>,
    ) -> Result<Vec<MilestoneSubmission>, StoreError> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<MilestoneSubmission> = inner
            .submissions
            .iter()
            .filter(|s| s.project_id == project && ordinal.map_or(true, |o| s.ordinal == o))
            .cloned()
            .collect();
        rows.sort_by_key(|s| (s.submitted_at, s.id));
        Ok(rows)
    }

    async fn review_submission(
        &self,
        reviewed: &MilestoneSubmission,
    ) -> Result<ReviewOutcome, StoreError> {
        let mut inner = self.inner.lock().await;
        let stored = inner
            .submissions
            .iter_mut()
            .find(|s| s.id == reviewed.id)
            .ok_or_else(|| {
                StoreError::Corrupt(format!("submission {} vanished mid-review", reviewed.id))
            })?;
        if stored.status != SubmissionStatus::Submitted {
            return Ok(ReviewOutcome::Stale(stored.status));
        }
        *stored = reviewed.clone();
        Ok(ReviewOutcome::Applied)
    }

    async fn insert_dispute(&self, dispute: &Dispute) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let already_open = inner.disputes.iter().any(|d| {
            d.project_id == dispute.project_id
                && d.ordinal == dispute.ordinal
                && d.status == DisputeStatus::Open
        });
        if already_open {
            return Err(StoreError::OpenDisputeExists {
                ordinal: dispute.ordinal,
            });
        }
        inner.disputes.push(dispute.clone());
        Ok(())
    }

    async fn update_dispute(&self, dispute: &Dispute) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.disputes.iter_mut().find(|d| d.id == dispute.id) {
            Some(stored) => {
                *stored = dispute.clone();
                Ok(())
            }
            None => Err(StoreError::Corrupt(format!(
                "dispute {} vanished mid-update",
                dispute.id
            ))),
        }
    }

    async fn disputes(&self, project: ProjectId) -> Result<Vec<Dispute>, StoreError> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<Dispute> = inner
            .disputes
            .iter()
            .filter(|d| d.project_id == project)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.filed_at.cmp(&a.filed_at));
        Ok(rows)
    }

    async fn open_dispute(
        &self,
        project: ProjectId,
        ordinal: Ordinal,
    ) -> Result<Option<Dispute>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .disputes
            .iter()
            .find(|d| {
                d.project_id == project
                    && d.ordinal == ordinal
                    && d.status == DisputeStatus::Open
            })
            .cloned())
    }

    async fn counts(&self) -> Result<MirrorCounts, StoreError> {
        let inner = self.inner.lock().await;
        let mut counts = MirrorCounts {
            total_projects: inner.projects.len() as u64,
            ..MirrorCounts::default()
        };
        for p in inner.projects.values() {
            match p.status {
                ProjectStatus::Open => counts.open += 1,
                ProjectStatus::Active => counts.active += 1,
                ProjectStatus::Completed => counts.completed += 1,
                ProjectStatus::Refunded => counts.refunded += 1,
                // Never stored; counted via open dispute rows below.
                ProjectStatus::Disputed => {}
            }
        }
        counts.open_disputes = inner
            .disputes
            .iter()
            .filter(|d| d.status == DisputeStatus::Open)
            .count() as u64;
        Ok(counts)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use esc_core::{Amount, TokenKind, TxId};
    use esc_state::Milestone;

    fn addr(s: &str) -> WalletAddress {
        WalletAddress::new(s).unwrap()
    }

    fn at(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn make_project(created: &str) -> Project {
        let milestones =
            Ordinal::ALL.map(|o| Milestone::new(o, format!("M{o}"), Amount::micro(25)));
        Project::new(
            addr("ST1CLIENT"),
            Some(addr("ST1FREELANCER")),
            "Site build",
            "d",
            "c",
            TokenKind::Native,
            Amount::micro(100),
            milestones,
            at(created),
        )
        .unwrap()
    }

    fn o(n: u8) -> Ordinal {
        Ordinal::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_project_roundtrip_and_wallet_filter() {
        let store = MemoryStore::new();
        let p = make_project("2026-01-15T12:00:00Z");
        store.insert_project(&p).await.unwrap();

        let fetched = store.project(p.id).await.unwrap().unwrap();
        assert_eq!(fetched, p);

        let by_client = store.projects_for_wallet(&addr("ST1CLIENT")).await.unwrap();
        assert_eq!(by_client.len(), 1);
        let by_freelancer = store
            .projects_for_wallet(&addr("ST1FREELANCER"))
            .await
            .unwrap();
        assert_eq!(by_freelancer.len(), 1);
        let by_stranger = store.projects_for_wallet(&addr("ST1OTHER")).await.unwrap();
        assert!(by_stranger.is_empty());
    }

    #[tokio::test]
    async fn test_submissions_filter_by_ordinal() {
        let store = MemoryStore::new();
        let p = make_project("2026-01-15T12:00:00Z");
        let s1 = MilestoneSubmission::new(
            p.id,
            o(1),
            "https://x/1",
            None,
            None,
            at("2026-01-15T13:00:00Z"),
        )
        .unwrap();
        let s2 = MilestoneSubmission::new(
            p.id,
            o(2),
            "https://x/2",
            None,
            None,
            at("2026-01-15T14:00:00Z"),
        )
        .unwrap();
        store.insert_submission(&s1).await.unwrap();
        store.insert_submission(&s2).await.unwrap();

        let all = store.submissions(p.id, None).await.unwrap();
        assert_eq!(all.len(), 2);
        let only_m1 = store.submissions(p.id, Some(o(1))).await.unwrap();
        assert_eq!(only_m1.len(), 1);
        assert_eq!(only_m1[0].id, s1.id);
    }

    #[tokio::test]
    async fn test_review_cas_rejects_second_reviewer() {
        let store = MemoryStore::new();
        let p = make_project("2026-01-15T12:00:00Z");
        let s = MilestoneSubmission::new(
            p.id,
            o(1),
            "https://x/1",
            None,
            None,
            at("2026-01-15T13:00:00Z"),
        )
        .unwrap();
        store.insert_submission(&s).await.unwrap();

        let mut approved = s.clone();
        approved
            .approve(TxId::accepted("0xrel"), at("2026-01-15T14:00:00Z"))
            .unwrap();
        assert_eq!(
            store.review_submission(&approved).await.unwrap(),
            ReviewOutcome::Applied
        );

        // A racing reject sees the approval that already landed.
        let mut rejected = s.clone();
        rejected.status = SubmissionStatus::Rejected;
        assert_eq!(
            store.review_submission(&rejected).await.unwrap(),
            ReviewOutcome::Stale(SubmissionStatus::Approved)
        );
    }

    #[tokio::test]
    async fn test_one_open_dispute_per_ordinal() {
        let store = MemoryStore::new();
        let p = make_project("2026-01-15T12:00:00Z");
        let d1 = Dispute::file(
            p.id,
            o(2),
            "bad work",
            None,
            addr("ST1CLIENT"),
            TxId::accepted("0xd1"),
            at("2026-01-16T09:00:00Z"),
        );
        store.insert_dispute(&d1).await.unwrap();

        let d2 = Dispute::file(
            p.id,
            o(2),
            "also bad",
            None,
            addr("ST1FREELANCER"),
            TxId::accepted("0xd2"),
            at("2026-01-16T10:00:00Z"),
        );
        let err = store.insert_dispute(&d2).await.unwrap_err();
        assert!(matches!(err, StoreError::OpenDisputeExists { .. }));

        // A different ordinal is fine.
        let d3 = Dispute::file(
            p.id,
            o(3),
            "separate issue",
            None,
            addr("ST1CLIENT"),
            TxId::accepted("0xd3"),
            at("2026-01-16T11:00:00Z"),
        );
        store.insert_dispute(&d3).await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_dispute_frees_the_ordinal() {
        let store = MemoryStore::new();
        let p = make_project("2026-01-15T12:00:00Z");
        let mut d = Dispute::file(
            p.id,
            o(1),
            "reason",
            None,
            addr("ST1CLIENT"),
            TxId::accepted("0xd1"),
            at("2026-01-16T09:00:00Z"),
        );
        store.insert_dispute(&d).await.unwrap();
        assert!(store.open_dispute(p.id, o(1)).await.unwrap().is_some());

        d.reset(
            esc_core::AdminId::new(),
            "withdrawn",
            TxId::accepted("0xsettle"),
            at("2026-01-16T10:00:00Z"),
        )
        .unwrap();
        store.update_dispute(&d).await.unwrap();
        assert!(store.open_dispute(p.id, o(1)).await.unwrap().is_none());

        // And a fresh dispute may now be filed on the same ordinal.
        let again = Dispute::file(
            p.id,
            o(1),
            "new grievance",
            None,
            addr("ST1FREELANCER"),
            TxId::accepted("0xd2"),
            at("2026-01-16T11:00:00Z"),
        );
        store.insert_dispute(&again).await.unwrap();
    }

    #[tokio::test]
    async fn test_abandoned_projects_staleness_window() {
        let store = MemoryStore::new();
        let mut stale = make_project("2026-01-01T00:00:00Z");
        stale
            .mark_funded(
                esc_core::OnChainProjectId(1),
                TxId::accepted("0xf"),
                at("2026-01-01T00:00:00Z"),
            )
            .unwrap();
        let mut fresh = make_project("2026-01-14T00:00:00Z");
        fresh
            .mark_funded(
                esc_core::OnChainProjectId(2),
                TxId::accepted("0xf2"),
                at("2026-01-14T00:00:00Z"),
            )
            .unwrap();
        let unfunded = make_project("2026-01-01T00:00:00Z");
        store.insert_project(&stale).await.unwrap();
        store.insert_project(&fresh).await.unwrap();
        store.insert_project(&unfunded).await.unwrap();

        let cutoff = at("2026-01-15T00:00:00Z").days_ago(7);
        let abandoned = store.abandoned_projects(cutoff).await.unwrap();
        assert_eq!(abandoned.len(), 1);
        assert_eq!(abandoned[0].id, stale.id);
    }

    #[tokio::test]
    async fn test_counts() {
        let store = MemoryStore::new();
        let open = make_project("2026-01-15T12:00:00Z");
        let mut active = make_project("2026-01-15T12:00:00Z");
        active
            .mark_funded(
                esc_core::OnChainProjectId(1),
                TxId::accepted("0xf"),
                at("2026-01-15T13:00:00Z"),
            )
            .unwrap();
        store.insert_project(&open).await.unwrap();
        store.insert_project(&active).await.unwrap();

        let counts = store.counts().await.unwrap();
        assert_eq!(counts.total_projects, 2);
        assert_eq!(counts.open, 1);
        assert_eq!(counts.active, 1);
        assert_eq!(counts.open_disputes, 0);
    }
}
