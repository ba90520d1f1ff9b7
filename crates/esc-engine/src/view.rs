//! Read-side projections.
//!
//! A [`ProjectView`] is the fully derived picture of one project: every
//! milestone's projected status, the "current" submission per ordinal,
//! and the display status with the `DISPUTED` overlay applied. Building
//! a view is pure — it reads rows, it never writes them.

use serde::Serialize;

use esc_state::{
    derive_status, Dispute, DisputeStatus, MilestoneStatus, MilestoneSubmission, Ordinal,
    Project, ProjectStatus,
};

/// One milestone with its derived status and current submission.
#[derive(Debug, Clone, Serialize)]
pub struct MilestoneView {
    pub ordinal: Ordinal,
    pub title: String,
    pub amount: esc_core::Amount,
    pub status: MilestoneStatus,
    pub refund_tx_id: Option<esc_core::TxId>,
    /// Most recent submission row for this ordinal, if any.
    pub latest_submission: Option<MilestoneSubmission>,
}

/// A project with all four milestone projections applied.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    pub project: Project,
    /// Display status, `DISPUTED` overlaid when an open dispute exists.
    pub status: ProjectStatus,
    pub milestones: Vec<MilestoneView>,
    pub open_disputes: usize,
}

/// Build the derived view of one project from its rows.
pub fn project_view(
    project: Project,
    submissions: &[MilestoneSubmission],
    disputes: &[Dispute],
) -> ProjectView {
    let open: Vec<&Dispute> = disputes
        .iter()
        .filter(|d| d.status == DisputeStatus::Open)
        .collect();

    let milestones = Ordinal::ALL
        .iter()
        .map(|&ordinal| {
            let milestone = project.milestone(ordinal);
            let latest = MilestoneSubmission::latest(
                submissions.iter().filter(|s| s.ordinal == ordinal),
            );
            let has_open_dispute = open.iter().any(|d| d.ordinal == ordinal);
            MilestoneView {
                ordinal,
                title: milestone.title.clone(),
                amount: milestone.amount,
                status: derive_status(project.status, milestone, has_open_dispute, latest),
                refund_tx_id: milestone.refund_tx_id.clone(),
                latest_submission: latest.cloned(),
            }
        })
        .collect();

    let status = project.display_status(open.len());
    ProjectView {
        project,
        status,
        milestones,
        open_disputes: open.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esc_core::{Amount, Timestamp, TokenKind, TxId, WalletAddress};
    use esc_state::Milestone;

    fn at(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn make_active_project() -> Project {
        let milestones =
            Ordinal::ALL.map(|o| Milestone::new(o, format!("M{o}"), Amount::micro(25)));
        let mut p = Project::new(
            WalletAddress::new("ST1CLIENT").unwrap(),
            Some(WalletAddress::new("ST1FREELANCER").unwrap()),
            "t",
            "d",
            "c",
            TokenKind::Native,
            Amount::micro(100),
            milestones,
            at("2026-01-15T12:00:00Z"),
        )
        .unwrap();
        p.mark_funded(
            esc_core::OnChainProjectId(1),
            TxId::accepted("0xfund"),
            at("2026-01-15T13:00:00Z"),
        )
        .unwrap();
        p
    }

    #[test]
    fn test_view_projects_all_four_ordinals() {
        let p = make_active_project();
        let view = project_view(p, &[], &[]);
        assert_eq!(view.milestones.len(), 4);
        assert!(view
            .milestones
            .iter()
            .all(|m| m.status == MilestoneStatus::Pending));
        assert_eq!(view.status, ProjectStatus::Active);
    }

    #[test]
    fn test_open_dispute_overlays_project_and_milestone() {
        let p = make_active_project();
        let d = Dispute::file(
            p.id,
            Ordinal::new(2).unwrap(),
            "reason",
            None,
            p.client.clone(),
            TxId::accepted("0xd"),
            at("2026-01-16T09:00:00Z"),
        );
        let view = project_view(p, &[], &[d]);
        assert_eq!(view.status, ProjectStatus::Disputed);
        assert_eq!(view.milestones[1].status, MilestoneStatus::Disputed);
        assert_eq!(view.milestones[0].status, MilestoneStatus::Pending);
        assert_eq!(view.open_disputes, 1);
    }

    #[test]
    fn test_latest_submission_drives_status() {
        let p = make_active_project();
        let s1 = MilestoneSubmission::new(
            p.id,
            Ordinal::new(1).unwrap(),
            "https://x/1",
            None,
            None,
            at("2026-01-16T09:00:00Z"),
        )
        .unwrap();
        let mut rejected = s1.clone();
        rejected.reject(at("2026-01-16T10:00:00Z")).unwrap();
        let s2 = MilestoneSubmission::new(
            p.id,
            Ordinal::new(1).unwrap(),
            "https://x/2",
            None,
            None,
            at("2026-01-16T11:00:00Z"),
        )
        .unwrap();
        let view = project_view(p, &[rejected, s2.clone()], &[]);
        assert_eq!(view.milestones[0].status, MilestoneStatus::Submitted);
        assert_eq!(
            view.milestones[0].latest_submission.as_ref().map(|s| s.id),
            Some(s2.id)
        );
    }
}
