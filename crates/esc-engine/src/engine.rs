//! Write-path coordination: validate, then ledger, then mirror.
//!
//! ## Recovery Protocol
//!
//! A milestone submission is a two-step saga: the ledger accepts the
//! freelancer's "complete" call, then the mirror records the submission
//! row. If the process dies between the two steps, the ledger holds a
//! completion the mirror never saw. On the next submission attempt for
//! that ordinal the engine:
//!
//! 1. reuses a `completion_tx_id` from any prior row for the ordinal,
//!    skipping the ledger call entirely (the transfer already happened —
//!    calling again would only be rejected); or
//! 2. calls the ledger and, if it answers "already complete", records a
//!    synthesized `recovered:` marker instead of failing.
//!
//! Either way exactly one new submission row is written and the ledger
//! is never asked to complete the same ordinal twice on the engine's
//! initiative.

use std::sync::Arc;

use esc_core::{
    AdminId, Amount, Caller, ProjectId, Role, Timestamp, TokenKind, TxId, WalletAddress,
};
use esc_ledger::{LedgerError, LedgerGateway};
use esc_mirror::{MirrorCounts, MirrorStore, ReviewOutcome};
use esc_state::{
    check_transition, derive_status, Dispute, Milestone, MilestoneAction, MilestoneStatus,
    MilestoneSubmission, Ordinal, Project, StateError, SubmissionStatus, MILESTONE_COUNT,
};

use crate::error::EngineError;
use crate::view::{self, ProjectView};

/// An `ACTIVE` project with no mirror write for this many days is
/// considered abandoned and surfaced to administrators.
pub const ABANDONED_AFTER_DAYS: i64 = 7;

/// Deliverable reference recorded when an admin releases a milestone
/// that has no reviewable submission row.
const FORCE_RELEASE_DELIVERABLE: &str = "admin:force-release";

/// One milestone in a project creation request.
#[derive(Debug, Clone)]
pub struct MilestoneDraft {
    pub title: String,
    pub amount: Amount,
}

/// A project creation request, already validated at the transport edge.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub freelancer: Option<WalletAddress>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub token: TokenKind,
    pub milestones: [MilestoneDraft; MILESTONE_COUNT],
}

/// A client's verdict on a submitted milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    /// Release the escrowed amount to the freelancer.
    Approve,
    /// Send the milestone back for rework. Mirror-only.
    Reject,
}

/// How an admin settles a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Funds go to the freelancer.
    Release,
    /// Funds go back to the client.
    Refund,
}

/// The reconciliation engine.
///
/// Cheap to clone via the shared trait objects; the API layer holds one
/// in its application state.
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn MirrorStore>,
    ledger: Arc<dyn LedgerGateway>,
}

impl Engine {
    pub fn new(store: Arc<dyn MirrorStore>, ledger: Arc<dyn LedgerGateway>) -> Self {
        Self { store, ledger }
    }

    // ─── Project Lifecycle ───────────────────────────────────────────

    /// Create a project in `OPEN` status. No ledger interaction — the
    /// escrow is only funded by [`Engine::fund_project`].
    #[tracing::instrument(skip_all, fields(caller = %caller))]
    pub async fn create_project(
        &self,
        caller: &Caller,
        draft: NewProject,
    ) -> Result<Project, EngineError> {
        let client = caller
            .wallet()
            .ok_or_else(|| EngineError::Authorization("admins do not own projects".into()))?
            .clone();

        let amounts: Vec<Amount> = draft.milestones.iter().map(|m| m.amount).collect();
        let total = Amount::checked_sum(&amounts)
            .ok_or_else(|| EngineError::Validation("milestone amounts overflow".into()))?;
        if amounts.iter().any(|a| *a == Amount::ZERO) {
            return Err(EngineError::Validation(
                "milestone amounts must be positive".into(),
            ));
        }

        let mut ordinals = Ordinal::ALL.iter();
        let milestones = draft.milestones.map(|m| {
            // `map` visits in order and both arrays have 4 entries.
            let ordinal = ordinals.next().copied().unwrap_or(Ordinal::ALL[0]);
            Milestone::new(ordinal, m.title, m.amount)
        });

        let project = Project::new(
            client,
            draft.freelancer,
            draft.title,
            draft.description,
            draft.category,
            draft.token,
            total,
            milestones,
            Timestamp::now(),
        )?;
        self.store.insert_project(&project).await?;
        tracing::info!(project = %project.id, budget = %total.display(project.token), "project created");
        Ok(project)
    }

    /// Fund the escrow: ledger takes custody of the budget, the project
    /// moves `OPEN → ACTIVE` and receives its on-ledger identifier.
    #[tracing::instrument(skip_all, fields(caller = %caller, project = %id))]
    pub async fn fund_project(
        &self,
        caller: &Caller,
        id: ProjectId,
    ) -> Result<Project, EngineError> {
        let mut project = self.load_project(id).await?;
        self.require_role(caller, &project, Role::Client)?;
        if project.status != esc_state::ProjectStatus::Open {
            return Err(StateError::ProjectStatus {
                current: project.status,
                expected: esc_state::ProjectStatus::Open,
            }
            .into());
        }
        let freelancer = project.freelancer.clone().ok_or_else(|| {
            EngineError::Validation("cannot fund a project with no freelancer assigned".into())
        })?;

        let mut amounts = [Amount::ZERO; MILESTONE_COUNT];
        for (slot, m) in amounts.iter_mut().zip(project.milestones.iter()) {
            *slot = m.amount;
        }

        let acceptance = self
            .ledger
            .fund(&project.client, &freelancer, project.token, amounts)
            .await?;
        let now = Timestamp::now();
        project.mark_funded(acceptance.on_chain_id, acceptance.tx_id, now)?;
        self.store.update_project(&project).await?;
        tracing::info!(chain = %acceptance.on_chain_id, "project funded");
        Ok(project)
    }

    // ─── Milestone Handshake ─────────────────────────────────────────

    /// Freelancer submits a deliverable for one milestone.
    ///
    /// Runs the ledger-then-mirror saga with the recovery protocol
    /// described in the module docs.
    #[tracing::instrument(skip_all, fields(caller = %caller, project = %id, ordinal = %ordinal))]
    pub async fn submit_milestone(
        &self,
        caller: &Caller,
        id: ProjectId,
        ordinal: Ordinal,
        deliverable_url: String,
        note: Option<String>,
    ) -> Result<MilestoneSubmission, EngineError> {
        let mut project = self.load_project(id).await?;
        self.require_role(caller, &project, Role::Freelancer)?;

        let rows = self.store.submissions(id, Some(ordinal)).await?;
        let current = self.derived(&project, ordinal, &rows).await?;
        check_transition(MilestoneAction::Submit, Role::Freelancer, ordinal, current)?;

        let chain = self.chain_id(&project)?;
        let completion_tx = match rows.iter().rev().find_map(|s| s.completion_tx_id.clone()) {
            Some(prior) => {
                tracing::info!(tx = %prior, "reusing completion from a prior session");
                prior
            }
            None => match self.ledger.complete(chain, ordinal).await {
                Ok(tx) => tx,
                Err(LedgerError::AlreadyComplete) => {
                    let marker = TxId::recovered(chain, ordinal.as_u8());
                    tracing::warn!(
                        marker = %marker,
                        "ledger already holds this completion; recording recovery marker"
                    );
                    marker
                }
                Err(other) => return Err(other.into()),
            },
        };

        let now = Timestamp::now();
        let submission = MilestoneSubmission::new(
            id,
            ordinal,
            deliverable_url,
            note,
            Some(completion_tx),
            now,
        )?;
        self.store.insert_submission(&submission).await?;
        self.touch(&mut project, now).await?;
        tracing::info!(submission = %submission.id, "milestone submitted");
        Ok(submission)
    }

    /// Client reviews the current submission for one milestone.
    ///
    /// Approval is a saga (ledger release, then mirror); rejection is
    /// mirror-only — nothing moved on-ledger, nothing to reconcile.
    #[tracing::instrument(skip_all, fields(caller = %caller, project = %id, ordinal = %ordinal, decision = ?decision))]
    pub async fn review_submission(
        &self,
        caller: &Caller,
        id: ProjectId,
        ordinal: Ordinal,
        decision: ReviewDecision,
    ) -> Result<MilestoneSubmission, EngineError> {
        let mut project = self.load_project(id).await?;
        self.require_role(caller, &project, Role::Client)?;

        let rows = self.store.submissions(id, Some(ordinal)).await?;
        let current = self.derived(&project, ordinal, &rows).await?;
        let action = match decision {
            ReviewDecision::Approve => MilestoneAction::Approve,
            ReviewDecision::Reject => MilestoneAction::Reject,
        };
        check_transition(action, Role::Client, ordinal, current)?;

        // `current == Submitted` implies a latest row exists.
        let mut row = MilestoneSubmission::latest(&rows)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("submission for milestone {ordinal}")))?;

        let now = Timestamp::now();
        match decision {
            ReviewDecision::Approve => {
                let chain = self.chain_id(&project)?;
                let tx = self.ledger.release(chain, ordinal).await?;
                row.approve(tx, now)?;
                self.apply_review(&row).await?;
                self.check_completion(&mut project, now).await?;
            }
            ReviewDecision::Reject => {
                row.reject(now)?;
                self.apply_review(&row).await?;
            }
        }
        self.touch(&mut project, now).await?;
        tracing::info!(submission = %row.id, status = %row.status, "submission reviewed");
        Ok(row)
    }

    // ─── Disputes ────────────────────────────────────────────────────

    /// Client or freelancer files a dispute on one milestone.
    #[tracing::instrument(skip_all, fields(caller = %caller, project = %id, ordinal = %ordinal))]
    pub async fn file_dispute(
        &self,
        caller: &Caller,
        id: ProjectId,
        ordinal: Ordinal,
        reason: String,
        evidence_url: Option<String>,
    ) -> Result<Dispute, EngineError> {
        let mut project = self.load_project(id).await?;
        let role = self.participant_role(caller, &project)?;
        if reason.trim().is_empty() {
            return Err(EngineError::Validation("dispute reason must be non-empty".into()));
        }

        let rows = self.store.submissions(id, Some(ordinal)).await?;
        let current = self.derived(&project, ordinal, &rows).await?;
        check_transition(MilestoneAction::FileDispute, role, ordinal, current)?;

        let chain = self.chain_id(&project)?;
        let tx = self.ledger.file_dispute(chain, ordinal).await?;
        let now = Timestamp::now();
        let filed_by = caller
            .wallet()
            .cloned()
            .ok_or_else(|| EngineError::Authorization("disputes are filed by wallets".into()))?;
        let dispute = Dispute::file(id, ordinal, reason, evidence_url, filed_by, tx, now);
        self.store.insert_dispute(&dispute).await?;
        self.touch(&mut project, now).await?;
        tracing::info!(dispute = %dispute.id, "dispute filed");
        Ok(dispute)
    }

    /// Admin settles an open dispute, releasing to the freelancer or
    /// refunding the client. The settlement transaction is recorded on
    /// both the dispute row and the milestone it settles.
    #[tracing::instrument(skip_all, fields(caller = %caller, project = %id, ordinal = %ordinal, settlement = ?settlement))]
    pub async fn resolve_dispute(
        &self,
        caller: &Caller,
        id: ProjectId,
        ordinal: Ordinal,
        resolution: String,
        settlement: Settlement,
    ) -> Result<Dispute, EngineError> {
        let admin = self.require_admin(caller)?;
        let mut project = self.load_project(id).await?;
        let mut dispute = self
            .store
            .open_dispute(id, ordinal)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("open dispute on milestone {ordinal}")))?;
        let chain = self.chain_id(&project)?;
        let now = Timestamp::now();

        match settlement {
            Settlement::Release => {
                let tx = self.ledger.force_release(chain, ordinal).await?;
                dispute.resolve(admin, resolution.clone(), tx.clone(), now)?;
                self.store.update_dispute(&dispute).await?;
                self.record_release(&project, ordinal, tx, &resolution, now)
                    .await?;
                self.check_completion(&mut project, now).await?;
            }
            Settlement::Refund => {
                let tx = self.ledger.force_refund(chain, ordinal).await?;
                dispute.resolve(admin, resolution, tx.clone(), now)?;
                self.store.update_dispute(&dispute).await?;
                project.milestone_mut(ordinal).refund_tx_id = Some(tx);
            }
        }
        self.touch(&mut project, now).await?;
        tracing::info!(dispute = %dispute.id, "dispute resolved");
        Ok(dispute)
    }

    /// Admin withdraws a dispute without settlement. The blocked
    /// milestone state re-emerges unchanged.
    #[tracing::instrument(skip_all, fields(caller = %caller, project = %id, ordinal = %ordinal))]
    pub async fn reset_dispute(
        &self,
        caller: &Caller,
        id: ProjectId,
        ordinal: Ordinal,
        resolution: String,
    ) -> Result<Dispute, EngineError> {
        let admin = self.require_admin(caller)?;
        let mut project = self.load_project(id).await?;
        let mut dispute = self
            .store
            .open_dispute(id, ordinal)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("open dispute on milestone {ordinal}")))?;

        let chain = self.chain_id(&project)?;
        let tx = self.ledger.resolve_dispute(chain, ordinal).await?;
        let now = Timestamp::now();
        dispute.reset(admin, resolution, tx, now)?;
        self.store.update_dispute(&dispute).await?;
        self.touch(&mut project, now).await?;
        tracing::info!(dispute = %dispute.id, "dispute reset");
        Ok(dispute)
    }

    // ─── Admin Overrides ─────────────────────────────────────────────

    /// Admin releases one milestone without client approval. Closes any
    /// open dispute on the ordinal with the same settlement transaction.
    #[tracing::instrument(skip_all, fields(caller = %caller, project = %id, ordinal = %ordinal))]
    pub async fn force_release(
        &self,
        caller: &Caller,
        id: ProjectId,
        ordinal: Ordinal,
        note: String,
    ) -> Result<MilestoneSubmission, EngineError> {
        let admin = self.require_admin(caller)?;
        let mut project = self.load_project(id).await?;
        let rows = self.store.submissions(id, Some(ordinal)).await?;
        let current = self.derived(&project, ordinal, &rows).await?;
        check_transition(MilestoneAction::ForceRelease, Role::Admin, ordinal, current)?;

        let chain = self.chain_id(&project)?;
        let tx = self.ledger.force_release(chain, ordinal).await?;
        let now = Timestamp::now();
        if let Some(mut dispute) = self.store.open_dispute(id, ordinal).await? {
            dispute.resolve(admin, note.clone(), tx.clone(), now)?;
            self.store.update_dispute(&dispute).await?;
        }
        let row = self.record_release(&project, ordinal, tx, &note, now).await?;
        self.check_completion(&mut project, now).await?;
        self.touch(&mut project, now).await?;
        tracing::info!(submission = %row.id, "milestone force-released");
        Ok(row)
    }

    /// Admin refunds one milestone to the client. Closes any open
    /// dispute on the ordinal with the same settlement transaction.
    #[tracing::instrument(skip_all, fields(caller = %caller, project = %id, ordinal = %ordinal))]
    pub async fn force_refund(
        &self,
        caller: &Caller,
        id: ProjectId,
        ordinal: Ordinal,
        note: String,
    ) -> Result<Project, EngineError> {
        let admin = self.require_admin(caller)?;
        let mut project = self.load_project(id).await?;
        let rows = self.store.submissions(id, Some(ordinal)).await?;
        let current = self.derived(&project, ordinal, &rows).await?;
        check_transition(MilestoneAction::ForceRefund, Role::Admin, ordinal, current)?;

        let chain = self.chain_id(&project)?;
        let tx = self.ledger.force_refund(chain, ordinal).await?;
        let now = Timestamp::now();
        if let Some(mut dispute) = self.store.open_dispute(id, ordinal).await? {
            dispute.resolve(admin, note, tx.clone(), now)?;
            self.store.update_dispute(&dispute).await?;
        }
        project.milestone_mut(ordinal).refund_tx_id = Some(tx);
        self.touch(&mut project, now).await?;
        tracing::info!("milestone force-refunded");
        Ok(project)
    }

    /// Admin refunds the entire remaining escrow. Every non-terminal
    /// ordinal receives the refund overlay; the project becomes
    /// `REFUNDED` and every open dispute is closed.
    #[tracing::instrument(skip_all, fields(caller = %caller, project = %id))]
    pub async fn refund_project(
        &self,
        caller: &Caller,
        id: ProjectId,
        note: String,
    ) -> Result<Project, EngineError> {
        let admin = self.require_admin(caller)?;
        let mut project = self.load_project(id).await?;
        // Validate before the ledger moves funds: a terminal project
        // still carries its on_chain_id, so chain_id alone is not a
        // sufficient guard.
        if project.status != esc_state::ProjectStatus::Active {
            return Err(StateError::ProjectStatus {
                current: project.status,
                expected: esc_state::ProjectStatus::Active,
            }
            .into());
        }
        let chain = self.chain_id(&project)?;
        let submissions = self.store.submissions(id, None).await?;
        let disputes = self.store.disputes(id).await?;

        let tx = self.ledger.refund_project(chain).await?;
        let now = Timestamp::now();

        for ordinal in Ordinal::ALL {
            let latest = MilestoneSubmission::latest(
                submissions.iter().filter(|s| s.ordinal == ordinal),
            );
            let milestone = project.milestone(ordinal);
            let current = derive_status(project.status, milestone, false, latest);
            if !current.is_terminal() {
                project.milestone_mut(ordinal).refund_tx_id = Some(tx.clone());
            }
        }
        project.mark_refunded(now)?;

        for mut dispute in disputes {
            if dispute.status == esc_state::DisputeStatus::Open {
                dispute.resolve(admin, note.clone(), tx.clone(), now)?;
                self.store.update_dispute(&dispute).await?;
            }
        }

        self.store.update_project(&project).await?;
        tracing::info!(tx = %tx, "project refunded in full");
        Ok(project)
    }

    /// `ACTIVE` projects with no mirror write in the staleness window.
    pub async fn abandoned_projects(
        &self,
        caller: &Caller,
        now: Timestamp,
    ) -> Result<Vec<Project>, EngineError> {
        self.require_admin(caller)?;
        let cutoff = now.days_ago(ABANDONED_AFTER_DAYS);
        Ok(self.store.abandoned_projects(cutoff).await?)
    }

    // ─── Read Surface ────────────────────────────────────────────────

    /// Fully derived view of one project.
    pub async fn project_view(
        &self,
        caller: &Caller,
        id: ProjectId,
    ) -> Result<ProjectView, EngineError> {
        let project = self.load_project(id).await?;
        self.require_participant(caller, &project)?;
        let submissions = self.store.submissions(id, None).await?;
        let disputes = self.store.disputes(id).await?;
        Ok(view::project_view(project, &submissions, &disputes))
    }

    /// Derived views of every project the caller can see: their own for
    /// wallets, all of them for admins.
    pub async fn list_projects(&self, caller: &Caller) -> Result<Vec<ProjectView>, EngineError> {
        let projects = match caller {
            Caller::Admin(_) => self.store.all_projects().await?,
            Caller::Wallet(addr) => self.store.projects_for_wallet(addr).await?,
        };
        let mut views = Vec::with_capacity(projects.len());
        for project in projects {
            let submissions = self.store.submissions(project.id, None).await?;
            let disputes = self.store.disputes(project.id).await?;
            views.push(view::project_view(project, &submissions, &disputes));
        }
        Ok(views)
    }

    /// Submission history for a project, optionally narrowed to one
    /// ordinal. All rows are returned, including superseded ones.
    pub async fn submissions(
        &self,
        caller: &Caller,
        id: ProjectId,
        ordinal: Option<Ordinal>,
    ) -> Result<Vec<MilestoneSubmission>, EngineError> {
        let project = self.load_project(id).await?;
        self.require_participant(caller, &project)?;
        Ok(self.store.submissions(id, ordinal).await?)
    }

    /// Dispute history for a project.
    pub async fn disputes(
        &self,
        caller: &Caller,
        id: ProjectId,
    ) -> Result<Vec<Dispute>, EngineError> {
        let project = self.load_project(id).await?;
        self.require_participant(caller, &project)?;
        Ok(self.store.disputes(id).await?)
    }

    /// Aggregate mirror counts for the operator dashboard.
    pub async fn counts(&self, caller: &Caller) -> Result<MirrorCounts, EngineError> {
        self.require_admin(caller)?;
        Ok(self.store.counts().await?)
    }

    /// Counts without an authorization check, for the refresh loop.
    pub(crate) async fn counts_unchecked(&self) -> Result<MirrorCounts, EngineError> {
        Ok(self.store.counts().await?)
    }

    // ─── Internals ───────────────────────────────────────────────────

    async fn load_project(&self, id: ProjectId) -> Result<Project, EngineError> {
        self.store
            .project(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("{id}")))
    }

    fn chain_id(&self, project: &Project) -> Result<esc_core::OnChainProjectId, EngineError> {
        project.on_chain_id.ok_or_else(|| {
            EngineError::State(StateError::ProjectStatus {
                current: project.status,
                expected: esc_state::ProjectStatus::Active,
            })
        })
    }

    /// Derived status of one ordinal given its already-fetched rows.
    async fn derived(
        &self,
        project: &Project,
        ordinal: Ordinal,
        rows: &[MilestoneSubmission],
    ) -> Result<MilestoneStatus, EngineError> {
        let has_open_dispute = self
            .store
            .open_dispute(project.id, ordinal)
            .await?
            .is_some();
        Ok(derive_status(
            project.status,
            project.milestone(ordinal),
            has_open_dispute,
            MilestoneSubmission::latest(rows),
        ))
    }

    /// Land a review through the store's compare-and-set; a miss means a
    /// concurrent review won and surfaces as a state conflict.
    async fn apply_review(&self, row: &MilestoneSubmission) -> Result<(), EngineError> {
        match self.store.review_submission(row).await? {
            ReviewOutcome::Applied => Ok(()),
            ReviewOutcome::Stale(current) => Err(StateError::SubmissionStatus {
                current: current.as_str().to_string(),
                expected: SubmissionStatus::Submitted.as_str().to_string(),
            }
            .into()),
        }
    }

    /// Record an accepted release against the ordinal: approve the
    /// current `SUBMITTED` row if there is one, otherwise append a
    /// pre-approved row documenting the override.
    async fn record_release(
        &self,
        project: &Project,
        ordinal: Ordinal,
        tx: TxId,
        note: &str,
        now: Timestamp,
    ) -> Result<MilestoneSubmission, EngineError> {
        let rows = self.store.submissions(project.id, Some(ordinal)).await?;
        match MilestoneSubmission::latest(&rows) {
            Some(latest) if latest.status == SubmissionStatus::Submitted => {
                let mut row = latest.clone();
                row.approve(tx, now)?;
                self.apply_review(&row).await?;
                Ok(row)
            }
            _ => {
                let mut row = MilestoneSubmission::new(
                    project.id,
                    ordinal,
                    FORCE_RELEASE_DELIVERABLE,
                    Some(note.to_string()),
                    None,
                    now,
                )?;
                row.approve(tx, now)?;
                self.store.insert_submission(&row).await?;
                Ok(row)
            }
        }
    }

    /// Re-evaluate the all-4-approved rule and complete the project if
    /// it holds. Idempotent via `Project::mark_completed`.
    async fn check_completion(
        &self,
        project: &mut Project,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        let rows = self.store.submissions(project.id, None).await?;
        let all_approved = Ordinal::ALL.iter().all(|&ordinal| {
            MilestoneSubmission::latest(rows.iter().filter(|s| s.ordinal == ordinal))
                .map_or(false, |s| s.status == SubmissionStatus::Approved)
        });
        if all_approved {
            project.mark_completed(now)?;
            tracing::info!(project = %project.id, "all milestones approved; project completed");
        }
        Ok(())
    }

    /// Stamp `updated_at` and persist the project row.
    async fn touch(&self, project: &mut Project, now: Timestamp) -> Result<(), EngineError> {
        project.updated_at = now;
        self.store.update_project(project).await?;
        Ok(())
    }

    // ─── Authorization ───────────────────────────────────────────────

    fn require_admin(&self, caller: &Caller) -> Result<AdminId, EngineError> {
        caller
            .admin()
            .ok_or_else(|| EngineError::Authorization("admin capability required".into()))
    }

    /// The caller's role on this project: `Client`, `Freelancer`, or
    /// `Admin`. Strangers get an authorization error.
    fn participant_role(&self, caller: &Caller, project: &Project) -> Result<Role, EngineError> {
        match caller {
            Caller::Admin(_) => Ok(Role::Admin),
            Caller::Wallet(addr) if *addr == project.client => Ok(Role::Client),
            Caller::Wallet(addr) if project.freelancer.as_ref() == Some(addr) => {
                Ok(Role::Freelancer)
            }
            Caller::Wallet(addr) => Err(EngineError::Authorization(format!(
                "{addr} is not a participant of this project"
            ))),
        }
    }

    fn require_role(
        &self,
        caller: &Caller,
        project: &Project,
        required: Role,
    ) -> Result<(), EngineError> {
        let role = self.participant_role(caller, project)?;
        if role != required {
            return Err(EngineError::Authorization(format!(
                "this action requires the project {required}, caller is {role}"
            )));
        }
        Ok(())
    }

    fn require_participant(&self, caller: &Caller, project: &Project) -> Result<(), EngineError> {
        self.participant_role(caller, project).map(|_| ())
    }
}
