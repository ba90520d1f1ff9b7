//! PostgreSQL [`MirrorStore`] backend via SQLx.
//!
//! Queries are runtime-checked (`sqlx::query` + `bind`), milestones are
//! stored as a JSONB column on the project row, and the one-open-dispute
//! rule is a partial unique index so it holds under concurrent filings.
//! Migrations are embedded and run at connection time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use esc_core::{
    AdminId, Amount, DisputeId, OnChainProjectId, ProjectId, SubmissionId, Timestamp,
    TokenKind, TxId, WalletAddress,
};
use esc_state::{
    Dispute, DisputeStatus, MilestoneSubmission, Ordinal, Project, ProjectStatus,
    SubmissionStatus,
};

use crate::error::StoreError;
use crate::store::{MirrorCounts, MirrorStore, ReviewOutcome};

/// PostgreSQL mirror store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and run embedded migrations.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect(url)
            .await?;
        tracing::info!("connected to PostgreSQL");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration failed: {e}")))?;
        tracing::info!("mirror migrations applied");

        Ok(Self { pool })
    }

    /// Wrap an existing pool (tests, shared pools).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MirrorStore for PgStore {
    async fn insert_project(&self, project: &Project) -> Result<(), StoreError> {
        upsert_project(&self.pool, project).await
    }

    async fn project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        let sql = format!("{PROJECT_SELECT} WHERE id = $1");
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(decode_project).transpose()
    }

    async fn update_project(&self, project: &Project) -> Result<(), StoreError> {
        upsert_project(&self.pool, project).await
    }

    async fn projects_for_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<Project>, StoreError> {
        let sql = format!(
            "{PROJECT_SELECT} WHERE client = $1 OR freelancer = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(wallet.as_str().to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(decode_project).collect()
    }

    async fn all_projects(&self) -> Result<Vec<Project>, StoreError> {
        let sql = format!("{PROJECT_SELECT} ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, ProjectRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(decode_project).collect()
    }

    async fn abandoned_projects(&self, cutoff: Timestamp) -> Result<Vec<Project>, StoreError> {
        let sql = format!(
            "{PROJECT_SELECT} WHERE status = 'ACTIVE' AND updated_at < $1 ORDER BY updated_at"
        );
        let rows = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(*cutoff.as_datetime())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(decode_project).collect()
    }

    async fn insert_submission(
        &self,
        submission: &MilestoneSubmission,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO submissions (id, project_id, ordinal, deliverable_url, note, status,
                                      submitted_at, completion_tx_id, release_tx_id, reviewed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(submission.id.as_uuid())
        .bind(submission.project_id.as_uuid())
        .bind(submission.ordinal.as_u8() as i16)
        .bind(&submission.deliverable_url)
        .bind(&submission.note)
        .bind(submission.status.as_str())
        .bind(*submission.submitted_at.as_datetime())
        .bind(submission.completion_tx_id.as_ref().map(|t| t.as_str()))
        .bind(submission.release_tx_id.as_ref().map(|t| t.as_str()))
        .bind(submission.reviewed_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn submissions(
        &self,
        project: ProjectId,
        ordinal: Option<Ordinal>,
    ) -> Result<Vec<MilestoneSubmission>, StoreError> {
        let rows = match ordinal {
            Some(o) => {
                let sql = format!(
                    "{SUBMISSION_SELECT} WHERE project_id = $1 AND ordinal = $2
                     ORDER BY submitted_at, id"
                );
                sqlx::query_as::<_, SubmissionRow>(&sql)
                    .bind(project.as_uuid())
                    .bind(o.as_u8() as i16)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql =
                    format!("{SUBMISSION_SELECT} WHERE project_id = $1 ORDER BY submitted_at, id");
                sqlx::query_as::<_, SubmissionRow>(&sql)
                    .bind(project.as_uuid())
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.into_iter().map(decode_submission).collect()
    }

    async fn review_submission(
        &self,
        reviewed: &MilestoneSubmission,
    ) -> Result<ReviewOutcome, StoreError> {
        let result = sqlx::query(
            "UPDATE submissions SET status = $2, release_tx_id = $3, reviewed_at = $4
             WHERE id = $1 AND status = 'SUBMITTED'",
        )
        .bind(reviewed.id.as_uuid())
        .bind(reviewed.status.as_str())
        .bind(reviewed.release_tx_id.as_ref().map(|t| t.as_str()))
        .bind(reviewed.reviewed_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(ReviewOutcome::Applied);
        }

        // CAS missed: report what the winner left behind.
        let current: String =
            sqlx::query_scalar("SELECT status FROM submissions WHERE id = $1")
                .bind(reviewed.id.as_uuid())
                .fetch_one(&self.pool)
                .await?;
        let status = SubmissionStatus::parse(&current).ok_or_else(|| {
            StoreError::Corrupt(format!("unknown submission status {current:?}"))
        })?;
        Ok(ReviewOutcome::Stale(status))
    }

    async fn insert_dispute(&self, dispute: &Dispute) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO disputes (id, project_id, ordinal, reason, evidence_url, filed_by,
                                   dispute_tx_id, status, resolution, resolved_by,
                                   resolution_tx_id, resolved_at, filed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(dispute.id.as_uuid())
        .bind(dispute.project_id.as_uuid())
        .bind(dispute.ordinal.as_u8() as i16)
        .bind(&dispute.reason)
        .bind(&dispute.evidence_url)
        .bind(dispute.filed_by.as_str().to_string())
        .bind(dispute.dispute_tx_id.as_str())
        .bind(dispute.status.as_str())
        .bind(&dispute.resolution)
        .bind(dispute.resolved_by.map(|a| *a.as_uuid()))
        .bind(dispute.resolution_tx_id.as_ref().map(|t| t.as_str()))
        .bind(dispute.resolved_at.map(|t| *t.as_datetime()))
        .bind(*dispute.filed_at.as_datetime())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::OpenDisputeExists {
                    ordinal: dispute.ordinal,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_dispute(&self, dispute: &Dispute) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE disputes SET status = $2, resolution = $3, resolved_by = $4,
                                 resolution_tx_id = $5, resolved_at = $6
             WHERE id = $1",
        )
        .bind(dispute.id.as_uuid())
        .bind(dispute.status.as_str())
        .bind(&dispute.resolution)
        .bind(dispute.resolved_by.map(|a| *a.as_uuid()))
        .bind(dispute.resolution_tx_id.as_ref().map(|t| t.as_str()))
        .bind(dispute.resolved_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn disputes(&self, project: ProjectId) -> Result<Vec<Dispute>, StoreError> {
        let sql = format!("{DISPUTE_SELECT} WHERE project_id = $1 ORDER BY filed_at DESC");
        let rows = sqlx::query_as::<_, DisputeRow>(&sql)
            .bind(project.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(decode_dispute).collect()
    }

    async fn open_dispute(
        &self,
        project: ProjectId,
        ordinal: Ordinal,
    ) -> Result<Option<Dispute>, StoreError> {
        let sql =
            format!("{DISPUTE_SELECT} WHERE project_id = $1 AND ordinal = $2 AND status = 'OPEN'");
        let row = sqlx::query_as::<_, DisputeRow>(&sql)
            .bind(project.as_uuid())
            .bind(ordinal.as_u8() as i16)
            .fetch_optional(&self.pool)
            .await?;
        row.map(decode_dispute).transpose()
    }

    async fn counts(&self) -> Result<MirrorCounts, StoreError> {
        let status_rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM projects GROUP BY status")
                .fetch_all(&self.pool)
                .await?;
        let open_disputes: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM disputes WHERE status = 'OPEN'")
                .fetch_one(&self.pool)
                .await?;

        let mut counts = MirrorCounts {
            open_disputes: open_disputes as u64,
            ..MirrorCounts::default()
        };
        for (status, n) in status_rows {
            let n = n as u64;
            counts.total_projects += n;
            match status.as_str() {
                "OPEN" => counts.open = n,
                "ACTIVE" => counts.active = n,
                "COMPLETED" => counts.completed = n,
                "REFUNDED" => counts.refunded = n,
                other => {
                    tracing::warn!(status = other, "unrecognized project status in mirror");
                }
            }
        }
        Ok(counts)
    }
}

async fn upsert_project(pool: &PgPool, project: &Project) -> Result<(), StoreError> {
    let milestones = serde_json::to_value(&project.milestones)
        .map_err(|e| StoreError::Corrupt(format!("failed to serialize milestones: {e}")))?;

    sqlx::query(
        "INSERT INTO projects (id, client, freelancer, title, description, category, token,
                               total_budget, status, on_chain_id, funding_tx_id, milestones,
                               created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
         ON CONFLICT (id) DO UPDATE SET
            freelancer = EXCLUDED.freelancer,
            status = EXCLUDED.status,
            on_chain_id = EXCLUDED.on_chain_id,
            funding_tx_id = EXCLUDED.funding_tx_id,
            milestones = EXCLUDED.milestones,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(project.id.as_uuid())
    .bind(project.client.as_str().to_string())
    .bind(project.freelancer.as_ref().map(|w| w.as_str().to_string()))
    .bind(&project.title)
    .bind(&project.description)
    .bind(&project.category)
    .bind(project.token.as_str())
    .bind(project.total_budget.as_micro() as i64)
    .bind(project.status.as_str())
    .bind(project.on_chain_id.map(|c| c.0 as i64))
    .bind(project.funding_tx_id.as_ref().map(|t| t.as_str()))
    .bind(&milestones)
    .bind(*project.created_at.as_datetime())
    .bind(*project.updated_at.as_datetime())
    .execute(pool)
    .await?;
    Ok(())
}

// ─── Row Types ───────────────────────────────────────────────────────

const PROJECT_SELECT: &str =
    "SELECT id, client, freelancer, title, description, category, token, total_budget,
            status, on_chain_id, funding_tx_id, milestones, created_at, updated_at
     FROM projects";

const SUBMISSION_SELECT: &str =
    "SELECT id, project_id, ordinal, deliverable_url, note, status, submitted_at,
            completion_tx_id, release_tx_id, reviewed_at
     FROM submissions";

const DISPUTE_SELECT: &str =
    "SELECT id, project_id, ordinal, reason, evidence_url, filed_by, dispute_tx_id, status,
            resolution, resolved_by, resolution_tx_id, resolved_at, filed_at
     FROM disputes";

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: Uuid,
    client: String,
    freelancer: Option<String>,
    title: String,
    description: String,
    category: String,
    token: String,
    total_budget: i64,
    status: String,
    on_chain_id: Option<i64>,
    funding_tx_id: Option<String>,
    milestones: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct SubmissionRow {
    id: Uuid,
    project_id: Uuid,
    ordinal: i16,
    deliverable_url: String,
    note: Option<String>,
    status: String,
    submitted_at: DateTime<Utc>,
    completion_tx_id: Option<String>,
    release_tx_id: Option<String>,
    reviewed_at: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
struct DisputeRow {
    id: Uuid,
    project_id: Uuid,
    ordinal: i16,
    reason: String,
    evidence_url: Option<String>,
    filed_by: String,
    dispute_tx_id: String,
    status: String,
    resolution: Option<String>,
    resolved_by: Option<Uuid>,
    resolution_tx_id: Option<String>,
    resolved_at: Option<DateTime<Utc>>,
    filed_at: DateTime<Utc>,
}

// ─── Decoding ────────────────────────────────────────────────────────

fn corrupt(what: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(format!("{what}: {detail}"))
}

fn decode_ordinal(raw: i16) -> Result<Ordinal, StoreError> {
    u8::try_from(raw)
        .ok()
        .and_then(|n| Ordinal::new(n).ok())
        .ok_or_else(|| corrupt("ordinal out of range", raw))
}

fn decode_project(row: ProjectRow) -> Result<Project, StoreError> {
    let token = TokenKind::parse(&row.token)
        .ok_or_else(|| corrupt("unknown token", &row.token))?;
    let status = ProjectStatus::parse(&row.status)
        .ok_or_else(|| corrupt("unknown project status", &row.status))?;
    let milestones = serde_json::from_value(row.milestones)
        .map_err(|e| corrupt("milestones column", e))?;
    let budget = u64::try_from(row.total_budget)
        .map_err(|_| corrupt("negative budget", row.total_budget))?;

    Ok(Project {
        id: ProjectId(row.id),
        client: WalletAddress::new(row.client).map_err(|e| corrupt("client address", e))?,
        freelancer: row
            .freelancer
            .map(WalletAddress::new)
            .transpose()
            .map_err(|e| corrupt("freelancer address", e))?,
        title: row.title,
        description: row.description,
        category: row.category,
        token,
        total_budget: Amount::micro(budget),
        status,
        on_chain_id: row
            .on_chain_id
            .map(|c| u64::try_from(c).map(OnChainProjectId))
            .transpose()
            .map_err(|_| corrupt("negative on-chain id", "projects.on_chain_id"))?,
        funding_tx_id: row.funding_tx_id.map(TxId::accepted),
        milestones,
        created_at: Timestamp::from_utc(row.created_at),
        updated_at: Timestamp::from_utc(row.updated_at),
    })
}

fn decode_submission(row: SubmissionRow) -> Result<MilestoneSubmission, StoreError> {
    let status = SubmissionStatus::parse(&row.status)
        .ok_or_else(|| corrupt("unknown submission status", &row.status))?;
    Ok(MilestoneSubmission {
        id: SubmissionId(row.id),
        project_id: ProjectId(row.project_id),
        ordinal: decode_ordinal(row.ordinal)?,
        deliverable_url: row.deliverable_url,
        note: row.note,
        status,
        submitted_at: Timestamp::from_utc(row.submitted_at),
        completion_tx_id: row.completion_tx_id.map(TxId::accepted),
        release_tx_id: row.release_tx_id.map(TxId::accepted),
        reviewed_at: row.reviewed_at.map(Timestamp::from_utc),
    })
}

fn decode_dispute(row: DisputeRow) -> Result<Dispute, StoreError> {
    let status = DisputeStatus::parse(&row.status)
        .ok_or_else(|| corrupt("unknown dispute status", &row.status))?;
    Ok(Dispute {
        id: DisputeId(row.id),
        project_id: ProjectId(row.project_id),
        ordinal: decode_ordinal(row.ordinal)?,
        reason: row.reason,
        evidence_url: row.evidence_url,
        filed_by: WalletAddress::new(row.filed_by).map_err(|e| corrupt("filed_by", e))?,
        dispute_tx_id: TxId::accepted(row.dispute_tx_id),
        status,
        resolution: row.resolution,
        resolved_by: row.resolved_by.map(AdminId),
        resolution_tx_id: row.resolution_tx_id.map(TxId::accepted),
        resolved_at: row.resolved_at.map(Timestamp::from_utc),
        filed_at: Timestamp::from_utc(row.filed_at),
    })
}
