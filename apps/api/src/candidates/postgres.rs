use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::candidates::store::CandidateStore;
use crate::candidates::validation::CandidateDraft;
use crate::errors::AppError;
use crate::models::candidate::{timestamp_now, Candidate, CandidateRow, CandidateStatus};

/// PostgreSQL-backed candidate store. Email uniqueness is enforced by the
/// `candidates_email_key` unique index.
#[derive(Clone)]
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Unique-index violations become `Conflict`; everything else stays a
/// database error.
fn map_write_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return AppError::duplicate_email();
        }
    }
    AppError::Database(err)
}

fn into_candidate(row: CandidateRow) -> Result<Candidate, AppError> {
    Ok(Candidate::try_from(row)?)
}

#[async_trait]
impl CandidateStore for PgCandidateStore {
    async fn list(&self) -> Result<Vec<Candidate>, AppError> {
        // Equal creation times list the later insert first.
        let rows = sqlx::query_as::<_, CandidateRow>(
            "SELECT * FROM candidates ORDER BY created_at DESC, insert_seq DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(into_candidate).collect()
    }

    async fn get(&self, id: Uuid) -> Result<Candidate, AppError> {
        let row = sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        into_candidate(row.ok_or_else(AppError::candidate_not_found)?)
    }

    async fn create(&self, draft: CandidateDraft) -> Result<Candidate, AppError> {
        let candidate = Candidate::from_draft(Uuid::new_v4(), draft, timestamp_now());

        let row = sqlx::query_as::<_, CandidateRow>(
            r#"
            INSERT INTO candidates
                (id, first_name, last_name, email, phone, position, experience, skills,
                 education_degree, education_institution, education_year,
                 status, notes, resume_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(candidate.id)
        .bind(&candidate.first_name)
        .bind(&candidate.last_name)
        .bind(&candidate.email)
        .bind(&candidate.phone)
        .bind(&candidate.position)
        .bind(candidate.experience as i32)
        .bind(&candidate.skills)
        .bind(&candidate.education.degree)
        .bind(&candidate.education.institution)
        .bind(candidate.education.year)
        .bind(candidate.status.as_str())
        .bind(&candidate.notes)
        .bind(&candidate.resume_url)
        .bind(candidate.created_at)
        .bind(candidate.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        info!("Inserted candidate {}", candidate.id);
        into_candidate(row)
    }

    async fn update(&self, id: Uuid, draft: CandidateDraft) -> Result<Candidate, AppError> {
        // Optional fields keep their stored value when the draft omits them.
        let row = sqlx::query_as::<_, CandidateRow>(
            r#"
            UPDATE candidates SET
                first_name = $2,
                last_name = $3,
                email = $4,
                phone = $5,
                position = $6,
                experience = $7,
                education_degree = $8,
                education_institution = $9,
                education_year = $10,
                skills = COALESCE($11, skills),
                status = COALESCE($12, status),
                notes = COALESCE($13, notes),
                resume_url = COALESCE($14, resume_url),
                updated_at = GREATEST($15, updated_at, created_at)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(&draft.position)
        .bind(draft.experience as i32)
        .bind(&draft.education.degree)
        .bind(&draft.education.institution)
        .bind(draft.education.year)
        .bind(&draft.skills)
        .bind(draft.status.map(|s| s.as_str()))
        .bind(&draft.notes)
        .bind(&draft.resume_url)
        .bind(timestamp_now())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        let row = row.ok_or_else(AppError::candidate_not_found)?;
        info!("Updated candidate {id}");
        into_candidate(row)
    }

    async fn set_status(&self, id: Uuid, status: CandidateStatus) -> Result<Candidate, AppError> {
        let row = sqlx::query_as::<_, CandidateRow>(
            r#"
            UPDATE candidates
            SET status = $2, updated_at = GREATEST($3, updated_at, created_at)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(timestamp_now())
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or_else(AppError::candidate_not_found)?;
        info!("Candidate {id} moved to {status}");
        into_candidate(row)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::candidate_not_found());
        }
        info!("Deleted candidate {id}");
        Ok(())
    }
}
