use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::dto::candidate_dto::ExperienceRequest;
use crate::dto::validators::{check_date_range, clean};
use crate::error::{Error, Result};
use crate::models::candidate::Experience;

use super::candidate_repository::refresh_completeness;

const EXPERIENCE_COLUMNS: &str =
    "id, candidate_id, company_name, position, start_date, end_date, is_current, description, created_at";

fn not_found() -> Error {
    Error::not_found("EXPERIENCE_NOT_FOUND", "Experience record not found")
}

/// Clears the current flag on every other experience of the candidate.
async fn clear_current(conn: &mut PgConnection, candidate_id: Uuid, keep: Option<Uuid>) -> Result<()> {
    sqlx::query(
        "UPDATE experiences SET is_current = FALSE
         WHERE candidate_id = $1 AND is_current AND ($2::uuid IS NULL OR id <> $2)",
    )
    .bind(candidate_id)
    .bind(keep)
    .execute(conn)
    .await?;
    Ok(())
}

#[derive(Clone)]
pub struct ExperienceRepository {
    pool: PgPool,
}

impl ExperienceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, candidate_id: Uuid) -> Result<Vec<Experience>> {
        let sql = format!(
            "SELECT {} FROM experiences WHERE candidate_id = $1
             ORDER BY is_current DESC, start_date DESC NULLS LAST, created_at DESC",
            EXPERIENCE_COLUMNS
        );
        let items = sqlx::query_as::<_, Experience>(&sql)
            .bind(candidate_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn get(&self, candidate_id: Uuid, id: Uuid) -> Result<Experience> {
        let sql = format!(
            "SELECT {} FROM experiences WHERE id = $1 AND candidate_id = $2",
            EXPERIENCE_COLUMNS
        );
        sqlx::query_as::<_, Experience>(&sql)
            .bind(id)
            .bind(candidate_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn create(&self, candidate_id: Uuid, req: ExperienceRequest) -> Result<Experience> {
        check_date_range(req.start_date, req.end_date)?;
        let end_date = if req.is_current { None } else { req.end_date };

        let mut tx = self.pool.begin().await?;
        if req.is_current {
            clear_current(&mut tx, candidate_id, None).await?;
        }
        let sql = format!(
            "INSERT INTO experiences (candidate_id, company_name, position, start_date, end_date, is_current, description)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            EXPERIENCE_COLUMNS
        );
        let experience = sqlx::query_as::<_, Experience>(&sql)
            .bind(candidate_id)
            .bind(req.company_name.trim())
            .bind(req.position.trim())
            .bind(req.start_date)
            .bind(end_date)
            .bind(req.is_current)
            .bind(clean(req.description))
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        refresh_completeness(&self.pool, candidate_id).await?;
        Ok(experience)
    }

    pub async fn update(&self, candidate_id: Uuid, id: Uuid, req: ExperienceRequest) -> Result<Experience> {
        check_date_range(req.start_date, req.end_date)?;
        let end_date = if req.is_current { None } else { req.end_date };

        let mut tx = self.pool.begin().await?;
        if req.is_current {
            clear_current(&mut tx, candidate_id, Some(id)).await?;
        }
        let sql = format!(
            "UPDATE experiences SET company_name = $3, position = $4, start_date = $5,
                end_date = $6, is_current = $7, description = $8
             WHERE id = $1 AND candidate_id = $2
             RETURNING {}",
            EXPERIENCE_COLUMNS
        );
        let experience = sqlx::query_as::<_, Experience>(&sql)
            .bind(id)
            .bind(candidate_id)
            .bind(req.company_name.trim())
            .bind(req.position.trim())
            .bind(req.start_date)
            .bind(end_date)
            .bind(req.is_current)
            .bind(clean(req.description))
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(not_found)?;
        tx.commit().await?;
        Ok(experience)
    }

    pub async fn delete(&self, candidate_id: Uuid, id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM experiences WHERE id = $1 AND candidate_id = $2")
            .bind(id)
            .bind(candidate_id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(not_found());
        }
        refresh_completeness(&self.pool, candidate_id).await?;
        Ok(())
    }
}
