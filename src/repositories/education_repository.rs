use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::candidate_dto::EducationRequest;
use crate::dto::validators::{check_date_range, clean};
use crate::error::{Error, Result};
use crate::models::candidate::Education;

use super::candidate_repository::refresh_completeness;

const EDUCATION_COLUMNS: &str =
    "id, candidate_id, institution_name, degree, major, start_date, end_date, description, created_at";

fn not_found() -> Error {
    Error::not_found("EDUCATION_NOT_FOUND", "Education record not found")
}

#[derive(Clone)]
pub struct EducationRepository {
    pool: PgPool,
}

impl EducationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, candidate_id: Uuid) -> Result<Vec<Education>> {
        let sql = format!(
            "SELECT {} FROM educations WHERE candidate_id = $1
             ORDER BY start_date DESC NULLS LAST, created_at DESC",
            EDUCATION_COLUMNS
        );
        let items = sqlx::query_as::<_, Education>(&sql)
            .bind(candidate_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn get(&self, candidate_id: Uuid, id: Uuid) -> Result<Education> {
        let sql = format!(
            "SELECT {} FROM educations WHERE id = $1 AND candidate_id = $2",
            EDUCATION_COLUMNS
        );
        sqlx::query_as::<_, Education>(&sql)
            .bind(id)
            .bind(candidate_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn create(&self, candidate_id: Uuid, req: EducationRequest) -> Result<Education> {
        check_date_range(req.start_date, req.end_date)?;
        let sql = format!(
            "INSERT INTO educations (candidate_id, institution_name, degree, major, start_date, end_date, description)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            EDUCATION_COLUMNS
        );
        let education = sqlx::query_as::<_, Education>(&sql)
            .bind(candidate_id)
            .bind(req.institution_name.trim())
            .bind(clean(req.degree))
            .bind(clean(req.major))
            .bind(req.start_date)
            .bind(req.end_date)
            .bind(clean(req.description))
            .fetch_one(&self.pool)
            .await?;
        refresh_completeness(&self.pool, candidate_id).await?;
        Ok(education)
    }

    pub async fn update(&self, candidate_id: Uuid, id: Uuid, req: EducationRequest) -> Result<Education> {
        check_date_range(req.start_date, req.end_date)?;
        let sql = format!(
            "UPDATE educations SET institution_name = $3, degree = $4, major = $5,
                start_date = $6, end_date = $7, description = $8
             WHERE id = $1 AND candidate_id = $2
             RETURNING {}",
            EDUCATION_COLUMNS
        );
        sqlx::query_as::<_, Education>(&sql)
            .bind(id)
            .bind(candidate_id)
            .bind(req.institution_name.trim())
            .bind(clean(req.degree))
            .bind(clean(req.major))
            .bind(req.start_date)
            .bind(req.end_date)
            .bind(clean(req.description))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn delete(&self, candidate_id: Uuid, id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM educations WHERE id = $1 AND candidate_id = $2")
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
