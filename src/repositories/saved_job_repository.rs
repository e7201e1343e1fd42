use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::envelope::{non_blank, Paging};
use crate::dto::saved_job_dto::{SavedJobResponse, SavedJobRow, SavedJobsQuery};
use crate::error::{Error, Result};
use crate::models::job_posting::{JobStatus, JOB_COLUMNS};
use crate::models::saved_job::SavedJob;

use super::job_posting_repository;

#[derive(Clone)]
pub struct SavedJobRepository {
    pool: PgPool,
}

impl SavedJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn save(&self, candidate_id: Uuid, job_posting_id: Uuid) -> Result<SavedJob> {
        job_posting_repository::find(&self.pool, job_posting_id).await?;
        if self.is_saved(candidate_id, job_posting_id).await? {
            return Err(Error::conflict("ALREADY_SAVED", "Job is already saved"));
        }
        // A racing duplicate still trips saved_jobs_candidate_job_key and maps to ALREADY_SAVED.
        let saved = sqlx::query_as::<_, SavedJob>(
            "INSERT INTO saved_jobs (candidate_id, job_posting_id) VALUES ($1, $2)
             RETURNING id, candidate_id, job_posting_id, saved_at",
        )
        .bind(candidate_id)
        .bind(job_posting_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    pub async fn unsave(&self, candidate_id: Uuid, job_posting_id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM saved_jobs WHERE candidate_id = $1 AND job_posting_id = $2")
            .bind(candidate_id)
            .bind(job_posting_id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::not_found(
                "SAVED_JOB_NOT_FOUND",
                "Job is not in your saved list",
            ));
        }
        Ok(())
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Postgres>,
        candidate_id: Uuid,
        query: &SavedJobsQuery,
    ) -> Result<()> {
        qb.push(" WHERE s.candidate_id = ").push_bind(candidate_id);
        if let Some(status) = non_blank(&query.status) {
            let status: JobStatus = status.parse()?;
            qb.push(" AND j.status = ").push_bind(status.as_str());
        }
        if let Some(search) = non_blank(&query.search) {
            let pattern = format!("%{}%", search);
            qb.push(" AND (j.job_title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR e.company_name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(job_type) = non_blank(&query.job_type) {
            qb.push(" AND LOWER(j.job_type) = LOWER(")
                .push_bind(job_type.to_string())
                .push(")");
        }
        if let Some(location) = non_blank(&query.location) {
            qb.push(" AND j.location ILIKE ")
                .push_bind(format!("%{}%", location));
        }
        Ok(())
    }

    pub async fn list(
        &self,
        candidate_id: Uuid,
        query: &SavedJobsQuery,
    ) -> Result<(Vec<SavedJobResponse>, i64, Paging)> {
        let paging = Paging::new(query.page, query.page_size, 10);
        const FROM: &str = " FROM saved_jobs s
             JOIN job_postings j ON j.id = s.job_posting_id
             JOIN employers e ON e.user_id = j.employer_id";

        let mut count = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*){}", FROM));
        Self::push_filters(&mut count, candidate_id, query)?;
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut items = QueryBuilder::<Postgres>::new(format!(
            "SELECT s.id AS saved_id, s.saved_at,
                EXISTS(SELECT 1 FROM job_applications a
                       WHERE a.job_posting_id = j.id AND a.candidate_id = s.candidate_id) AS has_applied,
                {}, e.company_name, e.company_logo{}",
            JOB_COLUMNS, FROM
        ));
        Self::push_filters(&mut items, candidate_id, query)?;
        items
            .push(" ORDER BY s.saved_at DESC, s.id")
            .push(" LIMIT ")
            .push_bind(paging.page_size)
            .push(" OFFSET ")
            .push_bind(paging.offset());
        let rows: Vec<SavedJobRow> = items.build_query_as().fetch_all(&self.pool).await?;

        Ok((rows.into_iter().map(Into::into).collect(), total, paging))
    }

    pub async fn is_saved(&self, candidate_id: Uuid, job_posting_id: Uuid) -> Result<bool> {
        let saved: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM saved_jobs WHERE candidate_id = $1 AND job_posting_id = $2)",
        )
        .bind(candidate_id)
        .bind(job_posting_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    pub async fn count(&self, candidate_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM saved_jobs WHERE candidate_id = $1")
            .bind(candidate_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
