use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::envelope::{non_blank, sort_key, Paging, SortOrder};
use crate::dto::job_dto::{
    JobListQuery, JobPostingRequest, JobPostingResponse, MyJobsQuery, TagJobsQuery,
};
use crate::dto::validators::clean;
use crate::error::{Error, Result};
use crate::models::job_posting::{json_list, JobPosting, JobPostingWithCompany, JobStatus, JOB_COLUMNS};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_RELATED: i64 = 20;

pub(crate) fn not_found() -> Error {
    Error::not_found("JOB_NOT_FOUND", "Job posting not found")
}

fn select_with_company() -> String {
    format!(
        "SELECT {}, e.company_name, e.company_logo
         FROM job_postings j
         JOIN employers e ON e.user_id = j.employer_id",
        JOB_COLUMNS
    )
}

const COUNT_WITH_COMPANY: &str =
    "SELECT COUNT(*) FROM job_postings j JOIN employers e ON e.user_id = j.employer_id";

/// Shared search/jobType/location/industry filters of the public listings.
fn push_listing_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    search: Option<&str>,
    job_type: Option<&str>,
    location: Option<&str>,
    industry: Option<&str>,
) {
    if let Some(search) = search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (j.job_title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.company_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(job_type) = job_type {
        qb.push(" AND LOWER(j.job_type) = LOWER(")
            .push_bind(job_type.to_string())
            .push(")");
    }
    if let Some(location) = location {
        qb.push(" AND j.location ILIKE ")
            .push_bind(format!("%{}%", location));
    }
    if let Some(industry) = industry {
        qb.push(" AND LOWER(j.industry) = LOWER(")
            .push_bind(industry.to_string())
            .push(")");
    }
}

fn salary_or_created_order(sort_by: Option<&str>, order: SortOrder) -> String {
    match sort_key(sort_by).as_str() {
        "salary" => match order {
            SortOrder::Asc => "j.salary_min ASC NULLS LAST".to_string(),
            SortOrder::Desc => "j.salary_max DESC NULLS LAST".to_string(),
        },
        _ => format!("j.created_at {}", order.as_sql()),
    }
}

pub async fn find(pool: &PgPool, id: Uuid) -> Result<JobPosting> {
    let sql = format!("SELECT {} FROM job_postings j WHERE j.id = $1", JOB_COLUMNS);
    sqlx::query_as::<_, JobPosting>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(not_found)
}

/// Posting owned by the employer; someone else's posting is reported as missing.
pub async fn find_owned(pool: &PgPool, employer_id: Uuid, id: Uuid) -> Result<JobPosting> {
    let sql = format!(
        "SELECT {} FROM job_postings j WHERE j.id = $1 AND j.employer_id = $2",
        JOB_COLUMNS
    );
    sqlx::query_as::<_, JobPosting>(&sql)
        .bind(id)
        .bind(employer_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(not_found)
}

#[derive(Clone)]
pub struct JobPostingRepository {
    pool: PgPool,
}

impl JobPostingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_with_company(&self, id: Uuid) -> Result<JobPostingResponse> {
        let sql = format!("{} WHERE j.id = $1", select_with_company());
        let row = sqlx::query_as::<_, JobPostingWithCompany>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(not_found)?;
        Ok(row.into())
    }

    fn push_public_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &JobListQuery) -> Result<()> {
        let status = match non_blank(&query.status) {
            Some(raw) => raw.parse()?,
            None => JobStatus::Active,
        };
        qb.push(" WHERE j.status = ").push_bind(status.as_str());
        push_listing_filters(
            qb,
            non_blank(&query.search),
            non_blank(&query.job_type),
            non_blank(&query.location),
            non_blank(&query.industry),
        );
        if let Some(level) = non_blank(&query.experience_level) {
            qb.push(" AND LOWER(j.experience_level) = LOWER(")
                .push_bind(level.to_string())
                .push(")");
        }
        if let Some(salary_min) = query.salary_min {
            qb.push(" AND j.salary_max >= ").push_bind(salary_min);
        }
        Ok(())
    }

    pub async fn list_public(&self, query: &JobListQuery) -> Result<(Vec<JobPostingResponse>, i64, Paging)> {
        let paging = Paging::new(query.page, query.page_size, DEFAULT_PAGE_SIZE);
        let order = SortOrder::parse(query.sort_order.as_deref());
        let order_by = match sort_key(query.sort_by.as_deref()).as_str() {
            "deadline" => format!("j.application_deadline {} NULLS LAST", order.as_sql()),
            "viewcount" => format!("j.view_count {}", order.as_sql()),
            _ => salary_or_created_order(query.sort_by.as_deref(), order),
        };

        let mut count = QueryBuilder::<Postgres>::new(COUNT_WITH_COMPANY);
        Self::push_public_filters(&mut count, query)?;
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut items = QueryBuilder::<Postgres>::new(select_with_company());
        Self::push_public_filters(&mut items, query)?;
        items
            .push(format!(" ORDER BY {}, j.id", order_by))
            .push(" LIMIT ")
            .push_bind(paging.page_size)
            .push(" OFFSET ")
            .push_bind(paging.offset());
        let rows: Vec<JobPostingWithCompany> = items.build_query_as().fetch_all(&self.pool).await?;

        Ok((rows.into_iter().map(Into::into).collect(), total, paging))
    }

    /// Job detail; every read counts as a view.
    pub async fn get_detail(&self, id: Uuid) -> Result<JobPostingResponse> {
        let res = sqlx::query("UPDATE job_postings SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(not_found());
        }
        self.fetch_with_company(id).await
    }

    pub async fn related(&self, id: Uuid, count: Option<i64>) -> Result<Vec<JobPostingResponse>> {
        let job = find(&self.pool, id).await?;
        let limit = count.unwrap_or(5).clamp(1, MAX_RELATED);
        let sql = format!(
            "{} WHERE j.status = $1 AND j.id <> $2
                AND (j.industry = $3 OR j.location = $4 OR j.job_type = $5)
             ORDER BY j.published_at DESC NULLS LAST, j.created_at DESC
             LIMIT $6",
            select_with_company()
        );
        let rows = sqlx::query_as::<_, JobPostingWithCompany>(&sql)
            .bind(JobStatus::Active.as_str())
            .bind(id)
            .bind(job.industry)
            .bind(job.location)
            .bind(job.job_type)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn push_tag_filters(qb: &mut QueryBuilder<'_, Postgres>, tag: &str, query: &TagJobsQuery) {
        qb.push(" WHERE j.status = ")
            .push_bind(JobStatus::Active.as_str())
            .push(" AND j.tags @> ")
            .push_bind(Json(vec![tag.to_string()]));
        push_listing_filters(
            qb,
            non_blank(&query.search),
            non_blank(&query.job_type),
            non_blank(&query.location),
            non_blank(&query.industry),
        );
    }

    pub async fn by_tag(&self, tag: &str, query: &TagJobsQuery) -> Result<(Vec<JobPostingResponse>, i64, Paging)> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(Error::bad_request("INVALID_VALUE", "Tag must not be blank"));
        }
        let paging = Paging::new(query.page, query.page_size, DEFAULT_PAGE_SIZE);
        let order = SortOrder::parse(query.sort_order.as_deref());
        let order_by = salary_or_created_order(query.sort_by.as_deref(), order);

        let mut count = QueryBuilder::<Postgres>::new(COUNT_WITH_COMPANY);
        Self::push_tag_filters(&mut count, tag, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut items = QueryBuilder::<Postgres>::new(select_with_company());
        Self::push_tag_filters(&mut items, tag, query);
        items
            .push(format!(" ORDER BY {}, j.id", order_by))
            .push(" LIMIT ")
            .push_bind(paging.page_size)
            .push(" OFFSET ")
            .push_bind(paging.offset());
        let rows: Vec<JobPostingWithCompany> = items.build_query_as().fetch_all(&self.pool).await?;

        Ok((rows.into_iter().map(Into::into).collect(), total, paging))
    }

    fn push_owner_filters(
        qb: &mut QueryBuilder<'_, Postgres>,
        employer_id: Uuid,
        query: &MyJobsQuery,
    ) -> Result<()> {
        qb.push(" WHERE j.employer_id = ").push_bind(employer_id);
        if let Some(status) = non_blank(&query.status) {
            let status: JobStatus = status.parse()?;
            qb.push(" AND j.status = ").push_bind(status.as_str());
        }
        if let Some(search) = non_blank(&query.search) {
            qb.push(" AND j.job_title ILIKE ")
                .push_bind(format!("%{}%", search));
        }
        Ok(())
    }

    pub async fn my_jobs(
        &self,
        employer_id: Uuid,
        query: &MyJobsQuery,
    ) -> Result<(Vec<JobPostingResponse>, i64, Paging)> {
        let paging = Paging::new(query.page, query.page_size, DEFAULT_PAGE_SIZE);

        let mut count = QueryBuilder::<Postgres>::new(COUNT_WITH_COMPANY);
        Self::push_owner_filters(&mut count, employer_id, query)?;
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut items = QueryBuilder::<Postgres>::new(select_with_company());
        Self::push_owner_filters(&mut items, employer_id, query)?;
        items
            .push(" ORDER BY j.created_at DESC, j.id")
            .push(" LIMIT ")
            .push_bind(paging.page_size)
            .push(" OFFSET ")
            .push_bind(paging.offset());
        let rows: Vec<JobPostingWithCompany> = items.build_query_as().fetch_all(&self.pool).await?;

        Ok((rows.into_iter().map(Into::into).collect(), total, paging))
    }

    /// New postings always start as Draft.
    pub async fn create(&self, employer_id: Uuid, req: JobPostingRequest) -> Result<JobPostingResponse> {
        req.check_salary_range()?;
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO job_postings (
                employer_id, job_title, job_description, requirements, benefits, salary_min, salary_max,
                salary_type, job_type, location, detailed_locations, industry, experience_level,
                years_of_experience_required, education_level, vacancy_count, application_deadline,
                working_hours, gender_requirement, required_skills, career_growth, tags, status
             ) VALUES (
                $1, $2, $3, $4, $5, $6, $7,
                COALESCE($8, 'Negotiable'), $9, $10, $11, $12, $13,
                $14, $15, COALESCE($16, 1), $17,
                $18, $19, $20, $21, $22, $23
             )
             RETURNING id",
        )
        .bind(employer_id)
        .bind(req.job_title.trim())
        .bind(req.job_description.trim())
        .bind(clean(req.requirements))
        .bind(clean(req.benefits))
        .bind(req.salary_min)
        .bind(req.salary_max)
        .bind(clean(req.salary_type))
        .bind(clean(req.job_type))
        .bind(clean(req.location))
        .bind(json_list(req.detailed_locations))
        .bind(clean(req.industry))
        .bind(clean(req.experience_level))
        .bind(req.years_of_experience_required)
        .bind(clean(req.education_level))
        .bind(req.vacancy_count)
        .bind(req.application_deadline)
        .bind(clean(req.working_hours))
        .bind(clean(req.gender_requirement))
        .bind(json_list(req.required_skills))
        .bind(clean(req.career_growth))
        .bind(json_list(req.tags))
        .bind(JobStatus::Draft.as_str())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(job_id = %id, employer_id = %employer_id, "job posting created");
        self.fetch_with_company(id).await
    }

    pub async fn update(&self, employer_id: Uuid, id: Uuid, req: JobPostingRequest) -> Result<JobPostingResponse> {
        req.check_salary_range()?;
        let res = sqlx::query(
            "UPDATE job_postings SET
                job_title = $3, job_description = $4, requirements = $5, benefits = $6,
                salary_min = $7, salary_max = $8, salary_type = COALESCE($9, salary_type),
                job_type = $10, location = $11, detailed_locations = $12, industry = $13,
                experience_level = $14, years_of_experience_required = $15, education_level = $16,
                vacancy_count = COALESCE($17, vacancy_count), application_deadline = $18,
                working_hours = $19, gender_requirement = $20, required_skills = $21,
                career_growth = $22, tags = $23, updated_at = NOW()
             WHERE id = $1 AND employer_id = $2",
        )
        .bind(id)
        .bind(employer_id)
        .bind(req.job_title.trim())
        .bind(req.job_description.trim())
        .bind(clean(req.requirements))
        .bind(clean(req.benefits))
        .bind(req.salary_min)
        .bind(req.salary_max)
        .bind(clean(req.salary_type))
        .bind(clean(req.job_type))
        .bind(clean(req.location))
        .bind(json_list(req.detailed_locations))
        .bind(clean(req.industry))
        .bind(clean(req.experience_level))
        .bind(req.years_of_experience_required)
        .bind(clean(req.education_level))
        .bind(req.vacancy_count)
        .bind(req.application_deadline)
        .bind(clean(req.working_hours))
        .bind(clean(req.gender_requirement))
        .bind(json_list(req.required_skills))
        .bind(clean(req.career_growth))
        .bind(json_list(req.tags))
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(not_found());
        }
        self.fetch_with_company(id).await
    }

    /// Changes the status; returns the posting and whether this was its first publication.
    pub async fn update_status(
        &self,
        employer_id: Uuid,
        id: Uuid,
        next: JobStatus,
    ) -> Result<(JobPostingResponse, bool)> {
        let current = find_owned(&self.pool, employer_id, id).await?;
        let newly_published = next == JobStatus::Active && current.published_at.is_none();

        sqlx::query(
            "UPDATE job_postings SET
                status = $2,
                published_at = CASE WHEN $2 = 'Active' AND published_at IS NULL THEN NOW() ELSE published_at END,
                closed_at = CASE WHEN $2 = 'Closed' AND closed_at IS NULL THEN NOW() ELSE closed_at END,
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(next.as_str())
        .execute(&self.pool)
        .await?;

        tracing::info!(job_id = %id, from = %current.status, to = %next, "job posting status changed");
        Ok((self.fetch_with_company(id).await?, newly_published))
    }

    pub async fn delete(&self, employer_id: Uuid, id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM job_postings WHERE id = $1 AND employer_id = $2")
            .bind(id)
            .bind(employer_id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(not_found());
        }
        tracing::info!(job_id = %id, employer_id = %employer_id, "job posting deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salary_sort_uses_min_ascending_and_max_descending() {
        assert_eq!(
            salary_or_created_order(Some("Salary"), SortOrder::Asc),
            "j.salary_min ASC NULLS LAST"
        );
        assert_eq!(
            salary_or_created_order(Some("salary"), SortOrder::Desc),
            "j.salary_max DESC NULLS LAST"
        );
        assert_eq!(
            salary_or_created_order(None, SortOrder::Desc),
            "j.created_at DESC"
        );
    }

    #[test]
    fn public_filters_default_to_active_postings() {
        let mut qb = QueryBuilder::<Postgres>::new(COUNT_WITH_COMPANY);
        JobPostingRepository::push_public_filters(&mut qb, &JobListQuery::default()).unwrap();
        let sql = qb.sql();
        assert!(sql.contains("WHERE j.status = $1"));
        assert!(!sql.contains("ILIKE"));
    }

    #[test]
    fn unknown_status_filter_is_rejected() {
        let mut qb = QueryBuilder::<Postgres>::new(COUNT_WITH_COMPANY);
        let query = JobListQuery {
            status: Some("Archived".into()),
            ..Default::default()
        };
        let err = JobPostingRepository::push_public_filters(&mut qb, &query).unwrap_err();
        assert_eq!(err.code(), "INVALID_VALUE");
    }

    #[test]
    fn salary_filter_compares_against_posting_maximum() {
        let mut qb = QueryBuilder::<Postgres>::new(COUNT_WITH_COMPANY);
        let query = JobListQuery {
            search: Some("rust".into()),
            salary_min: Some(rust_decimal::Decimal::new(1000, 0)),
            ..Default::default()
        };
        JobPostingRepository::push_public_filters(&mut qb, &query).unwrap();
        let sql = qb.sql();
        assert!(sql.contains("j.job_title ILIKE $2 OR e.company_name ILIKE $3"));
        assert!(sql.contains("j.salary_max >= $4"));
    }
}
