use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::path::PathBuf;
use uuid::Uuid;

use crate::dto::application_dto::{
    ApplicantSummary, ApplicationDetail, ApplicationResponse, ApplicationRow, ApplicationStatistics,
    ApplyRequest, EmployerApplicationsQuery, MyApplicationsQuery, StatusCount,
    UpdateApplicationStatusRequest,
};
use crate::dto::envelope::{non_blank, sort_key, Paging, SortOrder};
use crate::dto::validators::clean;
use crate::error::{Error, Result};
use crate::models::job_application::{ApplicationStatus, APPLICATION_COLUMNS};
use crate::utils::upload::{self, UploadedFile};

use super::candidate_repository::CandidateRepository;
use super::job_posting_repository;

const DEFAULT_PAGE_SIZE: i64 = 10;

fn not_found() -> Error {
    Error::not_found("APPLICATION_NOT_FOUND", "Application not found")
}

fn select_rows() -> String {
    format!(
        "SELECT {}, j.job_title, j.employer_id, e.company_name,
                u.full_name AS candidate_name, u.email AS candidate_email
         FROM job_applications a
         JOIN job_postings j ON j.id = a.job_posting_id
         JOIN employers e ON e.user_id = j.employer_id
         JOIN users u ON u.id = a.candidate_id",
        APPLICATION_COLUMNS
    )
}

const COUNT_ROWS: &str = "SELECT COUNT(*) FROM job_applications a
     JOIN job_postings j ON j.id = a.job_posting_id";

/// Every status appears once, in pipeline order, with missing ones as zero.
pub fn zero_filled_statistics(counts: &[(String, i64)]) -> ApplicationStatistics {
    let by_status: Vec<StatusCount> = ApplicationStatus::ALL
        .iter()
        .map(|status| StatusCount {
            status: status.as_str().to_string(),
            count: counts
                .iter()
                .filter(|(name, _)| name.eq_ignore_ascii_case(status.as_str()))
                .map(|(_, count)| *count)
                .sum(),
        })
        .collect();
    ApplicationStatistics {
        total: by_status.iter().map(|s| s.count).sum(),
        by_status,
    }
}

/// Files the candidate uploaded with an application, as opposed to their profile CV.
fn is_application_upload(path: &str) -> bool {
    path.starts_with(&format!("{}/{}/", upload::PUBLIC_PREFIX, upload::APPLICATION_CV.subdir))
}

#[derive(Clone)]
pub struct JobApplicationRepository {
    pool: PgPool,
    uploads_dir: PathBuf,
    candidates: CandidateRepository,
}

impl JobApplicationRepository {
    pub fn new(pool: PgPool, uploads_dir: PathBuf) -> Self {
        let candidates = CandidateRepository::new(pool.clone(), uploads_dir.clone());
        Self {
            pool,
            uploads_dir,
            candidates,
        }
    }

    async fn fetch_row(&self, id: Uuid) -> Result<ApplicationResponse> {
        let sql = format!("{} WHERE a.id = $1", select_rows());
        let row = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(not_found)?;
        Ok(row.into())
    }

    pub async fn has_applied(&self, candidate_id: Uuid, job_posting_id: Uuid) -> Result<bool> {
        let applied: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM job_applications WHERE candidate_id = $1 AND job_posting_id = $2)",
        )
        .bind(candidate_id)
        .bind(job_posting_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(applied)
    }

    /// Applies to an Active posting with either an uploaded CV (already validated) or the profile CV.
    pub async fn apply(
        &self,
        candidate_id: Uuid,
        req: ApplyRequest,
        cv_upload: Option<(UploadedFile, String)>,
    ) -> Result<ApplicationResponse> {
        let job = job_posting_repository::find(&self.pool, req.job_posting_id).await?;
        if !job.is_active() {
            return Err(Error::bad_request(
                "JOB_NOT_ACTIVE",
                "This job posting is not accepting applications",
            ));
        }
        if job.deadline_passed(Utc::now().date_naive()) {
            return Err(Error::bad_request(
                "DEADLINE_PASSED",
                "The application deadline has passed",
            ));
        }
        if self.has_applied(candidate_id, job.id).await? {
            return Err(Error::conflict(
                "ALREADY_APPLIED",
                "You have already applied to this job",
            ));
        }

        let (cv_path, uploaded) = match cv_upload {
            Some((file, ext)) => {
                let stored_name = format!("{}_{}.{}", candidate_id, Uuid::new_v4(), ext);
                let path =
                    upload::store(&self.uploads_dir, &upload::APPLICATION_CV, &stored_name, &file.data)
                        .await?;
                (path, true)
            }
            None => match self.candidates.profile_cv(candidate_id).await? {
                Some(path) => (path, false),
                None => {
                    return Err(Error::bad_request(
                        "CV_REQUIRED",
                        "Upload a CV or add one to your profile before applying",
                    ))
                }
            },
        };

        let inserted = self
            .insert_application(candidate_id, job.id, &cv_path, clean(req.cover_letter))
            .await;
        let id = match inserted {
            Ok(id) => id,
            Err(err) => {
                if uploaded {
                    upload::remove(&self.uploads_dir, &cv_path).await;
                }
                return Err(err);
            }
        };

        tracing::info!(application_id = %id, job_id = %job.id, candidate_id = %candidate_id, "application submitted");
        self.fetch_row(id).await
    }

    async fn insert_application(
        &self,
        candidate_id: Uuid,
        job_posting_id: Uuid,
        cv_path: &str,
        cover_letter: Option<String>,
    ) -> Result<Uuid> {
        let mut tx = self.pool.begin().await?;
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO job_applications (job_posting_id, candidate_id, cv_file_path, cover_letter, status)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(job_posting_id)
        .bind(candidate_id)
        .bind(cv_path)
        .bind(cover_letter)
        .bind(ApplicationStatus::Submitted.as_str())
        .fetch_one(&mut *tx)
        .await?;
        sqlx::query("UPDATE job_postings SET application_count = application_count + 1 WHERE id = $1")
            .bind(job_posting_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(id)
    }

    fn push_candidate_filters(
        qb: &mut QueryBuilder<'_, Postgres>,
        candidate_id: Uuid,
        query: &MyApplicationsQuery,
    ) -> Result<()> {
        qb.push(" WHERE a.candidate_id = ").push_bind(candidate_id);
        if let Some(status) = non_blank(&query.status) {
            let status: ApplicationStatus = status.parse()?;
            qb.push(" AND a.status = ").push_bind(status.as_str());
        }
        Ok(())
    }

    pub async fn my_applications(
        &self,
        candidate_id: Uuid,
        query: &MyApplicationsQuery,
    ) -> Result<(Vec<ApplicationResponse>, i64, Paging)> {
        let paging = Paging::new(query.page, query.page_size, DEFAULT_PAGE_SIZE);
        let order = SortOrder::parse(query.sort_order.as_deref());
        let sort_column = match sort_key(query.sort_by.as_deref()).as_str() {
            "status" => "a.status",
            _ => "a.applied_at",
        };

        let mut count = QueryBuilder::<Postgres>::new(COUNT_ROWS);
        Self::push_candidate_filters(&mut count, candidate_id, query)?;
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut items = QueryBuilder::<Postgres>::new(select_rows());
        Self::push_candidate_filters(&mut items, candidate_id, query)?;
        items
            .push(format!(" ORDER BY {} {}, a.id", sort_column, order.as_sql()))
            .push(" LIMIT ")
            .push_bind(paging.page_size)
            .push(" OFFSET ")
            .push_bind(paging.offset());
        let rows: Vec<ApplicationRow> = items.build_query_as().fetch_all(&self.pool).await?;

        Ok((rows.into_iter().map(Into::into).collect(), total, paging))
    }

    pub async fn get_own(&self, candidate_id: Uuid, id: Uuid) -> Result<ApplicationResponse> {
        let application = self.fetch_row(id).await?;
        if application.candidate_id != candidate_id {
            return Err(not_found());
        }
        Ok(application)
    }

    /// Removes an application that is still Submitted or Reviewing and decrements the posting counter.
    pub async fn withdraw(&self, candidate_id: Uuid, id: Uuid) -> Result<()> {
        let application = self.get_own(candidate_id, id).await?;
        let status: ApplicationStatus = application.status.parse()?;
        if !status.can_withdraw() {
            return Err(Error::bad_request(
                "CANNOT_WITHDRAW",
                format!("Applications in status {} can no longer be withdrawn", status),
            ));
        }

        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query(
            "DELETE FROM job_applications WHERE id = $1 AND candidate_id = $2 AND status = $3",
        )
        .bind(id)
        .bind(candidate_id)
        .bind(status.as_str())
        .execute(&mut *tx)
        .await?;
        if removed.rows_affected() == 0 {
            return Err(Error::bad_request(
                "CANNOT_WITHDRAW",
                "The application changed while it was being withdrawn",
            ));
        }
        sqlx::query(
            "UPDATE job_postings SET application_count = GREATEST(application_count - 1, 0) WHERE id = $1",
        )
        .bind(application.job_posting_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        if let Some(path) = application.cv_file_path.as_deref().filter(|p| is_application_upload(p)) {
            upload::remove(&self.uploads_dir, path).await;
        }
        tracing::info!(application_id = %id, candidate_id = %candidate_id, "application withdrawn");
        Ok(())
    }

    fn push_employer_filters(
        qb: &mut QueryBuilder<'_, Postgres>,
        employer_id: Uuid,
        status: Option<&str>,
        job_posting_id: Option<Uuid>,
    ) -> Result<()> {
        qb.push(" WHERE j.employer_id = ").push_bind(employer_id);
        if let Some(status) = status {
            let status: ApplicationStatus = status.parse()?;
            qb.push(" AND a.status = ").push_bind(status.as_str());
        }
        if let Some(job_posting_id) = job_posting_id {
            qb.push(" AND a.job_posting_id = ").push_bind(job_posting_id);
        }
        Ok(())
    }

    async fn employer_page(
        &self,
        employer_id: Uuid,
        job_posting_id: Option<Uuid>,
        query: &EmployerApplicationsQuery,
    ) -> Result<(Vec<ApplicationResponse>, i64, Paging)> {
        let paging = Paging::new(query.page, query.page_size, DEFAULT_PAGE_SIZE);
        let order = SortOrder::parse(query.sort_order.as_deref());
        let status = non_blank(&query.status);

        let mut count = QueryBuilder::<Postgres>::new(COUNT_ROWS);
        Self::push_employer_filters(&mut count, employer_id, status, job_posting_id)?;
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut items = QueryBuilder::<Postgres>::new(select_rows());
        Self::push_employer_filters(&mut items, employer_id, status, job_posting_id)?;
        items
            .push(format!(" ORDER BY a.applied_at {}, a.id", order.as_sql()))
            .push(" LIMIT ")
            .push_bind(paging.page_size)
            .push(" OFFSET ")
            .push_bind(paging.offset());
        let rows: Vec<ApplicationRow> = items.build_query_as().fetch_all(&self.pool).await?;

        Ok((rows.into_iter().map(Into::into).collect(), total, paging))
    }

    pub async fn employer_all(
        &self,
        employer_id: Uuid,
        query: &EmployerApplicationsQuery,
    ) -> Result<(Vec<ApplicationResponse>, i64, Paging)> {
        self.employer_page(employer_id, query.job_posting_id, query).await
    }

    pub async fn employer_by_job(
        &self,
        employer_id: Uuid,
        job_posting_id: Uuid,
        query: &EmployerApplicationsQuery,
    ) -> Result<(Vec<ApplicationResponse>, i64, Paging)> {
        job_posting_repository::find_owned(&self.pool, employer_id, job_posting_id).await?;
        self.employer_page(employer_id, Some(job_posting_id), query).await
    }

    async fn get_for_employer(&self, employer_id: Uuid, id: Uuid) -> Result<ApplicationResponse> {
        let application = self.fetch_row(id).await?;
        if application.employer_id != employer_id {
            return Err(not_found());
        }
        Ok(application)
    }

    pub async fn employer_detail(&self, employer_id: Uuid, id: Uuid) -> Result<ApplicationDetail> {
        let application = self.get_for_employer(employer_id, id).await?;
        let applicant = sqlx::query_as::<_, ApplicantSummary>(
            "SELECT u.phone, u.avatar, u.address, c.desired_position, c.desired_salary,
                    c.years_of_experience, c.skills, c.profile_completeness
             FROM candidates c
             JOIN users u ON u.id = c.user_id
             WHERE c.user_id = $1",
        )
        .bind(application.candidate_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::not_found("CANDIDATE_NOT_FOUND", "Candidate not found"))?;
        Ok(ApplicationDetail {
            application,
            applicant,
        })
    }

    pub async fn update_status(
        &self,
        employer_id: Uuid,
        id: Uuid,
        req: UpdateApplicationStatusRequest,
    ) -> Result<ApplicationResponse> {
        let next: ApplicationStatus = req.status.parse()?;
        let application = self.get_for_employer(employer_id, id).await?;
        let current: ApplicationStatus = application.status.parse()?;
        if !current.can_transition_to(next) {
            return Err(Error::bad_request(
                "INVALID_STATUS_TRANSITION",
                format!("Cannot move an application from {} to {}", current, next),
            ));
        }

        let res = sqlx::query(
            "UPDATE job_applications SET status = $2, reviewed_at = NOW(),
                employer_notes = COALESCE($3, employer_notes)
             WHERE id = $1 AND status = $4",
        )
        .bind(id)
        .bind(next.as_str())
        .bind(clean(req.employer_notes))
        .bind(current.as_str())
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(Error::bad_request(
                "INVALID_STATUS_TRANSITION",
                "The application status changed concurrently",
            ));
        }

        tracing::info!(application_id = %id, from = %current, to = %next, "application status changed");
        self.fetch_row(id).await
    }

    pub async fn statistics(&self, employer_id: Uuid) -> Result<ApplicationStatistics> {
        let counts: Vec<(String, i64)> = sqlx::query_as(
            "SELECT a.status, COUNT(*)
             FROM job_applications a
             JOIN job_postings j ON j.id = a.job_posting_id
             WHERE j.employer_id = $1
             GROUP BY a.status",
        )
        .bind(employer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(zero_filled_statistics(&counts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_include_every_status() {
        let stats = zero_filled_statistics(&[
            ("Submitted".to_string(), 3),
            ("Accepted".to_string(), 1),
        ]);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.by_status.len(), ApplicationStatus::ALL.len());
        assert_eq!(
            stats.by_status[0],
            StatusCount {
                status: "Submitted".into(),
                count: 3
            }
        );
        let rejected = stats.by_status.iter().find(|s| s.status == "Rejected").unwrap();
        assert_eq!(rejected.count, 0);
    }

    #[test]
    fn empty_statistics_are_all_zero() {
        let stats = zero_filled_statistics(&[]);
        assert_eq!(stats.total, 0);
        assert!(stats.by_status.iter().all(|s| s.count == 0));
    }

    #[test]
    fn only_application_uploads_are_deleted_on_withdraw() {
        assert!(is_application_upload("/Uploads/ApplicationCVs/a_b.pdf"));
        assert!(!is_application_upload("/Uploads/CVs/profile.pdf"));
    }
}
