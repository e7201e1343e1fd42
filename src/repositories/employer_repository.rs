use sqlx::{PgPool, Postgres, QueryBuilder};
use std::path::PathBuf;
use uuid::Uuid;

use crate::dto::employer_dto::{
    CompanyInfo, EmployerListQuery, EmployerProfile, EmployerRow, UpdateEmployerProfileRequest,
    VerificationStatusResponse,
};
use crate::dto::envelope::{non_blank, sort_key, Paging, SortOrder};
use crate::dto::validators::clean;
use crate::error::{Error, Result};
use crate::models::employer::{VerificationStatus, EMPLOYER_COLUMNS};
use crate::utils::upload::{self, UploadedFile};

fn not_found() -> Error {
    Error::not_found("EMPLOYER_NOT_FOUND", "Employer not found")
}

fn profile_select() -> String {
    format!(
        "SELECT {}, u.full_name, u.email, u.phone, u.avatar, u.status, u.created_at,
            (SELECT COUNT(*) FROM job_postings j WHERE j.employer_id = e.user_id) AS total_job_postings,
            (SELECT COUNT(*) FROM job_postings j WHERE j.employer_id = e.user_id AND j.status = 'Active') AS active_job_postings
         FROM employers e
         JOIN users u ON u.id = e.user_id",
        EMPLOYER_COLUMNS
    )
}

/// Employer profile joined with its account and posting counters.
pub async fn load_profile(pool: &PgPool, employer_id: Uuid) -> Result<EmployerProfile> {
    let sql = format!("{} WHERE e.user_id = $1", profile_select());
    let row = sqlx::query_as::<_, EmployerRow>(&sql)
        .bind(employer_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(not_found)?;
    Ok(row.into())
}

pub async fn verification_status_of(pool: &PgPool, employer_id: Uuid) -> Result<VerificationStatus> {
    let status: Option<String> =
        sqlx::query_scalar("SELECT verification_status FROM employers WHERE user_id = $1")
            .bind(employer_id)
            .fetch_optional(pool)
            .await?;
    status.ok_or_else(not_found)?.parse()
}

#[derive(Clone)]
pub struct EmployerRepository {
    pool: PgPool,
    uploads_dir: PathBuf,
}

impl EmployerRepository {
    pub fn new(pool: PgPool, uploads_dir: PathBuf) -> Self {
        Self { pool, uploads_dir }
    }

    pub async fn get_profile(&self, employer_id: Uuid) -> Result<EmployerProfile> {
        load_profile(&self.pool, employer_id).await
    }

    pub async fn update_profile(
        &self,
        employer_id: Uuid,
        req: UpdateEmployerProfileRequest,
    ) -> Result<EmployerProfile> {
        let res = sqlx::query(
            "UPDATE employers SET
                company_name = COALESCE($2, company_name),
                company_website = COALESCE($3, company_website),
                company_description = COALESCE($4, company_description),
                tax_code = COALESCE($5, tax_code),
                business_license_number = COALESCE($6, business_license_number),
                contact_person = COALESCE($7, contact_person),
                contact_email = COALESCE($8, contact_email),
                contact_phone = COALESCE($9, contact_phone),
                company_size = COALESCE($10, company_size),
                industry = COALESCE($11, industry),
                company_logo = COALESCE($12, company_logo),
                company_address = COALESCE($13, company_address),
                last_updated = NOW()
             WHERE user_id = $1",
        )
        .bind(employer_id)
        .bind(clean(req.company_name))
        .bind(clean(req.company_website))
        .bind(clean(req.company_description))
        .bind(clean(req.tax_code))
        .bind(clean(req.business_license_number))
        .bind(clean(req.contact_person))
        .bind(clean(req.contact_email).map(|e| e.to_ascii_lowercase()))
        .bind(clean(req.contact_phone))
        .bind(clean(req.company_size))
        .bind(clean(req.industry))
        .bind(clean(req.company_logo))
        .bind(clean(req.company_address))
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(not_found());
        }
        self.get_profile(employer_id).await
    }

    /// Stores a new license (already validated), resets verification and removes the old file.
    pub async fn replace_license(
        &self,
        employer_id: Uuid,
        file: UploadedFile,
    ) -> Result<VerificationStatusResponse> {
        let previous: Option<Option<String>> =
            sqlx::query_scalar("SELECT business_license_file FROM employers WHERE user_id = $1")
                .bind(employer_id)
                .fetch_optional(&self.pool)
                .await?;
        let previous = previous.ok_or_else(not_found)?;

        let stored_name = format!(
            "{}_{}",
            Uuid::new_v4(),
            upload::sanitize_file_name(&file.file_name)
        );
        let public_path = upload::store(
            &self.uploads_dir,
            &upload::BUSINESS_LICENSE,
            &stored_name,
            &file.data,
        )
        .await?;

        let updated = sqlx::query_as::<_, VerificationStatusResponse>(
            "UPDATE employers SET business_license_file = $2, verification_status = $3,
                verified_at = NULL, last_updated = NOW()
             WHERE user_id = $1
             RETURNING verification_status, verified_at, business_license_file",
        )
        .bind(employer_id)
        .bind(&public_path)
        .bind(VerificationStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await;
        let status = match updated {
            Ok(status) => status,
            Err(err) => {
                upload::remove(&self.uploads_dir, &public_path).await;
                return Err(err.into());
            }
        };

        if let Some(previous) = previous {
            upload::remove(&self.uploads_dir, &previous).await;
        }
        tracing::info!(employer_id = %employer_id, "business license replaced, verification reset");
        Ok(status)
    }

    pub async fn verification_status(&self, employer_id: Uuid) -> Result<VerificationStatusResponse> {
        sqlx::query_as::<_, VerificationStatusResponse>(
            "SELECT verification_status, verified_at, business_license_file
             FROM employers WHERE user_id = $1",
        )
        .bind(employer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(not_found)
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &EmployerListQuery) -> Result<()> {
        qb.push(" WHERE 1 = 1");
        if let Some(search) = non_blank(&query.search) {
            let pattern = format!("%{}%", search);
            qb.push(" AND (e.company_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR u.email ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(status) = non_blank(&query.verification_status) {
            let status: VerificationStatus = status.parse()?;
            qb.push(" AND e.verification_status = ")
                .push_bind(status.as_str());
        }
        Ok(())
    }

    pub async fn list_for_admin(
        &self,
        query: &EmployerListQuery,
    ) -> Result<(Vec<EmployerProfile>, i64, Paging)> {
        let paging = Paging::new(query.page, query.page_size, 10);
        let order = SortOrder::parse(query.sort_order.as_deref());
        let sort_column = match sort_key(query.sort_by.as_deref()).as_str() {
            "companyname" => "e.company_name",
            "verificationstatus" => "e.verification_status",
            _ => "u.created_at",
        };

        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM employers e JOIN users u ON u.id = e.user_id",
        );
        Self::push_filters(&mut count, query)?;
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut items = QueryBuilder::<Postgres>::new(profile_select());
        Self::push_filters(&mut items, query)?;
        items
            .push(format!(" ORDER BY {} {}, e.user_id", sort_column, order.as_sql()))
            .push(" LIMIT ")
            .push_bind(paging.page_size)
            .push(" OFFSET ")
            .push_bind(paging.offset());
        let rows: Vec<EmployerRow> = items.build_query_as().fetch_all(&self.pool).await?;

        Ok((rows.into_iter().map(EmployerProfile::from).collect(), total, paging))
    }

    /// Admin decision on a pending employer.
    pub async fn verify(&self, employer_id: Uuid, next: VerificationStatus) -> Result<EmployerProfile> {
        if next == VerificationStatus::Pending {
            return Err(Error::bad_request(
                "INVALID_VALUE",
                "Verification status must be Verified or Rejected",
            ));
        }
        let current = verification_status_of(&self.pool, employer_id).await?;
        if !current.can_transition_to(next) {
            return Err(Error::conflict(
                "INVALID_VERIFICATION_TRANSITION",
                format!("Employer is already {}", current),
            ));
        }

        // The status guard makes concurrent decisions on the same employer lose cleanly.
        let res = sqlx::query(
            "UPDATE employers SET verification_status = $2, verified_at = NOW(), last_updated = NOW()
             WHERE user_id = $1 AND verification_status = $3",
        )
        .bind(employer_id)
        .bind(next.as_str())
        .bind(current.as_str())
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(Error::conflict(
                "INVALID_VERIFICATION_TRANSITION",
                "Employer verification status changed concurrently",
            ));
        }
        tracing::info!(employer_id = %employer_id, status = %next, "employer verification decided");
        self.get_profile(employer_id).await
    }

    pub async fn company_info(&self, employer_id: Uuid) -> Result<CompanyInfo> {
        sqlx::query_as::<_, CompanyInfo>(
            "SELECT e.user_id AS employer_id, e.company_name, e.company_website, e.company_description,
                    e.company_logo, e.company_size, e.industry, e.company_address, e.verification_status,
                    (SELECT COUNT(*) FROM job_postings j
                     WHERE j.employer_id = e.user_id AND j.status = 'Active') AS active_job_postings
             FROM employers e
             WHERE e.user_id = $1",
        )
        .bind(employer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(not_found)
    }
}
