use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::dto::validators::validate_phone;
use crate::models::employer::Employer;

/// Employer row joined with its user record and posting counters.
#[derive(Debug, Clone, FromRow)]
pub struct EmployerRow {
    #[sqlx(flatten)]
    pub employer: Employer,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub total_job_postings: i64,
    pub active_job_postings: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerProfile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub account_status: String,
    pub company_name: String,
    pub company_website: Option<String>,
    pub company_description: Option<String>,
    pub tax_code: Option<String>,
    pub business_license_number: Option<String>,
    pub business_license_file: Option<String>,
    pub verification_status: String,
    pub verified_at: Option<DateTime<Utc>>,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub company_size: Option<String>,
    pub industry: Option<String>,
    pub company_logo: Option<String>,
    pub company_address: Option<String>,
    pub total_job_postings: i64,
    pub active_job_postings: i64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl From<EmployerRow> for EmployerProfile {
    fn from(row: EmployerRow) -> Self {
        let e = row.employer;
        Self {
            id: e.user_id,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            avatar: row.avatar,
            account_status: row.status,
            company_name: e.company_name,
            company_website: e.company_website,
            company_description: e.company_description,
            tax_code: e.tax_code,
            business_license_number: e.business_license_number,
            business_license_file: e.business_license_file,
            verification_status: e.verification_status,
            verified_at: e.verified_at,
            contact_person: e.contact_person,
            contact_email: e.contact_email,
            contact_phone: e.contact_phone,
            company_size: e.company_size,
            industry: e.industry,
            company_logo: e.company_logo,
            company_address: e.company_address,
            total_job_postings: row.total_job_postings,
            active_job_postings: row.active_job_postings,
            created_at: row.created_at,
            last_updated: e.last_updated,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployerProfileRequest {
    #[validate(length(min = 1, max = 200, message = "Company name must be 1 to 200 characters"))]
    pub company_name: Option<String>,
    #[validate(url(message = "Company website must be a URL"), length(max = 255))]
    pub company_website: Option<String>,
    pub company_description: Option<String>,
    #[validate(length(max = 50))]
    pub tax_code: Option<String>,
    #[validate(length(max = 100))]
    pub business_license_number: Option<String>,
    #[validate(length(max = 100))]
    pub contact_person: Option<String>,
    #[validate(email(message = "Contact email is invalid"))]
    pub contact_email: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub contact_phone: Option<String>,
    #[validate(length(max = 50))]
    pub company_size: Option<String>,
    #[validate(length(max = 100))]
    pub industry: Option<String>,
    #[validate(url(message = "Company logo must be a URL"))]
    pub company_logo: Option<String>,
    #[validate(length(max = 255))]
    pub company_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStatusResponse {
    pub verification_status: String,
    pub verified_at: Option<DateTime<Utc>>,
    pub business_license_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub employer_id: Uuid,
    pub company_name: String,
    pub company_website: Option<String>,
    pub company_description: Option<String>,
    pub company_logo: Option<String>,
    pub company_size: Option<String>,
    pub industry: Option<String>,
    pub company_address: Option<String>,
    pub verification_status: String,
    pub active_job_postings: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub search: Option<String>,
    pub verification_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmployerRequest {
    pub status: String,
}
