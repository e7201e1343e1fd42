use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::job_application::JobApplication;
use crate::utils::upload::MultipartForm;

/// Application joined with posting, company and candidate names.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationRow {
    #[sqlx(flatten)]
    pub application: JobApplication,
    pub job_title: String,
    pub employer_id: Uuid,
    pub company_name: String,
    pub candidate_name: String,
    pub candidate_email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub job_posting_id: Uuid,
    pub job_title: String,
    pub employer_id: Uuid,
    pub company_name: String,
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub cv_file_path: Option<String>,
    pub cover_letter: Option<String>,
    pub status: String,
    pub applied_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub employer_notes: Option<String>,
}

impl From<ApplicationRow> for ApplicationResponse {
    fn from(row: ApplicationRow) -> Self {
        let a = row.application;
        Self {
            id: a.id,
            job_posting_id: a.job_posting_id,
            job_title: row.job_title,
            employer_id: row.employer_id,
            company_name: row.company_name,
            candidate_id: a.candidate_id,
            candidate_name: row.candidate_name,
            candidate_email: row.candidate_email,
            cv_file_path: a.cv_file_path,
            cover_letter: a.cover_letter,
            status: a.status,
            applied_at: a.applied_at,
            reviewed_at: a.reviewed_at,
            employer_notes: a.employer_notes,
        }
    }
}

/// Candidate details an employer sees next to an application.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantSummary {
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub address: Option<String>,
    pub desired_position: Option<String>,
    pub desired_salary: Option<Decimal>,
    pub years_of_experience: Option<i32>,
    #[serde(serialize_with = "serialize_skills")]
    pub skills: Option<Json<Vec<String>>>,
    pub profile_completeness: i32,
}

fn serialize_skills<S: serde::Serializer>(
    skills: &Option<Json<Vec<String>>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let list: &[String] = skills.as_ref().map(|s| s.0.as_slice()).unwrap_or(&[]);
    serializer.collect_seq(list)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: ApplicationResponse,
    pub applicant: ApplicantSummary,
}

/// Fields of the multipart apply form.
#[derive(Debug, Clone, Validate)]
pub struct ApplyRequest {
    pub job_posting_id: Uuid,
    #[validate(length(max = 1000, message = "Cover letter must not exceed 1000 characters"))]
    pub cover_letter: Option<String>,
}

impl ApplyRequest {
    pub fn from_form(form: &MultipartForm) -> Result<Self> {
        let raw_id = form.text("jobPostingId").ok_or_else(|| {
            Error::bad_request("JOB_POSTING_ID_REQUIRED", "jobPostingId is required")
        })?;
        let job_posting_id = Uuid::parse_str(&raw_id)
            .map_err(|_| Error::bad_request("BAD_REQUEST", "jobPostingId must be a UUID"))?;
        Ok(Self {
            job_posting_id,
            cover_letter: form.text("coverLetter"),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApplicationStatusRequest {
    pub status: String,
    #[validate(length(max = 500, message = "Employer notes must not exceed 500 characters"))]
    pub employer_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyApplicationsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerApplicationsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_order: Option<String>,
    pub status: Option<String>,
    pub job_posting_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HasAppliedResponse {
    pub has_applied: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatistics {
    pub total: i64,
    pub by_status: Vec<StatusCount>,
}
