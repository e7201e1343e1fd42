use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::validators::validate_not_blank;
use crate::error::{Error, Result};
use crate::models::job_posting::JobPostingWithCompany;

/// Create and full-replace payload for a job posting.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JobPostingRequest {
    #[validate(
        length(min = 1, max = 200, message = "Job title must be 1 to 200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub job_title: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub job_description: String,
    pub requirements: Option<String>,
    pub benefits: Option<String>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    #[validate(length(max = 50))]
    pub salary_type: Option<String>,
    #[validate(length(max = 50))]
    pub job_type: Option<String>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
    pub detailed_locations: Option<Vec<String>>,
    #[validate(length(max = 100))]
    pub industry: Option<String>,
    #[validate(length(max = 50))]
    pub experience_level: Option<String>,
    #[validate(range(min = 0, max = 60))]
    pub years_of_experience_required: Option<i32>,
    #[validate(length(max = 50))]
    pub education_level: Option<String>,
    #[validate(range(min = 1, max = 100, message = "Vacancy count must be between 1 and 100"))]
    pub vacancy_count: Option<i32>,
    pub application_deadline: Option<NaiveDate>,
    #[validate(length(max = 100))]
    pub working_hours: Option<String>,
    #[validate(length(max = 20))]
    pub gender_requirement: Option<String>,
    pub required_skills: Option<Vec<String>>,
    #[validate(length(max = 500))]
    pub career_growth: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl JobPostingRequest {
    pub fn check_salary_range(&self) -> Result<()> {
        let negative = |v: &Option<Decimal>| v.is_some_and(|d| d.is_sign_negative());
        if negative(&self.salary_min) || negative(&self.salary_max) {
            return Err(Error::bad_request(
                "INVALID_SALARY_RANGE",
                "Salary must not be negative",
            ));
        }
        if let (Some(min), Some(max)) = (self.salary_min, self.salary_max) {
            if min > max {
                return Err(Error::bad_request(
                    "INVALID_SALARY_RANGE",
                    "Minimum salary must not exceed maximum salary",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPostingResponse {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub company_name: String,
    pub company_logo: Option<String>,
    pub job_title: String,
    pub job_description: String,
    pub requirements: Option<String>,
    pub benefits: Option<String>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub salary_type: String,
    pub job_type: Option<String>,
    pub location: Option<String>,
    pub detailed_locations: Vec<String>,
    pub industry: Option<String>,
    pub experience_level: Option<String>,
    pub years_of_experience_required: Option<i32>,
    pub education_level: Option<String>,
    pub vacancy_count: i32,
    pub application_deadline: Option<NaiveDate>,
    pub working_hours: Option<String>,
    pub gender_requirement: Option<String>,
    pub required_skills: Vec<String>,
    pub career_growth: Option<String>,
    pub tags: Vec<String>,
    pub status: String,
    pub view_count: i32,
    pub application_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl From<JobPostingWithCompany> for JobPostingResponse {
    fn from(row: JobPostingWithCompany) -> Self {
        let j = row.job;
        let list = |v: Option<sqlx::types::Json<Vec<String>>>| v.map(|l| l.0).unwrap_or_default();
        Self {
            id: j.id,
            employer_id: j.employer_id,
            company_name: row.company_name,
            company_logo: row.company_logo,
            job_title: j.job_title,
            job_description: j.job_description,
            requirements: j.requirements,
            benefits: j.benefits,
            salary_min: j.salary_min,
            salary_max: j.salary_max,
            salary_type: j.salary_type,
            job_type: j.job_type,
            location: j.location,
            detailed_locations: list(j.detailed_locations),
            industry: j.industry,
            experience_level: j.experience_level,
            years_of_experience_required: j.years_of_experience_required,
            education_level: j.education_level,
            vacancy_count: j.vacancy_count,
            application_deadline: j.application_deadline,
            working_hours: j.working_hours,
            gender_requirement: j.gender_requirement,
            required_skills: list(j.required_skills),
            career_growth: j.career_growth,
            tags: list(j.tags),
            status: j.status,
            view_count: j.view_count,
            application_count: j.application_count,
            created_at: j.created_at,
            updated_at: j.updated_at,
            published_at: j.published_at,
            closed_at: j.closed_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub job_type: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub experience_level: Option<String>,
    pub salary_min: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyJobsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagJobsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub search: Option<String>,
    pub job_type: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedJobsQuery {
    pub count: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> JobPostingRequest {
        serde_json::from_value(serde_json::json!({
            "jobTitle": "Rust Engineer",
            "jobDescription": "Build services",
            "salaryMin": "1000",
            "salaryMax": "2000",
            "tags": ["rust", "backend"]
        }))
        .unwrap()
    }

    #[test]
    fn deserializes_camel_case_payload() {
        let req = request();
        assert_eq!(req.job_title, "Rust Engineer");
        assert_eq!(req.tags.as_deref().map(|t| t.len()), Some(2));
        assert!(req.validate().is_ok());
        assert!(req.check_salary_range().is_ok());
    }

    #[test]
    fn inverted_salary_range_is_rejected() {
        let mut req = request();
        req.salary_min = Some(Decimal::new(3000, 0));
        assert_eq!(
            req.check_salary_range().unwrap_err().code(),
            "INVALID_SALARY_RANGE"
        );
    }

    #[test]
    fn vacancy_count_is_bounded() {
        let mut req = request();
        req.vacancy_count = Some(101);
        assert!(req.validate().is_err());
        req.vacancy_count = Some(100);
        assert!(req.validate().is_ok());
    }
}
