use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

text_enum!(JobStatus {
    Draft,
    Active,
    Closed,
    Expired,
});

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobPosting {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub job_title: String,
    pub job_description: String,
    pub requirements: Option<String>,
    pub benefits: Option<String>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub salary_type: String,
    pub job_type: Option<String>,
    pub location: Option<String>,
    pub detailed_locations: Option<Json<Vec<String>>>,
    pub industry: Option<String>,
    pub experience_level: Option<String>,
    pub years_of_experience_required: Option<i32>,
    pub education_level: Option<String>,
    pub vacancy_count: i32,
    pub application_deadline: Option<NaiveDate>,
    pub working_hours: Option<String>,
    pub gender_requirement: Option<String>,
    pub required_skills: Option<Json<Vec<String>>>,
    pub career_growth: Option<String>,
    pub tags: Option<Json<Vec<String>>>,
    pub status: String,
    pub view_count: i32,
    pub application_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl JobPosting {
    pub fn is_active(&self) -> bool {
        self.status == JobStatus::Active.as_str()
    }

    /// The deadline day itself is still open.
    pub fn deadline_passed(&self, today: NaiveDate) -> bool {
        self.application_deadline.is_some_and(|deadline| deadline < today)
    }
}

/// Posting row joined with its employer's company name.
#[derive(Debug, Clone, FromRow)]
pub struct JobPostingWithCompany {
    #[sqlx(flatten)]
    pub job: JobPosting,
    pub company_name: String,
    pub company_logo: Option<String>,
}

/// Qualified column list, usable in joins via the `j` alias.
pub const JOB_COLUMNS: &str = "j.id, j.employer_id, j.job_title, j.job_description, j.requirements, \
     j.benefits, j.salary_min, j.salary_max, j.salary_type, j.job_type, j.location, \
     j.detailed_locations, j.industry, j.experience_level, j.years_of_experience_required, \
     j.education_level, j.vacancy_count, j.application_deadline, j.working_hours, \
     j.gender_requirement, j.required_skills, j.career_growth, j.tags, j.status, j.view_count, \
     j.application_count, j.created_at, j.updated_at, j.published_at, j.closed_at";

/// Empty lists are stored as NULL.
pub fn json_list(values: Option<Vec<String>>) -> Option<Json<Vec<String>>> {
    let cleaned: Vec<String> = values
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(Json(cleaned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_lists_become_null() {
        assert!(json_list(None).is_none());
        assert!(json_list(Some(vec![" ".into(), String::new()])).is_none());
        let list = json_list(Some(vec![" rust ".into(), "sql".into()])).unwrap();
        assert_eq!(list.0, vec!["rust".to_string(), "sql".to_string()]);
    }

    #[test]
    fn job_status_parses_known_values() {
        assert_eq!("active".parse::<JobStatus>().unwrap(), JobStatus::Active);
        assert!("archived".parse::<JobStatus>().is_err());
    }
}
