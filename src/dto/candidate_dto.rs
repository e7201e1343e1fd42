use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dto::profile_dto::UserProfile;
use crate::dto::validators::validate_not_blank;
use crate::models::candidate::{Candidate, Education, Experience};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfile {
    #[serde(flatten)]
    pub user: UserProfile,
    pub desired_position: Option<String>,
    pub desired_salary: Option<Decimal>,
    pub years_of_experience: Option<i32>,
    pub job_type: Option<String>,
    pub desired_location: Option<String>,
    pub cv_file_name: Option<String>,
    pub cv_file_path: Option<String>,
    pub cv_uploaded_at: Option<DateTime<Utc>>,
    pub skills: Vec<String>,
    pub profile_completeness: i32,
    pub last_updated: DateTime<Utc>,
    pub educations: Vec<Education>,
    pub experiences: Vec<Experience>,
}

impl CandidateProfile {
    pub fn new(
        user: UserProfile,
        candidate: Candidate,
        educations: Vec<Education>,
        experiences: Vec<Experience>,
    ) -> Self {
        let skills = candidate.skill_list();
        Self {
            user,
            desired_position: candidate.desired_position,
            desired_salary: candidate.desired_salary,
            years_of_experience: candidate.years_of_experience,
            job_type: candidate.job_type,
            desired_location: candidate.desired_location,
            cv_file_name: candidate.cv_file_name,
            cv_file_path: candidate.cv_file_path,
            cv_uploaded_at: candidate.cv_uploaded_at,
            skills,
            profile_completeness: candidate.profile_completeness,
            last_updated: candidate.last_updated,
            educations,
            experiences,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCandidateProfileRequest {
    #[validate(length(max = 100))]
    pub desired_position: Option<String>,
    pub desired_salary: Option<Decimal>,
    #[validate(range(min = 0, max = 60, message = "Years of experience must be between 0 and 60"))]
    pub years_of_experience: Option<i32>,
    #[validate(length(max = 50))]
    pub job_type: Option<String>,
    #[validate(length(max = 100))]
    pub desired_location: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSkillsRequest {
    #[validate(length(max = 50, message = "At most 50 skills are allowed"))]
    pub skills: Vec<String>,
}

/// Trimmed, de-duplicated (case-insensitively) skill list in input order.
pub fn normalize_skills(skills: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CvResponse {
    pub cv_file_name: String,
    pub cv_file_path: String,
    pub profile_completeness: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EducationRequest {
    #[validate(
        length(min = 1, max = 200, message = "Institution name must be 1 to 200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub institution_name: String,
    #[validate(length(max = 100))]
    pub degree: Option<String>,
    #[validate(length(max = 100))]
    pub major: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceRequest {
    #[validate(
        length(min = 1, max = 200, message = "Company name must be 1 to 200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub company_name: String,
    #[validate(
        length(min = 1, max = 100, message = "Position must be 1 to 100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub position: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skills_are_trimmed_and_deduplicated() {
        let skills = normalize_skills(vec![
            " Rust ".into(),
            "rust".into(),
            "".into(),
            "SQL".into(),
        ]);
        assert_eq!(skills, vec!["Rust".to_string(), "SQL".to_string()]);
    }
}
