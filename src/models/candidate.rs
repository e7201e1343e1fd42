use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Candidate {
    pub user_id: Uuid,
    pub desired_position: Option<String>,
    pub desired_salary: Option<Decimal>,
    pub years_of_experience: Option<i32>,
    pub job_type: Option<String>,
    pub desired_location: Option<String>,
    pub cv_file_name: Option<String>,
    pub cv_file_path: Option<String>,
    pub cv_uploaded_at: Option<DateTime<Utc>>,
    pub skills: Option<Json<Vec<String>>>,
    pub profile_completeness: i32,
    pub last_updated: DateTime<Utc>,
}

impl Candidate {
    pub fn skill_list(&self) -> Vec<String> {
        self.skills.as_ref().map(|s| s.0.clone()).unwrap_or_default()
    }
}

pub const CANDIDATE_COLUMNS: &str = "user_id, desired_position, desired_salary, years_of_experience, \
     job_type, desired_location, cv_file_name, cv_file_path, cv_uploaded_at, skills, \
     profile_completeness, last_updated";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub institution_name: String,
    pub degree: Option<String>,
    pub major: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub company_name: String,
    pub position: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Everything the completeness score looks at, gathered in one row.
#[derive(Debug, Clone, Default, FromRow)]
pub struct CompletenessInput {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub avatar: Option<String>,
    pub desired_position: Option<String>,
    pub desired_salary: Option<Decimal>,
    pub years_of_experience: Option<i32>,
    pub skills: Option<Json<Vec<String>>>,
    pub cv_file_path: Option<String>,
    pub has_education: bool,
    pub has_experience: bool,
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Weighted checklist score in `0..=100`.
pub fn profile_completeness(input: &CompletenessInput) -> i32 {
    let checks = [
        (filled(&input.full_name), 5),
        (filled(&input.email), 5),
        (filled(&input.phone), 5),
        (filled(&input.address), 5),
        (filled(&input.avatar), 10),
        (filled(&input.desired_position), 10),
        (input.desired_salary.is_some(), 5),
        (input.years_of_experience.is_some(), 5),
        (
            input
                .skills
                .as_ref()
                .is_some_and(|s| s.0.iter().any(|skill| !skill.trim().is_empty())),
            10,
        ),
        (filled(&input.cv_file_path), 20),
        (input.has_education, 10),
        (input.has_experience, 10),
    ];

    let score: i32 = checks
        .iter()
        .filter(|(present, _)| *present)
        .map(|(_, weight)| weight)
        .sum();
    score.min(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> CompletenessInput {
        CompletenessInput {
            full_name: Some("Jane Doe".into()),
            email: Some("jane@example.com".into()),
            phone: Some("0901000001".into()),
            address: Some("1 Main St".into()),
            avatar: Some("/Uploads/Avatars/a.png".into()),
            desired_position: Some("Backend Engineer".into()),
            desired_salary: Some(Decimal::new(1500, 0)),
            years_of_experience: Some(3),
            skills: Some(Json(vec!["Rust".into()])),
            cv_file_path: Some("/Uploads/CVs/cv.pdf".into()),
            has_education: true,
            has_experience: true,
        }
    }

    #[test]
    fn empty_profile_scores_zero() {
        assert_eq!(profile_completeness(&CompletenessInput::default()), 0);
    }

    #[test]
    fn full_profile_scores_hundred() {
        assert_eq!(profile_completeness(&complete()), 100);
    }

    #[test]
    fn each_item_moves_score_by_its_weight() {
        let full = profile_completeness(&complete());

        let mut no_cv = complete();
        no_cv.cv_file_path = None;
        assert_eq!(profile_completeness(&no_cv), full - 20);

        let mut no_edu = complete();
        no_edu.has_education = false;
        assert_eq!(profile_completeness(&no_edu), full - 10);

        let mut blank_phone = complete();
        blank_phone.phone = Some("   ".into());
        assert_eq!(profile_completeness(&blank_phone), full - 5);

        let mut blank_skills = complete();
        blank_skills.skills = Some(Json(vec![" ".into()]));
        assert_eq!(profile_completeness(&blank_skills), full - 10);
    }

    #[test]
    fn adding_an_item_increases_score() {
        let mut input = CompletenessInput {
            full_name: Some("Jane".into()),
            email: Some("jane@example.com".into()),
            ..Default::default()
        };
        let before = profile_completeness(&input);
        input.desired_position = Some("QA".into());
        assert_eq!(profile_completeness(&input), before + 10);
    }
}
