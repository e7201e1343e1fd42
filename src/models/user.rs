use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

text_enum!(Role {
    Admin,
    Candidate,
    Employer,
});

text_enum!(UserStatus { Active, Locked });

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub is_external_account: bool,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub avatar: Option<String>,
    pub role: String,
    pub status: String,
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case(UserStatus::Active.as_str())
    }

    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

pub const USER_COLUMNS: &str = "id, full_name, email, phone, password_hash, is_external_account, \
     date_of_birth, gender, address, avatar, role, status, password_reset_token, \
     password_reset_expires_at, created_at, updated_at";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!("employer".parse::<Role>().unwrap(), Role::Employer);
        assert_eq!(" ADMIN ".parse::<Role>().unwrap(), Role::Admin);
        assert!("hr".parse::<Role>().is_err());
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in UserStatus::ALL {
            assert_eq!(status.as_str().parse::<UserStatus>().unwrap(), *status);
        }
    }
}
