use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

text_enum!(VerificationStatus {
    Pending,
    Verified,
    Rejected,
});

impl VerificationStatus {
    /// Admin review only decides pending employers.
    pub fn can_transition_to(&self, next: VerificationStatus) -> bool {
        matches!(
            (self, next),
            (
                VerificationStatus::Pending,
                VerificationStatus::Verified | VerificationStatus::Rejected
            )
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employer {
    pub user_id: Uuid,
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
    pub last_updated: DateTime<Utc>,
}

pub const EMPLOYER_COLUMNS: &str = "user_id, company_name, company_website, company_description, \
     tax_code, business_license_number, business_license_file, verification_status, verified_at, \
     contact_person, contact_email, contact_phone, company_size, industry, company_logo, \
     company_address, last_updated";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Administrator {
    pub user_id: Uuid,
    pub admin_role: String,
    pub department: Option<String>,
    pub internal_title: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_employers_can_be_decided() {
        use VerificationStatus::*;
        assert!(Pending.can_transition_to(Verified));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Verified.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Verified));
    }
}
