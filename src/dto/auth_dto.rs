use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::validators::validate_phone;
use crate::utils::upload::MultipartForm;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Email or phone number.
    #[validate(length(min = 1, message = "Email or phone is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCandidateRequest {
    #[validate(length(min = 1, max = 100, message = "Full name must be 1 to 100 characters"))]
    pub full_name: String,
    #[validate(email(message = "Email is invalid"), length(max = 255))]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(length(min = 8, max = 20, message = "Password must be 8 to 20 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 20))]
    pub gender: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAdminRequest {
    #[validate(length(min = 1, max = 100, message = "Full name must be 1 to 100 characters"))]
    pub full_name: String,
    #[validate(email(message = "Email is invalid"), length(max = 255))]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(length(min = 8, max = 20, message = "Password must be 8 to 20 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
    #[validate(length(max = 50))]
    pub admin_role: Option<String>,
    #[validate(length(max = 100))]
    pub department: Option<String>,
    #[validate(length(max = 100))]
    pub internal_title: Option<String>,
}

/// Text part of the multipart employer registration form.
#[derive(Debug, Clone, Default, Validate)]
pub struct RegisterEmployerRequest {
    #[validate(length(min = 1, max = 100, message = "Full name must be 1 to 100 characters"))]
    pub full_name: String,
    #[validate(email(message = "Email is invalid"), length(max = 255))]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(length(min = 8, max = 20, message = "Password must be 8 to 20 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
    #[validate(length(min = 1, max = 200, message = "Company name must be 1 to 200 characters"))]
    pub company_name: String,
    #[validate(url(message = "Company website must be a URL"), length(max = 255))]
    pub company_website: Option<String>,
    pub company_description: Option<String>,
    #[validate(length(max = 50))]
    pub tax_code: Option<String>,
    #[validate(length(max = 100))]
    pub business_license_number: Option<String>,
    #[validate(length(max = 50))]
    pub company_size: Option<String>,
    #[validate(length(max = 100))]
    pub industry: Option<String>,
    #[validate(length(max = 255))]
    pub company_address: Option<String>,
    #[validate(length(max = 100))]
    pub contact_person: Option<String>,
    #[validate(email(message = "Contact email is invalid"))]
    pub contact_email: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub contact_phone: Option<String>,
}

impl RegisterEmployerRequest {
    pub fn from_form(form: &MultipartForm) -> Self {
        Self {
            full_name: form.text("fullName").unwrap_or_default(),
            email: form.text("email").unwrap_or_default(),
            phone: form.text("phone"),
            // passwords are taken verbatim
            password: form.fields.get("password").cloned().unwrap_or_default(),
            confirm_password: form
                .fields
                .get("confirmPassword")
                .cloned()
                .unwrap_or_default(),
            company_name: form.text("companyName").unwrap_or_default(),
            company_website: form.text("companyWebsite"),
            company_description: form.text("companyDescription"),
            tax_code: form.text("taxCode"),
            business_license_number: form.text("businessLicenseNumber"),
            company_size: form.text("companySize"),
            industry: form.text("industry"),
            company_address: form.text("companyAddress"),
            contact_person: form.text("contactPerson"),
            contact_email: form.text("contactEmail"),
            contact_phone: form.text("contactPhone"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Email is invalid"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
    #[validate(length(min = 8, max = 20, message = "Password must be 8 to 20 characters"))]
    pub new_password: String,
    #[validate(must_match(other = "new_password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> RegisterCandidateRequest {
        RegisterCandidateRequest {
            full_name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            phone: Some("0903000001".into()),
            password: "Candidate@123".into(),
            confirm_password: "Candidate@123".into(),
            date_of_birth: None,
            gender: None,
            address: None,
        }
    }

    #[test]
    fn valid_candidate_registration_passes() {
        assert!(candidate().validate().is_ok());
    }

    #[test]
    fn mismatched_passwords_fail() {
        let mut req = candidate();
        req.confirm_password = "Different@123".into();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("confirm_password"));
    }

    #[test]
    fn short_password_and_bad_phone_fail() {
        let mut req = candidate();
        req.password = "short".into();
        req.confirm_password = "short".into();
        req.phone = Some("abc".into());
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("phone"));
    }
}
