use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::dto::validators::validate_phone;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub search: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Full name must be 1 to 100 characters"))]
    pub full_name: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 20))]
    pub gender: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserStatusRequest {
    pub status: String,
}
