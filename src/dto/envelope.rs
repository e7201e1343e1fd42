//! Uniform response envelope shared by every endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResult<T> {
    pub is_success: bool,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResult<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, data, message)
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::CREATED, data, message)
    }

    fn with_status(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            is_success: true,
            status: status.as_u16(),
            error_code: None,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResult<()> {
    /// Success without a payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            is_success: true,
            status: StatusCode::OK.as_u16(),
            error_code: None,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResult<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub is_success: bool,
    pub status: u16,
    pub message: String,
    pub data: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total_records: i64,
    pub total_pages: i64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T: Serialize> PagedResult<T> {
    pub fn new(data: Vec<T>, total_records: i64, paging: Paging, message: impl Into<String>) -> Self {
        let total_pages = total_pages(total_records, paging.page_size);
        Self {
            is_success: true,
            status: StatusCode::OK.as_u16(),
            message: message.into(),
            data,
            page: paging.page,
            page_size: paging.page_size,
            total_records,
            total_pages,
            has_previous_page: paging.page > 1,
            has_next_page: paging.page < total_pages,
        }
    }
}

impl<T: Serialize> IntoResponse for PagedResult<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub fn total_pages(total_records: i64, page_size: i64) -> i64 {
    if page_size <= 0 || total_records <= 0 {
        return 0;
    }
    (total_records + page_size - 1) / page_size
}

/// Offset pagination derived from `page`/`pageSize` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: i64,
    pub page_size: i64,
}

impl Paging {
    pub fn new(page: Option<i64>, page_size: Option<i64>, default_size: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(default_size).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than `asc` sorts descending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if value.trim().eq_ignore_ascii_case("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Lower-cased sort key with blanks treated as absent.
pub fn sort_key(raw: Option<&str>) -> String {
    raw.map(|s| s.trim().to_ascii_lowercase()).unwrap_or_default()
}

/// Trimmed, non-empty query text.
pub fn non_blank(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paging_clamps_inputs() {
        let p = Paging::new(Some(0), Some(500), 10);
        assert_eq!(p, Paging { page: 1, page_size: 100 });
        assert_eq!(Paging::new(None, None, 20).page_size, 20);
        assert_eq!(Paging::new(Some(3), Some(10), 10).offset(), 20);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn paged_result_flags() {
        let paged = PagedResult::new(vec![1, 2], 25, Paging::new(Some(2), Some(10), 10), "ok");
        assert_eq!(paged.total_pages, 3);
        assert!(paged.has_previous_page);
        assert!(paged.has_next_page);

        let value = serde_json::to_value(&paged).unwrap();
        assert_eq!(value["totalRecords"], 25);
        assert_eq!(value["pageSize"], 10);
        assert_eq!(value["isSuccess"], true);
    }

    #[test]
    fn api_result_omits_empty_fields() {
        let value = serde_json::to_value(ApiResult::message("done")).unwrap();
        assert_eq!(value, json!({"isSuccess": true, "status": 200, "message": "done"}));

        let created = serde_json::to_value(ApiResult::created(json!({"id": 1}), "made")).unwrap();
        assert_eq!(created["status"], 201);
        assert_eq!(created["data"]["id"], 1);
    }

    #[test]
    fn sort_order_defaults_to_desc() {
        assert_eq!(SortOrder::parse(None), SortOrder::Desc);
        assert_eq!(SortOrder::parse(Some("ASC")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("sideways")), SortOrder::Desc);
    }
}
