use chrono::NaiveDate;
use std::borrow::Cow;
use validator::ValidationError;

use crate::error::{Error, Result};

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// 9 to 15 digits with an optional leading `+`; spaces, dots and dashes are ignored.
pub fn validate_phone(phone: &str) -> std::result::Result<(), ValidationError> {
    let trimmed = phone.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let mut count = 0;
    for c in digits.chars() {
        match c {
            '0'..='9' => count += 1,
            ' ' | '-' | '.' => {}
            _ => return Err(error("phone", "Phone number may only contain digits")),
        }
    }
    if !(9..=15).contains(&count) {
        return Err(error("phone", "Phone number must have 9 to 15 digits"));
    }
    Ok(())
}

pub fn validate_not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("blank", "Value must not be blank"));
    }
    Ok(())
}

pub fn check_date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(Error::bad_request(
                "INVALID_DATE_RANGE",
                "End date must not be before start date",
            ));
        }
    }
    Ok(())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Trims and drops blanks, so an empty optional text clears nothing by accident.
pub fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_numbers() {
        assert!(validate_phone("0901000001").is_ok());
        assert!(validate_phone("+84 901-000-001").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("09010000ab").is_err());
    }

    #[test]
    fn date_range_rejects_inverted_dates() {
        let a = NaiveDate::from_ymd_opt(2020, 1, 1);
        let b = NaiveDate::from_ymd_opt(2021, 1, 1);
        assert!(check_date_range(a, b).is_ok());
        assert!(check_date_range(a, None).is_ok());
        assert_eq!(check_date_range(b, a).unwrap_err().code(), "INVALID_DATE_RANGE");
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Jane@Example.COM "), "jane@example.com");
    }
}
