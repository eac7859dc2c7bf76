//! Normalization and format rules for warehouse input.
//!
//! Every helper records failures into a shared [`FieldErrors`] and keeps going, so a
//! request with several bad fields reports all of them at once.

use once_cell::sync::Lazy;
use regex::Regex;

use parcelhub_core::{FieldErrorCode, FieldErrors};

pub const MAX_NAME_LEN: usize = 64;
pub const MAX_TITLE_LEN: usize = 128;
pub const MAX_ADDRESS_LEN: usize = 512;
pub const MAX_NOTES_LEN: usize = 1000;
pub const MAX_TEXT_LEN: usize = 128;
pub const MAX_EMAIL_LEN: usize = 254;

static PINCODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9][0-9]{5}$").expect("pincode pattern is valid"));

static GSTIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][1-9A-Z]Z[0-9A-Z]$").expect("gstin pattern is valid")
});

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("email pattern is valid")
});

/// Reduce a phone number to its 10 national digits.
///
/// Accepts common separators and an Indian `+91`/`91`/`0` prefix. Returns `None`
/// when the result is not exactly 10 digits.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let mut digits = String::with_capacity(trimmed.len());
    for (idx, c) in trimmed.chars().enumerate() {
        match c {
            '0'..='9' => digits.push(c),
            '+' if idx == 0 => {}
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return None,
        }
    }

    let national = if digits.len() == 12 && digits.starts_with("91") {
        &digits[2..]
    } else if digits.len() == 11 && digits.starts_with('0') {
        &digits[1..]
    } else {
        digits.as_str()
    };

    (national.len() == 10).then(|| national.to_string())
}

pub fn is_valid_pincode(value: &str) -> bool {
    PINCODE_RE.is_match(value)
}

/// Uppercase + trim a GSTIN and check its structure. `None` if malformed.
pub fn normalize_gstin(raw: &str) -> Option<String> {
    let upper = raw.trim().to_ascii_uppercase();
    GSTIN_RE.is_match(&upper).then_some(upper)
}

pub fn is_valid_email(value: &str) -> bool {
    value.len() <= MAX_EMAIL_LEN && EMAIL_RE.is_match(value)
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn check_len(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.push(
            field,
            FieldErrorCode::TooLong,
            format!("must be at most {max} characters"),
        );
    }
}

pub(crate) fn required_text(errors: &mut FieldErrors, field: &str, value: &str, max: usize) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.required(field);
    } else {
        check_len(errors, field, value, max);
    }
    value.to_string()
}

pub(crate) fn optional_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Option<String> {
    let value = blank_to_none(value)?;
    check_len(errors, field, value, max);
    Some(value.to_string())
}

pub(crate) fn required_phone(errors: &mut FieldErrors, field: &str, value: &str) -> String {
    if value.trim().is_empty() {
        errors.required(field);
        return String::new();
    }
    optional_phone(errors, field, Some(value)).unwrap_or_default()
}

pub(crate) fn optional_phone(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<String> {
    let value = blank_to_none(value)?;
    match normalize_phone(value) {
        Some(normalized) => Some(normalized),
        None => {
            errors.push(field, FieldErrorCode::InvalidFormat, "must be a 10-digit phone number");
            Some(value.to_string())
        }
    }
}

pub(crate) fn optional_email(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<String> {
    let value = blank_to_none(value)?;
    if !is_valid_email(value) {
        errors.push(field, FieldErrorCode::InvalidFormat, "must be a valid email address");
    }
    Some(value.to_string())
}

pub(crate) fn required_pincode(errors: &mut FieldErrors, field: &str, value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.required(field);
    } else if !is_valid_pincode(value) {
        errors.push(field, FieldErrorCode::InvalidFormat, "must be a 6-digit postal code");
    }
    value.to_string()
}

pub(crate) fn optional_gstin(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<String> {
    let value = blank_to_none(value)?;
    match normalize_gstin(value) {
        Some(normalized) => Some(normalized),
        None => {
            errors.push(field, FieldErrorCode::InvalidFormat, "must be a valid 15-character GSTIN");
            Some(value.to_string())
        }
    }
}
