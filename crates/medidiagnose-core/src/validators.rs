//! Form and upload validation.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::ImageUpload;

/// Default upload ceiling for [`validate_image_file`].
pub const DEFAULT_IMAGE_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Default minimum description length.
pub const DEFAULT_DESCRIPTION_MIN_LEN: usize = 20;

const ACCEPTED_IMAGE_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/heic",
    "image/heif",
];

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

static NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z\s'-]+$").unwrap());

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\+\d{1,3})?[-.\s]?\(?\d{1,4}\)?[-.\s]?\d{1,4}[-.\s]?\d{1,9}$").unwrap()
});

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/?#]+(?:[/?#]\S*)?$").unwrap());

static PASSWORD_SPECIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[!@#$%^&*()_+\-=\[\]{};':"\\|,.<>/?]"#).unwrap());

/// Outcome of a validation that carries a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub message: String,
}

impl ValidationResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            message: message.into(),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Password strength check with the first failing rule as the message.
pub fn validate_password(password: &str) -> ValidationResult {
    if password.is_empty() {
        return ValidationResult::invalid("Password is required");
    }
    if password.chars().count() < 8 {
        return ValidationResult::invalid("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return ValidationResult::invalid("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return ValidationResult::invalid("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return ValidationResult::invalid("Password must contain at least one number");
    }
    if !PASSWORD_SPECIAL.is_match(password) {
        return ValidationResult::invalid("Password must contain at least one special character");
    }
    ValidationResult::ok("Password is strong")
}

pub fn passwords_match(password: &str, confirm: &str) -> bool {
    password == confirm
}

/// At least two non-blank characters; letters, spaces, apostrophes and hyphens only.
pub fn is_valid_name(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.chars().count() >= 2 && NAME.is_match(name)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE.is_match(phone)
}

/// `YYYY-MM-DD` naming a real calendar day.
pub fn is_valid_date(date: &str) -> bool {
    ISO_DATE.is_match(date) && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

/// Absolute http(s) URL with a host.
pub fn is_valid_url(url: &str) -> bool {
    URL.is_match(url)
}

/// Check an upload's MIME type and size. `None` means nothing was selected.
pub fn validate_image_file(file: Option<&ImageUpload>, max_size: u64) -> ValidationResult {
    let Some(file) = file else {
        return ValidationResult::invalid("No file selected");
    };

    if !ACCEPTED_IMAGE_TYPES.contains(&file.mime_type.as_str()) {
        return ValidationResult::invalid("File must be a valid image (JPEG, PNG, GIF, HEIC)");
    }

    if file.size() > max_size {
        let max_mb = max_size as f64 / (1024.0 * 1024.0);
        return ValidationResult::invalid(format!("Image size must be less than {}MB", max_mb));
    }

    ValidationResult::ok("Image is valid")
}

pub fn validate_symptom_description(description: &str, min_len: usize) -> ValidationResult {
    if description.is_empty() {
        return ValidationResult::invalid("Symptom description is required");
    }
    if description.trim().chars().count() < min_len {
        return ValidationResult::invalid(format!(
            "Please provide at least {} characters describing your symptoms",
            min_len
        ));
    }
    ValidationResult::ok("Description is valid")
}

/// Validate a flat form. Returns field name to error message; empty when valid.
pub fn validate_form(
    fields: &BTreeMap<String, String>,
    required: &[&str],
) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();
    let present = |key: &str| fields.get(key).map(String::as_str).filter(|v| !v.is_empty());

    for &field in required {
        if fields.get(field).map_or(true, |v| v.trim().is_empty()) {
            errors.insert(field.to_string(), format!("{} is required", capitalize_first(field)));
        }
    }

    if let Some(email) = present("email") {
        if !is_valid_email(email) {
            errors.insert("email".into(), "Please enter a valid email address".into());
        }
    }

    if let Some(password) = present("password") {
        let check = validate_password(password);
        if !check.is_valid {
            errors.insert("password".into(), check.message);
        }
    }

    if let Some(confirm) = present("confirmPassword") {
        if fields.get("password").map(String::as_str) != Some(confirm) {
            errors.insert("confirmPassword".into(), "Passwords do not match".into());
        }
    }

    if let Some(name) = present("name") {
        if !is_valid_name(name) {
            errors.insert("name".into(), "Please enter a valid name".into());
        }
    }

    if let Some(phone) = present("phone") {
        if !is_valid_phone(phone) {
            errors.insert("phone".into(), "Please enter a valid phone number".into());
        }
    }

    errors
}

fn capitalize_first(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_email() {
        assert!(is_valid_email("patient@example.com"));
        assert!(!is_valid_email("patient@example"));
        assert!(!is_valid_email("not an email"));
    }

    #[test]
    fn test_password_rules_in_order() {
        assert_eq!(validate_password("").message, "Password is required");
        assert_eq!(
            validate_password("Ab1!").message,
            "Password must be at least 8 characters long"
        );
        assert_eq!(
            validate_password("lowercase1!").message,
            "Password must contain at least one uppercase letter"
        );
        assert_eq!(
            validate_password("NoDigits!!").message,
            "Password must contain at least one number"
        );
        assert_eq!(
            validate_password("NoSpecial1").message,
            "Password must contain at least one special character"
        );
        assert!(validate_password("Str0ng!Pass").is_valid);
    }

    #[test]
    fn test_name_and_phone() {
        assert!(is_valid_name("Mary-Jane O'Neil"));
        assert!(!is_valid_name(" A "));
        assert!(!is_valid_name("R2D2"));
        assert!(is_valid_phone("+91 98765 43210"));
        assert!(is_valid_phone("(555) 123-4567"));
        assert!(!is_valid_phone("call me"));
    }

    #[test]
    fn test_dates() {
        assert!(is_valid_date("2024-02-29"));
        assert!(!is_valid_date("2023-02-29"));
        assert!(!is_valid_date("2024-2-1"));
    }

    #[test]
    fn test_urls() {
        assert!(is_valid_url("https://api.medidiagnose.com/v1"));
        assert!(is_valid_url("http://localhost:3000/symptom-check"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("medidiagnose"));
    }

    #[test]
    fn test_image_file() {
        assert_eq!(
            validate_image_file(None, DEFAULT_IMAGE_MAX_BYTES).message,
            "No file selected"
        );

        let pdf = ImageUpload::new("scan.pdf", "application/pdf", vec![0; 10]);
        assert!(!validate_image_file(Some(&pdf), DEFAULT_IMAGE_MAX_BYTES).is_valid);

        let big = ImageUpload::new("rash.png", "image/png", vec![0; 6 * 1024 * 1024]);
        assert_eq!(
            validate_image_file(Some(&big), DEFAULT_IMAGE_MAX_BYTES).message,
            "Image size must be less than 5MB"
        );

        let ok = ImageUpload::new("rash.jpg", "image/jpeg", vec![0; 1024]);
        assert!(validate_image_file(Some(&ok), DEFAULT_IMAGE_MAX_BYTES).is_valid);
    }

    #[test]
    fn test_symptom_description() {
        assert!(!validate_symptom_description("", 20).is_valid);
        assert_eq!(
            validate_symptom_description("   itchy    ", 20).message,
            "Please provide at least 20 characters describing your symptoms"
        );
        assert!(validate_symptom_description("red itchy rash for three days", 20).is_valid);
    }

    #[test]
    fn test_validate_form() {
        let errors = validate_form(
            &form(&[
                ("email", "bad"),
                ("password", "Str0ng!Pass"),
                ("confirmPassword", "Other!Pass1"),
                ("name", ""),
            ]),
            &["name", "email"],
        );

        assert_eq!(errors.get("name").map(String::as_str), Some("Name is required"));
        assert_eq!(
            errors.get("email").map(String::as_str),
            Some("Please enter a valid email address")
        );
        assert_eq!(
            errors.get("confirmPassword").map(String::as_str),
            Some("Passwords do not match")
        );
        assert!(!errors.contains_key("password"));
    }

    #[test]
    fn test_validate_form_clean() {
        let errors = validate_form(
            &form(&[("email", "a@b.co"), ("phone", "555-123-4567")]),
            &["email"],
        );
        assert!(errors.is_empty());
    }
}
