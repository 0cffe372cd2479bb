//! Field-level validation for inbound entity payloads.
//!
//! Validators return the full list of violations rather than failing on the
//! first one, so a 400 response can report every broken field at once. An
//! empty list means the payload is valid.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

const TEXT_MAX: usize = 255;

/// Validate the `createBook` input group: `title` and `coverText` are
/// required and bounded to 1–255 characters. `comment` is unconstrained.
pub fn validate_book(title: &str, cover_text: &str) -> Vec<Violation> {
    let mut violations = Vec::new();
    check_bounded_text(&mut violations, "title", title);
    check_bounded_text(&mut violations, "coverText", cover_text);
    violations
}

/// Validate the `createAuthor` input group: both name parts are required.
pub fn validate_author(first_name: &str, last_name: &str) -> Vec<Violation> {
    let mut violations = Vec::new();
    check_not_blank(&mut violations, "firstName", first_name);
    check_not_blank(&mut violations, "lastName", last_name);
    violations
}

fn check_not_blank(violations: &mut Vec<Violation>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        violations.push(Violation::new(field, "must not be blank"));
    }
}

fn check_bounded_text(violations: &mut Vec<Violation>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        violations.push(Violation::new(field, "must not be blank"));
        return;
    }
    if value.chars().count() > TEXT_MAX {
        violations.push(Violation::new(
            field,
            format!("must be at most {TEXT_MAX} characters"),
        ));
    }
}
