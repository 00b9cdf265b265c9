use email_address::EmailAddress;
use url::Url;

use crate::errors::{ValidationError, ValidationIssue};
use crate::types::{Person, Post};

/// Endpoint schemes the tour knows how to connect to.
pub const SUPPORTED_SCHEMES: &[&str] = &["ws", "wss", "http", "https", "mem"];

/// Returns `true` if the provided string is a syntactically valid email address.
pub fn is_valid_email(value: &str) -> bool {
    EmailAddress::is_valid(value)
}

/// Returns `true` if the endpoint parses as a URL with a supported scheme.
pub fn is_supported_endpoint(value: &str) -> bool {
    Url::parse(value)
        .map(|url| SUPPORTED_SCHEMES.contains(&url.scheme()))
        .unwrap_or(false)
}

/// Checks a person before it is written.
pub fn validate_person(person: &Person) -> Result<(), ValidationError> {
    let mut issues = Vec::new();
    if person.name.trim().is_empty() {
        issues.push(ValidationIssue::new("name", "required", "name must not be empty"));
    }
    if person.surname.trim().is_empty() {
        issues.push(ValidationIssue::new("surname", "required", "surname must not be empty"));
    }
    if !is_valid_email(&person.email) {
        issues.push(ValidationIssue::new(
            "email",
            "email",
            format!("`{}` is not a valid email address", person.email),
        ));
    }
    issues.extend(person.location.check("location"));
    into_result(issues)
}

/// Checks a post before it is written.
pub fn validate_post(post: &Post) -> Result<(), ValidationError> {
    let mut issues = Vec::new();
    if post.content.trim().is_empty() {
        issues.push(ValidationIssue::new("content", "required", "content must not be empty"));
    }
    into_result(issues)
}

fn into_result(issues: Vec<ValidationIssue>) -> Result<(), ValidationError> {
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(issues))
    }
}
