//! Contact form submissions and their validation rules.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Address shape accepted by the contact form: local part, `@`, and a dotted
/// domain whose labels do not start or end with a hyphen.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern compiles")
});

/// A contact form submission. Transient: validated, forwarded, never stored.
///
/// Missing fields deserialize as empty so that they surface as field errors
/// from [`ContactSubmission::validate`] rather than as a malformed body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

/// Successful relay acknowledgement, as returned by `POST /api/contact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactReceipt {
    pub success: bool,
    pub message: String,
}

/// A single field violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field violation of a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    fn push(&mut self, field: &str, message: &str) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    /// Build from already-collected field errors.
    #[must_use]
    pub fn from_fields(fields: Vec<FieldError>) -> Self {
        Self(fields)
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `field` has at least one violation.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

fn char_len_between(value: &str, min: usize, max: usize) -> bool {
    let len = value.chars().count();
    (min..=max).contains(&len)
}

/// Trim and lower-case the domain part. The local part is left alone since
/// it is case-sensitive in principle.
fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_ascii_lowercase()),
        None => email.to_string(),
    }
}

impl ContactSubmission {
    /// Validate the submission, returning the trimmed, normalized form or
    /// every field violation found.
    pub fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = self.name.trim().to_string();
        if !char_len_between(&name, 2, 100) {
            errors.push("name", "Name must be between 2 and 100 characters");
        }

        let email = normalize_email(&self.email);
        if !EMAIL_PATTERN.is_match(&email) {
            errors.push("email", "Please provide a valid email address");
        }

        let company = self
            .company
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if company.as_ref().is_some_and(|c| c.chars().count() > 100) {
            errors.push("company", "Company name must be less than 100 characters");
        }

        let subject = self.subject.trim().to_string();
        if !char_len_between(&subject, 5, 200) {
            errors.push("subject", "Subject must be between 5 and 200 characters");
        }

        let message = self.message.trim().to_string();
        if !char_len_between(&message, 10, 2000) {
            errors.push("message", "Message must be between 10 and 2000 characters");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            name,
            email,
            company,
            subject,
            message,
        })
    }
}
