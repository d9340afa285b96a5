//! Quote-request form data and its validation rules.

use super::error::DomainError;

const MAX_NAME_LEN: usize = 200;
const MAX_MESSAGE_LEN: usize = 10_000;

/// A validated quote request, ready for storage and mail-out.
#[derive(Debug, Clone)]
pub struct QuoteRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Which service the visitor asked about, when they picked one.
    pub service: Option<String>,
    pub message: String,
}

/// Raw form fields as they arrived off the wire.
#[derive(Debug, Default, Clone)]
pub struct QuoteRequestDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub message: Option<String>,
}

impl QuoteRequestDraft {
    /// Validate the draft into a [`QuoteRequest`].
    pub fn validate(self) -> Result<QuoteRequest, DomainError> {
        let name = required_field(self.name, "name", MAX_NAME_LEN)?;
        let message = required_field(self.message, "message", MAX_MESSAGE_LEN)?;

        let email = self
            .email
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| DomainError::validation("field `email` is required"))?;
        if !looks_like_email(&email) {
            return Err(DomainError::validation(format!(
                "`{email}` is not a valid email address"
            )));
        }

        Ok(QuoteRequest {
            name,
            email,
            phone: optional_field(self.phone),
            service: optional_field(self.service),
            message,
        })
    }
}

fn required_field(
    value: Option<String>,
    field: &'static str,
    max_len: usize,
) -> Result<String, DomainError> {
    let value = value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| DomainError::validation(format!("field `{field}` is required")))?;
    if value.chars().count() > max_len {
        return Err(DomainError::validation(format!(
            "field `{field}` exceeds {max_len} characters"
        )));
    }
    Ok(value)
}

fn optional_field(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Shallow shape check; deliverability is the mail provider's problem.
fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}
