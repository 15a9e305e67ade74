//! Field-level validation errors, from the client and from the server.
//!
//! The server reports validation problems as a JSON object keyed by
//! field name, each value a list of messages (sometimes a bare string),
//! plus a `non_field_errors` list for problems that don't belong to one
//! field. [`FieldErrors`] is that shape, and the same type carries the
//! client-side pre-checks so callers render both the same way.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::{LoginRequest, RegisterRequest};

/// Key the server uses for errors not tied to one field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Validation messages grouped by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    fields: BTreeMap<String, Vec<String>>,
    non_field: Vec<String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a server error body.
    ///
    /// Returns `None` when the body is not a JSON object, or when it has
    /// no message-shaped entries at all.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        let Value::Object(map) = serde_json::from_slice::<Value>(body).ok()? else {
            return None;
        };

        let mut errors = Self::new();
        for (key, value) in map {
            let messages: Vec<String> = match value {
                Value::String(message) => vec![message],
                Value::Array(items) => items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(message) => Some(message),
                        _ => None,
                    })
                    .collect(),
                _ => continue,
            };
            for message in messages {
                if key == NON_FIELD_ERRORS {
                    errors.add_non_field(message);
                } else {
                    errors.add(key.as_str(), message);
                }
            }
        }

        (!errors.is_empty()).then_some(errors)
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    /// First message for a field, which is what a form shows inline.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(name, messages)| (name.as_str(), messages.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    /// One-line summary for a notification: non-field messages if any,
    /// otherwise every field message prefixed with its field name.
    pub fn summary(&self) -> String {
        if !self.non_field.is_empty() {
            return self.non_field.join(" ");
        }
        self.fields
            .iter()
            .flat_map(|(name, messages)| {
                messages.iter().map(move |m| format!("{name}: {m}"))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Extracts a human-readable message from an error response body.
///
/// Looks for the `detail` or `error` string the server puts in most
/// error bodies and falls back to the raw text.
pub fn server_message(body: &[u8]) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
        for key in ["detail", "error"] {
            if let Some(Value::String(message)) = map.get(key) {
                return message.clone();
            }
        }
    }
    String::from_utf8_lossy(body).trim().to_string()
}

impl LoginRequest {
    /// Checks the form before any request is made.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.username.trim().is_empty() {
            errors.add("username", "Username or email is required");
        }
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result()
    }
}

impl RegisterRequest {
    /// Checks the form before any request is made.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.username.trim().is_empty() {
            errors.add("username", "Username is required");
        }

        if self.email.is_empty() {
            errors.add("email", "Email is required");
        } else if !looks_like_email(&self.email) {
            errors.add("email", "Email is invalid");
        }

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password",
                format!(
                    "Password must be at least {MIN_PASSWORD_LEN} characters long"
                ),
            );
        }

        if self.password2.is_empty() {
            errors.add("password2", "Confirm Password is required");
        } else if self.password != self.password2 {
            errors.add("password2", "Passwords do not match");
        }

        errors.into_result()
    }
}

/// `local@domain.tld` with no whitespace, which is all the form checks.
fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !local.is_empty() && !host.is_empty() && !tld.is_empty()
}
