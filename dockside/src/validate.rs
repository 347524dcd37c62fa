//! Field-level validation shared by both submission forms.
//!
//! Rules are plain functions returning the accepted value or a user-facing
//! message. A [`Checker`] runs them in schema order and collects every
//! failure, so the caller sees all invalid fields at once.

use std::fmt;

use serde::Serialize;

pub const FULL_NAME: &str = "fullName";
pub const EMAIL: &str = "email";
pub const PHONE: &str = "phone";

pub const MIN_PHONE_CHARS: usize = 10;

/// One invalid field and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Every invalid field of a submission, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, field: &'static str, message: &'static str) {
        self.0.push(FieldError { field, message });
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Names of the invalid fields.
    pub fn fields(&self) -> Vec<&'static str> {
        self.iter().map(|e| e.field).collect()
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.iter().find(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

pub type Rule<T> = Result<T, &'static str>;

/// Collects rule failures field by field.
#[derive(Debug, Default)]
pub struct Checker {
    errors: ValidationErrors,
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a rule for `field`, yielding the value on success.
    pub fn check<T>(&mut self, field: &'static str, outcome: Rule<T>) -> Option<T> {
        match outcome {
            Ok(value) => Some(value),
            Err(message) => {
                self.errors.push(field, message);
                None
            }
        }
    }

    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }
}

/// Rejects absent and empty values. Whitespace counts as content.
pub fn required<'a>(value: Option<&'a str>, message: &'static str) -> Rule<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(message),
    }
}

/// Minimum length in characters.
pub fn min_chars<'a>(value: &'a str, min: usize, message: &'static str) -> Rule<&'a str> {
    if value.chars().count() >= min {
        Ok(value)
    } else {
        Err(message)
    }
}

pub fn full_name(value: Option<&str>) -> Rule<String> {
    required(value, "Full Name is required").map(str::to_owned)
}

/// An `addr-spec` with a local part and a domain. Display names are refused.
pub fn email(value: Option<&str>) -> Rule<String> {
    let value = required(value, "Email is required")?;
    value
        .parse::<lettre::Address>()
        .map(|address| address.to_string())
        .map_err(|_| "Invalid email address")
}

pub fn phone(value: Option<&str>) -> Rule<String> {
    let value = required(value, "Phone is required")?;
    min_chars(
        value,
        MIN_PHONE_CHARS,
        "Phone number must be at least 10 digits",
    )
    .map(str::to_owned)
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`, one for one.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Name, email and phone, common to every form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    pub full_name: String,
    pub email: String,
    pub phone: String,
}

impl ContactDetails {
    pub fn check(
        checker: &mut Checker,
        full_name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Option<Self> {
        let full_name = checker.check(FULL_NAME, self::full_name(full_name));
        let email = checker.check(EMAIL, self::email(email));
        let phone = checker.check(PHONE, self::phone(phone));
        Some(ContactDetails {
            full_name: full_name?,
            email: email?,
            phone: phone?,
        })
    }
}
