use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const MIN_PASSWORD_LEN: usize = 6;
/// Matches the `users.email` column width.
pub const MAX_EMAIL_LEN: usize = 128;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Field name -> validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

fn required(errors: &mut FieldErrors, field: &'static str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, "This field is required.");
        return false;
    }
    true
}

fn email(errors: &mut FieldErrors, field: &'static str, value: &str) {
    if !required(errors, field, value) {
        return;
    }
    if !is_valid_email(value) {
        errors.add(field, "Invalid email address.");
    }
    if value.chars().count() > MAX_EMAIL_LEN {
        errors.add(
            field,
            format!("Field cannot be longer than {MAX_EMAIL_LEN} characters."),
        );
    }
}

fn new_password(
    errors: &mut FieldErrors,
    (field, value): (&'static str, &str),
    (repeat_field, repeat): (&'static str, &str),
) {
    if required(errors, field, value) && value.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            field,
            format!("Field must be at least {MIN_PASSWORD_LEN} characters long."),
        );
    }
    if required(errors, repeat_field, repeat) && repeat != value {
        errors.add(repeat_field, format!("Field must be equal to {field}."));
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_repeat: String,
}

impl RegisterForm {
    /// Checks everything except email uniqueness, which needs the store.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        email(&mut errors, "email", &self.email);
        new_password(
            &mut errors,
            ("password", &self.password),
            ("password_repeat", &self.password_repeat),
        );
        errors
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remember_me: Option<String>,
}

impl LoginForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        required(&mut errors, "email", &self.email);
        required(&mut errors, "password", &self.password);
        errors
    }

    /// Checkbox semantics: present and not an explicit "off" value.
    pub fn remember(&self) -> bool {
        matches!(
            self.remember_me.as_deref().map(str::trim),
            Some(v) if !v.is_empty() && !matches!(v, "0" | "false" | "off" | "n")
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetRequestForm {
    #[serde(default)]
    pub email: String,
}

impl ResetRequestForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        email(&mut errors, "email", &self.email);
        errors
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password2: String,
}

impl ResetPasswordForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        new_password(
            &mut errors,
            ("password", &self.password),
            ("password2", &self.password2),
        );
        errors
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NextParam {
    pub next: Option<String>,
}
