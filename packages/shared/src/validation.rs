use std::collections::BTreeMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::auth::requests::SignUpRequest;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^@\s]{1,64}@[^@\s]+\.[^.@\s]+$").unwrap();
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{2,14}$").unwrap();
}

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 64;

/// Form fields that can carry an inline error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Username,
    Email,
    Password,
    ConfirmPassword,
    Message,
}

impl Field {
    /// Maps a server-side field name (the last element of a 422 `loc`).
    pub fn from_wire(name: &str) -> Option<Field> {
        match name {
            "username" => Some(Field::Username),
            "email" => Some(Field::Email),
            "password" => Some(Field::Password),
            "confirm_password" | "confirmPassword" => Some(Field::ConfirmPassword),
            "message" | "content" => Some(Field::Message),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Username => "username",
            Field::Email => "email",
            Field::Password => "password",
            Field::ConfirmPassword => "confirm_password",
            Field::Message => "message",
        };
        f.write_str(name)
    }
}

/// Inline errors keyed by field. Only the first error per field is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<Field, String>,
    /// Messages the server attached to fields this client does not render.
    pub general: Vec<String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.general.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&Field, &String)> {
        self.errors.iter()
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(field, msg)| format!("{}: {}", field, msg))
            .chain(self.general.iter().cloned())
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.len() > 320 || !EMAIL_REGEX.is_match(email) {
        return Err("Please enter a valid email address".to_string());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN_LEN
        ));
    }
    if len > PASSWORD_MAX_LEN {
        return Err(format!(
            "Password must be at most {} characters",
            PASSWORD_MAX_LEN
        ));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), String> {
    if !USERNAME_REGEX.is_match(username) {
        return Err(
            "Username must be 3-15 letters, digits or underscores and not start with a digit"
                .to_string(),
        );
    }
    Ok(())
}

#[derive(Clone, Default)]
pub struct SignUpForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl fmt::Debug for SignUpForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl SignUpForm {
    pub fn new(username: &str, email: &str, password: &str) -> Self {
        SignUpForm {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: password.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Err(msg) = validate_username(self.username.trim()) {
            errors.add(Field::Username, msg);
        }
        if let Err(msg) = validate_email(self.email.trim()) {
            errors.add(Field::Email, msg);
        }
        if let Err(msg) = validate_password(&self.password) {
            errors.add(Field::Password, msg);
        }
        if self.password != self.confirm_password {
            errors.add(Field::ConfirmPassword, "Passwords do not match");
        }
        errors.into_result()
    }

    /// Whether the submit action is enabled.
    pub fn can_submit(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn to_request(&self) -> SignUpRequest {
        SignUpRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            password: self.password.clone(),
        }
    }
}
