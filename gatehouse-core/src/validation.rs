//! Input validation for the registration and login forms
//!
//! The messages produced here are shown verbatim next to the offending form field.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::{error::ValidationError, user::Role};

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_PASSWORD_LENGTH: usize = 128;
pub const MAX_USERNAME_LENGTH: usize = 64;

static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Invalid username regex pattern"));

/// Validates a username
///
/// # Username Requirements
///
/// - Cannot be empty
/// - Letters, digits and underscores only
/// - Maximum 64 characters
///
/// # Examples
///
/// ```rust
/// use gatehouse_core::validation::validate_username;
///
/// assert!(validate_username("alice_01").is_ok());
/// assert!(validate_username("alice smith").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::MissingField(
            "Please enter a username.".to_string(),
        ));
    }

    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::InvalidUsername(format!(
            "Username must be no more than {MAX_USERNAME_LENGTH} characters."
        )));
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::InvalidUsername(
            "Username can only contain letters, numbers, and underscores.".to_string(),
        ));
    }

    Ok(())
}

/// Validates a new password
///
/// # Password Requirements
///
/// - Cannot be empty
/// - At least 6 and at most 128 characters
///
/// # Examples
///
/// ```rust
/// use gatehouse_core::validation::validate_password;
///
/// assert!(validate_password("hunter22").is_ok());
/// assert!(validate_password("abc").is_err());
/// ```
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingField(
            "Please enter a password.".to_string(),
        ));
    }

    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must have at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be no more than {MAX_PASSWORD_LENGTH} characters."
        )));
    }

    Ok(())
}

/// Per-field error messages of a rejected registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub username: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    pub role: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.password.is_none()
            && self.confirm_password.is_none()
            && self.role.is_none()
    }

    pub fn username_taken() -> Self {
        Self {
            username: Some("This username is already taken.".to_string()),
            ..Self::default()
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = [
            &self.username,
            &self.password,
            &self.confirm_password,
            &self.role,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect();
        f.write_str(&messages.join(" "))
    }
}

/// Raw registration form input, already trimmed.
#[derive(Debug, Clone, Default)]
pub struct RegistrationInput {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub role: String,
}

/// Registration input that passed every stateless check.
#[derive(Debug, Clone)]
pub struct ValidRegistration {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// Checks every field and reports all failures at once.
///
/// Username uniqueness needs the store and is checked by the user service afterwards.
pub fn validate_registration(input: &RegistrationInput) -> Result<ValidRegistration, FieldErrors> {
    let mut errors = FieldErrors::default();

    if let Err(e) = validate_username(&input.username) {
        errors.username = Some(field_message(e));
    }

    if let Err(e) = validate_password(&input.password) {
        errors.password = Some(field_message(e));
    }

    if input.confirm_password.is_empty() {
        errors.confirm_password = Some("Please confirm password.".to_string());
    } else if errors.password.is_none() && input.password != input.confirm_password {
        errors.confirm_password = Some("Password did not match.".to_string());
    }

    let role = if input.role.is_empty() {
        errors.role = Some("Please select a role.".to_string());
        None
    } else {
        match input.role.parse::<Role>() {
            Ok(role) => Some(role),
            Err(_) => {
                errors.role = Some("Please select a valid role.".to_string());
                None
            }
        }
    };

    match role {
        Some(role) if errors.is_empty() => Ok(ValidRegistration {
            username: input.username.clone(),
            password: input.password.clone(),
            role,
        }),
        _ => Err(errors),
    }
}

fn field_message(error: ValidationError) -> String {
    match error {
        ValidationError::MissingField(msg)
        | ValidationError::InvalidUsername(msg)
        | ValidationError::InvalidPassword(msg) => msg,
        other => other.to_string(),
    }
}
