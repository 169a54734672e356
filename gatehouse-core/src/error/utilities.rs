use crate::error::ValidationError;

/// Extension trait for Option types to simplify required field validation
///
/// Used by the builders in this crate to turn a missing field into a
/// `ValidationError::MissingField`.
///
/// # Example
///
/// ```rust
/// use gatehouse_core::error::utilities::RequiredFieldExt;
///
/// let username: Option<String> = Some("alice".to_string());
/// let username = username.require_field("Username").unwrap();
/// assert_eq!(username, "alice");
/// ```
pub trait RequiredFieldExt<T> {
    /// Convert None to a ValidationError::MissingField
    fn require_field(self, field_name: &str) -> Result<T, ValidationError>;
}

impl<T> RequiredFieldExt<T> for Option<T> {
    fn require_field(self, field_name: &str) -> Result<T, ValidationError> {
        self.ok_or_else(|| ValidationError::MissingField(format!("{field_name} is required")))
    }
}
