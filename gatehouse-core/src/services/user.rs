use crate::{
    Error, User, UserId,
    crypto,
    error::{StorageError, ValidationError},
    repositories::UserRepository,
    user::NewUser,
    validation::{FieldErrors, RegistrationInput, validate_registration},
};
use std::sync::Arc;

/// Service for user management operations
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    /// Create a new UserService with the given repository
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Register a new account from raw form input.
    ///
    /// Every field problem is reported at once in [`ValidationError::Fields`]. A taken
    /// username is reported on the username field, whether it was caught by the lookup or
    /// by the unique index when two registrations race.
    pub async fn register(&self, input: &RegistrationInput) -> Result<User, Error> {
        let valid = validate_registration(input).map_err(ValidationError::Fields)?;

        if self
            .repository
            .find_by_username(&valid.username)
            .await?
            .is_some()
        {
            return Err(ValidationError::Fields(FieldErrors::username_taken()).into());
        }

        let new_user = NewUser::builder()
            .username(valid.username)
            .password_hash(crypto::hash_password(&valid.password))
            .role(valid.role)
            .build()?;

        match self.repository.create(new_user).await {
            Ok(user) => {
                tracing::info!(
                    user_id = %user.id,
                    username = %user.username,
                    role = %user.role,
                    "User registered"
                );
                Ok(user)
            }
            Err(Error::Storage(StorageError::Constraint(_))) => {
                Err(ValidationError::Fields(FieldErrors::username_taken()).into())
            }
            Err(e) => Err(e),
        }
    }

    /// Get a user by ID
    pub async fn get_user(&self, user_id: &UserId) -> Result<Option<User>, Error> {
        self.repository.find_by_id(user_id).await
    }

    /// Get a user by username
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        self.repository.find_by_username(username).await
    }
}
