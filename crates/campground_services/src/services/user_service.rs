use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::entities::{NewUser, User};
use crate::error::{RepositoryError, ServiceError};
use crate::ports::{PasswordHasher, UserRepository};
use crate::validation::RegisterInput;

/// Registration, credential checks and user lookups
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    /// Creates a service over the given repository and hasher
    pub fn new(users: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, hasher }
    }

    /// Registers a new user. Emails are stored lowercased; the password only
    /// ever reaches storage as a hash.
    pub async fn register(&self, input: RegisterInput) -> Result<User, ServiceError> {
        let email = normalize_email(&input.email);
        let username = input.username.trim().to_string();

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::EmailTaken);
        }
        if self.users.find_by_username(&username).await?.is_some() {
            return Err(ServiceError::UsernameTaken);
        }

        let password_hash = self.hasher.hash(&input.password)?;

        // a concurrent registration can still hit the unique constraints
        let user = self
            .users
            .create(NewUser {
                email,
                username,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate { field } if field == "email" => ServiceError::EmailTaken,
                RepositoryError::Duplicate { .. } => ServiceError::UsernameTaken,
                other => ServiceError::Repository(other),
            })?;

        info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Returns the user iff `username` exists and `password` matches
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, ServiceError> {
        let Some(user) = self.users.find_by_username(username.trim()).await? else {
            debug!("Login attempt for unknown user {}", username);
            return Ok(None);
        };

        if self.hasher.verify(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            debug!("Wrong password for user {}", user.username);
            Ok(None)
        }
    }

    /// Looks a user up by id
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, ServiceError> {
        Ok(self.users.find_by_id(id).await?)
    }

    /// Looks a user up by email, ignoring case and surrounding whitespace
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.users.find_by_email(&normalize_email(email)).await?)
    }

    /// Looks a user up by exact username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.users.find_by_username(username).await?)
    }

    /// Number of registered users
    pub async fn count(&self) -> Result<u64, ServiceError> {
        Ok(self.users.count().await?)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
