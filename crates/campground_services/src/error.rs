/// Errors raised by repository adapters
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// A unique constraint rejected the write
    #[error("Duplicate value for unique field `{field}`")]
    Duplicate {
        /// Name of the offending field
        field: String,
    },

    /// The underlying store failed
    #[error("Storage error: {0}")]
    Backend(String),
}

/// Errors raised by application services
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A repository call failed
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The email address already belongs to a user
    #[error("A user with the given email is already registered")]
    EmailTaken,

    /// The username already belongs to a user
    #[error("A user with the given username is already registered")]
    UsernameTaken,

    /// Hashing or verifying a password failed
    #[error(transparent)]
    Credential(#[from] HashingError),

    /// A multi-step write could not be completed and was rolled back where possible
    #[error("Inconsistent state: {0}")]
    Inconsistent(String),
}

/// Raised by [`crate::ports::PasswordHasher`] implementations
#[derive(Debug, thiserror::Error)]
#[error("Password hashing error: {0}")]
pub struct HashingError(pub String);

/// Errors raised by outbound adapters (geocoder, image store)
#[derive(Debug, thiserror::Error)]
pub enum ExternalServiceError {
    /// The request could not be sent
    #[error("Request failed: {0}")]
    Request(String),

    /// The service answered with an error or an unreadable body
    #[error("Unexpected response: {0}")]
    Response(String),

    /// The adapter is missing credentials or settings
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Raised when a request body fails its schema.
///
/// `message` joins every field message with `", "`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationFailed {
    /// All field messages, joined
    pub message: String,
}

impl ValidationFailed {
    /// HTTP status this failure maps to
    pub const STATUS_CODE: u16 = 400;

    /// Creates a failure from a single message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
