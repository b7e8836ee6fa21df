use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{backend} storage unavailable: {reason}")]
    Unavailable {
        backend: &'static str,
        reason: String,
    },
}

impl StorageError {
    pub fn unavailable(backend: &'static str, reason: impl ToString) -> Self {
        StorageError::Unavailable {
            backend,
            reason: reason.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),

    /// Only produced internally; read paths recover by clearing the slot.
    #[error("Malformed session record: {0}")]
    MalformedRecord(String),

    #[error("Session lifetime must be a positive number of hours, got {0}")]
    InvalidTtl(i64),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AuthError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AuthError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Message suitable for showing next to the login/signup form
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Validation { message, .. } => message.clone(),
            AuthError::Session(SessionError::StorageUnavailable(_)) => {
                "We couldn't save your session. Please enable storage and cookies, then try again."
                    .to_string()
            }
            AuthError::Session(SessionError::InvalidEmail(_)) => {
                "Please enter a valid email address.".to_string()
            }
            AuthError::Session(e) => format!("Sign in failed: {}", e),
        }
    }

    /// Whether showing a retry affordance makes sense for this failure
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Session(SessionError::StorageUnavailable(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::unavailable("memory", "disabled by host");
        assert_eq!(err.to_string(), "memory storage unavailable: disabled by host");
    }

    #[test]
    fn test_user_message_for_storage_failure() {
        let err = AuthError::from(SessionError::from(StorageError::unavailable("file", "denied")));
        assert!(err.user_message().contains("enable storage and cookies"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_user_message_for_validation() {
        let err = AuthError::validation("password", "Password is required");
        assert_eq!(err.user_message(), "Password is required");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_user_message_for_invalid_email() {
        let err = AuthError::from(SessionError::InvalidEmail("nope".to_string()));
        assert_eq!(err.user_message(), "Please enter a valid email address.");
    }
}
