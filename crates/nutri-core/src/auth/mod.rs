//! Authentication boundary.
//!
//! Email/password accounts with a persisted session. Failures carry the
//! backend's `auth/...` error code so callers can pick a message per case.

mod local;

pub use local::*;

use thiserror::Error;

use crate::db::DbError;

/// Identity returned by the auth backend.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    /// RFC 3339
    pub created_at: String,
}

/// Authentication failures, by backend error code.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("auth/invalid-email")]
    InvalidEmail,

    #[error("auth/user-not-found")]
    UserNotFound,

    #[error("auth/wrong-password")]
    WrongPassword,

    #[error("auth/invalid-credential")]
    InvalidCredential,

    #[error("auth/user-disabled")]
    UserDisabled,

    #[error("auth/too-many-requests")]
    TooManyRequests,

    #[error("auth/email-already-in-use")]
    EmailAlreadyInUse,

    #[error("auth/weak-password")]
    WeakPassword,

    #[error("auth/operation-not-allowed")]
    OperationNotAllowed,

    #[error("auth/requires-recent-login")]
    RequiresRecentLogin,

    #[error("auth/no-current-user")]
    NoCurrentUser,

    #[error("auth/internal-error: {0}")]
    Backend(String),

    #[error("{code}: {message}")]
    Other { code: String, message: String },
}

pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Map a backend code to a variant; unknown codes are kept verbatim.
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        match code {
            "auth/invalid-email" => AuthError::InvalidEmail,
            "auth/user-not-found" => AuthError::UserNotFound,
            "auth/wrong-password" => AuthError::WrongPassword,
            "auth/invalid-credential" => AuthError::InvalidCredential,
            "auth/user-disabled" => AuthError::UserDisabled,
            "auth/too-many-requests" => AuthError::TooManyRequests,
            "auth/email-already-in-use" => AuthError::EmailAlreadyInUse,
            "auth/weak-password" => AuthError::WeakPassword,
            "auth/operation-not-allowed" => AuthError::OperationNotAllowed,
            "auth/requires-recent-login" => AuthError::RequiresRecentLogin,
            "auth/no-current-user" => AuthError::NoCurrentUser,
            other => AuthError::Other {
                code: other.to_string(),
                message: message.into(),
            },
        }
    }

    pub fn code(&self) -> &str {
        match self {
            AuthError::InvalidEmail => "auth/invalid-email",
            AuthError::UserNotFound => "auth/user-not-found",
            AuthError::WrongPassword => "auth/wrong-password",
            AuthError::InvalidCredential => "auth/invalid-credential",
            AuthError::UserDisabled => "auth/user-disabled",
            AuthError::TooManyRequests => "auth/too-many-requests",
            AuthError::EmailAlreadyInUse => "auth/email-already-in-use",
            AuthError::WeakPassword => "auth/weak-password",
            AuthError::OperationNotAllowed => "auth/operation-not-allowed",
            AuthError::RequiresRecentLogin => "auth/requires-recent-login",
            AuthError::NoCurrentUser => "auth/no-current-user",
            AuthError::Backend(_) => "auth/internal-error",
            AuthError::Other { code, .. } => code,
        }
    }
}

impl From<DbError> for AuthError {
    fn from(e: DbError) -> Self {
        AuthError::Backend(e.to_string())
    }
}

/// Email/password authentication with one signed-in user at a time.
pub trait AuthProvider {
    /// Create an account and sign it in.
    fn sign_up(&self, email: &str, password: &str) -> AuthResult<AuthUser>;

    fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthUser>;

    fn sign_out(&self) -> AuthResult<()>;

    /// Signed-in user, if any.
    fn current_user(&self) -> AuthResult<Option<AuthUser>>;

    fn send_password_reset(&self, email: &str) -> AuthResult<()>;

    /// Confirm the current user's password before a sensitive change.
    fn reauthenticate(&self, password: &str) -> AuthResult<()>;

    fn update_display_name(&self, display_name: &str) -> AuthResult<AuthUser>;

    /// Requires a recent sign-in or re-authentication.
    fn update_password(&self, new_password: &str) -> AuthResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        let known = [
            AuthError::InvalidEmail,
            AuthError::UserNotFound,
            AuthError::WrongPassword,
            AuthError::InvalidCredential,
            AuthError::UserDisabled,
            AuthError::TooManyRequests,
            AuthError::EmailAlreadyInUse,
            AuthError::WeakPassword,
            AuthError::OperationNotAllowed,
            AuthError::RequiresRecentLogin,
            AuthError::NoCurrentUser,
        ];
        for error in known {
            assert_eq!(AuthError::from_code(error.code(), ""), error);
        }
    }

    #[test]
    fn test_unknown_code_preserved() {
        let error = AuthError::from_code("auth/network-request-failed", "offline");
        assert_eq!(error.code(), "auth/network-request-failed");
        assert_eq!(error.to_string(), "auth/network-request-failed: offline");
    }
}
