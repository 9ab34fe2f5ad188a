// Error taxonomy for the authentication gateway
// Decision: Operator-facing failures are told apart for logging only; clients always see one denial

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while authenticating a principal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Wrong username or password
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Valid Google identity whose email is not on the allowlist
    #[error("email is not allowlisted")]
    NotAllowlisted,

    /// The server is missing configuration required by the attempted method
    #[error("not configured: {0}")]
    NotConfigured(&'static str),

    /// Session artifact failed verification or has expired
    #[error("invalid or expired session")]
    InvalidOrExpiredSession,

    /// Provider tag that no validator or role mapping knows about
    #[error("unrecognized provider: {0}")]
    UnrecognizedProvider(String),

    /// The identity provider handshake failed
    #[error("identity provider error: {0}")]
    IdentityProvider(String),

    /// A session token could not be signed
    #[error("session signing failed: {0}")]
    Signing(String),
}

impl AuthError {
    /// Create an identity provider error
    pub fn identity_provider(msg: impl Into<String>) -> Self {
        AuthError::IdentityProvider(msg.into())
    }

    /// Failures caused by server configuration or programming errors rather
    /// than by the principal. Logged at error level.
    pub fn is_operator_facing(&self) -> bool {
        matches!(
            self,
            AuthError::NotConfigured(_)
                | AuthError::UnrecognizedProvider(_)
                | AuthError::IdentityProvider(_)
                | AuthError::Signing(_)
        )
    }

    /// The only outcome ever shown to the client
    pub fn public_code(&self) -> &'static str {
        "AccessDenied"
    }
}
