// Credential validators, one per sign-in method
// Decision: Dispatch by explicit Provider tag, not by the shape of the submitted credentials
// Decision: Validators only establish identity; allowlisting happens in the gateway

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::error::{AuthError, Result};
use crate::identity::{Identity, Provider};

/// Fixed identity of the shared portfolio demo account
pub const PORTFOLIO_USER_ID: &str = "portfolio-user";
pub const PORTFOLIO_USER_NAME: &str = "Portfolio User";
pub const PORTFOLIO_USER_EMAIL: &str = "portfolio@tuukaa.local";

/// A claim submitted by a principal
#[derive(Clone)]
pub enum Credentials {
    /// Authorization code returned by the Google OAuth redirect
    Google { code: String },
    /// Username/password for the portfolio account
    Portfolio { username: String, password: String },
}

impl Credentials {
    pub fn provider(&self) -> Provider {
        match self {
            Credentials::Google { .. } => Provider::Google,
            Credentials::Portfolio { .. } => Provider::Portfolio,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Google { .. } => f.write_str("Credentials::Google { .. }"),
            Credentials::Portfolio { username, .. } => f
                .debug_struct("Credentials::Portfolio")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// Turns credentials into a resolved identity or a rejection
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// Provider this validator handles
    fn provider(&self) -> Provider;

    /// Whether the server has what this method needs to succeed
    fn is_configured(&self) -> bool {
        true
    }

    /// Validate credentials
    async fn validate(&self, credentials: &Credentials) -> Result<Identity>;
}

// ============================================================================
// Google
// ============================================================================

/// Identity asserted by Google after a completed OAuth handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedGoogleUser {
    /// Google subject identifier
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
    pub email_verified: bool,
}

/// The external half of the Google sign-in: exchanging an authorization code
/// for the user it was issued to
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<VerifiedGoogleUser>;
}

/// Validates Google sign-ins by delegating to the identity provider
pub struct GoogleValidator {
    identity_provider: Option<Arc<dyn IdentityProvider>>,
}

impl GoogleValidator {
    pub fn new(identity_provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            identity_provider: Some(identity_provider),
        }
    }

    /// Validator for a server without Google OAuth credentials
    pub fn unconfigured() -> Self {
        Self {
            identity_provider: None,
        }
    }
}

#[async_trait]
impl CredentialValidator for GoogleValidator {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn is_configured(&self) -> bool {
        self.identity_provider.is_some()
    }

    async fn validate(&self, credentials: &Credentials) -> Result<Identity> {
        let Credentials::Google { code } = credentials else {
            return Err(AuthError::UnrecognizedProvider(
                credentials.provider().to_string(),
            ));
        };

        let identity_provider = self
            .identity_provider
            .as_ref()
            .ok_or(AuthError::NotConfigured("GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET"))?;

        let user = identity_provider.exchange_code(code).await?;

        // An unverified address can't be trusted for allowlisting
        let email = if user.email_verified && !user.email.is_empty() {
            Some(user.email)
        } else {
            tracing::debug!(subject = %user.subject, "google email not verified, dropping it");
            None
        };

        Ok(Identity {
            display_name: user
                .name
                .filter(|n| !n.is_empty())
                .or_else(|| email.clone())
                .unwrap_or_else(|| user.subject.clone()),
            id: user.subject,
            email,
            provider: Provider::Google,
        })
    }
}

// ============================================================================
// Portfolio
// ============================================================================

/// The single configured portfolio username/password pair
#[derive(Clone)]
pub struct PortfolioCredentialConfig {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for PortfolioCredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioCredentialConfig")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Validates the shared portfolio demo account
pub struct PortfolioValidator {
    config: Option<PortfolioCredentialConfig>,
}

impl PortfolioValidator {
    pub fn new(config: Option<PortfolioCredentialConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CredentialValidator for PortfolioValidator {
    fn provider(&self) -> Provider {
        Provider::Portfolio
    }

    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    async fn validate(&self, credentials: &Credentials) -> Result<Identity> {
        let Credentials::Portfolio { username, password } = credentials else {
            return Err(AuthError::UnrecognizedProvider(
                credentials.provider().to_string(),
            ));
        };

        let config = self
            .config
            .as_ref()
            .ok_or(AuthError::NotConfigured("PORTFOLIO_USERNAME/PORTFOLIO_PASSWORD"))?;

        // Evaluate both comparisons so timing doesn't reveal which field was wrong
        let username_ok = secure_eq(username, &config.username);
        let password_ok = secure_eq(password, &config.password);
        if !(username_ok & password_ok) {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(Identity {
            id: PORTFOLIO_USER_ID.to_string(),
            display_name: PORTFOLIO_USER_NAME.to_string(),
            email: Some(PORTFOLIO_USER_EMAIL.to_string()),
            provider: Provider::Portfolio,
        })
    }
}

/// Compare two secrets in time independent of where they differ. Hashing
/// first gives equal-length inputs whatever the lengths of `a` and `b`.
fn secure_eq(a: &str, b: &str) -> bool {
    let a = Sha256::digest(a.as_bytes());
    let b = Sha256::digest(b.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeGoogle {
        user: VerifiedGoogleUser,
    }

    #[async_trait]
    impl IdentityProvider for FakeGoogle {
        async fn exchange_code(&self, code: &str) -> Result<VerifiedGoogleUser> {
            if code == "good-code" {
                Ok(self.user.clone())
            } else {
                Err(AuthError::identity_provider("invalid_grant"))
            }
        }
    }

    fn google_user(email: &str, verified: bool) -> VerifiedGoogleUser {
        VerifiedGoogleUser {
            subject: "1122334455".to_string(),
            email: email.to_string(),
            name: Some("Ada Admin".to_string()),
            email_verified: verified,
        }
    }

    fn portfolio_validator() -> PortfolioValidator {
        PortfolioValidator::new(Some(PortfolioCredentialConfig {
            username: "recruiter".to_string(),
            password: "hunter2".to_string(),
        }))
    }

    fn portfolio(username: &str, password: &str) -> Credentials {
        Credentials::Portfolio {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_google_resolves_identity() {
        let validator = GoogleValidator::new(Arc::new(FakeGoogle {
            user: google_user("ada@example.com", true),
        }));
        let identity = validator
            .validate(&Credentials::Google {
                code: "good-code".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(identity.id, "1122334455");
        assert_eq!(identity.display_name, "Ada Admin");
        assert_eq!(identity.email.as_deref(), Some("ada@example.com"));
        assert_eq!(identity.provider, Provider::Google);
    }

    #[tokio::test]
    async fn test_google_unverified_email_is_dropped() {
        let validator = GoogleValidator::new(Arc::new(FakeGoogle {
            user: google_user("ada@example.com", false),
        }));
        let identity = validator
            .validate(&Credentials::Google {
                code: "good-code".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(identity.email, None);
    }

    #[tokio::test]
    async fn test_google_handshake_failure_propagates() {
        let validator = GoogleValidator::new(Arc::new(FakeGoogle {
            user: google_user("ada@example.com", true),
        }));
        let result = validator
            .validate(&Credentials::Google {
                code: "stale-code".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::IdentityProvider(_))));
    }

    #[tokio::test]
    async fn test_google_unconfigured() {
        let validator = GoogleValidator::unconfigured();
        assert!(!validator.is_configured());
        let result = validator
            .validate(&Credentials::Google {
                code: "good-code".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_portfolio_exact_pair_succeeds() {
        let identity = portfolio_validator()
            .validate(&portfolio("recruiter", "hunter2"))
            .await
            .unwrap();
        assert_eq!(identity.id, PORTFOLIO_USER_ID);
        assert_eq!(identity.display_name, PORTFOLIO_USER_NAME);
        assert_eq!(identity.email.as_deref(), Some(PORTFOLIO_USER_EMAIL));
        assert_eq!(identity.provider, Provider::Portfolio);
    }

    #[tokio::test]
    async fn test_portfolio_any_other_pair_fails() {
        let validator = portfolio_validator();
        let attempts = [
            ("recruiter", "hunter3"),
            ("Recruiter", "hunter2"),
            ("recruiter", ""),
            ("", "hunter2"),
            ("", ""),
            ("recruiter ", "hunter2"),
            ("hunter2", "recruiter"),
        ];
        for (username, password) in attempts {
            assert_eq!(
                validator.validate(&portfolio(username, password)).await,
                Err(AuthError::InvalidCredentials),
                "{username:?}/{password:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_portfolio_unconfigured_never_allows() {
        let validator = PortfolioValidator::new(None);
        assert!(!validator.is_configured());
        for (username, password) in [("", ""), ("recruiter", "hunter2")] {
            assert_eq!(
                validator.validate(&portfolio(username, password)).await,
                Err(AuthError::NotConfigured("PORTFOLIO_USERNAME/PORTFOLIO_PASSWORD"))
            );
        }
    }

    #[tokio::test]
    async fn test_mismatched_credentials_variant() {
        let result = portfolio_validator()
            .validate(&Credentials::Google {
                code: "good-code".to_string(),
            })
            .await;
        assert_eq!(
            result,
            Err(AuthError::UnrecognizedProvider("google".to_string()))
        );

        let result = GoogleValidator::unconfigured()
            .validate(&portfolio("recruiter", "hunter2"))
            .await;
        assert_eq!(
            result,
            Err(AuthError::UnrecognizedProvider("portfolio".to_string()))
        );
    }

    #[test]
    fn test_secure_eq() {
        assert!(secure_eq("hunter2", "hunter2"));
        assert!(secure_eq("", ""));
        assert!(!secure_eq("hunter2", "hunter3"));
        assert!(!secure_eq("hunter2", "hunter22"));
        assert!(!secure_eq("", "a"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", portfolio("recruiter", "hunter2"));
        assert!(!rendered.contains("hunter2"));
        let rendered = format!(
            "{:?}",
            PortfolioCredentialConfig {
                username: "recruiter".to_string(),
                password: "hunter2".to_string(),
            }
        );
        assert!(!rendered.contains("hunter2"));
    }
}
