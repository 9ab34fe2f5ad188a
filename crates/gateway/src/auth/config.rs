// Gateway configuration loaded from environment variables.
// Decision: Keep the variable names the frontend deployment already uses (AUTH_SECRET, ADMIN_EMAILS, ...)
// Decision: A missing signing secret stops the process; everything else degrades to a disabled sign-in method

use anyhow::{bail, Result};
use tuukaa_gateway_core::{Allowlist, PortfolioCredentialConfig};

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Google OAuth client configuration
#[derive(Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Complete gateway configuration, immutable after startup
#[derive(Clone)]
pub struct GatewayConfig {
    /// Public base URL, used for OAuth callbacks and the cookie Secure flag
    pub base_url: String,
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Secret for signing session tokens
    pub auth_secret: String,
    /// Google OAuth configuration
    pub google: Option<GoogleOAuthConfig>,
    /// Emails permitted to sign in with Google
    pub admin_emails: Allowlist,
    /// Shared portfolio demo account
    pub portfolio: Option<PortfolioCredentialConfig>,
    /// Key guarding the admin login page (open when unset)
    pub admin_login_access_key: Option<String>,
}

impl GatewayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary lookup (used by tests).
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let Some(auth_secret) = var("AUTH_SECRET") else {
            bail!("AUTH_SECRET is required");
        };

        let base_url = var("AUTH_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        // Google OAuth configuration
        let google = match (var("GOOGLE_CLIENT_ID"), var("GOOGLE_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => {
                let redirect_uri = var("AUTH_GOOGLE_REDIRECT_URI")
                    .unwrap_or_else(|| format!("{}/api/auth/callback/google", base_url));
                Some(GoogleOAuthConfig {
                    client_id,
                    client_secret,
                    redirect_uri,
                })
            }
            _ => None,
        };

        let admin_emails = var("ADMIN_EMAILS")
            .map(|s| Allowlist::from_csv(&s))
            .unwrap_or_default();

        // Portfolio account configuration
        let portfolio = match (var("PORTFOLIO_USERNAME"), var("PORTFOLIO_PASSWORD")) {
            (Some(username), Some(password)) => {
                Some(PortfolioCredentialConfig { username, password })
            }
            _ => None,
        };

        let admin_login_access_key = var("ADMIN_LOGIN_ACCESS_KEY");

        Ok(Self {
            base_url,
            bind_addr,
            auth_secret,
            google,
            admin_emails,
            portfolio,
            admin_login_access_key,
        })
    }

    /// Cookies get the Secure flag when the gateway is served over https
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Report configuration gaps once at startup. Missing optional settings
    /// disable a sign-in method rather than stopping the process.
    pub fn log_startup_checks(&self) {
        if self.admin_emails.is_empty() {
            tracing::error!("ADMIN_EMAILS is not set, google sign-in will reject every account");
        }
        if self.google.is_none() {
            tracing::warn!("GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET not set, google sign-in disabled");
        }
        if self.portfolio.is_none() {
            tracing::warn!(
                "PORTFOLIO_USERNAME/PORTFOLIO_PASSWORD not set, portfolio sign-in disabled"
            );
        }
        if self.admin_login_access_key.is_none() {
            tracing::warn!("ADMIN_LOGIN_ACCESS_KEY is not set, admin login page is accessible without key");
        }

        tracing::info!(
            base_url = %self.base_url,
            google = self.google.is_some(),
            admin_emails = self.admin_emails.len(),
            portfolio = self.portfolio.is_some(),
            secure_cookies = self.secure_cookies(),
            "Authentication configured"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<GatewayConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GatewayConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let err = load(&[]).err().expect("config without AUTH_SECRET must fail");
        assert!(err.to_string().contains("AUTH_SECRET"));

        assert!(load(&[("AUTH_SECRET", "   ")]).is_err());
    }

    #[test]
    fn test_minimal_config() {
        let config = load(&[("AUTH_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.auth_secret, "s3cret");
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert!(config.google.is_none());
        assert!(config.admin_emails.is_empty());
        assert!(config.portfolio.is_none());
        assert!(config.admin_login_access_key.is_none());
        assert!(!config.secure_cookies());
    }

    #[test]
    fn test_full_config() {
        let config = load(&[
            ("AUTH_SECRET", "s3cret"),
            ("AUTH_URL", "https://tuukaa.example.com/"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("GOOGLE_CLIENT_ID", "client-id"),
            ("GOOGLE_CLIENT_SECRET", "client-secret"),
            ("ADMIN_EMAILS", "a@example.com, b@example.com"),
            ("PORTFOLIO_USERNAME", "recruiter"),
            ("PORTFOLIO_PASSWORD", "hunter2"),
            ("ADMIN_LOGIN_ACCESS_KEY", "door-key"),
        ])
        .unwrap();

        assert_eq!(config.base_url, "https://tuukaa.example.com");
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert!(config.secure_cookies());

        let google = config.google.expect("google configured");
        assert_eq!(google.client_id, "client-id");
        assert_eq!(
            google.redirect_uri,
            "https://tuukaa.example.com/api/auth/callback/google"
        );

        assert_eq!(config.admin_emails.len(), 2);
        assert!(config.admin_emails.is_allowed(Some("b@example.com")));

        let portfolio = config.portfolio.expect("portfolio configured");
        assert_eq!(portfolio.username, "recruiter");
        assert_eq!(config.admin_login_access_key.as_deref(), Some("door-key"));
    }

    #[test]
    fn test_half_configured_pairs_are_absent() {
        let config = load(&[
            ("AUTH_SECRET", "s3cret"),
            ("GOOGLE_CLIENT_ID", "client-id"),
            ("PORTFOLIO_PASSWORD", "hunter2"),
            ("PORTFOLIO_USERNAME", ""),
        ])
        .unwrap();
        assert!(config.google.is_none());
        assert!(config.portfolio.is_none());
    }

    #[test]
    fn test_redirect_uri_override() {
        let config = load(&[
            ("AUTH_SECRET", "s3cret"),
            ("GOOGLE_CLIENT_ID", "client-id"),
            ("GOOGLE_CLIENT_SECRET", "client-secret"),
            ("AUTH_GOOGLE_REDIRECT_URI", "https://edge.example.com/cb"),
        ])
        .unwrap();
        assert_eq!(
            config.google.unwrap().redirect_uri,
            "https://edge.example.com/cb"
        );
    }
}
