// Google OAuth handshake
// Decision: Manual OAuth2 code flow over reqwest; the verified userinfo response is trusted as-is
// Decision: The allowlist is not consulted here - that is the gateway's job

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tuukaa_gateway_core::{AuthError, IdentityProvider, VerifiedGoogleUser};

use super::config::GoogleOAuthConfig;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

impl GoogleOAuthConfig {
    /// Build the URL the browser is sent to for the Google consent screen
    pub fn authorization_url(&self, state: &str) -> Result<Url, url::ParseError> {
        Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
                ("prompt", "select_account"),
            ],
        )
    }
}

/// Google OAuth service
pub struct GoogleOAuthService {
    config: GoogleOAuthConfig,
    client: reqwest::Client,
}

impl GoogleOAuthService {
    pub fn new(config: GoogleOAuthConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleOAuthService {
    /// Exchange authorization code for the verified Google user
    async fn exchange_code(&self, code: &str) -> Result<VerifiedGoogleUser, AuthError> {
        // Exchange code for token
        let token_response: GoogleTokenResponse = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::identity_provider(format!("code exchange failed: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::identity_provider(format!("bad token response: {e}")))?;

        // Fetch user info
        let user_info: GoogleUserInfo = self
            .client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token_response.access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::identity_provider(format!("userinfo request failed: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::identity_provider(format!("bad userinfo response: {e}")))?;

        Ok(user_info.into())
    }
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
}

impl From<GoogleUserInfo> for VerifiedGoogleUser {
    fn from(info: GoogleUserInfo) -> Self {
        VerifiedGoogleUser {
            subject: info.sub,
            email: info.email.unwrap_or_default(),
            name: info.name,
            email_verified: info.email_verified.unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GoogleOAuthConfig {
        GoogleOAuthConfig {
            client_id: "client id".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_uri: "http://localhost:3000/api/auth/callback/google".to_string(),
        }
    }

    #[test]
    fn test_authorization_url() {
        let url = config().authorization_url("abc123").unwrap();
        assert_eq!(url.host_str(), Some("accounts.google.com"));

        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "client id");
        assert_eq!(
            params["redirect_uri"],
            "http://localhost:3000/api/auth/callback/google"
        );
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["scope"], "openid email profile");
        assert_eq!(params["state"], "abc123");
        assert!(!params.contains_key("client_secret"));
    }

    #[test]
    fn test_userinfo_conversion() {
        let info: GoogleUserInfo = serde_json::from_str(
            r#"{"sub":"42","email":"ada@example.com","name":"Ada","email_verified":true,"picture":"x"}"#,
        )
        .unwrap();
        let user = VerifiedGoogleUser::from(info);
        assert_eq!(user.subject, "42");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.name.as_deref(), Some("Ada"));
        assert!(user.email_verified);
    }

    #[test]
    fn test_userinfo_without_email_is_unverified() {
        let info: GoogleUserInfo = serde_json::from_str(r#"{"sub":"42"}"#).unwrap();
        let user = VerifiedGoogleUser::from(info);
        assert_eq!(user.email, "");
        assert!(!user.email_verified);
    }
}
