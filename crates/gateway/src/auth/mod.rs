// Authentication module
// Decision: One shared, immutable AuthState; per-request data travels in the request itself
// Decision: Cookie-based sessions for the browser, forward-auth endpoint for an external edge proxy

pub mod config;
pub mod middleware;
pub mod oauth;
pub mod routes;

use anyhow::{Context, Result};
use std::sync::Arc;
use tuukaa_gateway_core::{
    Gateway, GoogleValidator, IdentityProvider, PortfolioValidator, SessionCodec,
};

pub use config::GatewayConfig;
pub use middleware::{route_guard, OptionalSessionUser};
pub use routes::routes;

use oauth::GoogleOAuthService;

/// Auth state shared across routes
#[derive(Clone)]
pub struct AuthState {
    pub config: Arc<GatewayConfig>,
    pub gateway: Arc<Gateway>,
}

impl AuthState {
    /// Build the state with the real Google OAuth client (when configured)
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let identity_provider = config.google.clone().map(|google| {
            Arc::new(GoogleOAuthService::new(google)) as Arc<dyn IdentityProvider>
        });
        Self::with_identity_provider(config, identity_provider)
    }

    /// Build the state around a given identity provider
    pub fn with_identity_provider(
        config: GatewayConfig,
        identity_provider: Option<Arc<dyn IdentityProvider>>,
    ) -> Result<Self> {
        let codec =
            SessionCodec::new(&config.auth_secret).context("Failed to create session codec")?;

        let google = match identity_provider {
            Some(idp) => GoogleValidator::new(idp),
            None => GoogleValidator::unconfigured(),
        };
        let portfolio = PortfolioValidator::new(config.portfolio.clone());

        let gateway = Gateway::new(codec, config.admin_emails.clone())
            .with_validator(Arc::new(google))
            .with_validator(Arc::new(portfolio));

        Ok(Self {
            config: Arc::new(config),
            gateway: Arc::new(gateway),
        })
    }
}
