// Signed, expiring session tokens
// Decision: HS256 JWT carried in a cookie; no server-side session store
// Decision: Tampered and expired tokens collapse into one error so callers can't tell them apart

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::identity::{resolve_role, Identity, Provider, Role};

/// Session lifetime in seconds (24 hours)
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Proof of a prior successful authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub identity: Identity,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Seconds until expiry, clamped at zero
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

/// JWT claims for session tokens
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    /// Subject (identity ID)
    sub: String,
    /// Display name
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    /// Provider tag, parsed on decode
    provider: String,
    role: Role,
    /// Issued at (Unix timestamp)
    iat: i64,
    /// Expiration time (Unix timestamp)
    exp: i64,
}

/// Issues, signs and verifies session tokens with a process-wide secret
#[derive(Clone)]
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionCodec {
    pub fn new(secret: &str) -> Result<Self> {
        if secret.is_empty() {
            return Err(AuthError::NotConfigured("AUTH_SECRET"));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in decode_at against the caller's clock
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Create a token for a freshly validated identity. Timestamps are
    /// truncated to whole seconds, the resolution of the encoded form.
    pub fn issue(&self, identity: Identity, now: DateTime<Utc>) -> SessionToken {
        let issued_at = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        let role = resolve_role(identity.provider);

        SessionToken {
            identity,
            role,
            issued_at,
            expires_at: issued_at + Duration::seconds(SESSION_TTL_SECS),
        }
    }

    /// Sign a token into its opaque transport form
    pub fn encode(&self, token: &SessionToken) -> Result<String> {
        let claims = SessionClaims {
            sub: token.identity.id.clone(),
            name: token.identity.display_name.clone(),
            email: token.identity.email.clone(),
            provider: token.identity.provider.as_str().to_string(),
            role: token.role,
            iat: token.issued_at.timestamp(),
            exp: token.expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify and decode a token against the current time
    pub fn decode(&self, artifact: &str) -> Result<SessionToken> {
        self.decode_at(artifact, Utc::now())
    }

    /// Verify signature and expiry together. Every failure is reported as
    /// `InvalidOrExpiredSession`.
    pub fn decode_at(&self, artifact: &str, now: DateTime<Utc>) -> Result<SessionToken> {
        let token_data =
            decode::<SessionClaims>(artifact, &self.decoding_key, &self.validation).map_err(|e| {
                tracing::debug!(error = %e, "session token rejected");
                AuthError::InvalidOrExpiredSession
            })?;
        let claims = token_data.claims;

        let provider = Provider::parse(&claims.provider).map_err(|e| {
            tracing::debug!(error = %e, "session token names an unknown provider");
            AuthError::InvalidOrExpiredSession
        })?;

        // A signed token whose role disagrees with its provider was not minted by issue()
        if resolve_role(provider) != claims.role {
            tracing::debug!(provider = %provider, role = %claims.role, "session role mismatch");
            return Err(AuthError::InvalidOrExpiredSession);
        }

        let issued_at =
            DateTime::from_timestamp(claims.iat, 0).ok_or(AuthError::InvalidOrExpiredSession)?;
        let expires_at =
            DateTime::from_timestamp(claims.exp, 0).ok_or(AuthError::InvalidOrExpiredSession)?;

        let token = SessionToken {
            identity: Identity {
                id: claims.sub,
                display_name: claims.name,
                email: claims.email,
                provider,
            },
            role: claims.role,
            issued_at,
            expires_at,
        };

        if token.is_expired_at(now) {
            tracing::debug!(exp = claims.exp, "session token expired");
            return Err(AuthError::InvalidOrExpiredSession);
        }

        Ok(token)
    }
}
