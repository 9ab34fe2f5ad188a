// Per-request decision pipeline
// Decision: All request state arrives through RequestContext; the gateway itself is immutable and shared
// Decision: Rejected Google sign-ins are logged on the "audit" target with the offending email

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::allowlist::Allowlist;
use crate::error::{AuthError, Result};
use crate::guard::{self, SessionState, Verdict};
use crate::identity::{Identity, Provider};
use crate::session::{SessionCodec, SessionToken};
use crate::validators::{CredentialValidator, Credentials};

/// Everything the gateway needs to know about an inbound request
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    /// Request path without query string
    pub path: &'a str,
    /// Session artifact presented by the client, if any
    pub session_artifact: Option<&'a str>,
    pub now: DateTime<Utc>,
}

impl<'a> RequestContext<'a> {
    pub fn new(path: &'a str, session_artifact: Option<&'a str>) -> Self {
        Self {
            path,
            session_artifact,
            now: Utc::now(),
        }
    }
}

/// Result of authorizing one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,
    pub session: Option<SessionToken>,
}

impl Decision {
    pub fn state(&self) -> SessionState {
        SessionState::from_session(self.session.as_ref())
    }
}

/// A freshly issued session and its signed transport form
#[derive(Debug, Clone)]
pub struct SignedSession {
    pub token: SessionToken,
    pub encoded: String,
}

/// Composes validators, allowlist, role resolution, session codec and guard
pub struct Gateway {
    codec: SessionCodec,
    allowlist: Allowlist,
    validators: HashMap<Provider, Arc<dyn CredentialValidator>>,
}

impl Gateway {
    pub fn new(codec: SessionCodec, allowlist: Allowlist) -> Self {
        Self {
            codec,
            allowlist,
            validators: HashMap::new(),
        }
    }

    /// Register a validator under the provider it reports
    pub fn with_validator(mut self, validator: Arc<dyn CredentialValidator>) -> Self {
        self.validators.insert(validator.provider(), validator);
        self
    }

    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    pub fn allowlist(&self) -> &Allowlist {
        &self.allowlist
    }

    /// Whether sign-in through `provider` can currently succeed for anyone
    pub fn provider_enabled(&self, provider: Provider) -> bool {
        let validator_ready = self
            .validators
            .get(&provider)
            .is_some_and(|v| v.is_configured());
        match provider {
            Provider::Google => validator_ready && !self.allowlist.is_empty(),
            Provider::Portfolio => validator_ready,
        }
    }

    /// Decode a presented session artifact. Anything that fails verification
    /// is treated as no session at all.
    pub fn session(&self, artifact: Option<&str>, now: DateTime<Utc>) -> Option<SessionToken> {
        let artifact = artifact.filter(|a| !a.is_empty())?;
        self.codec.decode_at(artifact, now).ok()
    }

    /// Decide whether the request may proceed
    pub fn authorize(&self, request: &RequestContext<'_>) -> Decision {
        let session = self.session(request.session_artifact, request.now);
        let verdict = guard::decide(
            request.path,
            SessionState::from_session(session.as_ref()),
        );

        if let Verdict::Redirect(ref to) = verdict {
            tracing::debug!(path = %request.path, redirect = %to, "no session for protected path");
        }

        Decision { verdict, session }
    }

    /// Run a login attempt through to a signed session
    pub async fn sign_in(
        &self,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<SignedSession> {
        let provider = credentials.provider();
        let result = self.sign_in_inner(provider, credentials, now).await;

        match &result {
            Ok(signed) => tracing::info!(
                provider = %provider,
                user_id = %signed.token.identity.id,
                role = %signed.token.role,
                "sign-in succeeded"
            ),
            Err(e) if e.is_operator_facing() => {
                tracing::error!(provider = %provider, error = %e, "sign-in failed")
            }
            // NotAllowlisted already produced its audit line
            Err(AuthError::NotAllowlisted) => {}
            Err(e) => tracing::info!(provider = %provider, error = %e, "sign-in rejected"),
        }

        result
    }

    async fn sign_in_inner(
        &self,
        provider: Provider,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<SignedSession> {
        let validator = self
            .validators
            .get(&provider)
            .ok_or_else(|| AuthError::UnrecognizedProvider(provider.to_string()))?;

        if provider == Provider::Google && self.allowlist.is_empty() {
            tracing::error!("ADMIN_EMAILS is empty, google sign-in is disabled");
            return Err(AuthError::NotAllowlisted);
        }

        let identity = validator.validate(credentials).await?;

        if identity.provider == Provider::Google {
            self.check_allowlist(&identity)?;
        }

        let token = self.codec.issue(identity, now);
        let encoded = self.codec.encode(&token)?;

        Ok(SignedSession { token, encoded })
    }

    fn check_allowlist(&self, identity: &Identity) -> Result<()> {
        if self.allowlist.is_allowed(identity.email.as_deref()) {
            return Ok(());
        }

        tracing::warn!(
            target: "audit",
            email = identity.email.as_deref().unwrap_or("<none>"),
            subject = %identity.id,
            "access denied: email not allowlisted"
        );
        Err(AuthError::NotAllowlisted)
    }
}
