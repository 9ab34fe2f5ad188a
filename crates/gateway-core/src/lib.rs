// Tuukaa gateway core
// Decision: Pure decision logic shared by the HTTP gateway and its tests; no I/O beyond the IdentityProvider trait

pub mod allowlist;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod identity;
pub mod session;
pub mod validators;

pub use allowlist::Allowlist;
pub use error::{AuthError, Result};
pub use gateway::{Decision, Gateway, RequestContext, SignedSession};
pub use guard::{RouteClassification, SessionState, Verdict, LOGIN_PATH};
pub use identity::{resolve_role, Identity, Provider, Role};
pub use session::{SessionCodec, SessionToken, SESSION_TTL_SECS};
pub use validators::{
    CredentialValidator, Credentials, GoogleValidator, IdentityProvider,
    PortfolioCredentialConfig, PortfolioValidator, VerifiedGoogleUser,
};
