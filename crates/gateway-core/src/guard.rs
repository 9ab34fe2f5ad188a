// Route protection decisions
// Decision: The guard is role-agnostic; role-specific gating belongs to the protected application
// Decision: Login pages are always reachable so a stale or missing session can't cause a redirect loop

use crate::identity::Role;
use crate::session::SessionToken;

/// Where unauthenticated requests to protected pages are sent
pub const LOGIN_PATH: &str = "/login";

/// Paths reachable regardless of session state
pub const ALWAYS_ALLOWED_PATHS: &[&str] = &["/login", "/portfolio-login"];

/// Areas that require a session; each matches itself and everything below it
pub const PROTECTED_PREFIXES: &[&str] = &["/embed-admin", "/chat-test"];

/// How a path is treated by the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClassification {
    /// No session required
    Public,
    /// Session required, otherwise redirect to login
    AuthGate,
    /// Login pages themselves
    AlwaysAllow,
}

/// Authentication state of the request being decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    AuthenticatedAdmin,
    AuthenticatedPortfolio,
}

impl SessionState {
    pub fn from_session(session: Option<&SessionToken>) -> Self {
        match session.map(|s| s.role) {
            None => SessionState::Unauthenticated,
            Some(Role::Admin) => SessionState::AuthenticatedAdmin,
            Some(Role::Portfolio) => SessionState::AuthenticatedPortfolio,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, SessionState::Unauthenticated)
    }
}

/// Outcome of a guard decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Redirect(String),
    AllowAlways,
}

/// Classify a request path. Only the path is considered; strip the query first.
/// The path is normalized before matching, see [`normalize_path`].
pub fn classify(path: &str) -> RouteClassification {
    let path = normalize_path(path);

    if ALWAYS_ALLOWED_PATHS.contains(&path.as_str()) {
        return RouteClassification::AlwaysAllow;
    }

    if path == "/" || PROTECTED_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return RouteClassification::AuthGate;
    }

    RouteClassification::Public
}

/// Decide what happens to a request for `path` in the given session state
pub fn decide(path: &str, state: SessionState) -> Verdict {
    match classify(path) {
        RouteClassification::AlwaysAllow => Verdict::AllowAlways,
        RouteClassification::AuthGate if state.is_authenticated() => Verdict::Allow,
        RouteClassification::AuthGate => Verdict::Redirect(LOGIN_PATH.to_string()),
        RouteClassification::Public => Verdict::Allow,
    }
}

/// Bring a raw request path into the form upstream servers route on:
/// percent-escapes decoded (repeatedly, for double encoding), backslashes
/// read as `/`, repeated slashes collapsed and dot segments resolved.
pub fn normalize_path(raw: &str) -> String {
    let mut decoded = raw.to_string();
    for _ in 0..MAX_DECODE_ROUNDS {
        if !decoded.contains('%') {
            break;
        }
        let next = String::from_utf8_lossy(&urlencoding::decode_binary(decoded.as_bytes()))
            .into_owned();
        if next == decoded {
            break;
        }
        decoded = next;
    }

    let decoded = decoded.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut normalized = format!("/{}", segments.join("/"));
    let trailing = decoded.ends_with('/') || decoded.ends_with("/.") || decoded.ends_with("/..");
    if trailing && normalized.len() > 1 {
        normalized.push('/');
    }
    normalized
}

const MAX_DECODE_ROUNDS: usize = 3;
