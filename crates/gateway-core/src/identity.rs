// Principals, providers and roles
// Decision: Role is always derived from the provider, never taken from user input

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AuthError, Result};

/// Authentication method a principal signed in with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Portfolio,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Portfolio => "portfolio",
        }
    }

    /// Parse a provider tag. Unknown tags are a configuration error, not a
    /// reason to fall back to some default provider.
    pub fn parse(tag: &str) -> Result<Self> {
        match tag.to_lowercase().as_str() {
            "google" => Ok(Provider::Google),
            "portfolio" => Ok(Provider::Portfolio),
            _ => Err(AuthError::UnrecognizedProvider(tag.to_string())),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization level attached to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Portfolio,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Portfolio => "portfolio",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map the provider a principal was verified by to their role
pub fn resolve_role(provider: Provider) -> Role {
    match provider {
        Provider::Google => Role::Admin,
        Provider::Portfolio => Role::Portfolio,
    }
}

/// A principal resolved from credentials, before role assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-scoped identifier (Google subject, or the fixed portfolio id)
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub provider: Provider,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_role() {
        assert_eq!(resolve_role(Provider::Google), Role::Admin);
        assert_eq!(resolve_role(Provider::Portfolio), Role::Portfolio);
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(Provider::parse("google").unwrap(), Provider::Google);
        assert_eq!(Provider::parse("GOOGLE").unwrap(), Provider::Google);
        assert_eq!(Provider::parse("portfolio").unwrap(), Provider::Portfolio);
    }

    #[test]
    fn test_unknown_provider_tag_is_rejected() {
        assert_eq!(
            Provider::parse("github"),
            Err(AuthError::UnrecognizedProvider("github".to_string()))
        );
        assert!(Provider::parse("").is_err());
    }

    #[test]
    fn test_as_str_round_trips_through_parse() {
        for provider in [Provider::Google, Provider::Portfolio] {
            assert_eq!(Provider::parse(provider.as_str()).unwrap(), provider);
        }
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::Portfolio.to_string(), "portfolio");
    }
}
