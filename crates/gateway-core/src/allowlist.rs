// Admin email allowlist
// Decision: An empty allowlist rejects everyone; missing configuration never means "no restriction"
// Decision: Compare emails ASCII-case-insensitively (Google reports addresses lowercased)

use std::collections::HashSet;

/// Fixed set of Google account emails permitted to sign in as admin
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    emails: HashSet<String>,
}

impl Allowlist {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let emails = emails
            .into_iter()
            .map(|e| e.as_ref().trim().to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { emails }
    }

    /// Parse a comma-separated list such as the `ADMIN_EMAILS` setting.
    /// Blank entries are dropped, so `""` and `" , "` both yield an empty list.
    pub fn from_csv(s: &str) -> Self {
        Self::new(s.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_allowed(&self, email: Option<&str>) -> bool {
        let Some(email) = email else {
            return false;
        };
        let email = email.trim();
        if email.is_empty() {
            return false;
        }
        self.emails.contains(&email.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listed_email_is_allowed() {
        let list = Allowlist::from_csv("admin@example.com, ops@example.com");
        assert_eq!(list.len(), 2);
        assert!(list.is_allowed(Some("admin@example.com")));
        assert!(list.is_allowed(Some("ops@example.com")));
    }

    #[test]
    fn test_unlisted_email_is_rejected() {
        let list = Allowlist::from_csv("admin@example.com");
        assert!(!list.is_allowed(Some("intruder@example.com")));
        assert!(!list.is_allowed(Some("admin@example.com.evil")));
    }

    #[test]
    fn test_missing_email_is_rejected() {
        let list = Allowlist::from_csv("admin@example.com");
        assert!(!list.is_allowed(None));
        assert!(!list.is_allowed(Some("")));
        assert!(!list.is_allowed(Some("   ")));
    }

    #[test]
    fn test_empty_list_fails_closed() {
        for raw in ["", " ", ",", " , ,"] {
            let list = Allowlist::from_csv(raw);
            assert!(list.is_empty(), "{raw:?} should parse to an empty list");
            assert!(!list.is_allowed(Some("admin@example.com")));
            assert!(!list.is_allowed(Some("")));
            assert!(!list.is_allowed(None));
        }
        assert!(!Allowlist::default().is_allowed(Some("admin@example.com")));
    }

    #[test]
    fn test_case_and_whitespace_are_normalized() {
        let list = Allowlist::from_csv("  Admin@Example.com ");
        assert!(list.is_allowed(Some("admin@example.com")));
        assert!(list.is_allowed(Some("ADMIN@EXAMPLE.COM")));
        assert!(list.is_allowed(Some(" admin@example.com ")));
    }
}
