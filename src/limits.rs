//! Limits applied before pattern matching
//!
//! Structural bounds on email addresses are checked before any regular
//! expression runs, so oversized input is rejected without ever reaching the
//! pattern engine.

/// Structural limits configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum length of the part before `@`
    pub max_email_local_part: usize,

    /// Maximum length of the part after `@`
    pub max_email_domain: usize,

    /// Maximum length of one dot-separated domain label
    pub max_email_label: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_email_local_part: 64,
            max_email_domain: 255,
            max_email_label: 63,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_email_local_part: 32,
            max_email_domain: 128,
            max_email_label: 63,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_email_local_part: 256,
            max_email_domain: 1024,
            max_email_label: 255,
        }
    }

    /// Check if the local part of an address is within limits
    pub fn check_email_local_part(&self, local: &str) -> bool {
        local.len() <= self.max_email_local_part
    }

    /// Check if the domain of an address is within limits
    pub fn check_email_domain(&self, domain: &str) -> bool {
        domain.len() <= self.max_email_domain
            && domain
                .split('.')
                .all(|label| label.len() <= self.max_email_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_email_local_part, 64);
        assert_eq!(limits.max_email_domain, 255);
        assert_eq!(limits.max_email_label, 63);
    }

    #[test]
    fn test_strict_limits() {
        let limits = Limits::strict();
        assert!(limits.max_email_local_part < Limits::default().max_email_local_part);
    }

    #[test]
    fn test_check_email_local_part() {
        let limits = Limits::default();
        assert!(limits.check_email_local_part(&"a".repeat(64)));
        assert!(!limits.check_email_local_part(&"a".repeat(65)));
    }

    #[test]
    fn test_check_email_domain() {
        let limits = Limits::default();
        assert!(limits.check_email_domain("example.com"));
        assert!(!limits.check_email_domain(&format!("{}.com", "a".repeat(64))));
        assert!(limits.check_email_domain(&format!("{}.com", "a".repeat(63))));

        let long_domain = vec!["abcdefghij"; 24].join(".");
        assert!(long_domain.len() > 255);
        assert!(!limits.check_email_domain(&long_domain));
    }
}
