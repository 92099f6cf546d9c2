//! Namespaced identities for addon validators and effects
//!
//! An addon registered as `name` under namespace `ns` is known as `ns.name`;
//! without a namespace it is known as plain `name`.

use crate::error::{Error, Result};

/// Separator between namespace and local name
pub const NAMESPACE_SEPARATOR: char = '.';

/// Build the identity of a registration from its name and optional namespace
pub fn qualified_name(name: &str, namespace: Option<&str>) -> String {
    match namespace.map(str::trim) {
        Some(ns) if !ns.is_empty() => format!("{}{}{}", ns, NAMESPACE_SEPARATOR, name),
        _ => name.to_string(),
    }
}

/// Validate a registration name: it must be non-empty after trimming
pub fn validate_name<'a>(parameter: &str, name: &'a str) -> Result<&'a str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::empty(parameter));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name() {
        assert_eq!(qualified_name("x", None), "x");
        assert_eq!(qualified_name("x", Some("")), "x");
        assert_eq!(qualified_name("x", Some("  ")), "x");
        assert_eq!(qualified_name("x", Some("a")), "a.x");
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("name", " border ").unwrap(), "border");
        assert!(matches!(validate_name("name", "   "), Err(Error::Empty(_))));
    }
}
