//! Value validators
//!
//! This module contains the built-in validators, the regex construction they
//! share, and the per-owner registry that composes built-ins and addons into
//! one validation chain.

pub mod builtins;
pub mod patterns;

use crate::error::Result;
use crate::limits::Limits;
use crate::names::{qualified_name, validate_name};
use crate::registry::{AddonRegistry, Listing, Scope};
use crate::rules::Rule;
use crate::Error;
use std::fmt;
use std::rc::Rc;

// Re-exports
pub use builtins::{
    alnum_validator, alpha_validator, ascii_text_validator, email_validator, is_valid_email,
    length_validator, number_validator, regex_validator, required_validator, BuiltinValidator,
    BUILTIN_VALIDATORS,
};

/// Facts about the element and its owner that are not part of its value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extras {
    /// Checked state, computed for checkbox rules
    pub checked: Option<bool>,
    /// Structural limits for email addresses
    pub limits: Limits,
}

/// Signature shared by every validator: `(value, rule, previous, extras)`
pub type ValidatorFn = Rc<dyn Fn(Option<&str>, &Rule, bool, &Extras) -> bool>;

/// A user-supplied validator and its registration metadata
#[derive(Clone)]
pub struct AddonValidator {
    key: String,
    namespace: Option<String>,
    validator: ValidatorFn,
}

impl AddonValidator {
    /// Create an addon validator
    pub fn new(
        key: &str,
        validator: impl Fn(Option<&str>, &Rule, bool, &Extras) -> bool + 'static,
    ) -> Self {
        Self {
            key: key.to_string(),
            namespace: None,
            validator: Rc::new(validator),
        }
    }

    /// Register under a namespace
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Key without namespace
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Namespace, if any
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Namespaced identity
    pub fn identity(&self) -> String {
        qualified_name(self.key.trim(), self.namespace.as_deref())
    }

    /// Run the validator
    pub fn validate(&self, value: Option<&str>, rule: &Rule, previous: bool, extras: &Extras) -> bool {
        (self.validator)(value, rule, previous, extras)
    }
}

impl fmt::Debug for AddonValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddonValidator")
            .field("key", &self.key)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

/// One step of a resolved validation chain
#[derive(Debug, Clone)]
pub enum ChainLink {
    /// Built-in validator
    Builtin(BuiltinValidator),
    /// Addon validator
    Addon(AddonValidator),
}

impl ChainLink {
    /// Identity of the step
    pub fn identity(&self) -> String {
        match self {
            ChainLink::Builtin(builtin) => builtin.key().to_string(),
            ChainLink::Addon(addon) => addon.identity(),
        }
    }

    /// Run the step
    pub fn validate(&self, value: Option<&str>, rule: &Rule, previous: bool, extras: &Extras) -> bool {
        match self {
            ChainLink::Builtin(builtin) => builtin.validate(value, rule, previous, extras),
            ChainLink::Addon(addon) => addon.validate(value, rule, previous, extras),
        }
    }
}

/// Run a chain, feeding each step the running result.
///
/// Every step runs, even after a failure; the result is the AND of all
/// returns.
pub fn run_chain(chain: &[ChainLink], value: Option<&str>, rule: &Rule, extras: &Extras) -> bool {
    chain.iter().fold(true, |passed, link| {
        let result = link.validate(value, rule, passed, extras);
        tracing::trace!(validator = %link.identity(), result, "validator ran");
        passed && result
    })
}

/// Built-in table plus addon validators of one owner
#[derive(Clone)]
pub struct ValidatorRegistry {
    builtins: bool,
    addons: AddonRegistry<AddonValidator>,
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidatorRegistry {
    /// Create a registry holding only the built-ins
    pub fn new() -> Self {
        Self {
            builtins: true,
            addons: AddonRegistry::new("validator"),
        }
    }

    /// Create a registry without the built-ins
    pub fn without_builtins() -> Self {
        Self {
            builtins: false,
            ..Self::new()
        }
    }

    /// Built-ins available to this registry
    pub fn builtins(&self) -> &'static [BuiltinValidator] {
        if self.builtins {
            &BUILTIN_VALIDATORS
        } else {
            &[]
        }
    }

    /// Register an addon; returns its identity.
    ///
    /// Neither the key nor the namespaced identity may name a built-in.
    pub fn add(&mut self, addon: AddonValidator) -> Result<String> {
        let key = validate_name("key", addon.key())?;
        let identity = addon.identity();
        if BuiltinValidator::from_key(key).is_some() {
            return Err(Error::reserved("validator", key));
        }
        if BuiltinValidator::from_key(&identity).is_some() {
            return Err(Error::reserved("validator", &identity));
        }
        self.addons.register(identity.clone(), addon)?;
        tracing::debug!(validator = %identity, "registered addon validator");
        Ok(identity)
    }

    /// Whether an identity is registered (built-in or addon)
    pub fn contains(&self, identity: &str) -> bool {
        self.builtins().iter().any(|b| b.key() == identity) || self.addons.contains(identity)
    }

    /// Number of validators, built-ins included
    pub fn len(&self) -> usize {
        self.builtins().len() + self.addons.len()
    }

    /// Whether no validator is registered at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Addons in registration order
    pub fn addons(&self) -> impl Iterator<Item = &AddonValidator> {
        self.addons.iter().map(|(_, addon)| addon)
    }

    /// List built-ins and/or addons
    pub fn listing(&self, scope: Scope) -> Listing<BuiltinValidator, AddonValidator> {
        self.addons.listing(self.builtins(), scope)
    }

    /// Resolve the chain for a rule: applicable built-ins, then every addon
    pub fn chain(&self, rule: &Rule) -> Vec<ChainLink> {
        self.builtins()
            .iter()
            .filter(|builtin| builtin.applies_to(rule))
            .copied()
            .map(ChainLink::Builtin)
            .chain(self.addons().cloned().map(ChainLink::Addon))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{FieldType, Length};
    use std::cell::RefCell;

    #[test]
    fn test_add_rejects_builtin_keys() {
        let mut registry = ValidatorRegistry::new();
        let err = registry
            .add(AddonValidator::new("email", |_, _, _, _| true))
            .unwrap_err();
        assert!(matches!(err, Error::KeyExists(_)));

        let err = registry
            .add(AddonValidator::new("email", |_, _, _, _| true).with_namespace("custom"))
            .unwrap_err();
        assert!(matches!(err, Error::KeyExists(_)));
    }

    #[test]
    fn test_add_rejects_empty_and_duplicate_keys() {
        let mut registry = ValidatorRegistry::new();
        assert!(matches!(
            registry.add(AddonValidator::new("  ", |_, _, _, _| true)),
            Err(Error::Empty(_))
        ));

        assert_eq!(
            registry
                .add(AddonValidator::new("zip", |_, _, _, _| true))
                .unwrap(),
            "zip"
        );
        assert_eq!(
            registry
                .add(AddonValidator::new("zip", |_, _, _, _| true).with_namespace("us"))
                .unwrap(),
            "us.zip"
        );
        assert!(matches!(
            registry.add(AddonValidator::new("zip", |_, _, _, _| true).with_namespace("us")),
            Err(Error::KeyExists(_))
        ));
        assert_eq!(registry.len(), BUILTIN_VALIDATORS.len() + 2);
        assert!(registry.contains("us.zip"));
        assert!(registry.contains("email"));
    }

    #[test]
    fn test_chain_appends_addons_after_builtins() {
        let mut registry = ValidatorRegistry::new();
        registry
            .add(AddonValidator::new("even", |v, _, _, _| {
                v.map(|v| v.len() % 2 == 0).unwrap_or(false)
            }))
            .unwrap();

        let rule = Rule::new().required(true).of_type(FieldType::Number);
        let identities: Vec<_> = registry.chain(&rule).iter().map(ChainLink::identity).collect();
        assert_eq!(identities, vec!["required", "number", "even"]);

        let chain = registry.chain(&rule);
        assert!(run_chain(&chain, Some("12"), &rule, &Extras::default()));
        assert!(!run_chain(&chain, Some("123"), &rule, &Extras::default()));
        assert!(!run_chain(&chain, Some("ab"), &rule, &Extras::default()));
    }

    #[test]
    fn test_run_chain_runs_every_step_with_running_result() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ValidatorRegistry::new();
        let log = Rc::clone(&seen);
        registry
            .add(AddonValidator::new("spy", move |_, _, previous, _| {
                log.borrow_mut().push(previous);
                true
            }))
            .unwrap();

        let rule = Rule::new().of_type(FieldType::Alpha).length(Length::min(3));
        let chain = registry.chain(&rule);
        assert!(!run_chain(&chain, Some("ab"), &rule, &Extras::default()));
        assert!(run_chain(&chain, Some("abc"), &rule, &Extras::default()));
        assert_eq!(*seen.borrow(), vec![false, true]);
    }

    #[test]
    fn test_without_builtins() {
        let mut registry = ValidatorRegistry::without_builtins();
        assert!(registry.is_empty());
        assert!(!registry.contains("email"));
        assert!(registry.chain(&Rule::new().required(true)).is_empty());
        assert!(registry
            .add(AddonValidator::new("required", |_, _, _, _| true))
            .is_err());
        registry
            .add(AddonValidator::new("always", |_, _, _, _| true))
            .unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_listing() {
        let mut registry = ValidatorRegistry::new();
        assert!(matches!(registry.listing(Scope::Addon), Listing::Addon(None)));
        registry
            .add(AddonValidator::new("zip", |_, _, _, _| true).with_namespace("us"))
            .unwrap();
        let listing = registry.listing(Scope::All);
        assert_eq!(listing.defaults().len(), 8);
        assert_eq!(listing.addon_identities(), vec!["us.zip"]);
    }
}
