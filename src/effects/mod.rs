//! Presentation effects
//!
//! Effects react to validation outcomes by mutating the element: classes,
//! attributes, anything presentational. Built-ins always run first, addons
//! follow in registration order.

pub mod builtins;
pub mod shared;

use crate::dom::Element;
use crate::error::{Error, Result};
use crate::names::{qualified_name, validate_name};
use crate::registry::{AddonRegistry, Listing, Scope};
use std::fmt;
use std::rc::Rc;

pub use builtins::{is_submit_button, BuiltinEffect, BUILTIN_EFFECTS};

/// Handler invoked with the element
pub type EffectFn = Rc<dyn Fn(&dyn Element)>;

/// A user-supplied effect
#[derive(Clone)]
pub struct Effect {
    name: String,
    namespace: Option<String>,
    init: Option<EffectFn>,
    valid: EffectFn,
    invalid: EffectFn,
}

impl Effect {
    /// Create an effect from its `valid` and `invalid` handlers
    pub fn new(
        name: &str,
        valid: impl Fn(&dyn Element) + 'static,
        invalid: impl Fn(&dyn Element) + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            namespace: None,
            init: None,
            valid: Rc::new(valid),
            invalid: Rc::new(invalid),
        }
    }

    /// Register under a namespace
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Handler run once when the effect is bound to an element
    pub fn with_init(mut self, init: impl Fn(&dyn Element) + 'static) -> Self {
        self.init = Some(Rc::new(init));
        self
    }

    /// Name without namespace
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace, if any
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Namespaced identity
    pub fn identity(&self) -> String {
        qualified_name(self.name.trim(), self.namespace.as_deref())
    }

    /// Run `init`, if present
    pub fn init(&self, element: &dyn Element) {
        if let Some(init) = &self.init {
            init(element);
        }
    }

    /// Run `valid` or `invalid`
    pub fn apply(&self, element: &dyn Element, valid: bool) {
        if valid {
            (self.valid)(element);
        } else {
            (self.invalid)(element);
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("init", &self.init.is_some())
            .finish_non_exhaustive()
    }
}

/// Built-in table plus addon effects of one owner.
///
/// Unless detached, a registry falls back to the thread's shared effects
/// for every identity it does not register itself.
#[derive(Clone)]
pub struct EffectRegistry {
    builtins: bool,
    inherit: bool,
    addons: AddonRegistry<Effect>,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectRegistry {
    /// Create a registry holding only the built-ins
    pub fn new() -> Self {
        Self {
            builtins: true,
            inherit: true,
            addons: AddonRegistry::new("effect"),
        }
    }

    /// Create a registry without the built-ins or the shared effects
    pub fn without_builtins() -> Self {
        Self {
            builtins: false,
            inherit: false,
            ..Self::new()
        }
    }

    /// Create a registry that ignores the shared effects
    pub(crate) fn detached() -> Self {
        Self {
            inherit: false,
            ..Self::new()
        }
    }

    /// Built-ins available to this registry
    pub fn builtins(&self) -> &'static [BuiltinEffect] {
        if self.builtins {
            &BUILTIN_EFFECTS
        } else {
            &[]
        }
    }

    /// Check an effect's shape and identity, then store it; returns its
    /// identity. `init` is left to the owner, which knows the element.
    pub fn register(&mut self, effect: Effect) -> Result<String> {
        let name = validate_name("name", effect.name())?;
        if BuiltinEffect::from_name(name).is_some() {
            return Err(Error::reserved("effect", name));
        }
        let identity = effect.identity();
        if BuiltinEffect::from_name(&identity).is_some() {
            return Err(Error::reserved("effect", &identity));
        }
        self.addons.register(identity.clone(), effect)?;
        tracing::debug!(effect = %identity, "registered addon effect");
        Ok(identity)
    }

    /// Whether an identity is registered here (built-in or own addon)
    pub fn contains(&self, identity: &str) -> bool {
        self.builtins().iter().any(|b| b.name() == identity) || self.addons.contains(identity)
    }

    /// Number of effects registered here, built-ins included
    pub fn len(&self) -> usize {
        self.builtins().len() + self.addons.len()
    }

    /// Whether no effect is registered at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Addons in registration order
    pub fn addons(&self) -> impl Iterator<Item = &Effect> {
        self.addons.iter().map(|(_, effect)| effect)
    }

    /// Shared effects not shadowed by an own addon
    pub fn inherited(&self) -> Vec<Effect> {
        if !self.inherit {
            return Vec::new();
        }
        shared::snapshot()
            .into_iter()
            .filter(|effect| !self.addons.contains(&effect.identity()))
            .collect()
    }

    /// List built-ins and/or addons, own addons before inherited ones
    pub fn listing(&self, scope: Scope) -> Listing<BuiltinEffect, Effect> {
        let inherited = self.inherited();
        if inherited.is_empty() {
            return self.addons.listing(self.builtins(), scope);
        }
        let mut merged = self.addons.clone();
        merged.extend_missing(inherited.into_iter().map(|e| (e.identity(), e)));
        merged.listing(self.builtins(), scope)
    }

    /// Snapshot of own and inherited addons, so handlers can run without a
    /// borrow held
    pub fn snapshot(&self) -> Vec<Effect> {
        let mut effects: Vec<Effect> = self.addons().cloned().collect();
        effects.extend(self.inherited());
        effects
    }
}

/// Run the given built-ins, then the given addons, against an element
pub fn apply_all(element: &dyn Element, builtins: &[BuiltinEffect], addons: &[Effect], valid: bool) {
    for builtin in builtins {
        builtin.apply(element, valid);
    }
    for effect in addons {
        effect.apply(element, valid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryElement;
    use std::cell::Cell;

    fn noop(name: &str) -> Effect {
        Effect::new(name, |_| {}, |_| {})
    }

    #[test]
    fn test_namespaced_identities_are_distinct() {
        let mut registry = EffectRegistry::new();
        assert_eq!(registry.register(noop("x")).unwrap(), "x");
        assert_eq!(registry.register(noop("x").with_namespace("a")).unwrap(), "a.x");
        let err = registry.register(noop("x").with_namespace("a")).unwrap_err();
        assert!(matches!(err, Error::KeyExists(_)));
        assert_eq!(registry.len(), BUILTIN_EFFECTS.len() + 2);
    }

    #[test]
    fn test_reserved_and_empty_names() {
        let mut registry = EffectRegistry::new();
        assert!(matches!(
            registry.register(noop("validation-border")),
            Err(Error::KeyExists(_))
        ));
        assert!(matches!(
            registry.register(noop("submit-toggle").with_namespace("mine")),
            Err(Error::KeyExists(_))
        ));
        assert!(matches!(registry.register(noop(" ")), Err(Error::Empty(_))));
    }

    #[test]
    fn test_apply_runs_exactly_one_handler() {
        let valid = Rc::new(Cell::new(0));
        let invalid = Rc::new(Cell::new(0));
        let (v, i) = (Rc::clone(&valid), Rc::clone(&invalid));
        let effect = Effect::new(
            "count",
            move |_| v.set(v.get() + 1),
            move |_| i.set(i.get() + 1),
        );

        let element = MemoryElement::input("name");
        apply_all(&element, &BUILTIN_EFFECTS, &[effect.clone()], true);
        apply_all(&element, &BUILTIN_EFFECTS, &[effect], false);
        assert_eq!(valid.get(), 1);
        assert_eq!(invalid.get(), 1);
        assert!(element.has_class(builtins::INVALID_CLASS));
    }

    #[test]
    fn test_init_runs_when_present() {
        let element = MemoryElement::input("name");
        noop("plain").init(&element);
        Effect::new("marked", |_| {}, |_| {})
            .with_init(|el| el.add_class("marked"))
            .init(&element);
        assert_eq!(element.classes(), vec!["marked"]);
    }

    #[test]
    fn test_own_addons_shadow_shared_effects() {
        shared::use_shared_effect(noop("glow")).unwrap();
        shared::use_shared_effect(noop("pulse").with_namespace("ui")).unwrap();

        let mut registry = EffectRegistry::new();
        assert!(!registry.contains("glow"));
        assert_eq!(
            registry.listing(Scope::Addon).addon_identities(),
            vec!["glow", "ui.pulse"]
        );

        registry
            .register(Effect::new("glow", |el| el.add_class("own"), |_| {}))
            .unwrap();
        registry.register(noop("x")).unwrap();
        assert_eq!(
            registry.listing(Scope::Addon).addon_identities(),
            vec!["glow", "x", "ui.pulse"]
        );

        let element = MemoryElement::input("name");
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 3);
        apply_all(&element, &[], &snapshot, true);
        assert!(element.has_class("own"));

        assert!(EffectRegistry::without_builtins().inherited().is_empty());
        assert!(EffectRegistry::detached().inherited().is_empty());
    }

    #[test]
    fn test_listing() {
        let mut registry = EffectRegistry::new();
        registry.register(noop("x")).unwrap();
        assert_eq!(registry.listing(Scope::Default).defaults().len(), 3);
        assert_eq!(registry.listing(Scope::Addon).addon_identities(), vec!["x"]);
    }
}
