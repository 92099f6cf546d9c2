//! Fields
//!
//! A [`Field`] wraps one element together with its merged rule, its
//! validator chain and its effects. `Field` is a cheap handle: clones share
//! the same rule and registries, which is what lets an input listener
//! re-validate the field it was attached for.

use crate::dom::{Element, ElementId};
use crate::effects::{apply_all, is_submit_button, BuiltinEffect, Effect, EffectRegistry};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::registry::{Listing, Scope};
use crate::rules::{Rule, RuleKey, RuleValue};
use crate::validators::{run_chain, AddonValidator, BuiltinValidator, Extras, ValidatorRegistry};
use serde::{Serialize, Serializer};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Class marking every element claimed by the library
pub const APP_CLASS: &str = "smartform";

/// Class marking every element wrapped by a field
pub const FIELD_CLASS: &str = "smartform-field";

/// Callback receiving the element and the outcome of each validation
pub type FieldCallback = Rc<dyn Fn(&dyn Element, bool)>;

/// What a field is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// A validated input
    Input,
    /// A submit button: excluded from validation, target of effects
    SubmitButton,
}

struct FieldState {
    rule: Option<Rule>,
    limits: Limits,
    validators: ValidatorRegistry,
    effects: EffectRegistry,
}

/// Serializable view of a field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSnapshot {
    /// Normalized id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Role
    pub role: Role,
    /// Current rule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<Rule>,
}

/// One validated element
#[derive(Clone)]
pub struct Field {
    element: Rc<dyn Element>,
    id: Option<String>,
    role: Role,
    state: Rc<RefCell<FieldState>>,
}

/// Resolve the current value of an element.
///
/// A custom accessor wins; then the selected option of a `<select>`, the
/// text of a content-editable element, and finally the native value.
pub fn read_value(element: &dyn Element) -> Option<String> {
    if let Some(value) = element.get_value() {
        return Some(value);
    }
    if element.tag_name().eq_ignore_ascii_case("select") {
        let options = element.options();
        return element
            .selected_index()
            .and_then(|index| options.get(index).cloned());
    }
    if element.is_content_editable() {
        return element.text_content();
    }
    element.value()
}

fn element_identity(element: &dyn Element) -> Result<(Option<String>, Role)> {
    if is_submit_button(element) {
        let id = element
            .id()
            .filter(|id| !id.is_blank())
            .map(|id| id.normalized());
        return Ok((id, Role::SubmitButton));
    }

    match element.id() {
        None => Err(Error::Type(format!(
            "<{}> must have an id or be a submit button",
            element.tag_name().to_lowercase()
        ))),
        Some(id) if id.is_blank() => Err(Error::empty("id")),
        Some(id) => Ok((Some(id.normalized()), Role::Input)),
    }
}

impl Field {
    /// Wrap an element, binding the built-in validators and effects.
    ///
    /// The element needs a non-blank id unless it is a submit button.
    pub fn new(element: Rc<dyn Element>, rule: Option<Rule>) -> Result<Self> {
        Self::build(element, rule, true)
    }

    /// Wrap an element without any built-in validator or effect
    pub fn bare(element: Rc<dyn Element>) -> Result<Self> {
        Self::build(element, None, false)
    }

    fn build(element: Rc<dyn Element>, rule: Option<Rule>, builtins: bool) -> Result<Self> {
        let (id, role) = element_identity(element.as_ref())?;

        let (validators, effects) = if builtins {
            (ValidatorRegistry::new(), EffectRegistry::new())
        } else {
            (
                ValidatorRegistry::without_builtins(),
                EffectRegistry::without_builtins(),
            )
        };
        for effect in effects.builtins() {
            effect.init(element.as_ref());
        }
        for effect in effects.inherited() {
            effect.init(element.as_ref());
        }

        let field = Self {
            element,
            id,
            role,
            state: Rc::new(RefCell::new(FieldState {
                rule: None,
                limits: Limits::default(),
                validators,
                effects,
            })),
        };

        if let Some(rule) = rule {
            let owner = field.element.id();
            field.add_rule(Rule {
                field: owner,
                ..rule
            });
        }

        field.element.add_class(APP_CLASS);
        field.element.add_class(FIELD_CLASS);

        tracing::debug!(field = ?field.id, role = ?field.role, "field created");
        Ok(field)
    }

    /// Normalized id
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Role decided at construction
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether this field is a submit button
    pub fn is_submit_button(&self) -> bool {
        self.role == Role::SubmitButton
    }

    /// The wrapped element
    pub fn element(&self) -> &Rc<dyn Element> {
        &self.element
    }

    /// Whether this field wraps the given element
    pub fn wraps(&self, element: &Rc<dyn Element>) -> bool {
        Rc::ptr_eq(&self.element, element)
    }

    /// Whether two handles share the same field
    pub fn same_field(&self, other: &Field) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    /// Merge a rule into the current one (shallow extension)
    pub fn add_rule(&self, rule: Rule) -> &Self {
        let mut state = self.state.borrow_mut();
        match state.rule.as_mut() {
            Some(current) => current.extend(&rule),
            None => state.rule = Some(rule),
        }
        self
    }

    /// Replace the current rule wholesale
    pub fn replace_rule(&self, rule: Rule) -> &Self {
        self.state.borrow_mut().rule = Some(rule);
        self
    }

    /// Remove one key from the rule, or the whole rule when no key is given
    pub fn remove_rule(&self, key: Option<RuleKey>) -> &Self {
        let mut state = self.state.borrow_mut();
        match key {
            Some(key) => {
                if let Some(rule) = state.rule.as_mut() {
                    rule.remove(key);
                }
            }
            None => state.rule = None,
        }
        self
    }

    /// Current rule
    pub fn get_rule(&self) -> Option<Rule> {
        self.state.borrow().rule.clone()
    }

    /// Value under one rule key
    pub fn get_rule_value(&self, key: RuleKey) -> Option<RuleValue> {
        self.state.borrow().rule.as_ref().and_then(|rule| rule.get(key))
    }

    /// Whether a rule is attached
    pub fn has_rule(&self) -> bool {
        self.state.borrow().rule.is_some()
    }

    /// Structural limits applied by the email validator
    pub fn set_limits(&self, limits: Limits) -> &Self {
        self.state.borrow_mut().limits = limits;
        self
    }

    /// Current structural limits
    pub fn limits(&self) -> Limits {
        self.state.borrow().limits
    }

    /// Register an addon effect and run its `init` against the element.
    ///
    /// An effect with the identity of a shared effect shadows it on this
    /// field.
    pub fn use_effect(&self, effect: Effect) -> Result<&Self> {
        self.state.borrow_mut().effects.register(effect.clone())?;
        effect.init(self.element.as_ref());
        Ok(self)
    }

    /// Register an addon validator, appended after the built-ins
    pub fn add_validator(&self, validator: AddonValidator) -> Result<&Self> {
        self.state.borrow_mut().validators.add(validator)?;
        Ok(self)
    }

    /// Whether an effect identity is registered
    pub fn has_effect(&self, identity: &str) -> bool {
        self.state.borrow().effects.contains(identity)
    }

    /// Whether a validator identity is registered
    pub fn has_validator(&self, identity: &str) -> bool {
        self.state.borrow().validators.contains(identity)
    }

    /// Registered effects
    pub fn get_effects(&self, scope: Scope) -> Listing<BuiltinEffect, Effect> {
        self.state.borrow().effects.listing(scope)
    }

    /// Registered validators
    pub fn get_validators(&self, scope: Scope) -> Listing<BuiltinValidator, AddonValidator> {
        self.state.borrow().validators.listing(scope)
    }

    /// Current value of the element
    pub fn value(&self) -> Option<String> {
        read_value(self.element.as_ref())
    }

    /// Run the validator chain and apply every effect with the outcome
    pub fn validate(&self) -> Result<bool> {
        let (chain, builtin_effects, effects, rule, limits) = {
            let state = self.state.borrow();
            if state.validators.is_empty() {
                return Err(Error::State(format!(
                    "field '{}' has no validators",
                    self.label()
                )));
            }
            if state.effects.is_empty() {
                return Err(Error::State(format!(
                    "field '{}' has no effects",
                    self.label()
                )));
            }
            let rule = state.rule.clone().unwrap_or_default();
            (
                state.validators.chain(&rule),
                state.effects.builtins(),
                state.effects.snapshot(),
                rule,
                state.limits,
            )
        };

        let extras = Extras {
            checked: rule
                .is_checkbox()
                .then(|| self.element.checked().unwrap_or(false)),
            limits,
        };
        let value = self.value();
        let valid = run_chain(&chain, value.as_deref(), &rule, &extras);

        apply_all(self.element.as_ref(), builtin_effects, &effects, valid);
        tracing::debug!(field = %self.label(), valid, "field validated");
        Ok(valid)
    }

    /// Event that signals a value change: `click` for checkboxes, `input`
    /// otherwise
    pub fn watch_event(&self) -> &'static str {
        match self.element.input_type().as_deref() {
            Some("checkbox") => "click",
            _ => "input",
        }
    }

    /// Re-validate on every change, passing `(element, result)` to the
    /// callback
    pub fn watch(&self, callback: Option<FieldCallback>) {
        self.listen(move |field, valid| {
            if let Some(callback) = &callback {
                callback(field.element.as_ref(), valid);
            }
        });
    }

    /// Attach a change listener that validates and hands the result on.
    ///
    /// The listener lives as long as the element. It keeps the field state
    /// alive, so dropping every `Field` handle does not stop it; the element
    /// itself is held weakly since it owns the listener.
    pub(crate) fn listen(&self, mut handler: impl FnMut(&Field, bool) + 'static) {
        let element: Weak<dyn Element> = Rc::downgrade(&self.element);
        let state = Rc::clone(&self.state);
        let id = self.id.clone();
        let role = self.role;

        self.element.add_event_listener(
            self.watch_event(),
            Box::new(move || {
                let Some(element) = element.upgrade() else {
                    return;
                };
                let field = Field {
                    element,
                    id: id.clone(),
                    role,
                    state: Rc::clone(&state),
                };
                match field.validate() {
                    Ok(valid) => handler(&field, valid),
                    Err(e) => tracing::error!(field = %field.label(), error = %e, "validation failed"),
                }
            }),
        );
    }

    /// Clear the presentation left by built-in effects
    pub fn reset(&self) {
        let builtins = self.state.borrow().effects.builtins();
        for effect in builtins {
            effect.clear(self.element.as_ref());
        }
    }

    /// Serializable view
    pub fn snapshot(&self) -> FieldSnapshot {
        FieldSnapshot {
            id: self.id.clone(),
            role: self.role,
            rule: self.get_rule(),
        }
    }

    fn label(&self) -> String {
        match (&self.id, self.role) {
            (Some(id), _) => id.clone(),
            (None, Role::SubmitButton) => "<submit>".to_string(),
            (None, Role::Input) => "<anonymous>".to_string(),
        }
    }
}

/// Whether an element id refers to a field
pub(crate) fn id_matches(field: &Field, id: &ElementId) -> bool {
    field.id() == Some(id.normalized().as_str())
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Field")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("rule", &state.rule)
            .field("validators", &state.validators.len())
            .field("effects", &state.effects.len())
            .finish()
    }
}
