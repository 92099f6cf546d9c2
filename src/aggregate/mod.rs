//! Field aggregates
//!
//! [`Form`] and [`FieldSet`] both hold an ordered collection of fields plus
//! aggregate-level validators and effects. Everything they share lives in
//! the [`FieldCollection`] trait; the two types only differ in how fields
//! get in.

mod field_set;
mod form;
pub mod watch;

pub use field_set::FieldSet;
pub use form::Form;
pub use watch::{WatchCallback, WatchEvent, WatchProgress};

use crate::dom::{Element, ElementId, FormElement};
use crate::effects::shared::{shared_effects, use_shared_effect};
use crate::effects::{apply_all, is_submit_button, BuiltinEffect, Effect, EffectRegistry};
use crate::error::{Error, Result};
use crate::field::{id_matches, Field};
use crate::limits::Limits;
use crate::registry::{Listing, Scope};
use crate::rules::{Rule, RuleKey};
use crate::validators::{AddonValidator, BuiltinValidator, ValidatorRegistry};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Selector used to find a submit button that was not registered as a field
pub const SUBMIT_SELECTOR: &str = "[type=submit], [role=submit-button]";

/// An element and its optional rule, for bulk registration
#[derive(Clone)]
pub struct FieldInput {
    /// Element to wrap
    pub element: Rc<dyn Element>,
    /// Rule to merge into the field
    pub rule: Option<Rule>,
}

impl FieldInput {
    /// Input without a rule
    pub fn new(element: Rc<dyn Element>) -> Self {
        Self {
            element,
            rule: None,
        }
    }

    /// Input with a rule
    pub fn with_rule(element: Rc<dyn Element>, rule: Rule) -> Self {
        Self {
            element,
            rule: Some(rule),
        }
    }
}

impl From<Rc<dyn Element>> for FieldInput {
    fn from(element: Rc<dyn Element>) -> Self {
        Self::new(element)
    }
}

/// State shared by every aggregate
pub struct Aggregate {
    fields: Vec<Field>,
    validators: ValidatorRegistry,
    effects: EffectRegistry,
    limits: Limits,
    progress: Option<Rc<RefCell<WatchProgress>>>,
}

impl Default for Aggregate {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregate {
    /// Empty aggregate
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            validators: ValidatorRegistry::new(),
            effects: EffectRegistry::new(),
            limits: Limits::default(),
            progress: None,
        }
    }

    fn find(&self, element: &Rc<dyn Element>) -> Option<&Field> {
        match element.id().filter(|id| !id.is_blank()) {
            Some(id) => self.fields.iter().find(|field| id_matches(field, &id)),
            None => self.fields.iter().find(|field| field.wraps(element)),
        }
    }

    fn adopt(&self, field: &Field) -> Result<()> {
        field.set_limits(self.limits);
        for validator in self.validators.addons() {
            if !field.has_validator(&validator.identity()) {
                field.add_validator(validator.clone())?;
            }
        }
        for effect in self.effects.addons() {
            if !field.has_effect(&effect.identity()) {
                field.use_effect(effect.clone())?;
            }
        }
        Ok(())
    }

    fn inputs(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| !field.is_submit_button())
    }

    fn submit_element(&self, form: Option<&Rc<dyn FormElement>>) -> Option<Rc<dyn Element>> {
        self.fields
            .iter()
            .find(|field| field.is_submit_button())
            .map(|field| Rc::clone(field.element()))
            .or_else(|| form.and_then(|form| form.query_selector(SUBMIT_SELECTOR)))
            .filter(|element| is_submit_button(element.as_ref()))
    }
}

/// Operations common to [`Form`] and [`FieldSet`]
pub trait FieldCollection {
    /// Shared state
    fn aggregate(&self) -> &Aggregate;

    /// Shared state, mutably
    fn aggregate_mut(&mut self) -> &mut Aggregate;

    /// Backing form element, if any
    fn form_element(&self) -> Option<Rc<dyn FormElement>> {
        None
    }

    /// Register an element, or merge the rule into the field already
    /// registered for it
    fn add_field(&mut self, element: Rc<dyn Element>, rule: Option<Rule>) -> Result<Field> {
        let aggregate = self.aggregate_mut();
        if let Some(existing) = aggregate.find(&element) {
            if let Some(rule) = rule {
                existing.add_rule(Rule {
                    field: element.id(),
                    ..rule
                });
            }
            tracing::debug!(field = ?existing.id(), "field already registered");
            return Ok(existing.clone());
        }

        let field = Field::new(element, rule)?;
        aggregate.adopt(&field)?;
        aggregate.fields.push(field.clone());
        Ok(field)
    }

    /// Register several elements; does nothing for an empty list
    fn add_fields(&mut self, inputs: Vec<FieldInput>) -> Result<Vec<Field>> {
        inputs
            .into_iter()
            .map(|input| self.add_field(input.element, input.rule))
            .collect()
    }

    /// Merge a rule into the field it names
    fn add_rule(&mut self, rule: Rule) -> Result<Field> {
        let Some(id) = rule.field.clone() else {
            return Err(Error::Type("rule must name the field it applies to".to_string()));
        };
        let field = self
            .get_field(id.clone())
            .ok_or_else(|| Error::field_not_registered(&id))?;
        field.add_rule(rule);
        Ok(field)
    }

    /// Remove one key, or the whole rule, from a field; a missing field is
    /// ignored
    fn remove_rule(&mut self, id: impl Into<ElementId>, key: Option<RuleKey>) {
        let id = id.into();
        match self.get_field(id.clone()) {
            Some(field) => {
                field.remove_rule(key);
            }
            None => tracing::debug!(field = %id, "no field to remove a rule from"),
        }
    }

    /// Field registered under an id
    fn get_field(&self, id: impl Into<ElementId>) -> Option<Field> {
        let id = id.into();
        self.aggregate()
            .fields
            .iter()
            .find(|field| id_matches(field, &id))
            .cloned()
    }

    /// Every field in registration order
    fn get_fields(&self) -> &[Field] {
        &self.aggregate().fields
    }

    /// JSON array of `{id, role, rule}`
    fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.get_fields())?)
    }

    /// Register an addon validator here and on every field lacking it
    fn add_validator(&mut self, validator: AddonValidator) -> Result<String> {
        let aggregate = self.aggregate_mut();
        let identity = aggregate.validators.add(validator.clone())?;
        for field in &aggregate.fields {
            if !field.has_validator(&identity) {
                field.add_validator(validator.clone())?;
            }
        }
        Ok(identity)
    }

    /// Registered validators
    fn get_validators(&self, scope: Scope) -> Listing<BuiltinValidator, AddonValidator> {
        self.aggregate().validators.listing(scope)
    }

    /// Register an addon effect here and on every field lacking it
    fn use_effect(&mut self, effect: Effect) -> Result<String> {
        let aggregate = self.aggregate_mut();
        let identity = aggregate.effects.register(effect.clone())?;
        for field in &aggregate.fields {
            if !field.has_effect(&identity) {
                field.use_effect(effect.clone())?;
            }
        }
        Ok(identity)
    }

    /// Structural limits for every field, current and future
    fn set_limits(&mut self, limits: Limits) {
        let aggregate = self.aggregate_mut();
        aggregate.limits = limits;
        for field in &aggregate.fields {
            field.set_limits(limits);
        }
    }

    /// Registered effects
    fn get_effects(&self, scope: Scope) -> Listing<BuiltinEffect, Effect> {
        self.aggregate().effects.listing(scope)
    }

    /// Validate every input field and apply the outcome to the submit
    /// button. Every field is visited even after a failure.
    fn validate(&self) -> Result<bool> {
        let aggregate = self.aggregate();
        let mut valid = true;
        for field in aggregate.inputs() {
            valid &= field.validate()?;
        }

        if let Some(submit) = aggregate.submit_element(self.form_element().as_ref()) {
            apply_all(
                submit.as_ref(),
                aggregate.effects.builtins(),
                &aggregate.effects.snapshot(),
                valid,
            );
        }
        tracing::debug!(fields = aggregate.fields.len(), valid, "aggregate validated");
        Ok(valid)
    }

    /// Validate fields as they change and track when the whole form is
    /// valid. Watching twice is a no-op.
    fn watch(&mut self, callback: Option<WatchCallback>) {
        let form = self.form_element();
        let aggregate = self.aggregate_mut();
        if aggregate.progress.is_some() {
            tracing::debug!("aggregate already watched");
            return;
        }

        let expected = aggregate
            .inputs()
            .filter(|field| field.has_rule())
            .filter_map(|field| field.id().map(str::to_string));
        let progress = Rc::new(RefCell::new(WatchProgress::new(expected)));
        aggregate.progress = Some(Rc::clone(&progress));

        let submit = aggregate.submit_element(form.as_ref());
        let builtins = aggregate.effects.builtins();
        let effects = Rc::new(aggregate.effects.snapshot());
        let form: Option<Weak<dyn FormElement>> = form.as_ref().map(Rc::downgrade);

        for field in aggregate.inputs() {
            let progress = Rc::clone(&progress);
            let submit = submit.as_ref().map(Rc::downgrade);
            let effects = Rc::clone(&effects);
            let form = form.clone();
            let callback = callback.clone();

            field.listen(move |field, valid| {
                let (complete, form_valid) = {
                    let mut progress = progress.borrow_mut();
                    if let Some(id) = field.id() {
                        progress.record(id, valid);
                    }
                    (progress.is_complete(), progress.result())
                };

                if let Some(submit) = submit.as_ref().and_then(Weak::upgrade) {
                    apply_all(submit.as_ref(), builtins, &effects, form_valid);
                }

                let Some(callback) = &callback else {
                    return;
                };
                callback(&WatchEvent::Field {
                    element: Rc::clone(field.element()),
                    valid,
                });
                if complete {
                    tracing::debug!(valid = form_valid, "form complete");
                    callback(&WatchEvent::Form {
                        form: form.as_ref().and_then(Weak::upgrade),
                        valid: form_valid,
                    });
                }
            });
        }
        tracing::debug!(fields = aggregate.fields.len(), "watching aggregate");
    }

    /// Whether the watched form has seen every field
    fn is_complete(&self) -> bool {
        self.aggregate()
            .progress
            .as_ref()
            .map(|progress| progress.borrow().is_complete())
            .unwrap_or(false)
    }

    /// Forget watch progress and clear field presentation
    fn reset(&mut self) {
        let aggregate = self.aggregate_mut();
        if let Some(progress) = &aggregate.progress {
            progress.borrow_mut().clear();
        }
        for field in &aggregate.fields {
            field.reset();
        }
    }

    /// Register an effect every field and aggregate on this thread falls
    /// back to
    fn use_shared_effect(effect: Effect) -> Result<String>
    where
        Self: Sized,
    {
        use_shared_effect(effect)
    }

    /// Shared effects
    fn shared_effects(scope: Scope) -> Listing<BuiltinEffect, Effect>
    where
        Self: Sized,
    {
        shared_effects(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryElement;
    use crate::effects::builtins::DISABLED_ATTRIBUTE;
    use crate::rules::FieldType;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn input(id: &str) -> Rc<MemoryElement> {
        MemoryElement::input(id).into_rc()
    }

    #[test]
    fn test_add_field_is_idempotent() {
        let mut set = FieldSet::new();
        let element = input("name");
        let first = set.add_field(element.clone(), None).unwrap();
        let second = set
            .add_field(element.clone(), Some(Rule::new().required(true)))
            .unwrap();

        assert!(first.same_field(&second));
        assert_eq!(set.get_fields().len(), 1);
        assert!(first.get_rule().unwrap().is_required());
    }

    #[test]
    fn test_submit_buttons_are_matched_by_element() {
        let mut set = FieldSet::new();
        let button = MemoryElement::submit().into_rc();
        set.add_field(button.clone(), None).unwrap();
        set.add_field(button.clone(), None).unwrap();
        set.add_field(MemoryElement::submit().into_rc(), None).unwrap();
        assert_eq!(set.get_fields().len(), 2);
        assert!(button.attribute(DISABLED_ATTRIBUTE).is_some());
    }

    #[test]
    fn test_add_rule_needs_registered_field() {
        let mut set = FieldSet::new();
        set.add_field(input("age"), None).unwrap();

        assert!(matches!(
            set.add_rule(Rule::new().required(true)),
            Err(Error::Type(_))
        ));
        assert!(matches!(
            set.add_rule(Rule::for_field("missing")),
            Err(Error::Key(_))
        ));

        let field = set
            .add_rule(Rule::for_field(" age ").of_type(FieldType::Number))
            .unwrap();
        assert_eq!(field.get_rule().unwrap().field_type, Some(FieldType::Number));
    }

    #[test]
    fn test_remove_rule_ignores_missing_fields() {
        let mut set = FieldSet::new();
        set.add_field(input("age"), Some(Rule::new().required(true)))
            .unwrap();
        set.remove_rule("missing", None);
        set.remove_rule("age", Some(RuleKey::Required));
        assert!(!set.get_field("age").unwrap().get_rule().unwrap().is_required());
        set.remove_rule("age", None);
        assert!(!set.get_field("age").unwrap().has_rule());
    }

    #[test]
    fn test_validators_fan_out_and_replay() {
        let mut set = FieldSet::new();
        set.add_field(input("a"), None).unwrap();
        let identity = set
            .add_validator(AddonValidator::new("never", |_, _, _, _| false).with_namespace("t"))
            .unwrap();
        assert_eq!(identity, "t.never");
        set.add_field(input("b"), None).unwrap();

        for field in set.get_fields() {
            assert!(field.has_validator("t.never"));
        }
        assert!(!set.validate().unwrap());
        assert!(set
            .add_validator(AddonValidator::new("never", |_, _, _, _| false).with_namespace("t"))
            .is_err());
    }

    #[test]
    fn test_effects_fan_out_and_run_init() {
        let inits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&inits);
        let mut set = FieldSet::new();
        set.add_field(input("a"), None).unwrap();
        set.use_effect(
            Effect::new("spy", |_| {}, |_| {}).with_init(move |_| counter.set(counter.get() + 1)),
        )
        .unwrap();
        set.add_field(input("b"), None).unwrap();

        assert_eq!(inits.get(), 2);
        assert_eq!(set.get_effects(Scope::Addon).addon_identities(), vec!["spy"]);
    }

    #[test]
    fn test_validate_toggles_submit_button() {
        let mut set = FieldSet::new();
        let name = input("name");
        let button = MemoryElement::submit().into_rc();
        set.add_field(name.clone(), Some(Rule::new().required(true)))
            .unwrap();
        set.add_field(button.clone(), None).unwrap();

        assert!(!set.validate().unwrap());
        assert!(button.attribute(DISABLED_ATTRIBUTE).is_some());

        name.set_value("Ada");
        assert!(set.validate().unwrap());
        assert!(button.attribute(DISABLED_ATTRIBUTE).is_none());
    }

    #[test]
    fn test_to_json_lists_fields() {
        let mut set = FieldSet::new();
        set.add_field(input("age"), Some(Rule::new().of_type(FieldType::Number)))
            .unwrap();
        assert_eq!(
            set.to_json().unwrap(),
            serde_json::json!([
                {"id": "age", "role": "input", "rule": {"type": "number", "field": "age"}}
            ])
        );
    }

    #[test]
    fn test_reset_clears_progress() {
        let mut set = FieldSet::new();
        let a = input("a");
        set.add_field(a.clone(), Some(Rule::new().required(true)))
            .unwrap();
        set.watch(None);
        a.type_value("x");
        assert!(set.is_complete());

        set.reset();
        assert!(!set.is_complete());
        assert!(a.classes().iter().all(|c| !c.starts_with("smartform-valid")));
    }
}
