//! Aggregates backed by a form element

use super::{Aggregate, FieldCollection};
use crate::dom::{Document, Element, FormElement};
use crate::effects::is_submit_button;
use crate::error::{Error, Result};
use crate::rules::Rule;
use std::fmt;
use std::rc::Rc;

/// Fields discovered in a form
pub struct Form {
    form: Rc<dyn FormElement>,
    aggregate: Aggregate,
}

fn discoverable(element: &dyn Element) -> bool {
    is_submit_button(element) || element.id().map(|id| !id.is_blank()).unwrap_or(false)
}

impl Form {
    /// Register every element of the form that has an id or is a submit
    /// button
    pub fn new(form: Rc<dyn FormElement>) -> Result<Self> {
        let mut this = Self {
            form: Rc::clone(&form),
            aggregate: Aggregate::new(),
        };
        for element in form.elements() {
            if discoverable(element.as_ref()) {
                this.add_field(element, None)?;
            } else {
                tracing::trace!(tag = %element.tag_name(), "skipped element without id");
            }
        }
        tracing::debug!(form = ?form.id(), fields = this.aggregate.fields.len(), "form discovered");
        Ok(this)
    }

    /// Look the form up by id
    pub fn from_id(document: &dyn Document, id: &str) -> Result<Self> {
        let form = document
            .form_by_id(id.trim())
            .ok_or_else(|| Error::Key(format!("form '{}' not found", id.trim())))?;
        Self::new(form)
    }

    /// Discover the form's fields, then apply rules to them.
    ///
    /// Rules naming a field that was not discovered are skipped.
    pub fn with_rules(form: Rc<dyn FormElement>, rules: Vec<Rule>) -> Result<Self> {
        let mut this = Self::new(form)?;
        for rule in rules {
            let Some(id) = rule.field.clone() else {
                return Err(Error::Type("rule must name the field it applies to".to_string()));
            };
            if this.get_field(id.clone()).is_some() {
                this.add_rule(rule)?;
            } else {
                tracing::debug!(field = %id, "skipped rule for unknown field");
            }
        }
        Ok(this)
    }

    /// The backing form element
    pub fn form(&self) -> &Rc<dyn FormElement> {
        &self.form
    }
}

impl FieldCollection for Form {
    fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    fn aggregate_mut(&mut self) -> &mut Aggregate {
        &mut self.aggregate
    }

    fn form_element(&self) -> Option<Rc<dyn FormElement>> {
        Some(Rc::clone(&self.form))
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("id", &self.form.id())
            .field("fields", &self.aggregate.fields)
            .finish()
    }
}
