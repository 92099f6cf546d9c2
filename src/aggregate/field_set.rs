//! Aggregates assembled from arbitrary elements

use super::{Aggregate, FieldCollection, FieldInput, Form};
use crate::dom::FormElement;
use crate::error::Result;
use std::fmt;
use std::rc::Rc;

/// Fields collected by hand, possibly across several forms
#[derive(Default)]
pub struct FieldSet {
    aggregate: Aggregate,
    forms: Vec<Rc<dyn FormElement>>,
}

impl FieldSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set populated with the given elements
    pub fn with_fields(inputs: Vec<FieldInput>) -> Result<Self> {
        let mut set = Self::new();
        set.add_fields(inputs)?;
        Ok(set)
    }

    /// Discover a form and remember it; its fields stay in the returned
    /// [`Form`]
    pub fn add_form(&mut self, form: Rc<dyn FormElement>) -> Result<Form> {
        let discovered = Form::new(Rc::clone(&form))?;
        self.forms.push(form);
        Ok(discovered)
    }

    /// Forms recorded by [`FieldSet::add_form`]
    pub fn forms(&self) -> &[Rc<dyn FormElement>] {
        &self.forms
    }
}

impl FieldCollection for FieldSet {
    fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    fn aggregate_mut(&mut self) -> &mut Aggregate {
        &mut self.aggregate
    }
}

impl fmt::Debug for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSet")
            .field("fields", &self.aggregate.fields)
            .field("forms", &self.forms.len())
            .finish()
    }
}
