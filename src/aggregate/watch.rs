//! Watch mode: incremental validation with form-level completion
//!
//! Every input event validates one field and records its outcome. The form
//! becomes complete once every field that carried a rule when watching began
//! has reported at least once; from then on the form result is recomputed on
//! each event.

use crate::dom::{Element, FormElement};
use indexmap::{IndexMap, IndexSet};
use std::fmt;
use std::rc::Rc;

/// Event passed to a watch callback
#[derive(Clone)]
pub enum WatchEvent {
    /// One field was validated
    Field {
        /// Element whose value changed
        element: Rc<dyn Element>,
        /// Outcome for that field
        valid: bool,
    },
    /// The whole form has a result
    Form {
        /// Backing form, for form-backed aggregates
        form: Option<Rc<dyn FormElement>>,
        /// Outcome for every field together
        valid: bool,
    },
}

impl WatchEvent {
    /// Outcome carried by the event
    pub fn is_valid(&self) -> bool {
        match self {
            WatchEvent::Field { valid, .. } | WatchEvent::Form { valid, .. } => *valid,
        }
    }

    /// Whether this is the form-level event
    pub fn is_form(&self) -> bool {
        matches!(self, WatchEvent::Form { .. })
    }
}

impl fmt::Debug for WatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchEvent::Field { element, valid } => f
                .debug_struct("Field")
                .field("id", &element.id())
                .field("valid", valid)
                .finish(),
            WatchEvent::Form { form, valid } => f
                .debug_struct("Form")
                .field("id", &form.as_ref().and_then(|form| form.id()))
                .field("valid", valid)
                .finish(),
        }
    }
}

/// Callback receiving watch events
pub type WatchCallback = Rc<dyn Fn(&WatchEvent)>;

/// Per-field outcomes recorded while watching
#[derive(Debug, Clone, Default)]
pub struct WatchProgress {
    expected: IndexSet<String>,
    validated: IndexMap<String, bool>,
}

impl WatchProgress {
    /// Track completion over the given field ids
    pub fn new(expected: impl IntoIterator<Item = String>) -> Self {
        Self {
            expected: expected.into_iter().collect(),
            validated: IndexMap::new(),
        }
    }

    /// Record the latest outcome for a field
    pub fn record(&mut self, id: &str, valid: bool) {
        self.validated.insert(id.to_string(), valid);
    }

    /// Whether every expected field has reported
    pub fn is_complete(&self) -> bool {
        self.expected
            .iter()
            .all(|id| self.validated.contains_key(id))
    }

    /// Form result: complete and every recorded outcome passed
    pub fn result(&self) -> bool {
        self.is_complete() && self.validated.values().all(|valid| *valid)
    }

    /// Latest outcome for a field
    pub fn outcome(&self, id: &str) -> Option<bool> {
        self.validated.get(id).copied()
    }

    /// Number of fields that reported
    pub fn len(&self) -> usize {
        self.validated.len()
    }

    /// Whether no field reported yet
    pub fn is_empty(&self) -> bool {
        self.validated.is_empty()
    }

    /// Forget every recorded outcome
    pub fn clear(&mut self) {
        self.validated.clear();
    }
}
