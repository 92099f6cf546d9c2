//! Element capabilities required by the validation engine
//!
//! The engine never touches a real DOM directly. Anything that can report an
//! id, a value and a class list, and that can accept listeners, can be
//! validated. The `Memory*` types implement these capabilities in memory and
//! back headless use, the CLI and the tests.

use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Listener attached to an element event
pub type Listener = Box<dyn FnMut()>;

/// Failure raised by an element while mutating its attributes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("DOM error: {0}")]
pub struct DomError(pub String);

/// Element id as exposed by the element: text or number
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementId {
    /// Numeric id
    Number(i64),
    /// Textual id
    Text(String),
}

impl ElementId {
    /// Normalized (string) form used for lookups
    pub fn normalized(&self) -> String {
        match self {
            ElementId::Number(n) => n.to_string(),
            ElementId::Text(s) => s.trim().to_string(),
        }
    }

    /// Whether the id is usable, i.e. non-empty after trimming
    pub fn is_blank(&self) -> bool {
        self.normalized().is_empty()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized())
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        ElementId::Text(s.to_string())
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        ElementId::Text(s)
    }
}

impl From<i64> for ElementId {
    fn from(n: i64) -> Self {
        ElementId::Number(n)
    }
}

/// Capabilities of a validatable element
pub trait Element {
    /// Element id, if any
    fn id(&self) -> Option<ElementId>;

    /// The `type` attribute (e.g. `text`, `checkbox`, `submit`)
    fn input_type(&self) -> Option<String>;

    /// The `role` attribute
    fn role(&self) -> Option<String> {
        None
    }

    /// Upper-case tag name
    fn tag_name(&self) -> String {
        "INPUT".to_string()
    }

    /// Add a class to the class list (no duplicates)
    fn add_class(&self, class: &str);

    /// Remove a class from the class list
    fn remove_class(&self, class: &str);

    /// Whether the class list contains a class
    fn has_class(&self, class: &str) -> bool;

    /// Custom value accessor; takes precedence over every native accessor
    fn get_value(&self) -> Option<String> {
        None
    }

    /// Native `value`
    fn value(&self) -> Option<String>;

    /// Native `checked`
    fn checked(&self) -> Option<bool> {
        None
    }

    /// Option values of a `<select>`
    fn options(&self) -> Vec<String> {
        Vec::new()
    }

    /// Selected option index of a `<select>`
    fn selected_index(&self) -> Option<usize> {
        None
    }

    /// Whether the element is content-editable
    fn is_content_editable(&self) -> bool {
        false
    }

    /// Text content
    fn text_content(&self) -> Option<String> {
        None
    }

    /// Set an attribute
    fn set_attribute(&self, name: &str, value: &str) -> std::result::Result<(), DomError>;

    /// Remove an attribute
    fn remove_attribute(&self, name: &str) -> std::result::Result<(), DomError>;

    /// Attach a listener for an event name
    fn add_event_listener(&self, event: &str, listener: Listener);
}

/// Capabilities of a form element
pub trait FormElement {
    /// Form id, if any
    fn id(&self) -> Option<ElementId>;

    /// The form's elements in document order
    fn elements(&self) -> Vec<Rc<dyn Element>>;

    /// First element matching a selector
    fn query_selector(&self, selector: &str) -> Option<Rc<dyn Element>>;
}

/// Lookup of forms by id
pub trait Document {
    /// Find a form by its id
    fn form_by_id(&self, id: &str) -> Option<Rc<dyn FormElement>>;
}

/// Whether an element matches a simple selector.
///
/// Supported: `#id`, `[attr]`, `[attr="value"]` for `type`, `role` and `id`,
/// and comma-separated alternatives.
pub fn matches_selector(element: &dyn Element, selector: &str) -> bool {
    selector
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .any(|part| matches_simple_selector(element, part))
}

fn matches_simple_selector(element: &dyn Element, selector: &str) -> bool {
    if let Some(id) = selector.strip_prefix('#') {
        return element.id().map(|e| e.normalized() == id).unwrap_or(false);
    }

    let Some(inner) = selector
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
    else {
        return element.tag_name().eq_ignore_ascii_case(selector);
    };

    let (name, expected) = match inner.split_once('=') {
        Some((name, value)) => (
            name.trim(),
            Some(value.trim().trim_matches(|c| c == '"' || c == '\'')),
        ),
        None => (inner.trim(), None),
    };

    let actual = match name {
        "type" => element.input_type(),
        "role" => element.role(),
        "id" => element.id().map(|id| id.normalized()),
        _ => None,
    };

    match (actual, expected) {
        (Some(actual), Some(expected)) => actual == expected,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

// =============================================================================
// In-memory implementations
// =============================================================================

type SharedListener = Rc<RefCell<Listener>>;

/// In-memory element
pub struct MemoryElement {
    id: Option<ElementId>,
    input_type: Option<String>,
    role: Option<String>,
    tag_name: String,
    classes: RefCell<Vec<String>>,
    attributes: RefCell<Vec<(String, String)>>,
    value: RefCell<Option<String>>,
    checked: Cell<Option<bool>>,
    options: Vec<String>,
    selected_index: Cell<Option<usize>>,
    content_editable: bool,
    text: RefCell<Option<String>>,
    custom_value: Option<Box<dyn Fn() -> Option<String>>>,
    read_only: Cell<bool>,
    listeners: RefCell<Vec<(String, SharedListener)>>,
}

impl MemoryElement {
    fn blank(tag_name: &str) -> Self {
        Self {
            id: None,
            input_type: None,
            role: None,
            tag_name: tag_name.to_string(),
            classes: RefCell::new(Vec::new()),
            attributes: RefCell::new(Vec::new()),
            value: RefCell::new(None),
            checked: Cell::new(None),
            options: Vec::new(),
            selected_index: Cell::new(None),
            content_editable: false,
            text: RefCell::new(None),
            custom_value: None,
            read_only: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Create a text input
    pub fn input(id: impl Into<ElementId>) -> Self {
        let mut element = Self::blank("INPUT");
        element.id = Some(id.into());
        element.input_type = Some("text".to_string());
        *element.value.get_mut() = Some(String::new());
        element
    }

    /// Create a checkbox input (unchecked, value `on`)
    pub fn checkbox(id: impl Into<ElementId>) -> Self {
        let mut element = Self::input(id).with_type("checkbox");
        *element.value.get_mut() = Some("on".to_string());
        element.checked.set(Some(false));
        element
    }

    /// Create a submit button without an id
    pub fn submit() -> Self {
        let mut element = Self::blank("BUTTON");
        element.input_type = Some("submit".to_string());
        element
    }

    /// Create an element without any id or type
    pub fn anonymous(tag_name: &str) -> Self {
        Self::blank(tag_name)
    }

    /// Create a `<select>` with the given option values
    pub fn select(id: impl Into<ElementId>, options: &[&str]) -> Self {
        let mut element = Self::blank("SELECT");
        element.id = Some(id.into());
        element.input_type = Some("select-one".to_string());
        element.options = options.iter().map(|s| s.to_string()).collect();
        if !element.options.is_empty() {
            element.selected_index.set(Some(0));
        }
        element
    }

    /// Create a content-editable element
    pub fn editable(id: impl Into<ElementId>) -> Self {
        let mut element = Self::blank("DIV");
        element.id = Some(id.into());
        element.content_editable = true;
        element
    }

    /// Override the `type` attribute
    pub fn with_type(mut self, input_type: &str) -> Self {
        self.input_type = Some(input_type.to_string());
        self
    }

    /// Set the `role` attribute
    pub fn with_role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    /// Set the id
    pub fn with_id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the initial value
    pub fn with_value(self, value: &str) -> Self {
        *self.value.borrow_mut() = Some(value.to_string());
        self
    }

    /// Install a custom value accessor
    pub fn with_value_fn(mut self, f: impl Fn() -> Option<String> + 'static) -> Self {
        self.custom_value = Some(Box::new(f));
        self
    }

    /// Wrap in an `Rc` for sharing with fields
    pub fn into_rc(self) -> Rc<Self> {
        Rc::new(self)
    }

    /// Replace the native value
    pub fn set_value(&self, value: &str) {
        *self.value.borrow_mut() = Some(value.to_string());
    }

    /// Clear the native value
    pub fn clear_value(&self) {
        *self.value.borrow_mut() = None;
    }

    /// Set the checked state
    pub fn set_checked(&self, checked: bool) {
        self.checked.set(Some(checked));
    }

    /// Select an option by index
    pub fn select_index(&self, index: usize) {
        self.selected_index.set(Some(index));
    }

    /// Replace the text content
    pub fn set_text(&self, text: &str) {
        *self.text.borrow_mut() = Some(text.to_string());
    }

    /// Make attribute mutation fail, as a detached or locked node would
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    /// Current attribute value
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    /// Snapshot of the class list
    pub fn classes(&self) -> Vec<String> {
        self.classes.borrow().clone()
    }

    /// Number of listeners attached for an event
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(name, _)| name == event)
            .count()
    }

    /// Fire every listener attached for an event, in attachment order.
    ///
    /// A listener that is already running (a nested dispatch of the same
    /// event) is skipped.
    pub fn dispatch(&self, event: &str) {
        let listeners: Vec<SharedListener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in listeners {
            if let Ok(mut listener) = listener.try_borrow_mut() {
                (*listener)();
            }
        }
    }

    /// Type a value and fire `input`
    pub fn type_value(&self, value: &str) {
        self.set_value(value);
        self.dispatch("input");
    }

    /// Toggle the checked state and fire `click`
    pub fn click(&self) {
        let checked = self.checked.get().unwrap_or(false);
        self.checked.set(Some(!checked));
        self.dispatch("click");
    }
}

impl Element for MemoryElement {
    fn id(&self) -> Option<ElementId> {
        self.id.clone()
    }

    fn input_type(&self) -> Option<String> {
        self.input_type.clone()
    }

    fn role(&self) -> Option<String> {
        self.role.clone()
    }

    fn tag_name(&self) -> String {
        self.tag_name.clone()
    }

    fn add_class(&self, class: &str) {
        let mut classes = self.classes.borrow_mut();
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }

    fn remove_class(&self, class: &str) {
        self.classes.borrow_mut().retain(|c| c != class);
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.borrow().iter().any(|c| c == class)
    }

    fn get_value(&self) -> Option<String> {
        self.custom_value.as_ref().and_then(|f| f())
    }

    fn value(&self) -> Option<String> {
        self.value.borrow().clone()
    }

    fn checked(&self) -> Option<bool> {
        self.checked.get()
    }

    fn options(&self) -> Vec<String> {
        self.options.clone()
    }

    fn selected_index(&self) -> Option<usize> {
        self.selected_index.get()
    }

    fn is_content_editable(&self) -> bool {
        self.content_editable
    }

    fn text_content(&self) -> Option<String> {
        self.text.borrow().clone()
    }

    fn set_attribute(&self, name: &str, value: &str) -> std::result::Result<(), DomError> {
        if self.read_only.get() {
            return Err(DomError(format!("cannot set attribute '{}'", name)));
        }
        let mut attributes = self.attributes.borrow_mut();
        match attributes.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn remove_attribute(&self, name: &str) -> std::result::Result<(), DomError> {
        if self.read_only.get() {
            return Err(DomError(format!("cannot remove attribute '{}'", name)));
        }
        self.attributes.borrow_mut().retain(|(n, _)| n != name);
        Ok(())
    }

    fn add_event_listener(&self, event: &str, listener: Listener) {
        self.listeners
            .borrow_mut()
            .push((event.to_string(), Rc::new(RefCell::new(listener))));
    }
}

/// In-memory form
pub struct MemoryForm {
    id: Option<ElementId>,
    elements: Vec<Rc<dyn Element>>,
}

impl MemoryForm {
    /// Create a form with an id
    pub fn new(id: impl Into<ElementId>) -> Self {
        Self {
            id: Some(id.into()),
            elements: Vec::new(),
        }
    }

    /// Append an element
    pub fn with_element(mut self, element: Rc<dyn Element>) -> Self {
        self.elements.push(element);
        self
    }

    /// Append an element
    pub fn push(&mut self, element: Rc<dyn Element>) {
        self.elements.push(element);
    }

    /// Wrap in an `Rc`
    pub fn into_rc(self) -> Rc<Self> {
        Rc::new(self)
    }
}

impl FormElement for MemoryForm {
    fn id(&self) -> Option<ElementId> {
        self.id.clone()
    }

    fn elements(&self) -> Vec<Rc<dyn Element>> {
        self.elements.clone()
    }

    fn query_selector(&self, selector: &str) -> Option<Rc<dyn Element>> {
        self.elements
            .iter()
            .find(|element| matches_selector(element.as_ref(), selector))
            .cloned()
    }
}

/// In-memory document holding forms
#[derive(Default)]
pub struct MemoryDocument {
    forms: Vec<Rc<dyn FormElement>>,
}

impl MemoryDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a form
    pub fn add_form(&mut self, form: Rc<dyn FormElement>) {
        self.forms.push(form);
    }
}

impl Document for MemoryDocument {
    fn form_by_id(&self, id: &str) -> Option<Rc<dyn FormElement>> {
        self.forms
            .iter()
            .find(|form| form.id().map(|f| f.normalized() == id).unwrap_or(false))
            .cloned()
    }
}
