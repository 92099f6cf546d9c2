//! Built-in presentation effects

use crate::dom::Element;
use std::fmt;

/// Class added to a field that passed
pub const VALID_CLASS: &str = "smartform-valid";
/// Class added to a field that failed
pub const INVALID_CLASS: &str = "smartform-invalid";
/// Icon class for a field that passed
pub const VALID_ICON_CLASS: &str = "smartform-icon-valid";
/// Icon class for a field that failed
pub const INVALID_ICON_CLASS: &str = "smartform-icon-invalid";
/// Attribute toggled on submit buttons
pub const DISABLED_ATTRIBUTE: &str = "disabled";

/// Built-in effects, in application order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinEffect {
    /// Valid/invalid border classes on input fields
    ValidationBorder,
    /// Valid/invalid icon classes on input fields
    ValidationIcon,
    /// Enables or disables submit buttons
    SubmitToggle,
}

/// Built-in effects in application order
pub static BUILTIN_EFFECTS: [BuiltinEffect; 3] = [
    BuiltinEffect::ValidationBorder,
    BuiltinEffect::ValidationIcon,
    BuiltinEffect::SubmitToggle,
];

/// Whether an element is a submit button
pub fn is_submit_button(element: &dyn Element) -> bool {
    element.input_type().as_deref() == Some("submit")
        || element.role().as_deref() == Some("submit-button")
}

impl BuiltinEffect {
    /// Registry name
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinEffect::ValidationBorder => "validation-border",
            BuiltinEffect::ValidationIcon => "validation-icon",
            BuiltinEffect::SubmitToggle => "submit-toggle",
        }
    }

    /// Look up a built-in by name
    pub fn from_name(name: &str) -> Option<Self> {
        BUILTIN_EFFECTS.iter().copied().find(|e| e.name() == name)
    }

    /// Run once when the effect is bound to an element
    pub fn init(&self, element: &dyn Element) {
        if *self == BuiltinEffect::SubmitToggle && is_submit_button(element) {
            disable(element);
        }
    }

    /// Apply the outcome of a validation
    pub fn apply(&self, element: &dyn Element, valid: bool) {
        match self {
            BuiltinEffect::ValidationBorder => {
                toggle_classes(element, valid, VALID_CLASS, INVALID_CLASS)
            }
            BuiltinEffect::ValidationIcon => {
                toggle_classes(element, valid, VALID_ICON_CLASS, INVALID_ICON_CLASS)
            }
            BuiltinEffect::SubmitToggle => {
                if !is_submit_button(element) {
                    return;
                }
                if valid {
                    enable(element);
                } else {
                    disable(element);
                }
            }
        }
    }

    /// Remove any presentation left by previous outcomes
    pub fn clear(&self, element: &dyn Element) {
        match self {
            BuiltinEffect::ValidationBorder => {
                element.remove_class(VALID_CLASS);
                element.remove_class(INVALID_CLASS);
            }
            BuiltinEffect::ValidationIcon => {
                element.remove_class(VALID_ICON_CLASS);
                element.remove_class(INVALID_ICON_CLASS);
            }
            BuiltinEffect::SubmitToggle => self.init(element),
        }
    }
}

impl fmt::Display for BuiltinEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn toggle_classes(element: &dyn Element, valid: bool, valid_class: &str, invalid_class: &str) {
    if is_submit_button(element) {
        return;
    }
    if valid {
        element.remove_class(invalid_class);
        element.add_class(valid_class);
    } else {
        element.remove_class(valid_class);
        element.add_class(invalid_class);
    }
}

// A broken submit element must not abort the validation pass.
fn enable(element: &dyn Element) {
    if let Err(e) = element.remove_attribute(DISABLED_ATTRIBUTE) {
        tracing::warn!(error = %e, "could not enable submit button");
    }
}

fn disable(element: &dyn Element) {
    if let Err(e) = element.set_attribute(DISABLED_ATTRIBUTE, DISABLED_ATTRIBUTE) {
        tracing::warn!(error = %e, "could not disable submit button");
    }
}
