//! # smartform
//!
//! Rule-driven validation for form fields, with pluggable validators,
//! presentation effects, and a watch mode that tracks when a whole form
//! becomes valid.
//!
//! ## Features
//!
//! - Declarative rules: required, type, length window, whitespace, case, regex
//! - Built-in validators for alpha, alnum, ascii text, email and numbers
//! - Built-in effects: border classes, icon classes, submit button toggle
//! - Namespaced addon validators and effects
//! - `Form` and `FieldSet` aggregates with exhaustive validation
//! - Incremental validation on input events
//!
//! Elements are reached through the [`dom`] traits; the in-memory
//! implementations there run headless.
//!
//! ## Example
//!
//! ```rust
//! use smartform::dom::MemoryElement;
//! use smartform::rules::{FieldType, Length, Rule};
//! use smartform::{FieldCollection, FieldSet};
//!
//! let phone = MemoryElement::input("phone").into_rc();
//! let mut set = FieldSet::new();
//! set.add_field(
//!     phone.clone(),
//!     Some(
//!         Rule::new()
//!             .required(true)
//!             .of_type(FieldType::Number)
//!             .length(Length::between(10, 10)),
//!     ),
//! )?;
//!
//! phone.set_value("5551234567");
//! assert!(set.validate()?);
//! # Ok::<(), smartform::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;
pub mod names;

// Element access
pub mod dom;

// Rules and checks
pub mod registry;
pub mod rules;
pub mod validators;

// Presentation
pub mod effects;

// Fields and aggregates
pub mod aggregate;
pub mod field;

// Re-exports for convenience
pub use aggregate::{FieldCollection, FieldInput, FieldSet, Form, WatchCallback, WatchEvent};
pub use effects::shared::{shared_effects, use_shared_effect};
pub use effects::Effect;
pub use error::{Error, Result};
pub use field::{Field, Role};
pub use limits::Limits;
pub use registry::{Listing, Scope};
pub use rules::{FieldType, Length, Rule};
pub use validators::AddonValidator;

/// Version of the smartform library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
