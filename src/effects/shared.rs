//! Effects shared by every field and aggregate on this thread
//!
//! Registries look shared effects up when they list or apply their effects,
//! so a registration here reaches instances that already exist. An instance
//! registering the same identity shadows the shared effect.

use crate::effects::{BuiltinEffect, Effect, EffectRegistry};
use crate::error::Result;
use crate::registry::{Listing, Scope};
use std::cell::RefCell;

thread_local! {
    static SHARED_EFFECTS: RefCell<EffectRegistry> = RefCell::new(EffectRegistry::detached());
}

/// Register an effect every field and aggregate falls back to
pub fn use_shared_effect(effect: Effect) -> Result<String> {
    SHARED_EFFECTS.with(|registry| registry.borrow_mut().register(effect))
}

/// Shared effects
pub fn shared_effects(scope: Scope) -> Listing<BuiltinEffect, Effect> {
    SHARED_EFFECTS.with(|registry| registry.borrow().listing(scope))
}

pub(crate) fn snapshot() -> Vec<Effect> {
    SHARED_EFFECTS.with(|registry| registry.borrow().snapshot())
}
