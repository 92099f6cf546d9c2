//! Built-in tables and addon registries
//!
//! Validators and effects share one layout: a fixed, immutable table of
//! built-ins plus an ordered map of addons keyed by namespaced identity.

use crate::error::{Error, Result};
use indexmap::IndexMap;

/// Which part of a registry to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Built-ins only
    Default,
    /// Addons only
    Addon,
    /// Both
    #[default]
    All,
}

impl Scope {
    /// Parse from string value; anything unknown lists everything
    pub fn parse(s: &str) -> Self {
        match s {
            "default" => Scope::Default,
            "addon" => Scope::Addon,
            _ => Scope::All,
        }
    }
}

/// Registry contents for a [`Scope`]
#[derive(Debug, Clone)]
pub enum Listing<B: 'static, A> {
    /// Built-ins
    Default(&'static [B]),
    /// Addons, `None` when nothing was registered
    Addon(Option<IndexMap<String, A>>),
    /// Built-ins and addons
    All {
        /// Built-ins
        default: &'static [B],
        /// Addons
        addon: IndexMap<String, A>,
    },
}

impl<B: 'static, A> Listing<B, A> {
    /// Addon identities in this listing
    pub fn addon_identities(&self) -> Vec<&str> {
        match self {
            Listing::Default(_) | Listing::Addon(None) => Vec::new(),
            Listing::Addon(Some(addon)) | Listing::All { addon, .. } => {
                addon.keys().map(String::as_str).collect()
            }
        }
    }

    /// Built-ins in this listing
    pub fn defaults(&self) -> &'static [B] {
        match self {
            Listing::Default(default) | Listing::All { default, .. } => *default,
            Listing::Addon(_) => &[],
        }
    }
}

/// Ordered addon map with unique identities
#[derive(Clone)]
pub struct AddonRegistry<T> {
    kind: &'static str,
    entries: IndexMap<String, T>,
}

impl<T> AddonRegistry<T> {
    /// Create an empty registry; `kind` names the entries in error messages
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: IndexMap::new(),
        }
    }

    /// Register an entry under a unique identity
    pub fn register(&mut self, identity: String, entry: T) -> Result<()> {
        if self.entries.contains_key(&identity) {
            return Err(Error::key_exists(self.kind, &identity));
        }
        self.entries.insert(identity, entry);
        Ok(())
    }

    /// Whether an identity is registered
    pub fn contains(&self, identity: &str) -> bool {
        self.entries.contains_key(identity)
    }

    /// Entry by identity
    pub fn get(&self, identity: &str) -> Option<&T> {
        self.entries.get(identity)
    }

    /// Entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &T)> {
        self.entries.iter()
    }

    /// Append entries whose identity is not registered yet
    pub fn extend_missing(&mut self, entries: impl IntoIterator<Item = (String, T)>) {
        for (identity, entry) in entries {
            self.entries.entry(identity).or_insert(entry);
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// List alongside a built-in table
    pub fn listing<B>(&self, defaults: &'static [B], scope: Scope) -> Listing<B, T>
    where
        T: Clone,
    {
        match scope {
            Scope::Default => Listing::Default(defaults),
            Scope::Addon if self.entries.is_empty() => Listing::Addon(None),
            Scope::Addon => Listing::Addon(Some(self.entries.clone())),
            Scope::All => Listing::All {
                default: defaults,
                addon: self.entries.clone(),
            },
        }
    }
}
