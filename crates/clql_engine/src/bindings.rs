//! Persistent binding environments.
//!
//! A [`BindingEnvironment`] maps variable names to captured values. It is
//! never mutated in place: extending it returns a new environment sharing
//! structure with the old one, so alternatives explored during backtracking
//! cannot observe each other's captures.

use std::collections::BTreeMap;

use clql_facts::FactId;
use clql_foundation::{PersistentMap, Value};

/// A captured value and where it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    /// The captured scalar.
    pub value: Value,
    /// The fact the value was read from.
    pub fact: FactId,
    /// The attribute the value was read from.
    pub attribute: String,
}

impl Binding {
    /// Creates a binding.
    #[must_use]
    pub fn new(value: Value, fact: FactId, attribute: impl Into<String>) -> Self {
        Self {
            value,
            fact,
            attribute: attribute.into(),
        }
    }
}

/// An immutable mapping from variable name to [`Binding`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingEnvironment {
    bindings: PersistentMap<String, Binding>,
}

impl BindingEnvironment {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a binding.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// Looks up a bound value.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).map(|binding| &binding.value)
    }

    /// Returns true if `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Returns a new environment with `name` bound to `binding`, replacing
    /// any earlier binding.
    #[must_use]
    pub fn extend(&self, name: impl Into<String>, binding: Binding) -> Self {
        Self {
            bindings: self.bindings.insert(name.into(), binding),
        }
    }

    /// Binds `name` if it is free; if it is already bound, succeeds only
    /// when the values are equal, keeping the original provenance.
    ///
    /// Returns `None` when unification fails.
    #[must_use]
    pub fn unify(&self, name: &str, binding: Binding) -> Option<Self> {
        match self.get(name) {
            Some(existing) if existing.value.same_value(&binding.value) => Some(self.clone()),
            Some(_) => None,
            None => Some(self.extend(name, binding)),
        }
    }

    /// Resolves every variable to its literal value, ordered by name.
    #[must_use]
    pub fn resolve(&self) -> BTreeMap<String, Value> {
        self.bindings
            .iter()
            .map(|(name, binding)| (name.clone(), binding.value.clone()))
            .collect()
    }

    /// Returns where each variable was captured, ordered by name.
    #[must_use]
    pub fn provenance(&self) -> BTreeMap<String, (FactId, String)> {
        self.bindings
            .iter()
            .map(|(name, binding)| (name.clone(), (binding.fact, binding.attribute.clone())))
            .collect()
    }

    /// Returns the number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterates bindings in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Binding)> {
        self.bindings.iter()
    }
}
