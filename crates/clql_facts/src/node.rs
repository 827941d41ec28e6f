//! The nested fact shape handed over by lexicons.

use std::collections::BTreeMap;

use clql_foundation::Value;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One node of a lexicon-produced fact tree.
///
/// `kind` is a namespaced type name such as `go.func_decl`. Attribute order is
/// irrelevant; child order is traversal-significant.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FactNode {
    /// Namespaced kind name.
    pub kind: String,
    /// Scalar attributes.
    #[cfg_attr(feature = "serde", serde(default))]
    pub attributes: BTreeMap<String, Value>,
    /// Ordered children.
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<FactNode>,
}

impl FactNode {
    /// Creates a fact with no attributes or children.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder method to set an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder method to append a child.
    #[must_use]
    pub fn with_child(mut self, child: FactNode) -> Self {
        self.children.push(child);
        self
    }

    /// Builder method to append several children in order.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = FactNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Counts this node and all of its descendants without recursing.
    #[must_use]
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}
