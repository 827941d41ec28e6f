//! Flattened, immutable fact trees.
//!
//! A [`FactTree`] stores every node of a lexicon-produced tree in pre-order.
//! Because a subtree is the contiguous id range `[id, subtree_end(id))`, the
//! matcher can enumerate descendants by walking a range and skipping whole
//! subtrees, without recursion.

// Fact trees are bounded by u32 ids; we target 64-bit systems.
#![allow(clippy::cast_possible_truncation)]

use std::collections::BTreeMap;
use std::sync::Arc;

use clql_foundation::Value;

use crate::id::FactId;
use crate::node::FactNode;

/// One node stored in a [`FactTree`].
#[derive(Clone, Debug)]
pub struct Fact {
    kind: Arc<str>,
    attributes: BTreeMap<String, Value>,
    parent: Option<FactId>,
    depth: u32,
    children: Vec<FactId>,
    subtree_end: u32,
}

impl Fact {
    /// Returns the namespaced kind name.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Returns all attributes.
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Returns the parent, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<FactId> {
        self.parent
    }

    /// Returns the depth below the root (the root is at depth 0).
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Returns the ordered child ids.
    #[must_use]
    pub fn children(&self) -> &[FactId] {
        &self.children
    }
}

/// An immutable fact tree in pre-order layout.
///
/// Trees are read-only after construction and can be shared across threads.
#[derive(Clone, Debug)]
pub struct FactTree {
    facts: Vec<Fact>,
}

impl FactTree {
    /// Flattens a lexicon-produced root into a tree.
    #[must_use]
    pub fn from_root(root: FactNode) -> Self {
        let mut facts: Vec<Fact> = Vec::with_capacity(root.size());
        let mut stack: Vec<(FactNode, Option<FactId>, u32)> = vec![(root, None, 0)];

        while let Some((mut node, parent, depth)) = stack.pop() {
            let id = FactId::new(facts.len() as u32);
            if let Some(parent) = parent {
                facts[parent.index()].children.push(id);
            }

            let children = std::mem::take(&mut node.children);
            facts.push(Fact {
                kind: node.kind.into(),
                attributes: node.attributes,
                parent,
                depth,
                children: Vec::with_capacity(children.len()),
                subtree_end: 0,
            });

            // Reversed so the leftmost child is popped (and numbered) first.
            for child in children.into_iter().rev() {
                stack.push((child, Some(id), depth + 1));
            }
        }

        // A subtree ends where its last child's subtree ends.
        for index in (0..facts.len()).rev() {
            facts[index].subtree_end = match facts[index].children.last() {
                Some(last) => facts[last.index()].subtree_end,
                None => index as u32 + 1,
            };
        }

        Self { facts }
    }

    /// Decodes a MessagePack-encoded [`FactNode`] produced by a lexicon.
    ///
    /// # Errors
    /// Returns a decode error if the payload is not a valid fact node.
    #[cfg(feature = "serde")]
    pub fn from_msgpack(bytes: &[u8]) -> clql_foundation::Result<Self> {
        let root: FactNode = rmp_serde::from_slice(bytes)
            .map_err(|e| clql_foundation::Error::decode(e.to_string()))?;
        Ok(Self::from_root(root))
    }

    /// Returns the root id.
    #[must_use]
    pub const fn root(&self) -> FactId {
        FactId::ROOT
    }

    /// Returns the number of facts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Returns true if the tree has no facts. Trees built from a root never are.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Gets a fact by id.
    #[must_use]
    pub fn get(&self, id: FactId) -> Option<&Fact> {
        self.facts.get(id.index())
    }

    /// Gets a fact by id.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this tree.
    #[must_use]
    pub fn fact(&self, id: FactId) -> &Fact {
        &self.facts[id.index()]
    }

    /// Returns the kind of a fact.
    #[must_use]
    pub fn kind(&self, id: FactId) -> &str {
        self.fact(id).kind()
    }

    /// Returns an attribute of a fact.
    #[must_use]
    pub fn attribute(&self, id: FactId, name: &str) -> Option<&Value> {
        self.fact(id).attribute(name)
    }

    /// Returns the ordered children of a fact.
    #[must_use]
    pub fn children(&self, id: FactId) -> &[FactId] {
        self.fact(id).children()
    }

    /// Returns the parent of a fact.
    #[must_use]
    pub fn parent(&self, id: FactId) -> Option<FactId> {
        self.fact(id).parent()
    }

    /// Returns the depth of a fact (root is 0).
    #[must_use]
    pub fn depth(&self, id: FactId) -> u32 {
        self.fact(id).depth()
    }

    /// Returns the first id after the subtree rooted at `id`.
    #[must_use]
    pub fn subtree_end(&self, id: FactId) -> FactId {
        FactId::new(self.fact(id).subtree_end)
    }

    /// Returns true if `descendant` lies strictly below `ancestor`.
    #[must_use]
    pub fn is_descendant(&self, ancestor: FactId, descendant: FactId) -> bool {
        descendant > ancestor && descendant < self.subtree_end(ancestor)
    }

    /// Returns the chain of ids from the root down to `id`, inclusive.
    #[must_use]
    pub fn path_to(&self, id: FactId) -> Vec<FactId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Iterates all facts in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (FactId, &Fact)> {
        self.facts
            .iter()
            .enumerate()
            .map(|(i, fact)| (FactId::new(i as u32), fact))
    }
}

impl From<FactNode> for FactTree {
    fn from(root: FactNode) -> Self {
        Self::from_root(root)
    }
}
