//! Compiled pattern trees.
//!
//! A [`PatternTree`] is the immutable, matcher-ready form of one top-level
//! block of a query. Selectors are resolved to canonical fact kinds, depth
//! modifiers are folded into a [`DepthMode`], and bare names inside
//! predicates are resolved to attributes or variables.

use std::fmt;

use clql_foundation::Value;
use clql_language::{CompareOp, ImportTable};
use regex::Regex;

// =============================================================================
// Identifiers and modes
// =============================================================================

/// Pre-order index of a node within its pattern tree. The root is 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternId(pub u32);

impl PatternId {
    /// The root pattern node.
    pub const ROOT: Self = Self(0);

    /// Returns the id as a vector index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// How far below its scope a pattern node may match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DepthMode {
    /// Immediate children of the scope only.
    #[default]
    Direct,
    /// Any descendant of the scope, at any depth.
    Any,
    /// Descendants at most `n` levels below the scope (`n >= 1`).
    Bounded(u32),
}

impl DepthMode {
    /// Returns the deepest level this mode reaches, or `None` if unbounded.
    #[must_use]
    pub const fn max_levels(self) -> Option<u32> {
        match self {
            Self::Direct => Some(1),
            Self::Any => None,
            Self::Bounded(n) => Some(n),
        }
    }
}

impl fmt::Display for DepthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Any => write!(f, "any"),
            Self::Bounded(n) => write!(f, "{n}"),
        }
    }
}

// =============================================================================
// Predicates
// =============================================================================

/// One side of a predicate.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// An attribute of the fact being tested.
    Attribute(String),
    /// A variable bound earlier in the match.
    Variable(String),
    /// A literal scalar.
    Literal(Value),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute(name) => write!(f, "{name}"),
            Self::Variable(name) => write!(f, "${name}"),
            Self::Literal(value) => write!(f, "{value:?}"),
        }
    }
}

/// An attribute test evaluated against a single fact.
#[derive(Clone, Debug)]
pub enum Predicate {
    /// `left op right`
    Compare {
        /// Left operand.
        left: Operand,
        /// Comparison operator.
        op: CompareOp,
        /// Right operand.
        right: Operand,
    },
    /// `regex(/pattern/, target)`, applied to string operands only.
    Regex {
        /// Compiled pattern.
        regex: Regex,
        /// The operand the pattern is applied to.
        target: Operand,
    },
}

impl Predicate {
    /// Returns the variables this predicate reads.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        let operands: [Option<&Operand>; 2] = match self {
            Self::Compare { left, right, .. } => [Some(left), Some(right)],
            Self::Regex { target, .. } => [Some(target), None],
        };
        operands.into_iter().flatten().filter_map(|operand| match operand {
            Operand::Variable(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare { left, op, right } => write!(f, "{left} {op} {right}"),
            Self::Regex { regex, target } => write!(f, "regex(/{}/, {target})", regex.as_str()),
        }
    }
}

/// `attribute as variable`: captures a value without asserting anything
/// beyond the attribute being present, or unifies if already bound.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Attribute being captured.
    pub attribute: String,
    /// Variable receiving the value.
    pub variable: String,
}

/// An action marker such as `@review comment`. The payload is carried
/// through untouched for the action system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    /// Annotation name.
    pub name: String,
    /// Uninterpreted payload.
    pub payload: String,
}

// =============================================================================
// Pattern nodes and trees
// =============================================================================

/// One node of a compiled pattern.
#[derive(Clone, Debug)]
pub struct PatternNode {
    /// Pre-order id within the tree.
    pub id: PatternId,
    /// Canonical fact kind this node selects.
    pub kind: String,
    /// How far below the parent's fact this node may match.
    pub depth: DepthMode,
    /// Captures, evaluated before predicates.
    pub declarations: Vec<Declaration>,
    /// Attribute tests, in source order.
    pub predicates: Vec<Predicate>,
    /// Child patterns, in source order.
    pub children: Vec<PatternNode>,
    /// True if this node is negated (it came from an `exclude:` block).
    pub excluded: bool,
    /// True if this node's fact is the reported match anchor.
    pub annotated: bool,
    /// Annotations written on this node.
    pub annotations: Vec<Annotation>,
    /// 1-based source line of the selector.
    pub line: u32,
}

impl PatternNode {
    /// Creates a leaf node selecting `kind` with default settings.
    #[must_use]
    pub fn new(id: PatternId, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            depth: DepthMode::Direct,
            declarations: Vec::new(),
            predicates: Vec::new(),
            children: Vec::new(),
            excluded: false,
            annotated: false,
            annotations: Vec::new(),
            line: 0,
        }
    }

    /// Iterates this node and its descendants in pre-order.
    pub fn walk(&self) -> impl Iterator<Item = &PatternNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Returns true if this node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// The compiled form of one top-level block.
#[derive(Clone, Debug)]
pub struct PatternTree {
    /// The root pattern node.
    pub root: PatternNode,
    /// The node whose fact anchors each result.
    pub anchor: PatternId,
    /// Variables captured outside `exclude` blocks, in declaration order.
    pub variables: Vec<String>,
    /// Number of nodes in the tree.
    pub size: usize,
}

impl PatternTree {
    /// Wraps a root node, computing size and defaulting the anchor to the
    /// annotated node (or the root).
    #[must_use]
    pub fn new(root: PatternNode, variables: Vec<String>) -> Self {
        let anchor = root
            .walk()
            .find(|node| node.annotated)
            .map_or(PatternId::ROOT, |node| node.id);
        let size = root.walk().count();
        Self {
            root,
            anchor,
            variables,
            size,
        }
    }

    /// Finds a node by id.
    #[must_use]
    pub fn node(&self, id: PatternId) -> Option<&PatternNode> {
        self.root.walk().find(|node| node.id == id)
    }

    /// Returns the anchor node.
    #[must_use]
    pub fn anchor_node(&self) -> &PatternNode {
        self.node(self.anchor).unwrap_or(&self.root)
    }

    /// Iterates every node in pre-order.
    pub fn nodes(&self) -> impl Iterator<Item = &PatternNode> {
        self.root.walk()
    }
}

/// A compiled query: the import table plus one pattern tree per
/// top-level block, in source order.
#[derive(Clone, Debug)]
pub struct CompiledQuery {
    /// Resolved imports.
    pub imports: ImportTable,
    /// Pattern trees in source order.
    pub trees: Vec<PatternTree>,
}

impl CompiledQuery {
    /// Returns the number of pattern trees.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Returns true if the query has no pattern trees.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Iterates the pattern trees.
    pub fn iter(&self) -> impl Iterator<Item = &PatternTree> {
        self.trees.iter()
    }
}
