//! Materializing match results.
//!
//! The matcher yields raw embeddings. [`MatchCollector`] turns them into
//! [`MatchResult`]s: it locates the anchor fact, resolves every captured
//! variable to its literal value, and keeps the matched node set so callers
//! can highlight source spans. Limit hits from every matcher are gathered
//! on the [`QueryOutcome`] instead of being dropped.

use std::collections::BTreeMap;

use clql_facts::{FactId, FactTree};
use clql_foundation::{Error, Result, TraversalLimit, Value};

use crate::config::MatchConfig;
use crate::matcher::{MatchedNode, Matcher, PartialMatch};
use crate::pattern::{Annotation, PatternTree};

// =============================================================================
// Results
// =============================================================================

/// One reported match.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    /// Index of the pattern tree (top-level block) that produced the match.
    pub tree_index: usize,
    /// The fact matched by the anchor pattern.
    pub anchor: FactId,
    /// Kind of the anchor fact.
    pub anchor_kind: String,
    /// Annotations on the anchor pattern, for the action system.
    pub annotations: Vec<Annotation>,
    /// Every captured variable, resolved to its value.
    pub bindings: BTreeMap<String, Value>,
    /// Where each variable was captured: fact and attribute name.
    pub provenance: BTreeMap<String, (FactId, String)>,
    /// Every positive pattern node and the fact it matched.
    pub matched: Vec<MatchedNode>,
}

impl MatchResult {
    /// Builds a result from a raw match of `pattern` against `tree`.
    #[must_use]
    pub fn from_match(
        tree_index: usize,
        pattern: &PatternTree,
        tree: &FactTree,
        found: PartialMatch,
    ) -> Self {
        let anchor = found.fact_for(pattern.anchor).unwrap_or(FactId::ROOT);
        Self {
            tree_index,
            anchor,
            anchor_kind: tree.kind(anchor).to_string(),
            annotations: pattern.anchor_node().annotations.clone(),
            bindings: found.env.resolve(),
            provenance: found.env.provenance(),
            matched: found.matched,
        }
    }

    /// Looks up a resolved variable.
    #[must_use]
    pub fn binding(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Returns the facts touched by this match, in pattern pre-order.
    pub fn facts(&self) -> impl Iterator<Item = FactId> + '_ {
        self.matched.iter().map(|node| node.fact)
    }
}

/// Everything one query produced for one fact tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryOutcome {
    /// Results in discovery order.
    pub results: Vec<MatchResult>,
    /// Limits that cut the search short, in the order first hit.
    pub limits: Vec<TraversalLimit>,
}

impl QueryOutcome {
    /// Returns the number of results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterates results in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &MatchResult> {
        self.results.iter()
    }

    /// Returns true if any limit was hit, meaning the result set may be
    /// incomplete.
    #[must_use]
    pub fn hit_limit(&self) -> bool {
        !self.limits.is_empty()
    }

    /// Returns the anchors of every result.
    #[must_use]
    pub fn anchors(&self) -> Vec<FactId> {
        self.results.iter().map(|result| result.anchor).collect()
    }
}

impl IntoIterator for QueryOutcome {
    type Item = MatchResult;
    type IntoIter = std::vec::IntoIter<MatchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a QueryOutcome {
    type Item = &'a MatchResult;
    type IntoIter = std::slice::Iter<'a, MatchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

// =============================================================================
// Collector
// =============================================================================

/// Accumulates results for one fact tree across every pattern tree of a
/// query, enforcing `max_results`.
#[derive(Debug)]
pub struct MatchCollector<'a> {
    config: &'a MatchConfig,
    results: Vec<MatchResult>,
    limits: Vec<TraversalLimit>,
}

impl<'a> MatchCollector<'a> {
    /// Creates an empty collector.
    #[must_use]
    pub fn new(config: &'a MatchConfig) -> Self {
        Self {
            config,
            results: Vec::new(),
            limits: Vec::new(),
        }
    }

    /// Drains `matcher`, which must be matching `pattern` against `tree`.
    ///
    /// Returns false once `max_results` has been exceeded; callers should
    /// stop feeding further pattern trees.
    pub fn collect(
        &mut self,
        tree_index: usize,
        pattern: &PatternTree,
        tree: &FactTree,
        mut matcher: Matcher<'_>,
    ) -> bool {
        let mut open = true;
        for found in matcher.by_ref() {
            if self.full() {
                self.record(TraversalLimit::MaxResults {
                    limit: self.results.len(),
                });
                open = false;
                break;
            }
            self.results
                .push(MatchResult::from_match(tree_index, pattern, tree, found));
        }
        for limit in matcher.limits() {
            self.record(limit);
        }
        open
    }

    fn full(&self) -> bool {
        self.config
            .max_results
            .is_some_and(|max| self.results.len() >= max)
    }

    fn record(&mut self, limit: TraversalLimit) {
        if !self.limits.contains(&limit) {
            self.limits.push(limit);
        }
    }

    /// Number of results collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Produces the outcome.
    ///
    /// # Errors
    /// Returns `LimitExceeded` for the first limit hit when the
    /// configuration asks for strict limits.
    pub fn finish(self) -> Result<QueryOutcome> {
        if self.config.strict_limits {
            if let Some(first) = self.limits.first() {
                return Err(Error::limit_exceeded(first.clone()));
            }
        }
        Ok(QueryOutcome {
            results: self.results,
            limits: self.limits,
        })
    }
}
