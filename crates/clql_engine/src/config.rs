//! Matching limits.
//!
//! Fact trees can be arbitrarily deep and wide, and a query with several
//! `depth = any` children can explore a Cartesian number of combinations.
//! [`MatchConfig`] bounds that work. When a limit is hit the affected branch
//! is treated as non-matching and the hit is recorded on the outcome, or
//! returned as an error when `strict_limits` is set.

/// Limits applied while matching one fact tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchConfig {
    /// Deepest level an unbounded `depth = any` search descends below its
    /// scope. Explicit `depth = N` modifiers are not affected.
    pub max_depth: Option<u32>,
    /// Maximum number of pattern/fact node checks per pattern tree and
    /// fact tree. Each top-level block of a query gets its own budget.
    pub visit_budget: Option<u64>,
    /// Maximum number of results per fact tree.
    pub max_results: Option<usize>,
    /// Return `LimitExceeded` instead of a partial outcome when a limit is hit.
    pub strict_limits: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            visit_budget: Some(Self::DEFAULT_VISIT_BUDGET),
            max_results: None,
            strict_limits: false,
        }
    }
}

impl MatchConfig {
    /// Visit budget used by [`MatchConfig::default`].
    pub const DEFAULT_VISIT_BUDGET: u64 = 10_000_000;

    /// No limits at all. Only suitable for trusted queries over small trees.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            max_depth: None,
            visit_budget: None,
            max_results: None,
            strict_limits: false,
        }
    }

    /// Conservative limits for untrusted queries or very large trees.
    #[must_use]
    pub fn guarded() -> Self {
        Self {
            max_depth: Some(256),
            visit_budget: Some(1_000_000),
            max_results: Some(10_000),
            strict_limits: false,
        }
    }

    /// Sets the depth ceiling for unbounded searches.
    #[must_use]
    pub fn with_max_depth(mut self, levels: u32) -> Self {
        self.max_depth = Some(levels);
        self
    }

    /// Sets the node-visit budget.
    #[must_use]
    pub fn with_visit_budget(mut self, visits: u64) -> Self {
        self.visit_budget = Some(visits);
        self
    }

    /// Sets the maximum number of results per fact tree.
    #[must_use]
    pub fn with_max_results(mut self, results: usize) -> Self {
        self.max_results = Some(results);
        self
    }

    /// Makes limit hits fatal.
    #[must_use]
    pub fn with_strict_limits(mut self, strict: bool) -> Self {
        self.strict_limits = strict;
        self
    }
}
