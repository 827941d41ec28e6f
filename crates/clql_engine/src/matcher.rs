//! Backtracking pattern matcher.
//!
//! [`Matcher`] enumerates every way a pattern tree can be embedded in a fact
//! tree. The search keeps an explicit goal list and choice-point stack
//! instead of recursing over either tree:
//!
//! - a *search goal* asks for some fact within a scope that satisfies a
//!   pattern node; it becomes a choice point over the candidate facts
//! - a *node goal* checks one pattern node against one fact, then queues a
//!   search goal for each child pattern
//!
//! Candidates are tried in pre-order, and child patterns in declaration
//! order, so results come out in a stable order. Binding environments are
//! persistent, so each choice point keeps the exact state it branched from.
//!
//! Excluded children run as an isolated sub-search that reports only whether
//! any match exists. Its captures are always discarded.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use clql_facts::{FactId, FactTree};
use clql_foundation::{PersistentVec, TraversalLimit, Value};
use clql_language::CompareOp;
use tracing::{trace, warn};

use crate::bindings::{Binding, BindingEnvironment};
use crate::config::MatchConfig;
use crate::pattern::{DepthMode, Operand, PatternId, PatternNode, PatternTree, Predicate};

// =============================================================================
// Results
// =============================================================================

/// One pattern node paired with the fact it matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MatchedNode {
    /// The pattern node.
    pub pattern: PatternId,
    /// The fact it matched.
    pub fact: FactId,
}

/// One complete embedding of a pattern tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialMatch {
    /// Bindings captured along the way.
    pub env: BindingEnvironment,
    /// Every positive pattern node and its fact, in pre-order of the pattern.
    pub matched: Vec<MatchedNode>,
}

impl PartialMatch {
    /// Returns the fact matched by `pattern`, if it took part in the match.
    #[must_use]
    pub fn fact_for(&self, pattern: PatternId) -> Option<FactId> {
        self.matched
            .iter()
            .find(|node| node.pattern == pattern)
            .map(|node| node.fact)
    }
}

// =============================================================================
// Predicate evaluation
// =============================================================================

/// Outcome of checking one predicate against one fact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Check {
    Holds,
    /// The named attribute is absent from the fact.
    Missing(String),
    /// The operands have tags the operator cannot compare.
    TypeMismatch,
    Fails,
}

fn operand_value<'v>(
    operand: &'v Operand,
    tree: &'v FactTree,
    fact: FactId,
    env: &'v BindingEnvironment,
) -> Result<&'v Value, Check> {
    match operand {
        Operand::Attribute(name) => tree
            .attribute(fact, name)
            .ok_or_else(|| Check::Missing(name.clone())),
        Operand::Variable(name) => env.value(name).ok_or(Check::Fails),
        Operand::Literal(value) => Ok(value),
    }
}

/// Evaluates `predicate` at `fact`. Never errors: missing attributes and
/// incompatible tags are ordinary failures.
pub(crate) fn check_predicate(
    predicate: &Predicate,
    tree: &FactTree,
    fact: FactId,
    env: &BindingEnvironment,
) -> Check {
    match predicate {
        Predicate::Compare { left, op, right } => {
            let (left, right) = match (
                operand_value(left, tree, fact, env),
                operand_value(right, tree, fact, env),
            ) {
                (Ok(l), Ok(r)) => (l, r),
                (Err(check), _) | (_, Err(check)) => return check,
            };

            let holds = if op.is_ordering() {
                let Some(ordering) = left.compare(right) else {
                    return Check::TypeMismatch;
                };
                match op {
                    CompareOp::Lt => ordering.is_lt(),
                    CompareOp::Gt => ordering.is_gt(),
                    CompareOp::Le => ordering.is_le(),
                    _ => ordering.is_ge(),
                }
            } else {
                if left.value_type() != right.value_type() {
                    return Check::TypeMismatch;
                }
                left.same_value(right) == (*op == CompareOp::Eq)
            };

            if holds { Check::Holds } else { Check::Fails }
        }
        Predicate::Regex { regex, target } => match operand_value(target, tree, fact, env) {
            Err(check) => check,
            Ok(value) => match value.as_str() {
                None => Check::TypeMismatch,
                Some(text) if regex.is_match(text) => Check::Holds,
                Some(_) => Check::Fails,
            },
        },
    }
}

// =============================================================================
// Candidate enumeration
// =============================================================================

/// Where a search goal looks for candidates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scope {
    /// Above the fact root: the root itself is the only level-1 candidate.
    Virtual,
    /// Strictly below the given fact.
    Fact(FactId),
}

/// Lazily walks the pre-order id range of a scope, yielding facts whose
/// level below the scope is within the allowed depth and skipping whole
/// subtrees once that depth is reached.
#[derive(Clone, Debug)]
pub(crate) struct Candidates {
    next: u32,
    end: u32,
    scope_level: u32,
    limit: Option<u32>,
    from_ceiling: bool,
    truncated: bool,
}

impl Candidates {
    pub(crate) fn new(
        tree: &FactTree,
        scope: Scope,
        depth: DepthMode,
        ceiling: Option<u32>,
    ) -> Self {
        let (next, end, scope_level) = match scope {
            Scope::Virtual => (0, u32::try_from(tree.len()).unwrap_or(u32::MAX), 0),
            Scope::Fact(fact) => (fact.0 + 1, tree.subtree_end(fact).0, tree.depth(fact) + 1),
        };
        let (limit, from_ceiling) = match (depth, ceiling) {
            (DepthMode::Any, Some(ceiling)) => (Some(ceiling.max(1)), true),
            (mode, _) => (mode.max_levels(), false),
        };
        Self {
            next,
            end,
            scope_level,
            limit,
            from_ceiling,
            truncated: false,
        }
    }

    pub(crate) fn next(&mut self, tree: &FactTree) -> Option<FactId> {
        if self.next >= self.end {
            return None;
        }
        let id = FactId::new(self.next);
        let level = tree.depth(id) + 1 - self.scope_level;
        match self.limit {
            Some(limit) if level >= limit => {
                let skip_to = tree.subtree_end(id).0;
                if self.from_ceiling && skip_to > self.next + 1 {
                    self.truncated = true;
                }
                self.next = skip_to;
            }
            _ => self.next += 1,
        }
        Some(id)
    }

    /// Returns the ceiling if the last step skipped facts because of it,
    /// clearing the flag.
    pub(crate) fn take_ceiling_hit(&mut self) -> Option<u32> {
        if std::mem::take(&mut self.truncated) {
            self.limit
        } else {
            None
        }
    }
}

// =============================================================================
// Limit tracking
// =============================================================================

/// Visit counter and limit log shared by a solver and its sub-searches.
#[derive(Debug)]
pub(crate) struct Tracker {
    budget: Option<u64>,
    visits: Cell<u64>,
    limits: RefCell<Vec<TraversalLimit>>,
}

impl Tracker {
    pub(crate) fn new(budget: Option<u64>) -> Self {
        Self {
            budget,
            visits: Cell::new(0),
            limits: RefCell::new(Vec::new()),
        }
    }

    /// Counts one node check. Returns false once the budget is spent.
    pub(crate) fn visit(&self) -> bool {
        if let Some(budget) = self.budget {
            if self.visits.get() >= budget {
                self.record(TraversalLimit::VisitBudget { limit: budget });
                return false;
            }
        }
        self.visits.set(self.visits.get() + 1);
        true
    }

    /// Returns true once the budget is spent, recording the hit.
    pub(crate) fn exhausted(&self) -> bool {
        match self.budget {
            Some(budget) if self.visits.get() >= budget => {
                self.record(TraversalLimit::VisitBudget { limit: budget });
                true
            }
            _ => false,
        }
    }

    pub(crate) fn visits(&self) -> u64 {
        self.visits.get()
    }

    /// Records a limit hit once.
    pub(crate) fn record(&self, limit: TraversalLimit) {
        let mut limits = self.limits.borrow_mut();
        if !limits.contains(&limit) {
            warn!(%limit, "traversal limit hit");
            limits.push(limit);
        }
    }

    pub(crate) fn limits(&self) -> Vec<TraversalLimit> {
        self.limits.borrow().clone()
    }
}

// =============================================================================
// Solver
// =============================================================================

#[derive(Clone, Copy, Debug)]
enum Goal<'a> {
    Search {
        pattern: &'a PatternNode,
        scope: Scope,
        negated: bool,
    },
    Node {
        pattern: &'a PatternNode,
        fact: FactId,
    },
}

#[derive(Clone, Debug)]
struct State<'a> {
    goals: PersistentVec<Goal<'a>>,
    env: BindingEnvironment,
    matched: PersistentVec<MatchedNode>,
}

impl<'a> State<'a> {
    fn start(goal: Goal<'a>, env: BindingEnvironment) -> Self {
        Self {
            goals: PersistentVec::new().push_back(goal),
            env,
            matched: PersistentVec::new(),
        }
    }
}

/// A search goal that still has candidates to try.
struct ChoicePoint<'a> {
    pattern: &'a PatternNode,
    candidates: Candidates,
    /// State just after the search goal was taken off the goal list.
    state: State<'a>,
}

struct Solver<'a> {
    tree: &'a FactTree,
    config: &'a MatchConfig,
    tracker: Rc<Tracker>,
    pending: Option<State<'a>>,
    choices: Vec<ChoicePoint<'a>>,
}

impl<'a> Solver<'a> {
    fn new(
        tree: &'a FactTree,
        config: &'a MatchConfig,
        tracker: Rc<Tracker>,
        start: Option<State<'a>>,
    ) -> Self {
        Self {
            tree,
            config,
            tracker,
            pending: start,
            choices: Vec::new(),
        }
    }

    /// Produces the next state with no goals left.
    fn next_solution(&mut self) -> Option<State<'a>> {
        loop {
            let state = match self.pending.take() {
                Some(state) => state,
                None => self.backtrack()?,
            };
            if let Some(solved) = self.run(state) {
                return Some(solved);
            }
        }
    }

    /// Advances `state` until it is solved (`Some`) or blocked on a choice
    /// point or a failed check (`None`).
    fn run(&mut self, mut state: State<'a>) -> Option<State<'a>> {
        loop {
            let Some((rest, goal)) = state.goals.pop_front() else {
                return Some(state);
            };
            state.goals = rest;

            match goal {
                Goal::Search {
                    pattern,
                    scope,
                    negated: true,
                } => {
                    if self.exists(pattern, scope, &state.env) || self.tracker.exhausted() {
                        return None;
                    }
                }
                Goal::Search { pattern, scope, .. } => {
                    trace!(
                        pattern = %pattern.id,
                        kind = %pattern.kind,
                        depth = %pattern.depth,
                        "choice point"
                    );
                    let candidates =
                        Candidates::new(self.tree, scope, pattern.depth, self.config.max_depth);
                    self.choices.push(ChoicePoint {
                        pattern,
                        candidates,
                        state,
                    });
                    return None;
                }
                Goal::Node { pattern, fact } => {
                    state = self.enter(pattern, fact, state)?;
                }
            }
        }
    }

    /// Resumes the most recent choice point with its next candidate.
    fn backtrack(&mut self) -> Option<State<'a>> {
        let tree = self.tree;
        loop {
            if self.tracker.exhausted() {
                self.choices.clear();
                return None;
            }
            let choice = self.choices.last_mut()?;
            let next = choice.candidates.next(tree);
            if let Some(limit) = choice.candidates.take_ceiling_hit() {
                self.tracker.record(TraversalLimit::DepthCeiling {
                    limit,
                    pattern: choice.pattern.kind.clone(),
                });
            }

            match next {
                Some(fact) => {
                    let goal = Goal::Node {
                        pattern: choice.pattern,
                        fact,
                    };
                    return Some(State {
                        goals: choice.state.goals.push_front(goal),
                        ..choice.state.clone()
                    });
                }
                None => {
                    self.choices.pop();
                }
            }
        }
    }

    /// Checks one pattern node against one fact and queues its children.
    fn enter(&self, pattern: &'a PatternNode, fact: FactId, state: State<'a>) -> Option<State<'a>> {
        if !self.tracker.visit() || self.tree.kind(fact) != pattern.kind {
            return None;
        }

        let mut env = state.env;
        for declaration in &pattern.declarations {
            let value = self.tree.attribute(fact, &declaration.attribute)?;
            let binding = Binding::new(value.clone(), fact, declaration.attribute.clone());
            env = env.unify(&declaration.variable, binding)?;
        }

        let holds = pattern
            .predicates
            .iter()
            .all(|predicate| check_predicate(predicate, self.tree, fact, &env) == Check::Holds);
        if !holds {
            return None;
        }

        let children = pattern.children.iter().map(|child| Goal::Search {
            pattern: child,
            scope: Scope::Fact(fact),
            negated: child.excluded,
        });

        Some(State {
            goals: state.goals.prepend(children),
            env,
            matched: state.matched.push_back(MatchedNode {
                pattern: pattern.id,
                fact,
            }),
        })
    }

    /// Isolated existence check for an excluded pattern. Shares the visit
    /// budget; never leaks bindings.
    fn exists(&self, pattern: &'a PatternNode, scope: Scope, env: &BindingEnvironment) -> bool {
        let goal = Goal::Search {
            pattern,
            scope,
            negated: false,
        };
        let start = State::start(goal, env.clone());
        Solver::new(self.tree, self.config, Rc::clone(&self.tracker), Some(start))
            .next_solution()
            .is_some()
    }
}

// =============================================================================
// Matcher
// =============================================================================

/// Lazy iterator over every match of a pattern in a fact tree.
///
/// # Example
///
/// ```
/// use clql_engine::{MatchConfig, Matcher, QueryCompiler};
/// use clql_facts::{FactNode, FactTree};
/// use clql_language::Namespaces;
///
/// let tree = FactTree::from_root(
///     FactNode::new("go.file")
///         .with_child(FactNode::new("go.func_decl").with_attr("name", "writeMsg"))
///         .with_child(FactNode::new("go.func_decl").with_attr("name", "readMsg")),
/// );
/// let query = QueryCompiler::compile(
///     "import codelingo/ast/go\ngo.func_decl(depth = any):\n  name == \"writeMsg\"\n",
///     &Namespaces::open(),
/// )
/// .unwrap();
///
/// let config = MatchConfig::default();
/// let matches: Vec<_> = Matcher::new(&tree, &query.trees[0], &config).collect();
/// assert_eq!(matches.len(), 1);
/// ```
pub struct Matcher<'a> {
    solver: Solver<'a>,
}

impl<'a> Matcher<'a> {
    /// Matches `pattern` anywhere its root's depth mode allows, starting
    /// above the fact root: `direct` matches the root fact only, `any`
    /// tries every fact.
    #[must_use]
    pub fn new(tree: &'a FactTree, pattern: &'a PatternTree, config: &'a MatchConfig) -> Self {
        let goal = Goal::Search {
            pattern: &pattern.root,
            scope: Scope::Virtual,
            negated: false,
        };
        let start = (!tree.is_empty()).then(|| State::start(goal, BindingEnvironment::new()));
        Self::start(tree, config, start)
    }

    /// Matches one pattern node at exactly `fact`, starting from `env`.
    #[must_use]
    pub fn at(
        tree: &'a FactTree,
        pattern: &'a PatternNode,
        config: &'a MatchConfig,
        fact: FactId,
        env: BindingEnvironment,
    ) -> Self {
        let start = tree
            .get(fact)
            .map(|_| State::start(Goal::Node { pattern, fact }, env));
        Self::start(tree, config, start)
    }

    fn start(tree: &'a FactTree, config: &'a MatchConfig, start: Option<State<'a>>) -> Self {
        let tracker = Rc::new(Tracker::new(config.visit_budget));
        Self {
            solver: Solver::new(tree, config, tracker, start),
        }
    }

    /// Limits hit so far.
    #[must_use]
    pub fn limits(&self) -> Vec<TraversalLimit> {
        self.solver.tracker.limits()
    }

    /// Node checks performed so far.
    #[must_use]
    pub fn visits(&self) -> u64 {
        self.solver.tracker.visits()
    }
}

impl Iterator for Matcher<'_> {
    type Item = PartialMatch;

    fn next(&mut self) -> Option<PartialMatch> {
        let state = self.solver.next_solution()?;
        Some(PartialMatch {
            env: state.env,
            matched: state.matched.iter().copied().collect(),
        })
    }
}
