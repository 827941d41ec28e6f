//! Match explanation.
//!
//! [`Explainer`] answers "why didn't this pattern match here?" for one
//! pattern tree and one fact. When the pattern does not match, it walks the
//! pattern greedily, taking the first workable candidate for each child,
//! and reports the first check that fails along that path.

use clql_facts::{FactId, FactTree};
use clql_foundation::Value;
use thiserror::Error;

use crate::bindings::{Binding, BindingEnvironment};
use crate::config::MatchConfig;
use crate::matcher::{Candidates, Check, Matcher, Scope, check_predicate};
use crate::pattern::{PatternId, PatternNode, PatternTree};

// =============================================================================
// Explanation Types
// =============================================================================

/// Reason a pattern node failed to match.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Reason {
    /// The fact has a different kind.
    #[error("{pattern} expects {expected}, found {actual}")]
    KindMismatch {
        /// The pattern node.
        pattern: PatternId,
        /// Kind the pattern selects.
        expected: String,
        /// Kind of the fact.
        actual: String,
    },

    /// A predicate or capture read an attribute the fact does not have.
    #[error("{pattern} reads `{attribute}`, which the fact does not have")]
    MissingAttribute {
        /// The pattern node.
        pattern: PatternId,
        /// The missing attribute.
        attribute: String,
    },

    /// A predicate compared values of incompatible types.
    #[error("{pattern}: `{predicate}` compares incompatible types")]
    TypeMismatch {
        /// The pattern node.
        pattern: PatternId,
        /// The predicate, rendered.
        predicate: String,
    },

    /// A predicate evaluated to false.
    #[error("{pattern}: `{predicate}` does not hold")]
    PredicateFailed {
        /// The pattern node.
        pattern: PatternId,
        /// The predicate, rendered.
        predicate: String,
    },

    /// A capture found a variable already bound to a different value.
    #[error("{pattern}: ${variable} is {expected:?}, but the fact has {actual:?}")]
    UnificationFailed {
        /// The pattern node.
        pattern: PatternId,
        /// The variable.
        variable: String,
        /// The value already bound.
        expected: Value,
        /// The value found on this fact.
        actual: Value,
    },

    /// No fact in scope satisfies a child pattern.
    #[error("no fact below {scope} satisfies {child} ({kind})")]
    NoCandidate {
        /// The child pattern.
        child: PatternId,
        /// Kind the child selects.
        kind: String,
        /// The fact whose scope was searched.
        scope: FactId,
        /// Why the first candidate of the right kind failed, if there was one.
        closest: Option<Box<Reason>>,
    },

    /// An excluded child matched, so the parent is rejected.
    #[error("excluded {child} matched {fact}")]
    ExclusionMatched {
        /// The excluded pattern.
        child: PatternId,
        /// The fact it matched.
        fact: FactId,
    },
}

/// Result of explaining a pattern at one fact.
#[derive(Clone, Debug)]
pub struct Explanation {
    /// The fact being explained.
    pub fact: FactId,
    /// Did the pattern match there?
    pub matched: bool,
    /// Why not, if it didn't.
    pub reason: Option<Reason>,
    /// Bindings of the first match, or the partial bindings at the point
    /// of failure.
    pub bindings: BindingEnvironment,
}

impl Explanation {
    /// Creates an explanation for a match.
    #[must_use]
    pub fn matched(fact: FactId, bindings: BindingEnvironment) -> Self {
        Self {
            fact,
            matched: true,
            reason: None,
            bindings,
        }
    }

    /// Creates an explanation for a failed match.
    #[must_use]
    pub fn not_matched(fact: FactId, reason: Reason, bindings: BindingEnvironment) -> Self {
        Self {
            fact,
            matched: false,
            reason: Some(reason),
            bindings,
        }
    }
}

type Failure = (Reason, BindingEnvironment);

// =============================================================================
// Explainer
// =============================================================================

/// Explains pattern matches at a given fact.
#[derive(Debug, Default)]
pub struct Explainer {
    config: MatchConfig,
}

impl Explainer {
    /// Creates an explainer with its own matching limits.
    #[must_use]
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    /// Explains the root of `pattern` at `fact`, using default limits.
    #[must_use]
    pub fn explain(pattern: &PatternTree, tree: &FactTree, fact: FactId) -> Explanation {
        Self::default().explain_node(&pattern.root, tree, fact)
    }

    /// Explains one pattern node at `fact`.
    #[must_use]
    pub fn explain_node(&self, pattern: &PatternNode, tree: &FactTree, fact: FactId) -> Explanation {
        if tree.get(fact).is_none() {
            return Explanation::not_matched(
                fact,
                Reason::NoCandidate {
                    child: pattern.id,
                    kind: pattern.kind.clone(),
                    scope: fact,
                    closest: None,
                },
                BindingEnvironment::new(),
            );
        }

        let env = BindingEnvironment::new();
        if let Some(found) = Matcher::at(tree, pattern, &self.config, fact, env.clone()).next() {
            return Explanation::matched(fact, found.env);
        }

        match self.diagnose(pattern, tree, fact, env) {
            Err((reason, bindings)) => Explanation::not_matched(fact, reason, bindings),
            // The greedy walk succeeded where the full search gave up, which
            // only happens when the visit budget ran out.
            Ok(bindings) => Explanation::matched(fact, bindings),
        }
    }

    fn diagnose(
        &self,
        pattern: &PatternNode,
        tree: &FactTree,
        fact: FactId,
        env: BindingEnvironment,
    ) -> Result<BindingEnvironment, Failure> {
        let mut env = Self::check_node(pattern, tree, fact, env)?;

        for child in &pattern.children {
            let mut candidates =
                Candidates::new(tree, Scope::Fact(fact), child.depth, self.config.max_depth);

            if child.excluded {
                while let Some(candidate) = candidates.next(tree) {
                    if self.matches_at(child, tree, candidate, &env).is_some() {
                        return Err((
                            Reason::ExclusionMatched {
                                child: child.id,
                                fact: candidate,
                            },
                            env,
                        ));
                    }
                }
                continue;
            }

            let mut closest = None;
            let mut chosen = None;
            while let Some(candidate) = candidates.next(tree) {
                if let Some(next_env) = self.matches_at(child, tree, candidate, &env) {
                    chosen = Some(next_env);
                    break;
                }
                if closest.is_none() && tree.kind(candidate) == child.kind {
                    closest = self.diagnose(child, tree, candidate, env.clone()).err();
                }
            }

            match chosen {
                Some(next_env) => env = next_env,
                None => {
                    return Err((
                        Reason::NoCandidate {
                            child: child.id,
                            kind: child.kind.clone(),
                            scope: fact,
                            closest: closest.map(|(reason, _)| Box::new(reason)),
                        },
                        env,
                    ));
                }
            }
        }

        Ok(env)
    }

    fn matches_at(
        &self,
        pattern: &PatternNode,
        tree: &FactTree,
        fact: FactId,
        env: &BindingEnvironment,
    ) -> Option<BindingEnvironment> {
        Matcher::at(tree, pattern, &self.config, fact, env.clone())
            .next()
            .map(|found| found.env)
    }

    /// Kind, captures, then predicates, mirroring the matcher's order.
    fn check_node(
        pattern: &PatternNode,
        tree: &FactTree,
        fact: FactId,
        env: BindingEnvironment,
    ) -> Result<BindingEnvironment, Failure> {
        let actual = tree.kind(fact);
        if actual != pattern.kind {
            return Err((
                Reason::KindMismatch {
                    pattern: pattern.id,
                    expected: pattern.kind.clone(),
                    actual: actual.to_string(),
                },
                env,
            ));
        }

        let mut env = env;
        for declaration in &pattern.declarations {
            let Some(value) = tree.attribute(fact, &declaration.attribute) else {
                return Err((
                    Reason::MissingAttribute {
                        pattern: pattern.id,
                        attribute: declaration.attribute.clone(),
                    },
                    env,
                ));
            };
            let binding = Binding::new(value.clone(), fact, declaration.attribute.clone());
            match env.unify(&declaration.variable, binding) {
                Some(next) => env = next,
                None => {
                    let expected = env
                        .value(&declaration.variable)
                        .cloned()
                        .unwrap_or_else(|| value.clone());
                    return Err((
                        Reason::UnificationFailed {
                            pattern: pattern.id,
                            variable: declaration.variable.clone(),
                            expected,
                            actual: value.clone(),
                        },
                        env,
                    ));
                }
            }
        }

        for predicate in &pattern.predicates {
            let reason = match check_predicate(predicate, tree, fact, &env) {
                Check::Holds => continue,
                Check::Missing(attribute) => Reason::MissingAttribute {
                    pattern: pattern.id,
                    attribute,
                },
                Check::TypeMismatch => Reason::TypeMismatch {
                    pattern: pattern.id,
                    predicate: predicate.to_string(),
                },
                Check::Fails => Reason::PredicateFailed {
                    pattern: pattern.id,
                    predicate: predicate.to_string(),
                },
            };
            return Err((reason, env));
        }

        Ok(env)
    }
}
