//! Lexicon namespaces and import resolution.
//!
//! A query imports lexicons by path and refers to their fact kinds through
//! a short prefix:
//!
//! ```text
//! import codelingo/ast/go
//! import codelingo/vcs/git as vcs
//!
//! go.func_decl:        # kind `go.func_decl`
//!   vcs.commit         # kind `git.commit`
//! ```
//!
//! The prefix is the explicit alias, or the last path segment. Selectors are
//! rewritten to the lexicon's canonical prefix (its last path segment), which
//! is how lexicons name the kinds they emit.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use clql_foundation::{ParseErrorKind, Result};

use crate::ast::Import;
use crate::parser::parse_error_at;

// =============================================================================
// LexiconPath
// =============================================================================

/// A slash-separated lexicon identity like `codelingo/ast/go`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LexiconPath {
    /// Path segments (e.g., `["codelingo", "ast", "go"]`).
    pub segments: Vec<String>,
}

impl LexiconPath {
    /// Parses a path like `codelingo/ast/go`. Returns `None` if any segment
    /// is empty.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let segments: Vec<String> = s.split('/').map(String::from).collect();
        if segments.iter().any(String::is_empty) {
            return None;
        }
        Some(Self { segments })
    }

    /// Returns the full path as a slash-separated string.
    #[must_use]
    pub fn full_name(&self) -> String {
        self.segments.join("/")
    }

    /// Returns the last segment, which lexicons use as their kind prefix.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }
}

impl fmt::Display for LexiconPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

// =============================================================================
// Namespaces
// =============================================================================

/// The set of lexicons a query may import.
#[derive(Clone, Debug, Default)]
pub struct Namespaces {
    /// Known lexicon paths, or `None` to accept any well-formed path.
    known: Option<BTreeSet<String>>,
}

impl Namespaces {
    /// Accepts every well-formed import path.
    #[must_use]
    pub fn open() -> Self {
        Self { known: None }
    }

    /// Accepts only the listed lexicon paths.
    #[must_use]
    pub fn with_lexicons<I, S>(lexicons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: Some(lexicons.into_iter().map(Into::into).collect()),
        }
    }

    /// Registers one more lexicon. Has no effect on an open registry.
    #[must_use]
    pub fn with_lexicon(mut self, lexicon: impl Into<String>) -> Self {
        if let Some(known) = &mut self.known {
            known.insert(lexicon.into());
        }
        self
    }

    /// Returns true if `path` may be imported.
    #[must_use]
    pub fn is_known(&self, path: &LexiconPath) -> bool {
        self.known
            .as_ref()
            .is_none_or(|known| known.contains(&path.full_name()))
    }
}

// =============================================================================
// ImportTable
// =============================================================================

/// One import after validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedImport {
    /// The lexicon identity.
    pub lexicon: LexiconPath,
    /// The prefix kinds of this lexicon carry in fact trees.
    pub kind_prefix: String,
}

/// Maps selector prefixes to imported lexicons.
#[derive(Clone, Debug, Default)]
pub struct ImportTable {
    aliases: HashMap<String, ResolvedImport>,
}

impl ImportTable {
    /// Creates an empty import table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `imports` against `namespaces` and builds the alias table.
    ///
    /// # Errors
    /// Returns `UnresolvedImport` for a lexicon `namespaces` does not know,
    /// and `Syntax` for a malformed path or an alias bound to two lexicons.
    pub fn build(imports: &[Import], namespaces: &Namespaces, source: &str) -> Result<Self> {
        let mut table = Self::new();

        for import in imports {
            let Some(lexicon) = LexiconPath::parse(&import.path) else {
                return Err(parse_error_at(
                    source,
                    import.span,
                    ParseErrorKind::Syntax,
                    &format!("malformed lexicon path `{}`", import.path),
                ));
            };
            if !namespaces.is_known(&lexicon) {
                return Err(parse_error_at(
                    source,
                    import.span,
                    ParseErrorKind::UnresolvedImport,
                    &format!("unknown lexicon `{lexicon}`"),
                ));
            }

            let alias = import
                .alias
                .clone()
                .unwrap_or_else(|| lexicon.simple_name().to_string());

            if let Some(existing) = table.aliases.get(&alias) {
                if existing.lexicon != lexicon {
                    return Err(parse_error_at(
                        source,
                        import.span,
                        ParseErrorKind::Syntax,
                        &format!("prefix `{alias}` already refers to `{}`", existing.lexicon),
                    ));
                }
            }

            table.add(alias, lexicon);
        }

        Ok(table)
    }

    /// Binds `alias` to `lexicon`.
    pub fn add(&mut self, alias: impl Into<String>, lexicon: LexiconPath) {
        let kind_prefix = lexicon.simple_name().to_string();
        self.aliases.insert(
            alias.into(),
            ResolvedImport {
                lexicon,
                kind_prefix,
            },
        );
    }

    /// Looks up the import bound to `alias`.
    #[must_use]
    pub fn get(&self, alias: &str) -> Option<&ResolvedImport> {
        self.aliases.get(alias)
    }

    /// Rewrites a selector like `vcs.commit` to its canonical kind
    /// `git.commit`. Returns `None` if the prefix was not imported.
    #[must_use]
    pub fn resolve(&self, selector: &str) -> Option<String> {
        let (prefix, kind) = selector.split_once('.')?;
        let import = self.aliases.get(prefix)?;
        Some(format!("{}.{kind}", import.kind_prefix))
    }

    /// Returns the number of bound prefixes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Returns true if nothing was imported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
