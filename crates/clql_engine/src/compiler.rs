//! Query compilation.
//!
//! [`QueryCompiler`] parses CLQL source and lowers each top-level block into
//! a [`PatternTree`], rejecting the query before any matching happens if:
//! - a selector uses a prefix that was not imported (`UnresolvedImport`)
//! - a `depth` modifier is malformed or repeated (`InvalidDepthSpec`)
//! - a `$variable` is read before a capture declares it (`UndeclaredVariable`)
//! - a regex does not compile, or annotations are misplaced (`Syntax`)
//!
//! Variables are scoped to their pattern tree. Within a tree, a capture is
//! visible to its own node's predicates and to every node after it in
//! pre-order. Captures inside `exclude` never escape the excluded subtree.

use clql_foundation::{Error, ParseErrorKind, Result, Value};
use clql_language::{
    ArgValue, Block, BlockArg, BlockItem, ImportTable, Namespaces, OperandExpr, PredicateExpr,
    QueryFile, Span, parse, parse_error_at,
};
use regex::Regex;
use tracing::debug;

use crate::pattern::{
    Annotation, CompiledQuery, Declaration, DepthMode, Operand, PatternId, PatternNode,
    PatternTree, Predicate,
};

// =============================================================================
// Query Compiler
// =============================================================================

/// Compiles CLQL source into a [`CompiledQuery`].
pub struct QueryCompiler;

impl QueryCompiler {
    /// Parses and compiles `source`, resolving imports against `namespaces`.
    ///
    /// # Errors
    /// Returns a `ParseError` describing the first problem found.
    pub fn compile(source: &str, namespaces: &Namespaces) -> Result<CompiledQuery> {
        let file = parse(source)?;
        Self::compile_file(&file, source, namespaces)
    }

    /// Compiles an already parsed file. `source` is used for error context.
    ///
    /// # Errors
    /// Returns a `ParseError` describing the first problem found.
    pub fn compile_file(
        file: &QueryFile,
        source: &str,
        namespaces: &Namespaces,
    ) -> Result<CompiledQuery> {
        let imports = ImportTable::build(&file.imports, namespaces, source)?;

        let trees = file
            .blocks
            .iter()
            .map(|block| TreeCompiler::new(source, &imports).compile(block))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            imports = imports.len(),
            trees = trees.len(),
            variables = trees.iter().map(|t| t.variables.len()).sum::<usize>(),
            "compiled query"
        );

        Ok(CompiledQuery { imports, trees })
    }
}

// =============================================================================
// Tree Compiler
// =============================================================================

/// Lowers one top-level block. Holds the per-tree variable scope.
struct TreeCompiler<'a> {
    source: &'a str,
    imports: &'a ImportTable,
    next_id: u32,
    /// Variables visible at the current point in pre-order.
    declared: Vec<String>,
    /// The annotated node, once seen.
    anchor: Option<PatternId>,
    /// Nesting depth of `exclude` blocks at the current point.
    exclude_depth: u32,
}

impl<'a> TreeCompiler<'a> {
    fn new(source: &'a str, imports: &'a ImportTable) -> Self {
        Self {
            source,
            imports,
            next_id: 0,
            declared: Vec::new(),
            anchor: None,
            exclude_depth: 0,
        }
    }

    fn compile(mut self, block: &Block) -> Result<PatternTree> {
        let root = self.compile_block(block, false)?;
        Ok(PatternTree::new(root, self.declared))
    }

    fn compile_block(&mut self, block: &Block, excluded: bool) -> Result<PatternNode> {
        let id = PatternId(self.next_id);
        self.next_id += 1;

        let kind = self.resolve_selector(block)?;
        let mut node = PatternNode::new(id, kind);
        node.depth = self.fold_depth(&block.args)?;
        node.excluded = excluded;
        node.line = block.selector.span.line;

        if let Some(first) = block.annotations.first() {
            if excluded || self.in_exclude() {
                return Err(self.error(
                    first.span,
                    ParseErrorKind::Syntax,
                    "annotations are not allowed inside 'exclude'",
                ));
            }
            if self.anchor.is_some() {
                return Err(self.error(
                    first.span,
                    ParseErrorKind::Syntax,
                    "only one selector per pattern tree may be annotated",
                ));
            }
            self.anchor = Some(id);
            node.annotated = true;
            node.annotations = block
                .annotations
                .iter()
                .map(|a| Annotation {
                    name: a.name.clone(),
                    payload: a.payload.clone(),
                })
                .collect();
        }

        // Captures first: a node's own predicates may read them.
        for predicate in block.predicates() {
            if let PredicateExpr::Capture { field, var, .. } = predicate {
                node.declarations.push(Declaration {
                    attribute: field.clone(),
                    variable: var.clone(),
                });
                self.declare(var);
            }
        }

        for predicate in block.predicates() {
            self.compile_predicate(predicate, &mut node.predicates)?;
        }

        for item in &block.items {
            match item {
                BlockItem::Predicate(_) => {}
                BlockItem::Child(child) => {
                    let child = self.compile_block(child, false)?;
                    node.children.push(child);
                }
                BlockItem::Exclude { blocks, .. } => {
                    for excluded_block in blocks {
                        let mark = self.declared.len();
                        self.exclude_depth += 1;
                        let child = self.compile_block(excluded_block, true);
                        self.exclude_depth -= 1;
                        self.declared.truncate(mark);
                        node.children.push(child?);
                    }
                }
            }
        }

        Ok(node)
    }

    fn resolve_selector(&self, block: &Block) -> Result<String> {
        let selector = &block.selector;
        let Some((prefix, kind)) = selector.split() else {
            return Err(self.error(
                selector.span,
                ParseErrorKind::Syntax,
                &format!("expected a fact selector like `namespace.kind`, found `{}`", selector.name),
            ));
        };
        if kind.is_empty() {
            return Err(self.error(
                selector.span,
                ParseErrorKind::Syntax,
                &format!("selector `{}` names no kind", selector.name),
            ));
        }
        self.imports.resolve(&selector.name).ok_or_else(|| {
            self.error(
                selector.span,
                ParseErrorKind::UnresolvedImport,
                &format!("namespace `{prefix}` is not imported"),
            )
        })
    }

    fn fold_depth(&self, args: &[BlockArg]) -> Result<DepthMode> {
        let mut depth: Option<DepthMode> = None;

        for arg in args {
            if arg.name != "depth" {
                return Err(self.error(
                    arg.span,
                    ParseErrorKind::Syntax,
                    &format!("unknown selector argument `{}`", arg.name),
                ));
            }
            if depth.is_some() {
                return Err(self.error(
                    arg.span,
                    ParseErrorKind::InvalidDepthSpec,
                    "conflicting depth modifiers on one selector",
                ));
            }

            let mode = match &arg.value {
                ArgValue::Ident(word) if word == "any" => DepthMode::Any,
                ArgValue::Ident(word) if word == "direct" => DepthMode::Direct,
                ArgValue::Literal(Value::Int(n)) if *n >= 1 => {
                    let levels = u32::try_from(*n).map_err(|_| {
                        self.error(
                            arg.span,
                            ParseErrorKind::InvalidDepthSpec,
                            &format!("depth {n} is too large"),
                        )
                    })?;
                    DepthMode::Bounded(levels)
                }
                other => {
                    return Err(self.error(
                        arg.span,
                        ParseErrorKind::InvalidDepthSpec,
                        &format!("depth must be `any` or a positive integer, found `{other}`"),
                    ));
                }
            };
            depth = Some(mode);
        }

        Ok(depth.unwrap_or_default())
    }

    fn compile_predicate(&self, predicate: &PredicateExpr, out: &mut Vec<Predicate>) -> Result<()> {
        match predicate {
            PredicateExpr::Capture { .. } => {}
            PredicateExpr::Compare { operands, ops, .. } => {
                let operands = operands
                    .iter()
                    .map(|operand| self.compile_operand(operand))
                    .collect::<Result<Vec<_>>>()?;
                for (i, op) in ops.iter().enumerate() {
                    out.push(Predicate::Compare {
                        left: operands[i].clone(),
                        op: *op,
                        right: operands[i + 1].clone(),
                    });
                }
            }
            PredicateExpr::Regex {
                pattern,
                pattern_span,
                target,
                ..
            } => {
                let regex = Regex::new(pattern).map_err(|e| {
                    self.error(
                        *pattern_span,
                        ParseErrorKind::Syntax,
                        &format!("invalid regex: {e}"),
                    )
                })?;
                let target = match target {
                    OperandExpr::Ident(name, _) if self.is_declared(name) => {
                        Operand::Variable(name.clone())
                    }
                    other => self.compile_operand(other)?,
                };
                out.push(Predicate::Regex { regex, target });
            }
        }
        Ok(())
    }

    fn compile_operand(&self, operand: &OperandExpr) -> Result<Operand> {
        match operand {
            OperandExpr::Ident(name, _) => Ok(Operand::Attribute(name.clone())),
            OperandExpr::Literal(value, _) => Ok(Operand::Literal(value.clone())),
            OperandExpr::Var(name, span) => {
                if self.is_declared(name) {
                    Ok(Operand::Variable(name.clone()))
                } else {
                    Err(self.error(
                        *span,
                        ParseErrorKind::UndeclaredVariable,
                        &format!("variable `${name}` is used before it is captured"),
                    ))
                }
            }
        }
    }

    fn declare(&mut self, name: &str) {
        if !self.is_declared(name) {
            self.declared.push(name.to_string());
        }
    }

    fn is_declared(&self, name: &str) -> bool {
        self.declared.iter().any(|declared| declared == name)
    }

    fn in_exclude(&self) -> bool {
        self.exclude_depth > 0
    }

    fn error(&self, span: Span, kind: ParseErrorKind, message: &str) -> Error {
        parse_error_at(self.source, span, kind, message)
    }
}
