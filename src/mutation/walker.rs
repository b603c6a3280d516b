//! The depth-first copy-and-rewrite walk over one unit.
//!
//! The walk covers the code subtree of a unit: the root namespace declaration of
//! every compilation part, the module class and the globals class, then types
//! (with their nested types), methods, bodies, statements and expressions.
//! References to types, methods and other units are read but never walked.
//!
//! Nodes are immutable and shared through `Arc`. A node whose children did not
//! change is reused as is, so an untouched unit comes back as the very same
//! `Arc<Unit>`. A node reachable through several paths is visited once per walk;
//! later occurrences reuse the first result.
//!
//! # Failure
//!
//! A failing [`Rewriter`] hook, or a depth limit set through
//! [`TraversalConfig::max_depth`], aborts the walk of the unit. The failure is reported to the [`DiagnosticSink`] at error severity and the
//! original unit is returned with zero mutations.
//!
//! Without a limit, bodies of any depth are walked: the stack is grown on demand
//! before each nested node.
//!
//! [`DiagnosticSink`]: crate::metadata::diagnostics::DiagnosticSink

use std::{collections::HashMap, sync::Arc};

use strum::EnumCount;

use crate::{
    metadata::{
        code::{
            Block, Expression, ExpressionKind, ExpressionRc, MethodBody, MethodCall, Statement,
            StatementKind, StatementRc,
        },
        diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity},
        namespace::{
            MethodDefinition, MethodDefinitionRc, NamespaceDeclaration, NamespaceDeclarationRc,
            NamespaceMember, TypeDefinition, TypeDefinitionRc,
        },
        unit::{CompilationPart, SourceCompilation, UnitRc},
    },
    mutation::{
        config::TraversalConfig,
        rewriter::{NodeKind, Rewrite, RewriteContext, Rewriter},
    },
    Error, Result,
};

/// Count of nodes replaced during a traversal, per node kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mutations {
    by_kind: [usize; NodeKind::COUNT],
}

impl Mutations {
    /// No mutations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one replaced node.
    pub fn record(&mut self, kind: NodeKind) {
        self.by_kind[kind as usize] += 1;
    }

    /// Add the counts of another accumulator.
    pub fn merge(&mut self, other: &Mutations) {
        for (mine, theirs) in self.by_kind.iter_mut().zip(other.by_kind) {
            *mine += theirs;
        }
    }

    /// Number of replaced nodes of one kind.
    #[must_use]
    pub fn of(&self, kind: NodeKind) -> usize {
        self.by_kind[kind as usize]
    }

    /// Total number of replaced nodes.
    #[must_use]
    pub fn total(&self) -> usize {
        self.by_kind.iter().sum()
    }

    /// Returns true if nothing was replaced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// The result of walking one unit.
#[derive(Debug, Clone)]
pub struct TraversalOutcome {
    /// The rewritten unit, or the original one if nothing changed or the walk aborted.
    pub unit: UnitRc,
    /// Nodes replaced during the walk.
    pub mutations: Mutations,
    /// Whether the walk was aborted.
    pub aborted: bool,
}

impl TraversalOutcome {
    fn unchanged(unit: &UnitRc, aborted: bool) -> Self {
        Self {
            unit: Arc::clone(unit),
            mutations: Mutations::new(),
            aborted,
        }
    }

    /// Returns true if the unit was rewritten.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.mutations.is_empty()
    }
}

/// Walk `unit` with `rewriter`.
///
/// Never fails: an aborted walk is reported to `ctx.sink` and yields the original
/// unit with zero mutations.
pub fn rewrite_unit(
    unit: &UnitRc,
    rewriter: &mut dyn Rewriter,
    ctx: &RewriteContext<'_>,
    config: &TraversalConfig,
) -> TraversalOutcome {
    let name = rewriter.name();
    match try_rewrite_unit(unit, rewriter, ctx, config) {
        Ok(outcome) => outcome,
        Err(error) => {
            let category = match error {
                Error::MissingSymbols(_) => DiagnosticCategory::Symbols,
                Error::RecursionLimit(_) => DiagnosticCategory::Traversal,
                _ => DiagnosticCategory::Rewrite,
            };
            ctx.sink.report(
                Diagnostic::new(DiagnosticSeverity::Error, category, error.to_string())
                    .with_unit(unit.location())
                    .with_mutator(name),
            );
            TraversalOutcome::unchanged(unit, true)
        }
    }
}

/// Walk `unit` with `rewriter`, returning the error instead of reporting it.
///
/// # Errors
/// Returns the first error raised by `rewriter` or [`Error::RecursionLimit`] if the
/// configured depth limit is exceeded.
pub fn try_rewrite_unit(
    unit: &UnitRc,
    rewriter: &mut dyn Rewriter,
    ctx: &RewriteContext<'_>,
    config: &TraversalConfig,
) -> Result<TraversalOutcome> {
    tracing::debug!(unit = %unit.name(), rewriter = rewriter.name(), "traversal started");

    rewriter.begin_unit(unit, ctx)?;

    let compilation = Arc::clone(unit.module().compilation());
    let mut walker = Walker::new(rewriter, config);

    let module_class = walker.walk_type(compilation.module_class())?;
    let globals_class = walker.walk_type(compilation.globals_class())?;
    let mut parts = Vec::with_capacity(compilation.parts().len());
    for part in compilation.parts() {
        parts.push(CompilationPart {
            source_location: part.source_location.clone(),
            root_namespace: walker.walk_namespace(&part.root_namespace)?,
        });
    }

    let mutations = walker.mutations;
    tracing::debug!(
        unit = %unit.name(),
        mutations = mutations.total(),
        "traversal finished"
    );

    if mutations.is_empty() {
        return Ok(TraversalOutcome::unchanged(unit, false));
    }

    let rewritten = SourceCompilation::with_classes(parts, module_class, globals_class);
    Ok(TraversalOutcome {
        unit: Arc::new(unit.with_compilation(Arc::new(rewritten))),
        mutations,
        aborted: false,
    })
}

/// Remaining stack below which a nested node is walked on a new segment.
const RED_ZONE: usize = 100 * 1024;

/// Size of each stack segment allocated while walking deep bodies.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first growing the stack if less than [`RED_ZONE`] remains.
#[inline]
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// Walked nodes keyed by address. The original is held so the address cannot be
/// reused by another node while the walk runs.
type Slot<T> = HashMap<usize, (Arc<T>, Arc<T>)>;

#[derive(Default)]
struct Memo {
    namespaces: Slot<NamespaceDeclaration>,
    types: Slot<TypeDefinition>,
    methods: Slot<MethodDefinition>,
    statements: Slot<Statement>,
    expressions: Slot<Expression>,
}

fn key<T>(node: &Arc<T>) -> usize {
    Arc::as_ptr(node) as usize
}

fn reuse_or<T>(original: &Arc<T>, changed: bool, build: impl FnOnce() -> T) -> Arc<T> {
    if changed {
        Arc::new(build())
    } else {
        Arc::clone(original)
    }
}

struct Walker<'r> {
    rewriter: &'r mut dyn Rewriter,
    config: &'r TraversalConfig,
    mutations: Mutations,
    depth: usize,
    memo: Memo,
}

impl<'r> Walker<'r> {
    fn new(rewriter: &'r mut dyn Rewriter, config: &'r TraversalConfig) -> Self {
        Self {
            rewriter,
            config,
            mutations: Mutations::new(),
            depth: 0,
            memo: Memo::default(),
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        match self.config.max_depth {
            Some(limit) if self.depth > limit => Err(Error::RecursionLimit(limit)),
            _ => Ok(()),
        }
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Apply a hook decision; `rebuild` walks the children of a node.
    fn apply<T>(
        &mut self,
        kind: NodeKind,
        original: &Arc<T>,
        decision: Rewrite<Arc<T>>,
        rebuild: fn(&mut Self, &Arc<T>) -> Result<Arc<T>>,
    ) -> Result<Arc<T>> {
        match decision {
            Rewrite::Default => rebuild(self, original),
            Rewrite::Keep => Ok(Arc::clone(original)),
            Rewrite::Descend(replacement) => {
                if !Arc::ptr_eq(&replacement, original) {
                    self.mutations.record(kind);
                    tracing::trace!(?kind, "node replaced");
                }
                rebuild(self, &replacement)
            }
            Rewrite::Replace(replacement) => {
                if !Arc::ptr_eq(&replacement, original) {
                    self.mutations.record(kind);
                    tracing::trace!(?kind, "node replaced");
                }
                Ok(replacement)
            }
        }
    }

    fn walk_list<T>(
        &mut self,
        items: &[Arc<T>],
        walk: fn(&mut Self, &Arc<T>) -> Result<Arc<T>>,
    ) -> Result<(Vec<Arc<T>>, bool)> {
        let mut changed = false;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let walked = walk(self, item)?;
            changed |= !Arc::ptr_eq(&walked, item);
            out.push(walked);
        }
        Ok((out, changed))
    }

    fn walk_optional(
        &mut self,
        expression: Option<&ExpressionRc>,
    ) -> Result<(Option<ExpressionRc>, bool)> {
        match expression {
            Some(expression) => {
                let walked = self.walk_expression(expression)?;
                let changed = !Arc::ptr_eq(&walked, expression);
                Ok((Some(walked), changed))
            }
            None => Ok((None, false)),
        }
    }

    fn walk_namespace(&mut self, namespace: &NamespaceDeclarationRc) -> Result<NamespaceDeclarationRc> {
        if self.config.memoize_shared {
            if let Some((_, done)) = self.memo.namespaces.get(&key(namespace)) {
                return Ok(Arc::clone(done));
            }
        }

        let (members, changed) = ensure_sufficient_stack(|| self.walk_members(namespace))?;

        let result = reuse_or(namespace, changed, || NamespaceDeclaration {
            name: namespace.name.clone(),
            members,
        });
        if self.config.memoize_shared {
            self.memo
                .namespaces
                .insert(key(namespace), (Arc::clone(namespace), Arc::clone(&result)));
        }
        Ok(result)
    }

    fn walk_members(
        &mut self,
        namespace: &NamespaceDeclaration,
    ) -> Result<(Vec<NamespaceMember>, bool)> {
        let mut changed = false;
        let mut members = Vec::with_capacity(namespace.members.len());
        for member in &namespace.members {
            let walked = match member {
                NamespaceMember::Namespace(nested) => {
                    let walked = self.walk_namespace(nested)?;
                    changed |= !Arc::ptr_eq(&walked, nested);
                    NamespaceMember::Namespace(walked)
                }
                NamespaceMember::Type(ty) => {
                    let walked = self.walk_type(ty)?;
                    changed |= !Arc::ptr_eq(&walked, ty);
                    NamespaceMember::Type(walked)
                }
            };
            members.push(walked);
        }
        Ok((members, changed))
    }

    fn walk_type(&mut self, ty: &TypeDefinitionRc) -> Result<TypeDefinitionRc> {
        if self.config.memoize_shared {
            if let Some((_, done)) = self.memo.types.get(&key(ty)) {
                return Ok(Arc::clone(done));
            }
        }

        let result = ensure_sufficient_stack(|| {
            self.enter()?;
            let decision = self.rewriter.rewrite_type(ty)?;
            let result = self.apply(NodeKind::TypeDefinition, ty, decision, Self::rebuild_type)?;
            self.leave();
            Ok::<_, Error>(result)
        })?;

        if self.config.memoize_shared {
            self.memo
                .types
                .insert(key(ty), (Arc::clone(ty), Arc::clone(&result)));
        }
        Ok(result)
    }

    fn rebuild_type(&mut self, ty: &TypeDefinitionRc) -> Result<TypeDefinitionRc> {
        let (nested_types, nested_changed) = self.walk_list(&ty.nested_types, Self::walk_type)?;
        let (methods, methods_changed) = self.walk_list(&ty.methods, Self::walk_method)?;

        Ok(reuse_or(ty, nested_changed || methods_changed, || TypeDefinition {
            namespace: ty.namespace.clone(),
            name: ty.name.clone(),
            nested_types,
            methods,
        }))
    }

    fn walk_method(&mut self, method: &MethodDefinitionRc) -> Result<MethodDefinitionRc> {
        if self.config.memoize_shared {
            if let Some((_, done)) = self.memo.methods.get(&key(method)) {
                return Ok(Arc::clone(done));
            }
        }

        let result = ensure_sufficient_stack(|| {
            self.enter()?;
            let decision = self.rewriter.rewrite_method(method)?;
            let result = self.apply(NodeKind::MethodDefinition, method, decision, Self::rebuild_method)?;
            self.leave();
            Ok::<_, Error>(result)
        })?;

        if self.config.memoize_shared {
            self.memo
                .methods
                .insert(key(method), (Arc::clone(method), Arc::clone(&result)));
        }
        Ok(result)
    }

    fn rebuild_method(&mut self, method: &MethodDefinitionRc) -> Result<MethodDefinitionRc> {
        let Some(body) = &method.body else {
            return Ok(Arc::clone(method));
        };

        let (statements, changed) = self.walk_list(&body.block.statements, Self::walk_statement)?;
        Ok(reuse_or(method, changed, || MethodDefinition {
            body: Some(MethodBody {
                locals: body.locals.clone(),
                block: Block::new(statements),
            }),
            ..MethodDefinition::clone(method)
        }))
    }

    fn walk_statement(&mut self, statement: &StatementRc) -> Result<StatementRc> {
        if self.config.memoize_shared {
            if let Some((_, done)) = self.memo.statements.get(&key(statement)) {
                return Ok(Arc::clone(done));
            }
        }

        let result = ensure_sufficient_stack(|| {
            self.enter()?;
            let decision = self.rewriter.rewrite_statement(statement)?;
            let result = self.apply(NodeKind::Statement, statement, decision, Self::rebuild_statement)?;
            self.leave();
            Ok::<_, Error>(result)
        })?;

        if self.config.memoize_shared {
            self.memo
                .statements
                .insert(key(statement), (Arc::clone(statement), Arc::clone(&result)));
        }
        Ok(result)
    }

    fn rebuild_statement(&mut self, statement: &StatementRc) -> Result<StatementRc> {
        let (kind, changed) = match &statement.kind {
            StatementKind::Expression(expression) => {
                let walked = self.walk_expression(expression)?;
                let changed = !Arc::ptr_eq(&walked, expression);
                (StatementKind::Expression(walked), changed)
            }
            StatementKind::LocalDeclaration { name, initializer } => {
                let (initializer, changed) = self.walk_optional(initializer.as_ref())?;
                (
                    StatementKind::LocalDeclaration {
                        name: name.clone(),
                        initializer,
                    },
                    changed,
                )
            }
            StatementKind::Return(value) => {
                let (value, changed) = self.walk_optional(value.as_ref())?;
                (StatementKind::Return(value), changed)
            }
            StatementKind::Block(block) => {
                let (statements, changed) = self.walk_list(&block.statements, Self::walk_statement)?;
                (StatementKind::Block(Block::new(statements)), changed)
            }
            StatementKind::If {
                condition,
                then,
                otherwise,
            } => {
                let walked_condition = self.walk_expression(condition)?;
                let walked_then = self.walk_statement(then)?;
                let mut changed = !Arc::ptr_eq(&walked_condition, condition)
                    || !Arc::ptr_eq(&walked_then, then);
                let walked_otherwise = match otherwise {
                    Some(otherwise) => {
                        let walked = self.walk_statement(otherwise)?;
                        changed |= !Arc::ptr_eq(&walked, otherwise);
                        Some(walked)
                    }
                    None => None,
                };
                (
                    StatementKind::If {
                        condition: walked_condition,
                        then: walked_then,
                        otherwise: walked_otherwise,
                    },
                    changed,
                )
            }
        };

        Ok(reuse_or(statement, changed, || Statement {
            kind,
            locations: statement.locations.clone(),
        }))
    }

    fn walk_expression(&mut self, expression: &ExpressionRc) -> Result<ExpressionRc> {
        if self.config.memoize_shared {
            if let Some((_, done)) = self.memo.expressions.get(&key(expression)) {
                return Ok(Arc::clone(done));
            }
        }

        let result = ensure_sufficient_stack(|| {
            self.enter()?;
            let result = match &expression.kind {
                ExpressionKind::MethodCall(call) => {
                    let decision = self.rewriter.rewrite_method_call(call, expression)?;
                    self.apply(NodeKind::MethodCall, expression, decision, Self::rebuild_expression)?
                }
                _ => {
                    let decision = self.rewriter.rewrite_expression(expression)?;
                    self.apply(NodeKind::Expression, expression, decision, Self::rebuild_expression)?
                }
            };
            self.leave();
            Ok::<_, Error>(result)
        })?;

        if self.config.memoize_shared {
            self.memo
                .expressions
                .insert(key(expression), (Arc::clone(expression), Arc::clone(&result)));
        }
        Ok(result)
    }

    fn rebuild_expression(&mut self, expression: &ExpressionRc) -> Result<ExpressionRc> {
        let (kind, changed) = match &expression.kind {
            ExpressionKind::Constant(_)
            | ExpressionKind::Local(_)
            | ExpressionKind::Parameter(_)
            | ExpressionKind::This => return Ok(Arc::clone(expression)),
            ExpressionKind::Unary { operator, operand } => {
                let walked = self.walk_expression(operand)?;
                let changed = !Arc::ptr_eq(&walked, operand);
                (
                    ExpressionKind::Unary {
                        operator: *operator,
                        operand: walked,
                    },
                    changed,
                )
            }
            ExpressionKind::Binary {
                operator,
                left,
                right,
            } => {
                let walked_left = self.walk_expression(left)?;
                let walked_right = self.walk_expression(right)?;
                let changed =
                    !Arc::ptr_eq(&walked_left, left) || !Arc::ptr_eq(&walked_right, right);
                (
                    ExpressionKind::Binary {
                        operator: *operator,
                        left: walked_left,
                        right: walked_right,
                    },
                    changed,
                )
            }
            ExpressionKind::MethodCall(call) => {
                let (this, this_changed) = self.walk_optional(call.this.as_ref())?;
                let (arguments, arguments_changed) =
                    self.walk_list(&call.arguments, Self::walk_expression)?;
                (
                    ExpressionKind::MethodCall(MethodCall {
                        method: call.method.clone(),
                        this,
                        arguments,
                    }),
                    this_changed || arguments_changed,
                )
            }
            ExpressionKind::Conditional {
                condition,
                then,
                otherwise,
            } => {
                let walked_condition = self.walk_expression(condition)?;
                let walked_then = self.walk_expression(then)?;
                let walked_otherwise = self.walk_expression(otherwise)?;
                let changed = !Arc::ptr_eq(&walked_condition, condition)
                    || !Arc::ptr_eq(&walked_then, then)
                    || !Arc::ptr_eq(&walked_otherwise, otherwise);
                (
                    ExpressionKind::Conditional {
                        condition: walked_condition,
                        then: walked_then,
                        otherwise: walked_otherwise,
                    },
                    changed,
                )
            }
        };

        Ok(reuse_or(expression, changed, || Expression {
            kind,
            locations: expression.locations.clone(),
        }))
    }
}
