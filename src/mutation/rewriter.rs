//! The per-node-kind override contract of the rewrite walk.
//!
//! A [`Rewriter`] is consulted by the walk for every node it reaches. Each hook
//! returns a [`Rewrite`] decision; the default implementation of every hook returns
//! [`Rewrite::Default`], so a rewriter only overrides the node kinds it cares about.

use strum::{EnumCount, EnumIter};

use crate::{
    metadata::{
        code::{ExpressionRc, MethodCall, StatementRc},
        diagnostics::DiagnosticSink,
        host::SymbolStore,
        namespace::{MethodDefinitionRc, TypeDefinitionRc},
        unit::Unit,
    },
    Result,
};

/// What the walk should do with a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite<T> {
    /// Recurse into the children in declaration order and rebuild an equivalent
    /// node; the original is reused when no child changed.
    Default,
    /// Leave the node as it is and do not recurse into it.
    Keep,
    /// Replace the node, then recurse into the children of the replacement.
    Descend(T),
    /// Replace the node; the replacement is not visited.
    Replace(T),
}

/// The node kinds a [`Rewriter`] can override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum NodeKind {
    /// Type definitions, including nested types
    TypeDefinition,
    /// Method definitions
    MethodDefinition,
    /// Statements
    Statement,
    /// Method call expressions
    MethodCall,
    /// Every other expression
    Expression,
}

/// Services available to a rewriter for the duration of one unit.
#[derive(Clone, Copy)]
pub struct RewriteContext<'a> {
    /// Debug-symbol providers, keyed by unit location.
    pub symbols: &'a SymbolStore,
    /// Where aborted traversals are reported.
    pub sink: &'a dyn DiagnosticSink,
}

impl<'a> RewriteContext<'a> {
    /// Create a context.
    pub fn new(symbols: &'a SymbolStore, sink: &'a dyn DiagnosticSink) -> Self {
        Self { symbols, sink }
    }
}

/// Per-node-kind hooks of the rewrite walk.
///
/// A rewriter instance is used for one unit at a time. Returning an error from any
/// hook aborts the traversal of that unit.
pub trait Rewriter {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str {
        "rewriter"
    }

    /// Called once before the walk of `unit` starts.
    ///
    /// # Errors
    /// An error aborts the traversal and leaves the unit unchanged.
    fn begin_unit(&mut self, _unit: &Unit, _ctx: &RewriteContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Decide what to do with a type definition.
    ///
    /// # Errors
    /// An error aborts the traversal of the unit.
    fn rewrite_type(&mut self, _ty: &TypeDefinitionRc) -> Result<Rewrite<TypeDefinitionRc>> {
        Ok(Rewrite::Default)
    }

    /// Decide what to do with a method definition.
    ///
    /// # Errors
    /// An error aborts the traversal of the unit.
    fn rewrite_method(
        &mut self,
        _method: &MethodDefinitionRc,
    ) -> Result<Rewrite<MethodDefinitionRc>> {
        Ok(Rewrite::Default)
    }

    /// Decide what to do with a statement.
    ///
    /// # Errors
    /// An error aborts the traversal of the unit.
    fn rewrite_statement(&mut self, _statement: &StatementRc) -> Result<Rewrite<StatementRc>> {
        Ok(Rewrite::Default)
    }

    /// Decide what to do with a method call; `node` is the expression holding `call`.
    ///
    /// # Errors
    /// An error aborts the traversal of the unit.
    fn rewrite_method_call(
        &mut self,
        _call: &MethodCall,
        _node: &ExpressionRc,
    ) -> Result<Rewrite<ExpressionRc>> {
        Ok(Rewrite::Default)
    }

    /// Decide what to do with an expression that is not a method call.
    ///
    /// # Errors
    /// An error aborts the traversal of the unit.
    fn rewrite_expression(&mut self, _expression: &ExpressionRc) -> Result<Rewrite<ExpressionRc>> {
        Ok(Rewrite::Default)
    }
}
