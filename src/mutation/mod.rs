//! Rewriting units.
//!
//! This module provides the copy-and-rewrite traversal over the code of a unit, the
//! mutator abstraction built on top of it, and the pipeline that applies mutators
//! to many units.
//!
//! # Architecture
//!
//! - [`Rewriter`] - per-node-kind hooks returning a [`Rewrite`] decision
//! - [`rewrite_unit`] - the depth-first walk; returns a [`TraversalOutcome`] with the
//!   rewritten unit and the [`Mutations`] it performed
//! - [`UnitMutator`] - a named, prioritized transformation creating a fresh
//!   rewriter per unit
//! - [`MutationPipeline`] - applies mutators in priority order, units in parallel
//!
//! Units are immutable. A traversal never modifies its input; it returns either the
//! very same unit (nothing changed) or a new one sharing every untouched node.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use dotmutate::prelude::*;
//!
//! /// Turns every `true` literal into `false`.
//! struct Flip;
//!
//! impl Rewriter for Flip {
//!     fn rewrite_expression(&mut self, e: &ExpressionRc) -> dotmutate::Result<Rewrite<ExpressionRc>> {
//!         if e.kind == ExpressionKind::Constant(Constant::Bool(true)) {
//!             return Ok(Rewrite::Replace(Expression::constant(Constant::Bool(false))));
//!         }
//!         Ok(Rewrite::Default)
//!     }
//! }
//!
//! let body = MethodBody::new(vec![Statement::expression(Expression::constant(Constant::Bool(true)))]);
//! let program = TypeDefinition::new("", "Program").with_method(MethodDefinition::new("Main", Some(body)));
//! let root = NamespaceDeclaration::new("").with_type(program);
//! let unit: UnitRc = Arc::new(
//!     ModuleBuilder::new("App.dll", "/bin/App.dll")
//!         .part(CompilationPart::new("Program.cs", Arc::new(root)))
//!         .build()
//!         .into(),
//! );
//!
//! let symbols = SymbolStore::new();
//! let diagnostics = Diagnostics::new();
//! let ctx = RewriteContext::new(&symbols, &diagnostics);
//! let outcome = rewrite_unit(&unit, &mut Flip, &ctx, &TraversalConfig::default());
//!
//! assert_eq!(outcome.mutations.total(), 1);
//! assert!(!Arc::ptr_eq(&outcome.unit, &unit));
//! ```

pub mod config;
pub mod pass;
pub mod passes;
pub mod pipeline;
pub mod rewriter;
pub mod walker;

pub use config::{PipelineConfig, TraversalConfig};
pub use pass::UnitMutator;
pub use passes::{AssertMessageMutator, SignatureTable};
pub use pipeline::{MutationPipeline, PipelineReport, UnitReport, UnitStatus};
pub use rewriter::{NodeKind, Rewrite, RewriteContext, Rewriter};
pub use walker::{rewrite_unit, try_rewrite_unit, Mutations, TraversalOutcome};
