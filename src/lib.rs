// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0


#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::too_many_arguments)]

//! # dotmutate
//!
//! An in-memory object model for compiled .NET units and a framework for rewriting
//! them. Built in pure Rust, `dotmutate` represents modules and assemblies with
//! their identities, namespaces and method bodies, and applies symbol-directed
//! mutators that turn one unit into a structurally equivalent or rewritten one.
//!
//! ## Features
//!
//! - **Unit identities** - Assembly and module identities with public key token
//!   derivation and version arbitration across references
//! - **Lazy namespaces** - Root namespaces and type lists built on first access, at
//!   most once, safe under concurrent access
//! - **Symbol interning** - Process-wide unique keys for type and method references
//! - **Copy-and-rewrite traversal** - Per-node-kind hooks with explicit mutation
//!   accounting and structural sharing of untouched subtrees
//! - **Mutation pipeline** - Prioritized mutators applied to many units in parallel
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use dotmutate::prelude::*;
//!
//! // Xunit's Assert.True(bool) / Assert.False(bool) gain a message argument
//! let platform = PlatformTypes::new(AssemblyIdentity::new(
//!     "mscorlib",
//!     AssemblyVersion::new(4, 0, 0, 0),
//!     "",
//!     vec![0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89],
//! ));
//! let xunit = AssemblyIdentity::new("xunit.assert", AssemblyVersion::new(2, 4, 2, 0), "", vec![]);
//! let assert_type = TypeReference::new(xunit, "Xunit", "Assert");
//! let assert_true = MethodReference::new(
//!     assert_type.clone(),
//!     "True",
//!     platform.system_void(),
//!     vec![platform.system_boolean()],
//! );
//!
//! // Tests.Program::Run() { Assert.True(x > 0); }
//! let at = Location::new("Tests.Program::Run", 0x2);
//! let condition = Expression::located(
//!     ExpressionKind::Binary {
//!         operator: BinaryOperator::GreaterThan,
//!         left: Expression::local("x"),
//!         right: Expression::constant(Constant::Int(0)),
//!     },
//!     vec![at.clone()],
//! );
//! let body = MethodBody::new(vec![Statement::expression(Expression::call(assert_true, None, vec![condition]))]);
//! let program = TypeDefinition::new("Tests", "Program").with_method(MethodDefinition::new("Run", Some(body)));
//! let root = NamespaceDeclaration::new("")
//!     .with_namespace(NamespaceDeclaration::new("Tests").with_type(program));
//! let unit: UnitRc = Arc::new(
//!     AssemblyBuilder::new("Tests", "/bin/Tests.dll")
//!         .part(CompilationPart::new("Tests.cs", Arc::new(root)))
//!         .build()
//!         .into(),
//! );
//!
//! // Debug symbols map the condition back to its source line
//! let symbols = SymbolStore::new();
//! symbols.register(
//!     "/bin/Tests.dll",
//!     Arc::new(MemorySymbols::new().with(
//!         at,
//!         PrimarySourceLocation::new("Tests.cs", SourceSpan::new(9, 9, 9, 29), "Assert.True(x > 0);"),
//!     )),
//! );
//!
//! let interner = Arc::new(InternTable::new());
//! let pipeline = MutationPipeline::new(PipelineConfig::default())
//!     .with_mutator(Arc::new(AssertMessageMutator::xunit(interner, &assert_type, &platform)));
//!
//! let diagnostics = Diagnostics::new();
//! let report = pipeline.run_all(&[unit], &RewriteContext::new(&symbols, &diagnostics));
//! assert_eq!(report.total_mutations(), 1);
//! ```
//!
//! ## Architecture
//!
//! `dotmutate` is organized into a few key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`metadata`] - Units, identities, namespaces, code and host collaborators
//! - [`mutation`] - The rewrite traversal, mutators and the mutation pipeline
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Thread Safety
//!
//! Units are immutable once built and are shared through [`std::sync::Arc`]. Their
//! lazily computed parts (root namespace, type list, marker assemblies) live in
//! per-unit [`std::sync::OnceLock`] cells. The [`metadata::interning::InternTable`]
//! and the [`metadata::unit::UnitArena`] are lock-free for readers and may be
//! shared across threads. Each traversal runs on one thread; the pipeline runs
//! distinct units in parallel.

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use dotmutate::prelude::*;
///
/// let config = PipelineConfig::sequential();
/// let pipeline = MutationPipeline::new(config);
/// assert!(pipeline.mutator_names().is_empty());
/// ```
pub mod prelude;

/// The object model of compiled units.
///
/// # Key Components
///
/// - [`metadata::unit`] - Modules, assemblies and the unit arena
/// - [`metadata::identity`] - Identities, public key tokens, marker assemblies
/// - [`metadata::namespace`] and [`metadata::code`] - The code a unit contains
/// - [`metadata::host`] - Unit loading and debug symbols
pub mod metadata;

/// Rewriting units.
///
/// # Key Components
///
/// - [`mutation::Rewriter`] and [`mutation::rewrite_unit`] - The traversal
/// - [`mutation::UnitMutator`] - Named, prioritized transformations
/// - [`mutation::MutationPipeline`] - Ordered application to many units
/// - [`mutation::AssertMessageMutator`] - Adds condition text to assertions
pub mod mutation;

/// `dotmutate` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dotmutate` Error type
///
/// # Examples
///
/// ```rust
/// use dotmutate::{metadata::identity::AssemblyIdentity, Error};
///
/// match AssemblyIdentity::parse("Broken, Version=1.x") {
///     Ok(identity) => println!("Parsed {}", identity.name),
///     Err(Error::Malformed { message, .. }) => println!("Malformed: {}", message),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
pub use error::Error;
