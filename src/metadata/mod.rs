//! The object model of compiled units.
//!
//! This module contains the in-memory representation of compiled .NET units
//! (modules and assemblies), their identities, the namespaces and code they
//! contain, and the collaborators a host plugs in to load units and read their
//! debug symbols.
//!
//! # Key Components
//!
//! - [`unit`] - The closed [`Unit`](unit::Unit) hierarchy, builders and the
//!   [`UnitArena`](unit::UnitArena) that addresses units by id
//! - [`identity`] - Assembly, module and unit identities, public key tokens and
//!   marker-assembly resolution
//! - [`namespace`] - Namespace declarations, type and method definitions
//! - [`code`] - Statements and expressions of method bodies
//! - [`references`] - Type and method references, platform types
//! - [`interning`] - Process-wide unique keys for symbols
//! - [`host`] - Unit loading and debug-symbol providers
//! - [`diagnostics`] - Non-fatal issues collected while working on units
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use dotmutate::metadata::{
//!     namespace::{NamespaceDeclaration, TypeDefinition},
//!     unit::{AssemblyBuilder, CompilationPart, UnitArena},
//! };
//!
//! let root = NamespaceDeclaration::new("")
//!     .with_namespace(NamespaceDeclaration::new("App").with_type(TypeDefinition::new("App", "Program")));
//! let assembly = AssemblyBuilder::new("App", "/bin/App.dll")
//!     .part(CompilationPart::new("Program.cs", Arc::new(root)))
//!     .build();
//!
//! let arena = UnitArena::new();
//! let id = arena.insert(assembly)?;
//! let unit = arena.get(id).unwrap();
//!
//! assert!(unit.root_namespace().find_type("App.Program").is_some());
//! # Ok::<(), dotmutate::Error>(())
//! ```

/// Statements and expressions of method bodies
pub mod code;
/// Collection of non-fatal issues
pub mod diagnostics;
/// Unit loading and debug symbols, implemented by the host
pub mod host;
/// Identities of units and marker-assembly resolution
pub mod identity;
/// Symbol interning
pub mod interning;
/// Namespaces, types and methods
pub mod namespace;
/// References to types and methods
pub mod references;
/// Modules, assemblies and the unit arena
pub mod unit;
