//! # dotmutate Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dotmutate library. Import this module to get quick access to the essential
//! types for building units and rewriting them.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotmutate operations
pub use crate::Error;

/// The result type used throughout dotmutate
pub use crate::Result;

// ================================================================================================
// Units
// ================================================================================================

/// Units, their builders and the arena addressing them
pub use crate::metadata::unit::{
    Assembly, AssemblyBuilder, AssemblyFlags, Compilation, CompilationPart, Module,
    ModuleBuilder, ModuleKind, ModuleOptions, SourceCompilation, Unit, UnitArena, UnitId, UnitRc,
    UnitReference,
};

/// Identities and marker-assembly resolution
pub use crate::metadata::identity::{
    compute_public_key_token, AssemblyIdentity, AssemblyVersion, MarkerType, ModuleIdentity,
    UnitIdentity,
};

// ================================================================================================
// Code Model
// ================================================================================================

/// Namespaces, types and methods
pub use crate::metadata::namespace::{
    MethodDefinition, NamespaceDeclaration, NamespaceMember, RootNamespace, TypeDefinition,
    TypeDefinitionRc,
};

/// Statements and expressions
pub use crate::metadata::code::{
    BinaryOperator, Block, Constant, Expression, ExpressionKind, ExpressionRc, Location,
    MethodBody, MethodCall, Statement, StatementKind, StatementRc, UnaryOperator,
};

/// References and well-known platform types
pub use crate::metadata::references::{MethodReference, PlatformTypes, TypeReference};

/// Symbol interning
pub use crate::metadata::interning::{InternTable, InternedKey, Symbol};

// ================================================================================================
// Host Collaborators and Diagnostics
// ================================================================================================

/// Unit loading and debug symbols
pub use crate::metadata::host::{
    DebugSymbolProvider, MemorySymbols, PrimarySourceLocation, SourceSpan, SymbolStore,
    UnitLoader,
};

/// Diagnostics collection
pub use crate::metadata::diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticSeverity, DiagnosticSink, Diagnostics,
};

// ================================================================================================
// Mutation
// ================================================================================================

/// Traversal, mutators and the pipeline
pub use crate::mutation::{
    rewrite_unit, AssertMessageMutator, MutationPipeline, Mutations, NodeKind, PipelineConfig,
    PipelineReport, Rewrite, RewriteContext, Rewriter, SignatureTable, TraversalConfig,
    TraversalOutcome, UnitMutator, UnitReport, UnitStatus,
};
