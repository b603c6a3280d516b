//! Compiled units and the arena that owns them.
//!
//! A [`Unit`] is the in-memory representation of one compiled artifact. The set of
//! unit kinds is closed: a unit is either a plain [`Module`] or an [`Assembly`]
//! (which embeds its manifest module). Both share one capability surface exposed on
//! [`Unit`] itself, so callers rarely need to match on the variant.
//!
//! Units reference each other through [`UnitReference`]s. A reference is either
//! resolved to a [`UnitId`] in a [`UnitArena`] at construction, or it only carries
//! the identity of the target; in both cases lookups return `None` when the target
//! is absent instead of failing.
//!
//! # Key Components
//!
//! - [`Unit`] - Closed union of module and assembly
//! - [`UnitArena`] - Append-only store addressed by [`UnitId`]
//! - [`UnitReference`] - Reference from one unit to another
//! - [`Module`] / [`ModuleBuilder`] - Modules and their PE-level options
//! - [`Assembly`] / [`AssemblyBuilder`] - Assemblies and their manifest metadata

mod arena;
mod assembly;
mod module;

pub use arena::{UnitArena, BAD_TARGET_RUNTIME};
pub use assembly::{
    Assembly, AssemblyBuilder, AssemblyFlags, ExportedType, FileReference, ResourceReference,
    SecurityAttribute,
};
pub use module::{
    Compilation, CompilationPart, CustomAttribute, Module, ModuleBuilder, ModuleKind,
    ModuleOptions, NamespaceState, SourceCompilation, Win32Resource,
};

use std::{fmt, sync::Arc};

use crate::metadata::{
    identity::UnitIdentity,
    namespace::{RootNamespace, TypeDefinitionRc},
};

/// A reference-counted pointer to a [`Unit`].
pub type UnitRc = Arc<Unit>;

/// Index of a unit in a [`UnitArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(pub(crate) u32);

impl UnitId {
    /// The raw index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// A reference from one unit to another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnitReference {
    /// The target is only known by identity; it is looked up in the arena on demand.
    Unresolved(UnitIdentity),
    /// The target was bound when the reference was created.
    Resolved(UnitId),
}

/// A compiled unit.
#[derive(Debug)]
pub enum Unit {
    /// A module that is not an assembly manifest
    Module(Module),
    /// An assembly
    Assembly(Assembly),
}

impl Unit {
    /// The module of this unit; the manifest module for an assembly.
    #[must_use]
    pub fn module(&self) -> &Module {
        match self {
            Unit::Module(module) => module,
            Unit::Assembly(assembly) => &assembly.module,
        }
    }

    /// The assembly, if this unit is one.
    #[must_use]
    pub fn as_assembly(&self) -> Option<&Assembly> {
        match self {
            Unit::Assembly(assembly) => Some(assembly),
            Unit::Module(_) => None,
        }
    }

    /// The unit's simple name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Unit::Module(module) => module.name(),
            Unit::Assembly(assembly) => &assembly.identity().name,
        }
    }

    /// Where the unit was loaded from.
    #[must_use]
    pub fn location(&self) -> &str {
        self.module().location()
    }

    /// The identity of the unit.
    #[must_use]
    pub fn identity(&self) -> UnitIdentity {
        match self {
            Unit::Module(module) => UnitIdentity::Module(module.identity().clone()),
            Unit::Assembly(assembly) => UnitIdentity::Assembly(assembly.identity().clone()),
        }
    }

    /// Every unit reference: assembly references first, then module references.
    pub fn references(&self) -> impl Iterator<Item = &UnitReference> {
        let module = self.module();
        module
            .assembly_references()
            .iter()
            .chain(module.module_references())
    }

    /// The root namespace, built on first access.
    pub fn root_namespace(&self) -> &Arc<RootNamespace> {
        self.module().root_namespace()
    }

    /// Every type of the unit, see [`Module::all_types`].
    pub fn all_types(&self) -> &Arc<[TypeDefinitionRc]> {
        self.module().all_types()
    }

    /// Source locations of the compilation parts.
    #[must_use]
    pub fn locations(&self) -> Vec<&str> {
        self.module().locations()
    }

    /// The image kind.
    #[must_use]
    pub fn kind(&self) -> ModuleKind {
        match self {
            Unit::Module(module) => module.kind(),
            Unit::Assembly(assembly) => assembly.kind(),
        }
    }

    /// A copy of this unit over another compilation, see [`Module::with_compilation`].
    #[must_use]
    pub fn with_compilation(&self, compilation: Arc<dyn Compilation>) -> Self {
        match self {
            Unit::Module(module) => Unit::Module(module.with_compilation(compilation)),
            Unit::Assembly(assembly) => Unit::Assembly(assembly.with_compilation(compilation)),
        }
    }
}

impl From<Module> for Unit {
    fn from(module: Module) -> Self {
        Unit::Module(module)
    }
}

impl From<Assembly> for Unit {
    fn from(assembly: Assembly) -> Self {
        Unit::Assembly(assembly)
    }
}
