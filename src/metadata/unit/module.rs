//! Modules: compilation parts, PE-level options and the lazily built namespace tree.
//!
//! A [`Module`] is created once by a loader or a [`ModuleBuilder`] and is immutable
//! afterwards, except for a handful of one-shot cells that memoize derived data:
//!
//! - the root namespace, built from the compilation parts on first access
//! - the flattened list of all types
//! - the resolved core and contract assembly identities
//!
//! Each cell is a per-module [`OnceLock`]. Under concurrent first access exactly one
//! thread performs the construction and every caller observes the same result.

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use strum::{EnumCount, EnumIter};

use crate::metadata::{
    identity::{AssemblyIdentity, MarkerKind, ModuleIdentity},
    namespace::{NamespaceDeclarationRc, RootNamespace, TypeDefinition, TypeDefinitionRc},
    references::MethodReference,
    unit::UnitReference,
};

/// One source of declarations in a module, e.g. one source file.
#[derive(Debug, Clone)]
pub struct CompilationPart {
    /// Where the part came from.
    pub source_location: String,
    /// The root namespace declaration this part contributes.
    pub root_namespace: NamespaceDeclarationRc,
}

impl CompilationPart {
    /// Create a compilation part.
    pub fn new(source_location: impl Into<String>, root_namespace: NamespaceDeclarationRc) -> Self {
        Self {
            source_location: source_location.into(),
            root_namespace,
        }
    }
}

/// The compilation that produced a module.
///
/// Supplies the compilation parts, the two synthetic classes every module has and
/// the factory for the (initially empty) root namespace.
pub trait Compilation: Send + Sync + fmt::Debug {
    /// The compilation parts, in declaration order.
    fn parts(&self) -> &[CompilationPart];

    /// The synthetic class holding module-level code (`<Module>`).
    fn module_class(&self) -> &TypeDefinitionRc;

    /// The synthetic class holding global fields and methods.
    fn globals_class(&self) -> &TypeDefinitionRc;

    /// Creates the root namespace before the parts are folded into it.
    fn create_root_namespace(&self) -> RootNamespace {
        RootNamespace::new()
    }
}

/// A [`Compilation`] over an explicit list of parts.
#[derive(Debug, Clone)]
pub struct SourceCompilation {
    parts: Vec<CompilationPart>,
    module_class: TypeDefinitionRc,
    globals_class: TypeDefinitionRc,
}

impl SourceCompilation {
    /// A compilation with empty synthetic classes.
    #[must_use]
    pub fn new(parts: Vec<CompilationPart>) -> Self {
        Self::with_classes(
            parts,
            Arc::new(TypeDefinition::new("", "<Module>")),
            Arc::new(TypeDefinition::new("", "__Globals__")),
        )
    }

    /// A compilation with the given synthetic classes.
    #[must_use]
    pub fn with_classes(
        parts: Vec<CompilationPart>,
        module_class: TypeDefinitionRc,
        globals_class: TypeDefinitionRc,
    ) -> Self {
        Self {
            parts,
            module_class,
            globals_class,
        }
    }
}

impl Compilation for SourceCompilation {
    fn parts(&self) -> &[CompilationPart] {
        &self.parts
    }

    fn module_class(&self) -> &TypeDefinitionRc {
        &self.module_class
    }

    fn globals_class(&self) -> &TypeDefinitionRc {
        &self.globals_class
    }
}

/// The kind of image a module is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum ModuleKind {
    /// A console executable
    ConsoleApplication,
    /// A GUI executable
    WindowsApplication,
    /// A library
    DynamicallyLinkedLibrary,
    /// A resource-only file
    ManifestResourceFile,
    /// A native library
    UnmanagedDynamicallyLinkedLibrary,
}

/// PE-level properties of a module.
///
/// The defaults are the values a freshly compiled managed library carries.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ModuleOptions {
    /// Preferred image base address.
    pub base_address: u64,
    /// Section file alignment.
    pub file_alignment: u32,
    /// DLL characteristics flags.
    pub dll_characteristics: u16,
    /// Linker major version.
    pub linker_major_version: u8,
    /// Linker minor version.
    pub linker_minor_version: u8,
    /// Metadata format major version.
    pub metadata_format_major_version: u8,
    /// Metadata format minor version.
    pub metadata_format_minor_version: u8,
    /// Initial heap commit size.
    pub size_of_heap_commit: u64,
    /// Heap reserve size.
    pub size_of_heap_reserve: u64,
    /// Initial stack commit size.
    pub size_of_stack_commit: u64,
    /// Stack reserve size.
    pub size_of_stack_reserve: u64,
    /// Image contains IL only.
    pub il_only: bool,
    /// Image must run as a 32-bit process.
    pub requires_32bits: bool,
    /// Image must run as a 64-bit process.
    pub requires_64bits: bool,
    /// Image requires the AMD64 instruction set.
    pub requires_amd_instruction_set: bool,
    /// The JIT should track debug data.
    pub track_debug_data: bool,
    /// Assembly references carry tokens instead of full keys.
    pub use_public_key_tokens_for_assembly_references: bool,
    /// Explicit runtime version, e.g. `v4.0.30319`.
    pub target_runtime_version: Option<String>,
}

impl Default for ModuleOptions {
    fn default() -> Self {
        Self {
            base_address: 0x40_0000,
            file_alignment: 512,
            dll_characteristics: 0,
            linker_major_version: 6,
            linker_minor_version: 0,
            metadata_format_major_version: 2,
            metadata_format_minor_version: 0,
            size_of_heap_commit: 0x1000,
            size_of_heap_reserve: 0x10_0000,
            size_of_stack_commit: 0x1000,
            size_of_stack_reserve: 0x10_0000,
            il_only: true,
            requires_32bits: false,
            requires_64bits: false,
            requires_amd_instruction_set: false,
            track_debug_data: false,
            use_public_key_tokens_for_assembly_references: true,
            target_runtime_version: None,
        }
    }
}

impl ModuleOptions {
    /// Options for a 64-bit-only image.
    #[must_use]
    pub fn x64() -> Self {
        Self {
            base_address: 0x1_4000_0000,
            requires_64bits: true,
            requires_amd_instruction_set: true,
            ..Self::default()
        }
    }

    /// Options with an explicit runtime version.
    #[must_use]
    pub fn with_runtime(version: impl Into<String>) -> Self {
        Self {
            target_runtime_version: Some(version.into()),
            ..Self::default()
        }
    }
}

/// A custom attribute attached to a module or an assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAttribute {
    /// The attribute constructor.
    pub constructor: MethodReference,
    /// Fixed arguments, rendered as text.
    pub arguments: Vec<String>,
}

/// A native Win32 resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Win32Resource {
    /// Resource type id.
    pub type_id: u32,
    /// Resource id.
    pub id: u32,
    /// Language id.
    pub language_id: u32,
    /// Raw data.
    pub data: Vec<u8>,
}

/// Observable state of the lazily built root namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceState {
    /// Not built yet.
    Unbuilt,
    /// Built; membership is final.
    Built,
}

/// A compiled module.
#[derive(Debug)]
pub struct Module {
    pub(crate) identity: ModuleIdentity,
    pub(crate) name: String,
    pub(crate) location: String,
    pub(crate) kind: Option<ModuleKind>,
    pub(crate) entry_point: Option<MethodReference>,
    pub(crate) assembly_references: Vec<UnitReference>,
    pub(crate) module_references: Vec<UnitReference>,
    pub(crate) attributes: Vec<CustomAttribute>,
    pub(crate) win32_resources: Vec<Win32Resource>,
    pub(crate) options: ModuleOptions,
    pub(crate) compilation: Arc<dyn Compilation>,
    root_namespace: OnceLock<Arc<RootNamespace>>,
    all_types: OnceLock<Arc<[TypeDefinitionRc]>>,
    core_assembly: OnceLock<AssemblyIdentity>,
    contract_assembly: OnceLock<AssemblyIdentity>,
}

impl Module {
    /// The identity of this module.
    #[must_use]
    pub fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    /// The module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the module was loaded from.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The kind of image; a library unless set explicitly.
    #[must_use]
    pub fn kind(&self) -> ModuleKind {
        self.kind.unwrap_or(ModuleKind::DynamicallyLinkedLibrary)
    }

    /// The entry point, if any.
    #[must_use]
    pub fn entry_point(&self) -> Option<&MethodReference> {
        self.entry_point.as_ref()
    }

    /// References to other assemblies, in declaration order.
    #[must_use]
    pub fn assembly_references(&self) -> &[UnitReference] {
        &self.assembly_references
    }

    /// References to other modules of the same assembly, in declaration order.
    #[must_use]
    pub fn module_references(&self) -> &[UnitReference] {
        &self.module_references
    }

    /// Module-level custom attributes.
    #[must_use]
    pub fn attributes(&self) -> &[CustomAttribute] {
        &self.attributes
    }

    /// Win32 resources.
    #[must_use]
    pub fn win32_resources(&self) -> &[Win32Resource] {
        &self.win32_resources
    }

    /// PE-level options.
    #[must_use]
    pub fn options(&self) -> &ModuleOptions {
        &self.options
    }

    /// The compilation this module was produced from.
    #[must_use]
    pub fn compilation(&self) -> &Arc<dyn Compilation> {
        &self.compilation
    }

    /// The root namespace, built on first access.
    ///
    /// Construction asks the compilation for an empty root and folds in the root
    /// declaration of every compilation part in order. Later calls return the
    /// same instance.
    pub fn root_namespace(&self) -> &Arc<RootNamespace> {
        self.root_namespace.get_or_init(|| {
            let mut root = self.compilation.create_root_namespace();
            for part in self.compilation.parts() {
                root.add_declaration(part.root_namespace.clone());
            }
            tracing::debug!(
                module = %self.name,
                parts = self.compilation.parts().len(),
                "built root namespace"
            );
            Arc::new(root)
        })
    }

    /// Whether the root namespace has been built yet.
    #[must_use]
    pub fn namespace_state(&self) -> NamespaceState {
        if self.root_namespace.get().is_some() {
            NamespaceState::Built
        } else {
            NamespaceState::Unbuilt
        }
    }

    /// Every type of the module: module class, globals class, then each namespace
    /// type followed by its nested types. Types nested in the two synthetic classes
    /// are not listed. Computed once.
    pub fn all_types(&self) -> &Arc<[TypeDefinitionRc]> {
        self.all_types.get_or_init(|| {
            let mut types = vec![
                Arc::clone(self.compilation.module_class()),
                Arc::clone(self.compilation.globals_class()),
            ];
            types.extend(self.root_namespace().types());
            types.into()
        })
    }

    /// Source locations of the compilation parts.
    #[must_use]
    pub fn locations(&self) -> Vec<&str> {
        self.compilation
            .parts()
            .iter()
            .map(|part| part.source_location.as_str())
            .collect()
    }

    pub(crate) fn marker_cell(&self, kind: MarkerKind) -> &OnceLock<AssemblyIdentity> {
        match kind {
            MarkerKind::Core => &self.core_assembly,
            MarkerKind::Contract => &self.contract_assembly,
        }
    }

    /// A copy of this module over another compilation.
    ///
    /// Identity, references and options are shared; the lazy cells start empty.
    #[must_use]
    pub fn with_compilation(&self, compilation: Arc<dyn Compilation>) -> Self {
        Self::from_parts(
            self.identity.clone(),
            self.name.clone(),
            self.location.clone(),
            self.kind,
            self.entry_point.clone(),
            self.assembly_references.clone(),
            self.module_references.clone(),
            self.attributes.clone(),
            self.win32_resources.clone(),
            self.options.clone(),
            compilation,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn from_parts(
        identity: ModuleIdentity,
        name: String,
        location: String,
        kind: Option<ModuleKind>,
        entry_point: Option<MethodReference>,
        assembly_references: Vec<UnitReference>,
        module_references: Vec<UnitReference>,
        attributes: Vec<CustomAttribute>,
        win32_resources: Vec<Win32Resource>,
        options: ModuleOptions,
        compilation: Arc<dyn Compilation>,
    ) -> Self {
        Self {
            identity,
            name,
            location,
            kind,
            entry_point,
            assembly_references,
            module_references,
            attributes,
            win32_resources,
            options,
            compilation,
            root_namespace: OnceLock::new(),
            all_types: OnceLock::new(),
            core_assembly: OnceLock::new(),
            contract_assembly: OnceLock::new(),
        }
    }
}

/// Builder for [`Module`].
///
/// ```rust
/// use std::sync::Arc;
/// use dotmutate::metadata::namespace::{NamespaceDeclaration, TypeDefinition};
/// use dotmutate::metadata::unit::{CompilationPart, ModuleBuilder, ModuleKind};
///
/// let root = NamespaceDeclaration::new("").with_type(TypeDefinition::new("", "Program"));
/// let module = ModuleBuilder::new("Helper.netmodule", "/bin/Helper.netmodule")
///     .part(CompilationPart::new("Program.cs", Arc::new(root)))
///     .build();
///
/// assert_eq!(module.kind(), ModuleKind::DynamicallyLinkedLibrary);
/// assert_eq!(module.all_types().len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct ModuleBuilder {
    pub(crate) name: String,
    pub(crate) location: String,
    pub(crate) containing_assembly: Option<AssemblyIdentity>,
    pub(crate) kind: Option<ModuleKind>,
    pub(crate) entry_point: Option<MethodReference>,
    pub(crate) assembly_references: Vec<UnitReference>,
    pub(crate) module_references: Vec<UnitReference>,
    pub(crate) attributes: Vec<CustomAttribute>,
    pub(crate) win32_resources: Vec<Win32Resource>,
    pub(crate) options: ModuleOptions,
    pub(crate) parts: Vec<CompilationPart>,
    pub(crate) compilation: Option<Arc<dyn Compilation>>,
}

impl ModuleBuilder {
    /// Start a module with the given name and location.
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            ..Self::default()
        }
    }

    /// Set the assembly this module belongs to.
    #[must_use]
    pub fn containing_assembly(mut self, assembly: AssemblyIdentity) -> Self {
        self.containing_assembly = Some(assembly);
        self
    }

    /// Set the image kind explicitly.
    #[must_use]
    pub fn kind(mut self, kind: ModuleKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set the entry point.
    #[must_use]
    pub fn entry_point(mut self, method: MethodReference) -> Self {
        self.entry_point = Some(method);
        self
    }

    /// Add an assembly reference.
    #[must_use]
    pub fn assembly_reference(mut self, reference: UnitReference) -> Self {
        self.assembly_references.push(reference);
        self
    }

    /// Add a module reference.
    #[must_use]
    pub fn module_reference(mut self, reference: UnitReference) -> Self {
        self.module_references.push(reference);
        self
    }

    /// Add a custom attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add a Win32 resource.
    #[must_use]
    pub fn win32_resource(mut self, resource: Win32Resource) -> Self {
        self.win32_resources.push(resource);
        self
    }

    /// Replace the PE-level options.
    #[must_use]
    pub fn options(mut self, options: ModuleOptions) -> Self {
        self.options = options;
        self
    }

    /// Add a compilation part. Ignored when an explicit compilation is set.
    #[must_use]
    pub fn part(mut self, part: CompilationPart) -> Self {
        self.parts.push(part);
        self
    }

    /// Use an explicit compilation instead of the collected parts.
    #[must_use]
    pub fn compilation(mut self, compilation: Arc<dyn Compilation>) -> Self {
        self.compilation = Some(compilation);
        self
    }

    pub(crate) fn take_compilation(&mut self) -> Arc<dyn Compilation> {
        match self.compilation.take() {
            Some(compilation) => compilation,
            None => Arc::new(SourceCompilation::new(std::mem::take(&mut self.parts))),
        }
    }

    /// Build the module.
    #[must_use]
    pub fn build(mut self) -> Module {
        let compilation = self.take_compilation();
        let identity = ModuleIdentity::new(
            self.name.clone(),
            self.location.clone(),
            self.containing_assembly,
        );
        Module::from_parts(
            identity,
            self.name,
            self.location,
            self.kind,
            self.entry_point,
            self.assembly_references,
            self.module_references,
            self.attributes,
            self.win32_resources,
            self.options,
            compilation,
        )
    }
}
