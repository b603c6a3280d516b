//! Assemblies: a manifest module plus assembly-level metadata.
//!
//! Every assembly is also a module whose containing assembly is itself. The
//! assembly-only fields default to empty values (culture-neutral, no flags, no
//! public key, version `0.0.0.0`) and each can be overridden independently through
//! [`AssemblyBuilder`].

use std::sync::Arc;

use bitflags::bitflags;

use crate::metadata::{
    identity::{AssemblyIdentity, AssemblyVersion},
    references::{MethodReference, TypeReference},
    unit::{
        module::{
            Compilation, CompilationPart, CustomAttribute, Module, ModuleBuilder, ModuleKind,
            ModuleOptions, Win32Resource,
        },
        UnitReference,
    },
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Assembly flags, ECMA-335 II.23.1.2
    pub struct AssemblyFlags : u32 {
        /// The assembly reference holds the full (unhashed) public key
        const PUBLIC_KEY = 0x0001;
        /// The implementation of this assembly used at runtime is not expected to match the version seen at compile time
        const RETARGETABLE = 0x0100;
        /// Reserved: the JIT should not generate optimized code
        const DISABLE_JIT_COMPILE_OPTIMIZER = 0x4000;
        /// Reserved: the JIT should track debug data
        const ENABLE_JIT_COMPILE_TRACKING = 0x8000;
    }
}

/// A manifest resource of an assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReference {
    /// Resource name.
    pub name: String,
    /// Whether the resource is visible outside the assembly.
    pub is_public: bool,
}

/// A file belonging to a multi-file assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    /// File name.
    pub name: String,
    /// Whether the file carries metadata.
    pub has_metadata: bool,
    /// Hash of the file contents.
    pub hash: Vec<u8>,
}

/// A declarative security attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityAttribute {
    /// The security action code.
    pub action: u16,
    /// The permission attributes.
    pub attributes: Vec<CustomAttribute>,
}

/// A type forwarded to or exported from another unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedType {
    /// The type being exported.
    pub target: TypeReference,
}

/// A compiled assembly.
#[derive(Debug)]
pub struct Assembly {
    pub(crate) module: Module,
    identity: AssemblyIdentity,
    culture: String,
    flags: AssemblyFlags,
    version: AssemblyVersion,
    public_key: Vec<u8>,
    resources: Vec<ResourceReference>,
    files: Vec<FileReference>,
    security_attributes: Vec<SecurityAttribute>,
    exported_types: Vec<ExportedType>,
    attributes: Vec<CustomAttribute>,
    aliases: Vec<String>,
}

impl Assembly {
    /// The manifest module.
    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// The identity of this assembly.
    #[must_use]
    pub fn identity(&self) -> &AssemblyIdentity {
        &self.identity
    }

    /// The culture, empty for culture-neutral assemblies.
    #[must_use]
    pub fn culture(&self) -> &str {
        &self.culture
    }

    /// Assembly flags.
    #[must_use]
    pub fn flags(&self) -> AssemblyFlags {
        self.flags
    }

    /// The assembly version.
    #[must_use]
    pub fn version(&self) -> AssemblyVersion {
        self.version
    }

    /// The full public key, empty if not strong-named.
    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// The public key token derived from [`Assembly::public_key`].
    #[must_use]
    pub fn public_key_token(&self) -> &[u8] {
        &self.identity.public_key_token
    }

    /// Manifest resources.
    #[must_use]
    pub fn resources(&self) -> &[ResourceReference] {
        &self.resources
    }

    /// Files of a multi-file assembly.
    #[must_use]
    pub fn files(&self) -> &[FileReference] {
        &self.files
    }

    /// Declarative security attributes.
    #[must_use]
    pub fn security_attributes(&self) -> &[SecurityAttribute] {
        &self.security_attributes
    }

    /// Exported and forwarded types.
    #[must_use]
    pub fn exported_types(&self) -> &[ExportedType] {
        &self.exported_types
    }

    /// Assembly-level custom attributes.
    #[must_use]
    pub fn attributes(&self) -> &[CustomAttribute] {
        &self.attributes
    }

    /// Extern aliases the assembly is referenced under.
    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The image kind: a console application if there is an entry point, a library
    /// otherwise, unless set explicitly.
    #[must_use]
    pub fn kind(&self) -> ModuleKind {
        match (self.module.kind, &self.module.entry_point) {
            (Some(kind), _) => kind,
            (None, Some(_)) => ModuleKind::ConsoleApplication,
            (None, None) => ModuleKind::DynamicallyLinkedLibrary,
        }
    }

    /// A copy of this assembly over another compilation.
    #[must_use]
    pub fn with_compilation(&self, compilation: Arc<dyn Compilation>) -> Self {
        Self {
            module: self.module.with_compilation(compilation),
            identity: self.identity.clone(),
            culture: self.culture.clone(),
            flags: self.flags,
            version: self.version,
            public_key: self.public_key.clone(),
            resources: self.resources.clone(),
            files: self.files.clone(),
            security_attributes: self.security_attributes.clone(),
            exported_types: self.exported_types.clone(),
            attributes: self.attributes.clone(),
            aliases: self.aliases.clone(),
        }
    }
}

/// Builder for [`Assembly`].
///
/// ```rust
/// use dotmutate::metadata::identity::AssemblyVersion;
/// use dotmutate::metadata::unit::AssemblyBuilder;
///
/// let assembly = AssemblyBuilder::new("Lib", "/bin/Lib.dll")
///     .version(AssemblyVersion::new(1, 2, 0, 0))
///     .build();
///
/// assert_eq!(assembly.identity().version, AssemblyVersion::new(1, 2, 0, 0));
/// assert!(assembly.culture().is_empty());
/// assert!(assembly.public_key_token().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct AssemblyBuilder {
    module: ModuleBuilder,
    culture: String,
    flags: AssemblyFlags,
    version: AssemblyVersion,
    public_key: Vec<u8>,
    resources: Vec<ResourceReference>,
    files: Vec<FileReference>,
    security_attributes: Vec<SecurityAttribute>,
    exported_types: Vec<ExportedType>,
    attributes: Vec<CustomAttribute>,
    aliases: Vec<String>,
}

impl AssemblyBuilder {
    /// Start an assembly with the given simple name and location.
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            module: ModuleBuilder::new(name, location),
            ..Self::default()
        }
    }

    /// Set the culture.
    #[must_use]
    pub fn culture(mut self, culture: impl Into<String>) -> Self {
        self.culture = culture.into();
        self
    }

    /// Set the flags.
    #[must_use]
    pub fn flags(mut self, flags: AssemblyFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the version.
    #[must_use]
    pub fn version(mut self, version: AssemblyVersion) -> Self {
        self.version = version;
        self
    }

    /// Set the full public key; the token is derived from it.
    #[must_use]
    pub fn public_key(mut self, public_key: Vec<u8>) -> Self {
        self.public_key = public_key;
        self
    }

    /// Add a manifest resource.
    #[must_use]
    pub fn resource(mut self, resource: ResourceReference) -> Self {
        self.resources.push(resource);
        self
    }

    /// Add a file.
    #[must_use]
    pub fn file(mut self, file: FileReference) -> Self {
        self.files.push(file);
        self
    }

    /// Add a security attribute.
    #[must_use]
    pub fn security_attribute(mut self, attribute: SecurityAttribute) -> Self {
        self.security_attributes.push(attribute);
        self
    }

    /// Add an exported type.
    #[must_use]
    pub fn exported_type(mut self, exported: ExportedType) -> Self {
        self.exported_types.push(exported);
        self
    }

    /// Add an assembly-level custom attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add an alias.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Set the entry point.
    #[must_use]
    pub fn entry_point(mut self, method: MethodReference) -> Self {
        self.module = self.module.entry_point(method);
        self
    }

    /// Set the image kind explicitly.
    #[must_use]
    pub fn kind(mut self, kind: ModuleKind) -> Self {
        self.module = self.module.kind(kind);
        self
    }

    /// Add an assembly reference.
    #[must_use]
    pub fn assembly_reference(mut self, reference: UnitReference) -> Self {
        self.module = self.module.assembly_reference(reference);
        self
    }

    /// Add a module reference.
    #[must_use]
    pub fn module_reference(mut self, reference: UnitReference) -> Self {
        self.module = self.module.module_reference(reference);
        self
    }

    /// Add a module-level custom attribute.
    #[must_use]
    pub fn module_attribute(mut self, attribute: CustomAttribute) -> Self {
        self.module = self.module.attribute(attribute);
        self
    }

    /// Add a Win32 resource.
    #[must_use]
    pub fn win32_resource(mut self, resource: Win32Resource) -> Self {
        self.module = self.module.win32_resource(resource);
        self
    }

    /// Replace the PE-level options.
    #[must_use]
    pub fn options(mut self, options: ModuleOptions) -> Self {
        self.module = self.module.options(options);
        self
    }

    /// Add a compilation part.
    #[must_use]
    pub fn part(mut self, part: CompilationPart) -> Self {
        self.module = self.module.part(part);
        self
    }

    /// Use an explicit compilation.
    #[must_use]
    pub fn compilation(mut self, compilation: Arc<dyn Compilation>) -> Self {
        self.module = self.module.compilation(compilation);
        self
    }

    /// Build the assembly.
    #[must_use]
    pub fn build(self) -> Assembly {
        let identity = AssemblyIdentity::from_public_key(
            self.module.name.clone(),
            self.version,
            self.culture.clone(),
            &self.public_key,
        )
        .with_location(self.module.location.clone());

        let module = self.module.containing_assembly(identity.clone()).build();

        Assembly {
            module,
            identity,
            culture: self.culture,
            flags: self.flags,
            version: self.version,
            public_key: self.public_key,
            resources: self.resources,
            files: self.files,
            security_attributes: self.security_attributes,
            exported_types: self.exported_types,
            attributes: self.attributes,
            aliases: self.aliases,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::references::PlatformTypes;

    #[test]
    fn test_assembly_defaults() {
        let assembly = AssemblyBuilder::new("Lib", "/bin/Lib.dll").build();

        assert!(assembly.culture().is_empty());
        assert_eq!(assembly.flags(), AssemblyFlags::empty());
        assert!(assembly.public_key().is_empty());
        assert!(assembly.public_key_token().is_empty());
        assert!(assembly.version().is_unknown());
        assert!(assembly.security_attributes().is_empty());
        assert!(assembly.exported_types().is_empty());
        assert!(assembly.aliases().is_empty());
        assert_eq!(assembly.kind(), ModuleKind::DynamicallyLinkedLibrary);
    }

    #[test]
    fn test_assembly_is_its_own_containing_assembly() {
        let assembly = AssemblyBuilder::new("Lib", "/bin/Lib.dll").build();
        assert_eq!(
            assembly.module().identity().containing_assembly.as_ref(),
            Some(assembly.identity())
        );
        assert_eq!(assembly.identity().location, "/bin/Lib.dll");
    }

    #[test]
    fn test_assembly_overrides_independent() {
        let ecma_key = vec![0, 0, 0, 0, 0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0];
        let assembly = AssemblyBuilder::new("Lib", "/bin/Lib.dll")
            .culture("de-DE")
            .public_key(ecma_key)
            .build();

        assert_eq!(assembly.culture(), "de-DE");
        assert_eq!(hex::encode(assembly.public_key_token()), "b77a5c561934e089");
        assert!(assembly.version().is_unknown());
        assert_eq!(assembly.flags(), AssemblyFlags::empty());
    }

    #[test]
    fn test_assembly_kind_follows_entry_point() {
        let platform = PlatformTypes::new(AssemblyIdentity::dummy());
        let program = TypeReference::new(AssemblyIdentity::dummy(), "", "Program");
        let main = MethodReference::new(program, "Main", platform.system_void(), vec![]);

        let exe = AssemblyBuilder::new("App", "/bin/App.exe")
            .entry_point(main)
            .build();
        assert_eq!(exe.kind(), ModuleKind::ConsoleApplication);

        let forced = AssemblyBuilder::new("Gui", "/bin/Gui.exe")
            .kind(ModuleKind::WindowsApplication)
            .build();
        assert_eq!(forced.kind(), ModuleKind::WindowsApplication);
    }
}
