//! Symbolic references to types and methods.
//!
//! References are plain values: they name a type or method by the identity of the
//! unit that defines it plus the names and signature components needed to tell
//! overloads apart. They are what call sites point at and what the interning table
//! hands out keys for. A reference is never traversed by the rewrite walk, it is
//! only read.
//!
//! # Key Components
//!
//! - [`TypeReference`] - Namespace-qualified type in a defining unit
//! - [`MethodReference`] - Method on a declaring type with its full signature
//! - [`CallingConvention`] - Calling convention flags of a method signature
//! - [`PlatformTypes`] - Well-known types of the core assembly

use std::fmt;

use bitflags::bitflags;

use crate::metadata::{
    identity::{AssemblyIdentity, UnitIdentity},
    unit::{UnitArena, UnitId},
};

/// A reference to a named type defined in some unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeReference {
    /// The unit that defines the type.
    pub unit: UnitIdentity,
    /// Dotted namespace, empty for the global namespace.
    pub namespace: String,
    /// Simple type name.
    pub name: String,
    /// Number of generic parameters.
    pub generic_parameter_count: u16,
}

impl TypeReference {
    /// Create a reference to a non-generic type.
    pub fn new(
        unit: impl Into<UnitIdentity>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            unit: unit.into(),
            namespace: namespace.into(),
            name: name.into(),
            generic_parameter_count: 0,
        }
    }

    /// Namespace-qualified name, e.g. `Xunit.Assert`.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]{}", self.unit.name(), self.full_name())
    }
}

bitflags! {
    /// Calling convention flags of a method signature.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CallingConvention: u8 {
        /// Managed default convention
        const DEFAULT = 0x00;
        /// Variable argument list
        const VARARG = 0x05;
        /// Generic method
        const GENERIC = 0x10;
        /// Instance method, an implicit `this` is passed
        const HAS_THIS = 0x20;
        /// `this` is passed explicitly as the first parameter
        const EXPLICIT_THIS = 0x40;
    }
}

/// A reference to a method: declaring type, name and signature.
///
/// Equality and hashing are structural, so two references built independently for
/// the same overload are the same symbol and receive the same interned key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodReference {
    /// The type declaring the method.
    pub declaring_type: TypeReference,
    /// Method name.
    pub name: String,
    /// Calling convention flags.
    pub calling_convention: CallingConvention,
    /// Return type.
    pub return_type: TypeReference,
    /// Number of generic method parameters.
    pub generic_parameter_count: u16,
    /// Parameter types in declaration order.
    pub parameters: Vec<TypeReference>,
}

impl MethodReference {
    /// Create a reference to a non-generic method with the default calling convention.
    pub fn new(
        declaring_type: TypeReference,
        name: impl Into<String>,
        return_type: TypeReference,
        parameters: Vec<TypeReference>,
    ) -> Self {
        Self {
            declaring_type,
            name: name.into(),
            calling_convention: CallingConvention::DEFAULT,
            return_type,
            generic_parameter_count: 0,
            parameters,
        }
    }

    /// Returns a copy of this reference with one more trailing parameter.
    #[must_use]
    pub fn with_extra_parameter(&self, parameter: TypeReference) -> Self {
        let mut overload = self.clone();
        overload.parameters.push(parameter);
        overload
    }
}

impl fmt::Display for MethodReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}(", self.declaring_type.full_name(), self.name)?;
        for (i, parameter) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&parameter.full_name())?;
        }
        f.write_str(")")
    }
}

/// Well-known types defined by the core assembly (the one defining `System.Object`).
#[derive(Debug, Clone)]
pub struct PlatformTypes {
    core: AssemblyIdentity,
}

impl PlatformTypes {
    /// Platform types anchored at the given core assembly.
    #[must_use]
    pub fn new(core: AssemblyIdentity) -> Self {
        Self { core }
    }

    /// Platform types of the core assembly that `unit` resolves to.
    ///
    /// Falls back to the dummy identity when no referenced unit defines `System.Object`.
    #[must_use]
    pub fn for_unit(arena: &UnitArena, unit: UnitId) -> Self {
        Self::new(arena.core_assembly_identity(unit))
    }

    /// The identity of the core assembly.
    #[must_use]
    pub fn core_assembly(&self) -> &AssemblyIdentity {
        &self.core
    }

    fn system(&self, name: &str) -> TypeReference {
        TypeReference::new(self.core.clone(), "System", name)
    }

    /// `System.Object`
    #[must_use]
    pub fn system_object(&self) -> TypeReference {
        self.system("Object")
    }

    /// `System.Void`
    #[must_use]
    pub fn system_void(&self) -> TypeReference {
        self.system("Void")
    }

    /// `System.Boolean`
    #[must_use]
    pub fn system_boolean(&self) -> TypeReference {
        self.system("Boolean")
    }

    /// `System.Int32`
    #[must_use]
    pub fn system_int32(&self) -> TypeReference {
        self.system("Int32")
    }

    /// `System.String`
    #[must_use]
    pub fn system_string(&self) -> TypeReference {
        self.system("String")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::identity::AssemblyVersion;

    fn platform() -> PlatformTypes {
        PlatformTypes::new(AssemblyIdentity::new(
            "mscorlib",
            AssemblyVersion::new(4, 0, 0, 0),
            "",
            vec![],
        ))
    }

    #[test]
    fn test_type_reference_full_name() {
        let platform = platform();
        assert_eq!(platform.system_boolean().full_name(), "System.Boolean");

        let global = TypeReference::new(platform.core_assembly().clone(), "", "<Module>");
        assert_eq!(global.full_name(), "<Module>");
    }

    #[test]
    fn test_method_reference_structural_equality() {
        let platform = platform();
        let assert_type = TypeReference::new(platform.core_assembly().clone(), "Xunit", "Assert");

        let a = MethodReference::new(
            assert_type.clone(),
            "True",
            platform.system_void(),
            vec![platform.system_boolean()],
        );
        let b = MethodReference::new(
            assert_type,
            "True",
            platform.system_void(),
            vec![platform.system_boolean()],
        );
        assert_eq!(a, b);

        let overload = a.with_extra_parameter(platform.system_string());
        assert_ne!(a, overload);
        assert_eq!(overload.parameters.len(), 2);
        assert_eq!(
            overload.to_string(),
            "Xunit.Assert::True(System.Boolean, System.String)"
        );
    }
}
