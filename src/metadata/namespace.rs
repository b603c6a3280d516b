//! Namespaces, type definitions and method definitions of a unit.
//!
//! Every compilation part of a module contributes one root [`NamespaceDeclaration`].
//! The [`RootNamespace`] of a module is the fold of all of them, in declaration
//! order: looking up a name consults every declaration, so a namespace that is
//! spread over several source files behaves as one.
//!
//! # Key Components
//!
//! - [`RootNamespace`] - The folded top-level namespace of a module
//! - [`NamespaceDeclaration`] - One (possibly partial) namespace declaration
//! - [`TypeDefinition`] - A type with nested types and methods
//! - [`MethodDefinition`] - A method with an optional body

use std::sync::Arc;

use crate::metadata::{code::MethodBody, references::TypeReference};

/// A method defined by a type.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDefinition {
    /// Method name.
    pub name: String,
    /// Parameter types.
    pub parameters: Vec<TypeReference>,
    /// Return type, `None` for `void`.
    pub return_type: Option<TypeReference>,
    /// Whether the method is static.
    pub is_static: bool,
    /// The body, `None` for abstract or extern methods.
    pub body: Option<MethodBody>,
}

/// A reference-counted pointer to a [`MethodDefinition`].
pub type MethodDefinitionRc = Arc<MethodDefinition>;

impl MethodDefinition {
    /// A parameterless static `void` method with the given body.
    pub fn new(name: impl Into<String>, body: Option<MethodBody>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: None,
            is_static: true,
            body,
        }
    }
}

/// A type defined in a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    /// Dotted namespace, empty for nested types and the global namespace.
    pub namespace: String,
    /// Simple name.
    pub name: String,
    /// Types nested in this type, in declaration order.
    pub nested_types: Vec<TypeDefinitionRc>,
    /// Methods in declaration order.
    pub methods: Vec<MethodDefinitionRc>,
}

/// A reference-counted pointer to a [`TypeDefinition`].
pub type TypeDefinitionRc = Arc<TypeDefinition>;

impl TypeDefinition {
    /// An empty type.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            nested_types: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Add a method.
    #[must_use]
    pub fn with_method(mut self, method: MethodDefinition) -> Self {
        self.methods.push(Arc::new(method));
        self
    }

    /// Add a nested type.
    #[must_use]
    pub fn with_nested(mut self, nested: TypeDefinition) -> Self {
        self.nested_types.push(Arc::new(nested));
        self
    }

    /// Namespace-qualified name.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

/// A member of a namespace declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum NamespaceMember {
    /// A nested namespace declaration
    Namespace(NamespaceDeclarationRc),
    /// A type
    Type(TypeDefinitionRc),
}

impl NamespaceMember {
    /// The simple name of the member.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            NamespaceMember::Namespace(namespace) => &namespace.name,
            NamespaceMember::Type(ty) => &ty.name,
        }
    }
}

/// One namespace declaration, as contributed by a single compilation part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamespaceDeclaration {
    /// Simple name, empty for a root declaration.
    pub name: String,
    /// Members in declaration order.
    pub members: Vec<NamespaceMember>,
}

/// A reference-counted pointer to a [`NamespaceDeclaration`].
pub type NamespaceDeclarationRc = Arc<NamespaceDeclaration>;

impl NamespaceDeclaration {
    /// An empty declaration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Add a nested namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: NamespaceDeclaration) -> Self {
        self.members
            .push(NamespaceMember::Namespace(Arc::new(namespace)));
        self
    }

    /// Add a type.
    #[must_use]
    pub fn with_type(mut self, ty: TypeDefinition) -> Self {
        self.members.push(NamespaceMember::Type(Arc::new(ty)));
        self
    }

    /// Members with the given simple name.
    pub fn members_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a NamespaceMember> {
        self.members.iter().filter(move |member| member.name() == name)
    }
}

/// The top-level namespace of a module, folded over all compilation parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootNamespace {
    declarations: Vec<NamespaceDeclarationRc>,
}

impl RootNamespace {
    /// An empty root namespace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the root declaration of one compilation part.
    pub fn add_declaration(&mut self, declaration: NamespaceDeclarationRc) {
        self.declarations.push(declaration);
    }

    /// The folded declarations, in order.
    #[must_use]
    pub fn declarations(&self) -> &[NamespaceDeclarationRc] {
        &self.declarations
    }

    /// All top-level members with the given name, across every declaration.
    #[must_use]
    pub fn members_named(&self, name: &str) -> Vec<&NamespaceMember> {
        self.declarations
            .iter()
            .flat_map(|declaration| declaration.members.iter())
            .filter(|member| member.name() == name)
            .collect()
    }

    /// All declarations of the nested namespace at `path`, e.g. `["Microsoft", "Contracts"]`.
    ///
    /// A namespace that is declared in several places yields several declarations.
    #[must_use]
    pub fn namespaces_at<S: AsRef<str>>(&self, path: &[S]) -> Vec<&NamespaceDeclarationRc> {
        let mut current: Vec<&NamespaceDeclarationRc> = self.declarations.iter().collect();
        for segment in path {
            let segment = segment.as_ref();
            current = current
                .into_iter()
                .flat_map(|declaration| declaration.members.iter())
                .filter_map(|member| match member {
                    NamespaceMember::Namespace(namespace) if namespace.name == segment => Some(namespace),
                    _ => None,
                })
                .collect();
        }
        current
    }

    /// Returns true if a type `name` is declared directly in the namespace at `path`.
    #[must_use]
    pub fn contains_type<S: AsRef<str>>(&self, path: &[S], name: &str) -> bool {
        self.namespaces_at(path).iter().any(|namespace| {
            namespace
                .members_named(name)
                .any(|member| matches!(member, NamespaceMember::Type(_)))
        })
    }

    /// Look up a top-level type by its dotted full name, e.g. `System.Object`.
    #[must_use]
    pub fn find_type(&self, full_name: &str) -> Option<TypeDefinitionRc> {
        let (path, name) = match full_name.rsplit_once('.') {
            Some((namespace, name)) => (namespace.split('.').collect::<Vec<_>>(), name),
            None => (Vec::new(), full_name),
        };

        self.namespaces_at(&path).into_iter().find_map(|namespace| {
            namespace.members_named(name).find_map(|member| match member {
                NamespaceMember::Type(ty) => Some(ty.clone()),
                NamespaceMember::Namespace(_) => None,
            })
        })
    }

    /// Every type reachable from this namespace, depth-first.
    ///
    /// Each type is immediately followed by its nested types.
    #[must_use]
    pub fn types(&self) -> Vec<TypeDefinitionRc> {
        let mut types = Vec::new();
        for declaration in &self.declarations {
            collect_namespace_types(declaration, &mut types);
        }
        types
    }
}

fn collect_namespace_types(declaration: &NamespaceDeclaration, out: &mut Vec<TypeDefinitionRc>) {
    for member in &declaration.members {
        match member {
            NamespaceMember::Namespace(namespace) => collect_namespace_types(namespace, out),
            NamespaceMember::Type(ty) => collect_type(ty, out),
        }
    }
}

fn collect_type(ty: &TypeDefinitionRc, out: &mut Vec<TypeDefinitionRc>) {
    out.push(ty.clone());
    for nested in &ty.nested_types {
        collect_type(nested, out);
    }
}
