//! Factory methods for units.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use crate::metadata::{
    code::{MethodBody, StatementRc},
    host::UnitLoader,
    identity::AssemblyVersion,
    namespace::{MethodDefinition, NamespaceDeclaration, TypeDefinition},
    unit::{Assembly, AssemblyBuilder, CompilationPart, ModuleBuilder, ModuleOptions, Unit, UnitRc},
};

/// A core library at `/bin/<name>.dll` declaring `System.Object` and `System.String`.
pub fn core_library(name: &str, version: AssemblyVersion, runtime: Option<&str>) -> Assembly {
    let system = NamespaceDeclaration::new("System")
        .with_type(TypeDefinition::new("System", "Object"))
        .with_type(TypeDefinition::new("System", "String"));
    let root = NamespaceDeclaration::new("").with_namespace(system);

    let options = match runtime {
        Some(runtime) => ModuleOptions::with_runtime(runtime),
        None => ModuleOptions::default(),
    };

    AssemblyBuilder::new(name, format!("/bin/{name}.dll"))
        .version(version)
        .options(options)
        .part(CompilationPart::new(format!("{name}.cs"), Arc::new(root)))
        .build()
}

/// Loads `/bin/Lib.dll` and nothing else, counting calls.
#[derive(Debug, Default)]
pub struct TestLoader {
    loads: AtomicUsize,
}

impl TestLoader {
    /// How often [`UnitLoader::load`] found a unit.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl UnitLoader for TestLoader {
    fn load(&self, location: &str) -> Option<Unit> {
        if location != "/bin/Lib.dll" {
            return None;
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        Some(AssemblyBuilder::new("Lib", location).build().into())
    }
}

/// A module at `location` with one type `Tests.Program` holding `methods`.
pub fn module_with_methods_at(location: &str, methods: Vec<MethodDefinition>) -> UnitRc {
    let program = methods
        .into_iter()
        .fold(TypeDefinition::new("Tests", "Program"), TypeDefinition::with_method);
    let root = NamespaceDeclaration::new("")
        .with_namespace(NamespaceDeclaration::new("Tests").with_type(program));

    let module = ModuleBuilder::new("Tests.dll", location)
        .part(CompilationPart::new("Program.cs", Arc::new(root)))
        .build();
    Arc::new(module.into())
}

/// A module at `/bin/Tests.dll` with one type `Tests.Program` holding `methods`.
pub fn module_with_methods(methods: Vec<MethodDefinition>) -> UnitRc {
    module_with_methods_at("/bin/Tests.dll", methods)
}

/// A module at `location` whose method `Tests.Program::Run` has the given body.
pub fn module_at(location: &str, statements: Vec<StatementRc>) -> UnitRc {
    module_with_methods_at(
        location,
        vec![MethodDefinition::new("Run", Some(MethodBody::new(statements)))],
    )
}

/// A module at `/bin/Tests.dll` whose method `Tests.Program::Run` has the given body.
pub fn module_with_statements(statements: Vec<StatementRc>) -> UnitRc {
    module_at("/bin/Tests.dll", statements)
}
