use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    metadata::{
        host::UnitLoader,
        identity::{resolve_marker_assembly_identity, AssemblyIdentity, MarkerType, UnitIdentity},
        unit::{Assembly, Module, Unit, UnitId, UnitRc, UnitReference},
    },
    Error, Result,
};

/// Runtime version reported when the core assembly cannot be determined.
pub const BAD_TARGET_RUNTIME: &str = "bad target runtime";

/// Append-only store of units.
///
/// Units are addressed by [`UnitId`] and indexed by identity and by location.
/// Insertion is thread-safe; a unit is never removed once inserted.
#[derive(Debug, Default)]
pub struct UnitArena {
    units: boxcar::Vec<UnitRc>,
    by_identity: DashMap<UnitIdentity, UnitId>,
    by_location: DashMap<String, UnitId>,
}

impl UnitArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit and returns its id.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateUnit`] if a unit with the same identity is already present.
    pub fn insert(&self, unit: impl Into<Unit>) -> Result<UnitId> {
        let unit: UnitRc = std::sync::Arc::new(unit.into());
        let identity = unit.identity();

        match self.by_identity.entry(identity) {
            Entry::Occupied(existing) => Err(Error::DuplicateUnit(existing.key().to_string())),
            Entry::Vacant(slot) => {
                let index = self.units.push(unit.clone());
                let id = UnitId(u32::try_from(index).map_err(|_| {
                    Error::Error(format!("Unit arena is full ({index} units)"))
                })?);

                if !unit.location().is_empty() {
                    self.by_location.insert(unit.location().to_string(), id);
                }
                slot.insert(id);

                tracing::debug!(unit = %unit.name(), id = %id, "registered unit");
                Ok(id)
            }
        }
    }

    /// The unit with the given id.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&UnitRc> {
        self.units.get(id.index())
    }

    /// The id of the unit with the given identity.
    #[must_use]
    pub fn find(&self, identity: &UnitIdentity) -> Option<UnitId> {
        self.by_identity.get(identity).map(|id| *id)
    }

    /// The id of the unit loaded from `location`.
    #[must_use]
    pub fn find_by_location(&self, location: &str) -> Option<UnitId> {
        self.by_location.get(location).map(|id| *id)
    }

    /// The target of a unit reference, or `None` if it is not in this arena.
    #[must_use]
    pub fn resolve(&self, reference: &UnitReference) -> Option<UnitId> {
        match reference {
            UnitReference::Resolved(id) => self.get(*id).map(|_| *id),
            UnitReference::Unresolved(identity) => self.find(identity),
        }
    }

    /// The referenced module; `None` if absent.
    #[must_use]
    pub fn resolve_module(&self, reference: &UnitReference) -> Option<&Module> {
        let id = self.resolve(reference)?;
        self.get(id).map(|unit| unit.module())
    }

    /// The referenced assembly; `None` if absent or not an assembly.
    #[must_use]
    pub fn resolve_assembly(&self, reference: &UnitReference) -> Option<&Assembly> {
        let id = self.resolve(reference)?;
        self.get(id).and_then(|unit| unit.as_assembly())
    }

    /// The assembly containing the unit `id`. An assembly contains itself.
    #[must_use]
    pub fn containing_assembly(&self, id: UnitId) -> Option<UnitId> {
        match self.get(id)?.as_ref() {
            Unit::Assembly(_) => Some(id),
            Unit::Module(module) => {
                let assembly = module.identity().containing_assembly.clone()?;
                self.find(&UnitIdentity::Assembly(assembly))
            }
        }
    }

    /// Loads the unit at `location` through `loader`.
    ///
    /// A location that was loaded before returns the existing id. Returns `None`
    /// if the loader cannot find the unit.
    pub fn load(&self, loader: &dyn UnitLoader, location: &str) -> Option<UnitId> {
        if let Some(id) = self.find_by_location(location) {
            return Some(id);
        }

        let unit = loader.load(location)?;
        let identity = unit.identity();
        match self.insert(unit) {
            Ok(id) => Some(id),
            Err(Error::DuplicateUnit(_)) => self.find(&identity),
            Err(error) => {
                tracing::warn!(location, %error, "failed to register loaded unit");
                None
            }
        }
    }

    /// The identity of the core assembly (the one defining `System.Object`) as
    /// seen from unit `id`. Memoized per unit.
    #[must_use]
    pub fn core_assembly_identity(&self, id: UnitId) -> AssemblyIdentity {
        resolve_marker_assembly_identity(self, id, &MarkerType::core())
    }

    /// The identity of the contract assembly (the one defining
    /// `Microsoft.Contracts.Contract`) as seen from unit `id`. Memoized per unit.
    #[must_use]
    pub fn contract_assembly_identity(&self, id: UnitId) -> AssemblyIdentity {
        resolve_marker_assembly_identity(self, id, &MarkerType::contract())
    }

    /// The runtime version unit `id` targets.
    ///
    /// An explicit value in the module options wins; otherwise the explicit value of
    /// the core assembly's module is used, and failing that [`BAD_TARGET_RUNTIME`].
    #[must_use]
    pub fn target_runtime_version(&self, id: UnitId) -> String {
        let Some(unit) = self.get(id) else {
            return BAD_TARGET_RUNTIME.to_string();
        };
        if let Some(version) = &unit.module().options().target_runtime_version {
            return version.clone();
        }

        let core = self.core_assembly_identity(id);
        if core.is_dummy() {
            return BAD_TARGET_RUNTIME.to_string();
        }

        self.find(&UnitIdentity::Assembly(core))
            .and_then(|core_id| self.get(core_id))
            .and_then(|core| core.module().options().target_runtime_version.clone())
            .unwrap_or_else(|| BAD_TARGET_RUNTIME.to_string())
    }

    /// Number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.count()
    }

    /// Returns true if the arena holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All units with their ids, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (UnitId, &UnitRc)> {
        self.units.iter().filter_map(|(index, unit)| {
            u32::try_from(index).ok().map(|index| (UnitId(index), unit))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{
            identity::AssemblyVersion,
            unit::{AssemblyBuilder, ModuleBuilder, ModuleOptions},
        },
        test::factories::unit::{core_library, TestLoader},
    };

    #[test]
    fn test_insert_and_lookup() {
        let arena = UnitArena::new();
        let id = arena
            .insert(AssemblyBuilder::new("Lib", "/bin/Lib.dll").build())
            .unwrap();

        let unit = arena.get(id).unwrap();
        assert_eq!(unit.name(), "Lib");
        assert_eq!(arena.find(&unit.identity()), Some(id));
        assert_eq!(arena.find_by_location("/bin/Lib.dll"), Some(id));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_insert_duplicate_identity() {
        let arena = UnitArena::new();
        arena
            .insert(AssemblyBuilder::new("Lib", "/a/Lib.dll").build())
            .unwrap();
        let result = arena.insert(AssemblyBuilder::new("Lib", "/b/Lib.dll").build());
        assert!(matches!(result, Err(Error::DuplicateUnit(_))));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_resolve_narrowing() {
        let arena = UnitArena::new();
        let assembly = arena
            .insert(AssemblyBuilder::new("Lib", "/bin/Lib.dll").build())
            .unwrap();
        let module = arena
            .insert(ModuleBuilder::new("Extra.netmodule", "/bin/Extra.netmodule").build())
            .unwrap();

        let to_assembly = UnitReference::Resolved(assembly);
        let to_module = UnitReference::Resolved(module);
        let missing = UnitReference::Unresolved(UnitIdentity::Assembly(AssemblyIdentity::new(
            "Missing",
            AssemblyVersion::new(1, 0, 0, 0),
            "",
            vec![],
        )));

        assert!(arena.resolve_assembly(&to_assembly).is_some());
        assert!(arena.resolve_module(&to_assembly).is_some());
        assert!(arena.resolve_assembly(&to_module).is_none());
        assert!(arena.resolve_module(&to_module).is_some());
        assert!(arena.resolve(&missing).is_none());
        assert!(arena.resolve_module(&missing).is_none());
        assert!(arena
            .resolve(&UnitReference::Resolved(UnitId(42)))
            .is_none());
    }

    #[test]
    fn test_containing_assembly() {
        let arena = UnitArena::new();
        let assembly = AssemblyBuilder::new("Lib", "/bin/Lib.dll").build();
        let identity = assembly.identity().clone();
        let assembly = arena.insert(assembly).unwrap();
        let module = arena
            .insert(
                ModuleBuilder::new("Extra.netmodule", "/bin/Extra.netmodule")
                    .containing_assembly(identity)
                    .build(),
            )
            .unwrap();
        let orphan = arena
            .insert(ModuleBuilder::new("Orphan.netmodule", "").build())
            .unwrap();

        assert_eq!(arena.containing_assembly(assembly), Some(assembly));
        assert_eq!(arena.containing_assembly(module), Some(assembly));
        assert_eq!(arena.containing_assembly(orphan), None);
    }

    #[test]
    fn test_load_reuses_location() {
        let arena = UnitArena::new();
        let loader = TestLoader::default();

        let first = arena.load(&loader, "/bin/Lib.dll").unwrap();
        let second = arena.load(&loader, "/bin/Lib.dll").unwrap();
        assert_eq!(first, second);
        assert_eq!(loader.loads(), 1);
        assert!(arena.load(&loader, "/missing.dll").is_none());
    }

    #[test]
    fn test_target_runtime_version() {
        let arena = UnitArena::new();
        let core = arena
            .insert(core_library("mscorlib", AssemblyVersion::new(4, 0, 0, 0), Some("v4.0.30319")))
            .unwrap();
        let app = arena
            .insert(
                AssemblyBuilder::new("App", "/bin/App.dll")
                    .assembly_reference(UnitReference::Resolved(core))
                    .build(),
            )
            .unwrap();
        let explicit = arena
            .insert(
                AssemblyBuilder::new("Explicit", "/bin/Explicit.dll")
                    .options(ModuleOptions::with_runtime("v2.0.50727"))
                    .build(),
            )
            .unwrap();
        let lonely = arena
            .insert(AssemblyBuilder::new("Lonely", "/bin/Lonely.dll").build())
            .unwrap();

        assert_eq!(arena.target_runtime_version(app), "v4.0.30319");
        assert_eq!(arena.target_runtime_version(explicit), "v2.0.50727");
        assert_eq!(arena.target_runtime_version(lonely), BAD_TARGET_RUNTIME);
    }
}
