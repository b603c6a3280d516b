//! Marker-assembly resolution.
//!
//! Some referenced units play a platform role: the *core* assembly is the one that
//! defines `System.Object`, the *contract* assembly the one that defines
//! `Microsoft.Contracts.Contract`. Which assembly plays the role is decided by
//! looking at what the unit references, transitively, and arbitrating by version.
//!
//! # Algorithm
//!
//! For unit `U`, every reference of `U` is visited in declaration order. Each
//! referenced unit that can be resolved gives its own answer (computed the same
//! way, recursively). Answers with an empty name are ignored; among the remaining
//! ones the first with the strictly highest version wins, so a tie keeps the
//! earlier reference. If no reference produced an answer and `U` is itself an
//! assembly whose namespace tree defines the marker type, `U`'s own identity is the
//! answer; otherwise the dummy identity is.
//!
//! Reference graphs may contain cycles. A reference back into a unit whose answer
//! is currently being computed is skipped.

use std::collections::{HashMap, HashSet};

use crate::metadata::{
    identity::AssemblyIdentity,
    namespace::RootNamespace,
    unit::{UnitArena, UnitId},
};

/// The built-in marker roles, each memoized per unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// The assembly defining `System.Object`
    Core,
    /// The assembly defining `Microsoft.Contracts.Contract`
    Contract,
}

/// Decides whether a root namespace defines the marker type of a role.
pub trait MarkerPredicate: Sync {
    /// Returns true if `root` defines the marker type.
    fn is_marker(&self, root: &RootNamespace) -> bool;

    /// The built-in role this predicate stands for; answers for built-in roles are
    /// memoized on each unit.
    fn kind(&self) -> Option<MarkerKind> {
        None
    }
}

impl<F> MarkerPredicate for F
where
    F: Fn(&RootNamespace) -> bool + Sync,
{
    fn is_marker(&self, root: &RootNamespace) -> bool {
        self(root)
    }
}

/// A marker type given by namespace path and simple name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerType {
    namespace: Vec<String>,
    name: String,
    kind: Option<MarkerKind>,
}

impl MarkerType {
    /// A custom marker type, e.g. `MarkerType::new(&["Xunit"], "Assert")`.
    pub fn new(namespace: &[&str], name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.iter().map(|s| (*s).to_string()).collect(),
            name: name.into(),
            kind: None,
        }
    }

    /// `System.Object`
    #[must_use]
    pub fn core() -> Self {
        Self {
            kind: Some(MarkerKind::Core),
            ..Self::new(&["System"], "Object")
        }
    }

    /// `Microsoft.Contracts.Contract`
    #[must_use]
    pub fn contract() -> Self {
        Self {
            kind: Some(MarkerKind::Contract),
            ..Self::new(&["Microsoft", "Contracts"], "Contract")
        }
    }
}

impl MarkerPredicate for MarkerType {
    fn is_marker(&self, root: &RootNamespace) -> bool {
        root.contains_type(&self.namespace, &self.name)
    }

    fn kind(&self) -> Option<MarkerKind> {
        self.kind
    }
}

/// Resolve which assembly plays the role described by `marker` for unit `unit`.
///
/// Returns the dummy identity if no assembly qualifies. Never fails: references that
/// cannot be resolved are skipped.
pub fn resolve_marker_assembly_identity(
    arena: &UnitArena,
    unit: UnitId,
    marker: &dyn MarkerPredicate,
) -> AssemblyIdentity {
    Resolution {
        arena,
        marker,
        memo: HashMap::new(),
        visiting: HashSet::new(),
    }
    .resolve(unit)
}

struct Resolution<'a> {
    arena: &'a UnitArena,
    marker: &'a dyn MarkerPredicate,
    memo: HashMap<UnitId, AssemblyIdentity>,
    visiting: HashSet<UnitId>,
}

impl Resolution<'_> {
    fn resolve(&mut self, id: UnitId) -> AssemblyIdentity {
        if let Some(answer) = self.memo.get(&id) {
            return answer.clone();
        }

        let arena = self.arena;
        let Some(unit) = arena.get(id) else {
            return AssemblyIdentity::dummy();
        };

        let cell = self.marker.kind().map(|kind| unit.module().marker_cell(kind));
        if let Some(answer) = cell.and_then(|cell| cell.get()) {
            return answer.clone();
        }

        self.visiting.insert(id);

        let mut best: Option<AssemblyIdentity> = None;
        let mut incomplete = false;
        for reference in unit.references() {
            let Some(target) = arena.resolve(reference) else {
                continue;
            };
            if self.visiting.contains(&target) {
                incomplete = true;
                continue;
            }

            let candidate = self.resolve(target);
            if candidate.is_dummy() {
                continue;
            }
            if best
                .as_ref()
                .map_or(true, |current| current.version < candidate.version)
            {
                best = Some(candidate);
            }
        }

        self.visiting.remove(&id);

        let answer = match best {
            Some(identity) => identity,
            None => match unit.as_assembly() {
                Some(assembly) if self.marker.is_marker(unit.root_namespace()) => {
                    assembly.identity().clone()
                }
                _ => AssemblyIdentity::dummy(),
            },
        };

        // An answer computed while a cycle was cut short depends on the entry point of
        // this resolution, so only complete answers are stored on the unit.
        if let Some(cell) = cell {
            if !incomplete {
                let _ = cell.set(answer.clone());
            }
        }
        self.memo.insert(id, answer.clone());

        tracing::trace!(unit = %unit.name(), answer = %answer.name, "resolved marker assembly");
        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{
            identity::AssemblyVersion,
            unit::{AssemblyBuilder, ModuleBuilder, UnitReference},
        },
        test::factories::unit::core_library,
    };

    fn v(major: u16, minor: u16) -> AssemblyVersion {
        AssemblyVersion::new(major, minor, 0, 0)
    }

    #[test]
    fn test_self_defining_assembly() {
        let arena = UnitArena::new();
        let core = arena.insert(core_library("mscorlib", v(4, 0), None)).unwrap();

        let answer = arena.core_assembly_identity(core);
        assert_eq!(answer.name, "mscorlib");
        assert!(arena.contract_assembly_identity(core).is_dummy());
    }

    #[test]
    fn test_highest_version_wins() {
        let arena = UnitArena::new();
        let v1 = arena.insert(core_library("corlib1", v(1, 0), None)).unwrap();
        let v15 = arena.insert(core_library("corlib15", v(1, 5), None)).unwrap();
        let v2 = arena.insert(core_library("corlib2", v(2, 0), None)).unwrap();

        let app = arena
            .insert(
                AssemblyBuilder::new("App", "/bin/App.dll")
                    .assembly_reference(UnitReference::Resolved(v1))
                    .assembly_reference(UnitReference::Resolved(v2))
                    .assembly_reference(UnitReference::Resolved(v15))
                    .build(),
            )
            .unwrap();

        let answer = arena.core_assembly_identity(app);
        assert_eq!(answer.name, "corlib2");
        assert_eq!(answer.version, v(2, 0));
    }

    #[test]
    fn test_tie_keeps_first() {
        let arena = UnitArena::new();
        let a = arena.insert(core_library("A", v(1, 0), None)).unwrap();
        let b = arena.insert(core_library("B", v(1, 0), None)).unwrap();

        let app = arena
            .insert(
                AssemblyBuilder::new("App", "/bin/App.dll")
                    .assembly_reference(UnitReference::Resolved(a))
                    .assembly_reference(UnitReference::Resolved(b))
                    .build(),
            )
            .unwrap();

        assert_eq!(arena.core_assembly_identity(app).name, "A");
    }

    #[test]
    fn test_module_without_references_is_dummy() {
        let arena = UnitArena::new();
        let module = arena
            .insert(ModuleBuilder::new("Helper.netmodule", "/bin/Helper.netmodule").build())
            .unwrap();
        assert!(arena.core_assembly_identity(module).is_dummy());
    }

    #[test]
    fn test_unresolvable_references_skipped() {
        let arena = UnitArena::new();
        let core = arena.insert(core_library("mscorlib", v(4, 0), None)).unwrap();
        let missing = AssemblyBuilder::new("Missing", "").build().identity().clone();

        let app = arena
            .insert(
                AssemblyBuilder::new("App", "/bin/App.dll")
                    .assembly_reference(UnitReference::Unresolved(missing.into()))
                    .assembly_reference(UnitReference::Resolved(core))
                    .build(),
            )
            .unwrap();

        assert_eq!(arena.core_assembly_identity(app).name, "mscorlib");
    }

    #[test]
    fn test_transitive_and_memoized() {
        let arena = UnitArena::new();
        let core = arena.insert(core_library("mscorlib", v(4, 0), None)).unwrap();
        let lib = arena
            .insert(
                AssemblyBuilder::new("Lib", "/bin/Lib.dll")
                    .assembly_reference(UnitReference::Resolved(core))
                    .build(),
            )
            .unwrap();
        let app = arena
            .insert(
                AssemblyBuilder::new("App", "/bin/App.dll")
                    .assembly_reference(UnitReference::Resolved(lib))
                    .build(),
            )
            .unwrap();

        assert_eq!(arena.core_assembly_identity(app).name, "mscorlib");
        let cell = arena.get(lib).unwrap().module().marker_cell(MarkerKind::Core);
        assert_eq!(cell.get().map(|id| id.name.as_str()), Some("mscorlib"));
    }

    #[test]
    fn test_reference_cycle_terminates() {
        let arena = UnitArena::new();
        let a_identity = AssemblyBuilder::new("A", "").build().identity().clone();
        let b = arena
            .insert(
                AssemblyBuilder::new("B", "/bin/B.dll")
                    .assembly_reference(UnitReference::Unresolved(a_identity.into()))
                    .build(),
            )
            .unwrap();
        let a = arena
            .insert(
                AssemblyBuilder::new("A", "/bin/A.dll")
                    .assembly_reference(UnitReference::Resolved(b))
                    .build(),
            )
            .unwrap();

        assert!(arena.core_assembly_identity(a).is_dummy());
        assert!(arena.core_assembly_identity(b).is_dummy());
    }

    #[test]
    fn test_custom_predicate() {
        let arena = UnitArena::new();
        let core = arena.insert(core_library("mscorlib", v(4, 0), None)).unwrap();

        let defines_string = |root: &RootNamespace| root.contains_type(&["System"], "String");
        let defines_xunit = MarkerType::new(&["Xunit"], "Assert");

        assert_eq!(
            resolve_marker_assembly_identity(&arena, core, &defines_string).name,
            "mscorlib"
        );
        assert!(resolve_marker_assembly_identity(&arena, core, &defines_xunit).is_dummy());
    }
}
