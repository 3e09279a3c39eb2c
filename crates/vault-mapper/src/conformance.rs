//! Ordered shape checks over a package fragment.

use std::collections::BTreeMap;

use vault_graph::{filter_latest, DeliverableUnit, DuRole, Package};
use vault_types::{EntityId, ObjectType};

use crate::error::NonConformance;

/// Technical-environment tag of the manifestation holding a file's bytes.
pub const CONTENT_MANIFESTATION: &str = "content";

/// The canonical nodes of a conformant fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalGraph {
    pub object_type: ObjectType,
    pub root: EntityId,
    pub state: EntityId,
    /// Root DU of the business parent, if the state declares one.
    pub member_of: Option<EntityId>,
    /// Manifestations of the state, by technical-environment tag.
    pub manifestations: BTreeMap<String, EntityId>,
}

/// Run the checks in order, stopping at the first failure:
///
/// 1. a Root DU of `object_type` exists
/// 2. a State DU of `object_type` has one of those roots as its lineage
/// 3. root and state ids differ
/// 4. the state names at most one parent object
/// 5. every `required` manifestation exists and its files resolve
///
/// When the fragment holds several versions of the lineage, only the
/// latest State DU is canonical.
pub fn check(
    package: &Package,
    object_type: ObjectType,
    required: &[&str],
) -> Result<CanonicalGraph, NonConformance> {
    let roots: Vec<&DeliverableUnit> = package
        .units_with_role(DuRole::Root)
        .filter(|du| du.object_type() == object_type)
        .collect();
    if roots.is_empty() {
        return Err(NonConformance::NoRootDu(object_type));
    }

    let states: Vec<DeliverableUnit> = package
        .units_with_role(DuRole::State)
        .filter(|du| du.object_type() == object_type)
        .filter(|du| {
            du.lineage()
                .is_some_and(|lineage| roots.iter().any(|r| &r.id == lineage))
        })
        .cloned()
        .collect();
    if states.is_empty() {
        return Err(NonConformance::NoStateDu(object_type));
    }
    let mut latest = filter_latest(states);
    if latest.len() > 1 {
        return Err(NonConformance::AmbiguousState(
            latest.into_iter().map(|du| du.id).collect(),
        ));
    }
    let Some(state) = latest.pop() else {
        return Err(NonConformance::NoStateDu(object_type));
    };
    let Some(root) = state.lineage().cloned() else {
        return Err(NonConformance::NoStateDu(object_type));
    };

    if root == state.id {
        return Err(NonConformance::SharedRootAndState(root));
    }

    let members: Vec<&EntityId> = state.member_of().collect();
    if members.len() > 1 {
        return Err(NonConformance::MultipleParents {
            state: state.id.clone(),
            count: members.len(),
        });
    }
    let member_of = members.first().map(|id| (*id).clone());

    let mut manifestations = BTreeMap::new();
    for m in package.manifestations_of(&state.id) {
        manifestations.insert(m.tech_env.clone(), m.id.clone());
    }
    for env in required {
        let Some(mf) = package
            .manifestations_of(&state.id)
            .find(|m| m.tech_env == *env)
        else {
            return Err(NonConformance::MissingManifestation((*env).to_string()));
        };
        let unresolved = mf.files.iter().find(|f| package.file(f).is_err());
        if mf.files.is_empty() || unresolved.is_some() {
            return Err(NonConformance::UnresolvableFile {
                manifestation: mf.id.clone(),
                file: unresolved.cloned().unwrap_or_else(|| mf.id.clone()),
            });
        }
    }

    Ok(CanonicalGraph {
        object_type,
        root,
        state: state.id.clone(),
        member_of,
        manifestations,
    })
}

#[cfg(test)]
mod tests {
    use vault_graph::{DuType, FileEntity, Manifestation, ParentRef};

    use super::*;

    fn root(id: &str, ty: ObjectType) -> DeliverableUnit {
        DeliverableUnit::new(id.into(), DuType::root(ty), id)
    }

    fn state(id: &str, ty: ObjectType, lineage: &str) -> DeliverableUnit {
        let mut du = DeliverableUnit::new(id.into(), DuType::state(ty), id);
        du.parents.push(ParentRef::lineage(lineage.into()));
        du
    }

    fn package(entities: Vec<vault_graph::Entity>) -> Package {
        entities.into_iter().collect()
    }

    // ----------------------------------------------------------------
    // Check order
    // ----------------------------------------------------------------

    #[test]
    fn missing_root_is_reported_first() {
        let p = package(vec![state("s1", ObjectType::Collection, "r1").into()]);
        assert_eq!(
            check(&p, ObjectType::Collection, &[]),
            Err(NonConformance::NoRootDu(ObjectType::Collection))
        );
    }

    #[test]
    fn root_of_another_type_does_not_count() {
        let p = package(vec![
            root("r1", ObjectType::DataItem).into(),
            state("s1", ObjectType::Collection, "r1").into(),
        ]);
        assert_eq!(
            check(&p, ObjectType::Collection, &[]),
            Err(NonConformance::NoRootDu(ObjectType::Collection))
        );
    }

    #[test]
    fn state_must_hang_off_a_root() {
        let p = package(vec![
            root("r1", ObjectType::Collection).into(),
            state("s1", ObjectType::Collection, "elsewhere").into(),
        ]);
        assert_eq!(
            check(&p, ObjectType::Collection, &[]),
            Err(NonConformance::NoStateDu(ObjectType::Collection))
        );
    }

    #[test]
    fn two_parent_objects_are_rejected() {
        let mut s = state("s1", ObjectType::DataItem, "r1");
        s.parents.push(ParentRef::member("c1".into()));
        s.parents.push(ParentRef::member("c2".into()));
        let p = package(vec![root("r1", ObjectType::DataItem).into(), s.into()]);
        assert!(matches!(
            check(&p, ObjectType::DataItem, &[]),
            Err(NonConformance::MultipleParents { count: 2, .. })
        ));
    }

    #[test]
    fn required_manifestation_must_exist() {
        let p = package(vec![
            root("r1", ObjectType::DataFile).into(),
            state("s1", ObjectType::DataFile, "r1").into(),
        ]);
        assert_eq!(
            check(&p, ObjectType::DataFile, &[CONTENT_MANIFESTATION]),
            Err(NonConformance::MissingManifestation("content".into()))
        );
    }

    #[test]
    fn manifestation_files_must_resolve() {
        let p = package(vec![
            root("r1", ObjectType::DataFile).into(),
            state("s1", ObjectType::DataFile, "r1").into(),
            Manifestation {
                id: "mf".into(),
                du: "s1".into(),
                tech_env: "content".into(),
                files: vec!["file:gone".into()],
            }
            .into(),
        ]);
        assert_eq!(
            check(&p, ObjectType::DataFile, &[CONTENT_MANIFESTATION]),
            Err(NonConformance::UnresolvableFile {
                manifestation: "mf".into(),
                file: "file:gone".into(),
            })
        );
    }

    // ----------------------------------------------------------------
    // Canonical selection
    // ----------------------------------------------------------------

    #[test]
    fn conformant_file_graph() {
        let mut s = state("s1", ObjectType::DataFile, "r1");
        s.parents.push(ParentRef::member("item-root".into()));
        let p = package(vec![
            root("r1", ObjectType::DataFile).into(),
            s.into(),
            FileEntity::staged("file:1".into(), "a.csv", vec![1]).into(),
            Manifestation {
                id: "mf".into(),
                du: "s1".into(),
                tech_env: "content".into(),
                files: vec!["file:1".into()],
            }
            .into(),
        ]);
        let graph = check(&p, ObjectType::DataFile, &[CONTENT_MANIFESTATION]).unwrap();
        assert_eq!(graph.root, EntityId::new("r1"));
        assert_eq!(graph.state, EntityId::new("s1"));
        assert_eq!(graph.member_of, Some(EntityId::new("item-root")));
        assert_eq!(graph.manifestations.get("content"), Some(&EntityId::new("mf")));
    }

    #[test]
    fn latest_state_is_canonical() {
        let mut s2 = state("s2", ObjectType::Collection, "r1");
        s2.predecessor = Some("s1".into());
        let p = package(vec![
            root("r1", ObjectType::Collection).into(),
            state("s1", ObjectType::Collection, "r1").into(),
            s2.into(),
        ]);
        let graph = check(&p, ObjectType::Collection, &[]).unwrap();
        assert_eq!(graph.state, EntityId::new("s2"));
    }

    #[test]
    fn forked_states_are_ambiguous() {
        let p = package(vec![
            root("r1", ObjectType::Collection).into(),
            state("s1", ObjectType::Collection, "r1").into(),
            state("s2", ObjectType::Collection, "r1").into(),
        ]);
        assert!(matches!(
            check(&p, ObjectType::Collection, &[]),
            Err(NonConformance::AmbiguousState(ids)) if ids.len() == 2
        ));
    }

    #[test]
    fn parent_collection_root_in_the_same_fragment_is_tolerated() {
        // A retrieved sub-collection graph also holds its parent's root DU.
        let mut s = state("s1", ObjectType::Collection, "r1");
        s.parents.push(ParentRef::member("parent-root".into()));
        let p = package(vec![
            root("parent-root", ObjectType::Collection).into(),
            root("r1", ObjectType::Collection).into(),
            s.into(),
        ]);
        let graph = check(&p, ObjectType::Collection, &[]).unwrap();
        assert_eq!(graph.root, EntityId::new("r1"));
    }
}
