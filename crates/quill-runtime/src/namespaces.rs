//! Host-wide namespace state: the namespace tree built from the type table,
//! the namespaces every script sees implicitly, and alias groups.

use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use quill_core::{NamespaceGroup, NamespaceId, NamespaceTree, TypeId, TypeTable};

#[derive(Debug)]
pub struct HostNamespaces {
    tree: NamespaceTree,
    visible: RwLock<Vec<NamespaceId>>,
    alias_groups: DashMap<String, Arc<NamespaceGroup>>,
}

impl HostNamespaces {
    pub fn new(types: &TypeTable) -> Self {
        Self {
            tree: NamespaceTree::build(types),
            visible: RwLock::new(Vec::new()),
            alias_groups: DashMap::new(),
        }
    }

    pub fn tree(&self) -> &NamespaceTree {
        &self.tree
    }

    /// A top-level namespace such as `System`.
    pub fn root_child(&self, name: &str) -> Option<NamespaceId> {
        self.tree.get(self.tree.root()).child(name)
    }

    /// Implicitly visible namespaces in the order modules declared them.
    pub fn visible_namespaces(&self) -> Vec<NamespaceId> {
        self.visible
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn lookup_alias_group(&self, alias: &str) -> Option<Arc<NamespaceGroup>> {
        self.alias_groups.get(alias).map(|group| group.clone())
    }

    /// Whether `ty` is reachable by simple name through an implicitly
    /// visible namespace.
    pub fn is_script_visible_type(&self, types: &TypeTable, ty: TypeId) -> bool {
        let definition = types.open_definition(ty);
        let def = types.get(definition);
        self.visible
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|&ns| self.tree.get(ns).type_group(&def.name))
            .any(|group| group.contains(definition))
    }

    pub(crate) fn add_visible(&self, ns: NamespaceId) -> bool {
        let mut visible = self.visible.write().unwrap_or_else(PoisonError::into_inner);
        if visible.contains(&ns) {
            return false;
        }
        visible.push(ns);
        true
    }

    pub(crate) fn add_to_alias_group(&self, alias: &str, ns: NamespaceId) {
        let mut group = self
            .alias_groups
            .entry(alias.to_owned())
            .or_insert_with(|| {
                Arc::new(NamespaceGroup {
                    alias: alias.to_owned(),
                    members: Vec::new(),
                })
            });
        if !group.members.contains(&ns) {
            // Groups handed out earlier keep their snapshot.
            Arc::make_mut(&mut *group).members.push(ns);
        }
    }
}
