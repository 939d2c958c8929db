//! Per-type method index shared by every compilation.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use quill_core::{MethodId, TypeId, TypeTable};

/// Methods declared by one type, grouped by name in declaration order.
#[derive(Debug, Default)]
pub struct TypeMembers {
    by_name: HashMap<String, Vec<MethodId>>,
}

impl TypeMembers {
    fn build(types: &TypeTable, ty: TypeId) -> Self {
        let mut by_name: HashMap<String, Vec<MethodId>> = HashMap::new();
        for &method in &types.get(ty).methods {
            by_name
                .entry(types.method(method).name.clone())
                .or_default()
                .push(method);
        }
        Self { by_name }
    }

    pub fn named(&self, name: &str) -> &[MethodId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }
}

/// Lazily built [`TypeMembers`], keyed by open generic definition since
/// members live on definitions.
#[derive(Debug, Default)]
pub struct MemberCache {
    members: DashMap<TypeId, Arc<TypeMembers>>,
}

impl MemberCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declared members of `ty`. Built at most once per type.
    pub fn members(&self, types: &TypeTable, ty: TypeId) -> Arc<TypeMembers> {
        let definition = types.open_definition(ty);
        if let Some(existing) = self.members.get(&definition) {
            return existing.clone();
        }
        self.members
            .entry(definition)
            .or_insert_with(|| Arc::new(TypeMembers::build(types, definition)))
            .clone()
    }

    /// Methods named `name` on the first type in `ty`'s base chain (starting
    /// with `ty`) that declares any.
    pub fn lookup(&self, types: &TypeTable, ty: TypeId, name: &str) -> Vec<MethodId> {
        std::iter::once(ty)
            .chain(types.base_chain(ty))
            .map(|owner| self.members(types, owner))
            .find(|members| members.contains(name))
            .map(|members| members.named(name).to_vec())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{MethodSpec, NumericKind, TypeKind};

    #[test]
    fn test_lookup_walks_base_chain() {
        let mut types = TypeTable::new();
        let int = types.well_known().numeric(NumericKind::Int32);
        let planet = types.define("Game", "Planet", TypeKind::Class).unwrap();
        let colony = types.define("Game", "Colony", TypeKind::Class).unwrap();
        types.set_base(colony, planet).unwrap();
        let size = types
            .add_method(planet, MethodSpec::new("Size", vec![], int))
            .unwrap();
        let grow = types
            .add_method(colony, MethodSpec::new("Grow", vec![int], int))
            .unwrap();

        let cache = MemberCache::new();
        assert_eq!(cache.lookup(&types, colony, "Size"), vec![size]);
        assert_eq!(cache.lookup(&types, colony, "Grow"), vec![grow]);
        assert!(cache.lookup(&types, planet, "Grow").is_empty());
        assert!(cache.lookup(&types, colony, "Missing").is_empty());
    }

    #[test]
    fn test_members_built_once_per_definition() {
        let mut types = TypeTable::new();
        let int = types.well_known().numeric(NumericKind::Int32);
        let void = types.well_known().void;
        let list = types
            .define_generic("System.Collections.Generic", "List", TypeKind::Class, &["T"])
            .unwrap();
        types
            .add_method(list, MethodSpec::new("Clear", vec![], void))
            .unwrap();
        let list_int = types.instantiate(list, &[int]).unwrap();

        let cache = MemberCache::new();
        let first = cache.members(&types, list_int);
        let second = cache.members(&types, list);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.named("Clear").len(), 1);
    }
}
