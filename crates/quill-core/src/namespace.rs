//! Host namespace tree.
//!
//! Built once from a [`TypeTable`]: every public, named type definition is
//! placed in the namespace its metadata declares. Type definitions sharing a
//! name but differing in generic arity form one [`TypeGroup`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::{TypeId, TypeTable};

/// Handle to a namespace in a [`NamespaceTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(u32);

impl NamespaceId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Types sharing a simple name, keyed by generic arity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeGroup {
    by_arity: BTreeMap<u32, TypeId>,
}

impl TypeGroup {
    pub fn for_arity(&self, arity: u32) -> Option<TypeId> {
        self.by_arity.get(&arity).copied()
    }

    pub fn contains(&self, ty: TypeId) -> bool {
        self.by_arity.values().any(|&t| t == ty)
    }

    pub fn types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.by_arity.values().copied()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Namespace {
    pub name: String,
    pub full_name: String,
    pub parent: Option<NamespaceId>,
    children: BTreeMap<String, NamespaceId>,
    types: HashMap<String, TypeGroup>,
}

impl Namespace {
    pub fn child(&self, name: &str) -> Option<NamespaceId> {
        self.children.get(name).copied()
    }

    pub fn type_group(&self, name: &str) -> Option<&TypeGroup> {
        self.types.get(name)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, NamespaceId)> {
        self.children.iter().map(|(name, &id)| (name.as_str(), id))
    }
}

/// Several namespaces reachable through one alias.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceGroup {
    pub alias: String,
    pub members: Vec<NamespaceId>,
}

/// What a name can resolve to at namespace level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entity {
    Namespace(NamespaceId),
    NamespaceGroup(Arc<NamespaceGroup>),
    Type(TypeId),
}

impl Entity {
    pub fn as_type(&self) -> Option<TypeId> {
        match self {
            Entity::Type(ty) => Some(*ty),
            _ => None,
        }
    }

    /// The namespaces this entity stands for (empty for types).
    pub fn namespaces(&self) -> Vec<NamespaceId> {
        match self {
            Entity::Namespace(ns) => vec![*ns],
            Entity::NamespaceGroup(group) => group.members.clone(),
            Entity::Type(_) => Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct NamespaceTree {
    namespaces: Vec<Namespace>,
}

impl NamespaceTree {
    const ROOT: NamespaceId = NamespaceId(0);

    pub fn build(types: &TypeTable) -> Self {
        let mut tree = Self {
            namespaces: vec![Namespace {
                name: String::new(),
                full_name: String::new(),
                parent: None,
                children: BTreeMap::new(),
                types: HashMap::new(),
            }],
        };
        for (id, def) in types.iter() {
            let Some(namespace) = &def.namespace else {
                continue;
            };
            if !def.is_public
                || types.is_generic_parameter(id)
                || types.open_definition(id) != id
            {
                continue;
            }
            let ns = tree.ensure(namespace);
            tree.namespaces[ns.index()]
                .types
                .entry(def.name.clone())
                .or_default()
                .by_arity
                .insert(def.arity(), id);
        }
        tree
    }

    fn ensure(&mut self, path: &str) -> NamespaceId {
        let mut current = Self::ROOT;
        for part in path.split('.').filter(|p| !p.is_empty()) {
            current = match self.namespaces[current.index()].child(part) {
                Some(child) => child,
                None => {
                    let parent = &self.namespaces[current.index()];
                    let full_name = if parent.full_name.is_empty() {
                        part.to_owned()
                    } else {
                        format!("{}.{part}", parent.full_name)
                    };
                    let child = NamespaceId(self.namespaces.len() as u32);
                    self.namespaces.push(Namespace {
                        name: part.to_owned(),
                        full_name,
                        parent: Some(current),
                        children: BTreeMap::new(),
                        types: HashMap::new(),
                    });
                    self.namespaces[current.index()]
                        .children
                        .insert(part.to_owned(), child);
                    child
                }
            };
        }
        current
    }

    pub fn root(&self) -> NamespaceId {
        Self::ROOT
    }

    /// Panics if `ns` does not belong to this tree.
    pub fn get(&self, ns: NamespaceId) -> &Namespace {
        &self.namespaces[ns.index()]
    }

    /// Find a namespace by its dotted path.
    pub fn find(&self, path: &str) -> Option<NamespaceId> {
        path.split('.')
            .filter(|p| !p.is_empty())
            .try_fold(Self::ROOT, |ns, part| self.get(ns).child(part))
    }

    /// Look up `name` directly inside `ns`: a child namespace, or the member
    /// of a type group with the requested generic arity.
    pub fn lookup(&self, ns: NamespaceId, name: &str, arity: u32) -> Option<Entity> {
        let namespace = self.get(ns);
        if let Some(child) = namespace.child(name) {
            return Some(Entity::Namespace(child));
        }
        namespace
            .type_group(name)
            .and_then(|group| group.for_arity(arity))
            .map(Entity::Type)
    }

    /// Look up `name` inside a namespace-level entity.
    pub fn lookup_in(&self, entity: &Entity, name: &str, arity: u32) -> Option<Entity> {
        entity
            .namespaces()
            .into_iter()
            .find_map(|ns| self.lookup(ns, name, arity))
    }

    pub fn display_name(&self, entity: &Entity, types: &TypeTable) -> String {
        match entity {
            Entity::Namespace(ns) => self.get(*ns).full_name.clone(),
            Entity::NamespaceGroup(group) => group.alias.clone(),
            Entity::Type(ty) => types.display_name(*ty),
        }
    }
}
