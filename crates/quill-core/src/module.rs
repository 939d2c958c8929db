//! Host modules: the unit of metadata the host loads into the runtime.

use crate::TypeId;

/// Alias declared by a module: `alias` names (a group including) `namespace`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceAlias {
    pub alias: String,
    pub namespace: String,
}

/// A loadable unit of host metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostModule {
    pub name: String,
    /// Types declared by the module, scanned for extension methods on load.
    pub types: Vec<TypeId>,
    /// Namespaces the module makes implicitly visible to every script.
    pub visible_namespaces: Vec<String>,
    pub namespace_aliases: Vec<NamespaceAlias>,
}

impl HostModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_types(mut self, types: impl IntoIterator<Item = TypeId>) -> Self {
        self.types.extend(types);
        self
    }

    pub fn with_visible_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.visible_namespaces.push(namespace.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.namespace_aliases.push(NamespaceAlias {
            alias: alias.into(),
            namespace: namespace.into(),
        });
        self
    }
}
