//! The per-process bundle of runtime services.

use std::sync::Arc;

use dashmap::DashSet;
use quill_core::{HostModule, TypeId, TypeTable};
use tracing::debug;

use crate::binder::BinderCache;
use crate::conversion::ConversionResolver;
use crate::error::RegistryError;
use crate::extension::ExtensionTypeRegistry;
use crate::member_cache::MemberCache;
use crate::namespaces::HostNamespaces;

/// What loading one module changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModuleLoad {
    pub already_loaded: bool,
    pub extension_pairs: usize,
    pub visible_namespaces: usize,
    pub aliases: usize,
}

/// Services shared by every compilation in the process.
///
/// Created once from the host's finished [`TypeTable`]; compilations
/// borrow it, possibly from several threads at once.
#[derive(Debug)]
pub struct ScriptRuntime {
    types: Arc<TypeTable>,
    members: MemberCache,
    binders: BinderCache,
    extensions: ExtensionTypeRegistry,
    namespaces: HostNamespaces,
    loaded: DashSet<String>,
}

impl ScriptRuntime {
    pub fn new(types: impl Into<Arc<TypeTable>>) -> Self {
        let types = types.into();
        let namespaces = HostNamespaces::new(&types);
        Self {
            types,
            members: MemberCache::new(),
            binders: BinderCache::new(),
            extensions: ExtensionTypeRegistry::new(),
            namespaces,
            loaded: DashSet::new(),
        }
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn conversions(&self) -> ConversionResolver<'_> {
        ConversionResolver::new(&self.types, &self.members)
    }

    pub fn binders(&self) -> &BinderCache {
        &self.binders
    }

    pub fn extensions(&self) -> &ExtensionTypeRegistry {
        &self.extensions
    }

    pub fn members(&self) -> &MemberCache {
        &self.members
    }

    pub fn namespaces(&self) -> &HostNamespaces {
        &self.namespaces
    }

    pub fn is_loaded(&self, module: &str) -> bool {
        self.loaded.contains(module)
    }

    /// Make a host module available to scripts: register its extension
    /// methods, its implicitly visible namespaces and its aliases.
    ///
    /// Loading a module name a second time does nothing. Namespaces that
    /// contain no public type are skipped.
    pub fn load_module(&self, module: &HostModule) -> Result<ModuleLoad, RegistryError> {
        if self.is_loaded(&module.name) {
            return Ok(ModuleLoad {
                already_loaded: true,
                ..ModuleLoad::default()
            });
        }

        let mut load = ModuleLoad {
            extension_pairs: self.extensions.register_module(&self.types, module)?,
            ..ModuleLoad::default()
        };

        let tree = self.namespaces.tree();
        for name in &module.visible_namespaces {
            match tree.find(name) {
                Some(ns) => {
                    if self.namespaces.add_visible(ns) {
                        load.visible_namespaces += 1;
                    }
                }
                None => debug!(module = %module.name, namespace = %name, "skipping unknown visible namespace"),
            }
        }
        for alias in &module.namespace_aliases {
            match tree.find(&alias.namespace) {
                Some(ns) => {
                    self.namespaces.add_to_alias_group(&alias.alias, ns);
                    load.aliases += 1;
                }
                None => debug!(
                    module = %module.name,
                    alias = %alias.alias,
                    namespace = %alias.namespace,
                    "skipping alias to unknown namespace"
                ),
            }
        }

        self.loaded.insert(module.name.clone());
        debug!(module = %module.name, ?load, "loaded module");
        Ok(load)
    }

    /// Find a type by full name: `System.Int32`, or a generic instance
    /// that already exists such as
    /// `System.Collections.Generic.List<System.Int32>`.
    pub fn find_type(&self, name: &str) -> Option<TypeId> {
        let name = name.trim();
        let Some(open) = name.find('<') else {
            let (namespace, simple) = name.rsplit_once('.')?;
            return self.types.find(namespace, simple, 0);
        };
        let inner = name[open + 1..].strip_suffix('>')?;
        let arguments = split_type_arguments(inner)
            .into_iter()
            .map(|argument| self.find_type(argument))
            .collect::<Option<Vec<_>>>()?;
        let (namespace, simple) = name[..open].rsplit_once('.')?;
        let definition = self
            .types
            .find(namespace, simple, arguments.len() as u32)?;
        self.types.find_instance(definition, &arguments)
    }
}

/// Split `A, B<C, D>` at top-level commas.
fn split_type_arguments(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}
