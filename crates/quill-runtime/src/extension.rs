//! Extended type → provider types, grown as host modules load.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;
use quill_core::{HostModule, TypeId, TypeTable};
use tracing::debug;

use crate::error::RegistryError;

/// Append-only table of extension providers.
///
/// A provider type is any type declaring at least one public static method
/// marked as an extension; the extended type is that method's first
/// parameter type, normalized to its open generic definition.
#[derive(Debug, Default)]
pub struct ExtensionTypeRegistry {
    providers: DashMap<TypeId, Vec<TypeId>>,
    /// Set once any extended type is an interface. Lookups only walk
    /// interfaces after that.
    interface_extensions: AtomicBool,
    registration: Mutex<()>,
}

impl ExtensionTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `module` and record every (extended type, provider) pair not
    /// seen before. Returns the number of new pairs.
    ///
    /// The whole module is validated before anything is recorded.
    pub fn register_module(
        &self,
        types: &TypeTable,
        module: &HostModule,
    ) -> Result<usize, RegistryError> {
        let pairs = scan_module(types, module)?;

        let _registration = self
            .registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut added = 0;
        let mut extends_interface = false;
        for (extended, provider) in pairs {
            let mut providers = self.providers.entry(extended).or_default();
            if !providers.contains(&provider) {
                providers.push(provider);
                added += 1;
            }
            extends_interface |= types.is_interface(extended);
        }
        if extends_interface && !self.interface_extensions.swap(true, Ordering::AcqRel) {
            debug!(module = %module.name, "first interface extension registered");
        }
        debug!(module = %module.name, added, "registered extension types");
        Ok(added)
    }

    /// Providers for `ty`, its interfaces (once any interface extension is
    /// registered) and its base chain. First-registered order, no duplicates.
    pub fn lookup(&self, types: &TypeTable, ty: TypeId) -> Vec<TypeId> {
        let include_interfaces = self.interface_extensions.load(Ordering::Acquire);
        let mut result = Vec::new();
        for current in std::iter::once(ty).chain(types.base_chain(ty)) {
            self.append_providers(types.open_definition(current), &mut result);
            if include_interfaces {
                for interface in types.all_interfaces(current) {
                    self.append_providers(types.open_definition(interface), &mut result);
                }
            }
        }
        result
    }

    /// Whether providers are registered directly for `ty`.
    pub fn has_extension_types(&self, ty: TypeId) -> bool {
        self.providers.contains_key(&ty)
    }

    pub fn has_interface_extensions(&self) -> bool {
        self.interface_extensions.load(Ordering::Acquire)
    }

    fn append_providers(&self, extended: TypeId, result: &mut Vec<TypeId>) {
        if let Some(providers) = self.providers.get(&extended) {
            for &provider in providers.iter() {
                if !result.contains(&provider) {
                    result.push(provider);
                }
            }
        }
    }
}

fn scan_module(
    types: &TypeTable,
    module: &HostModule,
) -> Result<Vec<(TypeId, TypeId)>, RegistryError> {
    let mut pairs = Vec::new();
    for &provider in &module.types {
        if !types.contains(provider) {
            return Err(RegistryError::UnknownType {
                module: module.name.clone(),
                id: provider,
            });
        }
        for &method_id in &types.get(provider).methods {
            let method = types.method(method_id);
            if !(method.is_public && method.is_static && method.is_extension) {
                continue;
            }
            let Some(&receiver) = method.parameters.first() else {
                return Err(RegistryError::ExtensionWithoutReceiver {
                    signature: types.method_signature(method_id),
                });
            };
            let pair = (types.open_definition(receiver), provider);
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
    }
    Ok(pairs)
}
