use derive_more::{Display, Error};
use quill_core::TypeId;

/// Malformed module metadata found while loading a module.
///
/// Nothing is registered from a module whose scan fails.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[display("module '{module}' references unknown type {id}")]
    UnknownType { module: String, id: TypeId },

    #[display("extension method '{signature}' has no receiver parameter")]
    ExtensionWithoutReceiver { signature: String },
}
