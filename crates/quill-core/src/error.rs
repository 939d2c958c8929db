//! Errors raised while building host metadata.

use derive_more::{Display, Error};

use crate::TypeId;

/// Malformed host metadata.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[display("unknown type id {id}")]
    UnknownType { id: TypeId },

    #[display("'{name}' is not a generic type definition")]
    NotGenericDefinition { name: String },

    #[display("'{name}' expects {expected} type arguments, got {actual}")]
    ArityMismatch {
        name: String,
        expected: u32,
        actual: usize,
    },

    #[display("type '{name}' is already defined in namespace '{namespace}'")]
    DuplicateType { namespace: String, name: String },
}
