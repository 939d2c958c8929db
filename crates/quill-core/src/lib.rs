//! Quill core: host metadata, namespaces and diagnostics.

pub mod diagnostic;
pub mod error;
pub mod module;
pub mod namespace;
pub mod span;
pub mod types;

pub use diagnostic::{CompilationPhase, Diagnostic, DiagnosticSeverity};
pub use error::TypeError;
pub use module::{HostModule, NamespaceAlias};
pub use namespace::{Entity, Namespace, NamespaceGroup, NamespaceId, NamespaceTree, TypeGroup};
pub use span::Span;
pub use types::{
    GenericShape, MethodDef, MethodId, MethodSpec, NumericKind, PropertyDef, TypeDef, TypeId,
    TypeKind, TypeTable, WellKnownTypes,
};
