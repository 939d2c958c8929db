//! Quill language runtime services.
//!
//! The services in this crate are created once per process (see
//! [`ScriptRuntime`]) and shared by every compilation:
//!
//! - [`ConversionResolver`]: decides how a value of one type becomes another.
//! - [`BinderCache`]: canonical dispatch descriptors for dynamic call sites.
//! - [`ExtensionTypeRegistry`]: extended type → provider types, grown on
//!   module load.
//! - [`MemberCache`]: per-type method index.
//! - [`HostNamespaces`]: namespace tree plus script-visible and aliased
//!   namespace sets.

pub mod binder;
pub mod conversion;
pub mod error;
pub mod extension;
pub mod member_cache;
pub mod namespaces;
pub mod numeric;
pub mod operator;
pub mod runtime;

pub use binder::{BinderCache, DispatchDescriptor, DispatchKey};
pub use conversion::{
    Candidate, Conversion, ConversionMode, ConversionPlan, ConversionResolver, NarrowingLevel,
    NullableWrapKind,
};
pub use error::RegistryError;
pub use extension::ExtensionTypeRegistry;
pub use member_cache::{MemberCache, TypeMembers};
pub use namespaces::HostNamespaces;
pub use operator::{BinaryOperator, UnaryOperator};
pub use runtime::{ModuleLoad, ScriptRuntime};
