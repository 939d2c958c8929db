//! Binding: from syntax to a tree typed against host metadata.

mod binder;
mod tree;

pub use binder::Binder;
pub use tree::{BoundDisplay, BoundExpr, BoundKind};
