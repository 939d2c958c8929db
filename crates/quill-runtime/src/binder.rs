//! Canonical dispatch descriptors for dynamic operations.
//!
//! Every dynamic operation a compiled script performs (a conversion, an
//! operator, a call, a member access) is described by a [`DispatchKey`].
//! [`BinderCache`] hands out one shared [`DispatchDescriptor`] per distinct
//! key, so call sites compiled at different times, or on different
//! threads, reuse the same descriptor.
//!
//! Each operation kind owns its own sub-table. A sub-table is published at
//! most once ([`OnceLock`]); afterwards inserts lock only that sub-table.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use quill_core::{TypeId, TypeTable};
use tracing::trace;

use crate::conversion::{Conversion, ConversionMode, ConversionResolver};
use crate::operator::{BinaryOperator, UnaryOperator};

/// Structural identity of a dynamic operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DispatchKey {
    Convert {
        target: TypeId,
        mode: ConversionMode,
    },
    /// Conversion whose result is always typed as `Object`.
    ConvertToObject {
        target: TypeId,
        mode: ConversionMode,
    },
    BinaryOp(BinaryOperator),
    UnaryOp(UnaryOperator),
    Invoke {
        arg_count: usize,
    },
    GetIndex {
        arg_count: usize,
    },
    GetMember {
        name: String,
        suppress_errors: bool,
    },
    InvokeMember {
        name: String,
        arg_count: usize,
    },
}

impl DispatchKey {
    pub fn display<'a>(&'a self, types: &'a TypeTable) -> KeyDisplay<'a> {
        KeyDisplay { key: self, types }
    }
}

pub struct KeyDisplay<'a> {
    key: &'a DispatchKey,
    types: &'a TypeTable,
}

impl fmt::Display for KeyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key {
            DispatchKey::Convert { target, mode } => {
                write!(f, "convert({}, {mode})", self.types.display_name(*target))
            }
            DispatchKey::ConvertToObject { target, mode } => write!(
                f,
                "convert-to-object({}, {mode})",
                self.types.display_name(*target)
            ),
            DispatchKey::BinaryOp(op) => write!(f, "binary({op})"),
            DispatchKey::UnaryOp(op) => write!(f, "unary({op})"),
            DispatchKey::Invoke { arg_count } => write!(f, "invoke({arg_count})"),
            DispatchKey::GetIndex { arg_count } => write!(f, "get-index({arg_count})"),
            DispatchKey::GetMember {
                name,
                suppress_errors,
            } => {
                if *suppress_errors {
                    write!(f, "try-get-member({name})")
                } else {
                    write!(f, "get-member({name})")
                }
            }
            DispatchKey::InvokeMember { name, arg_count } => {
                write!(f, "invoke-member({name}, {arg_count})")
            }
        }
    }
}

/// The canonical descriptor for one [`DispatchKey`]. Compare with
/// [`Arc::ptr_eq`].
#[derive(Debug, PartialEq, Eq)]
pub struct DispatchDescriptor {
    key: DispatchKey,
}

impl DispatchDescriptor {
    pub fn key(&self) -> &DispatchKey {
        &self.key
    }

    /// Resolve the conversion a convert descriptor performs on a value of
    /// static type `source`. `None` for non-conversion descriptors.
    pub fn bind_conversion(
        &self,
        resolver: &ConversionResolver<'_>,
        source: TypeId,
    ) -> Option<Conversion> {
        match self.key {
            DispatchKey::Convert { target, mode } => Some(resolver.resolve(source, target, mode)),
            DispatchKey::ConvertToObject { target, mode } => {
                let mut conversion = resolver.resolve(source, target, mode);
                conversion.result_type = resolver.types().well_known().object;
                Some(conversion)
            }
            _ => None,
        }
    }
}

type Shared = Arc<DispatchDescriptor>;
type Keyed<K> = OnceLock<Mutex<HashMap<K, Shared>>>;
type Indexed = OnceLock<Mutex<Vec<Option<Shared>>>>;

const MODES: usize = ConversionMode::ALL.len();

/// Process-wide cache of dispatch descriptors.
#[derive(Debug, Default)]
pub struct BinderCache {
    convert: [Keyed<TypeId>; MODES],
    convert_to_object: [Keyed<TypeId>; MODES],
    binary: Keyed<BinaryOperator>,
    unary: Keyed<UnaryOperator>,
    invoke: Indexed,
    get_index: Indexed,
    get_member: Keyed<String>,
    try_get_member: Keyed<String>,
    invoke_member: Keyed<(String, usize)>,
    created: AtomicUsize,
}

impl BinderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn convert(&self, target: TypeId, mode: ConversionMode) -> Shared {
        self.keyed(&self.convert[mode_slot(mode)], target, || DispatchKey::Convert {
            target,
            mode,
        })
    }

    pub fn convert_to_object(&self, target: TypeId, mode: ConversionMode) -> Shared {
        self.keyed(&self.convert_to_object[mode_slot(mode)], target, || {
            DispatchKey::ConvertToObject { target, mode }
        })
    }

    pub fn binary_op(&self, op: BinaryOperator) -> Shared {
        self.keyed(&self.binary, op, || DispatchKey::BinaryOp(op))
    }

    pub fn unary_op(&self, op: UnaryOperator) -> Shared {
        self.keyed(&self.unary, op, || DispatchKey::UnaryOp(op))
    }

    pub fn invoke(&self, arg_count: usize) -> Shared {
        self.indexed(&self.invoke, arg_count, || DispatchKey::Invoke { arg_count })
    }

    pub fn get_index(&self, arg_count: usize) -> Shared {
        self.indexed(&self.get_index, arg_count, || DispatchKey::GetIndex {
            arg_count,
        })
    }

    /// Panics if `name` is empty.
    pub fn get_member(&self, name: &str, suppress_errors: bool) -> Shared {
        assert!(!name.is_empty(), "member name must not be empty");
        let table = if suppress_errors {
            &self.try_get_member
        } else {
            &self.get_member
        };
        self.keyed(table, name.to_owned(), || DispatchKey::GetMember {
            name: name.to_owned(),
            suppress_errors,
        })
    }

    /// Panics if `name` is empty.
    pub fn invoke_member(&self, name: &str, arg_count: usize) -> Shared {
        assert!(!name.is_empty(), "member name must not be empty");
        self.keyed(&self.invoke_member, (name.to_owned(), arg_count), || {
            DispatchKey::InvokeMember {
                name: name.to_owned(),
                arg_count,
            }
        })
    }

    /// Look up the descriptor for an arbitrary key.
    pub fn get(&self, key: &DispatchKey) -> Shared {
        match key {
            DispatchKey::Convert { target, mode } => self.convert(*target, *mode),
            DispatchKey::ConvertToObject { target, mode } => {
                self.convert_to_object(*target, *mode)
            }
            DispatchKey::BinaryOp(op) => self.binary_op(*op),
            DispatchKey::UnaryOp(op) => self.unary_op(*op),
            DispatchKey::Invoke { arg_count } => self.invoke(*arg_count),
            DispatchKey::GetIndex { arg_count } => self.get_index(*arg_count),
            DispatchKey::GetMember {
                name,
                suppress_errors,
            } => self.get_member(name, *suppress_errors),
            DispatchKey::InvokeMember { name, arg_count } => self.invoke_member(name, *arg_count),
        }
    }

    /// Number of descriptors created so far.
    pub fn len(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn keyed<K: Eq + Hash>(
        &self,
        table: &Keyed<K>,
        key: K,
        make_key: impl FnOnce() -> DispatchKey,
    ) -> Shared {
        let mut entries = table
            .get_or_init(Default::default)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(key)
            .or_insert_with(|| self.create(make_key()))
            .clone()
    }

    fn indexed(
        &self,
        table: &Indexed,
        index: usize,
        make_key: impl FnOnce() -> DispatchKey,
    ) -> Shared {
        let mut slots = table
            .get_or_init(Default::default)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slots.len() <= index {
            slots.resize(index + 1, None);
        }
        slots[index]
            .get_or_insert_with(|| self.create(make_key()))
            .clone()
    }

    fn create(&self, key: DispatchKey) -> Shared {
        self.created.fetch_add(1, Ordering::Relaxed);
        trace!(key = ?key, "created dispatch descriptor");
        Arc::new(DispatchDescriptor { key })
    }
}

fn mode_slot(mode: ConversionMode) -> usize {
    match mode {
        ConversionMode::ImplicitCast => 0,
        ConversionMode::ImplicitTry => 1,
        ConversionMode::ExplicitCast => 2,
        ConversionMode::ExplicitTry => 3,
    }
}
