//! Scoped compiler flags.
//!
//! A compilation carries one [`ScopeFlagStack`]. Code that needs a flag for
//! the duration of a scope calls [`ScopeFlagStack::enter`] and keeps the
//! returned [`FlagsGuard`] alive; dropping the guard restores the bits it
//! covered, however the scope is left.

use std::cell::Cell;

bitflags::bitflags! {
    /// Bitset of compiler options.
    #[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct ScopeFlags: u32 {
        /// Arithmetic inside `checked(...)`.
        const CHECKED_SCOPE = 1 << 0;
        /// Overflow in constant folding is an error.
        const CONSTANT_CHECK_STATE = 1 << 1;
        /// Trial binding during overload resolution. Diagnostics are dropped.
        const PROBING_MODE = 1 << 22;
        const INFER_RETURN_TYPE = 1 << 23;
        const OMIT_DEBUGGING_INFO = 1 << 24;
        const EXPRESSION_TREE_CONVERSION = 1 << 25;
        const INVOKE_SPECIAL_NAME = 1 << 26;
    }
}

/// The flags of one compilation. Not shareable across threads.
#[derive(Debug, Default)]
pub struct ScopeFlagStack {
    current: Cell<ScopeFlags>,
}

impl ScopeFlagStack {
    pub fn new(initial: ScopeFlags) -> Self {
        Self {
            current: Cell::new(initial),
        }
    }

    pub fn current(&self) -> ScopeFlags {
        self.current.get()
    }

    /// Whether every bit of `mask` is set.
    pub fn has_set(&self, mask: ScopeFlags) -> bool {
        self.current().contains(mask)
    }

    pub fn has_any(&self, mask: ScopeFlags) -> bool {
        self.current().intersects(mask)
    }

    /// Replace the bits under `mask` with those of `value` until the guard
    /// is dropped.
    pub fn enter(&self, mask: ScopeFlags, value: ScopeFlags) -> FlagsGuard<'_> {
        let current = self.current.get();
        let saved = current & mask;
        self.current.set((current & !mask) | (value & mask));
        FlagsGuard {
            stack: self,
            mask,
            saved,
        }
    }

    /// Turn every bit of `mask` on for the scope.
    pub fn set(&self, mask: ScopeFlags) -> FlagsGuard<'_> {
        self.enter(mask, mask)
    }

    /// Turn `mask` on or off for the scope.
    pub fn with(&self, mask: ScopeFlags, enable: bool) -> FlagsGuard<'_> {
        self.enter(mask, if enable { mask } else { ScopeFlags::empty() })
    }
}

/// Restores the bits captured by [`ScopeFlagStack::enter`] when dropped.
#[must_use = "the flags are restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct FlagsGuard<'a> {
    stack: &'a ScopeFlagStack,
    mask: ScopeFlags,
    saved: ScopeFlags,
}

impl Drop for FlagsGuard<'_> {
    fn drop(&mut self) {
        let current = self.stack.current.get();
        self.stack.current.set((current & !self.mask) | self.saved);
    }
}
