//! Debug-only reentrancy guard for the table core.
//!
//! Core operations call user code (the hash function and `Eq`) while a
//! chain may be half-spliced. Entering the same table again from that code
//! is a bug; debug builds panic naming both operations, release builds do
//! nothing.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table tracker. Guard entry points with `let _g = self.guard.enter("op");`.
#[derive(Debug)]
pub(crate) struct OpGuard {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // !Send + !Sync: tables are single-threaded.
    _nosend: PhantomData<*mut ()>,
}

impl OpGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Mark `op` as running. In debug builds, panics if another op is running.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> Entered<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!("reentrant call into hash table: `{op}` while `{outer}` is running");
            }
            self.active.set(Some(op));
            return Entered { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            return Entered { _z: PhantomData };
        }
    }

    #[cfg(all(test, debug_assertions))]
    pub(crate) fn active(&self) -> Option<&'static str> {
        self.active.get()
    }
}

impl Default for OpGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII marker returned by `OpGuard::enter`.
pub(crate) struct Entered<'a> {
    #[cfg(debug_assertions)]
    owner: &'a OpGuard,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.active.set(None);
    }
}
