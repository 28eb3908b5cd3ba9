//! RawCursor: fail-fast position over a shared `RawTable`.
//!
//! A cursor is `(bin, node)` plus a snapshot of the table's `mod_count`.
//! Every operation first compares the snapshot with the table; a mismatch
//! is `ConcurrentModification` and nothing else is checked. Erasing through
//! the cursor shifts the successor into the current node, resynchronizes
//! the snapshot, and leaves the cursor "pending": it already names the next
//! element, so the following `advance` only clears the flag.

use crate::error::CursorError;
use crate::node::{Keyed, NodeKey};
use crate::raw::RawTable;
use core::cell::RefCell;
use std::rc::Rc;

/// Storage shared by a table adapter and its cursors.
pub(crate) type Shared<E> = Rc<RefCell<RawTable<E>>>;

pub(crate) struct RawCursor<E: Keyed> {
    owner: Shared<E>,
    bin: Option<usize>,
    node: Option<NodeKey>,
    expected_mod_count: u64,
    can_erase: bool,
    halted: bool,
}

impl<E: Keyed> RawCursor<E> {
    /// Positioned at the head of the first non-empty bin, or past the end.
    pub(crate) fn begin(owner: Shared<E>) -> Self {
        let (first, expected) = {
            let t = owner.borrow();
            (t.first_from(0), t.mod_count())
        };
        Self {
            bin: first.map(|(b, _)| b),
            node: first.map(|(_, n)| n),
            owner,
            expected_mod_count: expected,
            can_erase: true,
            halted: false,
        }
    }

    pub(crate) fn end(owner: Shared<E>) -> Self {
        let expected = owner.borrow().mod_count();
        Self {
            owner,
            bin: None,
            node: None,
            expected_mod_count: expected,
            can_erase: true,
            halted: false,
        }
    }

    #[inline]
    fn check_sync(&self, t: &RawTable<E>) -> Result<(), CursorError> {
        if t.mod_count() != self.expected_mod_count {
            return Err(CursorError::ConcurrentModification);
        }
        Ok(())
    }

    pub(crate) fn is_end(&self) -> bool {
        self.node.is_none()
    }

    pub(crate) fn bin(&self) -> Option<usize> {
        self.bin
    }

    /// Move to the next entry. Past the end this is a no-op; after an erase
    /// it only clears the pending flag unless the cursor sits on a sentinel.
    pub(crate) fn advance(&mut self) -> Result<(), CursorError> {
        let t = self.owner.borrow();
        self.check_sync(&t)?;
        let Some(at) = self.node else {
            return Ok(());
        };
        let bin = self.bin.expect("positioned cursor must have a bin");
        let here = t.node(at);
        if self.can_erase || here.is_sentinel() {
            match here.next() {
                Some(next) if !t.node(next).is_sentinel() => self.node = Some(next),
                _ => match t.first_from(bin + 1) {
                    Some((b, head)) => {
                        self.bin = Some(b);
                        self.node = Some(head);
                    }
                    None => {
                        self.bin = None;
                        self.node = None;
                    }
                },
            }
        }
        self.can_erase = true;
        Ok(())
    }

    fn readable(&self, t: &RawTable<E>) -> Result<NodeKey, CursorError> {
        self.check_sync(t)?;
        match self.node {
            Some(at) if self.can_erase => Ok(at),
            _ => Err(CursorError::PositionInvalid),
        }
    }

    /// Read the current entry.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&E) -> R) -> Result<R, CursorError> {
        let t = self.owner.borrow();
        let at = self.readable(&t)?;
        Ok(f(t.node(at).entry()))
    }

    /// Write access to the current entry. Callers must not change its key.
    pub(crate) fn with_mut<R>(&self, f: impl FnOnce(&mut E) -> R) -> Result<R, CursorError> {
        let mut t = self.owner.borrow_mut();
        let at = self.readable(&t)?;
        Ok(f(t.node_mut(at).entry_mut()))
    }

    /// Remove the current entry and return it.
    pub(crate) fn erase(&mut self) -> Result<E, CursorError> {
        let mut t = self.owner.borrow_mut();
        self.check_sync(&t)?;
        if !self.can_erase {
            return Err(CursorError::AlreadyErased);
        }
        let Some(at) = self.node else {
            return Err(CursorError::PastEnd);
        };
        let value = t.shift_remove(at);
        self.expected_mod_count = t.mod_count();
        self.can_erase = false;
        Ok(value)
    }

    /// Position equality. Both cursors must belong to the same table.
    pub(crate) fn same_position(&self, other: &Self) -> Result<bool, CursorError> {
        self.check_sync(&self.owner.borrow())?;
        if !Rc::ptr_eq(&self.owner, &other.owner) {
            return Err(CursorError::IncomparableIterators);
        }
        Ok(self.node == other.node)
    }

    /// Iterator step: yield the current entry through `f`, then advance.
    /// A pending erase is consumed first. After an error, yields `None`.
    pub(crate) fn step<R>(&mut self, f: impl FnOnce(&E) -> R) -> Option<Result<R, CursorError>> {
        if self.halted {
            return None;
        }
        match self.try_step(f) {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => None,
            Err(e) => {
                self.halted = true;
                Some(Err(e))
            }
        }
    }

    fn try_step<R>(&mut self, f: impl FnOnce(&E) -> R) -> Result<Option<R>, CursorError> {
        if !self.can_erase {
            self.advance()?;
        }
        if self.is_end() {
            // still fail fast on a stale cursor at the end
            self.check_sync(&self.owner.borrow())?;
            return Ok(None);
        }
        let item = self.with(f)?;
        self.advance()?;
        Ok(Some(item))
    }
}

impl<E: Keyed> Clone for RawCursor<E> {
    fn clone(&self) -> Self {
        Self {
            owner: Rc::clone(&self.owner),
            bin: self.bin,
            node: self.node,
            expected_mod_count: self.expected_mod_count,
            can_erase: self.can_erase,
            halted: self.halted,
        }
    }
}
