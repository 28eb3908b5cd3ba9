//! HashSet: element-only adapter over `RawTable`.
//!
//! Counts instead of errors: `insert` and `erase` report 1 or 0 and never
//! fail.

use crate::cursor::{RawCursor, Shared};
use crate::error::{ConfigError, CursorError};
use crate::hash::{
    resolve, DefaultHash, HashFn, NoDefault, TableConfig, DEFAULT_BINS, DEFAULT_LOAD_THRESHOLD,
};
use crate::node::Keyed;
use crate::raw::RawTable;
use core::cell::RefCell;
use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;
use std::rc::Rc;

#[derive(Clone, PartialEq, Eq)]
pub(crate) struct Element<T>(T);

impl<T: Eq> Keyed for Element<T> {
    type Key = T;
    fn key(&self) -> &T {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for Element<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Separate-chaining set with an injected hash function.
pub struct HashSet<T: Eq, D = NoDefault> {
    table: Shared<Element<T>>,
    _default: PhantomData<D>,
}

impl<T: Eq> HashSet<T, NoDefault> {
    /// Empty set with one bin and the default load threshold.
    pub fn new(hash: HashFn<T>) -> Self {
        Self::from_raw(RawTable::with_layout(hash, DEFAULT_BINS, DEFAULT_LOAD_THRESHOLD))
    }
}

impl<T: Eq, D: DefaultHash<T>> HashSet<T, D> {
    fn from_raw(raw: RawTable<Element<T>>) -> Self {
        Self {
            table: Rc::new(RefCell::new(raw)),
            _default: PhantomData,
        }
    }

    pub fn with_default() -> Result<Self, ConfigError> {
        Self::with_config(TableConfig::new())
    }

    pub fn with_config(cfg: TableConfig<T>) -> Result<Self, ConfigError> {
        Ok(Self::from_raw(RawTable::from_config::<D>(cfg)?))
    }

    /// Build from elements; duplicates collapse.
    pub fn from_elements<I>(elements: I, cfg: TableConfig<T>) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
    {
        let it = elements.into_iter();
        let hint = it.size_hint().0;
        let cfg = if hint > cfg.initial_bins {
            cfg.initial_bins(hint)
        } else {
            cfg
        };
        let mut s = Self::with_config(cfg)?;
        s.insert_all(it);
        Ok(s)
    }

    pub fn len(&self) -> usize {
        self.table.borrow().len()
    }
    pub fn is_empty(&self) -> bool {
        self.table.borrow().is_empty()
    }
    pub fn bin_count(&self) -> usize {
        self.table.borrow().bin_count()
    }
    pub fn load_threshold(&self) -> f64 {
        self.table.borrow().load_threshold()
    }
    pub fn hash_fn(&self) -> HashFn<T> {
        self.table.borrow().hash_fn()
    }
    pub fn bin_lengths(&self) -> Vec<usize> {
        self.table.borrow().bin_lengths()
    }

    pub fn contains(&self, element: &T) -> bool {
        self.table.borrow().contains(element)
    }

    /// True if every element of `elements` is in the set.
    pub fn contains_all<'a, I>(&self, elements: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let t = self.table.borrow();
        elements.into_iter().all(|e| t.contains(e))
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.table, &other.table) {
            return true;
        }
        let (mine, theirs) = (self.table.borrow(), other.table.borrow());
        mine.len() <= theirs.len() && mine.entries().all(|e| theirs.contains(&e.0))
    }

    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }

    /// Add `element`. Returns 1 if it was added, 0 if already present.
    pub fn insert(&mut self, element: T) -> usize {
        match self.table.borrow_mut().insert(Element(element)) {
            Ok(()) => 1,
            Err(_) => 0,
        }
    }

    /// Remove `element`. Returns 1 if it was present, 0 otherwise.
    pub fn erase(&mut self, element: &T) -> usize {
        usize::from(self.table.borrow_mut().erase(element).is_some())
    }

    /// Number of elements actually added.
    pub fn insert_all<I>(&mut self, elements: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        elements.into_iter().map(|e| self.insert(e)).sum()
    }

    /// Number of elements actually removed.
    pub fn erase_all<'a, I>(&mut self, elements: I) -> usize
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        elements.into_iter().map(|e| self.erase(e)).sum()
    }

    /// Keep only elements that also appear in `keep`. Returns how many were removed.
    pub fn retain_all<I>(&mut self, keep: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let mut t = self.table.borrow_mut();
        let mut wanted = RawTable::with_layout(t.hash_fn(), DEFAULT_BINS, DEFAULT_LOAD_THRESHOLD);
        for e in keep {
            // repeats in `keep` are already wanted
            wanted.insert(Element(e)).ok();
        }
        t.retain(|e| wanted.contains(&e.0))
    }

    /// Keep only elements accepted by `keep`; returns how many were removed.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        self.table.borrow_mut().retain(|e| keep(&e.0))
    }

    /// Remove everything; the set returns to one bin and the default threshold.
    pub fn clear(&mut self) {
        self.table.borrow_mut().clear();
    }

    pub fn cursor(&self) -> SetCursor<T> {
        SetCursor {
            raw: RawCursor::begin(Rc::clone(&self.table)),
        }
    }

    pub fn end(&self) -> SetCursor<T> {
        SetCursor {
            raw: RawCursor::end(Rc::clone(&self.table)),
        }
    }

    pub fn iter(&self) -> SetCursor<T> {
        self.cursor()
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.table.borrow().entries().map(|e| e.0.clone()).collect()
    }

    pub fn layout(&self) -> String
    where
        T: fmt::Debug,
    {
        self.table.borrow().layout()
    }

    /// Copy into a set that uses `hash`, rehashing unless it is the same function.
    /// Fails like [`with_config`](Self::with_config) when `D` disagrees with `hash`.
    pub fn clone_with_hash(&self, hash: HashFn<T>) -> Result<Self, ConfigError>
    where
        T: Clone,
    {
        let hash = resolve(D::HASH, Some(hash))?;
        Ok(Self::from_raw(self.table.borrow().rehashed(hash)))
    }

    /// Copy assignment: replace contents (and hash) with `other`'s.
    pub fn assign_from(&mut self, other: &Self)
    where
        T: Clone,
    {
        self.table.borrow_mut().assign_from(&other.table.borrow());
    }
}

impl<T: Eq + Clone, D: DefaultHash<T>> Clone for HashSet<T, D> {
    fn clone(&self) -> Self {
        Self::from_raw(self.table.borrow().clone())
    }
}

impl<T: Eq, D> PartialEq for HashSet<T, D> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.table, &other.table) || *self.table.borrow() == *other.table.borrow()
    }
}

impl<T: Eq, D> Eq for HashSet<T, D> {}

/// Ordered by inclusion: `a <= b` iff `a` is a subset of `b`.
impl<T: Eq, D: DefaultHash<T>> PartialOrd for HashSet<T, D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.is_subset(other), other.is_subset(self)) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }
}

impl<T: Eq, D: DefaultHash<T>> Extend<T> for HashSet<T, D> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.insert_all(iter);
    }
}

impl<T: Eq + fmt::Debug, D> fmt::Debug for HashSet<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.table.borrow();
        f.debug_set().entries(t.entries().map(|e| &e.0)).finish()
    }
}

/// `set[a,b]`
impl<T: Eq + fmt::Display, D> fmt::Display for HashSet<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("set[")?;
        for (i, e) in self.table.borrow().entries().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", e.0)?;
        }
        f.write_str("]")
    }
}

/// Fail-fast cursor over a [`HashSet`]. Elements are read-only.
pub struct SetCursor<T: Eq> {
    raw: RawCursor<Element<T>>,
}

impl<T: Eq> SetCursor<T> {
    pub fn is_end(&self) -> bool {
        self.raw.is_end()
    }

    pub fn bin_index(&self) -> Option<usize> {
        self.raw.bin()
    }

    pub fn advance(&mut self) -> Result<(), CursorError> {
        self.raw.advance()
    }

    pub fn get(&self) -> Result<T, CursorError>
    where
        T: Clone,
    {
        self.raw.with(|e| e.0.clone())
    }

    /// Borrow the current element.
    ///
    /// # Panics
    /// If `f` mutates the set; the storage stays borrowed while `f` runs.
    pub fn with_current<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, CursorError> {
        self.raw.with(|e| f(&e.0))
    }

    /// Remove the current element; see [`MapCursor::erase`](crate::MapCursor::erase).
    pub fn erase(&mut self) -> Result<T, CursorError> {
        self.raw.erase().map(|e| e.0)
    }

    pub fn same_position(&self, other: &Self) -> Result<bool, CursorError> {
        self.raw.same_position(&other.raw)
    }
}

impl<T: Eq> Clone for SetCursor<T> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
        }
    }
}

impl<T: Eq + Clone> Iterator for SetCursor<T> {
    type Item = Result<T, CursorError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.raw.step(|e| e.0.clone())
    }
}
