//! HashMap: key -> value adapter over `RawTable`.
//!
//! Entries hash on the key only. Storage lives behind `Rc<RefCell<..>>` so
//! cursors can observe (and fail fast on) direct mutation of the map.

use crate::cursor::{RawCursor, Shared};
use crate::error::{ConfigError, CursorError, KeyNotFound};
use crate::hash::{
    resolve, DefaultHash, HashFn, NoDefault, TableConfig, DEFAULT_BINS, DEFAULT_LOAD_THRESHOLD,
};
use crate::node::Keyed;
use crate::raw::RawTable;
use core::cell::{Ref, RefCell, RefMut};
use core::fmt;
use core::marker::PhantomData;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MapEntry<K, V> {
    key: K,
    value: V,
}

impl<K: Eq, V> Keyed for MapEntry<K, V> {
    type Key = K;
    fn key(&self) -> &K {
        &self.key
    }
}

/// Separate-chaining map with an injected hash function.
///
/// `D` optionally supplies a compile-time default hash; see [`DefaultHash`].
///
/// # Panics
/// Values borrowed through [`get`](Self::get) or [`get_mut`](Self::get_mut)
/// hold a borrow of the shared storage; using a cursor of the same map
/// while such a borrow is alive panics like `RefCell` does.
pub struct HashMap<K: Eq, V, D = NoDefault> {
    table: Shared<MapEntry<K, V>>,
    _default: PhantomData<D>,
}

impl<K: Eq, V> HashMap<K, V, NoDefault> {
    /// Empty map with one bin and the default load threshold.
    pub fn new(hash: HashFn<K>) -> Self {
        Self::from_raw(RawTable::with_layout(hash, DEFAULT_BINS, DEFAULT_LOAD_THRESHOLD))
    }
}

impl<K: Eq, V, D: DefaultHash<K>> HashMap<K, V, D> {
    fn from_raw(raw: RawTable<MapEntry<K, V>>) -> Self {
        Self {
            table: Rc::new(RefCell::new(raw)),
            _default: PhantomData,
        }
    }

    /// Empty map using the type's default hash.
    pub fn with_default() -> Result<Self, ConfigError> {
        Self::with_config(TableConfig::new())
    }

    pub fn with_config(cfg: TableConfig<K>) -> Result<Self, ConfigError> {
        Ok(Self::from_raw(RawTable::from_config::<D>(cfg)?))
    }

    /// Build from `(key, value)` pairs; later pairs overwrite earlier ones.
    pub fn from_entries<I>(entries: I, cfg: TableConfig<K>) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let it = entries.into_iter();
        let hint = it.size_hint().0;
        let cfg = if hint > cfg.initial_bins {
            cfg.initial_bins(hint)
        } else {
            cfg
        };
        let mut m = Self::with_config(cfg)?;
        m.put_all(it);
        Ok(m)
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
    pub fn hash_fn(&self) -> HashFn<K> {
        self.table.borrow().hash_fn()
    }
    /// Entry count of each bin, in bin order.
    pub fn bin_lengths(&self) -> Vec<usize> {
        self.table.borrow().bin_lengths()
    }

    pub fn has_key(&self, key: &K) -> bool {
        self.table.borrow().contains(key)
    }

    /// Linear scan for any entry holding `value`.
    pub fn has_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.table.borrow().any(|e| e.value == *value)
    }

    pub fn get(&self, key: &K) -> Option<Ref<'_, V>> {
        Ref::filter_map(self.table.borrow(), |t| t.find(key).map(|e| &e.value)).ok()
    }

    /// Like [`get`](Self::get), but an absent key is an error.
    pub fn value_of(&self, key: &K) -> Result<Ref<'_, V>, KeyNotFound> {
        self.get(key).ok_or(KeyNotFound)
    }

    /// In-place update; does not count as a structural change.
    pub fn get_mut(&mut self, key: &K) -> Option<RefMut<'_, V>> {
        RefMut::filter_map(self.table.borrow_mut(), |t| {
            t.find_mut(key).map(|e| &mut e.value)
        })
        .ok()
    }

    /// Store `value` under `key`. Returns the previous value when the key was
    /// present; that overwrite is not structural and keeps cursors valid.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let mut t = self.table.borrow_mut();
        if let Some(e) = t.find_mut(&key) {
            return Some(core::mem::replace(&mut e.value, value));
        }
        let fresh = t.insert(MapEntry { key, value });
        debug_assert!(fresh.is_ok(), "key was checked absent");
        None
    }

    /// Put every pair; returns how many pairs were consumed.
    pub fn put_all<I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut n = 0;
        for (k, v) in entries {
            self.put(k, v);
            n += 1;
        }
        n
    }

    /// Value for `key`, inserting `V::default()` first when absent.
    pub fn get_or_insert_default(&mut self, key: K) -> RefMut<'_, V>
    where
        V: Default,
    {
        let mut t = self.table.borrow_mut();
        let at = match t.locate(&key) {
            Some(at) => at,
            None => match t.insert_slot(MapEntry {
                key,
                value: V::default(),
            }) {
                Ok(at) => at,
                Err(_) => unreachable!("key was checked absent"),
            },
        };
        RefMut::map(t, |t| &mut t.node_mut(at).entry_mut().value)
    }

    pub fn erase(&mut self, key: &K) -> Result<V, KeyNotFound> {
        self.table
            .borrow_mut()
            .erase(key)
            .map(|e| e.value)
            .ok_or(KeyNotFound)
    }

    /// Remove everything; the map returns to one bin and the default threshold.
    pub fn clear(&mut self) {
        self.table.borrow_mut().clear();
    }

    /// Keep only pairs accepted by `keep`; returns how many were removed.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.table.borrow_mut().retain(|e| keep(&e.key, &e.value))
    }

    /// Cursor at the first entry (or past the end when empty).
    pub fn cursor(&self) -> MapCursor<K, V> {
        MapCursor {
            raw: RawCursor::begin(Rc::clone(&self.table)),
        }
    }

    /// Cursor past the last entry.
    pub fn end(&self) -> MapCursor<K, V> {
        MapCursor {
            raw: RawCursor::end(Rc::clone(&self.table)),
        }
    }

    /// Fail-fast iteration over cloned pairs; alias of [`cursor`](Self::cursor).
    pub fn iter(&self) -> MapCursor<K, V> {
        self.cursor()
    }

    /// Snapshot of all pairs in table order.
    pub fn to_vec(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.table
            .borrow()
            .entries()
            .map(|e| (e.key.clone(), e.value.clone()))
            .collect()
    }

    /// Debugging dump of bins and chains.
    pub fn layout(&self) -> String
    where
        K: fmt::Debug,
        V: fmt::Debug,
    {
        self.table.borrow().layout()
    }

    /// Copy into a map that uses `hash`. Entries are rehashed unless `hash`
    /// is the function this map already uses.
    ///
    /// Fails with `ConflictingHashFunctions` when `D` supplies a different default.
    pub fn clone_with_hash(&self, hash: HashFn<K>) -> Result<Self, ConfigError>
    where
        K: Clone,
        V: Clone,
    {
        let hash = resolve(D::HASH, Some(hash))?;
        Ok(Self::from_raw(self.table.borrow().rehashed(hash)))
    }

    /// Copy assignment: replace contents (and hash) with `other`'s.
    pub fn assign_from(&mut self, other: &Self)
    where
        K: Clone,
        V: Clone,
    {
        self.table.borrow_mut().assign_from(&other.table.borrow());
    }
}

impl<K: Eq + Clone, V: Clone, D: DefaultHash<K>> Clone for HashMap<K, V, D> {
    /// Structural copy with the same hash function.
    fn clone(&self) -> Self {
        Self::from_raw(self.table.borrow().clone())
    }
}

impl<K: Eq, V: PartialEq, D> PartialEq for HashMap<K, V, D> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.table, &other.table) || *self.table.borrow() == *other.table.borrow()
    }
}

impl<K: Eq, V: Eq, D> Eq for HashMap<K, V, D> {}

impl<K: Eq, V, D: DefaultHash<K>> Extend<(K, V)> for HashMap<K, V, D> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.put_all(iter);
    }
}

impl<K: Eq + fmt::Debug, V: fmt::Debug, D> fmt::Debug for HashMap<K, V, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.table.borrow();
        f.debug_map()
            .entries(t.entries().map(|e| (&e.key, &e.value)))
            .finish()
    }
}

/// `map[k->v,k->v]`
impl<K: Eq + fmt::Display, V: fmt::Display, D> fmt::Display for HashMap<K, V, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("map[")?;
        for (i, e) in self.table.borrow().entries().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}->{}", e.key, e.value)?;
        }
        f.write_str("]")
    }
}

/// Fail-fast cursor over a [`HashMap`].
///
/// Also an `Iterator` over cloned pairs: each `next` yields the current pair
/// and advances. A stale cursor yields one `Err(ConcurrentModification)` and
/// then ends.
pub struct MapCursor<K: Eq, V> {
    raw: RawCursor<MapEntry<K, V>>,
}

impl<K: Eq, V> MapCursor<K, V> {
    pub fn is_end(&self) -> bool {
        self.raw.is_end()
    }

    /// Bin the cursor is in, `None` past the end.
    pub fn bin_index(&self) -> Option<usize> {
        self.raw.bin()
    }

    pub fn advance(&mut self) -> Result<(), CursorError> {
        self.raw.advance()
    }

    pub fn key(&self) -> Result<K, CursorError>
    where
        K: Clone,
    {
        self.raw.with(|e| e.key.clone())
    }

    pub fn value(&self) -> Result<V, CursorError>
    where
        V: Clone,
    {
        self.raw.with(|e| e.value.clone())
    }

    pub fn entry(&self) -> Result<(K, V), CursorError>
    where
        K: Clone,
        V: Clone,
    {
        self.raw.with(|e| (e.key.clone(), e.value.clone()))
    }

    /// Borrow the current pair.
    ///
    /// # Panics
    /// If `f` mutates the map (or erases through a cursor of it); the
    /// storage stays borrowed while `f` runs.
    pub fn with_entry<R>(&self, f: impl FnOnce(&K, &V) -> R) -> Result<R, CursorError> {
        self.raw.with(|e| f(&e.key, &e.value))
    }

    /// Update the current value in place. Not a structural change.
    ///
    /// # Panics
    /// If `f` touches the map in any way, reads such as `len` included. The
    /// storage stays mutably borrowed while `f` runs.
    pub fn with_value_mut<R>(&self, f: impl FnOnce(&K, &mut V) -> R) -> Result<R, CursorError> {
        self.raw.with_mut(|e| f(&e.key, &mut e.value))
    }

    /// Remove the current pair. The cursor then names the following pair,
    /// reachable after one [`advance`](Self::advance).
    pub fn erase(&mut self) -> Result<(K, V), CursorError> {
        self.raw.erase().map(|e| (e.key, e.value))
    }

    /// Whether both cursors name the same position of the same map.
    pub fn same_position(&self, other: &Self) -> Result<bool, CursorError> {
        self.raw.same_position(&other.raw)
    }
}

impl<K: Eq, V> Clone for MapCursor<K, V> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
        }
    }
}

impl<K: Eq + Clone, V: Clone> Iterator for MapCursor<K, V> {
    type Item = Result<(K, V), CursorError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.raw.step(|e| (e.key.clone(), e.value.clone()))
    }
}
