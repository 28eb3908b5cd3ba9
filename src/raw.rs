//! RawTable: the separate-chaining core shared by `HashMap` and `HashSet`.
//!
//! Storage is a `SlotMap` arena of nodes plus a `Vec` of bin heads. Each bin
//! owns one sentinel-terminated chain; new entries are prepended. The table
//! keeps `len / bins <= load_threshold` after every insertion by doubling the
//! bin count and relinking every node (one rehash per insertion at most).
//!
//! `mod_count` advances on every structural change (insert, erase, clear,
//! rehash, retain that removed something) and never on lookups or in-place
//! value updates. Cursors compare against it to fail fast.

use crate::error::ConfigError;
use crate::guard::OpGuard;
use crate::hash::{
    same_fn, DefaultHash, HashFn, TableConfig, TableParams, DEFAULT_BINS, DEFAULT_LOAD_THRESHOLD,
    MAX_BINS,
};
use crate::node::{Arena, Keyed, Node, NodeKey};
use core::fmt;
use core::mem;

/// Bin index of `key` among `bins` bins.
#[inline]
fn compress<K>(hash: HashFn<K>, key: &K, bins: usize) -> usize {
    (hash(key).unsigned_abs() % bins as u64) as usize
}

pub struct RawTable<E: Keyed> {
    hash: HashFn<E::Key>,
    nodes: Arena<E>,
    bins: Vec<NodeKey>, // heads; bins.len() >= 1
    load_threshold: f64,
    used: usize,
    mod_count: u64,
    guard: OpGuard,
}

impl<E: Keyed> RawTable<E> {
    /// Build a table from a validated configuration.
    pub fn from_config<D: DefaultHash<E::Key>>(
        cfg: TableConfig<E::Key>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::from_params(cfg.resolve::<D>()?))
    }

    pub(crate) fn from_params(p: TableParams<E::Key>) -> Self {
        Self::with_layout(p.hash, p.bins, p.load_threshold)
    }

    pub(crate) fn with_layout(hash: HashFn<E::Key>, bins: usize, load_threshold: f64) -> Self {
        let bins = bins.max(1);
        let mut nodes = Arena::with_capacity_and_key(bins);
        let heads = (0..bins).map(|_| nodes.insert(Node::Sentinel)).collect();
        Self {
            hash,
            nodes,
            bins: heads,
            load_threshold,
            used: 0,
            mod_count: 0,
            guard: OpGuard::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.used
    }
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }
    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }
    pub fn load_threshold(&self) -> f64 {
        self.load_threshold
    }
    pub fn hash_fn(&self) -> HashFn<E::Key> {
        self.hash
    }
    pub(crate) fn mod_count(&self) -> u64 {
        self.mod_count
    }

    #[inline]
    fn bin_of(&self, key: &E::Key) -> usize {
        compress(self.hash, key, self.bins.len())
    }

    /// Walk `bin`'s chain for `key`; returns the matching node.
    fn chain_find(&self, bin: usize, key: &E::Key) -> Option<NodeKey> {
        let mut cur = self.bins[bin];
        while let Node::Entry { value, next } = &self.nodes[cur] {
            if value.key() == key {
                return Some(cur);
            }
            cur = *next;
        }
        None
    }

    pub fn contains(&self, key: &E::Key) -> bool {
        self.find(key).is_some()
    }

    pub fn find(&self, key: &E::Key) -> Option<&E> {
        let at = self.locate(key)?;
        self.nodes[at].value()
    }

    /// Node holding `key`, if any.
    pub(crate) fn locate(&self, key: &E::Key) -> Option<NodeKey> {
        let _g = self.guard.enter("find");
        self.chain_find(self.bin_of(key), key)
    }

    /// Mutable access to a stored entry. Callers must not change its key.
    pub fn find_mut(&mut self, key: &E::Key) -> Option<&mut E> {
        let at = {
            let _g = self.guard.enter("find_mut");
            self.chain_find(self.bin_of(key), key)?
        };
        self.nodes[at].value_mut()
    }

    /// Insert a new entry. A present key is left untouched and the entry is
    /// handed back.
    pub fn insert(&mut self, entry: E) -> Result<(), E> {
        self.insert_slot(entry).map(|_| ())
    }

    pub(crate) fn insert_slot(&mut self, entry: E) -> Result<NodeKey, E> {
        {
            let _g = self.guard.enter("insert");
            if self.chain_find(self.bin_of(entry.key()), entry.key()).is_some() {
                return Err(entry);
            }
        }
        let new_used = self.used + 1;
        self.ensure_load_threshold(new_used);
        let _g = self.guard.enter("insert");
        let bin = self.bin_of(entry.key());
        let head = self.bins[bin];
        let at = self.nodes.insert(Node::Entry {
            value: entry,
            next: head,
        });
        self.bins[bin] = at;
        self.used = new_used;
        self.mod_count = self.mod_count.wrapping_add(1);
        Ok(at)
    }

    /// Remove the entry for `key`, splicing it out of its chain.
    pub fn erase(&mut self, key: &E::Key) -> Option<E> {
        let _g = self.guard.enter("erase");
        let bin = self.bin_of(key);
        let mut prev: Option<NodeKey> = None;
        let mut cur = self.bins[bin];
        loop {
            match &self.nodes[cur] {
                Node::Sentinel => return None,
                Node::Entry { value, next } => {
                    if value.key() == key {
                        break;
                    }
                    prev = Some(cur);
                    cur = *next;
                }
            }
        }
        let (value, next) = self
            .nodes
            .remove(cur)
            .and_then(Node::into_entry)
            .expect("matched node must be a live entry");
        match prev {
            None => self.bins[bin] = next,
            Some(p) => self.nodes[p].set_next(next),
        }
        self.used -= 1;
        self.mod_count = self.mod_count.wrapping_add(1);
        Some(value)
    }

    /// Keep only entries for which `keep` returns true. Returns how many were removed.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&E) -> bool,
    {
        let _g = self.guard.enter("retain");
        let mut removed = 0;
        for bin in 0..self.bins.len() {
            let mut prev: Option<NodeKey> = None;
            let mut cur = self.bins[bin];
            while let Some(next) = self.nodes[cur].next() {
                if keep(self.nodes[cur].entry()) {
                    prev = Some(cur);
                } else {
                    self.nodes.remove(cur);
                    match prev {
                        None => self.bins[bin] = next,
                        Some(p) => self.nodes[p].set_next(next),
                    }
                    removed += 1;
                }
                cur = next;
            }
        }
        if removed > 0 {
            self.used -= removed;
            self.mod_count = self.mod_count.wrapping_add(1);
        }
        removed
    }

    /// Drop every entry and return to a single empty bin. The load threshold
    /// is reset to `DEFAULT_LOAD_THRESHOLD`; the hash function is kept.
    pub fn clear(&mut self) {
        let _g = self.guard.enter("clear");
        log::trace!(
            "clear: dropping {} entries across {} bins",
            self.used,
            self.bins.len()
        );
        self.nodes.clear();
        self.bins.clear();
        for _ in 0..DEFAULT_BINS {
            self.bins.push(self.nodes.insert(Node::Sentinel));
        }
        self.used = 0;
        self.load_threshold = DEFAULT_LOAD_THRESHOLD;
        self.mod_count = self.mod_count.wrapping_add(1);
    }

    /// Grow before an insertion would push `new_used / bins` above the threshold.
    ///
    /// # Panics
    /// If the required bin count exceeds `MAX_BINS`.
    fn ensure_load_threshold(&mut self, new_used: usize) {
        let mut bins = self.bins.len();
        while new_used as f64 / bins as f64 > self.load_threshold {
            bins = bins
                .checked_mul(2)
                .filter(|&b| b <= MAX_BINS)
                .expect("hash table capacity overflow");
        }
        if bins != self.bins.len() {
            self.rehash(bins);
        }
    }

    /// Relink every node into a fresh array of `new_bins` sentinel-terminated bins.
    fn rehash(&mut self, new_bins: usize) {
        let _g = self.guard.enter("rehash");
        log::trace!(
            "rehash: {} -> {} bins ({} entries)",
            self.bins.len(),
            new_bins,
            self.used
        );
        let mut fresh = Vec::with_capacity(new_bins);
        for _ in 0..new_bins {
            fresh.push(self.nodes.insert(Node::Sentinel));
        }
        let old = mem::replace(&mut self.bins, fresh);
        for head in old {
            let mut cur = head;
            loop {
                let Some(next) = self.nodes[cur].next() else {
                    self.nodes.remove(cur);
                    break;
                };
                let bin = compress(self.hash, self.nodes[cur].entry().key(), new_bins);
                self.nodes[cur].set_next(self.bins[bin]);
                self.bins[bin] = cur;
                cur = next;
            }
        }
        self.mod_count = self.mod_count.wrapping_add(1);
    }

    /// Iterate entries in bin order, then chain order.
    pub fn entries(&self) -> Entries<'_, E> {
        Entries {
            nodes: &self.nodes,
            bins: &self.bins,
            bin: 0,
            cur: self.bins[0],
            remaining: self.used,
        }
    }

    pub fn any<F>(&self, pred: F) -> bool
    where
        F: FnMut(&E) -> bool,
    {
        self.entries().any(pred)
    }

    /// Number of entries in each bin, in bin order.
    pub fn bin_lengths(&self) -> Vec<usize> {
        (0..self.bins.len())
            .map(|b| {
                let mut n = 0;
                let mut cur = self.bins[b];
                while let Some(next) = self.nodes[cur].next() {
                    n += 1;
                    cur = next;
                }
                n
            })
            .collect()
    }

    /// Debugging dump, one line per bin: `i : [e, e]`.
    pub fn layout(&self) -> String
    where
        E: fmt::Debug,
    {
        let mut out = String::new();
        for (b, &head) in self.bins.iter().enumerate() {
            let mut items = Vec::new();
            let mut cur = head;
            while let Node::Entry { value, next } = &self.nodes[cur] {
                items.push(format!("{value:?}"));
                cur = *next;
            }
            out.push_str(&format!("{b} : [{}]\n", items.join(", ")));
        }
        out
    }

    /// Copy using `hash`. Identical hash: structural copy. Otherwise every
    /// entry is reinserted, since bin placement depends on the hash.
    pub fn rehashed(&self, hash: HashFn<E::Key>) -> Self
    where
        E: Clone,
    {
        if same_fn(hash, self.hash) {
            return self.clone();
        }
        log::trace!("copy with a different hash: reinserting {} entries", self.used);
        let mut t = Self::with_layout(hash, self.bins.len(), self.load_threshold);
        for e in self.entries() {
            let fresh = t.insert(e.clone());
            debug_assert!(fresh.is_ok(), "source keys are unique");
        }
        t
    }

    /// Copy assignment: clear, adopt `other`'s hash, reinsert its entries.
    pub fn assign_from(&mut self, other: &Self)
    where
        E: Clone,
    {
        self.clear();
        self.hash = other.hash;
        for e in other.entries() {
            let fresh = self.insert(e.clone());
            debug_assert!(fresh.is_ok(), "source keys are unique");
        }
        self.mod_count = self.mod_count.wrapping_add(1);
    }

    // Cursor support.

    /// First non-empty bin at or after `from`, with its head node.
    pub(crate) fn first_from(&self, from: usize) -> Option<(usize, NodeKey)> {
        (from..self.bins.len())
            .map(|b| (b, self.bins[b]))
            .find(|&(_, head)| !self.nodes[head].is_sentinel())
    }

    pub(crate) fn node(&self, at: NodeKey) -> &Node<E> {
        &self.nodes[at]
    }

    pub(crate) fn node_mut(&mut self, at: NodeKey) -> &mut Node<E> {
        &mut self.nodes[at]
    }

    /// Remove the entry at `at` by moving its successor's content into it
    /// and freeing the successor cell. `at` then names what followed it
    /// (possibly the bin's sentinel).
    pub(crate) fn shift_remove(&mut self, at: NodeKey) -> E {
        let _g = self.guard.enter("shift_remove");
        let next = self.nodes[at]
            .next()
            .expect("cursor must name a live entry");
        let successor = self
            .nodes
            .remove(next)
            .expect("successor must be linked in the chain");
        let (value, _) = mem::replace(&mut self.nodes[at], successor)
            .into_entry()
            .expect("cursor must name a live entry");
        self.used -= 1;
        self.mod_count = self.mod_count.wrapping_add(1);
        value
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let lens = self.bin_lengths();
        assert_eq!(lens.iter().sum::<usize>(), self.used, "used != reachable entries");
        assert_eq!(
            self.nodes.len(),
            self.used + self.bins.len(),
            "arena holds unreachable nodes"
        );
        assert!(
            self.used as f64 / self.bins.len() as f64 <= self.load_threshold
                || self.used == 0,
            "load threshold exceeded: {} / {}",
            self.used,
            self.bins.len()
        );
        for (b, e) in self.entries_with_bins() {
            assert_eq!(compress(self.hash, e.key(), self.bins.len()), b);
        }
    }

    #[cfg(test)]
    fn entries_with_bins(&self) -> Vec<(usize, &E)> {
        let mut out = Vec::new();
        for (b, &head) in self.bins.iter().enumerate() {
            let mut cur = head;
            while let Node::Entry { value, next } = &self.nodes[cur] {
                out.push((b, value));
                cur = *next;
            }
        }
        out
    }
}

impl<E: Keyed + Clone> Clone for RawTable<E> {
    /// Structural copy: same bins, same chains, same hash.
    fn clone(&self) -> Self {
        Self {
            hash: self.hash,
            nodes: self.nodes.clone(),
            bins: self.bins.clone(),
            load_threshold: self.load_threshold,
            used: self.used,
            mod_count: 0,
            guard: OpGuard::new(),
        }
    }
}

/// Equal iff same length and every entry of one has an equal entry under the
/// same key in the other. Bin layout and chain order are ignored.
impl<E: Keyed + PartialEq> PartialEq for RawTable<E> {
    fn eq(&self, other: &Self) -> bool {
        if core::ptr::eq(self, other) {
            return true;
        }
        self.used == other.used
            && other
                .entries()
                .all(|e| self.find(e.key()).is_some_and(|mine| mine == e))
    }
}

impl<E: Keyed + fmt::Debug> fmt::Debug for RawTable<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawTable")
            .field("bins", &self.bins.len())
            .field("used", &self.used)
            .field("load_threshold", &self.load_threshold)
            .field("entries", &self.entries().collect::<Vec<_>>())
            .finish()
    }
}

/// Borrowing iterator over a table's entries.
pub struct Entries<'a, E> {
    nodes: &'a Arena<E>,
    bins: &'a [NodeKey],
    bin: usize,
    cur: NodeKey,
    remaining: usize,
}

impl<'a, E> Iterator for Entries<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &self.nodes[self.cur] {
                Node::Entry { value, next } => {
                    self.cur = *next;
                    self.remaining -= 1;
                    return Some(value);
                }
                Node::Sentinel => {
                    self.bin += 1;
                    if self.bin >= self.bins.len() {
                        return None;
                    }
                    self.cur = self.bins[self.bin];
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<E> ExactSizeIterator for Entries<'_, E> {}
