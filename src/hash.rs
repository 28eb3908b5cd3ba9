//! Hash strategies and table configuration.
//!
//! A table's hash function is a plain `fn` pointer chosen once, either as a
//! type-level default (`DefaultHash`) or at runtime through `TableConfig`.
//! When both are present they must be the same function by address.

use crate::error::ConfigError;
use core::fmt;
use core::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;

/// Injected hash function. Must be deterministic and pure.
pub type HashFn<K> = fn(&K) -> i64;

/// Bin count a table starts with (and returns to on `clear`).
pub const DEFAULT_BINS: usize = 1;

/// Load threshold used when none is configured and restored by `clear`.
pub const DEFAULT_LOAD_THRESHOLD: f64 = 1.0;

/// Upper bound on a table's bin count. Growth past it panics.
pub const MAX_BINS: usize = 1 << (usize::BITS - 8);

/// Compile-time hash default, selected through a table's type parameter.
///
/// ```
/// use chainmap::{DefaultHash, HashFn, HashMap};
///
/// fn len_hash(s: &String) -> i64 { s.len() as i64 }
///
/// struct ByLen;
/// impl DefaultHash<String> for ByLen {
///     const HASH: Option<HashFn<String>> = Some(len_hash);
/// }
///
/// let mut m: HashMap<String, u32, ByLen> = HashMap::with_default().unwrap();
/// m.put("abc".to_string(), 1);
/// assert!(m.has_key(&"abc".to_string()));
/// ```
pub trait DefaultHash<K> {
    const HASH: Option<HashFn<K>>;
}

/// No compile-time default; a runtime hash must be supplied.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoDefault;

impl<K> DefaultHash<K> for NoDefault {
    const HASH: Option<HashFn<K>> = None;
}

/// Identity of a hash function is its address.
#[inline]
pub(crate) fn same_fn<K>(a: HashFn<K>, b: HashFn<K>) -> bool {
    a as usize == b as usize
}

/// Pick the unique hash function from a type default and a runtime choice.
pub fn resolve<K>(
    compile: Option<HashFn<K>>,
    runtime: Option<HashFn<K>>,
) -> Result<HashFn<K>, ConfigError> {
    match (compile, runtime) {
        (None, None) => Err(ConfigError::MissingHashFunction),
        (Some(c), Some(r)) if !same_fn(c, r) => Err(ConfigError::ConflictingHashFunctions),
        (Some(f), _) | (None, Some(f)) => Ok(f),
    }
}

/// Hash any `K: Hash` with SipHash under fixed keys. Stable across runs.
///
/// Note that a generic instantiation may be emitted more than once by the
/// compiler, so two `std_hash::<K>` pointers are not guaranteed to compare
/// identical across crates; pass one pointer around when identity matters.
pub fn std_hash<K: Hash>(key: &K) -> i64 {
    let mut h = DefaultHasher::new();
    key.hash(&mut h);
    h.finish() as i64
}

/// Integer keys hash to themselves.
pub fn int_hash<K: Copy + Into<i64>>(key: &K) -> i64 {
    (*key).into()
}

/// Builder for table construction parameters.
pub struct TableConfig<K> {
    pub(crate) hash: Option<HashFn<K>>,
    pub(crate) initial_bins: usize,
    pub(crate) load_threshold: f64,
}

impl<K> TableConfig<K> {
    pub fn new() -> Self {
        Self {
            hash: None,
            initial_bins: DEFAULT_BINS,
            load_threshold: DEFAULT_LOAD_THRESHOLD,
        }
    }

    /// Runtime hash function.
    pub fn hash(mut self, f: HashFn<K>) -> Self {
        self.hash = Some(f);
        self
    }

    /// Starting bin count, clamped to `1..=MAX_BINS`.
    pub fn initial_bins(mut self, bins: usize) -> Self {
        self.initial_bins = bins.clamp(1, MAX_BINS);
        self
    }

    /// Maximum `len / bins` ratio tolerated after an insertion. It must be
    /// finite, positive, and reachable for one entry: `1 / threshold` may
    /// not exceed `MAX_BINS / 2`.
    pub fn load_threshold(mut self, threshold: f64) -> Self {
        self.load_threshold = threshold;
        self
    }

    /// Validate against the type default `D` and produce resolved parameters.
    pub(crate) fn resolve<D: DefaultHash<K>>(self) -> Result<TableParams<K>, ConfigError> {
        let hash = resolve(D::HASH, self.hash)?;
        if !valid_threshold(self.load_threshold) {
            return Err(ConfigError::InvalidLoadThreshold);
        }
        Ok(TableParams {
            hash,
            bins: self.initial_bins.clamp(1, MAX_BINS),
            load_threshold: self.load_threshold,
        })
    }
}

// Doubling from any start overshoots the bins one entry needs by less than
// 2x, so `1 / t <= MAX_BINS / 2` keeps the first insertion under the cap.
fn valid_threshold(t: f64) -> bool {
    t.is_finite() && t > 0.0 && 1.0 / t <= (MAX_BINS / 2) as f64
}

impl<K> Default for TableConfig<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Clone for TableConfig<K> {
    fn clone(&self) -> Self {
        Self {
            hash: self.hash,
            initial_bins: self.initial_bins,
            load_threshold: self.load_threshold,
        }
    }
}

impl<K> fmt::Debug for TableConfig<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableConfig")
            .field("hash", &self.hash.map(|h| h as usize as *const ()))
            .field("initial_bins", &self.initial_bins)
            .field("load_threshold", &self.load_threshold)
            .finish()
    }
}

/// Validated construction parameters.
pub(crate) struct TableParams<K> {
    pub(crate) hash: HashFn<K>,
    pub(crate) bins: usize,
    pub(crate) load_threshold: f64,
}
