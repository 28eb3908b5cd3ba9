//! chainmap: a separate-chaining hash map and hash set with an injected
//! hash function and fail-fast cursors.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a chained table whose invariants (load bound, exact size,
//!   structural version) can be checked after every operation, with
//!   cursors that detect concurrent modification instead of misbehaving.
//! - Layers:
//!   - RawTable<E>: structural core. Bins are heads of sentinel-terminated
//!     chains whose nodes live in a generational arena; includes a
//!     debug-only reentrancy guard around chain walks and splices.
//!   - RawCursor<E>: `(bin, node)` position plus a snapshot of the table's
//!     modification counter; supports erase-at-cursor by shifting the
//!     successor into the current node.
//!   - HashMap<K, V, D> / HashSet<T, D>: public adapters. The map errors on
//!     erasing an absent key; the set reports 0/1 counts and never fails.
//!
//! Constraints
//! - Single-threaded: adapters and cursors are `!Send`/`!Sync`.
//! - The hash function is a plain `fn(&K) -> i64`, fixed at construction.
//!   A compile-time default (`DefaultHash`) and a runtime choice may both be
//!   given only if they are the same function by address.
//! - After every insertion `len / bins <= load_threshold`; growth doubles
//!   the bin count and relinks nodes without reallocating entries.
//!
//! Modification counter
//! - Bumped by insert, erase, clear, rehash, copy assignment, and any
//!   retain that removed something. Not bumped by lookups, in-place value
//!   updates, overwriting `put`, or a duplicate set `insert`.
//! - Cursors compare their snapshot first in every operation. A cursor's
//!   own erase resynchronizes that cursor only.
//!
//! Shared storage
//! - Adapters keep the core in `Rc<RefCell<..>>` and cursors hold a strong
//!   clone, so mutating the map while a cursor exists is allowed and is
//!   detected at the cursor's next use. Cursor identity is storage identity.
//!
//! Notes and non-goals
//! - No shrinking: bins only grow, except `clear` which returns to one bin
//!   and resets the load threshold to `DEFAULT_LOAD_THRESHOLD`.
//! - Keys are immutable post-insert; cursors give no mutable key access.
//! - No thread safety, persistence, or ordering guarantees.

mod cursor;
pub mod error;
mod guard;
pub mod hash;
mod map;
mod node;
pub mod raw;
mod set;

// Public surface
pub use error::{ConfigError, CursorError, KeyNotFound};
pub use hash::{int_hash, std_hash, DefaultHash, HashFn, NoDefault, TableConfig, MAX_BINS};
pub use map::{HashMap, MapCursor};
pub use node::Keyed;
pub use raw::RawTable;
pub use set::{HashSet, SetCursor};
