//! Error kinds surfaced by tables and cursors.

use thiserror::Error;

/// Construction-time configuration failures. Never recovered internally.
#[derive(Error, Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    #[error("no hash function supplied: neither a type default nor a runtime hash was given")]
    MissingHashFunction,
    #[error("type default hash and runtime hash are both supplied and are different functions")]
    ConflictingHashFunctions,
    #[error("load threshold must be finite and strictly positive")]
    InvalidLoadThreshold,
}

/// A map lookup or erase named a key that is not present.
#[derive(Error, Copy, Clone, Debug, Eq, PartialEq)]
#[error("key not found in map")]
pub struct KeyNotFound;

/// Cursor misuse or a stale cursor.
#[derive(Error, Copy, Clone, Debug, Eq, PartialEq)]
pub enum CursorError {
    #[error("table was structurally modified since the cursor last synchronized")]
    ConcurrentModification,
    #[error("cursor position was already erased; advance before erasing again")]
    AlreadyErased,
    #[error("cursor is past the end of the table")]
    PastEnd,
    #[error("cursor does not name a live entry")]
    PositionInvalid,
    #[error("cursors belong to different tables")]
    IncomparableIterators,
}
