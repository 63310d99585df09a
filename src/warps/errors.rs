use thiserror::Error;

use crate::warps::ports::Capability;
use crate::warps::types::{PlayerId, WarpId};

/// Errors raised by a persistence backend. These always reach the caller
/// unchanged as [`WarpError::Storage`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 encoding error while reading a key.
    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// A stored key did not carry a parseable identity.
    #[error("corrupt key: {0}")]
    CorruptKey(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// Backend-specific failure that does not fit the variants above.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Validation, policy and storage failures reported by the warp registry.
#[derive(Debug, Error)]
pub enum WarpError {
    #[error("warp names cannot be empty")]
    InvalidName,

    #[error("unknown icon: {0}")]
    UnknownIcon(String),

    /// The owner already has a warp with this name.
    #[error("a warp named '{name}' already exists for this owner")]
    DuplicateName { name: String },

    #[error("location is not safe to teleport to")]
    UnsafeLocation,

    #[error("warp limit reached ({max} warps)")]
    QuotaExceeded { max: usize },

    #[error("insufficient funds: need {cost}, have {balance}")]
    InsufficientFunds { cost: i64, balance: i64 },

    #[error("warp not found: {0}")]
    NotFound(String),

    #[error("player {player} is banned from warps owned by {owner}")]
    Banned { owner: PlayerId, player: PlayerId },

    /// The actor is neither the owner nor holds the capability.
    #[error("missing permission {0}")]
    PermissionDenied(Capability),

    /// The world collaborator refused or failed the teleport.
    #[error("teleport failed: {0}")]
    Teleport(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl WarpError {
    pub fn warp_not_found(id: WarpId) -> Self {
        WarpError::NotFound(id.to_string())
    }
}
