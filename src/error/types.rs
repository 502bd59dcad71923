use thiserror::Error;

use crate::model::{ColumnId, LayoutMode, Strategy};

/// Unified result type for the resize engine.
pub type Result<T> = std::result::Result<T, ResizeError>;

/// Errors surfaced by the resize engine.
///
/// Every variant is local and recoverable: the engine stays queryable after
/// any failed operation and a failed commit never partially applies.
#[derive(Debug, Error)]
pub enum ResizeError {
    #[error("column `{0}` cannot be resized")]
    NotResizable(ColumnId),
    #[error("a drag session is already active on column `{0}`")]
    SessionAlreadyActive(ColumnId),
    #[error("no drag session is active")]
    NoActiveSession,
    #[error("stale write: derived from version {expected}, store is at {actual}")]
    StaleWrite { expected: u64, actual: u64 },
    #[error("commit attempted while listeners are being notified")]
    ReentrantCommit,
    #[error("invalid constraint: {0}")]
    InvalidConstraint(String),
    #[error("column `{0}` not found")]
    UnknownColumn(ColumnId),
    #[error("no width supplied for column `{0}`")]
    MissingWidth(ColumnId),
    #[error("version {0} is not in the store history")]
    UnknownVersion(u64),
    #[error("strategy {strategy:?} cannot run under {layout_mode:?} layout")]
    IncompatibleStrategy {
        strategy: Strategy,
        layout_mode: LayoutMode,
    },
    #[error("columns cannot fill a container of {container} (bounds allow {min}..={max})")]
    InfeasibleLayout {
        container: u32,
        min: u64,
        max: u64,
    },
    #[error("state lock poisoned")]
    Poisoned,
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
