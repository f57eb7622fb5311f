//! Errors raised by graph store mutations

use crate::model::FileStatus;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("unknown file: {0}")]
    UnknownFile(String),

    #[error("file {path} cannot move from {from} to {to}")]
    InvalidTransition {
        path: String,
        from: FileStatus,
        to: FileStatus,
    },
}
