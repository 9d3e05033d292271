use wheelwatch_core::{PatternError, SpinError};

use crate::export::ImportError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("no strategy with id {0:?}")]
    UnknownStrategy(String),
    #[error(transparent)]
    Spin(#[from] SpinError),
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Import(#[from] ImportError),
}
