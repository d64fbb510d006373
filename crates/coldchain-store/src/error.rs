use coldchain_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid id string: {0}")]
    InvalidId(String),
    #[error("invalid stored value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("duplicate shipment id: {0}")]
    DuplicateShipment(String),
    #[error("migration error: {0}")]
    Migration(String),
    #[error("invalid data path: {0}")]
    InvalidDataPath(PathBuf),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("replace failed after deleting {deleted} shipment(s): {source}")]
    ReplaceFailed {
        deleted: usize,
        #[source]
        source: Box<StoreError>,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    Io,
    Sql,
    Core,
    MissingHomeDir,
    InvalidId,
    InvalidValue,
    NotFound,
    DuplicateShipment,
    Migration,
    InvalidDataPath,
    Unavailable,
    ReplaceFailed,
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::Io(_) => StoreErrorKind::Io,
            StoreError::Sql(_) => StoreErrorKind::Sql,
            StoreError::Core(_) => StoreErrorKind::Core,
            StoreError::MissingHomeDir => StoreErrorKind::MissingHomeDir,
            StoreError::InvalidId(_) => StoreErrorKind::InvalidId,
            StoreError::InvalidValue { .. } => StoreErrorKind::InvalidValue,
            StoreError::NotFound(_) => StoreErrorKind::NotFound,
            StoreError::DuplicateShipment(_) => StoreErrorKind::DuplicateShipment,
            StoreError::Migration(_) => StoreErrorKind::Migration,
            StoreError::InvalidDataPath(_) => StoreErrorKind::InvalidDataPath,
            StoreError::Unavailable(_) => StoreErrorKind::Unavailable,
            StoreError::ReplaceFailed { .. } => StoreErrorKind::ReplaceFailed,
        }
    }
}
