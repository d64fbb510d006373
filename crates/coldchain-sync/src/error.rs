use coldchain_core::CoreError;
use coldchain_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Precondition(&'static str),
    #[error("unsupported file type: {0} (expected .csv, .xlsx or .xls)")]
    UnsupportedFile(String),
    #[error("file too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error("no shipment data found in {0}")]
    Empty(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("shipment not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;
