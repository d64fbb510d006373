use coldchain_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid transport url: {0}")]
    InvalidUrl(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("polling worker panicked")]
    Worker,
}

pub type Result<T> = std::result::Result<T, NotifyError>;
