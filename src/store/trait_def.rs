use async_trait::async_trait;
use thiserror::Error;

use crate::models::{LandingPage, LinkEntry, NewQrRecord, QrRecord};

const DEFAULT_NOT_FOUND_MESSAGE: &str = "QR code not found";

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store answered with a non-success status.
    #[error("store returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("request to store failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not obtain credential: {0:#}")]
    Credential(anyhow::Error),
    #[error("invalid store URL: {0}")]
    InvalidUrl(String),
}

impl StoreError {
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text shown to a user: the server's own message for status errors.
    pub fn user_message(&self) -> String {
        match self {
            StoreError::Status { message, .. } if !message.is_empty() => message.clone(),
            StoreError::Status { .. } => DEFAULT_NOT_FOUND_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The external QR record store.
///
/// Every call except [`QrStore::resolve`] is made on behalf of the signed-in
/// user.
#[async_trait]
pub trait QrStore: Send + Sync {
    /// All records owned by the current user.
    async fn list_mine(&self) -> StoreResult<Vec<QrRecord>>;

    async fn create(&self, record: &NewQrRecord) -> StoreResult<QrRecord>;

    /// Replace the full link array of a dynamic record (last write wins).
    async fn update_links(&self, id: &str, links: &[LinkEntry]) -> StoreResult<QrRecord>;

    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Public lookup by short id. The store counts a scan on success.
    async fn resolve(&self, short_id: &str) -> StoreResult<LandingPage>;
}
