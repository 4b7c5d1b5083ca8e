use std::fmt;

use thiserror::Error;

use crate::store::StoreError;

/// Image generation or image artifact handling failed.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("URL cannot be encoded as a QR code: {0}")]
    Capacity(#[from] qrcode::types::QrError),
    #[error("failed to render QR image: {0}")]
    Image(#[from] image::ImageError),
    #[error("invalid image data URL: {0}")]
    DataUrl(String),
}

/// A client-side form invariant was violated.
///
/// `index` points at the offending link entry when the failure belongs to one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    pub index: Option<usize>,
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            index: None,
            field,
            message: message.into(),
        }
    }

    pub fn entry(index: usize, field: &'static str, message: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "link {} {}: {}", index + 1, self.field, self.message),
            None => write!(f, "{}: {}", self.field, self.message),
        }
    }
}

#[derive(Debug, Error)]
pub enum QrError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Persistence(#[from] StoreError),
    #[error("{0}")]
    NotFound(String),
    #[error("no QR code with id '{0}' in this session")]
    UnknownRecord(String),
}

pub type QrResult<T> = Result<T, QrError>;
