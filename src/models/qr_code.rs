use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrType {
    Static,
    Dynamic,
}

impl fmt::Display for QrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QrType::Static => write!(f, "static"),
            QrType::Dynamic => write!(f, "dynamic"),
        }
    }
}

impl FromStr for QrType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "static" => Ok(QrType::Static),
            "dynamic" => Ok(QrType::Dynamic),
            other => Err(format!("unknown QR code type '{other}'")),
        }
    }
}

/// One titled destination of a dynamic QR code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct LinkEntry {
    #[validate(length(min = 1, message = "Link title is required"))]
    pub title: String,
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,
}

impl LinkEntry {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// A QR code as persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub short_id: String,
    #[serde(rename = "userId", alias = "ownerId")]
    pub owner_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: QrType,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub original_url: Option<String>,
    #[serde(default)]
    pub links: Option<Vec<LinkEntry>>,
    #[serde(rename = "qrCode", alias = "qrImage")]
    pub qr_image: String,
    #[serde(default)]
    pub scans: u64,
    pub created_at: DateTime<Utc>,
}

impl QrRecord {
    pub fn is_dynamic(&self) -> bool {
        self.kind == QrType::Dynamic
    }

    pub fn links(&self) -> &[LinkEntry] {
        self.links.as_deref().unwrap_or_default()
    }
}

/// Body of `POST /api/qrcodes`. Everything but the store-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQrRecord {
    pub short_id: String,
    pub user_id: String,
    pub name: String,
    pub url: String,
    pub original_url: Option<String>,
    pub links: Option<Vec<LinkEntry>>,
    pub qr_code: String,
    #[serde(rename = "type")]
    pub kind: QrType,
    pub created_at: DateTime<Utc>,
    pub scans: u64,
}

/// Body of `PUT /api/qrcodes/{id}`. The whole link array is replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateLinksRequest {
    pub links: Vec<LinkEntry>,
}

/// Public resolution payload served by `GET /api/qrcodes/landing/{shortId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingPage {
    pub name: String,
    #[serde(default)]
    pub links: Option<Vec<LinkEntry>>,
    #[serde(default)]
    pub original_url: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<QrType>,
}

impl LandingPage {
    /// Links to display, falling back to the fixed destination of a static code.
    pub fn display_links(&self) -> Vec<LinkEntry> {
        match (&self.links, &self.original_url) {
            (Some(links), _) if !links.is_empty() => links.clone(),
            (_, Some(url)) if !url.is_empty() => vec![LinkEntry::new(self.name.clone(), url.clone())],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub display_name: String,
}
