//! The signed-in user's working set of QR records.
//!
//! [`QrSession`] is the single owner of the local record list. Every mutation
//! goes to the store first and touches the list only after the store has
//! confirmed it, so a failed call leaves the session exactly as it was.

mod search;

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::CredentialProvider;
use crate::config::StoreConfig;
use crate::editor::{is_valid_url, validate_links, LinkSetEditor};
use crate::encoding::{encode_qr_image, generate_short_id, ExportFormat, QrImage};
use crate::error::{QrError, QrResult, ValidationError};
use crate::models::{CurrentUser, LinkEntry, NewQrRecord, QrRecord, QrType};
use crate::store::{QrStore, StoreError};

pub use search::{search, Partition, SearchMode};

/// A delete that has been asked for but not confirmed.
///
/// Nothing is sent to the store until the token is passed to
/// [`QrSession::confirm_delete`]; dropping it cancels the delete.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a pending delete does nothing until it is confirmed"]
pub struct PendingDelete {
    id: String,
    name: String,
}

impl PendingDelete {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

pub struct QrSession {
    store: Arc<dyn QrStore>,
    credentials: Arc<dyn CredentialProvider>,
    config: StoreConfig,
    records: Vec<QrRecord>,
}

impl QrSession {
    pub fn new(
        store: Arc<dyn QrStore>,
        credentials: Arc<dyn CredentialProvider>,
        config: StoreConfig,
    ) -> Self {
        Self {
            store,
            credentials,
            config,
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[QrRecord] {
        &self.records
    }

    pub fn partition(&self) -> Partition<'_> {
        Partition::of(&self.records)
    }

    pub fn search(&self, query: &str, mode: SearchMode) -> Vec<&QrRecord> {
        search(&self.records, query, mode)
    }

    pub fn get(&self, id: &str) -> QrResult<&QrRecord> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| QrError::UnknownRecord(id.to_string()))
    }

    /// Reload the user's records. The local list is only replaced on success.
    pub async fn list_for_user(&mut self) -> QrResult<&[QrRecord]> {
        let records = self.store.list_mine().await?;
        info!("Loaded {} QR codes", records.len());
        self.records = records;
        Ok(&self.records)
    }

    /// Create a QR code whose image encodes `destination_url` directly.
    pub async fn create_static(&mut self, name: &str, destination_url: &str) -> QrResult<&QrRecord> {
        let name = required_name(name)?;
        let destination = destination_url.trim();
        if destination.is_empty() {
            return Err(ValidationError::field("url", "URL is required").into());
        }
        if !is_valid_url(destination) {
            return Err(ValidationError::field("url", "Invalid URL format").into());
        }

        let short_id = generate_short_id();
        let image = encode_qr_image(destination)?;
        let record = NewQrRecord {
            url: self.config.landing_url(&short_id),
            short_id,
            user_id: self.owner_id().await?,
            name,
            original_url: Some(destination.to_string()),
            links: None,
            qr_code: image.to_data_url(),
            kind: QrType::Static,
            created_at: Utc::now(),
            scans: 0,
        };

        self.persist(record).await
    }

    /// Create a QR code whose image encodes this record's landing URL.
    pub async fn create_dynamic(&mut self, name: &str, links: &[LinkEntry]) -> QrResult<&QrRecord> {
        let name = required_name(name)?;
        let links = validate_links(links)?;

        let short_id = generate_short_id();
        let landing_url = self.config.landing_url(&short_id);
        let image = encode_qr_image(&landing_url)?;
        let record = NewQrRecord {
            url: landing_url,
            short_id,
            user_id: self.owner_id().await?,
            name,
            original_url: None,
            links: Some(links),
            qr_code: image.to_data_url(),
            kind: QrType::Dynamic,
            created_at: Utc::now(),
            scans: 0,
        };

        self.persist(record).await
    }

    /// Open an editor over a copy of a dynamic record's links.
    pub fn edit_links(&self, id: &str) -> QrResult<LinkSetEditor> {
        let record = self.get(id)?;
        if !record.is_dynamic() {
            return Err(ValidationError::field(
                "type",
                "Only dynamic QR codes have editable links",
            )
            .into());
        }
        Ok(LinkSetEditor::from_links(record.links()))
    }

    /// Replace a dynamic record's links with the editor's content.
    ///
    /// The store keeps whichever save arrives last.
    pub async fn save_links(&mut self, id: &str, editor: &LinkSetEditor) -> QrResult<&QrRecord> {
        let index = self.position(id)?;
        if !self.records[index].is_dynamic() {
            return Err(ValidationError::field(
                "type",
                "Only dynamic QR codes have editable links",
            )
            .into());
        }
        let links = editor.commit()?;

        let updated = self.store.update_links(id, &links).await?;
        info!("Updated {} links on QR code {}", links.len(), id);

        self.records[index] = updated;
        Ok(&self.records[index])
    }

    pub fn request_delete(&self, id: &str) -> QrResult<PendingDelete> {
        let record = self.get(id)?;
        Ok(PendingDelete {
            id: record.id.clone(),
            name: record.name.clone(),
        })
    }

    /// Delete on the store, then drop the record locally.
    pub async fn confirm_delete(&mut self, pending: PendingDelete) -> QrResult<QrRecord> {
        if let Err(e) = self.store.delete(&pending.id).await {
            warn!("Failed to delete QR code {}: {}", pending.id, e);
            return Err(e.into());
        }
        info!("Deleted QR code {} ({})", pending.id, pending.name);

        let index = self.position(&pending.id)?;
        Ok(self.records.remove(index))
    }

    /// The stored image of a record, re-encoded for download.
    pub fn export_image(&self, id: &str, format: ExportFormat) -> QrResult<(String, Vec<u8>)> {
        let record = self.get(id)?;
        let image = QrImage::from_data_url(&record.qr_image)?;
        let bytes = image.export(format)?;
        Ok((QrImage::download_file_name(&record.name, format), bytes))
    }

    pub async fn current_user(&self) -> anyhow::Result<CurrentUser> {
        self.credentials.current_user().await
    }

    /// Sign out and forget every loaded record.
    pub async fn sign_out(&mut self) -> anyhow::Result<()> {
        self.credentials.sign_out().await?;
        self.records.clear();
        Ok(())
    }

    async fn owner_id(&self) -> QrResult<String> {
        let user = self
            .credentials
            .current_user()
            .await
            .map_err(|e| QrError::Persistence(StoreError::Credential(e)))?;
        Ok(user.id)
    }

    async fn persist(&mut self, record: NewQrRecord) -> QrResult<&QrRecord> {
        debug!(
            "Creating {} QR code '{}' with short id {}",
            record.kind, record.name, record.short_id
        );
        let created = self.store.create(&record).await?;
        info!("Created {} QR code {} ({})", created.kind, created.id, created.short_id);

        self.records.push(created);
        Ok(&self.records[self.records.len() - 1])
    }

    fn position(&self, id: &str) -> QrResult<usize> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| QrError::UnknownRecord(id.to_string()))
    }
}

fn required_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::field("name", "Name is required"));
    }
    Ok(name.to_string())
}
