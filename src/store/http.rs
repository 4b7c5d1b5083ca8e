use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::trait_def::{QrStore, StoreError, StoreResult};
use crate::auth::CredentialProvider;
use crate::config::StoreConfig;
use crate::models::{LandingPage, LinkEntry, NewQrRecord, QrRecord, UpdateLinksRequest};

const QRCODES_PATH: [&str; 2] = ["api", "qrcodes"];

/// [`QrStore`] backed by the store's REST API.
pub struct HttpQrStore {
    client: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialProvider>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl HttpQrStore {
    pub fn new(
        config: &StoreConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("invalid store URL '{}'", config.base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("store URL '{}' cannot be used as a base", config.base_url);
        }

        let client = Client::builder()
            .user_agent("qrverse/0.1.0")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client for the QR store")?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(QRCODES_PATH)
            .extend(segments);
        Ok(url)
    }

    /// A request carrying a bearer token fetched for this call only.
    async fn authorized(&self, method: Method, segments: &[&str]) -> StoreResult<RequestBuilder> {
        let url = self.endpoint(segments)?;
        let token = self
            .credentials
            .get_credential()
            .await
            .map_err(StoreError::Credential)?;

        debug!("Sending authorized store request: {} {}", method, url);
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json"))
    }
}

async fn ensure_success(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        message: error_message(&text),
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
    let response = ensure_success(response).await?;
    Ok(response.json().await?)
}

/// Pull the human-readable message out of an error body.
fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.error.or(parsed.message) {
            return message;
        }
    }
    body.trim().to_string()
}

#[async_trait]
impl QrStore for HttpQrStore {
    async fn list_mine(&self) -> StoreResult<Vec<QrRecord>> {
        let response = self.authorized(Method::GET, &["user"]).await?.send().await?;
        read_json(response).await
    }

    async fn create(&self, record: &NewQrRecord) -> StoreResult<QrRecord> {
        let response = self
            .authorized(Method::POST, &[])
            .await?
            .json(record)
            .send()
            .await?;
        read_json(response).await
    }

    async fn update_links(&self, id: &str, links: &[LinkEntry]) -> StoreResult<QrRecord> {
        let body = UpdateLinksRequest {
            links: links.to_vec(),
        };
        let response = self
            .authorized(Method::PUT, &[id])
            .await?
            .json(&body)
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let response = self.authorized(Method::DELETE, &[id]).await?.send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn resolve(&self, short_id: &str) -> StoreResult<LandingPage> {
        let url = self.endpoint(&["landing", short_id])?;
        debug!("Resolving short id via {}", url);
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        read_json(response).await
    }
}
