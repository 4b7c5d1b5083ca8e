use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{user_from_token, CredentialProvider};
use crate::config::{OAuthConfig, UserOverride};
use crate::models::CurrentUser;

/// OAuth2 client-credentials provider.
///
/// Every call to [`CredentialProvider::get_credential`] performs a fresh token
/// request; nothing is cached between requests.
#[derive(Clone)]
pub struct OAuthTokenProvider {
    token_url: String,
    client_id: String,
    client_secret: String,
    audience: Option<String>,
    scope: Option<String>,
    client: Client,
    user: UserOverride,
    signed_out: Arc<AtomicBool>,
}

impl OAuthTokenProvider {
    pub async fn from_config(config: &OAuthConfig, user: UserOverride) -> Result<Self> {
        let client = Client::builder()
            .user_agent("qrverse-oauth-client/0.1.0")
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client for OAuth token requests")?;

        let token_url = resolve_token_endpoint(config, &client).await?;
        info!("Using OAuth token endpoint {}", token_url);

        Ok(Self {
            token_url,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            audience: config.audience.clone(),
            scope: config.scope.clone(),
            client,
            user,
            signed_out: Arc::new(AtomicBool::new(false)),
        })
    }

    async fn request_token(&self) -> Result<String> {
        let mut form = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        if let Some(audience) = self.audience.as_deref() {
            form.push(("audience", audience));
        }
        if let Some(scope) = self.scope.as_deref() {
            form.push(("scope", scope));
        }

        debug!("Requesting access token from {}", self.token_url);
        let response: TokenResponse = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .context("failed to request access token")?
            .error_for_status()
            .context("token endpoint returned an error status")?
            .json()
            .await
            .context("failed to parse token response")?;

        if let Some(token_type) = response.token_type.as_deref() {
            if !token_type.eq_ignore_ascii_case("bearer") {
                warn!("Token endpoint issued a '{token_type}' token, using it as a bearer token");
            }
        }
        if response.access_token.is_empty() {
            bail!("token endpoint returned an empty access token");
        }

        Ok(response.access_token)
    }
}

#[async_trait]
impl CredentialProvider for OAuthTokenProvider {
    async fn get_credential(&self) -> Result<String> {
        if self.signed_out.load(Ordering::SeqCst) {
            bail!("signed out");
        }
        self.request_token().await
    }

    async fn current_user(&self) -> Result<CurrentUser> {
        let token = self.get_credential().await?;
        user_from_token(&token, &self.user)
    }

    async fn sign_out(&self) -> Result<()> {
        self.signed_out.store(true, Ordering::SeqCst);
        info!("Signed out");
        Ok(())
    }
}

async fn resolve_token_endpoint(config: &OAuthConfig, client: &Client) -> Result<String> {
    if let Some(url) = &config.token_url {
        return Ok(url.clone());
    }

    let issuer = config.issuer_url.trim_end_matches('/');
    let discovery_url = format!("{issuer}/.well-known/openid-configuration");
    let metadata: OpenIdProviderMetadata = client
        .get(&discovery_url)
        .send()
        .await
        .context("failed to request OpenID provider metadata")?
        .error_for_status()
        .context("OpenID provider metadata endpoint returned an error status")?
        .json()
        .await
        .context("failed to parse OpenID provider metadata")?;

    metadata
        .token_endpoint
        .ok_or_else(|| anyhow!("OpenID provider metadata did not include 'token_endpoint'"))
}

#[derive(Debug, Deserialize)]
struct OpenIdProviderMetadata {
    token_endpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
}
