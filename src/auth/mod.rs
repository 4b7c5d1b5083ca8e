pub mod oauth;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use jsonwebtoken::dangerous::insecure_decode;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::{AuthConfig, AuthMode, UserOverride};
use crate::models::CurrentUser;

pub use oauth::OAuthTokenProvider;

/// The identity capability the QR client runs on behalf of.
///
/// Credentials may be short-lived, so callers ask for one right before every
/// outgoing request and never keep it afterwards.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get_credential(&self) -> Result<String>;

    async fn current_user(&self) -> Result<CurrentUser>;

    async fn sign_out(&self) -> Result<()>;
}

/// Build the provider selected by `config.mode`.
pub async fn build_provider(config: &AuthConfig) -> Result<Arc<dyn CredentialProvider>> {
    let provider: Arc<dyn CredentialProvider> = match config.mode {
        AuthMode::None => Arc::new(NoAuth),
        AuthMode::Token => {
            let token = config
                .token
                .clone()
                .context("token auth selected but no token configured")?;
            Arc::new(StaticTokenProvider::new(token, config.user.clone()))
        }
        AuthMode::Oauth => {
            let oauth = config
                .oauth
                .as_ref()
                .context("OAuth auth selected but OAuth is not configured")?;
            Arc::new(OAuthTokenProvider::from_config(oauth, config.user.clone()).await?)
        }
    };
    Ok(provider)
}

/// Public-only mode: only the resolve endpoint is usable.
pub struct NoAuth;

#[async_trait]
impl CredentialProvider for NoAuth {
    async fn get_credential(&self) -> Result<String> {
        bail!("authentication is disabled; set AUTH_MODE to 'token' or 'oauth'")
    }

    async fn current_user(&self) -> Result<CurrentUser> {
        bail!("no user is signed in")
    }

    async fn sign_out(&self) -> Result<()> {
        Ok(())
    }
}

/// A bearer token handed over by an external sign-in flow.
pub struct StaticTokenProvider {
    token: RwLock<Option<String>>,
    user: UserOverride,
}

impl StaticTokenProvider {
    pub fn new(token: String, user: UserOverride) -> Self {
        Self {
            token: RwLock::new(Some(token)),
            user,
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn get_credential(&self) -> Result<String> {
        self.token
            .read()
            .await
            .clone()
            .ok_or_else(|| anyhow!("signed out"))
    }

    async fn current_user(&self) -> Result<CurrentUser> {
        let token = self.get_credential().await?;
        user_from_token(&token, &self.user)
    }

    async fn sign_out(&self) -> Result<()> {
        self.token.write().await.take();
        info!("Signed out");
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct IdentityClaims {
    sub: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    preferred_username: Option<String>,
}

/// Read the identity claims of a token without verifying it.
///
/// The store verifies every token it receives; here the claims only label the
/// records we create. No key is involved, so any signing algorithm works.
fn peek_claims(token: &str) -> Result<IdentityClaims> {
    let data = insecure_decode::<IdentityClaims>(token).context("failed to read token claims")?;
    Ok(data.claims)
}

pub(crate) fn user_from_token(token: &str, user: &UserOverride) -> Result<CurrentUser> {
    if let (Some(id), Some(display_name)) = (&user.id, &user.display_name) {
        return Ok(CurrentUser {
            id: id.clone(),
            display_name: display_name.clone(),
        });
    }

    // Opaque tokens carry no claims; the configured identity is enough then.
    let claims = match peek_claims(token) {
        Ok(claims) => Some(claims),
        Err(e) if user.id.is_some() => {
            debug!("Token claims unreadable, using configured user id: {e:#}");
            None
        }
        Err(e) => return Err(e.context("set AUTH_USER_ID to use a token without readable claims")),
    };
    let (sub, claimed_name) = match claims {
        Some(c) => (c.sub, c.username.or(c.preferred_username).or(c.name)),
        None => (None, None),
    };

    let id = user
        .id
        .clone()
        .or(sub)
        .ok_or_else(|| anyhow!("token has no 'sub' claim and AUTH_USER_ID is not set"))?;
    let display_name = user
        .display_name
        .clone()
        .or(claimed_name)
        .unwrap_or_else(|| "User".to_string());

    Ok(CurrentUser { id, display_name })
}
