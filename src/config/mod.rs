use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub landing_server: ServerConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the QR record store API
    pub base_url: String,
    /// Base URL encoded into dynamic QR codes (`{public_base_url}/landing/{shortId}`)
    pub public_base_url: String,
    #[serde(default = "StoreConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    None,
    Token,
    Oauth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub mode: AuthMode,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: UserOverride,
    #[serde(default)]
    pub oauth: Option<OAuthConfig>,
}

/// Identity to report instead of the one carried in the token claims.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserOverride {
    pub id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub issuer_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Token endpoint; discovered from the issuer when unset
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl StoreConfig {
    const fn default_timeout_secs() -> u64 {
        30
    }

    /// The URL a dynamic QR code points at.
    pub fn landing_url(&self, short_id: &str) -> String {
        format!(
            "{}/landing/{}",
            self.public_base_url.trim_end_matches('/'),
            short_id
        )
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = var("QRVERSE_SERVER_URL")
            .unwrap_or_else(|| "http://localhost:5000".to_string())
            .trim_end_matches('/')
            .to_string();
        let public_base_url = var("QRVERSE_PUBLIC_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| base_url.clone());
        let timeout_secs = match var("QRVERSE_TIMEOUT_SECS") {
            Some(v) => v
                .parse::<u64>()
                .context("QRVERSE_TIMEOUT_SECS must be a number of seconds")?,
            None => StoreConfig::default_timeout_secs(),
        };

        let landing_host = var("LANDING_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let landing_port = var("LANDING_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .context("LANDING_PORT must be a valid port")?;

        let auth_mode = match var("AUTH_MODE")
            .unwrap_or_else(|| "none".to_string())
            .to_lowercase()
            .as_str()
        {
            "none" => AuthMode::None,
            "token" => AuthMode::Token,
            "oauth" => AuthMode::Oauth,
            other => {
                tracing::warn!(
                    "Unknown AUTH_MODE '{other}', falling back to 'none'. Supported values: none, token, oauth"
                );
                AuthMode::None
            }
        };

        let token = if auth_mode == AuthMode::Token {
            Some(var("AUTH_TOKEN").context("AUTH_TOKEN must be set when AUTH_MODE=token")?)
        } else {
            None
        };

        let oauth = if auth_mode == AuthMode::Oauth {
            Some(OAuthConfig {
                issuer_url: var("OAUTH_ISSUER_URL")
                    .context("OAUTH_ISSUER_URL must be set when AUTH_MODE=oauth")?,
                client_id: var("OAUTH_CLIENT_ID")
                    .context("OAUTH_CLIENT_ID must be set when AUTH_MODE=oauth")?,
                client_secret: var("OAUTH_CLIENT_SECRET")
                    .context("OAUTH_CLIENT_SECRET must be set when AUTH_MODE=oauth")?,
                token_url: var("OAUTH_TOKEN_URL"),
                audience: var("OAUTH_AUDIENCE"),
                scope: var("OAUTH_SCOPE"),
            })
        } else {
            None
        };

        Ok(Config {
            store: StoreConfig {
                base_url,
                public_base_url,
                timeout_secs,
            },
            landing_server: ServerConfig {
                host: landing_host,
                port: landing_port,
            },
            auth: AuthConfig {
                mode: auth_mode,
                token,
                user: UserOverride {
                    id: var("AUTH_USER_ID"),
                    display_name: var("AUTH_USER_NAME"),
                },
                oauth,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_any_variables() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.store.base_url, "http://localhost:5000");
        assert_eq!(config.store.public_base_url, "http://localhost:5000");
        assert_eq!(config.store.timeout_secs, 30);
        assert_eq!(config.landing_server.port, 3000);
        assert_eq!(config.auth.mode, AuthMode::None);
    }

    #[test]
    fn landing_url_uses_public_base() {
        let config = Config::from_lookup(lookup(&[
            ("QRVERSE_SERVER_URL", "https://api.qr.example/"),
            ("QRVERSE_PUBLIC_URL", "https://qr.example/"),
        ]))
        .unwrap();
        assert_eq!(config.store.base_url, "https://api.qr.example");
        assert_eq!(
            config.store.landing_url("abc123"),
            "https://qr.example/landing/abc123"
        );
    }

    #[test]
    fn token_mode_requires_a_token() {
        let err = Config::from_lookup(lookup(&[("AUTH_MODE", "token")])).unwrap_err();
        assert!(err.to_string().contains("AUTH_TOKEN"));

        let config =
            Config::from_lookup(lookup(&[("AUTH_MODE", "TOKEN"), ("AUTH_TOKEN", "abc")])).unwrap();
        assert_eq!(config.auth.mode, AuthMode::Token);
        assert_eq!(config.auth.token.as_deref(), Some("abc"));
    }

    #[test]
    fn oauth_mode_collects_client_credentials() {
        let config = Config::from_lookup(lookup(&[
            ("AUTH_MODE", "oauth"),
            ("OAUTH_ISSUER_URL", "https://id.example"),
            ("OAUTH_CLIENT_ID", "cli"),
            ("OAUTH_CLIENT_SECRET", "s3cret"),
            ("OAUTH_SCOPE", "qrcodes"),
        ]))
        .unwrap();
        let oauth = config.auth.oauth.unwrap();
        assert_eq!(oauth.issuer_url, "https://id.example");
        assert_eq!(oauth.scope.as_deref(), Some("qrcodes"));
        assert!(oauth.token_url.is_none());
    }

    #[test]
    fn unknown_auth_mode_falls_back_to_none() {
        let config = Config::from_lookup(lookup(&[("AUTH_MODE", "saml")])).unwrap();
        assert_eq!(config.auth.mode, AuthMode::None);
    }

    #[test]
    fn invalid_port_is_reported() {
        assert!(Config::from_lookup(lookup(&[("LANDING_PORT", "http")])).is_err());
    }
}
