use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const CONFIG_FILE: &str = "kite_config.json";
pub const DEFAULT_NOTIONAL_INR: f64 = 5_000.0;

/// Kite Connect credentials. Static credentials (key/secret) come from the
/// environment in production; the access token is rotated daily by the login
/// flow and lives in the JSON config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KiteCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub request_token: String,
    pub redirect_url: String,
    pub postback_url: String,
}

impl KiteCredentials {
    fn from_env() -> Self {
        let var = |key: &str| env::var(key).unwrap_or_default();
        Self {
            api_key: var("KITE_API_KEY"),
            api_secret: var("KITE_API_SECRET"),
            access_token: var("KITE_ACCESS_TOKEN"),
            request_token: var("KITE_REQUEST_TOKEN"),
            redirect_url: var("KITE_REDIRECT_URL"),
            postback_url: var("KITE_POSTBACK_URL"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AutoTradeSettings {
    /// Master switch for the whole trigger pipeline. Off by default.
    pub enabled: bool,
    /// Fixed order notional in INR; quantity = floor(notional / price).
    pub notional_inr: f64,
}

impl Default for AutoTradeSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            notional_inr: DEFAULT_NOTIONAL_INR,
        }
    }
}

impl AutoTradeSettings {
    fn from_env() -> Self {
        let enabled = env::var("AUTOTRADE_ENABLED")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);
        let notional_inr = env::var("AUTOTRADE_NOTIONAL_INR")
            .ok()
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|n| *n > 0.0)
            .unwrap_or(DEFAULT_NOTIONAL_INR);
        Self {
            enabled,
            notional_inr,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub kite: KiteCredentials,
    pub autotrade: AutoTradeSettings,
    config_path: PathBuf,
}

impl Settings {
    pub fn load() -> Self {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Self {
        let file = match fs::read_to_string(path) {
            Ok(body) => match serde_json::from_str::<KiteCredentials>(&body) {
                Ok(creds) => Some(creds),
                Err(e) => {
                    warn!("Ignoring unreadable {}: {e}", path.display());
                    None
                }
            },
            Err(_) => None,
        };

        Self {
            kite: merge_credentials(KiteCredentials::from_env(), file),
            autotrade: AutoTradeSettings::from_env(),
            config_path: path.to_path_buf(),
        }
    }

    /// Writes the current credentials back to the config file, so a freshly
    /// exchanged access token survives across sessions of the same day.
    pub fn save_credentials(&self) -> anyhow::Result<()> {
        let body = serde_json::to_string_pretty(&self.kite)
            .context("Failed to serialize Kite credentials")?;
        fs::write(&self.config_path, body)
            .with_context(|| format!("Failed to write {}", self.config_path.display()))
    }
}

/// Env vars win for static credentials; the file wins for the dynamic
/// access/request tokens, which the login flow rewrites at runtime.
pub fn merge_credentials(env: KiteCredentials, file: Option<KiteCredentials>) -> KiteCredentials {
    let Some(file) = file else { return env };
    let mut merged = env;
    if merged.api_key.is_empty() {
        merged.api_key = file.api_key;
    }
    if merged.api_secret.is_empty() {
        merged.api_secret = file.api_secret;
    }
    if !file.access_token.is_empty() {
        merged.access_token = file.access_token;
    }
    if !file.request_token.is_empty() {
        merged.request_token = file.request_token;
    }
    if merged.redirect_url.is_empty() {
        merged.redirect_url = file.redirect_url;
    }
    if merged.postback_url.is_empty() {
        merged.postback_url = file.postback_url;
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(api_key: &str, access_token: &str) -> KiteCredentials {
        KiteCredentials {
            api_key: api_key.to_string(),
            access_token: access_token.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn env_wins_for_static_credentials() {
        let merged = merge_credentials(creds("env_key", ""), Some(creds("file_key", "")));
        assert_eq!(merged.api_key, "env_key");
    }

    #[test]
    fn file_fills_missing_static_credentials() {
        let merged = merge_credentials(creds("", ""), Some(creds("file_key", "")));
        assert_eq!(merged.api_key, "file_key");
    }

    #[test]
    fn file_access_token_overrides_env() {
        let merged = merge_credentials(
            creds("env_key", "stale_env_token"),
            Some(creds("", "fresh_file_token")),
        );
        assert_eq!(merged.access_token, "fresh_file_token");
        assert_eq!(merged.api_key, "env_key");
    }

    #[test]
    fn missing_file_keeps_env_as_is() {
        let merged = merge_credentials(creds("env_key", "token"), None);
        assert_eq!(merged.api_key, "env_key");
        assert_eq!(merged.access_token, "token");
    }
}
