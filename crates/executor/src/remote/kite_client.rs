use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

use common::models::OrderRequest;
use common::settings::KiteCredentials;

const BASE_URL: &str = "https://api.kite.trade";
const LOGIN_URL: &str = "https://kite.zerodha.com/connect/login";
const API_VERSION: &str = "3";

#[derive(Debug, Error)]
pub enum KiteError {
    #[error("not authenticated with Kite; complete the login flow first")]
    NotAuthenticated,
    #[error("Kite rejected the session or token: {0}")]
    Token(String),
    #[error("Kite declined the request: {0}")]
    Rejected(String),
    #[error("unexpected Kite response: {0}")]
    Unexpected(String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// The order-placement collaborator as the trigger pipeline sees it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Brokerage: Send + Sync {
    async fn is_authenticated(&self) -> bool;

    /// Submits one order; returns the brokerage order id.
    async fn place_order(&self, order: &OrderRequest) -> Result<String, KiteError>;
}

/// Kite Connect v3 REST client.
pub struct KiteClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
    // Rotated by generate_session while the process runs.
    access_token: RwLock<String>,
}

impl KiteClient {
    pub fn new(credentials: &KiteCredentials) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client."),
            base_url: BASE_URL.to_string(),
            api_key: credentials.api_key.clone(),
            api_secret: credentials.api_secret.clone(),
            access_token: RwLock::new(credentials.access_token.clone()),
        }
    }

    /// Where to send the user to start the daily login flow.
    pub fn login_url(&self) -> String {
        format!("{LOGIN_URL}?v={API_VERSION}&api_key={}", self.api_key)
    }

    /// Exchanges a login request token for an access token and adopts it for
    /// subsequent calls. Returns the token so the caller can persist it.
    pub async fn generate_session(&self, request_token: &str) -> Result<String, KiteError> {
        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return Err(KiteError::NotAuthenticated);
        }

        let checksum = session_checksum(&self.api_key, request_token, &self.api_secret);
        let response = self
            .client
            .post(format!("{}/session/token", self.base_url))
            .header("X-Kite-Version", API_VERSION)
            .form(&[
                ("api_key", self.api_key.as_str()),
                ("request_token", request_token),
                ("checksum", checksum.as_str()),
            ])
            .send()
            .await?;

        let session: SessionData = Self::decode(response).await?;
        *self
            .access_token
            .write()
            .expect("access token lock poisoned") = session.access_token.clone();
        info!("Kite session established for user {}", session.user_id);
        Ok(session.access_token)
    }

    fn auth_header(&self) -> Result<String, KiteError> {
        let token = self
            .access_token
            .read()
            .expect("access token lock poisoned")
            .clone();
        if self.api_key.is_empty() || token.is_empty() {
            return Err(KiteError::NotAuthenticated);
        }
        Ok(format!("token {}:{token}", self.api_key))
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, KiteError> {
        let status = response.status();
        let body = response.text().await?;
        parse_envelope(status, &body)
    }
}

#[async_trait]
impl Brokerage for KiteClient {
    async fn is_authenticated(&self) -> bool {
        self.auth_header().is_ok()
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<String, KiteError> {
        let auth = self.auth_header()?;
        let quantity = order.quantity.to_string();

        let response = self
            .client
            .post(format!("{}/orders/regular", self.base_url))
            .header("Authorization", auth)
            .header("X-Kite-Version", API_VERSION)
            .form(&[
                ("tradingsymbol", order.trading_symbol.as_str()),
                ("exchange", order.exchange.as_str()),
                ("transaction_type", order.transaction_type.as_str()),
                ("quantity", quantity.as_str()),
                ("order_type", order.order_type.as_str()),
                ("product", order.product.as_str()),
                ("validity", order.validity.as_str()),
            ])
            .send()
            .await?;

        let placed: OrderData = Self::decode(response).await?;
        Ok(placed.order_id)
    }
}

/// SHA-256 over `api_key + request_token + api_secret`, hex-encoded, as the
/// session-token exchange requires.
fn session_checksum(api_key: &str, request_token: &str, api_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hasher.update(request_token.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Kite wraps every payload in `{status, data}` on success and
/// `{status, message, error_type}` on failure.
#[derive(Debug, Deserialize)]
struct KiteEnvelope<T> {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_type: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SessionData {
    access_token: String,
    #[serde(default)]
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct OrderData {
    order_id: String,
}

fn parse_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, KiteError> {
    let envelope: KiteEnvelope<T> = serde_json::from_str(body)
        .map_err(|e| KiteError::Unexpected(format!("undecodable response (HTTP {status}): {e}")))?;

    if envelope.status == "success" {
        return envelope
            .data
            .ok_or_else(|| KiteError::Unexpected("success response without data".to_string()));
    }

    let message = envelope
        .message
        .unwrap_or_else(|| format!("HTTP {status} with no message"));
    match envelope.error_type.as_deref() {
        Some("TokenException") | Some("PermissionException") => Err(KiteError::Token(message)),
        _ => Err(KiteError::Rejected(message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_sha256_of_concatenated_parts() {
        // sha256("abc")
        assert_eq!(
            session_checksum("a", "b", "c"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(session_checksum("a", "b", "c"), session_checksum("a", "b", "d"));
    }

    #[test]
    fn success_envelope_yields_the_data() {
        let body = r#"{"status":"success","data":{"order_id":"151220000000000"}}"#;
        let placed: OrderData = parse_envelope(StatusCode::OK, body).unwrap();
        assert_eq!(placed.order_id, "151220000000000");
    }

    #[test]
    fn token_errors_map_to_the_token_variant() {
        let body =
            r#"{"status":"error","message":"Token is invalid","error_type":"TokenException"}"#;
        let result: Result<OrderData, _> = parse_envelope(StatusCode::FORBIDDEN, body);
        assert!(matches!(result, Err(KiteError::Token(_))));
    }

    #[test]
    fn order_rejections_map_to_the_rejected_variant() {
        let body = r#"{"status":"error","message":"Insufficient funds","error_type":"InputException"}"#;
        let result: Result<OrderData, _> = parse_envelope(StatusCode::BAD_REQUEST, body);
        assert!(matches!(result, Err(KiteError::Rejected(m)) if m.contains("Insufficient")));
    }

    #[test]
    fn garbage_body_maps_to_unexpected() {
        let result: Result<OrderData, _> = parse_envelope(StatusCode::BAD_GATEWAY, "<html>");
        assert!(matches!(result, Err(KiteError::Unexpected(_))));
    }

    #[tokio::test]
    async fn missing_credentials_mean_not_authenticated() {
        let client = KiteClient::new(&KiteCredentials::default());
        assert!(!client.is_authenticated().await);
        let order = OrderRequest::market_buy("ABC", 1);
        assert!(matches!(
            client.place_order(&order).await,
            Err(KiteError::NotAuthenticated)
        ));
    }
}
