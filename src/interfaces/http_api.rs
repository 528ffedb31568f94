use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use backoff::Error as RetryError;
use base64::Engine;
use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use url::Url;

use crate::config::Config;
use crate::constants::defaults;
use crate::helpers::backoff_retry;
use crate::mower::payload::{Envelope, Firmware};

const TOKEN_PATH: &str = "oauth/token";
const PROFILE_PATH: &str = "users/me";
const CERTIFICATE_PATH: &str = "users/certificate";
const PRODUCTS_PATH: &str = "product-items";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("authentication rejected (HTTP {0})")]
    Unauthorized(u16),
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unreadable response body: {0}")]
    Body(#[from] std::io::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error("certificate is not valid base64: {0}")]
    CertificateEncoding(#[from] base64::DecodeError),
    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),
    #[error("no refresh token available")]
    NoRefreshToken,
    #[error("token lifetime of {0}s is out of range")]
    TokenLifetime(i64),
}

#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

impl Token {
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        let margin = TimeDelta::seconds(defaults::TOKEN_REFRESH_MARGIN.as_secs() as i64);
        self.expires_at - now < margin
    }

    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: i64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenResponse {
    fn into_token(self, now: DateTime<Utc>) -> Result<Token, ApiError> {
        let expires_at = TimeDelta::try_seconds(self.expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or(ApiError::TokenLifetime(self.expires_in))?;
        Ok(Token {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type,
            expires_at,
        })
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Profile {
    pub id: Option<u64>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub mqtt_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct CertificateResponse {
    pkcs12: String,
    #[serde(default)]
    active: bool,
}

/// Client identity for the MQTT broker.
pub struct Certificate {
    pub pkcs12: Vec<u8>,
    pub active: bool,
}

impl Certificate {
    fn from_response(resp: CertificateResponse) -> Result<Self, ApiError> {
        let encoded: String = resp.pkcs12.chars().filter(|c| !c.is_whitespace()).collect();
        let pkcs12 = base64::engine::general_purpose::STANDARD.decode(encoded)?;
        native_tls::Identity::from_pkcs12(&pkcs12, "")?;
        Ok(Certificate {
            pkcs12,
            active: resp.active,
        })
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct MqttTopics {
    pub command_in: String,
    pub command_out: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Product {
    pub serial_number: String,
    pub name: String,
    pub mac_address: Option<String>,
    pub firmware_version: Option<Firmware>,
    pub product_id: Option<u64>,
    pub online: Option<bool>,
    pub mqtt_topics: MqttTopics,
}

pub struct ApiClient {
    agent: ureq::Agent,
    api_url: Url,
    auth_url: Url,
    client_id: String,
    retry_window: Duration,
}

fn get_ureq_agent(timeout: Duration) -> Result<ureq::Agent, ApiError> {
    Ok(ureq::AgentBuilder::new()
        .tls_connector(Arc::new(native_tls::TlsConnector::new()?))
        .timeout(timeout)
        .build())
}

/// 401/403 and other client errors are final; everything else is worth retrying.
fn classify(url: &Url, err: ureq::Error) -> RetryError<ApiError> {
    match err {
        ureq::Error::Status(status @ (401 | 403), _) => {
            RetryError::permanent(ApiError::Unauthorized(status))
        }
        ureq::Error::Status(status, _) if status == 429 || status >= 500 => {
            RetryError::transient(ApiError::Status {
                status,
                url: url.to_string(),
            })
        }
        ureq::Error::Status(status, _) => RetryError::permanent(ApiError::Status {
            status,
            url: url.to_string(),
        }),
        ureq::Error::Transport(t) => RetryError::transient(ApiError::Transport(t.to_string())),
    }
}

impl ApiClient {
    pub fn new(
        api_url: Url,
        auth_url: Url,
        client_id: String,
        timeout: Duration,
        retry_window: Duration,
    ) -> Result<Self, ApiError> {
        Ok(ApiClient {
            agent: get_ureq_agent(timeout)?,
            api_url,
            auth_url,
            client_id,
            retry_window,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            config.api_url.clone(),
            config.auth_url.clone(),
            config.client_id.clone(),
            config.request_timeout,
            config.retry_window,
        )
    }

    pub fn login(&self, email: &str, password: &str) -> Result<Token, ApiError> {
        log::info!("Logging in as {email}");
        self.request_token(json!({
            "client_id": self.client_id,
            "username": email,
            "password": password,
            "scope": "*",
            "grant_type": "password",
        }))
    }

    pub fn refresh(&self, token: &Token) -> Result<Token, ApiError> {
        let refresh_token = token.refresh_token.as_ref().ok_or(ApiError::NoRefreshToken)?;
        log::info!("Refreshing access token");
        self.request_token(json!({
            "client_id": self.client_id,
            "scope": "*",
            "grant_type": "refresh_token",
            "refresh_token": refresh_token,
        }))
    }

    pub fn profile(&self, token: &Token) -> Result<Profile, ApiError> {
        self.get_json(token, PROFILE_PATH)
    }

    pub fn certificate(&self, token: &Token) -> Result<Certificate, ApiError> {
        let resp: CertificateResponse = self.get_json(token, CERTIFICATE_PATH)?;
        Certificate::from_response(resp)
    }

    pub fn products(&self, token: &Token) -> Result<Vec<Product>, ApiError> {
        self.get_json(token, PRODUCTS_PATH)
    }

    /// Last telemetry the cloud holds for `serial`.
    pub fn product_status(&self, token: &Token, serial: &str) -> Result<Envelope, ApiError> {
        self.get_json(token, &format!("{PRODUCTS_PATH}/{serial}/status"))
    }

    fn request_token(&self, body: serde_json::Value) -> Result<Token, ApiError> {
        let url = self.auth_url.join(TOKEN_PATH)?;
        let request = || {
            log::debug!("POST {url}");
            self.agent
                .post(url.as_str())
                .set("Accept", "application/json")
                .send_json(body.clone())
                .map_err(|e| classify(&url, e))
        };
        let resp: TokenResponse = backoff_retry(request, Some(self.retry_window))?.into_json()?;
        resp.into_token(Utc::now())
    }

    fn get_json<T: DeserializeOwned>(&self, token: &Token, path: &str) -> Result<T, ApiError> {
        let url = self.api_url.join(path)?;
        let authorization = token.authorization();
        let request = || {
            log::debug!("GET {url}");
            self.agent
                .get(url.as_str())
                .set("Authorization", &authorization)
                .set("Accept", "application/json")
                .call()
                .map_err(|e| classify(&url, e))
        };
        Ok(backoff_retry(request, Some(self.retry_window))?.into_json()?)
    }
}
