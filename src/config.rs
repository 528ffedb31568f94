use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::constants::{defaults, envvars, CloudEndpoints, CLOUDS};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown cloud '{0}'; expected one of worx, kress, landxcape, ferrex")]
    UnknownCloud(String),
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
    #[error("invalid URL in {var}: {source}")]
    Url {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub email: Option<String>,
    pub password: Option<String>,
    pub cloud: CloudEndpoints,
    pub api_url: Url,
    pub auth_url: Url,
    pub client_id: String,
    pub mqtt_port: u16,
    pub mqtt_ca_file: PathBuf,
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
    pub retry_window: Duration,
    pub poll_limit: u32,
    pub poll_period: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let cloud_name = env::var(envvars::CLOUD)
            .unwrap_or_else(|_| defaults::CLOUD.to_string())
            .to_lowercase();
        let cloud = CLOUDS
            .get(cloud_name.as_str())
            .copied()
            .ok_or(ConfigError::UnknownCloud(cloud_name))?;

        let api_url = url_var(
            envvars::API_URL,
            format!("https://{}/{}", cloud.api_host, defaults::API_VERSION_PATH),
        )?;
        let auth_url = url_var(envvars::AUTH_URL, format!("https://{}/", cloud.auth_host))?;

        Ok(Config {
            email: env::var(envvars::EMAIL).ok(),
            password: env::var(envvars::PASSWORD).ok(),
            cloud,
            api_url,
            auth_url,
            client_id: env::var(envvars::CLIENT_ID).unwrap_or_else(|_| cloud.client_id.into()),
            mqtt_port: parsed_var(envvars::MQTT_PORT, defaults::MQTT_PORT)?,
            mqtt_ca_file: env::var(envvars::MQTT_CA_FILE)
                .unwrap_or_else(|_| defaults::MQTT_CA_FILE.into())
                .into(),
            data_dir: env::var(envvars::DATA_DIR)
                .unwrap_or_else(|_| defaults::DATA_DIR.into())
                .into(),
            request_timeout: secs_var(envvars::REQUEST_TIMEOUT, defaults::API_REQUEST_TIMEOUT)?,
            retry_window: secs_var(envvars::RETRY_WINDOW, defaults::API_RETRY_WINDOW)?,
            poll_limit: parsed_var(envvars::POLL_LIMIT, defaults::POLL_LIMIT_CALLS)?,
            poll_period: secs_var(envvars::POLL_PERIOD, defaults::POLL_LIMIT_PERIOD)?,
        })
    }

    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        let email = self
            .email
            .as_deref()
            .ok_or(ConfigError::Missing(envvars::EMAIL))?;
        let password = self
            .password
            .as_deref()
            .ok_or(ConfigError::Missing(envvars::PASSWORD))?;
        Ok((email, password))
    }

    /// Scope under which this account's session is stored.
    pub fn account_scope(&self) -> String {
        format!(
            "{}:{}",
            self.cloud.brand.to_lowercase(),
            self.email.as_deref().unwrap_or_default()
        )
    }
}

fn parsed_var<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(default),
    }
}

fn secs_var(var: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    parsed_var(var, default.as_secs()).map(Duration::from_secs)
}

// A base URL needs its trailing slash for Url::join to append rather than replace
fn url_var(var: &'static str, default: String) -> Result<Url, ConfigError> {
    let mut raw = env::var(var).unwrap_or(default);
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).map_err(|source| ConfigError::Url { var, source })
}
