use chrono::Utc;
use kvstore::{KVDb, KvError};
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::constants::keys;
use crate::helpers::RateLimiter;
use crate::interfaces::http_api::{ApiClient, ApiError, Product, Token};
use crate::interfaces::mqtt::{MqttError, MqttSession, MqttSettings};
use crate::mower::{Mower, MowerState};

#[derive(Error, Debug)]
pub enum CloudError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("session store: {0}")]
    Store(#[from] KvError),
    #[error("no mower with serial number {0} on this account")]
    UnknownDevice(String),
    #[error(transparent)]
    Mqtt(#[from] MqttError),
}

/// Account-level access to the vendor cloud.
///
/// The OAuth token is kept in the session store under the account's scope so
/// that separate invocations share a login until the token expires.
pub struct CloudClient {
    config: Config,
    api: ApiClient,
    store: KVDb,
    token: Option<Token>,
}

impl CloudClient {
    pub fn new(config: Config) -> Result<Self, CloudError> {
        let store = KVDb::open(config.data_dir.join(keys::SESSION_DB_PATH))?;
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: KVDb) -> Result<Self, CloudError> {
        let api = ApiClient::from_config(&config)?;
        Ok(CloudClient {
            config,
            api,
            store,
            token: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A usable token: the cached or stored one while it is fresh, otherwise a
    /// refreshed one, otherwise a new login.
    pub fn authenticate(&mut self) -> Result<Token, CloudError> {
        let scope = self.config.account_scope();
        if self.token.is_none() {
            self.token = self.store.get::<Token>(&scope, keys::TOKEN)?;
            if self.token.is_some() {
                log::debug!("Using stored session");
            }
        }

        let token = match self.token.take() {
            Some(token) if !token.needs_refresh(Utc::now()) => {
                self.token = Some(token.clone());
                return Ok(token);
            }
            Some(stale) => match self.api.refresh(&stale) {
                Ok(token) => token,
                Err(e) => {
                    log::warn!("Token refresh failed ({e}); logging in again");
                    self.login()?
                }
            },
            None => self.login()?,
        };

        self.store.set(&scope, keys::TOKEN, &token)?;
        self.token = Some(token.clone());
        Ok(token)
    }

    fn login(&self) -> Result<Token, CloudError> {
        let (email, password) = self.config.credentials()?;
        Ok(self.api.login(email, password)?)
    }

    /// Drop the stored session. Returns whether one existed.
    pub fn logout(&mut self) -> Result<bool, CloudError> {
        self.token = None;
        let removed = self.store.clear_scope(self.config.account_scope())?;
        Ok(removed > 0)
    }

    /// Run an authenticated call, logging in again once if the cloud rejects
    /// the current token.
    fn authorized<T>(
        &mut self,
        call: impl Fn(&ApiClient, &Token) -> Result<T, ApiError>,
    ) -> Result<T, CloudError> {
        let token = self.authenticate()?;
        match call(&self.api, &token) {
            Err(ApiError::Unauthorized(status)) => {
                log::warn!("Session rejected (HTTP {status}); logging in again");
                self.logout()?;
                let token = self.authenticate()?;
                Ok(call(&self.api, &token)?)
            }
            result => Ok(result?),
        }
    }

    pub fn devices(&mut self) -> Result<Vec<Product>, CloudError> {
        self.authorized(|api, token| api.products(token))
    }

    pub fn device(&mut self, serial: &str) -> Result<Product, CloudError> {
        self.devices()?
            .into_iter()
            .find(|p| p.serial_number == serial)
            .ok_or_else(|| CloudError::UnknownDevice(serial.to_string()))
    }

    /// Last known state as held by the cloud, without opening MQTT.
    pub fn status(&mut self, serial: &str) -> Result<(Product, MowerState), CloudError> {
        let product = self.device(serial)?;
        let envelope = self.authorized(|api, token| api.product_status(token, serial))?;
        let mut state = MowerState::default();
        state.apply(&envelope, Utc::now());
        Ok((product, state))
    }

    /// Open a live MQTT connection to one mower.
    pub fn connect(&mut self, serial: &str) -> Result<Mower, CloudError> {
        let product = self.device(serial)?;
        let profile = self.authorized(|api, token| api.profile(token))?;
        let certificate = self.authorized(|api, token| api.certificate(token))?;
        if !certificate.active {
            log::warn!("The account certificate is marked inactive");
        }

        let mut state = MowerState::default();
        match self.authorized(|api, token| api.product_status(token, serial)) {
            Ok(envelope) => state.apply(&envelope, Utc::now()),
            Err(e) => log::warn!("Starting without stored status for {serial}: {e}"),
        }

        let settings = MqttSettings::new(
            &profile.mqtt_endpoint,
            self.config.mqtt_port,
            &self.config.mqtt_ca_file,
            certificate.pkcs12,
        )?;
        let (session, events) =
            MqttSession::connect(&settings, vec![product.mqtt_topics.command_out.clone()]);

        Ok(Mower::new(
            product,
            state,
            Box::new(session),
            events,
            RateLimiter::new(self.config.poll_limit, self.config.poll_period),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;
    use std::time::Duration;

    use chrono::TimeDelta;
    use mockito::Matcher;
    use serde_json::json;
    use url::Url;

    use crate::constants::{defaults, CLOUDS};

    const PRODUCTS: &str = r#"[{
        "serial_number": "SN1",
        "name": "Back lawn",
        "mac_address": "AABBCCDDEEFF",
        "mqtt_topics": {"command_in": "PRM100/AABBCCDDEEFF/commandIn", "command_out": "PRM100/AABBCCDDEEFF/commandOut"}
    }]"#;

    fn token_body(access: &str) -> String {
        format!(
            r#"{{"access_token":"{access}","refresh_token":"refresh-{access}","token_type":"Bearer","expires_in":3600}}"#
        )
    }

    fn config(server: &mockito::Server, data_dir: &Path) -> Config {
        let base = Url::parse(&format!("{}/", server.url())).unwrap();
        Config {
            email: Some("me@example.com".to_string()),
            password: Some("secret".to_string()),
            cloud: CLOUDS["worx"],
            api_url: base.join("api/v2/").unwrap(),
            auth_url: base,
            client_id: "client-1".to_string(),
            mqtt_port: defaults::MQTT_PORT,
            mqtt_ca_file: data_dir.join("ca.pem"),
            data_dir: data_dir.to_path_buf(),
            request_timeout: Duration::from_secs(5),
            retry_window: Duration::from_secs(1),
            poll_limit: 1,
            poll_period: Duration::from_secs(60),
        }
    }

    fn cloud(server: &mockito::Server) -> CloudClient {
        CloudClient::with_store(config(server, Path::new("/tmp")), KVDb::in_memory().unwrap())
            .unwrap()
    }

    fn login_mock(server: &mut mockito::Server, access: &str) -> mockito::Mock {
        server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::PartialJson(json!({"grant_type": "password"})))
            .with_body(token_body(access))
            .create()
    }

    #[test]
    fn test_session_is_stored_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new();
        let login = login_mock(&mut server, "first");
        let products = server
            .mock("GET", "/api/v2/product-items")
            .match_header("Authorization", "Bearer first")
            .with_body(PRODUCTS)
            .expect(2)
            .create();

        let mut client = CloudClient::new(config(&server, dir.path())).unwrap();
        assert_eq!(client.devices().unwrap()[0].serial_number, "SN1");
        drop(client);

        // a fresh client picks the token up from disk
        let mut client = CloudClient::new(config(&server, dir.path())).unwrap();
        assert_eq!(client.devices().unwrap().len(), 1);

        login.assert();
        products.assert();

        assert!(client.logout().unwrap());
        assert!(!client.logout().unwrap());
    }

    #[test]
    fn test_expiring_token_is_refreshed() {
        let mut server = mockito::Server::new();
        let refresh = server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::PartialJson(json!({
                "grant_type": "refresh_token",
                "refresh_token": "r-old",
            })))
            .with_body(token_body("renewed"))
            .expect(1)
            .create();

        let mut client = cloud(&server);
        let stale = Token {
            access_token: "old".to_string(),
            refresh_token: Some("r-old".to_string()),
            token_type: "Bearer".to_string(),
            expires_at: Utc::now() + TimeDelta::minutes(1),
        };
        client
            .store
            .set(client.config.account_scope(), keys::TOKEN, &stale)
            .unwrap();

        let token = client.authenticate().unwrap();
        refresh.assert();
        assert_eq!(token.access_token, "renewed");

        let stored: Token = client
            .store
            .get(client.config.account_scope(), keys::TOKEN)
            .unwrap()
            .unwrap();
        assert_eq!(stored, token);
    }

    #[test]
    fn test_failed_refresh_falls_back_to_login() {
        let mut server = mockito::Server::new();
        let refresh = server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::PartialJson(json!({"grant_type": "refresh_token"})))
            .with_status(400)
            .create();
        let login = login_mock(&mut server, "fresh");

        let mut client = cloud(&server);
        client.token = Some(Token {
            access_token: "old".to_string(),
            refresh_token: Some("revoked".to_string()),
            token_type: "Bearer".to_string(),
            expires_at: Utc::now() - TimeDelta::hours(1),
        });

        assert_eq!(client.authenticate().unwrap().access_token, "fresh");
        refresh.assert();
        login.assert();
    }

    #[test]
    fn test_rejected_session_logs_in_again() {
        let mut server = mockito::Server::new();
        let rejected = server
            .mock("GET", "/api/v2/product-items")
            .match_header("Authorization", "Bearer revoked")
            .with_status(401)
            .expect(1)
            .create();
        let accepted = server
            .mock("GET", "/api/v2/product-items")
            .match_header("Authorization", "Bearer fresh")
            .with_body(PRODUCTS)
            .expect(1)
            .create();
        let login = login_mock(&mut server, "fresh");

        let mut client = cloud(&server);
        client.token = Some(Token {
            access_token: "revoked".to_string(),
            refresh_token: None,
            token_type: "Bearer".to_string(),
            expires_at: Utc::now() + TimeDelta::hours(1),
        });

        assert_eq!(client.devices().unwrap().len(), 1);
        rejected.assert();
        accepted.assert();
        login.assert();
    }

    #[test]
    fn test_missing_credentials() {
        let server = mockito::Server::new();
        let mut client = cloud(&server);
        client.config.password = None;
        assert!(matches!(
            client.devices(),
            Err(CloudError::Config(ConfigError::Missing(_)))
        ));
    }

    #[test]
    fn test_status_and_unknown_device() {
        let mut server = mockito::Server::new();
        let _login = login_mock(&mut server, "access");
        let _products = server
            .mock("GET", "/api/v2/product-items")
            .with_body(PRODUCTS)
            .create();
        let status = server
            .mock("GET", "/api/v2/product-items/SN1/status")
            .with_body(r#"{"dat":{"ls":7,"le":0,"bt":{"p":64}},"cfg":{"sn":"SN1","sc":{"m":1}}}"#)
            .create();

        let mut client = cloud(&server);
        let (product, state) = client.status("SN1").unwrap();
        status.assert();
        assert_eq!(product.name, "Back lawn");
        assert!(state.is_mowing());
        assert_eq!(state.battery.percent, Some(64));
        assert!(state.schedule.active);

        assert!(matches!(
            client.status("SN2"),
            Err(CloudError::UnknownDevice(serial)) if serial == "SN2"
        ));
        assert!(matches!(
            client.connect("SN2"),
            Err(CloudError::UnknownDevice(_))
        ));
    }
}
