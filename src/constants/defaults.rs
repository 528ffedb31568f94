use std::time::Duration;

pub const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const API_RETRY_WINDOW: Duration = Duration::from_secs(60);
pub const API_VERSION_PATH: &str = "api/v2/";
pub const CLOUD: &str = "worx";
pub const DATA_DIR: &str = "./data";
pub const LOG_LEVEL: &str = "INFO";

// Tokens are refreshed once fewer than this remain before expiry
pub const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

pub const MQTT_PORT: u16 = 8883;
pub const MQTT_KEEP_ALIVE: Duration = Duration::from_secs(60);
pub const MQTT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
pub const MQTT_CHANNEL_CAPACITY: usize = 10;
pub const MQTT_CLIENT_ID_PREFIX: &str = "android";
pub const MQTT_CA_FILE: &str = "/etc/ssl/certs/ca-certificates.crt";

pub const POLL_LIMIT_CALLS: u32 = 1;
pub const POLL_LIMIT_PERIOD: Duration = Duration::from_secs(60);

// How long one-shot CLI commands wait for the mower to report back
pub const COMMAND_RESPONSE_TIMEOUT: Duration = Duration::from_secs(15);

pub const REDACTED: &str = "**REDACTED**";
