pub const LOG_LEVEL: &str = "LOGGING_LEVEL";

pub const EMAIL: &str = "LANDROID_EMAIL";
pub const PASSWORD: &str = "LANDROID_PASSWORD";
pub const CLOUD: &str = "LANDROID_CLOUD";
pub const API_URL: &str = "LANDROID_API_URL";
pub const AUTH_URL: &str = "LANDROID_AUTH_URL";
pub const CLIENT_ID: &str = "LANDROID_CLIENT_ID";

pub const MQTT_CA_FILE: &str = "LANDROID_MQTT_CA_FILE";
pub const MQTT_PORT: &str = "LANDROID_MQTT_PORT";

pub const DATA_DIR: &str = "LANDROID_DATA_DIR";
pub const REQUEST_TIMEOUT: &str = "LANDROID_REQUEST_TIMEOUT";
pub const RETRY_WINDOW: &str = "LANDROID_RETRY_WINDOW";

pub const POLL_LIMIT: &str = "LANDROID_POLL_LIMIT";
pub const POLL_PERIOD: &str = "LANDROID_POLL_PERIOD";
