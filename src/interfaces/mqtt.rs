use std::path::Path;
use std::thread;
use std::time::Duration;

use rumqttc::{
    Client, Connection, ConnectionError, Event, MqttOptions, Outgoing, Packet, QoS,
    TlsConfiguration, Transport,
};
use thiserror::Error;

use crate::constants::defaults;
use crate::helpers::rand_hex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MqttEvent {
    Connected,
    Message(MqttMessage),
    Disconnected(String),
}

#[derive(Error, Debug)]
pub enum MqttError {
    #[error(transparent)]
    MqttClient(#[from] rumqttc::ClientError),
    #[error("cannot read CA bundle {path}: {source}")]
    CaFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("MQTT event loop has stopped")]
    Closed,
}

/// Where and how to connect to the vendor's broker.
#[derive(Clone)]
pub struct MqttSettings {
    pub endpoint: String,
    pub port: u16,
    pub client_id: String,
    /// PEM encoded CA used to verify the broker
    pub ca_pem: Vec<u8>,
    /// DER encoded PKCS12 client identity from the REST API
    pub pkcs12: Vec<u8>,
    pub keep_alive: Duration,
    pub reconnect_delay: Duration,
}

impl MqttSettings {
    pub fn new(endpoint: &str, port: u16, ca_file: &Path, pkcs12: Vec<u8>) -> Result<Self, MqttError> {
        let ca_pem = std::fs::read(ca_file).map_err(|source| MqttError::CaFile {
            path: ca_file.display().to_string(),
            source,
        })?;
        Ok(MqttSettings {
            endpoint: endpoint.to_string(),
            port,
            client_id: get_rand_client_id(Some(defaults::MQTT_CLIENT_ID_PREFIX)),
            ca_pem,
            pkcs12,
            keep_alive: defaults::MQTT_KEEP_ALIVE,
            reconnect_delay: defaults::MQTT_RECONNECT_DELAY,
        })
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.endpoint, self.port);
        options.set_keep_alive(self.keep_alive);
        options.set_clean_session(true);
        options.set_transport(Transport::tls_with_config(TlsConfiguration::SimpleNative {
            ca: self.ca_pem.clone(),
            client_auth: Some((self.pkcs12.clone(), String::new())),
        }));
        options
    }
}

pub fn get_rand_client_id(prefix: Option<&str>) -> String {
    const RAND_ID_BYTES: usize = 16;
    let randhex = rand_hex(RAND_ID_BYTES);

    if let Some(pref) = prefix {
        format!("{pref}-{randhex}")
    } else {
        randhex
    }
}

/// Anything that can carry a command payload to a device topic.
pub trait CommandSink: Send {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), MqttError>;
}

/// A persistent broker connection driven by its own network thread.
pub struct MqttSession {
    client: Client,
}

impl MqttSession {
    /// Start connecting and return the session with the receiving end of its
    /// event stream. `subscriptions` are (re)subscribed after every connect.
    pub fn connect(
        settings: &MqttSettings,
        subscriptions: Vec<String>,
    ) -> (Self, flume::Receiver<MqttEvent>) {
        log::info!(
            "Establishing MQTT connection to {}:{} as {}",
            settings.endpoint,
            settings.port,
            settings.client_id
        );
        let (client, connection) = Client::new(settings.options(), defaults::MQTT_CHANNEL_CAPACITY);
        let (tx, rx) = flume::unbounded();

        let loop_client = client.clone();
        let reconnect_delay = settings.reconnect_delay;
        thread::spawn(move || {
            run_event_loop(connection, loop_client, subscriptions, tx, reconnect_delay)
        });

        (MqttSession { client }, rx)
    }

    pub fn disconnect(&mut self) -> Result<(), MqttError> {
        log::debug!("Disconnecting from MQTT broker");
        self.client.disconnect()?;
        Ok(())
    }
}

impl CommandSink for MqttSession {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), MqttError> {
        log::debug!("Publishing to {}: {}", topic, payload);
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload.as_bytes().to_vec())?;
        Ok(())
    }
}

impl Drop for MqttSession {
    fn drop(&mut self) {
        if let Err(e) = self.disconnect() {
            log::debug!("Disconnect on drop failed: {e}");
        }
    }
}

fn run_event_loop(
    mut connection: Connection,
    client: Client,
    subscriptions: Vec<String>,
    tx: flume::Sender<MqttEvent>,
    reconnect_delay: Duration,
) {
    for notification in connection.iter() {
        log::trace!("Notification = {:?}", notification);
        let event = match notification {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                log::info!("Connected to MQTT broker");
                resubscribe(&client, &subscriptions);
                Some(MqttEvent::Connected)
            }
            Ok(Event::Incoming(Packet::Publish(p))) => Some(MqttEvent::Message(MqttMessage {
                topic: p.topic,
                payload: p.payload.to_vec(),
            })),
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                log::debug!("Disconnect sent; stopping MQTT event loop");
                break;
            }
            Ok(_) => None,
            Err(ConnectionError::RequestsDone) => break,
            Err(e) => {
                log::warn!(
                    "MQTT connection error: {e}; retrying in {}s",
                    reconnect_delay.as_secs()
                );
                let sent = tx.send(MqttEvent::Disconnected(e.to_string()));
                if sent.is_err() {
                    break;
                }
                thread::sleep(reconnect_delay);
                None
            }
        };
        if let Some(event) = event {
            if tx.send(event).is_err() {
                log::debug!("Event receiver dropped; stopping MQTT event loop");
                break;
            }
        }
    }
}

// This thread is the only consumer of the request channel, so it must never
// block on it: a full channel would wait on itself.
fn resubscribe(client: &Client, subscriptions: &[String]) {
    for topic in subscriptions {
        log::info!("Subscribing to {}", topic);
        if let Err(e) = client.try_subscribe(topic, QoS::AtLeastOnce) {
            log::error!("Could not subscribe to {topic}: {e}");
        }
    }
}
