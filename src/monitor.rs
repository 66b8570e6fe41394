//! Narrow interfaces to the radio and the publish/subscribe client.
//!
//! Both monitors must be non-blocking: `connect` starts an attempt and
//! returns immediately, reporting [`Attempt::Pending`] when the outcome is
//! only visible through a later `status` call.

use core::fmt::Debug;
use core::net::Ipv4Addr;

use crate::profile::{LastWill, QoS};

/// Station link state as reported by the radio driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkStatus {
    Idle,
    Connecting,
    Connected,
    NoNetwork,
    ConnectFailed,
    ConnectionLost,
    Disconnected,
}

impl LinkStatus {
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// An attempt is in flight and must not be interrupted.
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Idle | Self::Connecting)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::NoNetwork => "no_network",
            Self::ConnectFailed => "connect_failed",
            Self::ConnectionLost => "connection_lost",
            Self::Disconnected => "disconnected",
        }
    }
}

/// Broker session state as reported by the messaging client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Disconnected,
    Connecting,
    Connected,
}

impl SessionStatus {
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// A connect handshake is in flight and must not be repeated.
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Connecting)
    }
}

/// Immediate result of a non-blocking connect call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attempt {
    Established,
    Pending,
}

/// Everything a messaging client needs to open a session.
#[derive(Clone, Copy, Debug)]
pub struct ConnectRequest<'a> {
    pub client_id: &'a str,
    pub host: &'a str,
    pub port: u16,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
    pub will: Option<&'a LastWill>,
}

pub trait LinkMonitor {
    type Error: Debug;

    fn status(&self) -> LinkStatus;

    fn connect(&mut self, ssid: &str, passphrase: &str) -> Result<Attempt, Self::Error>;

    fn disconnect(&mut self);

    fn address(&self) -> Option<Ipv4Addr>;

    fn mac_address(&self) -> [u8; 6];
}

pub trait MessagingMonitor {
    type Error: Debug;

    fn status(&self) -> SessionStatus;

    fn connect(&mut self, request: &ConnectRequest<'_>) -> Result<Attempt, Self::Error>;

    fn disconnect(&mut self);

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error>;

    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<(), Self::Error>;

    fn unsubscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    /// Services the session and hands every received message to `handler`.
    fn dispatch(&mut self, handler: &mut dyn FnMut(&str, &[u8]));
}
