use crate::monitor::{LinkStatus, SessionStatus};

/// Externally visible connection status, one per poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    NoConnection,
    WifiOnlyConnected,
    FullyConnected,
    WifiConnectingDotted,
    Reconnecting,
    BadConnection,
    ConnectionFailed,
}

impl ConnectionStatus {
    /// Derives the status from what the monitors report right now.
    pub const fn derive(link: LinkStatus, session: SessionStatus, config_valid: bool) -> Self {
        if !config_valid {
            return Self::ConnectionFailed;
        }
        if link.is_connected() {
            return if session.is_connected() {
                Self::FullyConnected
            } else {
                Self::WifiOnlyConnected
            };
        }
        if session.is_connected() {
            return Self::BadConnection;
        }
        match link {
            LinkStatus::Idle | LinkStatus::Connecting => Self::WifiConnectingDotted,
            LinkStatus::ConnectionLost => Self::Reconnecting,
            LinkStatus::NoNetwork | LinkStatus::ConnectFailed => Self::BadConnection,
            LinkStatus::Disconnected | LinkStatus::Connected => Self::NoConnection,
        }
    }

    pub const fn code(self) -> i8 {
        match self {
            Self::ConnectionFailed => -1,
            Self::NoConnection => 0,
            Self::WifiOnlyConnected => 2,
            Self::FullyConnected => 3,
            Self::WifiConnectingDotted => 4,
            Self::Reconnecting => 5,
            Self::BadConnection => 6,
        }
    }

    pub const fn from_code(code: i8) -> Option<Self> {
        match code {
            -1 => Some(Self::ConnectionFailed),
            0 => Some(Self::NoConnection),
            2 => Some(Self::WifiOnlyConnected),
            3 => Some(Self::FullyConnected),
            4 => Some(Self::WifiConnectingDotted),
            5 => Some(Self::Reconnecting),
            6 => Some(Self::BadConnection),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoConnection => "no_connection",
            Self::WifiOnlyConnected => "wifi_only",
            Self::FullyConnected => "fully_connected",
            Self::WifiConnectingDotted => "wifi_connecting",
            Self::Reconnecting => "reconnecting",
            Self::BadConnection => "bad_connection",
            Self::ConnectionFailed => "connection_failed",
        }
    }
}

/// Reconnect state machine phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Disconnected,
    LinkConnecting,
    LinkUp,
    MessagingConnecting,
    FullyUp,
    Degraded,
    HoppingPending,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::LinkConnecting => "link_connecting",
            Self::LinkUp => "link_up",
            Self::MessagingConnecting => "messaging_connecting",
            Self::FullyUp => "fully_up",
            Self::Degraded => "degraded",
            Self::HoppingPending => "hopping_pending",
        }
    }
}

/// Last failure the manager observed. Never fatal; see `ConnectionManager::last_fault`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    InvalidConfiguration,
    LinkAttemptFailed,
    MessagingAttemptFailed,
    ResubscribeFailed,
    CredentialsExhausted,
}

impl Fault {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidConfiguration => "invalid_configuration",
            Self::LinkAttemptFailed => "link_attempt_failed",
            Self::MessagingAttemptFailed => "messaging_attempt_failed",
            Self::ResubscribeFailed => "resubscribe_failed",
            Self::CredentialsExhausted => "credentials_exhausted",
        }
    }
}
