use core::fmt;

/// Profile field a [`ConfigError`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Ssid,
    Passphrase,
    MessagingHost,
    MessagingUser,
    MessagingPassword,
    WillTopic,
    WillMessage,
    ClientId,
}

impl Field {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ssid => "ssid",
            Self::Passphrase => "passphrase",
            Self::MessagingHost => "messaging_host",
            Self::MessagingUser => "messaging_user",
            Self::MessagingPassword => "messaging_password",
            Self::WillTopic => "will_topic",
            Self::WillMessage => "will_message",
            Self::ClientId => "client_id",
        }
    }
}

/// Rejected network configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(Field),
    Empty(Field),
    TooLong(Field),
    InvalidPort,
    NoNetworks,
    TooManyNetworks,
    StartIndexOutOfRange { index: usize, len: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(field) => write!(f, "missing {}", field.as_str()),
            Self::Empty(field) => write!(f, "empty {}", field.as_str()),
            Self::TooLong(field) => write!(f, "{} too long", field.as_str()),
            Self::InvalidPort => f.write_str("messaging port must be non-zero"),
            Self::NoNetworks => f.write_str("network list is empty"),
            Self::TooManyNetworks => f.write_str("network list exceeds capacity"),
            Self::StartIndexOutOfRange { index, len } => {
                write!(f, "start index {} out of range for {} networks", index, len)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriptionError {
    EmptyTopic,
    TopicTooLong,
    Duplicate,
    CapacityExceeded,
    NotFound,
}

impl fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EmptyTopic => "empty topic",
            Self::TopicTooLong => "topic too long",
            Self::Duplicate => "topic already subscribed",
            Self::CapacityExceeded => "subscription capacity exceeded",
            Self::NotFound => "topic not subscribed",
        })
    }
}
