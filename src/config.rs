use crate::profile::QoS;

pub const SSID_MAX: usize = 32;
pub const PASSPHRASE_MAX: usize = 64;
pub const HOST_MAX: usize = 64;
pub const CREDENTIAL_MAX: usize = 32;
pub const TOPIC_MAX: usize = 64;
pub const WILL_MESSAGE_MAX: usize = 128;
pub const CLIENT_ID_MAX: usize = 32;

pub const MAX_NETWORKS: usize = 8;
pub const MAX_SUBSCRIPTIONS: usize = 25;

pub const DEFAULT_MESSAGING_PORT: u16 = 1883;
pub const CLIENT_ID_PREFIX: &str = "device-";

// 500ms keeps the poll loop responsive without hammering the radio or broker.
pub const RETRY_INTERVAL_DEFAULT_MS: u32 = 500;
pub const RETRY_INTERVAL_MIN_MS: u32 = 50;
pub const RETRY_INTERVAL_MAX_MS: u32 = 60_000;
pub const MAX_ATTEMPTS_PER_NETWORK_DEFAULT: u8 = 3;

/// Tunables for the reconnect loop.
///
/// Values coming from persisted configuration should go through
/// [`Policy::sanitized`] before use; the manager does this on every update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Policy {
    pub retry_interval_ms: u32,
    pub hopping: bool,
    /// Consecutive failed attempts tolerated on one profile before hopping.
    pub max_attempts_per_network: u8,
    pub default_qos: QoS,
}

impl Default for Policy {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Policy {
    pub const fn defaults() -> Self {
        Self {
            retry_interval_ms: RETRY_INTERVAL_DEFAULT_MS,
            hopping: false,
            max_attempts_per_network: MAX_ATTEMPTS_PER_NETWORK_DEFAULT,
            default_qos: QoS::AtLeastOnce,
        }
    }

    pub const fn sanitized(self) -> Self {
        Self {
            retry_interval_ms: clamp_u32(
                self.retry_interval_ms,
                RETRY_INTERVAL_MIN_MS,
                RETRY_INTERVAL_MAX_MS,
            ),
            hopping: self.hopping,
            max_attempts_per_network: clamp_u8(self.max_attempts_per_network, 1, 32),
            default_qos: self.default_qos,
        }
    }
}

const fn clamp_u32(value: u32, min: u32, max: u32) -> u32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

const fn clamp_u8(value: u8, min: u8, max: u8) -> u8 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}
