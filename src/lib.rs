//! Non-blocking station link and pub/sub session keeper for small devices.
//!
//! The host firmware owns the radio driver and the messaging client and
//! exposes them through [`monitor::LinkMonitor`] and
//! [`monitor::MessagingMonitor`]. [`ConnectionManager`] is polled from the
//! main loop and brings the link up, opens the broker session, replays
//! subscriptions after every reconnect and optionally hops between several
//! configured networks. Nothing allocates; every buffer is bounded by the
//! limits in [`config`].

#![no_std]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod credentials;
pub mod error;
pub mod manager;
pub mod monitor;
pub mod profile;
pub mod status;
pub mod subscriptions;
pub mod timer;

pub use config::Policy;
pub use credentials::CredentialStore;
pub use error::{ConfigError, Field, SubscriptionError};
pub use manager::{ConnectionManager, MessageCallback, NotifyCallback, WillSupplier};
pub use monitor::{
    Attempt, ConnectRequest, LinkMonitor, LinkStatus, MessagingMonitor, SessionStatus,
};
pub use profile::{LastWill, NetworkProfile, QoS};
pub use status::{ConnectionStatus, Fault, Phase};
pub use subscriptions::{SubscriptionSet, SubscriptionSlot};
pub use timer::{Clock, RetryTimer, SystemClock};
