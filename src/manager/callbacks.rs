use crate::profile::LastWill;

pub type NotifyCallback<'cb> = &'cb mut dyn FnMut();
/// Receives `(topic, payload)`; the payload length is `payload.len()`.
pub type MessageCallback<'cb> = &'cb mut dyn FnMut(&str, &[u8]);
/// Builds a per-session will at connect time. `None` keeps the profile's will.
pub type WillSupplier<'cb> = &'cb mut dyn FnMut() -> Option<LastWill>;

/// Registered callbacks. Each slot is either set or absent; nothing else
/// tracks registration.
#[derive(Default)]
pub(crate) struct Callbacks<'cb> {
    pub(crate) link_connected: Option<NotifyCallback<'cb>>,
    pub(crate) messaging_connected: Option<NotifyCallback<'cb>>,
    pub(crate) messaging_disconnected: Option<NotifyCallback<'cb>>,
    pub(crate) message: Option<MessageCallback<'cb>>,
    pub(crate) will: Option<WillSupplier<'cb>>,
}

impl<'cb> Callbacks<'cb> {
    pub(crate) fn notify_link_connected(&mut self) {
        if let Some(callback) = self.link_connected.as_mut() {
            callback();
        }
    }

    pub(crate) fn notify_messaging_connected(&mut self) {
        if let Some(callback) = self.messaging_connected.as_mut() {
            callback();
        }
    }

    pub(crate) fn notify_messaging_disconnected(&mut self) {
        if let Some(callback) = self.messaging_disconnected.as_mut() {
            callback();
        }
    }

    pub(crate) fn supply_will(&mut self) -> Option<LastWill> {
        self.will.as_mut().and_then(|supplier| supplier())
    }
}
