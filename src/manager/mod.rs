//! The reconnect loop: one non-blocking step per [`ConnectionManager::poll`].
//!
//! The phase machine in `machine.rs` decides what should happen next from
//! what the monitors report; the manager carries that decision out, feeds
//! the attempt result back, and runs the side effects (callbacks, hopping,
//! resubscription) the machine asked for.

mod callbacks;
mod engine;
mod machine;
#[cfg(test)]
mod sim;

use core::fmt::Write as _;
use core::net::Ipv4Addr;

use embassy_time::{Duration, Instant};
use heapless::String;
use log::{debug, info, warn};

pub use callbacks::{MessageCallback, NotifyCallback, WillSupplier};

use self::callbacks::Callbacks;
use self::engine::{PhaseEngine, PhaseOutput};
use self::machine::{Action, AttemptOutcome, HopPolicy, Observation};
use crate::config::{Policy, CLIENT_ID_MAX, CLIENT_ID_PREFIX, MAX_SUBSCRIPTIONS};
use crate::credentials::CredentialStore;
use crate::error::{ConfigError, Field};
use crate::monitor::{Attempt, ConnectRequest, LinkMonitor, MessagingMonitor};
use crate::profile::{bounded, NetworkProfile, QoS};
use crate::status::{ConnectionStatus, Fault, Phase};
use crate::subscriptions::SubscriptionSet;
use crate::timer::{Clock, RetryTimer, SystemClock};

/// Keeps a station link and a broker session alive from the host's main loop.
///
/// Call [`poll`](Self::poll) on every iteration. Each call performs at most one
/// connection step and never blocks; attempts are spaced by the retry
/// interval in [`Policy`]. Callbacks run synchronously inside `poll` and must
/// not block.
///
/// ```ignore
/// let mut keeper = ConnectionManager::new(radio, broker, SystemClock, profile);
/// keeper.add_subscription("device/cmd");
/// loop {
///     if keeper.poll() == ConnectionStatus::FullyConnected {
///         keeper.publish("device/heartbeat", b"1");
///     }
/// }
/// ```
pub struct ConnectionManager<'cb, L, M, C = SystemClock> {
    link: L,
    messaging: M,
    clock: C,
    store: CredentialStore,
    subscriptions: SubscriptionSet<MAX_SUBSCRIPTIONS>,
    timer: RetryTimer,
    engine: PhaseEngine,
    callbacks: Callbacks<'cb>,
    policy: Policy,
    client_id: String<CLIENT_ID_MAX>,
    status: ConnectionStatus,
    last_fault: Option<Fault>,
    hop_origin: Option<usize>,
    running: bool,
}

impl<'cb, L, M, C> ConnectionManager<'cb, L, M, C>
where
    L: LinkMonitor,
    M: MessagingMonitor,
    C: Clock,
{
    pub fn new(link: L, messaging: M, clock: C, profile: NetworkProfile) -> Self {
        Self::with_store(link, messaging, clock, CredentialStore::single(profile))
    }

    pub fn with_networks(
        link: L,
        messaging: M,
        clock: C,
        profiles: &[NetworkProfile],
        start: usize,
    ) -> Result<Self, ConfigError> {
        let store = CredentialStore::from_list(profiles, start)?;
        Ok(Self::with_store(link, messaging, clock, store))
    }

    fn with_store(link: L, messaging: M, clock: C, store: CredentialStore) -> Self {
        let policy = Policy::defaults();
        let client_id = default_client_id(&link.mac_address());
        Self {
            link,
            messaging,
            clock,
            store,
            subscriptions: SubscriptionSet::new(),
            timer: RetryTimer::new(retry_interval(&policy)),
            engine: PhaseEngine::new(hop_policy(&policy)),
            callbacks: Callbacks::default(),
            policy,
            client_id,
            status: ConnectionStatus::NoConnection,
            last_fault: None,
            hop_origin: None,
            running: true,
        }
    }

    /// Advances the connection state by at most one step.
    pub fn poll(&mut self) -> ConnectionStatus {
        if !self.running {
            self.status = ConnectionStatus::NoConnection;
            return self.status;
        }

        if let Err(err) = self.store.current().validate() {
            if self.last_fault != Some(Fault::InvalidConfiguration) {
                warn!(
                    "netkeep: profile invalid index={} err={}",
                    self.store.current_index(),
                    err
                );
            }
            self.last_fault = Some(Fault::InvalidConfiguration);
            self.status = ConnectionStatus::ConnectionFailed;
            return self.status;
        }
        if self.last_fault == Some(Fault::InvalidConfiguration) {
            self.last_fault = None;
        }

        let now = self.clock.now();
        let observation = self.observe(now);
        self.status = ConnectionStatus::derive(observation.link, observation.session, true);

        let output = self.engine.tick(observation);
        self.execute(output, now);

        if self.messaging.status().is_connected() {
            self.dispatch_messages();
        }

        self.status = ConnectionStatus::derive(self.link.status(), self.messaging.status(), true);
        self.status
    }

    /// Drops both connections and restarts from the first step on the next
    /// poll, without waiting for the retry interval. Call after editing the
    /// current profile.
    pub fn update_network(&mut self) {
        info!(
            "netkeep: network update index={} ssid={}",
            self.store.current_index(),
            self.store.current().ssid().unwrap_or("")
        );
        self.teardown();
        self.hop_origin = None;
        self.timer.force_ready();
    }

    /// Re-arms a stopped manager. A new manager is already running.
    pub fn begin(&mut self) {
        if self.running {
            return;
        }
        info!("netkeep: begin");
        self.running = true;
        self.timer.force_ready();
    }

    /// Disconnects messaging and link; `poll` does nothing until `begin`.
    pub fn end(&mut self) {
        if !self.running {
            return;
        }
        info!("netkeep: end");
        self.teardown();
        self.running = false;
        self.status = ConnectionStatus::NoConnection;
    }

    pub fn set_profile(&mut self, profile: NetworkProfile) {
        self.store.replace(profile);
        self.update_network();
    }

    pub fn set_networks(
        &mut self,
        profiles: &[NetworkProfile],
        start: usize,
    ) -> Result<(), ConfigError> {
        self.store.replace_list(profiles, start)?;
        self.update_network();
        Ok(())
    }

    /// Edits take effect after [`update_network`](Self::update_network).
    pub fn profile_mut(&mut self) -> &mut NetworkProfile {
        self.store.current_mut()
    }

    pub fn set_policy(&mut self, policy: Policy) {
        let policy = policy.sanitized();
        self.policy = policy;
        self.timer.set_interval(retry_interval(&policy));
        self.engine.configure(hop_policy(&policy));
    }

    pub fn set_hopping(&mut self, enabled: bool) {
        self.set_policy(Policy {
            hopping: enabled,
            ..self.policy
        });
    }

    pub fn set_max_attempts_per_network(&mut self, attempts: u8) {
        self.set_policy(Policy {
            max_attempts_per_network: attempts,
            ..self.policy
        });
    }

    pub fn set_default_qos(&mut self, qos: QoS) {
        self.policy.default_qos = qos;
    }

    pub fn set_client_id(&mut self, client_id: &str) -> Result<(), ConfigError> {
        self.client_id = bounded(client_id, Field::ClientId)?;
        Ok(())
    }

    pub fn set_link_callback(&mut self, callback: NotifyCallback<'cb>) {
        self.callbacks.link_connected = Some(callback);
    }

    pub fn set_messaging_connect_callback(&mut self, callback: NotifyCallback<'cb>) {
        self.callbacks.messaging_connected = Some(callback);
    }

    pub fn set_messaging_disconnect_callback(&mut self, callback: NotifyCallback<'cb>) {
        self.callbacks.messaging_disconnected = Some(callback);
    }

    pub fn set_message_callback(&mut self, callback: MessageCallback<'cb>) {
        self.callbacks.message = Some(callback);
    }

    pub fn set_will_supplier(&mut self, supplier: WillSupplier<'cb>) {
        self.callbacks.will = Some(supplier);
    }

    /// Adds `topic` to the desired set and subscribes right away when the
    /// session is up. Returns false if the set rejected the topic or the
    /// immediate subscribe failed; in the latter case the topic stays in the
    /// set and is replayed on the next reconnect.
    pub fn subscribe(&mut self, topic: &str, qos: QoS) -> bool {
        if let Err(err) = self.subscriptions.add(topic, qos) {
            warn!("netkeep: subscribe rejected topic={} err={}", topic, err);
            return false;
        }
        if !self.messaging.status().is_connected() {
            return true;
        }
        match self.messaging.subscribe(topic, qos) {
            Ok(()) => true,
            Err(err) => {
                warn!("netkeep: subscribe err={:?} topic={}", err, topic);
                false
            }
        }
    }

    /// Adds `topic` with the default quality of service. No wire traffic.
    pub fn add_subscription(&mut self, topic: &str) -> bool {
        match self.subscriptions.add(topic, self.policy.default_qos) {
            Ok(_) => true,
            Err(err) => {
                warn!("netkeep: add subscription rejected topic={} err={}", topic, err);
                false
            }
        }
    }

    /// Removes `topic` from the desired set. No wire traffic.
    pub fn remove_subscription(&mut self, topic: &str) -> bool {
        self.subscriptions.remove(topic).is_ok()
    }

    pub fn unsubscribe(&mut self, topic: &str) -> bool {
        if self.subscriptions.remove(topic).is_err() {
            return false;
        }
        if !self.messaging.status().is_connected() {
            return true;
        }
        match self.messaging.unsubscribe(topic) {
            Ok(()) => true,
            Err(err) => {
                warn!("netkeep: unsubscribe err={:?} topic={}", err, topic);
                false
            }
        }
    }

    /// Publishes without retain. Returns false when the session is down;
    /// nothing is queued.
    pub fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        self.publish_retained(topic, payload, false)
    }

    pub fn publish_retained(&mut self, topic: &str, payload: &[u8], retain: bool) -> bool {
        if !self.messaging.status().is_connected() {
            return false;
        }
        match self.messaging.publish(topic, payload, retain) {
            Ok(()) => true,
            Err(err) => {
                warn!("netkeep: publish err={:?} topic={}", err, topic);
                false
            }
        }
    }

    pub fn log_subscriptions(&self) {
        info!(
            "netkeep: subscriptions active={} capacity={}",
            self.subscriptions.active_count(),
            self.subscriptions.capacity()
        );
        self.subscriptions.for_each_active(|index, slot| {
            info!(
                "netkeep: sub[{}] topic={} qos={}",
                index,
                slot.topic(),
                slot.qos().as_u8()
            );
        });
    }

    /// Status computed by the most recent `poll`.
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn phase(&self) -> Phase {
        self.engine.phase()
    }

    /// Most recent failure since the last fully successful connection.
    pub fn last_fault(&self) -> Option<Fault> {
        self.last_fault
    }

    pub fn address(&self) -> Option<Ipv4Addr> {
        self.link.address()
    }

    pub fn current_profile(&self) -> &NetworkProfile {
        self.store.current()
    }

    pub fn current_index(&self) -> usize {
        self.store.current_index()
    }

    pub fn network_count(&self) -> usize {
        self.store.len()
    }

    pub fn subscriptions(&self) -> &SubscriptionSet<MAX_SUBSCRIPTIONS> {
        &self.subscriptions
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn default_qos(&self) -> QoS {
        self.policy.default_qos
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn messaging(&self) -> &M {
        &self.messaging
    }

    fn observe(&self, now: Instant) -> Observation {
        Observation {
            link: self.link.status(),
            session: self.messaging.status(),
            messaging_configured: self.store.current().messaging_configured(),
            retry_ready: self.timer.is_ready(now),
        }
    }

    fn execute(&mut self, output: PhaseOutput, now: Instant) {
        self.handle_effects(output);
        let follow_up = match output.action {
            Action::None => None,
            Action::ConnectLink => {
                self.timer.reset(now);
                let outcome = self.connect_link();
                Some(self.engine.link_attempt(outcome))
            }
            Action::ConnectMessaging => {
                self.timer.reset(now);
                let outcome = self.connect_messaging();
                Some(self.engine.messaging_attempt(outcome))
            }
            Action::DropMessaging => {
                self.messaging.disconnect();
                None
            }
            Action::ResetLink => {
                self.messaging.disconnect();
                self.link.disconnect();
                self.timer.reset(now);
                let outcome = self.connect_link();
                Some(self.engine.link_attempt(outcome))
            }
        };
        if let Some(follow_up) = follow_up {
            self.handle_effects(follow_up);
        }
    }

    fn handle_effects(&mut self, output: PhaseOutput) {
        if output.changed() {
            debug!(
                "netkeep: phase {} -> {}",
                output.before.as_str(),
                output.after.as_str()
            );
        }
        if let Some(fault) = output.fault {
            warn!(
                "netkeep: {} index={} failures={}",
                fault.as_str(),
                self.store.current_index(),
                self.engine.failures()
            );
            self.last_fault = Some(fault);
        }
        if output.link_up {
            info!(
                "netkeep: link up ssid={} addr={:?}",
                self.store.current().ssid().unwrap_or(""),
                self.link.address()
            );
            if !self.store.current().messaging_configured() {
                self.hop_origin = None;
                self.last_fault = None;
            }
            self.callbacks.notify_link_connected();
        }
        if output.messaging_down {
            info!("netkeep: messaging down");
            self.callbacks.notify_messaging_disconnected();
        }
        if output.hop {
            self.hop();
        }
        if output.resubscribe {
            self.hop_origin = None;
            self.last_fault = if self.resubscribe() {
                None
            } else {
                Some(Fault::ResubscribeFailed)
            };
        }
        if output.messaging_up {
            info!(
                "netkeep: messaging up host={} client_id={}",
                self.store.current().messaging_host().unwrap_or(""),
                self.client_id
            );
            self.callbacks.notify_messaging_connected();
        }
    }

    fn hop(&mut self) {
        let from = self.store.current_index();
        let origin = *self.hop_origin.get_or_insert(from);
        let to = self.store.advance();
        info!("netkeep: hopping network {} -> {}", from, to);
        if to == origin {
            warn!(
                "netkeep: all {} networks failed, starting over",
                self.store.len()
            );
            self.last_fault = Some(Fault::CredentialsExhausted);
        }
    }

    fn teardown(&mut self) {
        self.messaging.disconnect();
        self.link.disconnect();
        let output = self.engine.reset();
        self.handle_effects(output);
    }

    fn connect_link(&mut self) -> AttemptOutcome {
        let profile = self.store.current();
        let Some(ssid) = profile.ssid() else {
            return AttemptOutcome::Failed;
        };
        debug!("netkeep: link attempt ssid={}", ssid);
        match self.link.connect(ssid, profile.passphrase()) {
            Ok(Attempt::Established) => AttemptOutcome::Established,
            Ok(Attempt::Pending) => AttemptOutcome::Pending,
            Err(err) => {
                warn!("netkeep: link connect err={:?} ssid={}", err, ssid);
                AttemptOutcome::Failed
            }
        }
    }

    fn connect_messaging(&mut self) -> AttemptOutcome {
        let supplied_will = self.callbacks.supply_will();
        let profile = self.store.current();
        let Some(host) = profile.messaging_host() else {
            return AttemptOutcome::Failed;
        };
        let request = ConnectRequest {
            client_id: self.client_id.as_str(),
            host,
            port: profile.messaging_port(),
            username: profile.messaging_user(),
            password: profile.messaging_password(),
            will: supplied_will.as_ref().or(profile.will()),
        };
        debug!(
            "netkeep: messaging attempt host={} port={} will={}",
            host,
            request.port,
            request.will.is_some()
        );
        match self.messaging.connect(&request) {
            Ok(Attempt::Established) => AttemptOutcome::Established,
            Ok(Attempt::Pending) => AttemptOutcome::Pending,
            Err(err) => {
                warn!("netkeep: messaging connect err={:?} host={}", err, host);
                AttemptOutcome::Failed
            }
        }
    }

    /// Replays the desired set in slot order, stopping at the first failure.
    /// A partial replay is not resumed; the next session starts over.
    fn resubscribe(&mut self) -> bool {
        let Self {
            subscriptions,
            messaging,
            ..
        } = self;
        for slot in subscriptions.iter_active() {
            if let Err(err) = messaging.subscribe(slot.topic(), slot.qos()) {
                warn!(
                    "netkeep: resubscribe err={:?} topic={}",
                    err,
                    slot.topic()
                );
                return false;
            }
        }
        debug!(
            "netkeep: resubscribed count={}",
            subscriptions.active_count()
        );
        true
    }

    fn dispatch_messages(&mut self) {
        let Self {
            messaging,
            callbacks,
            ..
        } = self;
        messaging.dispatch(&mut |topic: &str, payload: &[u8]| {
            match callbacks.message.as_mut() {
                Some(callback) => callback(topic, payload),
                None => debug!(
                    "netkeep: dropped message topic={} len={}",
                    topic,
                    payload.len()
                ),
            }
        });
    }
}

fn hop_policy(policy: &Policy) -> HopPolicy {
    HopPolicy {
        hopping: policy.hopping,
        max_attempts: policy.max_attempts_per_network,
    }
}

fn retry_interval(policy: &Policy) -> Duration {
    Duration::from_millis(u64::from(policy.retry_interval_ms))
}

fn default_client_id(mac: &[u8; 6]) -> String<CLIENT_ID_MAX> {
    let mut id = String::new();
    // Prefix plus six hex digits always fits.
    let _ = write!(
        id,
        "{}{:02x}{:02x}{:02x}",
        CLIENT_ID_PREFIX, mac[3], mac[4], mac[5]
    );
    id
}
