//! Scripted radio, broker and clock for driving the manager on the host.

use core::cell::{Cell, RefCell};
use core::net::Ipv4Addr;
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use embassy_time::Instant;

use crate::monitor::{
    Attempt, ConnectRequest, LinkMonitor, LinkStatus, MessagingMonitor, SessionStatus,
};
use crate::profile::QoS;

pub(crate) const SIM_MAC: [u8; 6] = [0xde, 0xad, 0xbe, 0xef, 0x01, 0x02];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SimError;

#[derive(Clone, Debug, Default)]
pub(crate) struct SimClock {
    now_ms: Rc<Cell<u64>>,
}

impl SimClock {
    pub(crate) fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

impl crate::timer::Clock for SimClock {
    fn now(&self) -> Instant {
        Instant::from_millis(self.now_ms.get())
    }
}

#[derive(Debug)]
pub(crate) struct LinkState {
    pub(crate) status: LinkStatus,
    /// SSIDs passed to `connect`, in order.
    pub(crate) attempts: Vec<String>,
    /// The next this-many attempts end in `ConnectFailed`.
    pub(crate) fail_next: usize,
    pub(crate) disconnects: usize,
}

impl Default for LinkState {
    fn default() -> Self {
        Self {
            status: LinkStatus::Disconnected,
            attempts: Vec::new(),
            fail_next: 0,
            disconnects: 0,
        }
    }
}

/// Radio that settles immediately; the manager sees the result on the
/// next poll.
pub(crate) struct SimLink {
    state: Rc<RefCell<LinkState>>,
}

impl SimLink {
    pub(crate) fn new() -> (Self, Rc<RefCell<LinkState>>) {
        let state = Rc::new(RefCell::new(LinkState::default()));
        (
            Self {
                state: Rc::clone(&state),
            },
            state,
        )
    }
}

impl LinkMonitor for SimLink {
    type Error = SimError;

    fn status(&self) -> LinkStatus {
        self.state.borrow().status
    }

    fn connect(&mut self, ssid: &str, _passphrase: &str) -> Result<Attempt, SimError> {
        let mut state = self.state.borrow_mut();
        state.attempts.push(ssid.to_string());
        if state.fail_next > 0 {
            state.fail_next -= 1;
            state.status = LinkStatus::ConnectFailed;
        } else {
            state.status = LinkStatus::Connected;
        }
        Ok(Attempt::Pending)
    }

    fn disconnect(&mut self) {
        let mut state = self.state.borrow_mut();
        state.status = LinkStatus::Disconnected;
        state.disconnects += 1;
    }

    fn address(&self) -> Option<Ipv4Addr> {
        self.status()
            .is_connected()
            .then_some(Ipv4Addr::new(10, 0, 0, 7))
    }

    fn mac_address(&self) -> [u8; 6] {
        SIM_MAC
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ConnectRecord {
    pub(crate) client_id: String,
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) will_topic: Option<String>,
}

#[derive(Debug)]
pub(crate) struct BrokerState {
    pub(crate) status: SessionStatus,
    pub(crate) connects: Vec<ConnectRecord>,
    /// The next this-many connects are refused.
    pub(crate) fail_next: usize,
    pub(crate) refuse_all: bool,
    /// Accepted connects stay `Connecting` until the test settles them.
    pub(crate) handshake_pending: bool,
    pub(crate) subscribes: Vec<(String, QoS)>,
    pub(crate) unsubscribes: Vec<String>,
    /// One-shot: the next subscribe to this topic is refused.
    pub(crate) refuse_subscribe: Option<String>,
    pub(crate) published: Vec<(String, Vec<u8>, bool)>,
    pub(crate) inbox: Vec<(String, Vec<u8>)>,
    pub(crate) disconnects: usize,
}

impl Default for BrokerState {
    fn default() -> Self {
        Self {
            status: SessionStatus::Disconnected,
            connects: Vec::new(),
            fail_next: 0,
            refuse_all: false,
            handshake_pending: false,
            subscribes: Vec::new(),
            unsubscribes: Vec::new(),
            refuse_subscribe: None,
            published: Vec::new(),
            inbox: Vec::new(),
            disconnects: 0,
        }
    }
}

impl BrokerState {
    pub(crate) fn subscribed_topics(&self) -> Vec<&str> {
        self.subscribes
            .iter()
            .map(|(topic, _)| topic.as_str())
            .collect()
    }
}

pub(crate) struct SimBroker {
    state: Rc<RefCell<BrokerState>>,
}

impl SimBroker {
    pub(crate) fn new() -> (Self, Rc<RefCell<BrokerState>>) {
        let state = Rc::new(RefCell::new(BrokerState::default()));
        (
            Self {
                state: Rc::clone(&state),
            },
            state,
        )
    }
}

impl MessagingMonitor for SimBroker {
    type Error = SimError;

    fn status(&self) -> SessionStatus {
        self.state.borrow().status
    }

    fn connect(&mut self, request: &ConnectRequest<'_>) -> Result<Attempt, SimError> {
        let mut state = self.state.borrow_mut();
        state.connects.push(ConnectRecord {
            client_id: request.client_id.to_string(),
            host: request.host.to_string(),
            port: request.port,
            will_topic: request.will.map(|will| will.topic().to_string()),
        });
        if state.refuse_all {
            return Err(SimError);
        }
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(SimError);
        }
        if state.handshake_pending {
            state.status = SessionStatus::Connecting;
            return Ok(Attempt::Pending);
        }
        state.status = SessionStatus::Connected;
        Ok(Attempt::Established)
    }

    fn disconnect(&mut self) {
        let mut state = self.state.borrow_mut();
        state.status = SessionStatus::Disconnected;
        state.disconnects += 1;
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), SimError> {
        let mut state = self.state.borrow_mut();
        if !state.status.is_connected() {
            return Err(SimError);
        }
        state
            .published
            .push((topic.to_string(), payload.to_vec(), retain));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<(), SimError> {
        let mut state = self.state.borrow_mut();
        if !state.status.is_connected() {
            return Err(SimError);
        }
        if state.refuse_subscribe.as_deref() == Some(topic) {
            state.refuse_subscribe = None;
            return Err(SimError);
        }
        state.subscribes.push((topic.to_string(), qos));
        Ok(())
    }

    fn unsubscribe(&mut self, topic: &str) -> Result<(), SimError> {
        let mut state = self.state.borrow_mut();
        if !state.status.is_connected() {
            return Err(SimError);
        }
        state.unsubscribes.push(topic.to_string());
        Ok(())
    }

    fn dispatch(&mut self, handler: &mut dyn FnMut(&str, &[u8])) {
        let inbox = core::mem::take(&mut self.state.borrow_mut().inbox);
        for (topic, payload) in inbox {
            handler(&topic, &payload);
        }
    }
}
