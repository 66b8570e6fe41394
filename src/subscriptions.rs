use heapless::{String, Vec};

use crate::config::TOPIC_MAX;
use crate::error::SubscriptionError;
use crate::profile::QoS;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionSlot {
    topic: String<TOPIC_MAX>,
    qos: QoS,
    active: bool,
}

impl SubscriptionSlot {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn qos(&self) -> QoS {
        self.qos
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Desired topic subscriptions, kept across reconnects.
///
/// Slots never move: removing a topic only deactivates its slot, and a later
/// `add` fills the first inactive slot before growing. Replay order is slot
/// order.
#[derive(Clone, Debug, Default)]
pub struct SubscriptionSet<const N: usize> {
    slots: Vec<SubscriptionSlot, N>,
}

impl<const N: usize> SubscriptionSet<N> {
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn active_count(&self) -> usize {
        self.iter_active().count()
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.position(topic).is_some()
    }

    /// Returns the slot index the topic landed in.
    pub fn add(&mut self, topic: &str, qos: QoS) -> Result<usize, SubscriptionError> {
        if topic.is_empty() {
            return Err(SubscriptionError::EmptyTopic);
        }
        if self.contains(topic) {
            return Err(SubscriptionError::Duplicate);
        }
        let mut stored = String::new();
        stored
            .push_str(topic)
            .map_err(|_| SubscriptionError::TopicTooLong)?;
        let slot = SubscriptionSlot {
            topic: stored,
            qos,
            active: true,
        };

        if let Some(index) = self.slots.iter().position(|slot| !slot.active) {
            self.slots[index] = slot;
            return Ok(index);
        }
        self.slots
            .push(slot)
            .map_err(|_| SubscriptionError::CapacityExceeded)?;
        Ok(self.slots.len() - 1)
    }

    pub fn remove(&mut self, topic: &str) -> Result<usize, SubscriptionError> {
        let index = self.position(topic).ok_or(SubscriptionError::NotFound)?;
        self.slots[index].active = false;
        Ok(index)
    }

    pub fn get(&self, index: usize) -> Option<&SubscriptionSlot> {
        self.slots.get(index)
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &SubscriptionSlot> {
        self.slots.iter().filter(|slot| slot.active)
    }

    pub fn for_each_active(&self, mut visitor: impl FnMut(usize, &SubscriptionSlot)) {
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.active {
                visitor(index, slot);
            }
        }
    }

    fn position(&self, topic: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.active && slot.topic.as_str() == topic)
    }
}
