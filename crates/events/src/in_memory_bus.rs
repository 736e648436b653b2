//! In-process pub/sub bus.

use std::sync::{Mutex, PoisonError, mpsc};

use thiserror::Error;

use crate::bus::{EventBus, Subscription};

#[derive(Debug, Error)]
pub enum InMemoryBusError {
    /// A previous publish panicked mid fan-out.
    #[error("bus subscriber list is poisoned")]
    Poisoned,
}

/// Channel-per-subscriber bus.
///
/// The last live subscriber receives the message itself; every other one
/// gets a clone. Closed channels are pruned while publishing.
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    senders: Mutex<Vec<mpsc::Sender<M>>>,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<usize, Self::Error> {
        let mut senders = self.senders.lock().map_err(|_| InMemoryBusError::Poisoned)?;

        let mut live = Vec::with_capacity(senders.len());
        let mut remaining = senders.len();
        let mut message = Some(message);

        for tx in senders.drain(..) {
            remaining -= 1;
            let copy = if remaining == 0 {
                message.take()
            } else {
                message.clone()
            };

            if let Some(copy) = copy {
                if tx.send(copy).is_ok() {
                    live.push(tx);
                }
            }
        }

        *senders = live;
        Ok(senders.len())
    }

    fn subscribe(&self) -> Subscription<M> {
        let (tx, rx) = mpsc::channel();
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        Subscription::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_gets_every_message_in_order() {
        let bus: InMemoryEventBus<i32> = InMemoryEventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        assert_eq!(bus.publish(1).unwrap(), 2);
        assert_eq!(bus.publish(2).unwrap(), 2);

        assert_eq!(a.drain(), vec![1, 2]);
        assert_eq!(b.drain(), vec![1, 2]);
        assert!(a.drain().is_empty());
    }

    #[test]
    fn late_subscribers_miss_earlier_messages() {
        let bus: InMemoryEventBus<&str> = InMemoryEventBus::new();
        bus.publish("early").unwrap();

        let sub = bus.subscribe();
        bus.publish("late").unwrap();

        assert_eq!(sub.drain(), vec!["late"]);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let bus: InMemoryEventBus<()> = InMemoryEventBus::new();
        let keep = bus.subscribe();
        drop(bus.subscribe());

        assert_eq!(bus.publish(()).unwrap(), 1);
        assert_eq!(keep.drain().len(), 1);

        drop(keep);
        assert_eq!(bus.publish(()).unwrap(), 0);
    }

    #[test]
    fn publishing_without_subscribers_reaches_nobody() {
        let bus: InMemoryEventBus<u8> = InMemoryEventBus::new();
        assert_eq!(bus.publish(7).unwrap(), 0);
    }
}
