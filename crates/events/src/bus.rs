//! Publish/subscribe abstraction (mechanics only).
//!
//! The bus decouples producers of UI events (alerts, confirmation prompts)
//! from the single renderer that displays each kind. It holds no UI and no
//! state beyond its subscriber list.
//!
//! ## Delivery
//!
//! - **Broadcast**: each live subscription receives a copy of every message
//!   published after it subscribed.
//! - **Publish order**: a subscription receives messages in the order they
//!   were published.
//! - **Fire-and-forget**: publishing to a bus with no subscribers drops the
//!   message; the publisher learns how many subscriptions received it.

use std::sync::mpsc::Receiver;

/// A subscription to a message stream.
///
/// Renderers drain it once per UI tick. Dropping the subscription
/// unsubscribes it (the bus prunes it on the next publish).
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Everything published since the last drain, in publish order.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Transport-agnostic pub/sub bus.
///
/// `Send + Sync` so a bus handle can be shared with background tasks that
/// publish results.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + core::fmt::Display + Send + Sync + 'static;

    /// Deliver `message` to every live subscription.
    ///
    /// Returns how many subscriptions received it.
    fn publish(&self, message: M) -> Result<usize, Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}
