//! Renderer-side state machines for alerts and confirmation prompts.
//!
//! These hold exactly what a view needs to draw and nothing else. Time is
//! passed in explicitly, so expiry is deterministic and testable; a UI layer
//! calls [`AlertTray::tick`] from its timer and redraws.
//!
//! Alert: `Published → Visible → (Expired | Dismissed)`.
//! Confirmation: `Published → Visible → (Confirmed | Cancelled)`.

use std::collections::VecDeque;
use std::time::Instant;

use campusgate_core::{AlertId, ConfirmationId};

use crate::alert::Alert;
use crate::bus::Subscription;
use crate::confirm::ConfirmPrompt;
use crate::notifier::NotificationBus;

/// How an alert left the screen.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AlertOutcome {
    Expired,
    Dismissed,
}

/// An alert currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleAlert {
    pub alert: Alert,
    pub shown_at: Instant,
    pub expires_at: Option<Instant>,
}

/// The toast stack: shows alerts in publish order, each expiring on its own.
#[derive(Debug)]
pub struct AlertTray {
    subscription: Subscription<Alert>,
    visible: Vec<VisibleAlert>,
}

impl AlertTray {
    pub fn new(bus: &NotificationBus) -> Self {
        Self {
            subscription: bus.subscribe_alerts(),
            visible: Vec::new(),
        }
    }

    /// Show newly published alerts, then remove those whose time is up.
    ///
    /// Returns the ids of the alerts that expired on this tick.
    pub fn tick(&mut self, now: Instant) -> Vec<(AlertId, AlertOutcome)> {
        for alert in self.subscription.drain() {
            let expires_at = alert.expires_after().map(|d| now + d);
            self.visible.push(VisibleAlert {
                alert,
                shown_at: now,
                expires_at,
            });
        }

        let mut expired = Vec::new();
        self.visible.retain(|entry| match entry.expires_at {
            Some(deadline) if now >= deadline => {
                expired.push((entry.alert.id, AlertOutcome::Expired));
                false
            }
            _ => true,
        });

        if !expired.is_empty() {
            tracing::trace!(count = expired.len(), "alerts expired");
        }
        expired
    }

    /// Close an alert before it expires (close button).
    pub fn dismiss(&mut self, id: AlertId) -> Option<(Alert, AlertOutcome)> {
        let idx = self.visible.iter().position(|entry| entry.alert.id == id)?;
        let entry = self.visible.remove(idx);
        Some((entry.alert, AlertOutcome::Dismissed))
    }

    pub fn visible(&self) -> &[VisibleAlert] {
        &self.visible
    }

    pub fn is_visible(&self, id: AlertId) -> bool {
        self.visible.iter().any(|entry| entry.alert.id == id)
    }

    /// When the next tick has something to remove.
    pub fn next_expiry(&self) -> Option<Instant> {
        self.visible.iter().filter_map(|entry| entry.expires_at).min()
    }
}

/// How a confirmation prompt was answered.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    Cancelled,
}

/// Modal confirmation dialog: one prompt visible at a time.
///
/// Prompts arriving while one is visible wait in arrival order; none is
/// dropped, so every caller eventually gets its own answer.
#[derive(Debug)]
pub struct ConfirmDialog {
    subscription: Subscription<ConfirmPrompt>,
    current: Option<ConfirmPrompt>,
    queue: VecDeque<ConfirmPrompt>,
}

impl ConfirmDialog {
    pub fn new(bus: &NotificationBus) -> Self {
        Self {
            subscription: bus.subscribe_confirmations(),
            current: None,
            queue: VecDeque::new(),
        }
    }

    /// Receive newly published prompts; returns the visible one.
    pub fn pump(&mut self) -> Option<&ConfirmPrompt> {
        self.queue.extend(self.subscription.drain());
        if self.current.is_none() {
            self.advance();
        }
        self.current.as_ref()
    }

    pub fn current(&self) -> Option<&ConfirmPrompt> {
        self.current.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.current.is_some()
    }

    /// Prompts waiting behind the visible one.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Confirm button.
    pub fn confirm(&mut self) -> Option<(ConfirmationId, ConfirmOutcome)> {
        self.resolve(ConfirmOutcome::Confirmed)
    }

    /// Cancel button.
    pub fn cancel(&mut self) -> Option<(ConfirmationId, ConfirmOutcome)> {
        self.resolve(ConfirmOutcome::Cancelled)
    }

    /// Click outside the dialog; same as cancel.
    pub fn dismiss(&mut self) -> Option<(ConfirmationId, ConfirmOutcome)> {
        self.cancel()
    }

    fn resolve(&mut self, outcome: ConfirmOutcome) -> Option<(ConfirmationId, ConfirmOutcome)> {
        let prompt = self.current.take()?;
        let delivered = match outcome {
            ConfirmOutcome::Confirmed => prompt.confirm(),
            ConfirmOutcome::Cancelled => prompt.cancel(),
        };
        if !delivered {
            tracing::debug!(confirmation_id = %prompt.id, "prompt was already answered elsewhere");
        }

        self.advance();
        Some((prompt.id, outcome))
    }

    fn advance(&mut self) {
        while let Some(next) = self.queue.pop_front() {
            if !next.is_resolved() {
                self.current = Some(next);
                return;
            }
        }
    }
}
