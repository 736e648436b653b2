//! Application-wide notification and confirmation channel.

use std::sync::Arc;
use std::time::Duration;

use campusgate_core::AlertId;

use crate::alert::{Alert, AlertKind};
use crate::bus::{EventBus, Subscription};
use crate::confirm::{ConfirmPrompt, ConfirmRequest, Confirmation};
use crate::in_memory_bus::InMemoryEventBus;

/// Pub/sub channel between pages and the alert/confirm renderers.
///
/// Cheap to clone; clones share subscribers. The bus holds no UI state.
#[derive(Debug, Clone, Default)]
pub struct NotificationBus {
    alerts: Arc<InMemoryEventBus<Alert>>,
    confirmations: Arc<InMemoryEventBus<ConfirmPrompt>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an alert to every alert renderer. Fire-and-forget.
    pub fn notify(&self, alert: Alert) -> AlertId {
        let id = alert.id;
        tracing::debug!(alert_id = %id, kind = ?alert.kind, title = %alert.title, "publishing alert");

        match self.alerts.publish(alert) {
            Ok(0) => tracing::debug!(alert_id = %id, "no alert renderer subscribed"),
            Ok(_) => {}
            Err(err) => tracing::error!(alert_id = %id, error = %err, "failed to publish alert"),
        }
        id
    }

    /// Ask the user a yes/no question.
    ///
    /// The returned future completes exactly once: `true` on confirm, `false`
    /// on cancel, dismissal, or when no renderer is listening.
    pub fn confirm(&self, request: ConfirmRequest) -> Confirmation {
        let (prompt, confirmation) = ConfirmPrompt::new(request);
        let id = prompt.id;

        match self.confirmations.publish(prompt) {
            Ok(0) => tracing::warn!(
                confirmation_id = %id,
                "no confirmation renderer subscribed; prompt resolves to cancel"
            ),
            Ok(_) => {}
            Err(err) => tracing::error!(confirmation_id = %id, error = %err, "failed to publish confirmation"),
        }
        confirmation
    }

    pub fn success(
        &self,
        message: impl Into<String>,
        title: Option<&str>,
        duration: Option<Duration>,
    ) -> AlertId {
        self.notify(build(AlertKind::Success, message, title, duration))
    }

    pub fn error(
        &self,
        message: impl Into<String>,
        title: Option<&str>,
        duration: Option<Duration>,
    ) -> AlertId {
        self.notify(build(AlertKind::Error, message, title, duration))
    }

    pub fn warning(
        &self,
        message: impl Into<String>,
        title: Option<&str>,
        duration: Option<Duration>,
    ) -> AlertId {
        self.notify(build(AlertKind::Warning, message, title, duration))
    }

    pub fn info(
        &self,
        message: impl Into<String>,
        title: Option<&str>,
        duration: Option<Duration>,
    ) -> AlertId {
        self.notify(build(AlertKind::Info, message, title, duration))
    }

    pub fn subscribe_alerts(&self) -> Subscription<Alert> {
        self.alerts.subscribe()
    }

    pub fn subscribe_confirmations(&self) -> Subscription<ConfirmPrompt> {
        self.confirmations.subscribe()
    }
}

fn build(
    kind: AlertKind,
    message: impl Into<String>,
    title: Option<&str>,
    duration: Option<Duration>,
) -> Alert {
    let mut alert = Alert::new(kind, message);
    if let Some(title) = title {
        alert = alert.with_title(title);
    }
    if let Some(duration) = duration {
        alert = alert.with_duration(duration);
    }
    alert
}
