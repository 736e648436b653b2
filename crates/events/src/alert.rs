//! Transient notifications ("toasts").

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use campusgate_core::AlertId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Success,
    Error,
    Warning,
    Info,
}

impl AlertKind {
    /// How long a convenience alert of this kind stays visible.
    pub fn default_duration(&self) -> Duration {
        match self {
            AlertKind::Success => Duration::from_millis(3000),
            AlertKind::Error => Duration::from_millis(4000),
            AlertKind::Warning => Duration::from_millis(3500),
            AlertKind::Info => Duration::from_millis(3000),
        }
    }

    pub fn default_title(&self) -> &'static str {
        match self {
            AlertKind::Success => "Success",
            AlertKind::Error => "Error",
            AlertKind::Warning => "Warning",
            AlertKind::Info => "Information",
        }
    }

    /// Material icon name used by renderers.
    pub fn icon(&self) -> &'static str {
        match self {
            AlertKind::Success => "check_circle",
            AlertKind::Error => "error",
            AlertKind::Warning => "warning",
            AlertKind::Info => "info",
        }
    }
}

/// A transient notification.
///
/// `duration: None` (or zero) means the alert stays until dismissed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub id: AlertId,
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    #[serde(rename = "duration_ms", serialize_with = "ser_duration_ms")]
    pub duration: Option<Duration>,
    pub published_at: DateTime<Utc>,
}

impl Alert {
    /// Alert with the kind's default title and duration.
    pub fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            id: AlertId::new(),
            kind,
            title: kind.default_title().to_string(),
            message: message.into(),
            duration: Some(kind.default_duration()),
            published_at: Utc::now(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Keep the alert until it is dismissed.
    pub fn sticky(mut self) -> Self {
        self.duration = None;
        self
    }

    /// Effective auto-expiry, if any.
    pub fn expires_after(&self) -> Option<Duration> {
        self.duration.filter(|d| !d.is_zero())
    }
}

fn ser_duration_ms<S: serde::Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match d {
        Some(d) => s.serialize_some(&(d.as_millis() as u64)),
        None => s.serialize_none(),
    }
}
