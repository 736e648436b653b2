//! Confirmation prompts with a one-shot answer.
//!
//! A prompt travels over the bus together with its [`Responder`]; the caller
//! keeps the matching [`Confirmation`] future. Whoever renders the prompt
//! answers it once. Clones of a prompt share the responder, so only the first
//! answer counts.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use campusgate_core::ConfirmationId;

/// Visual weight of a confirmation prompt.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Danger,
    Warning,
    #[default]
    Primary,
}

impl Severity {
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Primary => "help",
            Severity::Danger => "warning",
            Severity::Warning => "info",
        }
    }
}

/// What the caller asks the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmRequest {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
    pub severity: Severity,
}

impl ConfirmRequest {
    pub const DEFAULT_CONFIRM_LABEL: &'static str = "Accept";
    pub const DEFAULT_CANCEL_LABEL: &'static str = "Cancel";

    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_label: Self::DEFAULT_CONFIRM_LABEL.to_string(),
            cancel_label: Self::DEFAULT_CANCEL_LABEL.to_string(),
            severity: Severity::default(),
        }
    }

    pub fn with_labels(mut self, confirm: impl Into<String>, cancel: impl Into<String>) -> Self {
        self.confirm_label = confirm.into();
        self.cancel_label = cancel.into();
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// Sending half of a confirmation. Resolves at most once across all clones.
#[derive(Clone)]
pub struct Responder {
    tx: Arc<Mutex<Option<oneshot::Sender<bool>>>>,
}

impl Responder {
    pub(crate) fn pair(id: ConfirmationId) -> (Responder, Confirmation) {
        let (tx, rx) = oneshot::channel();
        let responder = Responder {
            tx: Arc::new(Mutex::new(Some(tx))),
        };
        (responder, Confirmation { id, rx })
    }

    /// Deliver the answer. Returns `false` if it was already answered.
    pub fn resolve(&self, confirmed: bool) -> bool {
        let sender = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match sender {
            // The waiting side may have been dropped; the prompt still counts
            // as answered.
            Some(tx) => {
                let _ = tx.send(confirmed);
                true
            }
            None => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl core::fmt::Debug for Responder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Responder")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// A confirmation request as delivered to renderers.
#[derive(Debug, Clone)]
pub struct ConfirmPrompt {
    pub id: ConfirmationId,
    pub request: ConfirmRequest,
    responder: Responder,
}

impl ConfirmPrompt {
    /// New prompt plus the future its caller awaits.
    pub fn new(request: ConfirmRequest) -> (ConfirmPrompt, Confirmation) {
        let id = ConfirmationId::new();
        let (responder, confirmation) = Responder::pair(id);
        (
            ConfirmPrompt {
                id,
                request,
                responder,
            },
            confirmation,
        )
    }

    pub fn confirm(&self) -> bool {
        self.responder.resolve(true)
    }

    pub fn cancel(&self) -> bool {
        self.responder.resolve(false)
    }

    pub fn is_resolved(&self) -> bool {
        self.responder.is_resolved()
    }
}

/// Awaitable answer to a confirmation prompt.
///
/// Yields `true` when confirmed, `false` when cancelled or when every copy
/// of the prompt is dropped unanswered (e.g. no renderer is subscribed).
#[derive(Debug)]
#[must_use = "a confirmation does nothing unless awaited"]
pub struct Confirmation {
    id: ConfirmationId,
    rx: oneshot::Receiver<bool>,
}

impl Confirmation {
    pub fn id(&self) -> ConfirmationId {
        self.id
    }
}

impl Future for Confirmation {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(confirmed)) => Poll::Ready(confirmed),
            Poll::Ready(Err(_)) => Poll::Ready(false),
            Poll::Pending => Poll::Pending,
        }
    }
}
