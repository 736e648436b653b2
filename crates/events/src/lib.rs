//! `campusgate-events`: in-process notification and confirmation bus.
//!
//! Pages publish alerts and confirmation prompts; one renderer of each kind
//! subscribes and displays them. Nothing here touches a UI toolkit.

pub mod alert;
pub mod bus;
pub mod confirm;
pub mod in_memory_bus;
pub mod notifier;
pub mod renderer;

pub use alert::{Alert, AlertKind};
pub use bus::{EventBus, Subscription};
pub use confirm::{ConfirmPrompt, ConfirmRequest, Confirmation, Responder, Severity};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use notifier::NotificationBus;
pub use renderer::{AlertOutcome, AlertTray, ConfirmDialog, ConfirmOutcome, VisibleAlert};
