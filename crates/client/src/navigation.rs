//! Navigation seam between session logic and whatever router hosts it.

use std::sync::{Arc, Mutex, PoisonError};

use campusgate_auth::Route;

/// Something that can move the user to a route.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &Route);
}

impl<F> Navigator for F
where
    F: Fn(&Route) + Send + Sync,
{
    fn navigate(&self, route: &Route) {
        self(route)
    }
}

/// Navigator that only remembers where it was sent.
///
/// Clones share the same history. Useful for headless clients and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    history: Arc<Mutex<Vec<Route>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<Route> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<Route> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &Route) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.clone());
    }
}
