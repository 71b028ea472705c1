//! Application state.

use msgboard_cable::CableHub;
use msgboard_core::MessageService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub messages: MessageService,
    /// Local fan-out feeding `/cable` subscribers.
    pub hub: CableHub,
    /// Whether `/internal/broadcast` accepts relayed broadcasts. Off unless
    /// the server is bound to a loopback address.
    pub internal_relay: bool,
}

impl AppState {
    pub fn new(messages: MessageService, hub: CableHub) -> Self {
        Self {
            messages,
            hub,
            internal_relay: false,
        }
    }

    pub fn with_internal_relay(mut self, enabled: bool) -> Self {
        self.internal_relay = enabled;
        self
    }
}
