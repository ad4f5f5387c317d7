//! Webhook-facing layer: event types, the HTTP endpoint, and the shared
//! application state it dispatches with.

pub mod events;
pub mod webhook;

use crate::clients::MessagingClient;
use crate::core::dialog::DialogOrchestrator;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub dialog: Arc<DialogOrchestrator>,
    pub messaging: Arc<dyn MessagingClient>,
    pub channel_secret: String,
}
