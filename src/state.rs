//! Shared application state injected into all handlers.

use std::sync::Arc;

use crate::application::services::LinkService;

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    /// Read the client identity from forwarding headers.
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(link_service: Arc<LinkService>, behind_proxy: bool) -> Self {
        Self {
            link_service,
            behind_proxy,
        }
    }
}
