//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::web::session::SessionCodec;
use book_catalog_core::ports::{DatabaseService, IdentityProvider};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub identity: Arc<dyn IdentityProvider>,
    pub sessions: Arc<SessionCodec>,
}
