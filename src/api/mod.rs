//! Webhook HTTP surface.
//!
//! A composable axum `Router` the (out-of-scope) staff UI server can mount.
//! The only unauthenticated entry point is the referral webhook; everything
//! staff-facing goes through `gate::AccessGate` in the host application.

pub mod endpoints;
pub mod error;
pub mod router;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

/// Shared state for the webhook router. SQLite connections are not `Sync`,
/// so the handler serializes access behind a mutex.
#[derive(Clone)]
pub struct ApiContext {
    pub db: Arc<Mutex<Connection>>,
}

impl ApiContext {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }
}
