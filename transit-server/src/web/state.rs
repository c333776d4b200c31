//! Application state for the web layer.

use std::sync::{Arc, Mutex};

use crate::config::ServerConfig;
use crate::store::TransitStore;

/// Shared application state.
///
/// The store sits behind one mutex: every import, edit and query takes the
/// lock for its whole duration.
#[derive(Clone)]
pub struct AppState {
    /// The transit data
    pub store: Arc<Mutex<TransitStore>>,

    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(store: TransitStore, config: ServerConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            config: Arc::new(config),
        }
    }
}
