//! Web layer for the transit store.
//!
//! Provides a JSON API for importing and exporting feed files, looking up
//! and editing records, and running stop and route searches.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
