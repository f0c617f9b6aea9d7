//! # Basecoat
//!
//! A record-keeping server for paint shop color formulas, usable both as a
//! standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use basecoat::server::{AppState, create_router};
//! use basecoat::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/basecoat.db").unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store)));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `basecoat` binary. Disable with `default-features = false`.

pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
