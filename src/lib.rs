//! Sales desk records engine.
//!
//! Owns the sales record collection and the admin settings, compiles the
//! record form's validation rules from the live field configuration, keeps
//! the sale amount in step with its inputs, and persists both stores as JSON
//! blobs with a CSV export on the side.

pub mod auth;
pub mod commands;
pub mod error;
pub mod export;
pub mod fields;
pub mod persistence;
pub mod records;
pub mod schema;
pub mod session;
pub mod settings;
pub mod state;
pub mod types;
pub mod util;
pub mod view;

/// Initialise `env_logger` with an `info` default, overridable via `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).try_init();
}
