//! Range use plan lifecycle and versioning core.
//!
//! The status state machine, the append-only snapshot store, legal window and privacy
//! view derivation, the amendment confirmation protocol, and the access gate they all
//! consult. `server` exposes them over HTTP.

pub mod app_context;
pub mod auth;
pub mod common;
pub mod database;
pub mod errors;
pub mod plan_status;
pub mod services;

#[cfg(feature = "server")]
pub mod server;
