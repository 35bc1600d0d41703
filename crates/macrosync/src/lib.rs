//! Webhook server pieces for macrosync.
//!
//! `routes::build_router` is the entry point; the binary attaches tracing
//! middleware and serves it. Exposed as a library so the router tests in
//! `tests/` can drive it in-process.

pub mod routes;
pub mod state;
pub mod sync;
