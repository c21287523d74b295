//! Local stand-in for the effect backend.
//!
//! Serves the params and control routes over HTTP so the bridge can be
//! driven end to end without the real host process.

pub mod backend;

pub use backend::{BackendRoutes, BackendState, MockBackend};
