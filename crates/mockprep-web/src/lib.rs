//! HTTP API for mockprep.
//!
//! A thin JSON layer over [`mockprep_core::Engine`]: every handler maps one
//! request onto one engine call and serializes the result.

mod api;
mod error;
mod server;

pub use api::AppState;
pub use error::ApiError;
pub use server::{build_router, serve, start_server};
