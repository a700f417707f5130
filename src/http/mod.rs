//! HTTP server module.
//!
//! An axum-based REST API over the service layer and repository pattern:
//! handlers parse and validate requests, the service layer does the work,
//! the repository persists it. Middleware covers CORS, compression and
//! request tracing.

#[cfg(feature = "http-server")]
pub mod dto;

#[cfg(feature = "http-server")]
pub mod error;

#[cfg(feature = "http-server")]
pub mod handlers;

#[cfg(feature = "http-server")]
pub mod router;

#[cfg(feature = "http-server")]
pub mod state;

#[cfg(feature = "http-server")]
pub use router::create_router;

#[cfg(feature = "http-server")]
pub use state::AppState;
