//! # turbined
//!
//! Message queue for the cloud: named pipelines accept datapoints over a
//! REST API, aggregate daily intake statistics, and hand datapoints out to
//! consumer groups.
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: wire-level types shared by server, client and storage
//! - [`client`]: typed resource client for the pipeline REST API
//! - [`routes`]: view-facing data types and the three UI flows
//!   (list, detail, creation) with the chart shaping they share
//! - [`db`]: repository pattern, storage backends and the service layer
//! - [`services`]: datapoint writer pool and the live stream hub
//! - [`http`]: axum-based HTTP server (feature `http-server`)
//!
//! ## Storage backends
//!
//! The in-memory backend (feature `local-repo`, default) serves tests and
//! local development; the Postgres backend (feature `postgres-repo`)
//! persists through Diesel with pooling and embedded migrations.

pub mod api;
pub mod client;
pub mod db;
pub mod routes;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
