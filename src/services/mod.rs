//! Background services.
//!
//! - [`ingest`]: the datapoint writer pool draining the ingest channel
//!   into the repository
//! - [`stream`]: per-pipeline broadcast hub feeding the live datapoint
//!   stream

pub mod ingest;
pub mod stream;

pub use ingest::{Datapoint, DatapointWriter, WriterPool};
pub use stream::StreamHub;
