//! Pipeline Systems
//!
//! The stages an ingested content passes through. Each stage works on the
//! environment's state directly.

pub mod estimation;
pub mod ingest;
pub mod propagation;
