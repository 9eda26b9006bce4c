//! Cargo workspace integration
//!
//! - **metadata**: resolve the program name from the root package via cargo_metadata

pub mod metadata;
