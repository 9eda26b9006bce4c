//! Core building blocks shared by every pipeline stage
//!
//! - **config**: fanout.toml parsing and validation
//! - **context**: workspace root, config and program name, built once in main.rs
//! - **error**: error families with exit codes and help messages
//! - **exec**: subprocess seam (`CommandRunner`) for cargo, apt-get and gh
//! - **vcs**: git access for trigger refs, release notes and hooks

pub mod config;
pub mod context;
pub mod error;
pub mod exec;
pub mod vcs;
