//! Per-platform release builds

pub mod builder;

