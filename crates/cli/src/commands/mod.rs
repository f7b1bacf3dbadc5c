//! CLI command implementations

pub mod feed;
