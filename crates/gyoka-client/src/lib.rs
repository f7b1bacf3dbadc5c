//! Client library for the Gyoka feed management API
//!
//! This crate provides:
//! - AT URI validation for feed and post identifiers
//! - Authentication strategies (bearer token, Cloudflare Access, basic auth)
//! - A retrying, timeout-bounded JSON request executor
//! - Typed feed operations (add, delete, list, trim, ping)

pub mod auth;
pub mod client;
pub mod error;
mod feed;
pub mod models;
pub mod uri;

pub use auth::{AuthConfig, AuthType};
pub use client::{Client, ClientBuilder, ClientOptions};
pub use error::{AttemptError, ClientError, Result};
pub use models::*;
pub use uri::{FeedUri, PostUri, UriError};

pub use tokio_util::sync::CancellationToken;
