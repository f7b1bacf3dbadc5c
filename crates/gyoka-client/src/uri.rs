//! AT URI identifiers for feeds and posts
//!
//! Both identifier kinds share one grammar:
//! `at://did:plc:<id>/<collection>/<record-key>`, where the collection is
//! fixed per kind. Values are accepted as-is and checked on demand with
//! `validate()`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const SCHEME: &str = "at://";
const DID_PREFIX: &str = "did:plc:";

/// Collection name of feed generator records
pub const FEED_COLLECTION: &str = "app.bsky.feed.generator";
/// Collection name of post records
pub const POST_COLLECTION: &str = "app.bsky.feed.post";

/// Reason an identifier failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UriError {
    #[error("uri is empty")]
    Empty,
    #[error("uri must start with at://")]
    MissingScheme,
    #[error("invalid uri format")]
    InvalidFormat,
    #[error("invalid did format")]
    InvalidDid,
    #[error("invalid collection: expected {expected}")]
    InvalidCollection { expected: &'static str },
    #[error("{0} is empty")]
    EmptyRecordKey(&'static str),
}

fn validate_at_uri(uri: &str, collection: &'static str, key_name: &'static str) -> Result<(), UriError> {
    if uri.is_empty() {
        return Err(UriError::Empty);
    }

    let rest = uri.strip_prefix(SCHEME).ok_or(UriError::MissingScheme)?;

    let parts: Vec<&str> = rest.split('/').collect();
    let [did, coll, rkey] = parts.as_slice() else {
        return Err(UriError::InvalidFormat);
    };

    if !did.starts_with(DID_PREFIX) {
        return Err(UriError::InvalidDid);
    }

    if *coll != collection {
        return Err(UriError::InvalidCollection {
            expected: collection,
        });
    }

    if rkey.is_empty() {
        return Err(UriError::EmptyRecordKey(key_name));
    }

    Ok(())
}

macro_rules! at_uri_type {
    ($(#[$meta:meta])* $name:ident, $collection:expr, $key_name:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(uri: impl Into<String>) -> Self {
                Self(uri.into())
            }

            /// Check the value against the AT URI grammar for this kind
            pub fn validate(&self) -> Result<(), UriError> {
                validate_at_uri(&self.0, $collection, $key_name)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

at_uri_type!(
    /// Identifier of a feed generator record
    FeedUri,
    FEED_COLLECTION,
    "feed name"
);

at_uri_type!(
    /// Identifier of a post record
    PostUri,
    POST_COLLECTION,
    "post id"
);
