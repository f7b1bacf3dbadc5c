//! Wire types for the feed API

use serde::{Deserialize, Serialize};

use crate::uri::{FeedUri, PostUri};

/// Upper bound on posts in a single add or delete request
pub const MAX_POSTS_PER_REQUEST: usize = 40;

/// A post reference held by a feed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed: Option<FeedUri>,
    pub uri: PostUri,
    #[serde(default)]
    pub cid: String,
    #[serde(default)]
    pub indexed_at: String,
}

impl Post {
    pub fn new(uri: impl Into<PostUri>, cid: impl Into<String>) -> Self {
        Self {
            feed: None,
            uri: uri.into(),
            cid: cid.into(),
            indexed_at: String::new(),
        }
    }

    pub fn with_feed(mut self, feed: impl Into<FeedUri>) -> Self {
        self.feed = Some(feed.into());
        self
    }

    pub fn with_indexed_at(mut self, indexed_at: impl Into<String>) -> Self {
        self.indexed_at = indexed_at.into();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatePostResponse {
    pub inserted_posts: Vec<Post>,
    pub failed_posts: Vec<Post>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePostRequest {
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeletePostResponse {
    pub deleted_posts: Vec<Post>,
    pub failed_posts: Vec<Post>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListPostResponse {
    pub feed: String,
    pub count: i64,
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrimResponse {
    pub message: String,
    pub deleted_count: i64,
}

/// Error payload returned by the API on non-200 responses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
