//! Feed operations built on the request executor

use reqwest::{Method, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::models::{
    CreatePostRequest, CreatePostResponse, DeletePostRequest, DeletePostResponse,
    ListPostResponse, Post, TrimResponse, MAX_POSTS_PER_REQUEST,
};
use crate::uri::FeedUri;

fn check_batch(posts: &[Post]) -> Result<()> {
    if posts.len() > MAX_POSTS_PER_REQUEST {
        return Err(ClientError::TooManyPosts(posts.len()));
    }
    Ok(())
}

impl Client {
    /// Add posts to their feeds.
    ///
    /// An empty slice returns an empty response without touching the network.
    /// More than [`MAX_POSTS_PER_REQUEST`] posts is rejected up front.
    pub async fn add(&self, posts: &[Post], cancel: &CancellationToken) -> Result<CreatePostResponse> {
        if posts.is_empty() {
            return Ok(CreatePostResponse::default());
        }
        check_batch(posts)?;

        let request = CreatePostRequest {
            posts: posts.to_vec(),
        };
        let url = self.endpoint("/feed/add", &[])?;
        self.execute(Method::POST, url, Some(&request), cancel).await
    }

    /// Delete posts from their feeds. Same batch rules as [`Client::add`].
    pub async fn delete(
        &self,
        posts: &[Post],
        cancel: &CancellationToken,
    ) -> Result<DeletePostResponse> {
        if posts.is_empty() {
            return Ok(DeletePostResponse::default());
        }
        check_batch(posts)?;

        let request = DeletePostRequest {
            posts: posts.to_vec(),
        };
        let url = self.endpoint("/feed/delete", &[])?;
        self.execute(Method::POST, url, Some(&request), cancel).await
    }

    /// List posts in a feed. `limit` is sent only when positive.
    pub async fn list_post(
        &self,
        feed: &FeedUri,
        limit: i64,
        cancel: &CancellationToken,
    ) -> Result<ListPostResponse> {
        feed.validate().map_err(ClientError::InvalidFeedUri)?;

        let mut query = vec![("feed", feed.to_string())];
        if limit > 0 {
            query.push(("limit", limit.to_string()));
        }
        let url = self.endpoint("/feed/list", &query)?;
        self.execute::<(), _>(Method::GET, url, None, cancel).await
    }

    /// Trim a feed down to at most `count` posts
    pub async fn trim_with_count(
        &self,
        feed: &FeedUri,
        count: i64,
        cancel: &CancellationToken,
    ) -> Result<TrimResponse> {
        if count < 0 {
            return Err(ClientError::InvalidCount(count));
        }
        feed.validate().map_err(ClientError::InvalidFeedUri)?;

        let query = [("feed", feed.to_string()), ("within-count", count.to_string())];
        let url = self.endpoint("/feed/trim", &query)?;
        self.execute::<(), _>(Method::GET, url, None, cancel).await
    }

    /// Check that the server answers `GET /` with 200
    pub async fn ping(&self, cancel: &CancellationToken) -> Result<()> {
        let (status, body) = match self.get_root(cancel).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Failed to ping server");
                return Err(e);
            }
        };

        if status != StatusCode::OK {
            let err = ClientError::UnexpectedStatus {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            };
            error!(%status, error = %err, "Ping returned unexpected status");
            return Err(err);
        }

        Ok(())
    }
}
