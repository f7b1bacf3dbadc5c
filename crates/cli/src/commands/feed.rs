//! Feed editing commands

use anyhow::{bail, Context, Result};
use colored::Colorize;
use gyoka_client::{CancellationToken, Client, FeedUri, Post, PostUri};
use tabled::{Table, Tabled};

use crate::output::{
    format_timestamp, print_info, print_json, print_success, print_warning, truncate_uri,
    OutputFormat,
};

const URI_COLUMN_WIDTH: usize = 60;

/// Row for post tables
#[derive(Tabled)]
struct PostRow {
    #[tabled(rename = "URI")]
    uri: String,
    #[tabled(rename = "CID")]
    cid: String,
    #[tabled(rename = "Indexed At")]
    indexed_at: String,
}

impl From<&Post> for PostRow {
    fn from(post: &Post) -> Self {
        Self {
            uri: truncate_uri(post.uri.as_str(), URI_COLUMN_WIDTH),
            cid: post.cid.clone(),
            indexed_at: format_timestamp(&post.indexed_at),
        }
    }
}

/// Parse a `--post` argument of the form `<uri>=<cid>`
pub fn parse_post_arg(s: &str) -> Result<(String, String), String> {
    let (uri, cid) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("invalid post `{}`: expected <uri>=<cid>", s))?;
    if uri.is_empty() || cid.is_empty() {
        return Err(format!("invalid post `{}`: uri and cid must be non-empty", s));
    }
    let post_uri = PostUri::new(uri);
    post_uri
        .validate()
        .map_err(|e| format!("invalid post uri `{}`: {}", uri, e))?;
    Ok((uri.to_string(), cid.to_string()))
}

fn parse_feed(feed: &str) -> Result<FeedUri> {
    let feed = FeedUri::new(feed);
    feed.validate()
        .with_context(|| format!("Invalid feed URI: {}", feed))?;
    Ok(feed)
}

fn build_posts(feed: &FeedUri, posts: Vec<(String, String)>, indexed_at: &str) -> Vec<Post> {
    posts
        .into_iter()
        .map(|(uri, cid)| {
            Post::new(uri, cid)
                .with_feed(feed.clone())
                .with_indexed_at(indexed_at)
        })
        .collect()
}

fn print_posts(title: &str, posts: &[Post]) {
    println!("{} ({})", title.bold(), posts.len());
    let rows: Vec<PostRow> = posts.iter().map(PostRow::from).collect();
    println!("{}", Table::new(rows));
}

/// Check that the server is reachable
pub async fn ping(client: &Client, cancel: &CancellationToken, format: OutputFormat) -> Result<()> {
    client
        .ping(cancel)
        .await
        .with_context(|| format!("Ping to {} failed", client.base_url()))?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "baseUrl": client.base_url(),
            "ok": true,
        }))?,
        OutputFormat::Table => print_success(&format!("{} is reachable", client.base_url())),
    }

    Ok(())
}

/// List posts in a feed
pub async fn list_posts(
    client: &Client,
    feed: &str,
    limit: Option<i64>,
    cancel: &CancellationToken,
    format: OutputFormat,
) -> Result<()> {
    let feed = parse_feed(feed)?;
    let result = client
        .list_post(&feed, limit.unwrap_or(0), cancel)
        .await
        .context("Failed to list posts")?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if result.posts.is_empty() {
                print_info(&format!("No posts in {}", feed));
                return Ok(());
            }
            println!("Feed: {}", result.feed.cyan());
            print_posts("Posts", &result.posts);
            println!("Total: {}", result.count);
        }
    }

    Ok(())
}

/// Trim a feed to `count` posts
pub async fn trim(
    client: &Client,
    feed: &str,
    count: i64,
    cancel: &CancellationToken,
    format: OutputFormat,
) -> Result<()> {
    if count < 0 {
        bail!("Count must be zero or positive, got {}", count);
    }
    let feed = parse_feed(feed)?;
    let result = client
        .trim_with_count(&feed, count, cancel)
        .await
        .context("Failed to trim feed")?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            print_success(&format!(
                "Trimmed {} to {} posts ({} deleted)",
                feed, count, result.deleted_count
            ));
            if !result.message.is_empty() {
                println!("{}", result.message.dimmed());
            }
        }
    }

    Ok(())
}

/// Add posts to a feed
pub async fn add_posts(
    client: &Client,
    feed: &str,
    posts: Vec<(String, String)>,
    indexed_at: Option<String>,
    cancel: &CancellationToken,
    format: OutputFormat,
) -> Result<()> {
    let feed = parse_feed(feed)?;
    let indexed_at = indexed_at.unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
    let posts = build_posts(&feed, posts, &indexed_at);

    let result = client
        .add(&posts, cancel)
        .await
        .context("Failed to add posts")?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            print_success(&format!(
                "Added {} post(s) to {}",
                result.inserted_posts.len(),
                feed
            ));
            if !result.failed_posts.is_empty() {
                print_warning(&format!("{} post(s) failed", result.failed_posts.len()));
                print_posts("Failed", &result.failed_posts);
            }
        }
    }

    Ok(())
}

/// Delete posts from a feed
pub async fn delete_posts(
    client: &Client,
    feed: &str,
    posts: Vec<(String, String)>,
    cancel: &CancellationToken,
    format: OutputFormat,
) -> Result<()> {
    let feed = parse_feed(feed)?;
    let posts = build_posts(&feed, posts, "");

    let result = client
        .delete(&posts, cancel)
        .await
        .context("Failed to delete posts")?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            print_success(&format!(
                "Deleted {} post(s) from {}",
                result.deleted_posts.len(),
                feed
            ));
            if !result.failed_posts.is_empty() {
                print_warning(&format!("{} post(s) failed", result.failed_posts.len()));
                print_posts("Failed", &result.failed_posts);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = "at://did:plc:abc123/app.bsky.feed.generator/news";
    const POST: &str = "at://did:plc:abc123/app.bsky.feed.post/3kxyz";

    #[test]
    fn test_parse_post_arg() {
        let (uri, cid) = parse_post_arg(&format!("{}=bafyreicid", POST)).unwrap();
        assert_eq!(uri, POST);
        assert_eq!(cid, "bafyreicid");
    }

    #[test]
    fn test_parse_post_arg_rejects_bad_input() {
        assert!(parse_post_arg(POST).is_err());
        assert!(parse_post_arg(&format!("{}=", POST)).is_err());
        assert!(parse_post_arg("=bafy").is_err());
        assert!(parse_post_arg("at://did:plc:abc123/app.bsky.feed.like/1=bafy").is_err());
    }

    #[test]
    fn test_parse_feed() {
        assert!(parse_feed(FEED).is_ok());
        assert!(parse_feed("https://example.com").is_err());
    }

    #[test]
    fn test_build_posts_stamps_feed_and_time() {
        let feed = parse_feed(FEED).unwrap();
        let posts = build_posts(
            &feed,
            vec![(POST.to_string(), "cid1".to_string())],
            "2024-01-01T00:00:00Z",
        );
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].feed.as_ref(), Some(&feed));
        assert_eq!(posts[0].uri.as_str(), POST);
        assert_eq!(posts[0].indexed_at, "2024-01-01T00:00:00Z");
    }
}
