//! Basic example demonstrating the shortcuts and a hand-built call.
//!
//! This example shows how to:
//! - Fetch JSON with the `get_json` shortcut
//! - Build a `CallConfig` with a custom accepted status set and extra mutators
//! - Bound the whole call with a context deadline
//!
//! Run with: `cargo run --example fetch`

use fetchline::{execute, mutator, shortcuts, CallConfig, Context, Error, JsonDecoder};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("fetchline=debug,fetch=info")
        .init();

    let ctx = Context::with_timeout(Duration::from_secs(30));

    println!("=== GET Request Example ===");
    let post: Post =
        shortcuts::get_json(&ctx, "https://jsonplaceholder.typicode.com/posts/1").await?;
    println!("Post ID: {}", post.id);
    println!("Title: {}", post.title);
    println!();

    println!("=== POST Request Example ===");
    let new_post = NewPost {
        title: "My New Post".to_string(),
        body: "This is the content of my new post!".to_string(),
        user_id: 1,
    };
    let body = serde_json::to_vec(&new_post).map_err(|e| Error::Serialization(e.to_string()))?;

    // The API answers 201, which the default accepted set does not include
    let config = CallConfig::new(
        "https://jsonplaceholder.typicode.com/posts",
        JsonDecoder::<Post>::accepting([StatusCode::OK, StatusCode::CREATED]),
    )
    .with_attempts(2)
    .with_body(body)
    .with_mutator(mutator::content_type("application/json"))
    .with_mutator(mutator::timeout(Duration::from_secs(10)));

    let created = execute(&config, &ctx).await?;
    println!("Created post ID: {}", created.id);
    println!("Title: {}", created.title);

    Ok(())
}
