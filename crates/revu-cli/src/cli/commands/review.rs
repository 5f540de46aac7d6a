//! One-shot review: read code, print the review to stdout.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use revu_core::review::{FALLBACK_MESSAGE, ReviewClient};

pub async fn run(server_url: &str, file: Option<&Path>) -> Result<()> {
    let code = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => read_stdin()?,
    };

    if code.trim().is_empty() {
        anyhow::bail!("No code provided");
    }

    let client = ReviewClient::new(server_url)?;

    // Request failures print the same fallback the editor shows, and the
    // exit status stays zero so pipelines keep flowing
    match client.request_review(&code).await {
        Ok(review) => println!("{review}"),
        Err(error) => {
            tracing::warn!("review request failed: {error:#}");
            println!("{FALLBACK_MESSAGE}");
        }
    }

    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut code = String::new();
    std::io::stdin()
        .read_to_string(&mut code)
        .context("Failed to read code from stdin")?;
    Ok(code)
}
