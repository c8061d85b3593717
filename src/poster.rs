use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::constants::constants;

/// Load state of one entry's poster.
#[derive(Debug, Clone)]
pub enum PosterState {
  Loading,
  Ready(DynamicImage),
  Failed,
}

/// A finished fetch, keyed by entry id.
#[derive(Debug)]
pub struct PosterResult {
  pub id: u32,
  pub image: Result<DynamicImage>,
}

/// Shared HTTP client with a request timeout.
pub fn http_client() -> Result<Client> {
  Client::builder()
    .timeout(Duration::from_secs(constants().poster_timeout_secs))
    .user_agent(concat!("animegrid/", env!("CARGO_PKG_VERSION")))
    .build()
    .context("Failed to build HTTP client")
}

pub fn decode_poster(bytes: &[u8]) -> Result<DynamicImage> {
  image::load_from_memory(bytes).context("Failed to decode poster image")
}

pub async fn fetch_poster(client: &Client, url: &str) -> Result<DynamicImage> {
  if url.trim().is_empty() {
    return Err(anyhow!("Entry has no image URL"));
  }
  let response = client
    .get(url)
    .send()
    .await
    .with_context(|| format!("Failed to request poster {}", url))?
    .error_for_status()
    .with_context(|| format!("Poster request rejected: {}", url))?;
  let bytes = response.bytes().await.with_context(|| format!("Failed to read poster bytes from {}", url))?;
  decode_poster(&bytes).with_context(|| format!("Bad poster at {}", url))
}

/// Fetch posters for `(id, url)` pairs, at most `poster_concurrency` at a time.
/// Each result is sent through `tx` as soon as it completes.
pub async fn fetch_posters(client: Client, requests: Vec<(u32, String)>, tx: mpsc::Sender<PosterResult>) {
  use futures::stream::{self, StreamExt};

  stream::iter(requests)
    .map(|(id, url)| {
      let client = client.clone();
      let tx = tx.clone();
      async move {
        let image = fetch_poster(&client, &url).await;
        if let Err(ref e) = image {
          debug!(id, err = %format!("{:#}", e), "poster: fetch failed");
        }
        let _ = tx.send(PosterResult { id, image }).await;
      }
    })
    .buffer_unordered(constants().poster_concurrency.max(1))
    .collect::<()>()
    .await;
}
