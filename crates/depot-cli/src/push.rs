//! `depot push` — upload an artifact version from a file.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::TryStreamExt;
use tokio_util::io::ReaderStream;

use crate::client::Client;
use crate::progress::{format_bytes, ProgressBar};

pub async fn run_push(client: &Client, package: &str, version: &str, file: &Path) -> Result<()> {
    let handle = tokio::fs::File::open(file)
        .await
        .with_context(|| format!("opening {}", file.display()))?;
    let size = handle
        .metadata()
        .await
        .with_context(|| format!("reading metadata of {}", file.display()))?
        .len();

    let mut bar = ProgressBar::new("Uploading", Some(size));
    let stream =
        ReaderStream::new(handle).inspect_ok(move |chunk| bar.advance(chunk.len() as u64));
    let body = reqwest::Body::wrap_stream(stream);

    let start = Instant::now();
    let result = client.upload(package, version, size, body).await;
    eprintln!(); // end the progress line
    let receipt = result?;
    let elapsed = Duration::from_millis(start.elapsed().as_millis() as u64);

    println!("Pushed {package}@{version}");
    println!("  Hash:     {}", receipt.hash);
    println!("  Size:     {}", format_bytes(size));
    println!("  Duration: {elapsed:?}");
    Ok(())
}
