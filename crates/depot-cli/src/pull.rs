//! `depot pull` — download an artifact version to a local file.
//!
//! Bytes stream into `<output>.part` first; the finished download then
//! replaces any existing file at the output path. An interrupted pull
//! never clobbers a previously pulled artifact.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::TryStreamExt;
use tokio::io::AsyncWriteExt;

use crate::client::Client;
use crate::progress::{format_bytes, ProgressBar};

pub async fn run_pull(
    client: &Client,
    package: &str,
    version: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let output = output.unwrap_or_else(|| PathBuf::from(format!("{package}-{version}")));

    let response = client.download(package, version).await?;
    let total = response.content_length();
    let hash = response
        .headers()
        .get("x-artifact-hash")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating output directory {}", parent.display()))?;
        }
    }

    let part_path = {
        let mut os = output.clone().into_os_string();
        os.push(".part");
        PathBuf::from(os)
    };

    let start = Instant::now();
    let written = match write_stream(response, &part_path, total).await {
        Ok(written) => written,
        Err(err) => {
            let _ = tokio::fs::remove_file(&part_path).await;
            return Err(err);
        }
    };

    match tokio::fs::remove_file(&output).await {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            let _ = tokio::fs::remove_file(&part_path).await;
            return Err(err).context("replacing output file");
        }
    }
    tokio::fs::rename(&part_path, &output)
        .await
        .context("finalizing output file")?;

    let elapsed = Duration::from_millis(start.elapsed().as_millis() as u64);
    println!("Pulled {package}@{version} -> {}", output.display());
    println!("  Hash:     {hash}");
    println!("  Size:     {}", format_bytes(written));
    println!("  Duration: {elapsed:?}");
    Ok(())
}

async fn write_stream(
    response: reqwest::Response,
    path: &Path,
    total: Option<u64>,
) -> Result<u64> {
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("creating {}", path.display()))?;
    let mut bar = ProgressBar::new("Downloading", total);
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.try_next().await.context("downloading")? {
        file.write_all(&chunk).await.context("writing output")?;
        written += chunk.len() as u64;
        bar.advance(chunk.len() as u64);
    }
    bar.finish();

    file.flush().await.context("flushing output")?;
    Ok(written)
}
