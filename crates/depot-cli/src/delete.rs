//! `depot delete` — remove one artifact version.

use anyhow::Result;

use crate::client::Client;

pub async fn run_delete(client: &Client, package: &str, version: &str) -> Result<()> {
    client.delete(package, version).await?;
    println!("Deleted {package}@{version}");
    Ok(())
}
