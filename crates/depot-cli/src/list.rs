//! `depot list` and `depot search`.

use anyhow::Result;

use crate::client::Client;

pub async fn run_list(client: &Client) -> Result<()> {
    let packages = client.list_packages(None).await?;
    if packages.is_empty() {
        println!("No packages found.");
        return Ok(());
    }

    println!("Packages:");
    for package in packages {
        println!("  - {}", package.name);
    }
    Ok(())
}

pub async fn run_search(client: &Client, query: &str) -> Result<()> {
    let packages = client.list_packages(Some(query)).await?;
    if packages.is_empty() {
        println!("No packages matching '{query}'.");
        return Ok(());
    }

    println!("Search results for '{query}':");
    for package in packages {
        println!("  - {}", package.name);
    }
    Ok(())
}
