//! `ferry copy <url> --name <name>` – relay one source into the bucket.

use std::collections::HashMap;

use anyhow::{Context, Result};
use ferry_core::config::{self, FerryConfig, TransferRequest};
use ferry_core::source::SourceClient;
use ferry_core::store::S3Store;
use ferry_core::{engine, retry, workset};

pub async fn run_copy(
    cfg: &FerryConfig,
    url: &str,
    name: &str,
    size: Option<u64>,
    queue_size: Option<usize>,
    part_size: Option<u64>,
) -> Result<()> {
    if cfg.destination.bucket.is_empty() {
        anyhow::bail!(
            "destination.bucket is not set; edit {}",
            config::config_path()?.display()
        );
    }

    let source = SourceClient::new()?;
    let total_bytes = match size {
        Some(n) => n,
        None => {
            let head = source.probe(url).await?;
            if !head.accept_ranges {
                tracing::warn!(url, "source does not advertise ranged reads");
            }
            head.content_length
                .context("source did not report a size; pass --size")?
        }
    };

    let key = workset::destination_key(&cfg.destination.upload_prefix, name);
    let metadata = HashMap::from([
        ("relay-origname".to_string(), name.to_string()),
        ("relay-origurl".to_string(), url.to_string()),
    ]);
    let request = TransferRequest::new(
        url,
        &cfg.destination.bucket,
        &key,
        metadata,
        total_bytes,
        queue_size.unwrap_or(cfg.transfer.queue_size),
        part_size.unwrap_or(cfg.transfer.part_size_bytes),
    )?;

    let store = S3Store::connect(cfg.destination.store_config()).await;
    let policy = cfg.retry_policy();
    let object = retry::run_with_retry(&policy, || engine::relay(&store, &source, &request))
        .await
        .with_context(|| format!("relay {url}"))?;

    println!(
        "Uploaded {} -> {}/{} ({} bytes)",
        url, object.bucket, object.key, object.size
    );
    Ok(())
}
