//! `ferry probe <url>` – HEAD probe of a source.

use anyhow::Result;
use ferry_core::source::SourceClient;

pub async fn run_probe(url: &str) -> Result<()> {
    let source = SourceClient::new()?;
    let head = source.probe(url).await?;
    match head.content_length {
        Some(n) => println!("size: {n} bytes"),
        None => println!("size: unknown"),
    }
    println!(
        "ranged reads: {}",
        if head.accept_ranges {
            "yes"
        } else {
            "not advertised"
        }
    );
    if let Some(etag) = head.etag {
        println!("etag: {etag}");
    }
    Ok(())
}
