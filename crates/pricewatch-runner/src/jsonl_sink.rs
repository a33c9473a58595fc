//! Append-only JSON-lines sink.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pricewatch_core::Product;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::sink::{SaveOutcome, Sink};

#[derive(Debug, Serialize)]
struct PriceRecord<'a> {
    vendor: &'a str,
    recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    product: &'a Product,
}

/// Writes one JSON object per product to a file, one line each.
///
/// The price-update path only writes products whose price differs from the
/// last price this sink wrote for the same `(vendor, url)`; that memory is
/// per process.
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    last_prices: Mutex<HashMap<(String, String), i64>>,
}

impl JsonlSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_prices: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, vendor: &str, products: &[&Product]) -> std::io::Result<usize> {
        if products.is_empty() {
            return Ok(0);
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let recorded_at = Utc::now();
        let mut buf = Vec::new();
        for product in products.iter().copied() {
            let record = PriceRecord {
                vendor,
                recorded_at,
                product,
            };
            serde_json::to_writer(&mut buf, &record)?;
            buf.push(b'\n');
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&buf).await?;
        file.flush().await?;
        Ok(products.len())
    }
}

#[async_trait]
impl Sink for JsonlSink {
    async fn save(&self, vendor: &str, products: &[Product]) -> SaveOutcome {
        let batch: Vec<&Product> = products.iter().collect();
        // Held across the write so concurrent vendors append whole batches.
        let mut last = self.last_prices.lock().await;
        match self.append(vendor, &batch).await {
            Ok(written) => {
                for p in products {
                    last.insert((vendor.to_string(), p.url.clone()), p.price);
                }
                SaveOutcome::saved(written)
            }
            Err(e) => {
                tracing::error!(vendor, path = %self.path.display(), error = %e, "failed to append products");
                SaveOutcome::failed(e.to_string())
            }
        }
    }

    async fn save_with_price_update(&self, vendor: &str, products: &[Product]) -> SaveOutcome {
        let mut last = self.last_prices.lock().await;
        let changed: Vec<&Product> = products
            .iter()
            .filter(|p| last.get(&(vendor.to_string(), p.url.clone())) != Some(&p.price))
            .collect();
        tracing::debug!(
            vendor,
            total = products.len(),
            changed = changed.len(),
            "price-update save"
        );

        match self.append(vendor, &changed).await {
            Ok(written) => {
                for p in &changed {
                    last.insert((vendor.to_string(), p.url.clone()), p.price);
                }
                SaveOutcome::saved(written)
            }
            Err(e) => {
                tracing::error!(vendor, path = %self.path.display(), error = %e, "failed to append price updates");
                SaveOutcome::failed(e.to_string())
            }
        }
    }
}
