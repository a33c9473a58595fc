use async_trait::async_trait;
use pricewatch_core::Product;
use serde::{Deserialize, Serialize};

/// Result every sink returns for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub ok: bool,
    /// Records that actually landed. Only meaningful when `ok`.
    pub inserted: usize,
    pub error: Option<String>,
}

impl SaveOutcome {
    #[must_use]
    pub fn saved(inserted: usize) -> Self {
        Self {
            ok: true,
            inserted,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            inserted: 0,
            error: Some(error.into()),
        }
    }
}

/// Persistence boundary for normalized product batches.
///
/// Implementations report failure through [`SaveOutcome`] rather than
/// panicking; upsert and dedup semantics are their own concern.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn save(&self, vendor: &str, products: &[Product]) -> SaveOutcome;

    /// Save path that records price changes. Defaults to a plain save.
    async fn save_with_price_update(&self, vendor: &str, products: &[Product]) -> SaveOutcome {
        self.save(vendor, products).await
    }
}
