//! Client for the external product catalog service.
//!
//! Consulted only when an admin creates a flash sale, to verify that every
//! offer references an existing variant. Never called on the allocation
//! path, which must stay free of upstream latency.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use flashmart_core::types::Cents;

/// Catalog data for a product variant.
#[derive(Debug, Clone, Deserialize)]
pub struct VariantInfo {
    pub base_price_cents: Cents,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog service unavailable: {0}")]
    Unavailable(String),
}

/// Read-only variant lookup.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Returns `None` when the variant does not exist in the catalog.
    async fn get_variant(
        &self,
        product_id: &str,
        variant_id: &str,
    ) -> Result<Option<VariantInfo>, CatalogError>;
}

/// HTTP catalog client hitting
/// `GET {base_url}/variants/{product_id}/{variant_id}`.
pub struct HttpCatalogClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCatalogClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn get_variant(
        &self,
        product_id: &str,
        variant_id: &str,
    ) -> Result<Option<VariantInfo>, CatalogError> {
        let url = format!("{}/variants/{product_id}/{variant_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = response
            .error_for_status()
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        let info: VariantInfo = response
            .json()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
        Ok(Some(info))
    }
}

/// In-process catalog stub.
///
/// `permissive()` accepts every variant; used in local development when
/// `CATALOG_BASE_URL` is unset, and as a base for tests, which register
/// known variants explicitly via `with_variant`.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    permissive: bool,
    variants: HashMap<(String, String), Cents>,
}

impl StaticCatalog {
    pub fn permissive() -> Self {
        Self {
            permissive: true,
            variants: HashMap::new(),
        }
    }

    pub fn with_variant(mut self, product_id: &str, variant_id: &str, base_price_cents: Cents) -> Self {
        self.variants
            .insert((product_id.to_string(), variant_id.to_string()), base_price_cents);
        self
    }
}

#[async_trait]
impl CatalogClient for StaticCatalog {
    async fn get_variant(
        &self,
        product_id: &str,
        variant_id: &str,
    ) -> Result<Option<VariantInfo>, CatalogError> {
        let key = (product_id.to_string(), variant_id.to_string());
        if let Some(&base_price_cents) = self.variants.get(&key) {
            return Ok(Some(VariantInfo { base_price_cents }));
        }
        if self.permissive {
            return Ok(Some(VariantInfo {
                base_price_cents: 0,
            }));
        }
        Ok(None)
    }
}
