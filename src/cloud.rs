use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::utils;

/// Short timeout: the catalog is a convenience and must never stall a save
const CATALOG_TIMEOUT: Duration = Duration::from_secs(5);

/// A shared-catalog entry: what other users named this barcode. Expiry
/// dates are never shared, they belong to each installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub barcode: String,
    pub name: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Client for the shared barcode catalog. Every operation is best-effort:
/// lookups degrade to `None` and contributions are fire-and-forget, so a
/// missing or unreachable catalog never surfaces as an error.
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    /// Build a client for `base_url`, or `None` when the catalog is not
    /// configured
    pub fn new(base_url: &str) -> Option<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return None;
        }
        let client = match Client::builder().timeout(CATALOG_TIMEOUT).build() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("failed to build catalog HTTP client: {e}");
                return None;
            }
        };
        Some(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Look a barcode up in the shared catalog
    pub fn lookup(&self, barcode: &str) -> Option<CatalogEntry> {
        if barcode.is_empty() {
            return None;
        }

        let url = format!("{}/products/{}", self.base_url, barcode);
        let response = match self.client.get(&url).send() {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("catalog lookup for {barcode} failed: {e}");
                return None;
            }
        };

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return None;
        }
        if !response.status().is_success() {
            tracing::debug!("catalog lookup for {barcode} returned {}", response.status());
            return None;
        }

        match response.json::<CatalogEntry>() {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("catalog entry for {barcode} did not decode: {e}");
                None
            }
        }
    }

    /// Publish a barcode→name pairing so other users get the prefill too.
    /// Fire-and-forget; failures are logged and ignored.
    pub fn contribute(&self, barcode: &str, name: &str) {
        if barcode.is_empty() || name.is_empty() {
            return;
        }

        let entry = CatalogEntry {
            barcode: barcode.to_string(),
            name: name.to_string(),
            updated_at: Some(utils::timestamp()),
        };
        let url = format!("{}/products/{}", self.base_url, barcode);
        match self.client.put(&url).json(&entry).send() {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                tracing::warn!("catalog rejected contribution for {barcode}: {}", response.status());
            }
            Err(e) => {
                tracing::warn!("catalog contribution for {barcode} failed: {e}");
            }
        }
    }
}
