// src/catalog/provider.rs
//! Remote catalog access. The storefront API owns the product data; this
//! side only fetches and scrubs it. HTTP for production, fixtures for tests.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::counter;

use super::item::CatalogItem;
use super::text::scrub_text;

#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Full catalog for the active view-session.
    async fn fetch_all(&self) -> Result<Vec<CatalogItem>>;
    /// One product by id, as selected for comparison.
    async fn fetch_by_id(&self, id: i64) -> Result<CatalogItem>;
    fn name(&self) -> &'static str;
}

/// Seller-entered text arrives HTML-escaped and whitespace-mangled.
fn scrub_item(mut item: CatalogItem) -> CatalogItem {
    item.name = scrub_text(&item.name);
    item.description = scrub_text(&item.description);
    item
}

pub struct HttpCatalogProvider {
    base: String,
    client: reqwest::Client,
}

impl HttpCatalogProvider {
    pub fn from_base(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CatalogProvider for HttpCatalogProvider {
    async fn fetch_all(&self) -> Result<Vec<CatalogItem>> {
        let url = format!("{}/productos", self.base);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("catalog http get")?;

        let status = resp.status();
        if !status.is_success() {
            counter!("catalog_fetch_errors_total").increment(1);
            bail!("catalog service returned {status}");
        }

        let items: Vec<CatalogItem> = resp.json().await.context("decoding catalog json")?;
        counter!("catalog_fetch_total").increment(1);
        Ok(items.into_iter().map(scrub_item).collect())
    }

    async fn fetch_by_id(&self, id: i64) -> Result<CatalogItem> {
        let url = format!("{}/productos/{id}", self.base);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("product {id} http get"))?;

        let status = resp.status();
        if !status.is_success() {
            counter!("candidate_load_failures_total").increment(1);
            bail!("product {id}: catalog service returned {status}");
        }

        let item: CatalogItem = resp
            .json()
            .await
            .with_context(|| format!("decoding product {id} json"))?;
        Ok(scrub_item(item))
    }

    fn name(&self) -> &'static str {
        "catalog-http"
    }
}

/// Test double: serves a fixed catalog, optionally failing specific ids to
/// exercise the partial-load path.
pub struct FixtureCatalogProvider {
    items: Vec<CatalogItem>,
    fail_ids: Vec<i64>,
}

impl FixtureCatalogProvider {
    pub fn from_items(items: Vec<CatalogItem>) -> Self {
        Self {
            items,
            fail_ids: Vec::new(),
        }
    }

    pub fn with_failing_ids(mut self, ids: Vec<i64>) -> Self {
        self.fail_ids = ids;
        self
    }
}

#[async_trait]
impl CatalogProvider for FixtureCatalogProvider {
    async fn fetch_all(&self) -> Result<Vec<CatalogItem>> {
        Ok(self.items.clone())
    }

    async fn fetch_by_id(&self, id: i64) -> Result<CatalogItem> {
        if self.fail_ids.contains(&id) {
            counter!("candidate_load_failures_total").increment(1);
            bail!("product {id}: fixture configured to fail");
        }
        self.items
            .iter()
            .find(|it| it.id == id)
            .cloned()
            .with_context(|| format!("product {id} not in fixture"))
    }

    fn name(&self) -> &'static str {
        "catalog-fixture"
    }
}
