// src/ranking/backend.rs
//! Access to the TOPSIS ranking service. HTTP in production; a counting
//! fixture for tests (the candidate-bounds property is "the backend is never
//! reached with an invalid request", so the fixture counts calls).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::counter;

use crate::criteria::{CriterionKind, CriterionSpec};

use super::types::{ComparisonOutcome, IdealSolution, RankRequest, RankedProduct};

#[async_trait]
pub trait RankingBackend: Send + Sync {
    async fn compare(&self, req: &RankRequest) -> Result<ComparisonOutcome>;
    /// The service's default criteria map (GET /topsis/criterios-default).
    async fn default_criteria(&self) -> Result<BTreeMap<String, CriterionSpec>>;
    fn name(&self) -> &'static str;
}

pub struct HttpRankingBackend {
    base: String,
    client: reqwest::Client,
}

impl HttpRankingBackend {
    pub fn from_base(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

/// Pull the service's own error text out of a non-2xx body, if present.
/// The UI contract is to surface that message verbatim.
fn extract_detail(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("detail")?
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl RankingBackend for HttpRankingBackend {
    async fn compare(&self, req: &RankRequest) -> Result<ComparisonOutcome> {
        let url = format!("{}/topsis/comparar", self.base);
        counter!("compare_requests_total").increment(1);

        let resp = self
            .client
            .post(&url)
            .json(req)
            .send()
            .await
            .context("topsis http post")?;

        let status = resp.status();
        if !status.is_success() {
            counter!("compare_remote_errors_total").increment(1);
            let body = resp.text().await.unwrap_or_default();
            match extract_detail(&body) {
                Some(detail) => bail!("{detail}"),
                None => bail!("Error al comparar productos ({status})"),
            }
        }

        resp.json::<ComparisonOutcome>()
            .await
            .context("decoding topsis response")
    }

    async fn default_criteria(&self) -> Result<BTreeMap<String, CriterionSpec>> {
        let url = format!("{}/topsis/criterios-default", self.base);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("default criteria http get")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("ranking service returned {status}");
        }
        resp.json().await.context("decoding default criteria")
    }

    fn name(&self) -> &'static str {
        "topsis-http"
    }
}

/// Test double. Synthesizes a deterministic ranking from the request ids
/// (descending closeness in id order) unless a scripted outcome or failure
/// is configured. Counts every `compare` call.
#[derive(Default)]
pub struct FixtureRankingBackend {
    scripted: Option<ComparisonOutcome>,
    fail_with: Option<String>,
    calls: AtomicUsize,
}

impl FixtureRankingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(outcome: ComparisonOutcome) -> Self {
        Self {
            scripted: Some(outcome),
            ..Self::default()
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn synthesize(req: &RankRequest) -> ComparisonOutcome {
        let products: Vec<RankedProduct> = req
            .product_ids
            .iter()
            .enumerate()
            .map(|(i, &id)| RankedProduct {
                id,
                name: format!("Producto {id}"),
                price: 100.0 + i as f64,
                rating: 4.0,
                reviews: 10,
                stock: 5,
                condition: "nuevo".to_string(),
                brand: None,
                image: None,
                seller_name: None,
                seller_sales: 0,
                criteria_values: BTreeMap::new(),
                criteria_normalized: BTreeMap::new(),
                closeness: 0.9 - 0.1 * i as f64,
                rank: (i + 1) as u32,
                distance_ideal_positive: 0.1 * (i + 1) as f64,
                distance_ideal_negative: 0.9 - 0.1 * i as f64,
            })
            .collect();

        let winner = products[0].clone();
        ComparisonOutcome {
            products,
            ideal_positive: IdealSolution::default(),
            ideal_negative: IdealSolution::default(),
            criteria_used: req.criteria.clone().unwrap_or_default(),
            winner,
            message: "Comparación completada".to_string(),
        }
    }
}

#[async_trait]
impl RankingBackend for FixtureRankingBackend {
    async fn compare(&self, req: &RankRequest) -> Result<ComparisonOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = &self.fail_with {
            bail!("{msg}");
        }
        if let Some(out) = &self.scripted {
            return Ok(out.clone());
        }
        Ok(Self::synthesize(req))
    }

    async fn default_criteria(&self) -> Result<BTreeMap<String, CriterionSpec>> {
        let mut map = BTreeMap::new();
        map.insert(
            "precio".to_string(),
            CriterionSpec {
                weight: 0.5,
                kind: CriterionKind::Cost,
            },
        );
        map.insert(
            "calificacion".to_string(),
            CriterionSpec {
                weight: 0.5,
                kind: CriterionKind::Benefit,
            },
        );
        Ok(map)
    }

    fn name(&self) -> &'static str {
        "topsis-fixture"
    }
}
