// src/ranking/session.rs
//! Comparison session: the candidate set under comparison plus the criteria
//! weighting state, with every invariant gate applied locally BEFORE the
//! ranking service is reached. Pure state transitions live on the session;
//! the async orchestration over a shared session lives in free functions so
//! no lock is ever held across an await.

use std::sync::RwLock;

use tracing::warn;

use crate::catalog::{CatalogItem, CatalogProvider};
use crate::criteria::CriteriaSet;

use super::backend::RankingBackend;
use super::types::{ComparisonOutcome, RankRequest};

/// A comparison needs between 2 and 5 candidates inclusive.
pub const MIN_CANDIDATES: usize = 2;
pub const MAX_CANDIDATES: usize = 5;

/// Why a comparison was blocked locally (never sent) or failed remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    NotEnoughCandidates(usize),
    TooManyCandidates(usize),
    NoActiveCriteria,
    WeightSum(u32),
    Remote(String),
}

impl CompareError {
    /// Local validation failures are blocked client-side; remote failures
    /// already crossed the wire.
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Remote(_))
    }
}

impl std::fmt::Display for CompareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotEnoughCandidates(_) => {
                write!(f, "Selecciona al menos {MIN_CANDIDATES} productos")
            }
            Self::TooManyCandidates(_) => {
                write!(f, "Máximo {MAX_CANDIDATES} productos para comparar")
            }
            Self::NoActiveCriteria => write!(f, "Debe haber al menos un criterio activo"),
            Self::WeightSum(total) => {
                write!(f, "Los pesos deben sumar 100% (actualmente: {total}%)")
            }
            Self::Remote(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CompareError {}

#[derive(Debug, Default)]
pub struct ComparisonSession {
    candidates: Vec<CatalogItem>,
    criteria: CriteriaSet,
    outcome: Option<ComparisonOutcome>,
}

impl ComparisonSession {
    pub fn new(criteria: CriteriaSet) -> Self {
        Self {
            candidates: Vec::new(),
            criteria,
            outcome: None,
        }
    }

    pub fn candidates(&self) -> &[CatalogItem] {
        &self.candidates
    }

    pub fn criteria(&self) -> &CriteriaSet {
        &self.criteria
    }

    pub fn criteria_mut(&mut self) -> &mut CriteriaSet {
        &mut self.criteria
    }

    pub fn outcome(&self) -> Option<&ComparisonOutcome> {
        self.outcome.as_ref()
    }

    /// Replace the candidate set. Any previous ranking belonged to the old
    /// set, so it is dropped.
    pub fn set_candidates(&mut self, candidates: Vec<CatalogItem>) {
        self.candidates = candidates;
        self.outcome = None;
    }

    /// Remove one candidate. When the set drops below the minimum, the
    /// stale ranking result is cleared as well.
    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.candidates.len();
        self.candidates.retain(|c| c.id != id);
        let removed = self.candidates.len() < before;
        if removed && self.candidates.len() < MIN_CANDIDATES {
            self.outcome = None;
        }
        removed
    }

    /// Gate and assemble the request. This is the only path to a
    /// `RankRequest`, so the candidate-bound and weight-sum invariants hold
    /// for every request that reaches a backend.
    pub fn prepare_request(&self) -> Result<RankRequest, CompareError> {
        let n = self.candidates.len();
        if n < MIN_CANDIDATES {
            return Err(CompareError::NotEnoughCandidates(n));
        }
        if n > MAX_CANDIDATES {
            return Err(CompareError::TooManyCandidates(n));
        }
        if self.criteria.active_count() == 0 {
            return Err(CompareError::NoActiveCriteria);
        }
        let total = self.criteria.total_active_weight();
        if total != 100 {
            return Err(CompareError::WeightSum(total));
        }

        Ok(RankRequest {
            product_ids: self.candidates.iter().map(|c| c.id).collect(),
            criteria: Some(self.criteria.build_payload()),
        })
    }

    pub fn store_outcome(&mut self, outcome: ComparisonOutcome) {
        self.outcome = Some(outcome);
    }
}

/// Fetch candidates individually by id. Ids that fail to resolve are
/// silently dropped from the set (logged, counted); the caller decides
/// whether the survivors still clear the minimum.
pub async fn resolve_candidates(
    provider: &dyn CatalogProvider,
    ids: &[i64],
) -> (Vec<CatalogItem>, Vec<i64>) {
    let mut loaded = Vec::with_capacity(ids.len());
    let mut dropped = Vec::new();
    for &id in ids {
        match provider.fetch_by_id(id).await {
            Ok(item) => loaded.push(item),
            Err(e) => {
                warn!(error = ?e, id, provider = provider.name(), "candidate load failed");
                dropped.push(id);
            }
        }
    }
    (loaded, dropped)
}

/// Run one gated comparison against the backend. The lock is released
/// before the network call and re-taken to store the outcome.
pub async fn run_comparison(
    session: &RwLock<ComparisonSession>,
    backend: &dyn RankingBackend,
) -> Result<ComparisonOutcome, CompareError> {
    let req = {
        let guard = session.read().expect("comparison session lock poisoned");
        guard.prepare_request()?
    };

    let outcome = backend
        .compare(&req)
        .await
        .map_err(|e| CompareError::Remote(e.to_string()))?;

    {
        let mut guard = session.write().expect("comparison session lock poisoned");
        guard.store_outcome(outcome.clone());
    }
    Ok(outcome)
}
