// src/criteria.rs
//! The criteria weighting pipeline: a named set of decision criteria with
//! integer percentage weights that must sum to exactly 100 over the active
//! ones before a ranking request may be issued.
//!
//! Two distribution modes. Automatic: equal split with the remainder handed
//! out one point at a time to the first criteria in iteration order. Manual:
//! user-set weights, clamped so the active total never exceeds 100; manual
//! edits are sticky until equal distribution is explicitly re-triggered.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Whether a higher raw value is better (benefit) or worse (cost).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CriterionKind {
    #[serde(rename = "beneficio")]
    Benefit,
    #[serde(rename = "costo")]
    Cost,
}

/// One weighted evaluation axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "etiqueta")]
    pub label: String,
    #[serde(rename = "tipo")]
    pub kind: CriterionKind,
    /// Integer percentage in [0, 100].
    #[serde(rename = "peso")]
    pub weight: u32,
    #[serde(rename = "activo")]
    pub active: bool,
}

impl Criterion {
    pub fn new(name: &str, label: &str, kind: CriterionKind, weight: u32) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            weight: weight.min(100),
            active: true,
        }
    }
}

/// Per-criterion payload entry for the external ranking service.
/// Weight travels as a fraction in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionSpec {
    #[serde(rename = "peso")]
    pub weight: f64,
    #[serde(rename = "tipo")]
    pub kind: CriterionKind,
}

/// Validation failures of the weighting pipeline. These never leave the
/// process as requests; they surface as transient notices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeightError {
    /// Refused to deactivate the only remaining active criterion.
    LastActiveCriterion,
    /// The requested weight was capped so the active total stays ≤ 100.
    /// The capped value HAS been applied.
    TotalExceeded { applied: u32 },
    UnknownCriterion(String),
    InactiveCriterion(String),
}

impl std::fmt::Display for WeightError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LastActiveCriterion => {
                write!(f, "Debe haber al menos un criterio activo")
            }
            Self::TotalExceeded { applied } => {
                write!(f, "Los pesos no pueden exceder 100% (ajustado a {applied}%)")
            }
            Self::UnknownCriterion(name) => write!(f, "Criterio desconocido: {name}"),
            Self::InactiveCriterion(name) => write!(f, "Criterio inactivo: {name}"),
        }
    }
}

impl std::error::Error for WeightError {}

/// Serializable snapshot of the set for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct CriteriaView {
    #[serde(rename = "criterios")]
    pub criteria: Vec<Criterion>,
    #[serde(rename = "peso_total")]
    pub total: u32,
    #[serde(rename = "distribucion_automatica")]
    pub auto_distribution: bool,
}

/// Ordered set of criteria plus the distribution mode flag.
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaSet {
    criteria: Vec<Criterion>,
    auto_distribution: bool,
}

impl Default for CriteriaSet {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl CriteriaSet {
    /// Built-in seed mirroring the storefront's default comparison axes.
    pub fn default_seed() -> Self {
        Self {
            criteria: vec![
                Criterion::new("precio", "Precio", CriterionKind::Cost, 30),
                Criterion::new("calificacion", "Calificación", CriterionKind::Benefit, 25),
                Criterion::new("reviews", "Reviews", CriterionKind::Benefit, 20),
                Criterion::new(
                    "reputacion_vendedor",
                    "Popularidad",
                    CriterionKind::Benefit,
                    15,
                ),
                Criterion::new("stock", "Stock", CriterionKind::Benefit, 10),
            ],
            auto_distribution: true,
        }
    }

    /// Build from configured criteria; an empty list falls back to the seed.
    pub fn from_criteria(criteria: Vec<Criterion>) -> Self {
        if criteria.is_empty() {
            return Self::default_seed();
        }
        Self {
            criteria,
            auto_distribution: true,
        }
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn auto_distribution(&self) -> bool {
        self.auto_distribution
    }

    pub fn active_count(&self) -> usize {
        self.criteria.iter().filter(|c| c.active).count()
    }

    /// Sum of weights over active criteria. Integer weights make the
    /// "sum == 100 ± 0.1" tolerance from the UI contract exact here.
    pub fn total_active_weight(&self) -> u32 {
        self.criteria
            .iter()
            .filter(|c| c.active)
            .map(|c| c.weight)
            .sum()
    }

    /// A ranking request may only be built from a submittable set.
    pub fn is_submittable(&self) -> bool {
        self.active_count() > 0 && self.total_active_weight() == 100
    }

    fn index_of(&self, name: &str) -> Result<usize, WeightError> {
        self.criteria
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| WeightError::UnknownCriterion(name.to_string()))
    }

    /// Flip a criterion's active flag. Deactivating the last active
    /// criterion is refused (the flag is restored). Deactivation zeroes the
    /// weight; in automatic mode any successful toggle redistributes.
    pub fn toggle(&mut self, name: &str) -> Result<(), WeightError> {
        let idx = self.index_of(name)?;
        self.criteria[idx].active = !self.criteria[idx].active;

        if self.active_count() == 0 {
            self.criteria[idx].active = true;
            return Err(WeightError::LastActiveCriterion);
        }

        if !self.criteria[idx].active {
            self.criteria[idx].weight = 0;
        }
        if self.auto_distribution {
            self.redistribute_equally();
        }
        Ok(())
    }

    /// Equal split over the `k` active criteria: each gets floor(100/k),
    /// and the first `100 - k*floor(100/k)` get one extra point. Inactive
    /// criteria are forced to 0. Re-enters automatic mode.
    pub fn redistribute_equally(&mut self) {
        let k = self.active_count() as u32;
        if k == 0 {
            return;
        }
        let base = 100 / k;
        let remainder = 100 - base * k;

        let mut nth_active = 0u32;
        for c in &mut self.criteria {
            if c.active {
                c.weight = base + u32::from(nth_active < remainder);
                nth_active += 1;
            } else {
                c.weight = 0;
            }
        }
        self.auto_distribution = true;
    }

    /// Manually set a weight. The raw value is clamped to [0, 100] and then
    /// capped so the active total never exceeds 100; a cap is reported as a
    /// validation error even though the capped value is applied. Any manual
    /// edit leaves automatic mode.
    pub fn adjust_weight(&mut self, name: &str, raw: i64) -> Result<u32, WeightError> {
        let idx = self.index_of(name)?;
        if !self.criteria[idx].active {
            return Err(WeightError::InactiveCriterion(name.to_string()));
        }

        self.auto_distribution = false;

        let clamped = raw.clamp(0, 100) as u32;
        let others: u32 = self
            .criteria
            .iter()
            .enumerate()
            .filter(|(i, c)| *i != idx && c.active)
            .map(|(_, c)| c.weight)
            .sum();

        if clamped + others > 100 {
            let applied = 100u32.saturating_sub(others);
            self.criteria[idx].weight = applied;
            return Err(WeightError::TotalExceeded { applied });
        }

        self.criteria[idx].weight = clamped;
        Ok(clamped)
    }

    /// Payload for the external scorer: active criteria only, weights as
    /// fractions. BTreeMap keeps the wire order deterministic.
    pub fn build_payload(&self) -> BTreeMap<String, CriterionSpec> {
        self.criteria
            .iter()
            .filter(|c| c.active)
            .map(|c| {
                (
                    c.name.clone(),
                    CriterionSpec {
                        weight: f64::from(c.weight) / 100.0,
                        kind: c.kind,
                    },
                )
            })
            .collect()
    }

    pub fn snapshot(&self) -> CriteriaView {
        CriteriaView {
            criteria: self.criteria.clone(),
            total: self.total_active_weight(),
            auto_distribution: self.auto_distribution,
        }
    }
}
