// src/ranking/types.rs
//! Wire types for the external TOPSIS ranking service. The service owns the
//! distance arithmetic (ideal vectors, normalization, closeness); this side
//! only assembles requests and renders the returned ranking.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::criteria::CriterionSpec;

/// Body of POST /topsis/comparar. `criterios` omitted lets the service
/// apply its default weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankRequest {
    #[serde(rename = "productos_ids")]
    pub product_ids: Vec<i64>,
    #[serde(rename = "criterios", default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<BTreeMap<String, CriterionSpec>>,
}

/// One candidate as ranked by the service, with its normalized criterion
/// values and distances to the ideal reference vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedProduct {
    #[serde(rename = "id_producto")]
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "precio")]
    pub price: f64,
    #[serde(rename = "calificacion", default)]
    pub rating: f64,
    #[serde(rename = "reviews", default)]
    pub reviews: u32,
    #[serde(rename = "stock", default)]
    pub stock: u32,
    #[serde(rename = "condicion", default)]
    pub condition: String,
    #[serde(rename = "marca", default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(rename = "imagen", default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(rename = "vendedor_nombre", default, skip_serializing_if = "Option::is_none")]
    pub seller_name: Option<String>,
    #[serde(rename = "ventas_vendedor", default)]
    pub seller_sales: u32,
    #[serde(rename = "criterios_valores", default)]
    pub criteria_values: BTreeMap<String, f64>,
    #[serde(rename = "criterios_normalizados", default)]
    pub criteria_normalized: BTreeMap<String, f64>,
    /// Closeness coefficient in [0, 1]; higher ranks first.
    #[serde(rename = "score_topsis")]
    pub closeness: f64,
    #[serde(rename = "ranking")]
    pub rank: u32,
    #[serde(rename = "distancia_ideal_positiva", default)]
    pub distance_ideal_positive: f64,
    #[serde(rename = "distancia_ideal_negativa", default)]
    pub distance_ideal_negative: f64,
}

/// Ideal best/worst reference vector as the service reports it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdealSolution {
    #[serde(rename = "valores", default)]
    pub values: BTreeMap<String, f64>,
}

/// Full response of POST /topsis/comparar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonOutcome {
    #[serde(rename = "productos")]
    pub products: Vec<RankedProduct>,
    #[serde(rename = "ideal_positivo", default)]
    pub ideal_positive: IdealSolution,
    #[serde(rename = "ideal_negativo", default)]
    pub ideal_negative: IdealSolution,
    #[serde(rename = "criterios_utilizados", default)]
    pub criteria_used: BTreeMap<String, CriterionSpec>,
    #[serde(rename = "producto_ganador")]
    pub winner: RankedProduct,
    #[serde(rename = "mensaje", default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::CriterionKind;

    #[test]
    fn request_omits_criteria_when_none() {
        let req = RankRequest {
            product_ids: vec![1, 2],
            criteria: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["productos_ids"], serde_json::json!([1, 2]));
        assert!(v.get("criterios").is_none());
    }

    #[test]
    fn request_carries_fractional_weights() {
        let mut criteria = BTreeMap::new();
        criteria.insert(
            "precio".to_string(),
            CriterionSpec {
                weight: 0.3,
                kind: CriterionKind::Cost,
            },
        );
        let req = RankRequest {
            product_ids: vec![4, 9, 11],
            criteria: Some(criteria),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["criterios"]["precio"]["tipo"], serde_json::json!("costo"));
    }

    #[test]
    fn outcome_decodes_from_service_shape() {
        let raw = r#"{
            "productos": [
                {
                    "id_producto": 4,
                    "nombre": "Monitor Dell",
                    "precio": 250.0,
                    "calificacion": 4.2,
                    "reviews": 482,
                    "stock": 3,
                    "condicion": "nuevo",
                    "ventas_vendedor": 120,
                    "criterios_valores": {"precio": 250.0},
                    "criterios_normalizados": {"precio": 0.82},
                    "score_topsis": 0.71,
                    "ranking": 1,
                    "distancia_ideal_positiva": 0.12,
                    "distancia_ideal_negativa": 0.29
                }
            ],
            "ideal_positivo": {"valores": {"precio": 0.1}},
            "ideal_negativo": {"valores": {"precio": 0.9}},
            "criterios_utilizados": {"precio": {"peso": 1.0, "tipo": "costo"}},
            "producto_ganador": {
                "id_producto": 4,
                "nombre": "Monitor Dell",
                "precio": 250.0,
                "score_topsis": 0.71,
                "ranking": 1
            },
            "mensaje": "Comparación completada"
        }"#;
        let out: ComparisonOutcome = serde_json::from_str(raw).unwrap();
        assert_eq!(out.winner.id, 4);
        assert_eq!(out.products[0].rank, 1);
        assert!((out.products[0].closeness - 0.71).abs() < 1e-9);
        assert_eq!(out.criteria_used["precio"].kind, CriterionKind::Cost);
    }
}
