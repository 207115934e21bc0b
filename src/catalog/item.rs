// src/catalog/item.rs
//! Catalog item model. Field names on the wire are the storefront API's
//! Spanish names; the Rust side uses English identifiers via serde renames.

use serde::{Deserialize, Serialize};

use super::text::normalize;

/// One product in the browsable listing. Also used as a comparison
/// candidate — candidates carry the same core attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(rename = "id_producto")]
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "precio")]
    pub price: f64,
    /// Average rating, 0.0 when unrated.
    #[serde(rename = "calificacion", default)]
    pub rating: f64,
    #[serde(rename = "reviews", default)]
    pub reviews: u32,
    #[serde(rename = "marca", default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// "nuevo" | "usado" on the wire; kept as-is and compared normalized.
    #[serde(rename = "condicion", default = "default_condition")]
    pub condition: String,
    #[serde(rename = "disponible", default = "default_true")]
    pub available_flag: bool,
    #[serde(rename = "cantidad_disponible", default)]
    pub stock: u32,
    /// Lifecycle status string set by the seller/admin panel; empty means active.
    #[serde(rename = "estado", default)]
    pub status: String,
    #[serde(rename = "categoria", default)]
    pub category: String,
    #[serde(rename = "subcategoria", default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(rename = "vendedor_nombre", default, skip_serializing_if = "Option::is_none")]
    pub seller_name: Option<String>,
    #[serde(rename = "vistas", default)]
    pub views: u32,
    /// Raw image path as the API sends it. URL construction is the UI's problem.
    #[serde(rename = "imagen", default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_condition() -> String {
    "nuevo".to_string()
}

impl CatalogItem {
    /// Derived availability: explicit flag AND stock on hand AND a status
    /// string that is empty or one of the recognized active synonyms.
    pub fn is_available(&self, active_states: &[String]) -> bool {
        if !self.available_flag || self.stock == 0 {
            return false;
        }
        let status = normalize(&self.status);
        status.is_empty() || active_states.iter().any(|s| normalize(s) == status)
    }

    /// Relevance proxy used by the default sort: rating × review count.
    /// Zero-review items score 0 regardless of rating.
    pub fn relevance_score(&self) -> f64 {
        self.rating * f64::from(self.reviews)
    }
}
