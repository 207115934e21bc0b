// src/api.rs
use std::sync::{Arc, RwLock};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::bus::{EventBus, StoreEvent};
use crate::catalog::text::anon_hash;
use crate::catalog::{
    derive_view, CatalogProvider, CatalogStore, FilterState, HttpCatalogProvider, SortStrategy,
};
use crate::config::{dev_logging_enabled, ConfigHandle, EngineConfig};
use crate::criteria::CriteriaView;
use crate::notice::NoticeBoard;
use crate::ranking::{
    resolve_candidates, run_comparison, ComparisonSession, HttpRankingBackend, RankingBackend,
    MIN_CANDIDATES,
};
use crate::session::SessionHandle;

#[derive(Clone)]
pub struct AppState {
    pub config: ConfigHandle,
    pub catalog: CatalogStore,
    pub catalog_provider: Arc<dyn CatalogProvider>,
    pub ranking: Arc<dyn RankingBackend>,
    pub comparison: Arc<RwLock<ComparisonSession>>,
    pub notices: Arc<NoticeBoard>,
    pub bus: EventBus,
    pub session: SessionHandle,
}

impl AppState {
    /// Production wiring: HTTP providers against the configured API base.
    pub fn from_config(config: ConfigHandle) -> Self {
        let cfg = config.current();
        let catalog_provider: Arc<dyn CatalogProvider> =
            Arc::new(HttpCatalogProvider::from_base(&cfg.api_base));
        let ranking: Arc<dyn RankingBackend> =
            Arc::new(HttpRankingBackend::from_base(&cfg.api_base));
        Self::with_backends(config, catalog_provider, ranking)
    }

    /// Explicit backends — used by tests to plug fixtures in.
    pub fn with_backends(
        config: ConfigHandle,
        catalog_provider: Arc<dyn CatalogProvider>,
        ranking: Arc<dyn RankingBackend>,
    ) -> Self {
        let cfg = config.current();
        Self {
            config,
            catalog: CatalogStore::new(),
            catalog_provider,
            ranking,
            comparison: Arc::new(RwLock::new(ComparisonSession::new(cfg.criteria_set()))),
            notices: Arc::new(NoticeBoard::new(cfg.notice_ttl_secs)),
            bus: EventBus::default(),
            session: SessionHandle::new(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/catalog", get(get_catalog))
        .route("/catalog/refresh", post(refresh_catalog))
        .route("/compare", post(compare))
        .route("/compare/criteria", get(get_criteria))
        .route("/compare/criteria/defaults", get(get_default_criteria))
        .route("/compare/criteria/toggle", post(toggle_criterion))
        .route("/compare/criteria/weight", post(adjust_weight))
        .route("/compare/criteria/redistribute", post(redistribute))
        .route("/compare/load", post(load_candidates))
        .route("/compare/remove", post(remove_candidate))
        .route("/debug/notices", get(debug_notices))
        .route("/debug/session", get(debug_session))
        .route("/debug/candidates", get(debug_candidates))
        .route("/admin/reload-config", get(admin_reload_config))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/* ----------------------------
Catalog view
---------------------------- */

#[derive(Debug, Default, Deserialize)]
struct CatalogQuery {
    q: Option<String>,
    categoria: Option<String>,
    subcategoria: Option<String>,
    nuevo: Option<bool>,
    usado: Option<bool>,
    precio_min: Option<f64>,
    precio_max: Option<f64>,
    /// Comma-separated brand set.
    marcas: Option<String>,
    calificacion_min: Option<f64>,
    orden: Option<String>,
}

impl CatalogQuery {
    fn into_filter(self) -> FilterState {
        // Category selection is the reset transition; everything else is
        // layered on top of it.
        let mut filter = match self.categoria {
            Some(cat) => FilterState::reset_for_category(cat),
            None => FilterState::default(),
        };
        filter.query = self.q.unwrap_or_default();
        filter.subcategory = self.subcategoria;
        filter.only_new = self.nuevo.unwrap_or(false);
        filter.only_used = self.usado.unwrap_or(false);
        filter.price_min = self.precio_min;
        filter.price_max = self.precio_max;
        if let Some(raw) = self.marcas {
            filter.brands = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        filter.min_rating = self.calificacion_min;
        filter.sort = self
            .orden
            .as_deref()
            .map(SortStrategy::from_name)
            .unwrap_or_default();
        filter
    }
}

async fn get_catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Json<serde_json::Value> {
    let filter = query.into_filter();
    let snapshot = state.catalog.snapshot();
    let view = derive_view(&snapshot, &filter, &state.config.active_states());
    counter!("filter_runs_total").increment(1);

    if dev_logging_enabled() && !filter.query.trim().is_empty() {
        // Never log the raw query — hashed id only.
        info!(
            target: "catalog",
            id = %anon_hash(&filter.query),
            total = view.len(),
            "search"
        );
    }

    Json(json!({ "total": view.len(), "productos": view }))
}

async fn refresh_catalog(State(state): State<AppState>) -> Response {
    match state.catalog_provider.fetch_all().await {
        Ok(items) => {
            let total = state.catalog.replace(items);
            state
                .bus
                .publish(StoreEvent::CatalogRefreshed { items: total });
            Json(json!({ "total": total })).into_response()
        }
        Err(e) => {
            let msg = e.to_string();
            state.notices.push(msg.as_str());
            (StatusCode::BAD_GATEWAY, Json(json!({ "mensaje": msg }))).into_response()
        }
    }
}

/* ----------------------------
Criteria weighting
---------------------------- */

#[derive(serde::Serialize)]
struct CriteriaResponse {
    #[serde(rename = "bloqueado")]
    blocked: bool,
    #[serde(rename = "mensaje", skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(flatten)]
    view: CriteriaView,
}

#[derive(Deserialize)]
struct ToggleReq {
    nombre: String,
}

async fn toggle_criterion(
    State(state): State<AppState>,
    Json(body): Json<ToggleReq>,
) -> Json<CriteriaResponse> {
    let (result, view) = {
        let mut guard = state.comparison.write().expect("comparison lock poisoned");
        let result = guard.criteria_mut().toggle(&body.nombre);
        (result, guard.criteria().snapshot())
    };

    let message = result.err().map(|e| e.to_string());
    if let Some(msg) = &message {
        state.notices.push(msg.as_str());
    }
    Json(CriteriaResponse {
        blocked: message.is_some(),
        message,
        view,
    })
}

#[derive(Deserialize)]
struct AdjustReq {
    nombre: String,
    valor: i64,
}

async fn adjust_weight(
    State(state): State<AppState>,
    Json(body): Json<AdjustReq>,
) -> Json<CriteriaResponse> {
    let (result, view) = {
        let mut guard = state.comparison.write().expect("comparison lock poisoned");
        let result = guard.criteria_mut().adjust_weight(&body.nombre, body.valor);
        (result, guard.criteria().snapshot())
    };

    let message = result.err().map(|e| e.to_string());
    if let Some(msg) = &message {
        state.notices.push(msg.as_str());
    }
    Json(CriteriaResponse {
        blocked: message.is_some(),
        message,
        view,
    })
}

async fn redistribute(State(state): State<AppState>) -> Json<CriteriaResponse> {
    let view = {
        let mut guard = state.comparison.write().expect("comparison lock poisoned");
        guard.criteria_mut().redistribute_equally();
        guard.criteria().snapshot()
    };

    Json(CriteriaResponse {
        blocked: false,
        message: None,
        view,
    })
}

async fn get_criteria(State(state): State<AppState>) -> Json<CriteriaView> {
    let guard = state.comparison.read().expect("comparison lock poisoned");
    Json(guard.criteria().snapshot())
}

/// The ranking service's own default weighting, proxied for the UI.
async fn get_default_criteria(State(state): State<AppState>) -> Response {
    match state.ranking.default_criteria().await {
        Ok(map) => Json(map).into_response(),
        Err(e) => {
            let msg = e.to_string();
            state.notices.push(msg.as_str());
            (StatusCode::BAD_GATEWAY, Json(json!({ "mensaje": msg }))).into_response()
        }
    }
}

/* ----------------------------
Comparison
---------------------------- */

#[derive(Deserialize)]
struct LoadReq {
    productos_ids: Vec<i64>,
}

async fn load_candidates(
    State(state): State<AppState>,
    Json(body): Json<LoadReq>,
) -> Json<serde_json::Value> {
    // Resolve first — no lock is held across the fetches.
    let (loaded, dropped) =
        resolve_candidates(state.catalog_provider.as_ref(), &body.productos_ids).await;
    let total = loaded.len();

    {
        let mut guard = state.comparison.write().expect("comparison lock poisoned");
        guard.set_candidates(loaded);
    }

    let blocked = total < MIN_CANDIDATES;
    let message = blocked.then(|| {
        let msg = format!("Se necesitan al menos {MIN_CANDIDATES} productos para comparar");
        state.notices.push(msg.as_str());
        msg
    });

    Json(json!({
        "cargados": total,
        "descartados": dropped,
        "bloqueado": blocked,
        "mensaje": message,
    }))
}

#[derive(Deserialize)]
struct RemoveReq {
    id_producto: i64,
}

async fn remove_candidate(
    State(state): State<AppState>,
    Json(body): Json<RemoveReq>,
) -> Json<serde_json::Value> {
    let (removed, remaining) = {
        let mut guard = state.comparison.write().expect("comparison lock poisoned");
        let removed = guard.remove(body.id_producto);
        (removed, guard.candidates().len())
    };

    let blocked = remaining < MIN_CANDIDATES;
    if removed && blocked {
        state.notices.push(format!(
            "Se necesitan al menos {MIN_CANDIDATES} productos para comparar"
        ));
    }

    Json(json!({
        "eliminado": removed,
        "quedan": remaining,
        "bloqueado": blocked,
    }))
}

async fn compare(State(state): State<AppState>) -> Response {
    match run_comparison(&state.comparison, state.ranking.as_ref()).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(err) if err.is_local() => {
            counter!("compare_blocked_total").increment(1);
            let msg = err.to_string();
            state.notices.push(msg.as_str());
            Json(json!({ "bloqueado": true, "mensaje": msg })).into_response()
        }
        Err(err) => {
            let msg = err.to_string();
            state.notices.push(msg.as_str());
            (StatusCode::BAD_GATEWAY, Json(json!({ "mensaje": msg }))).into_response()
        }
    }
}

/* ----------------------------
Debug & admin
---------------------------- */

async fn debug_notices(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "notices": state.notices.active() }))
}

async fn debug_session(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "usuario": state.session.current() }))
}

async fn debug_candidates(State(state): State<AppState>) -> Json<serde_json::Value> {
    let guard = state.comparison.read().expect("comparison lock poisoned");
    let ids: Vec<i64> = guard.candidates().iter().map(|c| c.id).collect();
    Json(json!({
        "total": ids.len(),
        "productos_ids": ids,
        "tiene_resultado": guard.outcome().is_some(),
    }))
}

async fn admin_reload_config(State(state): State<AppState>) -> String {
    match EngineConfig::from_toml() {
        Ok(fresh) => {
            state.config.replace(fresh);
            "reloaded".to_string()
        }
        Err(e) => format!("failed: {e}"),
    }
}
