// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /catalog (filter/sort pipeline over a fixture snapshot)
// - criteria endpoints (toggle guard, clamped weight, redistribution)
// - POST /compare (local gates + fixture backend)

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::Request,
    Router,
};
use http::StatusCode;
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use storefront_decision_engine::api::{create_router, AppState};
use storefront_decision_engine::catalog::{CatalogItem, FixtureCatalogProvider};
use storefront_decision_engine::config::{ConfigHandle, EngineConfig};
use storefront_decision_engine::ranking::{FixtureRankingBackend, RankingBackend};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

fn item(id: i64, category: &str, name: &str, price: f64) -> CatalogItem {
    serde_json::from_value(json!({
        "id_producto": id,
        "nombre": name,
        "precio": price,
        "calificacion": 4.0,
        "reviews": 10,
        "condicion": "nuevo",
        "disponible": true,
        "cantidad_disponible": 5,
        "categoria": category
    }))
    .unwrap()
}

fn fixture_catalog() -> Vec<CatalogItem> {
    let mut sold_out = item(3, "TECH", "Monitor agotado", 250.0);
    sold_out.stock = 0;
    vec![
        item(1, "TECH", "Teclado mecánico", 80.0),
        item(2, "TECH", "Audífonos TOZO", 70.0),
        sold_out,
        item(4, "SHOES", "Tenis Runner X", 120.0),
    ]
}

/// Build the same Router the binary uses, with fixture backends and the
/// fixture catalog already loaded. Returns the backend handle so tests can
/// assert on call counts.
fn test_router() -> (Router, Arc<FixtureRankingBackend>) {
    let config = ConfigHandle::new(EngineConfig::default());
    let backend = Arc::new(FixtureRankingBackend::new());
    let provider = Arc::new(FixtureCatalogProvider::from_items(fixture_catalog()));
    let state = AppState::with_backends(
        config,
        provider,
        backend.clone() as Arc<dyn RankingBackend>,
    );
    state.catalog.replace(fixture_catalog());
    (create_router(state), backend)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET");
    let resp = app.clone().oneshot(req).await.expect("oneshot GET");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, serde_json::from_slice(&bytes).expect("parse json"))
}

async fn post_json(app: &Router, uri: &str, payload: Json) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST");
    let resp = app.clone().oneshot(req).await.expect("oneshot POST");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, serde_json::from_slice(&bytes).expect("parse json"))
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let (app, _) = test_router();

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let body = String::from_utf8(bytes).expect("utf8");
    assert_eq!(body.trim(), "ok", "health body should be 'ok'");
}

#[tokio::test]
async fn catalog_category_view_excludes_sold_out_items() {
    let (app, _) = test_router();

    let (status, v) = get_json(&app, "/catalog?categoria=TECH").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["total"], json!(2), "sold-out monitor must be excluded");

    let ids: Vec<i64> = v["productos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id_producto"].as_i64().unwrap())
        .collect();
    assert!(ids.contains(&1) && ids.contains(&2));
    assert!(!ids.contains(&3));
}

#[tokio::test]
async fn catalog_search_crosses_the_selected_category() {
    let (app, _) = test_router();

    // "te" hits the TECH keyboard and the SHOES sneaker; TECH is the
    // selected category, yet the sneaker must still appear.
    let (status, v) = get_json(&app, "/catalog?categoria=TECH&q=te").await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<String> = v["productos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["nombre"].as_str().unwrap().to_string())
        .collect();
    assert!(
        names.iter().any(|n| n.contains("Teclado")),
        "TECH match expected, got {names:?}"
    );
    assert!(
        names.iter().any(|n| n.contains("Tenis")),
        "SHOES match expected despite categoria=TECH, got {names:?}"
    );
}

#[tokio::test]
async fn catalog_sorts_by_lowest_price() {
    let (app, _) = test_router();

    let (_, v) = get_json(&app, "/catalog?categoria=TECH&orden=lowest-price").await;
    let prices: Vec<f64> = v["productos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["precio"].as_f64().unwrap())
        .collect();
    assert_eq!(prices, vec![70.0, 80.0]);
}

#[tokio::test]
async fn criteria_snapshot_exposes_total_and_mode() {
    let (app, _) = test_router();

    let (status, v) = get_json(&app, "/compare/criteria").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["peso_total"], json!(100));
    assert_eq!(v["distribucion_automatica"], json!(true));
    assert_eq!(v["criterios"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn toggling_all_but_one_criterion_is_guarded() {
    let (app, _) = test_router();

    for nombre in ["precio", "calificacion", "reviews", "reputacion_vendedor"] {
        let (status, v) = post_json(
            &app,
            "/compare/criteria/toggle",
            json!({ "nombre": nombre }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["bloqueado"], json!(false), "toggle {nombre} should pass");
    }

    // Deactivating the last active criterion must be refused.
    let (_, v) = post_json(&app, "/compare/criteria/toggle", json!({ "nombre": "stock" })).await;
    assert_eq!(v["bloqueado"], json!(true));
    assert!(v["mensaje"].as_str().unwrap().contains("al menos un criterio"));
    // The remaining criterion holds the full weight.
    assert_eq!(v["peso_total"], json!(100));
}

#[tokio::test]
async fn manual_weight_is_clamped_and_reported() {
    let (app, _) = test_router();

    // Others sum to 70, so 45 is capped at 30.
    let (status, v) = post_json(
        &app,
        "/compare/criteria/weight",
        json!({ "nombre": "precio", "valor": 45 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["bloqueado"], json!(true));
    assert!(v["mensaje"].as_str().unwrap().contains("100%"));
    assert_eq!(v["peso_total"], json!(100));
    assert_eq!(v["distribucion_automatica"], json!(false));
}

#[tokio::test]
async fn redistribute_restores_automatic_mode() {
    let (app, _) = test_router();

    let _ = post_json(
        &app,
        "/compare/criteria/weight",
        json!({ "nombre": "stock", "valor": 5 }),
    )
    .await;
    let (_, v) = post_json(&app, "/compare/criteria/redistribute", json!({})).await;
    assert_eq!(v["distribucion_automatica"], json!(true));
    assert_eq!(v["peso_total"], json!(100));
}

#[tokio::test]
async fn default_criteria_are_proxied_from_the_ranking_service() {
    let (app, _) = test_router();

    let (status, v) = get_json(&app, "/compare/criteria/defaults").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["precio"]["tipo"], json!("costo"));
    assert!(v["precio"]["peso"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn compare_without_candidates_is_blocked_locally() {
    let (app, backend) = test_router();

    let (status, v) = post_json(&app, "/compare", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["bloqueado"], json!(true));
    assert!(v["mensaje"].as_str().unwrap().contains("al menos 2"));
    assert_eq!(backend.call_count(), 0, "no request may reach the backend");
}

#[tokio::test]
async fn full_comparison_flow_returns_a_winner() {
    let (app, backend) = test_router();

    let (_, v) = post_json(&app, "/compare/load", json!({ "productos_ids": [1, 2, 4] })).await;
    assert_eq!(v["cargados"], json!(3));
    assert_eq!(v["bloqueado"], json!(false));

    let (status, v) = post_json(&app, "/compare", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["producto_ganador"]["id_producto"], json!(1));
    assert_eq!(v["productos"].as_array().unwrap().len(), 3);
    assert_eq!(backend.call_count(), 1);

    let (_, v) = get_json(&app, "/debug/candidates").await;
    assert_eq!(v["tiene_resultado"], json!(true));
}

#[tokio::test]
async fn removing_below_two_blocks_and_clears_the_result() {
    let (app, _) = test_router();

    let _ = post_json(&app, "/compare/load", json!({ "productos_ids": [1, 2] })).await;
    let _ = post_json(&app, "/compare", json!({})).await;

    let (_, v) = post_json(&app, "/compare/remove", json!({ "id_producto": 2 })).await;
    assert_eq!(v["eliminado"], json!(true));
    assert_eq!(v["quedan"], json!(1));
    assert_eq!(v["bloqueado"], json!(true));

    let (_, v) = get_json(&app, "/debug/candidates").await;
    assert_eq!(v["tiene_resultado"], json!(false));

    // Blocked comparison surfaces a transient notice.
    let (_, v) = get_json(&app, "/debug/notices").await;
    assert!(!v["notices"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn remote_failure_surfaces_service_message_as_502() {
    let config = ConfigHandle::new(EngineConfig::default());
    let backend = Arc::new(FixtureRankingBackend::failing("Producto 9 no encontrado"));
    let provider = Arc::new(FixtureCatalogProvider::from_items(fixture_catalog()));
    let state = AppState::with_backends(
        config,
        provider,
        backend.clone() as Arc<dyn RankingBackend>,
    );
    let app = create_router(state);

    let _ = post_json(&app, "/compare/load", json!({ "productos_ids": [1, 2] })).await;
    let (status, v) = post_json(&app, "/compare", json!({})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(v["mensaje"], json!("Producto 9 no encontrado"));
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn refresh_pulls_the_fixture_catalog() {
    let config = ConfigHandle::new(EngineConfig::default());
    let backend: Arc<dyn RankingBackend> = Arc::new(FixtureRankingBackend::new());
    let provider = Arc::new(FixtureCatalogProvider::from_items(fixture_catalog()));
    let state = AppState::with_backends(config, provider, backend);
    let mut events = state.bus.subscribe();
    let app = create_router(state);

    // Store starts empty; refresh fills it and announces the new snapshot.
    let (_, v) = get_json(&app, "/catalog").await;
    assert_eq!(v["total"], json!(0));

    let (status, v) = post_json(&app, "/catalog/refresh", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["total"], json!(4));

    let ev = events.recv().await.unwrap();
    assert_eq!(
        ev,
        storefront_decision_engine::StoreEvent::CatalogRefreshed { items: 4 }
    );

    let (_, v) = get_json(&app, "/catalog").await;
    assert_eq!(v["total"], json!(3), "availability gate applies to the view");
}
