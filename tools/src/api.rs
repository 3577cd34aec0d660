//! HTTP surface: routes, response envelope, and error mapping.
//!
//! Every endpoint is tenant-scoped. The upstream workspace layer is trusted
//! to resolve and verify the tenant; it hands us the result in the
//! `x-tenant-id` header. A request without one is malformed (400) — the
//! authentication itself happened elsewhere.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use remedysim_core::engine::SimEngine;
use remedysim_core::error::SimError;
use remedysim_core::playbook::{PlaybookDraft, PlaybookPatch};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

pub type SharedEngine = Arc<Mutex<SimEngine>>;

pub fn router(engine: SharedEngine) -> Router {
    Router::new()
        .route("/playbooks", get(list_playbooks).post(create_playbook))
        .route(
            "/playbooks/{id}",
            get(get_playbook).patch(patch_playbook).delete(delete_playbook),
        )
        .route("/playbooks/{id}/runs", get(list_playbook_runs))
        .route("/runs", get(list_runs).post(create_run))
        .route("/runs/{id}", get(get_run))
        .with_state(engine)
}

/// The store's connection is not Sync, hence the mutex. A poisoned lock
/// still guards a consistent SQLite handle, so recover instead of
/// panicking the whole server.
pub fn lock_engine(engine: &SharedEngine) -> MutexGuard<'_, SimEngine> {
    engine.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

// ── Envelope ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Envelope<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
}

fn ok<T: Serialize>(status: StatusCode, data: T) -> Response {
    let envelope = Envelope {
        success: true,
        data: Some(data),
        error: None,
        errors: None,
    };
    (status, Json(envelope)).into_response()
}

fn fail(err: SimError) -> Response {
    let (status, message, errors) = match err {
        SimError::Validation { errors } => {
            (StatusCode::BAD_REQUEST, "validation failed".to_string(), Some(errors))
        }
        SimError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found"), None),
        SimError::Conflict(message) => (StatusCode::CONFLICT, message, None),
        SimError::DataUnavailable(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("baseline data unavailable: {reason}"),
            None,
        ),
        other => {
            // Database/serialization/unexpected details stay in the server
            // log, never in the response.
            log::error!("internal error: {other}");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string(), None)
        }
    };
    let envelope: Envelope<()> = Envelope {
        success: false,
        data: None,
        error: Some(message),
        errors,
    };
    (status, Json(envelope)).into_response()
}

fn tenant_id(headers: &HeaderMap) -> Result<String, Response> {
    headers
        .get("x-tenant-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .filter(|tenant| !tenant.is_empty())
        .ok_or_else(|| fail(SimError::validation("x-tenant-id header is required")))
}

// ── Request payloads ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RunRequest {
    playbook_id: String,
    #[serde(default)]
    window_days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    offset: Option<u32>,
}

// ── Playbook handlers ────────────────────────────────────────────────────────

async fn list_playbooks(State(engine): State<SharedEngine>, headers: HeaderMap) -> Response {
    let tenant = match tenant_id(&headers) {
        Ok(tenant) => tenant,
        Err(response) => return response,
    };
    match lock_engine(&engine).list_playbooks(&tenant) {
        Ok(playbooks) => ok(StatusCode::OK, playbooks),
        Err(err) => fail(err),
    }
}

async fn create_playbook(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Json(draft): Json<PlaybookDraft>,
) -> Response {
    let tenant = match tenant_id(&headers) {
        Ok(tenant) => tenant,
        Err(response) => return response,
    };
    match lock_engine(&engine).create_playbook(&tenant, draft) {
        Ok(playbook) => ok(StatusCode::CREATED, playbook),
        Err(err) => fail(err),
    }
}

async fn get_playbook(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let tenant = match tenant_id(&headers) {
        Ok(tenant) => tenant,
        Err(response) => return response,
    };
    match lock_engine(&engine).get_playbook(&tenant, &id) {
        Ok(playbook) => ok(StatusCode::OK, playbook),
        Err(err) => fail(err),
    }
}

async fn patch_playbook(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<PlaybookPatch>,
) -> Response {
    let tenant = match tenant_id(&headers) {
        Ok(tenant) => tenant,
        Err(response) => return response,
    };
    match lock_engine(&engine).update_playbook(&tenant, &id, patch) {
        Ok(playbook) => ok(StatusCode::OK, playbook),
        Err(err) => fail(err),
    }
}

async fn delete_playbook(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let tenant = match tenant_id(&headers) {
        Ok(tenant) => tenant,
        Err(response) => return response,
    };
    match lock_engine(&engine).delete_playbook(&tenant, &id) {
        Ok(()) => ok(StatusCode::OK, serde_json::json!({ "deleted": true })),
        Err(err) => fail(err),
    }
}

// ── Run handlers ─────────────────────────────────────────────────────────────

async fn create_run(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Json(request): Json<RunRequest>,
) -> Response {
    let tenant = match tenant_id(&headers) {
        Ok(tenant) => tenant,
        Err(response) => return response,
    };
    // A failed simulation is still a successful request: the caller gets
    // the failed run to inspect, not a 5xx.
    let result = lock_engine(&engine).run_simulation(
        &tenant,
        &request.playbook_id,
        request.window_days,
    );
    match result {
        Ok(run) => ok(StatusCode::OK, run),
        Err(err) => fail(err),
    }
}

async fn list_runs(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Query(page): Query<PageQuery>,
) -> Response {
    let tenant = match tenant_id(&headers) {
        Ok(tenant) => tenant,
        Err(response) => return response,
    };
    match lock_engine(&engine).list_runs(&tenant, page.limit, page.offset) {
        Ok(runs) => ok(StatusCode::OK, runs),
        Err(err) => fail(err),
    }
}

async fn get_run(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let tenant = match tenant_id(&headers) {
        Ok(tenant) => tenant,
        Err(response) => return response,
    };
    match lock_engine(&engine).get_run(&tenant, &id) {
        Ok(run) => ok(StatusCode::OK, run),
        Err(err) => fail(err),
    }
}

async fn list_playbook_runs(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Response {
    let tenant = match tenant_id(&headers) {
        Ok(tenant) => tenant,
        Err(response) => return response,
    };
    match lock_engine(&engine).list_runs_for_playbook(&tenant, &id, page.limit, page.offset) {
        Ok(runs) => ok(StatusCode::OK, runs),
        Err(err) => fail(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remedysim_core::config::SimConfig;
    use remedysim_core::metrics::SeverityCounts;
    use remedysim_core::store::SimStore;

    fn test_engine() -> SharedEngine {
        let store = SimStore::in_memory().expect("in-memory store");
        store.migrate().expect("migration");
        store.upsert_tenant("t-acme", "Acme").expect("tenant");
        let today = chrono::Utc::now().date_naive();
        for back in 0..10 {
            let day = today - chrono::Days::new(back);
            store
                .insert_monitoring_rollup(
                    "t-acme",
                    day,
                    SeverityCounts { critical: 2, high: 10, medium: 50, low: 38 },
                    5,
                    20,
                    50,
                    60.0,
                )
                .expect("rollup");
        }
        Arc::new(Mutex::new(SimEngine::new(store, SimConfig::default())))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn tenant_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-tenant-id", "t-acme".parse().expect("header"));
        headers
    }

    fn draft_json() -> serde_json::Value {
        serde_json::json!({
            "name": "Quiet the noisy rules",
            "config": { "actions": [ { "type": "disable_rule", "rule_id": "r1" } ] }
        })
    }

    #[tokio::test]
    async fn missing_tenant_header_is_rejected() {
        let engine = test_engine();
        let response = list_playbooks(State(engine), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][0], "x-tenant-id header is required");
    }

    #[tokio::test]
    async fn create_playbook_returns_201_and_envelope() {
        let engine = test_engine();
        let draft: PlaybookDraft = serde_json::from_value(draft_json()).expect("draft");
        let response =
            create_playbook(State(engine), tenant_headers(), Json(draft)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["name"], "Quiet the noisy rules");
        assert_eq!(body["data"]["is_active"], true);
    }

    #[tokio::test]
    async fn invalid_config_returns_400_with_itemized_errors() {
        let engine = test_engine();
        let draft: PlaybookDraft = serde_json::from_value(serde_json::json!({
            "name": "Empty",
            "config": { "actions": [] }
        }))
        .expect("draft");
        let response =
            create_playbook(State(engine), tenant_headers(), Json(draft)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][0], "actions must contain 1-20 entries");
    }

    #[tokio::test]
    async fn unknown_playbook_run_is_404() {
        let engine = test_engine();
        let request: RunRequest =
            serde_json::from_value(serde_json::json!({ "playbook_id": "pb-nope" }))
                .expect("request");
        let response = create_run(State(engine), tenant_headers(), Json(request)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "playbook not found");
    }

    #[tokio::test]
    async fn run_endpoint_returns_completed_run() {
        let engine = test_engine();
        let draft: PlaybookDraft = serde_json::from_value(draft_json()).expect("draft");
        let created = create_playbook(State(engine.clone()), tenant_headers(), Json(draft)).await;
        let playbook_id = body_json(created).await["data"]["playbook_id"]
            .as_str()
            .expect("playbook id")
            .to_string();

        let request: RunRequest = serde_json::from_value(
            serde_json::json!({ "playbook_id": playbook_id, "window_days": 30 }),
        )
        .expect("request");
        let response = create_run(State(engine), tenant_headers(), Json(request)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "completed");
        assert_eq!(body["data"]["model_version"], "v1");
        assert_eq!(body["data"]["overall_effect"], "positive");
    }

    #[tokio::test]
    async fn tenants_do_not_see_each_other() {
        let engine = test_engine();
        let draft: PlaybookDraft = serde_json::from_value(draft_json()).expect("draft");
        let created = create_playbook(State(engine.clone()), tenant_headers(), Json(draft)).await;
        let playbook_id = body_json(created).await["data"]["playbook_id"]
            .as_str()
            .expect("playbook id")
            .to_string();

        let mut other = HeaderMap::new();
        other.insert("x-tenant-id", "t-other".parse().expect("header"));
        let response = get_playbook(State(engine), other, Path(playbook_id)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
