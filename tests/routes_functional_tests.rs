#![cfg(feature = "http-server")]

//! Functional tests for the REST API.
//!
//! These tests exercise the public HTTP routes using `tower::ServiceExt::oneshot`
//! to send synthetic requests directly to the Axum router without starting a TCP
//! listener. All requests in one test share an `AppState`, so multi-step flows
//! observe each other's writes through the in-memory repository.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use tourdesk::db::repositories::LocalRepository;
use tourdesk::http::{create_router, AppState};

fn state() -> AppState {
    AppState::new(Arc::new(LocalRepository::new()))
}

async fn send(
    state: &AppState,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().uri(uri).method(method);
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = create_router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get(state: &AppState, uri: &str) -> (StatusCode, Value) {
    send(state, "GET", uri, None).await
}

async fn post_json(state: &AppState, uri: &str, body: Value) -> (StatusCode, Value) {
    send(state, "POST", uri, Some(body)).await
}

async fn put_json(state: &AppState, uri: &str, body: Value) -> (StatusCode, Value) {
    send(state, "PUT", uri, Some(body)).await
}

async fn delete(state: &AppState, uri: &str) -> (StatusCode, Value) {
    send(state, "DELETE", uri, None).await
}

/// Registers a school and returns its assigned id.
async fn seed_school(state: &AppState, name: &str, city: &str) -> i64 {
    let (status, body) = post_json(
        state,
        "/v1/schools",
        json!({
            "name": name,
            "city": city,
            "persistence_score": 25,
            "quality_score": 30,
            "city_distance_km": 40,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

/// Registers an individual visitor and returns the issued tour code.
async fn seed_walk_in(state: &AppState, city: &str) -> String {
    let (status, body) = post_json(
        state,
        "/v1/tours",
        json!({ "kind": "individual", "city": city }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["code"].as_str().unwrap().to_string()
}

// == Health ===================================================================

#[tokio::test]
async fn test_health_returns_ok() {
    let state = state();
    let (status, body) = get(&state, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], "v1");
    assert_eq!(body["database"], "connected");
}

// == Schools ==================================================================

#[tokio::test]
async fn test_register_school_returns_created_with_id() {
    let state = state();
    let (status, body) = post_json(
        &state,
        "/v1/schools",
        json!({
            "name": "Fen Lisesi",
            "city": "Ankara",
            "persistence_score": 25,
            "quality_score": 30,
            "city_distance_km": 40,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_i64().unwrap() > 0);
    assert_eq!(body["name"], "Fen Lisesi");

    let id = body["id"].as_i64().unwrap();
    let (status, fetched) = get(&state, &format!("/v1/schools/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["city"], "Ankara");
}

#[tokio::test]
async fn test_register_school_rejects_blank_name() {
    let state = state();
    let (status, body) = post_json(
        &state,
        "/v1/schools",
        json!({
            "name": "   ",
            "city": "Ankara",
            "persistence_score": 1,
            "quality_score": 1,
            "city_distance_km": 1,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_get_unknown_school_returns_404() {
    let state = state();
    let (status, body) = get(&state, "/v1/schools/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_list_schools_reports_total() {
    let state = state();
    seed_school(&state, "Fen Lisesi", "Ankara").await;
    seed_school(&state, "Anadolu Lisesi", "Izmir").await;

    let (status, body) = get(&state, "/v1/schools").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["schools"].as_array().unwrap().len(), 2);
}

// == Tours ====================================================================

#[tokio::test]
async fn test_register_school_tour_scores_priority() {
    let state = state();
    let school_id = seed_school(&state, "Fen Lisesi", "Ankara").await;

    let (status, body) = post_json(
        &state,
        "/v1/tours",
        json!({ "kind": "school", "school_id": school_id }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["kind"], "school");
    assert_eq!(body["priority"], 145);
    assert!(body["code"].as_str().unwrap().starts_with("Ankara"));
}

#[tokio::test]
async fn test_register_walk_in_requires_city() {
    let state = state();
    let (status, body) = post_json(&state, "/v1/tours", json!({ "kind": "individual" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_register_tour_for_unknown_school_returns_404() {
    let state = state();
    let (status, body) = post_json(
        &state,
        "/v1/tours",
        json!({ "kind": "school", "school_id": 404 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_register_tour_replay_returns_same_code() {
    let state = state();
    let payload = json!({ "kind": "individual", "city": "Ankara" });

    let (_, first) = post_json(&state, "/v1/tours", payload.clone()).await;
    let (status, second) = post_json(&state, "/v1/tours", payload).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["code"], second["code"]);

    let (_, listing) = get(&state, "/v1/tours").await;
    assert_eq!(listing["total"], 1);
}

#[tokio::test]
async fn test_get_tour_by_code() {
    let state = state();
    let code = seed_walk_in(&state, "Bursa").await;

    let (status, body) = get(&state, &format!("/v1/tours/{}", code)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], code);
    assert_eq!(body["priority"], 0);

    let (status, _) = get(&state, "/v1/tours/Nowhere9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_assign_guide_round_trip() {
    let state = state();
    let code = seed_walk_in(&state, "Adana").await;

    let (status, body) = put_json(
        &state,
        &format!("/v1/tours/{}/guide", code),
        json!({ "guide_id": 7 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["guide_id"], 7);

    // A null guide clears the assignment
    let (status, body) = put_json(
        &state,
        &format!("/v1/tours/{}/guide", code),
        json!({ "guide_id": null }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("guide_id").is_none());

    let (_, fetched) = get(&state, &format!("/v1/tours/{}", code)).await;
    assert!(fetched.get("guide_id").is_none());

    let (status, _) = put_json(
        &state,
        "/v1/tours/Ghost0001/guide",
        json!({ "guide_id": 7 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// == Slots ====================================================================

#[tokio::test]
async fn test_create_slot_and_fetch() {
    let state = state();
    let (status, body) = post_json(
        &state,
        "/v1/slots",
        json!({ "day": "2026-09-14", "slot_index": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["day"], "2026-09-14");
    assert_eq!(body["slot_index"], 0);
    assert_eq!(body["max_admitted"], 3);
    assert_eq!(body["admitted"].as_array().unwrap().len(), 0);

    let (status, fetched) = get(&state, "/v1/slots/2026-09-14/0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["slot_id"], body["slot_id"]);
}

#[tokio::test]
async fn test_create_slot_duplicate_returns_conflict() {
    let state = state();
    let payload = json!({ "day": "2026-09-14", "slot_index": 1 });
    post_json(&state, "/v1/slots", payload.clone()).await;

    let (status, body) = post_json(&state, "/v1/slots", payload).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_create_slot_with_invalid_index_is_rejected() {
    let state = state();
    let (status, body) = post_json(
        &state,
        "/v1/slots",
        json!({ "day": "2026-09-14", "slot_index": 9 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_get_missing_slot_returns_404() {
    let state = state();
    let (status, body) = get(&state, "/v1/slots/2026-09-14/2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_list_slots_with_day_filter() {
    let state = state();
    post_json(
        &state,
        "/v1/slots",
        json!({ "day": "2026-09-14", "slot_index": 0 }),
    )
    .await;
    post_json(
        &state,
        "/v1/slots",
        json!({ "day": "2026-09-14", "slot_index": 1 }),
    )
    .await;
    post_json(
        &state,
        "/v1/slots",
        json!({ "day": "2026-09-15", "slot_index": 0 }),
    )
    .await;

    let (status, all) = get(&state, "/v1/slots").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["total"], 3);

    let (status, filtered) = get(&state, "/v1/slots?day=2026-09-14").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(filtered["total"], 2);
    for slot in filtered["slots"].as_array().unwrap() {
        assert_eq!(slot["day"], "2026-09-14");
    }
}

#[tokio::test]
async fn test_delete_slot_lifecycle() {
    let state = state();
    post_json(
        &state,
        "/v1/slots",
        json!({ "day": "2026-09-14", "slot_index": 3 }),
    )
    .await;

    let (status, _) = delete(&state, "/v1/slots/2026-09-14/3").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Already gone
    let (status, _) = delete(&state, "/v1/slots/2026-09-14/3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_occupied_slot_returns_conflict() {
    let state = state();
    let code = seed_walk_in(&state, "Ankara").await;
    post_json(
        &state,
        "/v1/slots/2026-09-14/0/requests",
        json!({ "tour_code": code }),
    )
    .await;

    let (status, body) = delete(&state, "/v1/slots/2026-09-14/0").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

// == Admissions ===============================================================

#[tokio::test]
async fn test_admission_flow_end_to_end() {
    let state = state();
    let school_id = seed_school(&state, "Fen Lisesi", "Ankara").await;

    // Three walk-ins fill the default capacity
    let mut walk_ins = Vec::new();
    for city in ["Izmir", "Bursa", "Adana"] {
        walk_ins.push(seed_walk_in(&state, city).await);
    }
    for code in &walk_ins {
        let (status, body) = post_json(
            &state,
            "/v1/slots/2026-09-14/0/requests",
            json!({ "tour_code": code }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "admitted");
        assert!(body.get("displaced").is_none());
    }

    // A fourth walk-in waits
    let fourth = seed_walk_in(&state, "Konya").await;
    let (_, body) = post_json(
        &state,
        "/v1/slots/2026-09-14/0/requests",
        json!({ "tour_code": fourth }),
    )
    .await;
    assert_eq!(body["status"], "waitlisted");

    // The school tour (priority 145) bumps the earliest walk-in
    let (_, tour) = post_json(
        &state,
        "/v1/tours",
        json!({ "kind": "school", "school_id": school_id }),
    )
    .await;
    let school_code = tour["code"].as_str().unwrap().to_string();
    let (status, body) = post_json(
        &state,
        "/v1/slots/2026-09-14/0/requests",
        json!({ "tour_code": school_code }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "admitted");
    assert_eq!(body["displaced"], walk_ins[0].as_str());

    let (_, occupancy) = get(&state, "/v1/slots/2026-09-14/0/occupancy").await;
    assert_eq!(occupancy["admitted"], 3);
    assert_eq!(occupancy["waitlisted"], 2);

    // The school cancels; the strongest waiting walk-in is promoted
    let (status, body) = delete(
        &state,
        &format!("/v1/slots/2026-09-14/0/requests/{}", school_code),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "removed_from_admitted");
    assert!(body["promoted"].is_string());

    let (_, occupancy) = get(&state, "/v1/slots/2026-09-14/0/occupancy").await;
    assert_eq!(occupancy["admitted"], 3);
    assert_eq!(occupancy["waitlisted"], 1);
}

#[tokio::test]
async fn test_admission_of_unknown_tour_returns_404() {
    let state = state();
    let (status, body) = post_json(
        &state,
        "/v1/slots/2026-09-14/0/requests",
        json!({ "tour_code": "Ghost0001" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_duplicate_admission_returns_conflict() {
    let state = state();
    let code = seed_walk_in(&state, "Ankara").await;
    let payload = json!({ "tour_code": code });
    post_json(&state, "/v1/slots/2026-09-14/0/requests", payload.clone()).await;

    let (status, body) = post_json(&state, "/v1/slots/2026-09-14/0/requests", payload).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_remove_absent_tour_reports_not_present() {
    let state = state();
    let code = seed_walk_in(&state, "Ankara").await;
    post_json(
        &state,
        "/v1/slots/2026-09-14/0/requests",
        json!({ "tour_code": code }),
    )
    .await;

    let (status, body) = delete(
        &state,
        "/v1/slots/2026-09-14/0/requests/Stranger0001",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "not_present");
}

#[tokio::test]
async fn test_replace_swaps_via_api() {
    let state = state();
    post_json(
        &state,
        "/v1/slots",
        json!({ "day": "2026-09-14", "slot_index": 0, "max_admitted": 1 }),
    )
    .await;

    let seated = seed_walk_in(&state, "Ankara").await;
    let waiting = seed_walk_in(&state, "Izmir").await;
    for code in [&seated, &waiting] {
        post_json(
            &state,
            "/v1/slots/2026-09-14/0/requests",
            json!({ "tour_code": code }),
        )
        .await;
    }

    let (status, slot) = post_json(
        &state,
        "/v1/slots/2026-09-14/0/replace",
        json!({ "admitted_code": seated, "waitlisted_code": waiting }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let admitted = slot["admitted"].as_array().unwrap();
    assert_eq!(admitted.len(), 1);
    assert_eq!(admitted[0]["tour_code"], waiting);
    assert_eq!(slot["waitlisted"].as_array().unwrap().len(), 0);

    // Swapping codes that hold no seat is a conflict
    let (status, body) = post_json(
        &state,
        "/v1/slots/2026-09-14/0/replace",
        json!({ "admitted_code": seated, "waitlisted_code": waiting }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

// == Admission Events =========================================================

#[tokio::test]
async fn test_event_log_records_decisions() {
    let state = state();
    let first = seed_walk_in(&state, "Ankara").await;
    let second = seed_walk_in(&state, "Izmir").await;
    for code in [&first, &second] {
        post_json(
            &state,
            "/v1/slots/2026-09-14/0/requests",
            json!({ "tour_code": code }),
        )
        .await;
    }

    let (status, body) = get(&state, "/v1/events/log").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    let events = body["events"].as_array().unwrap();
    assert_eq!(events[0]["kind"], "accepted");
    assert_eq!(events[0]["tour_code"], first);
    assert_eq!(events[1]["tour_code"], second);
}

// == Middleware and Routing ===================================================

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let state = state();
    let (status, _) = get(&state, "/v1/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_headers_present() {
    let state = state();
    let request = Request::builder()
        .uri("/health")
        .header("origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = create_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
