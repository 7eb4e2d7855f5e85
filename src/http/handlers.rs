//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer or the schedule registry for business logic.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::NaiveDate;
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

use super::dto::{
    AdmissionRequest, AdmissionResponse, AssignGuideRequest, CreateSlotRequest, EventLogResponse,
    HealthResponse, RemovalResponse, ReplaceRequest, School, SchoolListResponse, SlotDto,
    SlotListQuery, SlotListResponse, Tour, TourCode, TourListResponse, TourRegistration,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{GuideId, SchoolId, SlotSummary};
use crate::db::services as db_services;
use crate::models::calendar::{SlotKey, VisitDay};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and database is accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Schools
// =============================================================================

/// POST /v1/schools
///
/// Register a school. The server assigns the ID; any ID in the payload is ignored.
pub async fn register_school(
    State(state): State<AppState>,
    Json(school): Json<School>,
) -> Result<(StatusCode, Json<School>), AppError> {
    let stored = db_services::register_school(state.repository.as_ref(), &school).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /v1/schools
///
/// List all schools on record.
pub async fn list_schools(State(state): State<AppState>) -> HandlerResult<SchoolListResponse> {
    let schools = db_services::list_schools(state.repository.as_ref()).await?;
    let total = schools.len();

    Ok(Json(SchoolListResponse { schools, total }))
}

/// GET /v1/schools/{school_id}
///
/// Get a single school by ID.
pub async fn get_school(
    State(state): State<AppState>,
    Path(school_id): Path<i64>,
) -> HandlerResult<School> {
    let school =
        db_services::get_school(state.repository.as_ref(), SchoolId::new(school_id)).await?;
    Ok(Json(school))
}

// =============================================================================
// Tours
// =============================================================================

/// POST /v1/tours
///
/// Register a tour. Validates the payload, scores the priority, issues a
/// registration code and stores the tour. Replaying the same payload returns
/// the original record.
pub async fn register_tour(
    State(state): State<AppState>,
    Json(registration): Json<TourRegistration>,
) -> Result<(StatusCode, Json<Tour>), AppError> {
    let tour = db_services::register_tour(
        state.repository.as_ref(),
        state.code_issuer.as_ref(),
        &registration,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(tour)))
}

/// GET /v1/tours
///
/// List all registered tours.
pub async fn list_tours(State(state): State<AppState>) -> HandlerResult<TourListResponse> {
    let tours = db_services::list_tours(state.repository.as_ref()).await?;
    let total = tours.len();

    Ok(Json(TourListResponse { tours, total }))
}

/// GET /v1/tours/{code}
///
/// Get a single tour by its registration code.
pub async fn get_tour(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> HandlerResult<Tour> {
    let tour = db_services::get_tour(state.repository.as_ref(), &TourCode::from(code)).await?;
    Ok(Json(tour))
}

/// PUT /v1/tours/{code}/guide
///
/// Assign a guide to a tour, or clear the assignment with a null guide.
pub async fn assign_guide(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<AssignGuideRequest>,
) -> HandlerResult<Tour> {
    let tour = db_services::assign_guide(
        state.repository.as_ref(),
        &TourCode::from(code),
        request.guide_id.map(GuideId::new),
    )
    .await?;
    Ok(Json(tour))
}

// =============================================================================
// Slots
// =============================================================================

/// POST /v1/slots
///
/// Create a slot at a calendar position.
pub async fn create_slot(
    State(state): State<AppState>,
    Json(request): Json<CreateSlotRequest>,
) -> Result<(StatusCode, Json<SlotDto>), AppError> {
    let key = SlotKey::from_parts(request.day, request.slot_index)?;
    let slot = state.registry.create_slot(key, request.max_admitted).await?;
    Ok((StatusCode::CREATED, Json(SlotDto::new(key, &slot))))
}

/// GET /v1/slots
///
/// List slots, optionally restricted to one day via `?day=YYYY-MM-DD`.
pub async fn list_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotListQuery>,
) -> HandlerResult<SlotListResponse> {
    let day = query.day.map(VisitDay::new);
    let slots = state.registry.list_slots(day).await?;

    let mut summaries = Vec::with_capacity(slots.len());
    for slot in &slots {
        let key = slot
            .key()
            .map_err(|e| AppError::Internal(format!("stored slot {}: {}", slot.id(), e)))?;
        let occupancy = slot.occupancy();
        summaries.push(SlotSummary {
            slot_id: slot.id(),
            day: key.day,
            slot_index: key.index.value(),
            max_admitted: slot.max_admitted(),
            admitted: occupancy.admitted,
            waitlisted: occupancy.waitlisted,
        });
    }
    let total = summaries.len();

    Ok(Json(SlotListResponse {
        slots: summaries,
        total,
    }))
}

/// GET /v1/slots/{day}/{index}
///
/// Get a slot with its full occupant lists.
pub async fn get_slot(
    State(state): State<AppState>,
    Path((day, index)): Path<(NaiveDate, u8)>,
) -> HandlerResult<SlotDto> {
    let key = SlotKey::from_parts(day, index)?;
    let slot = state.registry.get_slot(key).await?;
    Ok(Json(SlotDto::new(key, &slot)))
}

/// DELETE /v1/slots/{day}/{index}
///
/// Delete an empty slot.
pub async fn delete_slot(
    State(state): State<AppState>,
    Path((day, index)): Path<(NaiveDate, u8)>,
) -> Result<StatusCode, AppError> {
    let key = SlotKey::from_parts(day, index)?;
    state.registry.remove_slot(key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/slots/{day}/{index}/occupancy
///
/// Occupant counts for a slot.
pub async fn get_occupancy(
    State(state): State<AppState>,
    Path((day, index)): Path<(NaiveDate, u8)>,
) -> HandlerResult<crate::models::slot::SlotOccupancy> {
    let key = SlotKey::from_parts(day, index)?;
    let occupancy = state.registry.occupancy(key).await?;
    Ok(Json(occupancy))
}

/// POST /v1/slots/{day}/{index}/requests
///
/// Request admission of a registered tour into a slot. The slot is created
/// on demand with the default capacity.
pub async fn request_admission(
    State(state): State<AppState>,
    Path((day, index)): Path<(NaiveDate, u8)>,
    Json(request): Json<AdmissionRequest>,
) -> HandlerResult<AdmissionResponse> {
    let key = SlotKey::from_parts(day, index)?;
    let outcome = state
        .registry
        .request_admission(key, &request.tour_code)
        .await?;
    Ok(Json(outcome.into()))
}

/// DELETE /v1/slots/{day}/{index}/requests/{code}
///
/// Remove a tour from a slot. Removing an admitted tour promotes the
/// strongest waitlisted tour. Idempotent: removing an absent tour reports
/// `not_present`.
pub async fn remove_tour(
    State(state): State<AppState>,
    Path((day, index, code)): Path<(NaiveDate, u8, String)>,
) -> HandlerResult<RemovalResponse> {
    let key = SlotKey::from_parts(day, index)?;
    let outcome = state
        .registry
        .remove_tour(key, &TourCode::from(code))
        .await?;
    Ok(Json(outcome.into()))
}

/// POST /v1/slots/{day}/{index}/replace
///
/// Swap an admitted tour for a waitlisted one and return the updated slot.
pub async fn replace_tour(
    State(state): State<AppState>,
    Path((day, index)): Path<(NaiveDate, u8)>,
    Json(request): Json<ReplaceRequest>,
) -> HandlerResult<SlotDto> {
    let key = SlotKey::from_parts(day, index)?;
    state
        .registry
        .replace_tour(key, &request.admitted_code, &request.waitlisted_code)
        .await?;
    let slot = state.registry.get_slot(key).await?;
    Ok(Json(SlotDto::new(key, &slot)))
}

// =============================================================================
// Admission Events
// =============================================================================

/// GET /v1/events/log
///
/// Recent admission events, oldest first.
pub async fn get_event_log(State(state): State<AppState>) -> HandlerResult<EventLogResponse> {
    let events = state.outbox.recent();
    let total = events.len();

    Ok(Json(EventLogResponse { events, total }))
}

/// GET /v1/events
///
/// Stream admission events via Server-Sent Events (SSE).
pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut receiver = state.outbox.subscribe();
    let stream = async_stream::stream! {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let name = event.kind.to_string();
                    let data = serde_json::to_string(&event).unwrap_or_default();
                    yield Ok(Event::default().event(name).data(data));
                }
                // A lagged subscriber skips the missed events; the bounded
                // log endpoint still has them.
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(1))
            .text("keep-alive"),
    )
}
