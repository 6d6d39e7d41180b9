use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use shared::*;
use tracing::error;
use uuid::Uuid;

use crate::orchestrator::ReservationOrchestrator;
use crate::store::CompanyLookup;

/// Header carrying the authenticated user, set by the auth layer in front of
/// this service.
pub const USER_ID_HEADER: &str = "user_id";

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ReservationOrchestrator>,
    pub companies: Arc<dyn CompanyLookup>,
}

/// `POST /equipment` accepts a single booking or an array of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CreateEquipmentRequest {
    Many(Vec<NewReservation>),
    One(NewReservation),
}

#[derive(Debug, Deserialize)]
pub struct ListEquipmentQuery {
    #[serde(rename = "sortBy", default)]
    pub sort_by: ReservationSort,
}

type ApiError = (StatusCode, Json<ApiResponse<()>>);

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/equipment",
            get(get_equipment)
                .post(create_equipment)
                .put(update_equipment)
                .delete(delete_equipment),
        )
        .route(
            "/equipment/:id",
            get(get_equipment_by_id)
                .put(update_equipment_by_id)
                .delete(delete_equipment_by_id),
        )
        .route("/projects/:project_id/equipment", get(get_project_equipment))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

fn error_response(err: ReservationError) -> ApiError {
    let status = match &err {
        ReservationError::NotFound { .. } => StatusCode::NOT_FOUND,
        ReservationError::DateRange(_) | ReservationError::Overbooking(_) => StatusCode::CONFLICT,
        ReservationError::Store(StoreError::UniqueViolation) => StatusCode::CONFLICT,
        // an update pointing at a project or item that does not exist
        ReservationError::Store(StoreError::ForeignKeyViolation(_)) => StatusCode::NOT_FOUND,
        ReservationError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Reservation store failure: {}", err);
    }
    (status, Json(ApiResponse::failed(err.to_string())))
}

/// Resolves the company owned by the calling user.
async fn tenant(state: &AppState, headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let forbidden = || {
        (
            StatusCode::FORBIDDEN,
            Json(ApiResponse {
                success: false,
                data: None,
                message: Some("Create Company workspace first.".to_string()),
                error: None,
            }),
        )
    };

    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(forbidden)?;

    match state.companies.company_for_user(user_id).await {
        Ok(Some(company)) => Ok(company.id),
        Ok(None) => Err(forbidden()),
        Err(e) => Err(error_response(e.into())),
    }
}

pub async fn create_equipment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateEquipmentRequest>,
) -> Result<Response, ApiError> {
    let tenant_id = tenant(&state, &headers).await?;

    match request {
        CreateEquipmentRequest::One(candidate) => {
            let reservation = state
                .orchestrator
                .create_reservation(tenant_id, candidate)
                .await
                .map_err(error_response)?;
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::success(reservation, "Equipment added.")),
            )
                .into_response())
        }
        CreateEquipmentRequest::Many(candidates) => {
            let payload = state
                .orchestrator
                .create_reservations(tenant_id, candidates)
                .await
                .map_err(error_response)?;
            let message = format!("{} equipment added.", payload.count);
            Ok((StatusCode::CREATED, Json(ApiResponse::success(payload, message))).into_response())
        }
    }
}

pub async fn get_equipment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListEquipmentQuery>,
) -> Result<Json<ApiResponse<Vec<Reservation>>>, ApiError> {
    let tenant_id = tenant(&state, &headers).await?;

    let reservations = state
        .orchestrator
        .get_reservations(tenant_id, query.sort_by)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::data(reservations)))
}

pub async fn get_equipment_by_id(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let tenant_id = tenant(&state, &headers).await?;

    let reservation = state
        .orchestrator
        .get_reservation_by_id(tenant_id, id)
        .await
        .map_err(error_response)?;
    match reservation {
        Some(reservation) => Ok(Json(ApiResponse::data(reservation)).into_response()),
        None => Ok((StatusCode::NOT_FOUND, Json(ApiResponse::not_found())).into_response()),
    }
}

pub async fn get_project_equipment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Reservation>>>, ApiError> {
    let tenant_id = tenant(&state, &headers).await?;

    let reservations = state
        .orchestrator
        .get_reservations_by_project(tenant_id, project_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::data(reservations)))
}

pub async fn update_equipment_by_id(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(update): Json<ReservationUpdate>,
) -> Result<Json<ApiResponse<Reservation>>, ApiError> {
    let tenant_id = tenant(&state, &headers).await?;

    let reservation = state
        .orchestrator
        .update_reservation_by_id(tenant_id, id, update)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(reservation, "Equipment updated successfully")))
}

pub async fn update_equipment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(entries): Json<Vec<ReservationUpdateEntry>>,
) -> Result<Json<ApiResponse<BatchPayload>>, ApiError> {
    let tenant_id = tenant(&state, &headers).await?;

    let payload = state
        .orchestrator
        .update_reservations(tenant_id, entries)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(payload, "Equipment updated successfully")))
}

pub async fn delete_equipment_by_id(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Reservation>>, ApiError> {
    let tenant_id = tenant(&state, &headers).await?;

    let reservation = state
        .orchestrator
        .delete_reservation_by_id(tenant_id, id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(reservation, "Equipment deleted successfully")))
}

pub async fn delete_equipment(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<BatchPayload>>, ApiError> {
    let tenant_id = tenant(&state, &headers).await?;

    let payload = state
        .orchestrator
        .delete_reservations_for_tenant(tenant_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(payload, "Equipment deleted successfully")))
}

pub async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_by_kind() {
        let status = |e: StoreError| error_response(ReservationError::Store(e)).0;
        assert_eq!(
            status(StoreError::ForeignKeyViolation("project_equipment_item_id_fkey".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status(StoreError::UniqueViolation), StatusCode::CONFLICT);
        assert_eq!(
            status(StoreError::Connection("refused".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
