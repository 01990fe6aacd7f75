// src/handlers/portal.rs
//
// Portal do cliente: rotas públicas, sem token.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::portal::{PortalDecisionPayload, PortalNumberQuery, PortalOrder, PortalVehicleQuery},
};

#[utoipa::path(
    get,
    path = "/api/portal/orders/by-vehicle",
    tag = "Portal",
    params(PortalVehicleQuery),
    responses(
        (status = 200, description = "OS do veículo (vazio se placa ou documento não conferem)", body = Vec<PortalOrder>)
    )
)]
pub async fn find_by_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<PortalVehicleQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = app_state
        .portal_service
        .find_by_vehicle(&app_state.db_pool, &query.plate, &query.tax_id, query.workshop_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(orders)))
}

#[utoipa::path(
    get,
    path = "/api/portal/orders/by-number",
    tag = "Portal",
    params(PortalNumberQuery),
    responses(
        (status = 200, description = "OS com o número informado", body = Vec<PortalOrder>)
    )
)]
pub async fn find_by_number(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<PortalNumberQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = app_state
        .portal_service
        .find_by_number(&app_state.db_pool, &query.number, query.workshop_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(orders)))
}

#[utoipa::path(
    post,
    path = "/api/portal/orders/{order_id}/decision",
    tag = "Portal",
    request_body = PortalDecisionPayload,
    params(("order_id" = Uuid, Path, description = "ID da OS")),
    responses(
        (status = 200, description = "Orçamento aprovado ou recusado", body = PortalOrder),
        (status = 404, description = "OS não encontrada"),
        (status = 409, description = "OS não está mais aberta")
    )
)]
pub async fn decide(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<PortalDecisionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .portal_service
        .decide(&app_state.db_pool, order_id, payload.decision)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}
