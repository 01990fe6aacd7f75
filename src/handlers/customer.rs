// src/handlers/customer.rs
//
// Área do cliente logado: só enxerga os próprios veículos e OS.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{ClientOnly, RequireRole},
        tenancy::TenantContext,
    },
    models::{
        crm::Vehicle,
        operations::{ServiceOrder, ServiceOrderFilter},
    },
};

#[utoipa::path(
    get,
    path = "/api/me/vehicles",
    tag = "Customer",
    responses(
        (status = 200, description = "Veículos do cliente logado", body = Vec<Vehicle>)
    ),
    security(("api_jwt" = []))
)]
pub async fn my_vehicles(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<ClientOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let client_id = tenant
        .client_id()
        .ok_or_else(|| AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let vehicles = app_state
        .crm_service
        .list_vehicles(&mut *conn, tenant.owner_id, Some(client_id), None)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(vehicles)))
}

#[utoipa::path(
    get,
    path = "/api/me/orders",
    tag = "Customer",
    responses(
        (status = 200, description = "OS do cliente logado", body = Vec<ServiceOrder>)
    ),
    security(("api_jwt" = []))
)]
pub async fn my_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<ClientOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let client_id = tenant
        .client_id()
        .ok_or_else(|| AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let filter = ServiceOrderFilter { client_id: Some(client_id), ..Default::default() };
    let orders = app_state
        .operation_service
        .list_orders(&mut *conn, tenant.owner_id, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(orders)))
}
