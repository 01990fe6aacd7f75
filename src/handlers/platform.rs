// src/handlers/platform.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PlatformAdminOnly, RequireRole},
    },
    models::{
        auth::User,
        platform::{SetUserActivePayload, WorkshopStats},
    },
};

#[utoipa::path(
    get,
    path = "/api/platform/users",
    tag = "Platform",
    responses(
        (status = 200, description = "Todos os usuários", body = Vec<User>),
        (status = 403, description = "Somente o admin da plataforma")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<PlatformAdminOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .platform_service
        .list_users(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(users)))
}

#[utoipa::path(
    patch,
    path = "/api/platform/users/{user_id}/active",
    tag = "Platform",
    request_body = SetUserActivePayload,
    params(("user_id" = Uuid, Path, description = "ID do Usuário")),
    responses(
        (status = 200, description = "Usuário ativado/desativado", body = User)
    ),
    security(("api_jwt" = []))
)]
pub async fn set_user_active(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<PlatformAdminOnly>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<SetUserActivePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .platform_service
        .set_user_active(&app_state.db_pool, user_id, payload.is_active)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/platform/workshops",
    tag = "Platform",
    responses(
        (status = 200, description = "Contagem de documentos por oficina", body = Vec<WorkshopStats>)
    ),
    security(("api_jwt" = []))
)]
pub async fn workshop_stats(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<PlatformAdminOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .platform_service
        .workshop_stats(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stats)))
}
