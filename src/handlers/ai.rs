// src/handlers/ai.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{RequireRole, WorkshopAdmin, WorkshopStaff},
        tenancy::TenantContext,
    },
    models::ai::{AiTextResponse, DiagnosisRequest, NcmRequest, NcmSuggestion},
};

// Lançamentos recentes enviados como contexto do relatório
const REPORT_RECENT_LIMIT: i64 = 20;

#[utoipa::path(
    post,
    path = "/api/ai/diagnosis",
    tag = "AI",
    request_body = DiagnosisRequest,
    responses(
        (status = 200, description = "Diagnóstico em markdown", body = AiTextResponse),
        (status = 503, description = "IA não configurada")
    ),
    security(("api_jwt" = []))
)]
pub async fn diagnose(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<WorkshopStaff>,
    Json(payload): Json<DiagnosisRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let content = app_state
        .ai_service
        .diagnose(&payload.issue, &payload.vehicle_model, &locale.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(AiTextResponse { content })))
}

#[utoipa::path(
    post,
    path = "/api/ai/financial-report",
    tag = "AI",
    responses(
        (status = 200, description = "Análise financeira em markdown", body = AiTextResponse),
        (status = 503, description = "IA não configurada")
    ),
    security(("api_jwt" = []))
)]
pub async fn financial_report(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
) -> Result<impl IntoResponse, ApiError> {
    if !app_state.ai_service.is_configured() {
        return Err(AppError::AiNotConfigured.to_api_error(&locale, &app_state.i18n_store));
    }

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let summary = app_state
        .finance_service
        .summary(&mut *conn, tenant.owner_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    let recent = app_state
        .finance_service
        .list_recent(&mut *conn, tenant.owner_id, REPORT_RECENT_LIMIT)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Libera a conexão antes da chamada externa
    drop(conn);

    let content = app_state
        .ai_service
        .financial_report(&summary, &recent, &locale.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(AiTextResponse { content })))
}

#[utoipa::path(
    post,
    path = "/api/ai/ncm",
    tag = "AI",
    request_body = NcmRequest,
    responses(
        (status = 200, description = "Sugestão de NCM", body = NcmSuggestion),
        (status = 502, description = "Resposta inválida da IA")
    ),
    security(("api_jwt" = []))
)]
pub async fn classify_ncm(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<WorkshopAdmin>,
    Json(payload): Json<NcmRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let suggestion = app_state
        .ai_service
        .classify_ncm(&payload.product_name)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(suggestion)))
}
