// src/handlers/team.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    handlers::crm::SearchQuery,
    middleware::{
        i18n::Locale,
        rbac::{RequireRole, WorkshopAdmin},
        tenancy::TenantContext,
    },
    models::team::{EmploymentType, Mechanic, MechanicDraft},
};

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MechanicPayload {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres."))]
    #[schema(example = "Carlos Souza")]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    #[schema(example = "Injeção eletrônica")]
    pub specialty: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    pub employment_type: EmploymentType,
    pub base_salary: Option<Decimal>,
    // Percentual (0 a 100)
    pub commission_rate: Option<Decimal>,
}

impl From<MechanicPayload> for MechanicDraft {
    fn from(p: MechanicPayload) -> Self {
        MechanicDraft {
            name: p.name.trim().to_string(),
            phone: p.phone.trim().to_string(),
            email: p.email,
            specialty: p.specialty,
            active: p.active,
            employment_type: p.employment_type,
            base_salary: p.base_salary,
            commission_rate: p.commission_rate,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/team/mechanics",
    tag = "Team",
    params(SearchQuery),
    responses(
        (status = 200, description = "Mecânicos da oficina", body = Vec<Mechanic>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_mechanics(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mechanics = app_state
        .team_service
        .list_mechanics(&mut *conn, tenant.owner_id, query.search.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(mechanics)))
}

#[utoipa::path(
    get,
    path = "/api/team/mechanics/{mechanic_id}",
    tag = "Team",
    params(("mechanic_id" = Uuid, Path, description = "ID do Mecânico")),
    responses(
        (status = 200, description = "Mecânico", body = Mechanic),
        (status = 404, description = "Mecânico não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_mechanic(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(mechanic_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mechanic = app_state
        .team_service
        .get_mechanic(&mut *conn, tenant.owner_id, mechanic_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(mechanic)))
}

#[utoipa::path(
    post,
    path = "/api/team/mechanics",
    tag = "Team",
    request_body = MechanicPayload,
    responses(
        (status = 201, description = "Mecânico cadastrado", body = Mechanic)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_mechanic(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Json(payload): Json<MechanicPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let draft: MechanicDraft = payload.into();
    let mechanic = app_state
        .team_service
        .create_mechanic(&mut *conn, tenant.owner_id, &draft)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(mechanic)))
}

#[utoipa::path(
    put,
    path = "/api/team/mechanics/{mechanic_id}",
    tag = "Team",
    request_body = MechanicPayload,
    params(("mechanic_id" = Uuid, Path, description = "ID do Mecânico")),
    responses(
        (status = 200, description = "Mecânico atualizado", body = Mechanic)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_mechanic(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(mechanic_id): Path<Uuid>,
    Json(payload): Json<MechanicPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let draft: MechanicDraft = payload.into();
    let mechanic = app_state
        .team_service
        .update_mechanic(&mut *conn, tenant.owner_id, mechanic_id, &draft)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(mechanic)))
}

#[utoipa::path(
    delete,
    path = "/api/team/mechanics/{mechanic_id}",
    tag = "Team",
    params(("mechanic_id" = Uuid, Path, description = "ID do Mecânico")),
    responses(
        (status = 204, description = "Mecânico removido")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_mechanic(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(mechanic_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .team_service
        .delete_mechanic(&mut *conn, tenant.owner_id, mechanic_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
