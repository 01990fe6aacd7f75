// src/handlers/crm.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
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
    models::crm::{Client, Vehicle},
    services::crm_service::VehicleFields,
};

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePayload {
    #[validate(length(min = 1, message = "A marca é obrigatória."))]
    #[schema(example = "Honda")]
    pub brand: String,
    #[validate(length(min = 1, message = "O modelo é obrigatório."))]
    #[schema(example = "CB 500F")]
    pub model: String,
    #[validate(range(min = 1900, max = 2100, message = "Ano inválido."))]
    #[schema(example = 2022)]
    pub year: i32,
    #[validate(length(min = 1, message = "A placa é obrigatória."))]
    #[schema(example = "ABC1D23")]
    pub plate: String,
    #[serde(default)]
    pub color: String,
}

impl VehiclePayload {
    fn fields(&self) -> VehicleFields {
        VehicleFields {
            brand: self.brand.clone(),
            model: self.model.clone(),
            year: self.year,
            plate: self.plate.clone(),
            color: self.color.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientPayload {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres."))]
    #[schema(example = "João da Silva")]
    pub name: String,
    #[serde(default)]
    #[schema(example = "(11) 98888-7777")]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[schema(example = "123.456.789-00")]
    pub tax_id: Option<String>,
    // Só usado no cadastro
    #[validate(nested)]
    pub vehicle: Option<VehiclePayload>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehiclePayload {
    pub client_id: Uuid,
    #[serde(flatten)]
    #[validate(nested)]
    pub vehicle: VehiclePayload,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClientCreated {
    pub client: Client,
    pub vehicle: Option<Vehicle>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Busca por nome, telefone, documento...
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct VehicleQuery {
    pub client_id: Option<Uuid>,
    pub search: Option<String>,
}

// =============================================================================
//  CLIENTES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "CRM",
    params(SearchQuery),
    responses(
        (status = 200, description = "Clientes da oficina", body = Vec<Client>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopStaff>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let clients = app_state
        .crm_service
        .list_clients(&mut *conn, tenant.owner_id, query.search.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(clients)))
}

#[utoipa::path(
    get,
    path = "/api/clients/{client_id}",
    tag = "CRM",
    params(("client_id" = Uuid, Path, description = "ID do Cliente")),
    responses(
        (status = 200, description = "Cliente", body = Client),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_client(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopStaff>,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let client = app_state
        .crm_service
        .get_client(&mut *conn, tenant.owner_id, client_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(client)))
}

#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "CRM",
    request_body = ClientPayload,
    responses(
        (status = 201, description = "Cliente (e primeiro veículo) cadastrado", body = ClientCreated)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let first_vehicle = payload.vehicle.as_ref().map(VehiclePayload::fields);

    let (client, vehicle) = app_state
        .crm_service
        .create_client(
            &mut *conn,
            tenant.owner_id,
            &payload.name,
            &payload.phone,
            &payload.email,
            payload.tax_id.as_deref(),
            first_vehicle.as_ref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(ClientCreated { client, vehicle })))
}

#[utoipa::path(
    put,
    path = "/api/clients/{client_id}",
    tag = "CRM",
    request_body = ClientPayload,
    params(("client_id" = Uuid, Path, description = "ID do Cliente")),
    responses(
        (status = 200, description = "Cliente atualizado", body = Client)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_client(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let client = app_state
        .crm_service
        .update_client(
            &mut *conn,
            tenant.owner_id,
            client_id,
            &payload.name,
            &payload.phone,
            &payload.email,
            payload.tax_id.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(client)))
}

#[utoipa::path(
    delete,
    path = "/api/clients/{client_id}",
    tag = "CRM",
    params(("client_id" = Uuid, Path, description = "ID do Cliente")),
    responses(
        (status = 204, description = "Cliente removido"),
        (status = 409, description = "Cliente possui veículos ou documentos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_client(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .crm_service
        .delete_client(&mut *conn, tenant.owner_id, client_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/clients/{client_id}/vehicles",
    tag = "CRM",
    params(("client_id" = Uuid, Path, description = "ID do Cliente")),
    responses(
        (status = 200, description = "Veículos do cliente", body = Vec<Vehicle>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_client_vehicles(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopStaff>,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
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

// =============================================================================
//  VEÍCULOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/vehicles",
    tag = "CRM",
    params(VehicleQuery),
    responses(
        (status = 200, description = "Veículos da oficina", body = Vec<Vehicle>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_vehicles(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopStaff>,
    Query(query): Query<VehicleQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let vehicles = app_state
        .crm_service
        .list_vehicles(&mut *conn, tenant.owner_id, query.client_id, query.search.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(vehicles)))
}

#[utoipa::path(
    get,
    path = "/api/vehicles/{vehicle_id}",
    tag = "CRM",
    params(("vehicle_id" = Uuid, Path, description = "ID do Veículo")),
    responses(
        (status = 200, description = "Veículo", body = Vehicle),
        (status = 404, description = "Veículo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopStaff>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let vehicle = app_state
        .crm_service
        .get_vehicle(&mut *conn, tenant.owner_id, vehicle_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(vehicle)))
}

#[utoipa::path(
    post,
    path = "/api/vehicles",
    tag = "CRM",
    request_body = CreateVehiclePayload,
    responses(
        (status = 201, description = "Veículo cadastrado", body = Vehicle),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Json(payload): Json<CreateVehiclePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let vehicle = app_state
        .crm_service
        .create_vehicle(&mut *conn, tenant.owner_id, payload.client_id, &payload.vehicle.fields())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(vehicle)))
}

#[utoipa::path(
    put,
    path = "/api/vehicles/{vehicle_id}",
    tag = "CRM",
    request_body = CreateVehiclePayload,
    params(("vehicle_id" = Uuid, Path, description = "ID do Veículo")),
    responses(
        (status = 200, description = "Veículo atualizado", body = Vehicle)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(vehicle_id): Path<Uuid>,
    Json(payload): Json<CreateVehiclePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let vehicle = app_state
        .crm_service
        .update_vehicle(&mut *conn, tenant.owner_id, vehicle_id, payload.client_id, &payload.vehicle.fields())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(vehicle)))
}

#[utoipa::path(
    delete,
    path = "/api/vehicles/{vehicle_id}",
    tag = "CRM",
    params(("vehicle_id" = Uuid, Path, description = "ID do Veículo")),
    responses(
        (status = 204, description = "Veículo removido"),
        (status = 409, description = "Veículo possui ordens de serviço")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .crm_service
        .delete_vehicle(&mut *conn, tenant.owner_id, vehicle_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_payload_validates_nested_vehicle() {
        let payload: ClientPayload = serde_json::from_value(json!({
            "name": "João da Silva",
            "phone": "11988887777",
            "vehicle": { "brand": "Honda", "model": "CB 500F", "year": 1800, "plate": "abc1d23" }
        }))
        .unwrap();

        assert!(payload.validate().is_err());
    }

    #[test]
    fn create_vehicle_payload_reads_flattened_fields() {
        let client_id = Uuid::new_v4();
        let payload: CreateVehiclePayload = serde_json::from_value(json!({
            "clientId": client_id,
            "brand": "Yamaha",
            "model": "MT-07",
            "year": 2021,
            "plate": "xyz9a87",
            "color": "Azul"
        }))
        .unwrap();

        assert!(payload.validate().is_ok());
        assert_eq!(payload.client_id, client_id);
        assert_eq!(payload.vehicle.fields().model, "MT-07");
    }
}
