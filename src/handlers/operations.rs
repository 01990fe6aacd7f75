// src/handlers/operations.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{MechanicOnly, RequireRole, WorkshopAdmin},
        tenancy::TenantContext,
    },
    models::operations::{
        validate_amount, LineItem, OsStatus, MAX_QUANTITY, PaymentMethod, Sale, SaleStatus, SalesReport, ServiceOrder, ServiceOrderFilter,
    },
    services::operation_service::{CartLine, OrderInput, SaleInput},
};

fn validate_quantity_delta(val: i32) -> Result<(), ValidationError> {
    if val.unsigned_abs() > MAX_QUANTITY.unsigned_abs() {
        let mut err = ValidationError::new("range");
        err.message = Some("Variação de quantidade fora do permitido.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payloads: OS
// ---

fn default_os_status() -> OsStatus {
    OsStatus::Open
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub client_id: Uuid,
    pub vehicle_id: Uuid,
    pub mechanic_id: Option<Uuid>,
    #[serde(default = "default_os_status")]
    pub status: OsStatus,
    #[serde(default)]
    #[schema(example = "Barulho na corrente")]
    pub description: String,
    // Anotações do checklist de entrada
    #[serde(default)]
    pub body_lines: Vec<String>,
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<LineItem>,
}

impl From<OrderPayload> for OrderInput {
    fn from(p: OrderPayload) -> Self {
        OrderInput {
            client_id: p.client_id,
            vehicle_id: p.vehicle_id,
            mechanic_id: p.mechanic_id,
            status: p.status,
            description: p.description,
            body_lines: p.body_lines,
            items: p.items,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderStatusPayload {
    pub status: OsStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddProductPayload {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 100_000, message = "A quantidade deve estar entre 1 e 100000."))]
    #[schema(example = 1)]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct QuantityDeltaPayload {
    #[validate(custom(function = "validate_quantity_delta"))]
    #[schema(example = -1)]
    pub delta: i32,
}

// ---
// Payloads: Vendas
// ---

fn default_sale_status() -> SaleStatus {
    SaleStatus::Quote
}

fn default_payment_method() -> PaymentMethod {
    PaymentMethod::Cash
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalePayload {
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, message = "A venda precisa de ao menos um item."), nested)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    #[validate(custom(function = "validate_amount"))]
    #[schema(example = "10.00")]
    pub global_discount: Decimal,
    #[serde(default = "default_sale_status")]
    pub status: SaleStatus,
    #[serde(default = "default_payment_method")]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub is_installments: bool,
    #[validate(range(min = 1, max = 48, message = "Número de parcelas inválido."))]
    pub installments_count: Option<i32>,
}

impl From<SalePayload> for SaleInput {
    fn from(p: SalePayload) -> Self {
        SaleInput {
            client_id: p.client_id,
            items: p.items,
            global_discount: p.global_discount,
            status: p.status,
            payment_method: p.payment_method,
            is_installments: p.is_installments,
            installments_count: p.installments_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLinePayload {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 100_000, message = "A quantidade deve estar entre 1 e 100000."))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, message = "O carrinho está vazio."), nested)]
    pub items: Vec<CartLinePayload>,
    #[serde(default = "default_payment_method")]
    pub payment_method: PaymentMethod,
    #[validate(range(min = 1, max = 48, message = "Número de parcelas inválido."))]
    pub installments_count: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SaleListQuery {
    pub status: Option<SaleStatus>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReportQuery {
    /// Início do período (RFC 3339)
    pub from: DateTime<Utc>,
    /// Fim do período (RFC 3339)
    pub to: DateTime<Utc>,
}

fn mechanic_of(tenant: &TenantContext) -> Result<Uuid, AppError> {
    tenant.mechanic_id().ok_or(AppError::Forbidden)
}

// =============================================================================
//  ORDENS DE SERVIÇO
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Operations",
    params(ServiceOrderFilter),
    responses(
        (status = 200, description = "Ordens de serviço", body = Vec<ServiceOrder>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Query(filter): Query<ServiceOrderFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let orders = app_state
        .operation_service
        .list_orders(&mut *conn, tenant.owner_id, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(orders)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{order_id}",
    tag = "Operations",
    params(("order_id" = Uuid, Path, description = "ID da OS")),
    responses(
        (status = 200, description = "Ordem de serviço", body = ServiceOrder),
        (status = 404, description = "OS não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .operation_service
        .get_order(&mut *conn, tenant.owner_id, order_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Cliente só enxerga as próprias OS
    if tenant.client_id().is_some_and(|client_id| client_id != order.client_id) {
        return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store));
    }

    Ok((StatusCode::OK, Json(order)))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Operations",
    request_body = OrderPayload,
    responses(
        (status = 201, description = "OS criada (fatura se já nascer finalizada)", body = ServiceOrder),
        (status = 409, description = "Estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Json(payload): Json<OrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .operation_service
        .create_order(&mut *conn, tenant.owner_id, payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    put,
    path = "/api/orders/{order_id}",
    tag = "Operations",
    request_body = OrderPayload,
    params(("order_id" = Uuid, Path, description = "ID da OS")),
    responses(
        (status = 200, description = "OS atualizada", body = ServiceOrder)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_order(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<OrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .operation_service
        .update_order(&mut *conn, tenant.owner_id, order_id, payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{order_id}/status",
    tag = "Operations",
    request_body = OrderStatusPayload,
    params(("order_id" = Uuid, Path, description = "ID da OS")),
    responses(
        (status = 200, description = "Status alterado", body = ServiceOrder)
    ),
    security(("api_jwt" = []))
)]
pub async fn change_order_status(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<OrderStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .operation_service
        .change_order_status(&mut *conn, tenant.owner_id, order_id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{order_id}",
    tag = "Operations",
    params(("order_id" = Uuid, Path, description = "ID da OS")),
    responses(
        (status = 204, description = "OS removida")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_order(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .operation_service
        .delete_order(&mut *conn, tenant.owner_id, order_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  BANCADA DO MECÂNICO
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/mechanic/orders/open",
    tag = "Mechanic",
    responses(
        (status = 200, description = "OS abertas disponíveis", body = Vec<ServiceOrder>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_open_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<MechanicOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let orders = app_state
        .operation_service
        .list_open_orders(&mut *conn, tenant.owner_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(orders)))
}

#[utoipa::path(
    get,
    path = "/api/mechanic/orders/mine",
    tag = "Mechanic",
    responses(
        (status = 200, description = "OS em andamento do mecânico", body = Vec<ServiceOrder>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_my_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<MechanicOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let mechanic_id = mechanic_of(&tenant).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let orders = app_state
        .operation_service
        .list_my_orders(&mut *conn, tenant.owner_id, mechanic_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(orders)))
}

#[utoipa::path(
    post,
    path = "/api/mechanic/orders/{order_id}/start",
    tag = "Mechanic",
    params(("order_id" = Uuid, Path, description = "ID da OS")),
    responses(
        (status = 200, description = "OS assumida (IN_PROGRESS)", body = ServiceOrder),
        (status = 409, description = "OS já assumida ou não está aberta")
    ),
    security(("api_jwt" = []))
)]
pub async fn start_order(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<MechanicOnly>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mechanic_id = mechanic_of(&tenant).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .operation_service
        .start_order(&mut *conn, tenant.owner_id, order_id, mechanic_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

#[utoipa::path(
    post,
    path = "/api/mechanic/orders/{order_id}/finish",
    tag = "Mechanic",
    params(("order_id" = Uuid, Path, description = "ID da OS")),
    responses(
        (status = 200, description = "OS finalizada e faturada", body = ServiceOrder),
        (status = 403, description = "OS de outro mecânico")
    ),
    security(("api_jwt" = []))
)]
pub async fn finish_order(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<MechanicOnly>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mechanic_id = mechanic_of(&tenant).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .operation_service
        .finish_order(&mut *conn, tenant.owner_id, order_id, mechanic_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

#[utoipa::path(
    post,
    path = "/api/mechanic/orders/{order_id}/items",
    tag = "Mechanic",
    request_body = AddProductPayload,
    params(("order_id" = Uuid, Path, description = "ID da OS")),
    responses(
        (status = 200, description = "Peça adicionada", body = ServiceOrder)
    ),
    security(("api_jwt" = []))
)]
pub async fn add_order_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<MechanicOnly>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<AddProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;
    let mechanic_id = mechanic_of(&tenant).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .operation_service
        .add_product_to_order(&mut *conn, tenant.owner_id, order_id, mechanic_id, payload.product_id, payload.quantity)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

#[utoipa::path(
    patch,
    path = "/api/mechanic/orders/{order_id}/items/{product_id}",
    tag = "Mechanic",
    request_body = QuantityDeltaPayload,
    params(
        ("order_id" = Uuid, Path, description = "ID da OS"),
        ("product_id" = Uuid, Path, description = "ID do Produto")
    ),
    responses(
        (status = 200, description = "Quantidade alterada", body = ServiceOrder)
    ),
    security(("api_jwt" = []))
)]
pub async fn change_order_product_quantity(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<MechanicOnly>,
    Path((order_id, product_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<QuantityDeltaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;
    let mechanic_id = mechanic_of(&tenant).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .operation_service
        .change_product_quantity(&mut *conn, tenant.owner_id, order_id, mechanic_id, product_id, payload.delta)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

#[utoipa::path(
    delete,
    path = "/api/mechanic/orders/{order_id}/items/{product_id}",
    tag = "Mechanic",
    params(
        ("order_id" = Uuid, Path, description = "ID da OS"),
        ("product_id" = Uuid, Path, description = "ID do Produto")
    ),
    responses(
        (status = 200, description = "Peça removida", body = ServiceOrder)
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_order_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<MechanicOnly>,
    Path((order_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let mechanic_id = mechanic_of(&tenant).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .operation_service
        .remove_product_from_order(&mut *conn, tenant.owner_id, order_id, mechanic_id, product_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

// =============================================================================
//  VENDAS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/sales",
    tag = "Sales",
    params(SaleListQuery),
    responses(
        (status = 200, description = "Vendas", body = Vec<Sale>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_sales(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Query(query): Query<SaleListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let sales = app_state
        .operation_service
        .list_sales(&mut *conn, tenant.owner_id, query.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sales)))
}

#[utoipa::path(
    get,
    path = "/api/sales/{sale_id}",
    tag = "Sales",
    params(("sale_id" = Uuid, Path, description = "ID da Venda")),
    responses(
        (status = 200, description = "Venda", body = Sale),
        (status = 404, description = "Venda não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(sale_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let sale = app_state
        .operation_service
        .get_sale(&mut *conn, tenant.owner_id, sale_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sale)))
}

#[utoipa::path(
    post,
    path = "/api/sales",
    tag = "Sales",
    request_body = SalePayload,
    responses(
        (status = 201, description = "Venda criada (fatura se FINALIZED)", body = Sale)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Json(payload): Json<SalePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let sale = app_state
        .operation_service
        .create_sale(&mut *conn, tenant.owner_id, tenant.user_id, payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(sale)))
}

#[utoipa::path(
    put,
    path = "/api/sales/{sale_id}",
    tag = "Sales",
    request_body = SalePayload,
    params(("sale_id" = Uuid, Path, description = "ID da Venda")),
    responses(
        (status = 200, description = "Venda atualizada", body = Sale),
        (status = 409, description = "Venda já finalizada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(sale_id): Path<Uuid>,
    Json(payload): Json<SalePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let sale = app_state
        .operation_service
        .update_sale(&mut *conn, tenant.owner_id, sale_id, payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sale)))
}

#[utoipa::path(
    post,
    path = "/api/sales/{sale_id}/finalize",
    tag = "Sales",
    params(("sale_id" = Uuid, Path, description = "ID da Venda")),
    responses(
        (status = 200, description = "Venda finalizada e faturada", body = Sale),
        (status = 409, description = "Estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn finalize_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(sale_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let sale = app_state
        .operation_service
        .finalize_sale(&mut *conn, tenant.owner_id, sale_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sale)))
}

#[utoipa::path(
    post,
    path = "/api/sales/{sale_id}/cancel",
    tag = "Sales",
    params(("sale_id" = Uuid, Path, description = "ID da Venda")),
    responses(
        (status = 200, description = "Venda cancelada", body = Sale)
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(sale_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let sale = app_state
        .operation_service
        .cancel_sale(&mut *conn, tenant.owner_id, sale_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sale)))
}

#[utoipa::path(
    delete,
    path = "/api/sales/{sale_id}",
    tag = "Sales",
    params(("sale_id" = Uuid, Path, description = "ID da Venda")),
    responses(
        (status = 204, description = "Venda removida")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(sale_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .operation_service
        .delete_sale(&mut *conn, tenant.owner_id, sale_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/pos/checkout",
    tag = "Sales",
    request_body = CheckoutPayload,
    responses(
        (status = 201, description = "Venda do PDV finalizada", body = Sale),
        (status = 409, description = "Estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn checkout(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Json(payload): Json<CheckoutPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let cart: Vec<CartLine> = payload
        .items
        .iter()
        .map(|line| CartLine { product_id: line.product_id, quantity: line.quantity })
        .collect();

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let sale = app_state
        .operation_service
        .checkout(
            &mut *conn,
            tenant.owner_id,
            tenant.user_id,
            payload.client_id,
            &cart,
            payload.payment_method,
            payload.installments_count,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(sale)))
}

#[utoipa::path(
    get,
    path = "/api/reports/sales",
    tag = "Sales",
    params(ReportQuery),
    responses(
        (status = 200, description = "Resumo de vendas do período", body = SalesReport)
    ),
    security(("api_jwt" = []))
)]
pub async fn sales_report(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let report = app_state
        .operation_service
        .sales_report(&mut *conn, tenant.owner_id, query.from, query.to)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn order_payload_defaults_to_open() {
        let payload: OrderPayload = serde_json::from_value(json!({
            "clientId": Uuid::new_v4(),
            "vehicleId": Uuid::new_v4(),
            "description": "Revisão"
        }))
        .unwrap();

        assert_eq!(payload.status, OsStatus::Open);
        assert!(payload.items.is_empty());
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn sale_payload_requires_items_and_valid_installments() {
        let payload: SalePayload = serde_json::from_value(json!({
            "items": [],
            "installmentsCount": 0
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("items"));
        assert!(errors.field_errors().contains_key("installments_count"));
        assert_eq!(payload.status, SaleStatus::Quote);
        assert_eq!(payload.payment_method, PaymentMethod::Cash);
    }

    #[test]
    fn mechanic_id_comes_from_the_role() {
        let tenant = TenantContext {
            owner_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            access: crate::models::auth::AccessRole::Admin { owner_id: Uuid::new_v4() },
        };
        assert!(matches!(mechanic_of(&tenant), Err(AppError::Forbidden)));
    }

    #[test]
    fn quantities_are_bounded() {
        assert!(QuantityDeltaPayload { delta: -3 }.validate().is_ok());
        assert!(QuantityDeltaPayload { delta: i32::MAX }.validate().is_err());
        assert!(QuantityDeltaPayload { delta: i32::MIN }.validate().is_err());

        let line = CartLinePayload { product_id: Uuid::new_v4(), quantity: MAX_QUANTITY + 1 };
        assert!(line.validate().is_err());
        let add = AddProductPayload { product_id: Uuid::new_v4(), quantity: MAX_QUANTITY };
        assert!(add.validate().is_ok());
    }

    #[test]
    fn sale_payload_bounds_global_discount() {
        let payload: SalePayload = serde_json::from_value(json!({
            "items": [{"name": "Filtro", "quantity": 1, "price": 30, "type": "PRODUCT"}],
            "globalDiscount": -1
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("global_discount"));
    }
}
