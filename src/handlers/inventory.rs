// src/handlers/inventory.rs

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
use validator::{Validate, ValidationError};

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    db::inventory_repo::{CatalogServiceDraft, ProductDraft},
    handlers::crm::SearchQuery,
    middleware::{
        i18n::Locale,
        rbac::{RequireRole, WorkshopAdmin, WorkshopStaff},
        tenancy::TenantContext,
    },
    models::inventory::{CatalogService, Product},
};

// ---
// Validação Customizada
// ---
fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_non_zero(val: i32) -> Result<(), ValidationError> {
    if val == 0 {
        let mut err = ValidationError::new("non_zero");
        err.message = Some("Informe uma quantidade diferente de zero.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Óleo Motul 10W40")]
    pub name: String,

    #[validate(length(min = 1, message = "O SKU é obrigatório."))]
    #[schema(example = "OIL-001")]
    pub sku: String,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "65.90")]
    pub price: Decimal,

    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub cost_price: Decimal,

    #[serde(default)]
    #[validate(range(min = 0, message = "O estoque não pode ser negativo."))]
    pub stock: i32,

    #[serde(default)]
    #[validate(range(min = 0, message = "O estoque mínimo não pode ser negativo."))]
    pub min_stock: i32,

    #[schema(example = "2710.19.32")]
    pub ncm: Option<String>,
}

impl From<ProductPayload> for ProductDraft {
    fn from(p: ProductPayload) -> Self {
        ProductDraft {
            name: p.name.trim().to_string(),
            sku: p.sku,
            price: p.price,
            cost_price: p.cost_price,
            stock: p.stock,
            min_stock: p.min_stock,
            ncm: p.ncm.filter(|n| !n.trim().is_empty()),
        }
    }
}

// Entrada (positivo) ou saída (negativo) manual de estoque
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdjustStockPayload {
    #[validate(custom(function = "validate_non_zero"))]
    #[schema(example = 5)]
    pub delta: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogServicePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Troca de óleo")]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "80.00")]
    pub price: Decimal,
    pub category: Option<String>,
    #[schema(example = "1h")]
    pub estimated_time: Option<String>,
}

impl From<CatalogServicePayload> for CatalogServiceDraft {
    fn from(p: CatalogServicePayload) -> Self {
        CatalogServiceDraft {
            name: p.name.trim().to_string(),
            description: p.description,
            price: p.price,
            category: p.category,
            estimated_time: p.estimated_time,
        }
    }
}

// =============================================================================
//  PRODUTOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Inventory",
    params(SearchQuery),
    responses(
        (status = 200, description = "Produtos da oficina", body = Vec<Product>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopStaff>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let products = app_state
        .inventory_service
        .list_products(&mut *conn, tenant.owner_id, query.search.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(products)))
}

#[utoipa::path(
    get,
    path = "/api/products/low-stock",
    tag = "Inventory",
    responses(
        (status = 200, description = "Produtos com estoque <= mínimo", body = Vec<Product>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_low_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopStaff>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let products = app_state
        .inventory_service
        .list_low_stock(&mut *conn, tenant.owner_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(products)))
}

#[utoipa::path(
    get,
    path = "/api/products/{product_id}",
    tag = "Inventory",
    params(("product_id" = Uuid, Path, description = "ID do Produto")),
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopStaff>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .inventory_service
        .get_product(&mut *conn, tenant.owner_id, product_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(product)))
}

#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Inventory",
    request_body = ProductPayload,
    responses(
        (status = 201, description = "Produto cadastrado", body = Product),
        (status = 409, description = "SKU já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .inventory_service
        .create_product(&mut *conn, tenant.owner_id, payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/api/products/{product_id}",
    tag = "Inventory",
    request_body = ProductPayload,
    params(("product_id" = Uuid, Path, description = "ID do Produto")),
    responses(
        (status = 200, description = "Produto atualizado", body = Product)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .inventory_service
        .update_product(&mut *conn, tenant.owner_id, product_id, payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(product)))
}

#[utoipa::path(
    delete,
    path = "/api/products/{product_id}",
    tag = "Inventory",
    params(("product_id" = Uuid, Path, description = "ID do Produto")),
    responses(
        (status = 204, description = "Produto removido")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .inventory_service
        .delete_product(&mut *conn, tenant.owner_id, product_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/products/{product_id}/stock",
    tag = "Inventory",
    request_body = AdjustStockPayload,
    params(("product_id" = Uuid, Path, description = "ID do Produto")),
    responses(
        (status = 200, description = "Estoque ajustado", body = Product),
        (status = 409, description = "Estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn adjust_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<AdjustStockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .inventory_service
        .adjust_stock(&mut *conn, tenant.owner_id, product_id, payload.delta)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(product)))
}

// =============================================================================
//  CATÁLOGO DE SERVIÇOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/services",
    tag = "Inventory",
    params(SearchQuery),
    responses(
        (status = 200, description = "Serviços do catálogo", body = Vec<CatalogService>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_services(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopStaff>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let services = app_state
        .inventory_service
        .list_services(&mut *conn, tenant.owner_id, query.search.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(services)))
}

#[utoipa::path(
    get,
    path = "/api/services/{service_id}",
    tag = "Inventory",
    params(("service_id" = Uuid, Path, description = "ID do Serviço")),
    responses(
        (status = 200, description = "Serviço", body = CatalogService),
        (status = 404, description = "Serviço não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_service(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopStaff>,
    Path(service_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let service = app_state
        .inventory_service
        .get_service(&mut *conn, tenant.owner_id, service_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(service)))
}

#[utoipa::path(
    post,
    path = "/api/services",
    tag = "Inventory",
    request_body = CatalogServicePayload,
    responses(
        (status = 201, description = "Serviço cadastrado", body = CatalogService)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_service(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Json(payload): Json<CatalogServicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let draft: CatalogServiceDraft = payload.into();
    let service = app_state
        .inventory_service
        .create_service(&mut *conn, tenant.owner_id, &draft)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(service)))
}

#[utoipa::path(
    put,
    path = "/api/services/{service_id}",
    tag = "Inventory",
    request_body = CatalogServicePayload,
    params(("service_id" = Uuid, Path, description = "ID do Serviço")),
    responses(
        (status = 200, description = "Serviço atualizado", body = CatalogService)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_service(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(service_id): Path<Uuid>,
    Json(payload): Json<CatalogServicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let draft: CatalogServiceDraft = payload.into();
    let service = app_state
        .inventory_service
        .update_service(&mut *conn, tenant.owner_id, service_id, &draft)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(service)))
}

#[utoipa::path(
    delete,
    path = "/api/services/{service_id}",
    tag = "Inventory",
    params(("service_id" = Uuid, Path, description = "ID do Serviço")),
    responses(
        (status = 204, description = "Serviço removido")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_service(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(service_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .inventory_service
        .delete_service(&mut *conn, tenant.owner_id, service_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn product_payload_rejects_negative_price_and_stock() {
        let payload: ProductPayload = serde_json::from_value(json!({
            "name": "Óleo",
            "sku": "OIL-001",
            "price": -1.0,
            "stock": -3
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("price"));
        assert!(fields.contains_key("stock"));
    }

    #[test]
    fn zero_stock_adjustment_is_invalid() {
        assert!(AdjustStockPayload { delta: 0 }.validate().is_err());
        assert!(AdjustStockPayload { delta: -2 }.validate().is_ok());
    }
}
