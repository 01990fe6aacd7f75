// src/handlers/finance.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
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
    middleware::{
        i18n::Locale,
        rbac::{RequireRole, WorkshopAdmin},
        tenancy::TenantContext,
    },
    models::finance::{
        FinancialSummary, FinancialTransaction, TransactionCategory, TransactionFilter, TransactionStatus,
    },
    services::finance_service::ManualEntry,
};

fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManualTransactionPayload {
    #[validate(length(min = 1, message = "Informe uma descrição."))]
    #[schema(example = "Conta de luz")]
    pub label: String,
    pub category: TransactionCategory,
    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "350.00")]
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub payment_method: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl From<ManualTransactionPayload> for ManualEntry {
    fn from(p: ManualTransactionPayload) -> Self {
        ManualEntry {
            label: p.label,
            category: p.category,
            amount: p.amount,
            status: p.status,
            payment_method: p.payment_method,
            date: p.date,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/finance/transactions",
    tag = "Finance",
    params(TransactionFilter),
    responses(
        (status = 200, description = "Lançamentos", body = Vec<FinancialTransaction>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_transactions(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Query(filter): Query<TransactionFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let transactions = app_state
        .finance_service
        .list_transactions(&mut *conn, tenant.owner_id, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(transactions)))
}

#[utoipa::path(
    get,
    path = "/api/finance/transactions/{transaction_id}",
    tag = "Finance",
    params(("transaction_id" = Uuid, Path, description = "ID do Lançamento")),
    responses(
        (status = 200, description = "Lançamento", body = FinancialTransaction),
        (status = 404, description = "Lançamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_transaction(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(transaction_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let transaction = app_state
        .finance_service
        .get_transaction(&mut *conn, tenant.owner_id, transaction_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(transaction)))
}

#[utoipa::path(
    post,
    path = "/api/finance/transactions",
    tag = "Finance",
    request_body = ManualTransactionPayload,
    responses(
        (status = 201, description = "Lançamento manual criado", body = FinancialTransaction)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_transaction(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Json(payload): Json<ManualTransactionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let transaction = app_state
        .finance_service
        .create_manual(&mut *conn, tenant.owner_id, payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

#[utoipa::path(
    put,
    path = "/api/finance/transactions/{transaction_id}",
    tag = "Finance",
    request_body = ManualTransactionPayload,
    params(("transaction_id" = Uuid, Path, description = "ID do Lançamento")),
    responses(
        (status = 200, description = "Lançamento atualizado", body = FinancialTransaction),
        (status = 409, description = "Lançamento vinculado a OS/Venda")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_transaction(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<ManualTransactionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let transaction = app_state
        .finance_service
        .update_manual(&mut *conn, tenant.owner_id, transaction_id, payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(transaction)))
}

#[utoipa::path(
    delete,
    path = "/api/finance/transactions/{transaction_id}",
    tag = "Finance",
    params(("transaction_id" = Uuid, Path, description = "ID do Lançamento")),
    responses(
        (status = 204, description = "Lançamento removido"),
        (status = 409, description = "Lançamento vinculado a OS/Venda")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_transaction(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(transaction_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .finance_service
        .delete_manual(&mut *conn, tenant.owner_id, transaction_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/finance/summary",
    tag = "Finance",
    responses(
        (status = 200, description = "Receita, custos, lucro e a receber", body = FinancialSummary)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let summary = app_state
        .finance_service
        .summary(&mut *conn, tenant.owner_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn manual_entry_amount_must_be_positive() {
        let payload: ManualTransactionPayload = serde_json::from_value(json!({
            "label": "Aluguel",
            "category": "EXPENSE",
            "amount": 0,
            "status": "PAID"
        }))
        .unwrap();

        assert!(payload.validate().unwrap_err().field_errors().contains_key("amount"));
    }
}
