// src/handlers/documents.rs

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    common::{db_utils::get_rls_connection, error::ApiError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{RequireRole, WorkshopAdmin, WorkshopStaff},
        tenancy::TenantContext,
    },
};

fn pdf_response(pdf_bytes: Vec<u8>, filename: String) -> Response {
    // Configura os Headers para o navegador baixar ou mostrar o PDF
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, format!("inline; filename=\"{}\"", filename)),
    ];

    (headers, pdf_bytes).into_response()
}

#[utoipa::path(
    get,
    path = "/api/orders/{order_id}/pdf",
    tag = "Documents",
    params(("order_id" = Uuid, Path, description = "ID da OS")),
    responses(
        (status = 200, description = "PDF da ordem de serviço", content_type = "application/pdf", body = Vec<u8>),
        (status = 404, description = "OS não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn generate_order_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopStaff>,
    Path(order_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pdf_bytes = app_state
        .document_service
        .generate_order_pdf(&mut *rls_conn, tenant.owner_id, order_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(pdf_response(pdf_bytes, format!("os_{}.pdf", order_id)))
}

#[utoipa::path(
    get,
    path = "/api/sales/{sale_id}/pdf",
    tag = "Documents",
    params(("sale_id" = Uuid, Path, description = "ID da Venda")),
    responses(
        (status = 200, description = "PDF da venda", content_type = "application/pdf", body = Vec<u8>),
        (status = 404, description = "Venda não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn generate_sale_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<WorkshopAdmin>,
    Path(sale_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pdf_bytes = app_state
        .document_service
        .generate_sale_pdf(&mut *rls_conn, tenant.owner_id, sale_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(pdf_response(pdf_bytes, format!("venda_{}.pdf", sale_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_response_sets_content_type() {
        let response = pdf_response(vec![0x25, 0x50, 0x44, 0x46], "os_1.pdf".into());
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(response.headers()[header::CONTENT_DISPOSITION], "inline; filename=\"os_1.pdf\"");
    }
}
