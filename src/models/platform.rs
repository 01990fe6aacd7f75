// src/models/platform.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Contagem de documentos de uma oficina (visão do admin da plataforma).
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopStats {
    pub owner_id: Uuid,
    pub owner_name: String,
    pub owner_email: String,
    pub business_name: Option<String>,
    pub clients: i64,
    pub vehicles: i64,
    pub service_orders: i64,
    pub sales: i64,
    pub products: i64,
    pub mechanics: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetUserActivePayload {
    pub is_active: bool,
}
