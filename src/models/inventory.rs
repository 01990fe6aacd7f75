// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(ignore)]
    pub owner_id: Uuid,
    #[schema(example = "Óleo Motul 10W40")]
    pub name: String,
    #[schema(example = "OIL-001")]
    pub sku: String,
    #[schema(example = "65.90")]
    pub price: Decimal,
    #[schema(example = "38.00")]
    pub cost_price: Decimal,
    #[schema(example = 10)]
    pub stock: i32,
    #[schema(example = 3)]
    pub min_stock: i32,
    #[schema(example = "27101932")]
    pub ncm: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

// Serviço do catálogo (mão de obra). Não tem estoque.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogService {
    pub id: Uuid,
    #[schema(ignore)]
    pub owner_id: Uuid,
    #[schema(example = "Troca de óleo")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "80.00")]
    pub price: Decimal,
    #[schema(example = "Manutenção")]
    pub category: Option<String>,
    #[schema(example = "1h")]
    pub estimated_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
