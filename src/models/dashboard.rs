// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::models::operations::OsStatus;

// 1. Os cards do topo
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub clients_count: i64,
    pub active_orders: i64,      // OPEN, IN_PROGRESS, WAITING_PARTS
    pub revenue_last_7_days: Decimal,
    pub low_stock_count: i64,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub recent_orders: Vec<RecentOrder>,
}

// 2. Gráfico de faturamento do ano corrente
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    pub month: i32,
    pub total: Decimal,
}

// 3. Últimas OS
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub id: Uuid,
    pub os_number: Option<String>,
    pub client_name: String,
    pub plate: String,
    pub status: OsStatus,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}
