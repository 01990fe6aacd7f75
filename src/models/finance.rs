// src/models/finance.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transaction_category", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionCategory {
    Income,
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transaction_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Paid,
    Pending,
}

/// Lançamento do livro-caixa da oficina.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinancialTransaction {
    pub id: Uuid,
    #[schema(ignore)]
    pub owner_id: Uuid,
    #[schema(example = "OS #482913 - João da Silva")]
    pub label: String,
    pub category: TransactionCategory,
    #[schema(example = "211.80")]
    pub amount: Decimal,
    pub status: TransactionStatus,
    #[schema(example = "PIX")]
    pub payment_method: Option<String>,
    pub service_order_id: Option<Uuid>,
    pub sale_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl FinancialTransaction {
    /// Lançamentos gerados por OS/venda não são editáveis.
    pub fn is_linked(&self) -> bool {
        self.service_order_id.is_some() || self.sale_id.is_some()
    }
}

/// Lançamento a ser inserido (manual ou gerado pelo faturamento).
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub label: String,
    pub category: TransactionCategory,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub payment_method: Option<String>,
    pub service_order_id: Option<Uuid>,
    pub sale_id: Option<Uuid>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Default, Clone, Deserialize, ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub category: Option<TransactionCategory>,
    pub status: Option<TransactionStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    // Σ INCOME pago
    pub revenue: Decimal,
    // Σ EXPENSE pago
    pub costs: Decimal,
    pub profit: Decimal,
    // Σ INCOME pendente (a receber)
    pub pending: Decimal,
}
