// src/models/operations.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "os_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OsStatus {
    Open,
    Quote,
    AwaitingApproval,
    Approved,
    Rejected,
    InProgress,
    WaitingParts,
    Ready,
    Finished,
    Delivered,
    Cancelled,
}

impl OsStatus {
    /// FINISHED e DELIVERED disparam o faturamento.
    pub fn is_finishing(self) -> bool {
        matches!(self, OsStatus::Finished | OsStatus::Delivered)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "sale_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    Quote,
    Order,
    Finalized,
    Cancelled,
}

impl SaleStatus {
    pub fn is_finishing(self) -> bool {
        matches!(self, SaleStatus::Finalized)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    Pix,
    Installments,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::DebitCard => "DEBIT_CARD",
            PaymentMethod::Pix => "PIX",
            PaymentMethod::Installments => "INSTALLMENTS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    Product,
    Service,
}

// --- Itens embutidos (JSONB) ---

/// Maior quantidade aceita numa linha.
pub const MAX_QUANTITY: i32 = 100_000;

/// Maior valor que cabe nas colunas NUMERIC(12, 2).
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

/// Valor monetário entre zero e `max_amount()`.
pub fn validate_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    if *value > max_amount() {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor é maior que o permitido.".into());
        return Err(err);
    }
    Ok(())
}

/// Linha de uma OS ou venda. Só PRODUCT com `productId` mexe no estoque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    #[validate(length(min = 1, message = "O item precisa de um nome."))]
    #[schema(example = "Óleo Motul 10W40")]
    pub name: String,
    #[validate(range(min = 1, max = 100_000, message = "A quantidade deve estar entre 1 e 100000."))]
    #[schema(example = 2)]
    pub quantity: i32,
    #[validate(custom(function = "validate_amount"))]
    #[schema(example = "65.90")]
    pub price: Decimal,
    // Desconto unitário (usado nas vendas)
    #[serde(default)]
    #[validate(custom(function = "validate_amount"))]
    #[schema(example = "0.00")]
    pub discount: Decimal,
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

// --- Documentos ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrder {
    pub id: Uuid,
    #[schema(ignore)]
    pub owner_id: Uuid,
    #[schema(example = "482913")]
    pub os_number: Option<String>,
    pub client_id: Uuid,
    pub vehicle_id: Uuid,
    pub mechanic_id: Option<Uuid>,
    pub status: OsStatus,
    #[schema(example = "Barulho na corrente")]
    pub description: String,
    pub body_lines: Vec<String>,
    #[schema(value_type = Vec<LineItem>)]
    pub items: Json<Vec<LineItem>>,
    #[schema(example = "211.80")]
    pub total: Decimal,
    pub status_notes: Option<String>,
    pub print_count: i32,
    pub last_printed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    #[schema(ignore)]
    pub owner_id: Uuid,
    #[schema(example = "731204")]
    pub sale_number: Option<String>,
    pub client_id: Option<Uuid>,
    pub seller_id: Uuid,
    #[schema(value_type = Vec<LineItem>)]
    pub items: Json<Vec<LineItem>>,
    pub subtotal: Decimal,
    pub total_discount: Decimal,
    pub total: Decimal,
    pub status: SaleStatus,
    pub payment_method: PaymentMethod,
    pub is_installments: bool,
    pub installments_count: Option<i32>,
    pub print_count: i32,
    pub last_printed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Campos gravados de uma OS (criação e atualização completa).
#[derive(Debug, Clone)]
pub struct ServiceOrderDraft {
    pub client_id: Uuid,
    pub vehicle_id: Uuid,
    pub mechanic_id: Option<Uuid>,
    pub status: OsStatus,
    pub description: String,
    pub body_lines: Vec<String>,
    pub items: Vec<LineItem>,
    pub total: Decimal,
}

/// Campos gravados de uma venda.
#[derive(Debug, Clone)]
pub struct SaleDraft {
    pub client_id: Option<Uuid>,
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub total_discount: Decimal,
    pub total: Decimal,
    pub status: SaleStatus,
    pub payment_method: PaymentMethod,
    pub is_installments: bool,
    pub installments_count: Option<i32>,
}

// Filtros de listagem
#[derive(Debug, Default, Clone, Deserialize, ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderFilter {
    pub status: Option<OsStatus>,
    pub mechanic_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub revenue: Decimal,
    pub sales_count: i64,
    pub quotes_count: i64,
    pub items_sold: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finishing_states() {
        assert!(OsStatus::Finished.is_finishing());
        assert!(OsStatus::Delivered.is_finishing());
        assert!(!OsStatus::Ready.is_finishing());
        assert!(!OsStatus::Cancelled.is_finishing());
        assert!(SaleStatus::Finalized.is_finishing());
        assert!(!SaleStatus::Order.is_finishing());
    }

    #[test]
    fn line_item_reads_type_field() {
        let item: LineItem = serde_json::from_str(
            r#"{"productId":null,"serviceId":null,"name":"Mão de obra","quantity":1,"price":80.0,"type":"SERVICE"}"#,
        )
        .unwrap();
        assert_eq!(item.kind, ItemKind::Service);
        assert!(item.discount.is_zero());
    }

    #[test]
    fn line_item_rejects_zero_quantity_and_negative_price() {
        let item = LineItem {
            product_id: None,
            service_id: None,
            name: "Peça".into(),
            quantity: 0,
            price: Decimal::new(-100, 2),
            discount: Decimal::ZERO,
            kind: ItemKind::Product,
        };
        let errors = item.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("quantity"));
        assert!(fields.contains_key("price"));
    }

    #[test]
    fn line_item_rejects_values_beyond_column_range() {
        let item = LineItem {
            product_id: None,
            service_id: None,
            name: "Peça".into(),
            quantity: MAX_QUANTITY + 1,
            price: "50000000000000000000000000000".parse().unwrap(),
            discount: Decimal::new(1_000_000_000_000, 2),
            kind: ItemKind::Product,
        };
        let errors = item.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("quantity"));
        assert!(fields.contains_key("price"));
        assert!(fields.contains_key("discount"));

        assert!(validate_amount(&max_amount()).is_ok());
    }
}
