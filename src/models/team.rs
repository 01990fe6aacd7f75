// src/models/team.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "employment_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentType {
    Commission,
    Clt,
    CltCommission,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Mechanic {
    pub id: Uuid,
    #[schema(ignore)]
    pub owner_id: Uuid,
    // Login do mecânico (quando veio pelo convite)
    pub user_id: Option<Uuid>,
    #[schema(example = "Carlos Souza")]
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    #[schema(example = "Injeção eletrônica")]
    pub specialty: Option<String>,
    pub active: bool,
    pub employment_type: EmploymentType,
    #[schema(example = "2500.00")]
    pub base_salary: Option<Decimal>,
    #[schema(example = "10.00")]
    pub commission_rate: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Campos gravados de um mecânico.
#[derive(Debug, Clone)]
pub struct MechanicDraft {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub specialty: Option<String>,
    pub active: bool,
    pub employment_type: EmploymentType,
    pub base_salary: Option<Decimal>,
    pub commission_rate: Option<Decimal>,
}
