// src/models/portal.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::operations::{LineItem, OsStatus};

/// O que o cliente enxerga da OS no portal público.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortalOrder {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub os_number: Option<String>,
    pub status: OsStatus,
    pub description: String,
    #[schema(value_type = Vec<LineItem>)]
    pub items: Json<Vec<LineItem>>,
    pub total: Decimal,
    pub status_notes: Option<String>,
    pub vehicle_brand: String,
    pub vehicle_model: String,
    pub plate: String,
    pub client_name: String,
    pub workshop_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PortalVehicleQuery {
    #[schema(example = "ABC-1D23")]
    pub plate: String,
    // CPF/CNPJ ou telefone do cliente
    #[schema(example = "123.456.789-00")]
    pub tax_id: String,
    pub workshop_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PortalNumberQuery {
    #[schema(example = "482913")]
    pub number: String,
    pub workshop_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortalDecision {
    Approve,
    Reject,
}

impl PortalDecision {
    pub fn status(self) -> OsStatus {
        match self {
            PortalDecision::Approve => OsStatus::Approved,
            PortalDecision::Reject => OsStatus::Rejected,
        }
    }

    pub fn note(self) -> &'static str {
        match self {
            PortalDecision::Approve => "Orçamento aprovado pelo cliente via portal.",
            PortalDecision::Reject => "Orçamento recusado pelo cliente via portal.",
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PortalDecisionPayload {
    pub decision: PortalDecision,
}
