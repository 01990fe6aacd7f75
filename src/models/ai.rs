// src/models/ai.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisRequest {
    #[validate(length(min = 3, message = "Descreva o problema."))]
    #[schema(example = "Motor falhando em alta rotação")]
    pub issue: String,
    #[validate(length(min = 2, message = "Informe o modelo do veículo."))]
    #[schema(example = "Honda CB 500F 2022")]
    pub vehicle_model: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NcmRequest {
    #[validate(length(min = 2, message = "Informe o nome do produto."))]
    #[schema(example = "Pastilha de freio dianteira")]
    pub product_name: String,
}

/// Texto em markdown devolvido pela IA.
#[derive(Debug, Serialize, ToSchema)]
pub struct AiTextResponse {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NcmSuggestion {
    #[schema(example = "87149100")]
    pub ncm: String,
    #[schema(example = "Quadros e garfos, e suas partes")]
    pub description: String,
}
