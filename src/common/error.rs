// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Nosso tipo de erro de domínio. Os handlers convertem para ApiError
// (já traduzido) com `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Usuário desativado")]
    InactiveUser,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Contexto da oficina ausente")]
    TenantRequired,

    #[error("Cabeçalho x-tenant-id inválido")]
    InvalidTenantHeader,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Recurso em uso")]
    ResourceInUse,

    #[error("SKU já existe")]
    SkuAlreadyExists,

    #[error("Estoque insuficiente: {0}")]
    InsufficientStock(String),

    #[error("Venda já finalizada")]
    SaleAlreadyFinalized,

    #[error("Desconto maior que o valor da venda")]
    DiscountExceedsTotal,

    #[error("Valor fora do intervalo permitido")]
    AmountOutOfRange,

    #[error("Lançamento vinculado a OS/Venda não pode ser alterado")]
    LinkedTransactionImmutable,

    #[error("OS não está aberta")]
    OrderNotOpen,

    #[error("OS não disponível")]
    OrderNotAvailable,

    #[error("Código de verificação inválido")]
    InvalidResetCode,

    #[error("Não foi possível gerar um número de exibição único")]
    DisplayNumberExhausted,

    #[error("IA não configurada")]
    AiNotConfigured,

    #[error("Falha na IA: {0}")]
    AiProviderError(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Status HTTP e chave de tradução de cada variante.
    fn status_and_key(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "validation.failed"),
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "auth.email_taken"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "auth.invalid_credentials"),
            AppError::InactiveUser => (StatusCode::FORBIDDEN, "auth.inactive_user"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "auth.invalid_token"),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "auth.user_not_found"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "auth.forbidden"),
            AppError::TenantRequired => (StatusCode::BAD_REQUEST, "tenant.required"),
            AppError::InvalidTenantHeader => (StatusCode::BAD_REQUEST, "tenant.invalid_header"),
            AppError::ResourceNotFound(_) => (StatusCode::NOT_FOUND, "resource.not_found"),
            AppError::UniqueConstraintViolation(_) => (StatusCode::CONFLICT, "resource.duplicate"),
            AppError::ResourceInUse => (StatusCode::CONFLICT, "resource.in_use"),
            AppError::SkuAlreadyExists => (StatusCode::CONFLICT, "inventory.sku_taken"),
            AppError::InsufficientStock(_) => (StatusCode::CONFLICT, "inventory.insufficient_stock"),
            AppError::SaleAlreadyFinalized => (StatusCode::CONFLICT, "sales.already_finalized"),
            AppError::DiscountExceedsTotal => (StatusCode::BAD_REQUEST, "sales.discount_exceeds_total"),
            AppError::AmountOutOfRange => (StatusCode::BAD_REQUEST, "validation.amount_out_of_range"),
            AppError::LinkedTransactionImmutable => (StatusCode::CONFLICT, "finance.linked_immutable"),
            AppError::OrderNotOpen => (StatusCode::CONFLICT, "orders.not_open"),
            AppError::OrderNotAvailable => (StatusCode::CONFLICT, "orders.not_available"),
            AppError::InvalidResetCode => (StatusCode::BAD_REQUEST, "auth.invalid_reset_code"),
            AppError::DisplayNumberExhausted => (StatusCode::SERVICE_UNAVAILABLE, "orders.number_exhausted"),
            AppError::AiNotConfigured => (StatusCode::SERVICE_UNAVAILABLE, "ai.not_configured"),
            AppError::AiProviderError(_) => (StatusCode::BAD_GATEWAY, "ai.provider_error"),
            AppError::DatabaseError(sqlx::Error::RowNotFound) => (StatusCode::NOT_FOUND, "resource.not_found"),
            AppError::DatabaseError(_)
            | AppError::FontNotFound(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server.internal"),
        }
    }

    /// Parâmetro opcional interpolado na mensagem traduzida (`{0}`).
    fn message_param(&self) -> Option<&str> {
        match self {
            AppError::ResourceNotFound(p)
            | AppError::UniqueConstraintViolation(p)
            | AppError::InsufficientStock(p) => Some(p),
            _ => None,
        }
    }

    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let (status, key) = self.status_and_key();

        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let mut message = store.translate(&locale.0, key);
        if let Some(param) = self.message_param() {
            message = message.replace("{0}", param);
        }

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            _ => None,
        };

        ApiError { status, error: message, details }
    }

    /// Converte violações de unicidade / chave estrangeira em erros de domínio.
    pub fn from_write_error(e: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return AppError::UniqueConstraintViolation(what.to_string());
            }
            if db_err.is_foreign_key_violation() {
                return AppError::ResourceInUse;
            }
        }
        e.into()
    }
}

// O erro que efetivamente sai na resposta HTTP
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self { status, error: error.into(), details: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt() -> Locale {
        Locale("pt".to_string())
    }

    #[test]
    fn maps_domain_errors_to_http_status() {
        let store = I18nStore::load();
        let cases = [
            (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AppError::InactiveUser, StatusCode::FORBIDDEN),
            (AppError::SaleAlreadyFinalized, StatusCode::CONFLICT),
            (AppError::OrderNotOpen, StatusCode::CONFLICT),
            (AppError::DiscountExceedsTotal, StatusCode::BAD_REQUEST),
            (AppError::AmountOutOfRange, StatusCode::BAD_REQUEST),
            (AppError::AiNotConfigured, StatusCode::SERVICE_UNAVAILABLE),
            (AppError::DatabaseError(sqlx::Error::RowNotFound), StatusCode::NOT_FOUND),
            (AppError::DatabaseError(sqlx::Error::PoolTimedOut), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.to_api_error(&pt(), &store).status, expected, "{err:?}");
        }
    }

    #[test]
    fn interpolates_parameter_in_message() {
        let store = I18nStore::load();
        let api = AppError::InsufficientStock("Óleo 10W40".into()).to_api_error(&pt(), &store);
        assert!(api.error.contains("Óleo 10W40"));
        assert!(!api.error.contains("{0}"));
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let store = I18nStore::load();
        let mut errors = validator::ValidationErrors::new();
        let mut e = validator::ValidationError::new("length");
        e.message = Some("O nome é obrigatório.".into());
        errors.add("name", e);

        let api = AppError::ValidationError(errors).to_api_error(&pt(), &store);
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["name"][0], "O nome é obrigatório.");
    }
}
