// src/models/crm.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    #[schema(ignore)]
    pub owner_id: Uuid,
    // Login do portal do cliente, quando ele concluiu o cadastro
    pub user_id: Option<Uuid>,
    #[schema(example = "João da Silva")]
    pub name: String,
    #[schema(example = "(11) 98888-7777")]
    pub phone: String,
    #[schema(example = "joao@email.com")]
    pub email: String,
    #[schema(example = "123.456.789-00")]
    pub tax_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    #[schema(ignore)]
    pub owner_id: Uuid,
    pub client_id: Uuid,
    #[schema(example = "Honda")]
    pub brand: String,
    #[schema(example = "CB 500F")]
    pub model: String,
    #[schema(example = 2022)]
    pub year: i32,
    #[schema(example = "ABC1D23")]
    pub plate: String,
    #[schema(example = "Vermelha")]
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Placas são guardadas só com letras e números, em maiúsculas ("abc-1d23" vira "ABC1D23").
pub fn normalize_plate(plate: &str) -> String {
    plate
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

/// Só os dígitos de um documento ou telefone.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plate_is_upper_cased_without_separators() {
        assert_eq!(normalize_plate("  abc1d23 "), "ABC1D23");
        assert_eq!(normalize_plate("abc-1234"), "ABC1234");
    }

    #[test]
    fn keeps_only_digits() {
        assert_eq!(digits_only("123.456.789-00"), "12345678900");
        assert_eq!(digits_only("(11) 98888-7777"), "11988887777");
    }
}
