// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FiscalEnvironment {
    #[default]
    Homologation,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxRegime {
    #[default]
    Simples,
    Normal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FiscalConfig {
    pub environment: FiscalEnvironment,
    pub tax_regime: TaxRegime,
    #[schema(example = "123.456.789.110")]
    pub state_tax_id: String,
    pub municipal_tax_id: String,
    pub has_certificate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AutomationToggles {
    pub whatsapp: bool,
    pub ai_engine: bool,
    pub smart_reports: bool,
    pub cloud_sync: bool,
}

impl Default for AutomationToggles {
    fn default() -> Self {
        Self { whatsapp: true, ai_engine: true, smart_reports: false, cloud_sync: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopSettings {
    #[schema(ignore)] // A oficina vem do token / cabeçalho
    pub owner_id: Uuid,

    #[schema(example = "MotoMaster Pro")]
    pub business_name: Option<String>,

    #[schema(example = "12.345.678/0001-99")]
    pub tax_id: Option<String>,

    #[schema(example = "contato@oficina.com")]
    pub email: Option<String>,

    #[schema(example = "(11) 99999-8888")]
    pub phone: Option<String>,

    #[schema(example = "Rua das Flores, 123 - Centro")]
    pub address: Option<String>,

    #[schema(example = "https://oficina.com/logo.png")]
    pub logo_url: Option<String>,

    #[schema(example = "12.345.678/0001-99")]
    pub pix_key: Option<String>,

    #[schema(value_type = FiscalConfig)]
    pub fiscal: Json<FiscalConfig>,

    #[schema(value_type = AutomationToggles)]
    pub automation: Json<AutomationToggles>,

    pub updated_at: Option<DateTime<Utc>>,
}

impl WorkshopSettings {
    /// Configuração padrão de uma oficina que ainda não salvou nada.
    pub fn defaults(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            business_name: None,
            tax_id: None,
            email: None,
            phone: None,
            address: None,
            logo_url: None,
            pix_key: None,
            fiscal: Json(FiscalConfig::default()),
            automation: Json(AutomationToggles::default()),
            updated_at: None,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[schema(example = "MotoMaster Pro")]
    pub business_name: Option<String>,
    #[schema(example = "12.345.678/0001-99")]
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "Av. Paulista, 1000")]
    pub address: Option<String>,
    pub logo_url: Option<String>,
    #[schema(example = "chave@pix.com.br")]
    pub pix_key: Option<String>,
    #[serde(default)]
    pub fiscal: FiscalConfig,
    #[serde(default)]
    pub automation: AutomationToggles,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_fiscal_json_falls_back_to_defaults() {
        let fiscal: FiscalConfig = serde_json::from_str(r#"{"taxRegime":"NORMAL"}"#).unwrap();
        assert_eq!(fiscal.tax_regime, TaxRegime::Normal);
        assert_eq!(fiscal.environment, FiscalEnvironment::Homologation);
        assert!(!fiscal.has_certificate);
    }

    #[test]
    fn missing_settings_use_default_toggles() {
        let s = WorkshopSettings::defaults(Uuid::new_v4());
        assert!(s.automation.ai_engine);
        assert!(!s.automation.smart_reports);
    }
}
