// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    common::i18n::I18nStore,
    db::{
        CrmRepository, DashboardRepository, FinanceRepository, InventoryRepository, OperationsRepository,
        PlatformRepository, PortalRepository, SettingsRepository, TeamRepository, UserRepository,
    },
    services::{
        ai_service::{AiService, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL},
        auth::AuthService,
        crm_service::CrmService,
        dashboard_service::DashboardService,
        document_service::DocumentService,
        finance_service::FinanceService,
        inventory_service::InventoryService,
        operation_service::OperationService,
        platform_service::PlatformService,
        portal_service::PortalService,
        settings_service::SettingsService,
        team_service::TeamService,
    },
};

const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_FONTS_DIR: &str = "./fonts";

/// Configuração lida do ambiente (.env incluso).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub platform_admin_email: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub fonts_dir: String,
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL deve ser definida"))?;
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET deve ser definido"))?;

        Ok(Self {
            database_url,
            jwt_secret,
            server_addr: optional_var("SERVER_ADDR").unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string()),
            platform_admin_email: optional_var("PLATFORM_ADMIN_EMAIL"),
            gemini_api_key: optional_var("GEMINI_API_KEY"),
            gemini_model: optional_var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: optional_var("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            fonts_dir: optional_var("FONTS_DIR").unwrap_or_else(|| DEFAULT_FONTS_DIR.to_string()),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: I18nStore,

    pub auth_service: AuthService,
    pub crm_service: CrmService,
    pub inventory_service: InventoryService,
    pub operation_service: OperationService,
    pub finance_service: FinanceService,
    pub team_service: TeamService,
    pub settings_service: SettingsService,
    pub dashboard_service: DashboardService,
    pub portal_service: PortalService,
    pub platform_service: PlatformService,
    pub document_service: DocumentService,
    pub ai_service: AiService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::with_pool(db_pool, config)
    }

    /// Monta o gráfico de dependências sobre um pool já aberto (usado também nos testes).
    pub fn with_pool(db_pool: PgPool, config: &Config) -> anyhow::Result<Self> {
        let user_repo = UserRepository::new(db_pool.clone());
        let crm_repo = CrmRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let operations_repo = OperationsRepository::new(db_pool.clone());
        let finance_repo = FinanceRepository::new(db_pool.clone());
        let team_repo = TeamRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            crm_repo.clone(),
            team_repo.clone(),
            config.jwt_secret.clone(),
            config.platform_admin_email.clone(),
            db_pool.clone(),
        );
        let operation_service = OperationService::new(
            operations_repo.clone(),
            crm_repo.clone(),
            inventory_repo.clone(),
            finance_repo.clone(),
            team_repo.clone(),
        );
        let document_service = DocumentService::new(
            operations_repo.clone(),
            settings_repo.clone(),
            crm_repo.clone(),
            config.fonts_dir.clone(),
        );
        let ai_service = AiService::new(
            config.gemini_base_url.clone(),
            config.gemini_model.clone(),
            config.gemini_api_key.clone(),
        )?;

        if !ai_service.is_configured() {
            tracing::warn!("GEMINI_API_KEY não definida: recursos de IA ficarão indisponíveis.");
        }

        Ok(Self {
            i18n_store: I18nStore::load(),
            auth_service,
            crm_service: CrmService::new(crm_repo),
            inventory_service: InventoryService::new(inventory_repo),
            finance_service: FinanceService::new(finance_repo),
            team_service: TeamService::new(team_repo),
            settings_service: SettingsService::new(settings_repo),
            dashboard_service: DashboardService::new(DashboardRepository::new(db_pool.clone())),
            portal_service: PortalService::new(PortalRepository::new(db_pool.clone()), operations_repo),
            platform_service: PlatformService::new(PlatformRepository::new(db_pool.clone()), user_repo),
            operation_service,
            document_service,
            ai_service,
            db_pool,
        })
    }
}
