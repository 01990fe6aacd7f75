pub mod crm_repo;
pub use crm_repo::CrmRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
pub mod finance_repo;
pub use finance_repo::FinanceRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod operations_repo;
pub use operations_repo::OperationsRepository;
pub mod platform_repo;
pub use platform_repo::PlatformRepository;
pub mod portal_repo;
pub use portal_repo::PortalRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
pub mod team_repo;
pub use team_repo::TeamRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
