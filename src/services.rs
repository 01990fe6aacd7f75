pub mod ai_service;
pub mod auth;
pub mod crm_service;
pub mod dashboard_service;
pub mod document_service;
pub mod finance_service;
pub mod inventory_service;
pub mod lifecycle;
pub mod operation_service;
pub mod platform_service;
pub mod portal_service;
pub mod settings_service;
pub mod team_service;
