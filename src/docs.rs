// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::request_password_reset,
        handlers::auth::confirm_password_reset,
        handlers::auth::signup_mechanic,
        handlers::auth::signup_client,

        // --- Users ---
        handlers::auth::get_me,

        // --- CRM ---
        handlers::crm::list_clients,
        handlers::crm::get_client,
        handlers::crm::create_client,
        handlers::crm::update_client,
        handlers::crm::delete_client,
        handlers::crm::list_client_vehicles,
        handlers::crm::list_vehicles,
        handlers::crm::get_vehicle,
        handlers::crm::create_vehicle,
        handlers::crm::update_vehicle,
        handlers::crm::delete_vehicle,

        // --- Inventory ---
        handlers::inventory::list_products,
        handlers::inventory::list_low_stock,
        handlers::inventory::get_product,
        handlers::inventory::create_product,
        handlers::inventory::update_product,
        handlers::inventory::delete_product,
        handlers::inventory::adjust_stock,
        handlers::inventory::list_services,
        handlers::inventory::get_service,
        handlers::inventory::create_service,
        handlers::inventory::update_service,
        handlers::inventory::delete_service,

        // --- Operations ---
        handlers::operations::list_orders,
        handlers::operations::get_order,
        handlers::operations::create_order,
        handlers::operations::update_order,
        handlers::operations::change_order_status,
        handlers::operations::delete_order,

        // --- Mechanic ---
        handlers::operations::list_open_orders,
        handlers::operations::list_my_orders,
        handlers::operations::start_order,
        handlers::operations::finish_order,
        handlers::operations::add_order_product,
        handlers::operations::change_order_product_quantity,
        handlers::operations::remove_order_product,

        // --- Sales ---
        handlers::operations::list_sales,
        handlers::operations::get_sale,
        handlers::operations::create_sale,
        handlers::operations::update_sale,
        handlers::operations::finalize_sale,
        handlers::operations::cancel_sale,
        handlers::operations::delete_sale,
        handlers::operations::checkout,
        handlers::operations::sales_report,

        // --- Documents ---
        handlers::documents::generate_order_pdf,
        handlers::documents::generate_sale_pdf,

        // --- Finance ---
        handlers::finance::list_transactions,
        handlers::finance::get_transaction,
        handlers::finance::create_transaction,
        handlers::finance::update_transaction,
        handlers::finance::delete_transaction,
        handlers::finance::get_summary,

        // --- Team ---
        handlers::team::list_mechanics,
        handlers::team::get_mechanic,
        handlers::team::create_mechanic,
        handlers::team::update_mechanic,
        handlers::team::delete_mechanic,

        // --- Settings ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,

        // --- Dashboard ---
        handlers::dashboard::get_summary,

        // --- AI ---
        handlers::ai::diagnose,
        handlers::ai::financial_report,
        handlers::ai::classify_ncm,

        // --- Customer ---
        handlers::customer::my_vehicles,
        handlers::customer::my_orders,

        // --- Portal ---
        handlers::portal::find_by_vehicle,
        handlers::portal::find_by_number,
        handlers::portal::decide,

        // --- Platform ---
        handlers::platform::list_users,
        handlers::platform::set_user_active,
        handlers::platform::workshop_stats,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::AccessRole,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::PasswordResetRequestPayload,
            models::auth::PasswordResetConfirmPayload,
            models::auth::MechanicSignupPayload,
            models::auth::ClientSignupPayload,
            models::auth::AuthResponse,
            models::auth::MeResponse,

            // --- CRM ---
            models::crm::Client,
            models::crm::Vehicle,
            handlers::crm::ClientPayload,
            handlers::crm::VehiclePayload,
            handlers::crm::CreateVehiclePayload,
            handlers::crm::ClientCreated,

            // --- Inventory ---
            models::inventory::Product,
            models::inventory::CatalogService,
            handlers::inventory::ProductPayload,
            handlers::inventory::AdjustStockPayload,
            handlers::inventory::CatalogServicePayload,

            // --- Operations ---
            models::operations::OsStatus,
            models::operations::SaleStatus,
            models::operations::PaymentMethod,
            models::operations::ItemKind,
            models::operations::LineItem,
            models::operations::ServiceOrder,
            models::operations::Sale,
            models::operations::SalesReport,
            handlers::operations::OrderPayload,
            handlers::operations::OrderStatusPayload,
            handlers::operations::AddProductPayload,
            handlers::operations::QuantityDeltaPayload,
            handlers::operations::SalePayload,
            handlers::operations::CartLinePayload,
            handlers::operations::CheckoutPayload,

            // --- Finance ---
            models::finance::TransactionCategory,
            models::finance::TransactionStatus,
            models::finance::FinancialTransaction,
            models::finance::FinancialSummary,
            handlers::finance::ManualTransactionPayload,

            // --- Team ---
            models::team::EmploymentType,
            models::team::Mechanic,
            handlers::team::MechanicPayload,

            // --- Settings ---
            models::settings::FiscalEnvironment,
            models::settings::TaxRegime,
            models::settings::FiscalConfig,
            models::settings::AutomationToggles,
            models::settings::WorkshopSettings,
            models::settings::UpdateSettingsRequest,

            // --- Dashboard ---
            models::dashboard::DashboardSummary,
            models::dashboard::MonthlyRevenue,
            models::dashboard::RecentOrder,

            // --- AI ---
            models::ai::DiagnosisRequest,
            models::ai::NcmRequest,
            models::ai::AiTextResponse,
            models::ai::NcmSuggestion,

            // --- Portal ---
            models::portal::PortalOrder,
            models::portal::PortalDecision,
            models::portal::PortalDecisionPayload,

            // --- Platform ---
            models::platform::WorkshopStats,
            models::platform::SetUserActivePayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação, convites e recuperação de senha"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "CRM", description = "Clientes e Veículos"),
        (name = "Inventory", description = "Produtos, Estoque e Catálogo de Serviços"),
        (name = "Operations", description = "Ordens de Serviço"),
        (name = "Mechanic", description = "Bancada do Mecânico"),
        (name = "Sales", description = "Vendas, PDV e Relatórios"),
        (name = "Documents", description = "Impressão de OS e Vendas (PDF)"),
        (name = "Finance", description = "Fluxo de Caixa"),
        (name = "Team", description = "Equipe de Mecânicos"),
        (name = "Settings", description = "Configurações da Oficina"),
        (name = "Dashboard", description = "Indicadores Gerenciais"),
        (name = "AI", description = "Diagnóstico e Relatórios com IA"),
        (name = "Customer", description = "Área do Cliente"),
        (name = "Portal", description = "Portal Público de Acompanhamento"),
        (name = "Platform", description = "Administração da Plataforma")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("api_jwt", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_billing_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/orders/{order_id}/status"));
        assert!(doc.paths.paths.contains_key("/api/pos/checkout"));
        assert!(doc.paths.paths.contains_key("/api/portal/orders/{order_id}/decision"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
