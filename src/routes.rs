// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::auth::{auth_guard, tenant_guard},
};

/// Monta o router completo da API.
pub fn app_router(app_state: AppState) -> Router {
    // Rotas públicas de autenticação
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/password-reset/request", post(handlers::auth::request_password_reset))
        .route("/password-reset/confirm", post(handlers::auth::confirm_password_reset))
        .route("/signup/mechanic", post(handlers::auth::signup_mechanic))
        .route("/signup/client", post(handlers::auth::signup_client));

    // Rotas de usuário (token, sem oficina)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let platform_routes = Router::new()
        .route("/users", get(handlers::platform::list_users))
        .route("/users/{user_id}/active", patch(handlers::platform::set_user_active))
        .route("/workshops", get(handlers::platform::workshop_stats))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Portal do cliente: público
    let portal_routes = Router::new()
        .route("/orders/by-vehicle", get(handlers::portal::find_by_vehicle))
        .route("/orders/by-number", get(handlers::portal::find_by_number))
        .route("/orders/{order_id}/decision", post(handlers::portal::decide));

    // Tudo que pertence a uma oficina passa pelo tenant_guard
    let workshop_routes = Router::new()
        // CRM
        .route(
            "/clients",
            get(handlers::crm::list_clients).post(handlers::crm::create_client),
        )
        .route(
            "/clients/{client_id}",
            get(handlers::crm::get_client)
                .put(handlers::crm::update_client)
                .delete(handlers::crm::delete_client),
        )
        .route("/clients/{client_id}/vehicles", get(handlers::crm::list_client_vehicles))
        .route(
            "/vehicles",
            get(handlers::crm::list_vehicles).post(handlers::crm::create_vehicle),
        )
        .route(
            "/vehicles/{vehicle_id}",
            get(handlers::crm::get_vehicle)
                .put(handlers::crm::update_vehicle)
                .delete(handlers::crm::delete_vehicle),
        )
        // Estoque e catálogo
        .route(
            "/products",
            get(handlers::inventory::list_products).post(handlers::inventory::create_product),
        )
        .route("/products/low-stock", get(handlers::inventory::list_low_stock))
        .route(
            "/products/{product_id}",
            get(handlers::inventory::get_product)
                .put(handlers::inventory::update_product)
                .delete(handlers::inventory::delete_product),
        )
        .route("/products/{product_id}/stock", post(handlers::inventory::adjust_stock))
        .route(
            "/services",
            get(handlers::inventory::list_services).post(handlers::inventory::create_service),
        )
        .route(
            "/services/{service_id}",
            get(handlers::inventory::get_service)
                .put(handlers::inventory::update_service)
                .delete(handlers::inventory::delete_service),
        )
        // Ordens de serviço
        .route(
            "/orders",
            get(handlers::operations::list_orders).post(handlers::operations::create_order),
        )
        .route(
            "/orders/{order_id}",
            get(handlers::operations::get_order)
                .put(handlers::operations::update_order)
                .delete(handlers::operations::delete_order),
        )
        .route("/orders/{order_id}/status", patch(handlers::operations::change_order_status))
        .route("/orders/{order_id}/pdf", get(handlers::documents::generate_order_pdf))
        // Bancada do mecânico
        .route("/mechanic/orders/open", get(handlers::operations::list_open_orders))
        .route("/mechanic/orders/mine", get(handlers::operations::list_my_orders))
        .route("/mechanic/orders/{order_id}/start", post(handlers::operations::start_order))
        .route("/mechanic/orders/{order_id}/finish", post(handlers::operations::finish_order))
        .route("/mechanic/orders/{order_id}/items", post(handlers::operations::add_order_product))
        .route(
            "/mechanic/orders/{order_id}/items/{product_id}",
            patch(handlers::operations::change_order_product_quantity)
                .delete(handlers::operations::remove_order_product),
        )
        // Vendas e PDV
        .route(
            "/sales",
            get(handlers::operations::list_sales).post(handlers::operations::create_sale),
        )
        .route(
            "/sales/{sale_id}",
            get(handlers::operations::get_sale)
                .put(handlers::operations::update_sale)
                .delete(handlers::operations::delete_sale),
        )
        .route("/sales/{sale_id}/finalize", post(handlers::operations::finalize_sale))
        .route("/sales/{sale_id}/cancel", post(handlers::operations::cancel_sale))
        .route("/sales/{sale_id}/pdf", get(handlers::documents::generate_sale_pdf))
        .route("/pos/checkout", post(handlers::operations::checkout))
        .route("/reports/sales", get(handlers::operations::sales_report))
        // Financeiro
        .route(
            "/finance/transactions",
            get(handlers::finance::list_transactions).post(handlers::finance::create_transaction),
        )
        .route(
            "/finance/transactions/{transaction_id}",
            get(handlers::finance::get_transaction)
                .put(handlers::finance::update_transaction)
                .delete(handlers::finance::delete_transaction),
        )
        .route("/finance/summary", get(handlers::finance::get_summary))
        // Equipe
        .route(
            "/team/mechanics",
            get(handlers::team::list_mechanics).post(handlers::team::create_mechanic),
        )
        .route(
            "/team/mechanics/{mechanic_id}",
            get(handlers::team::get_mechanic)
                .put(handlers::team::update_mechanic)
                .delete(handlers::team::delete_mechanic),
        )
        .route(
            "/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .route("/dashboard/summary", get(handlers::dashboard::get_summary))
        // IA
        .route("/ai/diagnosis", post(handlers::ai::diagnose))
        .route("/ai/financial-report", post(handlers::ai::financial_report))
        .route("/ai/ncm", post(handlers::ai::classify_ncm))
        // Área do cliente
        .route("/me/vehicles", get(handlers::customer::my_vehicles))
        .route("/me/orders", get(handlers::customer::my_orders))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let api_routes = Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/platform", platform_routes)
        .nest("/portal", portal_routes)
        .merge(workshop_routes);

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
