// tests/operations_flow.rs
//
// Testes de integração contra um PostgreSQL real.
// Rode com: DATABASE_URL=postgres://... cargo test -- --ignored

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use oficina_backend::{
    common::error::AppError,
    db::{
        inventory_repo::ProductDraft, CrmRepository, FinanceRepository, InventoryRepository,
        OperationsRepository, PortalRepository, TeamRepository,
    },
    models::{
        finance::{TransactionCategory, TransactionFilter},
        inventory::Product,
        operations::{ItemKind, LineItem, OsStatus, PaymentMethod, SaleStatus},
        portal::PortalDecision,
        team::{EmploymentType, MechanicDraft},
    },
    services::{
        crm_service::{CrmService, VehicleFields},
        finance_service::FinanceService,
        inventory_service::InventoryService,
        operation_service::{OperationService, OrderInput, SaleInput},
        portal_service::PortalService,
        team_service::TeamService,
    },
};

struct Services {
    crm: CrmService,
    inventory: InventoryService,
    operations: OperationService,
    finance: FinanceService,
    team: TeamService,
    portal: PortalService,
}

fn services(pool: &PgPool) -> Services {
    let crm_repo = CrmRepository::new(pool.clone());
    let inventory_repo = InventoryRepository::new(pool.clone());
    let finance_repo = FinanceRepository::new(pool.clone());
    let team_repo = TeamRepository::new(pool.clone());
    let operations_repo = OperationsRepository::new(pool.clone());

    Services {
        crm: CrmService::new(crm_repo.clone()),
        inventory: InventoryService::new(inventory_repo.clone()),
        operations: OperationService::new(
            operations_repo.clone(),
            crm_repo,
            inventory_repo.clone(),
            finance_repo.clone(),
            team_repo.clone(),
        ),
        finance: FinanceService::new(finance_repo),
        team: TeamService::new(team_repo),
        portal: PortalService::new(PortalRepository::new(pool.clone()), operations_repo),
    }
}

/// Cliente + veículo de uma oficina.
async fn seed_customer(s: &Services, pool: &PgPool, owner_id: Uuid) -> (Uuid, Uuid) {
    let vehicle = VehicleFields {
        brand: "Fiat".into(),
        model: "Uno".into(),
        year: 2012,
        plate: "abc1d23".into(),
        color: "Prata".into(),
    };
    let (client, vehicle) = s
        .crm
        .create_client(pool, owner_id, "Maria Souza", "11999990000", "maria@example.com", None, Some(&vehicle))
        .await
        .unwrap();
    (client.id, vehicle.unwrap().id)
}

async fn seed_product(s: &Services, pool: &PgPool, owner_id: Uuid, sku: &str, stock: i32) -> Product {
    let draft = ProductDraft {
        name: "Óleo 5W30".into(),
        sku: sku.into(),
        price: Decimal::new(4500, 2),
        cost_price: Decimal::new(3000, 2),
        stock,
        min_stock: 2,
        ncm: None,
    };
    s.inventory.create_product(pool, owner_id, draft).await.unwrap()
}

fn product_item(product: &Product, quantity: i32) -> LineItem {
    LineItem {
        product_id: Some(product.id),
        service_id: None,
        name: product.name.clone(),
        quantity,
        price: product.price,
        discount: Decimal::ZERO,
        kind: ItemKind::Product,
    }
}

fn service_item(price: Decimal) -> LineItem {
    LineItem {
        product_id: None,
        service_id: None,
        name: "Mão de obra".into(),
        quantity: 1,
        price,
        discount: Decimal::ZERO,
        kind: ItemKind::Service,
    }
}

fn order_input(client_id: Uuid, vehicle_id: Uuid, status: OsStatus, items: Vec<LineItem>) -> OrderInput {
    OrderInput {
        client_id,
        vehicle_id,
        mechanic_id: None,
        status,
        description: "Troca de óleo".into(),
        body_lines: vec![],
        items,
    }
}

fn sale_input(items: Vec<LineItem>, status: SaleStatus) -> SaleInput {
    SaleInput {
        client_id: None,
        items,
        global_discount: Decimal::ZERO,
        status,
        payment_method: PaymentMethod::Pix,
        is_installments: false,
        installments_count: None,
    }
}

async fn income_entries(s: &Services, pool: &PgPool, owner_id: Uuid) -> Vec<oficina_backend::models::finance::FinancialTransaction> {
    let filter = TransactionFilter { category: Some(TransactionCategory::Income), ..Default::default() };
    s.finance.list_transactions(pool, owner_id, &filter).await.unwrap()
}

async fn stock_of(s: &Services, pool: &PgPool, owner_id: Uuid, product_id: Uuid) -> i32 {
    s.inventory.get_product(pool, owner_id, product_id).await.unwrap().stock
}

#[sqlx::test]
#[ignore = "precisa de PostgreSQL (DATABASE_URL)"]
async fn finishing_an_order_bills_once_and_deducts_stock(pool: PgPool) {
    let s = services(&pool);
    let owner_id = Uuid::new_v4();
    let (client_id, vehicle_id) = seed_customer(&s, &pool, owner_id).await;
    let oil = seed_product(&s, &pool, owner_id, "oil-001", 10).await;
    assert_eq!(oil.sku, "OIL-001");

    let order = s
        .operations
        .create_order(&pool, owner_id, order_input(client_id, vehicle_id, OsStatus::Open, vec![product_item(&oil, 3)]))
        .await
        .unwrap();
    assert!(order.os_number.is_some());
    assert!(income_entries(&s, &pool, owner_id).await.is_empty());

    let finished = s
        .operations
        .change_order_status(&pool, owner_id, order.id, OsStatus::Finished)
        .await
        .unwrap();

    let entries = income_entries(&s, &pool, owner_id).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].amount, finished.total);
    assert_eq!(entries[0].service_order_id, Some(order.id));
    assert_eq!(stock_of(&s, &pool, owner_id, oil.id).await, 7);

    assert_eq!(finished.os_number, order.os_number);

    // FINISHED -> DELIVERED não fatura de novo
    s.operations
        .change_order_status(&pool, owner_id, order.id, OsStatus::Delivered)
        .await
        .unwrap();
    let refinished = s
        .operations
        .change_order_status(&pool, owner_id, order.id, OsStatus::Finished)
        .await
        .unwrap();

    assert_eq!(refinished.os_number, order.os_number);
    assert_eq!(income_entries(&s, &pool, owner_id).await.len(), 1);
    assert_eq!(stock_of(&s, &pool, owner_id, oil.id).await, 7);
}

#[sqlx::test]
#[ignore = "precisa de PostgreSQL (DATABASE_URL)"]
async fn service_items_never_touch_stock(pool: PgPool) {
    let s = services(&pool);
    let owner_id = Uuid::new_v4();
    let (client_id, vehicle_id) = seed_customer(&s, &pool, owner_id).await;
    let oil = seed_product(&s, &pool, owner_id, "OIL-002", 5).await;

    let items = vec![product_item(&oil, 2), service_item(Decimal::from(120))];
    let order = s
        .operations
        .create_order(&pool, owner_id, order_input(client_id, vehicle_id, OsStatus::Finished, items))
        .await
        .unwrap();

    // 2 × 45,00 + 120,00
    assert_eq!(order.total, Decimal::new(21000, 2));
    assert_eq!(stock_of(&s, &pool, owner_id, oil.id).await, 3);

    let entries = income_entries(&s, &pool, owner_id).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].amount, Decimal::new(21000, 2));
}

#[sqlx::test]
#[ignore = "precisa de PostgreSQL (DATABASE_URL)"]
async fn concurrent_finalization_bills_only_once(pool: PgPool) {
    let s = services(&pool);
    let owner_id = Uuid::new_v4();
    let oil = seed_product(&s, &pool, owner_id, "OIL-003", 10).await;

    let sale = s
        .operations
        .create_sale(&pool, owner_id, Uuid::new_v4(), sale_input(vec![product_item(&oil, 4)], SaleStatus::Order))
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        s.operations.finalize_sale(&pool, owner_id, sale.id),
        s.operations.finalize_sale(&pool, owner_id, sale.id),
    );
    assert!(first.is_ok());
    assert!(second.is_ok());

    let entries = income_entries(&s, &pool, owner_id).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].sale_id, Some(sale.id));
    assert_eq!(entries[0].amount, Decimal::from(180));
    assert_eq!(stock_of(&s, &pool, owner_id, oil.id).await, 6);
}

#[sqlx::test]
#[ignore = "precisa de PostgreSQL (DATABASE_URL)"]
async fn finalized_sale_cannot_be_edited(pool: PgPool) {
    let s = services(&pool);
    let owner_id = Uuid::new_v4();
    let oil = seed_product(&s, &pool, owner_id, "OIL-004", 10).await;

    let sale = s
        .operations
        .create_sale(&pool, owner_id, Uuid::new_v4(), sale_input(vec![product_item(&oil, 1)], SaleStatus::Finalized))
        .await
        .unwrap();
    let number = sale.sale_number.clone();
    assert!(number.is_some());

    let err = s
        .operations
        .update_sale(&pool, owner_id, sale.id, sale_input(vec![product_item(&oil, 5)], SaleStatus::Order))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SaleAlreadyFinalized));

    let reloaded = s.operations.get_sale(&pool, owner_id, sale.id).await.unwrap();
    assert_eq!(reloaded.sale_number, number);
}

#[sqlx::test]
#[ignore = "precisa de PostgreSQL (DATABASE_URL)"]
async fn insufficient_stock_rolls_back_billing(pool: PgPool) {
    let s = services(&pool);
    let owner_id = Uuid::new_v4();
    let oil = seed_product(&s, &pool, owner_id, "OIL-005", 1).await;

    let sale = s
        .operations
        .create_sale(&pool, owner_id, Uuid::new_v4(), sale_input(vec![product_item(&oil, 3)], SaleStatus::Order))
        .await
        .unwrap();

    let err = s.operations.finalize_sale(&pool, owner_id, sale.id).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock(_)));

    let reloaded = s.operations.get_sale(&pool, owner_id, sale.id).await.unwrap();
    assert_eq!(reloaded.status, SaleStatus::Order);
    assert!(income_entries(&s, &pool, owner_id).await.is_empty());
    assert_eq!(stock_of(&s, &pool, owner_id, oil.id).await, 1);
}

#[sqlx::test]
#[ignore = "precisa de PostgreSQL (DATABASE_URL)"]
async fn display_numbers_are_unique(pool: PgPool) {
    let s = services(&pool);
    let owner_id = Uuid::new_v4();
    let (client_id, vehicle_id) = seed_customer(&s, &pool, owner_id).await;

    let mut numbers = std::collections::HashSet::new();
    for _ in 0..20 {
        let order = s
            .operations
            .create_order(&pool, owner_id, order_input(client_id, vehicle_id, OsStatus::Open, vec![]))
            .await
            .unwrap();
        let number = order.os_number.unwrap();
        assert_eq!(number.len(), 6);
        assert!(numbers.insert(number));
    }
}

#[sqlx::test]
#[ignore = "precisa de PostgreSQL (DATABASE_URL)"]
async fn workshops_never_see_each_other(pool: PgPool) {
    let s = services(&pool);
    let owner_a = Uuid::new_v4();
    let owner_b = Uuid::new_v4();

    let (client_a, vehicle_a) = seed_customer(&s, &pool, owner_a).await;
    let oil_a = seed_product(&s, &pool, owner_a, "OIL-001", 10).await;
    let order_a = s
        .operations
        .create_order(&pool, owner_a, order_input(client_a, vehicle_a, OsStatus::Open, vec![]))
        .await
        .unwrap();

    assert!(s.crm.list_clients(&pool, owner_b, None).await.unwrap().is_empty());
    assert!(s.inventory.list_products(&pool, owner_b, None).await.unwrap().is_empty());

    let err = s.crm.get_client(&pool, owner_b, client_a).await.unwrap_err();
    assert!(matches!(err, AppError::ResourceNotFound(_)));
    let err = s.operations.get_order(&pool, owner_b, order_a.id).await.unwrap_err();
    assert!(matches!(err, AppError::ResourceNotFound(_)));

    // Mesmo SKU em outra oficina é permitido
    let oil_b = seed_product(&s, &pool, owner_b, "OIL-001", 3).await;
    assert_ne!(oil_a.id, oil_b.id);

    // Oficina B não consegue abrir OS com cliente da oficina A
    let err = s
        .operations
        .create_order(&pool, owner_b, order_input(client_a, vehicle_a, OsStatus::Open, vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ResourceNotFound(_)));
}

#[sqlx::test]
#[ignore = "precisa de PostgreSQL (DATABASE_URL)"]
async fn only_one_mechanic_can_start_an_order(pool: PgPool) {
    let s = services(&pool);
    let owner_id = Uuid::new_v4();
    let (client_id, vehicle_id) = seed_customer(&s, &pool, owner_id).await;

    let draft = |name: &str| MechanicDraft {
        name: name.into(),
        phone: String::new(),
        email: None,
        specialty: None,
        active: true,
        employment_type: EmploymentType::Commission,
        base_salary: None,
        commission_rate: None,
    };
    let joao = s.team.create_mechanic(&pool, owner_id, &draft("João")).await.unwrap();
    let pedro = s.team.create_mechanic(&pool, owner_id, &draft("Pedro")).await.unwrap();

    let order = s
        .operations
        .create_order(&pool, owner_id, order_input(client_id, vehicle_id, OsStatus::Open, vec![]))
        .await
        .unwrap();

    let started = s.operations.start_order(&pool, owner_id, order.id, joao.id).await.unwrap();
    assert_eq!(started.status, OsStatus::InProgress);
    assert_eq!(started.mechanic_id, Some(joao.id));

    let err = s.operations.start_order(&pool, owner_id, order.id, pedro.id).await.unwrap_err();
    assert!(matches!(err, AppError::OrderNotAvailable));

    let err = s.operations.finish_order(&pool, owner_id, order.id, pedro.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let finished = s.operations.finish_order(&pool, owner_id, order.id, joao.id).await.unwrap();
    assert_eq!(finished.status, OsStatus::Finished);
}

#[sqlx::test]
#[ignore = "precisa de PostgreSQL (DATABASE_URL)"]
async fn sale_number_survives_cancel_and_refinalize(pool: PgPool) {
    let s = services(&pool);
    let owner_id = Uuid::new_v4();
    let oil = seed_product(&s, &pool, owner_id, "OIL-006", 10).await;

    let sale = s
        .operations
        .create_sale(&pool, owner_id, Uuid::new_v4(), sale_input(vec![product_item(&oil, 1)], SaleStatus::Order))
        .await
        .unwrap();
    assert!(sale.sale_number.is_none());

    let finalized = s.operations.finalize_sale(&pool, owner_id, sale.id).await.unwrap();
    let number = finalized.sale_number.clone();
    assert!(number.is_some());

    let cancelled = s.operations.cancel_sale(&pool, owner_id, sale.id).await.unwrap();
    assert_eq!(cancelled.sale_number, number);

    let refinalized = s.operations.finalize_sale(&pool, owner_id, sale.id).await.unwrap();
    assert_eq!(refinalized.status, SaleStatus::Finalized);
    assert_eq!(refinalized.sale_number, number);

    let reloaded = s.operations.get_sale(&pool, owner_id, sale.id).await.unwrap();
    assert_eq!(reloaded.sale_number, number);
}

#[sqlx::test]
#[ignore = "precisa de PostgreSQL (DATABASE_URL)"]
async fn sale_with_discount_above_subtotal_is_refused(pool: PgPool) {
    let s = services(&pool);
    let owner_id = Uuid::new_v4();
    let oil = seed_product(&s, &pool, owner_id, "OIL-007", 10).await;

    let mut input = sale_input(vec![product_item(&oil, 1)], SaleStatus::Finalized);
    input.global_discount = Decimal::from(100);

    let err = s.operations.create_sale(&pool, owner_id, Uuid::new_v4(), input).await.unwrap_err();
    assert!(matches!(err, AppError::DiscountExceedsTotal));

    assert!(s.operations.list_sales(&pool, owner_id, None).await.unwrap().is_empty());
    assert!(income_entries(&s, &pool, owner_id).await.is_empty());
    assert_eq!(stock_of(&s, &pool, owner_id, oil.id).await, 10);
}

#[sqlx::test]
#[ignore = "precisa de PostgreSQL (DATABASE_URL)"]
async fn portal_decision_applies_only_while_open(pool: PgPool) {
    let s = services(&pool);
    let owner_id = Uuid::new_v4();
    let (client_id, vehicle_id) = seed_customer(&s, &pool, owner_id).await;

    let order = s
        .operations
        .create_order(&pool, owner_id, order_input(client_id, vehicle_id, OsStatus::Open, vec![service_item(Decimal::from(90))]))
        .await
        .unwrap();

    let approved = s.portal.decide(&pool, order.id, PortalDecision::Approve).await.unwrap();
    assert_eq!(approved.status, OsStatus::Approved);
    assert_eq!(approved.status_notes.as_deref(), Some(PortalDecision::Approve.note()));

    let err = s.portal.decide(&pool, order.id, PortalDecision::Reject).await.unwrap_err();
    assert!(matches!(err, AppError::OrderNotOpen));

    let reloaded = s.operations.get_order(&pool, owner_id, order.id).await.unwrap();
    assert_eq!(reloaded.status, OsStatus::Approved);

    let err = s.portal.decide(&pool, Uuid::new_v4(), PortalDecision::Approve).await.unwrap_err();
    assert!(matches!(err, AppError::ResourceNotFound(_)));
}
