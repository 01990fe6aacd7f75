// src/common/db_utils.rs

use sqlx::{pool::PoolConnection, Postgres};

use crate::{common::error::AppError, config::AppState, middleware::tenancy::TenantContext};

/// Pega uma conexão do pool já marcada com a oficina da requisição
/// (`current_setting('app.owner_id')`). Os repositórios filtram por owner_id de qualquer forma.
pub async fn get_rls_connection(
    app_state: &AppState,
    tenant: &TenantContext,
) -> Result<PoolConnection<Postgres>, AppError> {
    let mut conn = app_state.db_pool.acquire().await?;

    sqlx::query("SELECT set_config('app.owner_id', $1, false)")
        .bind(tenant.owner_id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(conn)
}
