// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        tenancy::{resolve_tenant, TENANT_ID_HEADER},
    },
    models::auth::{AccessRole, User},
};

/// Usuário do token, com o papel resolvido no login.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub access: AccessRole,
}

async fn authenticate(
    app_state: &AppState,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<AuthenticatedUser, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::InvalidToken)?;
    let (user, access) = app_state.auth_service.validate_token(bearer.token()).await?;
    Ok(AuthenticatedUser { user, access })
}

/// Exige um token válido. Usado nas rotas que não dependem de oficina (/me, plataforma).
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(&app_state, bearer)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    request.extensions_mut().insert(auth);
    Ok(next.run(request).await)
}

/// Token válido + oficina resolvida. Insere `AuthenticatedUser` e `TenantContext`.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(&app_state, bearer)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let header = request
        .headers()
        .get(TENANT_ID_HEADER)
        .and_then(|value| value.to_str().ok());

    let tenant = resolve_tenant(auth.user.id, auth.access, header)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::debug!("Requisição de {} na oficina {}", auth.user.id, tenant.owner_id);

    request.extensions_mut().insert(tenant);
    request.extensions_mut().insert(auth);
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Usuário não autenticado."))
    }
}
