// src/middleware/tenancy.rs

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    models::auth::AccessRole,
};

// Só o admin da plataforma usa este cabeçalho para escolher a oficina
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

/// Oficina da requisição, resolvida pelo `tenant_guard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    pub owner_id: Uuid,
    pub user_id: Uuid,
    pub access: AccessRole,
}

impl TenantContext {
    pub fn mechanic_id(&self) -> Option<Uuid> {
        match self.access {
            AccessRole::Mechanic { mechanic_id, .. } => Some(mechanic_id),
            _ => None,
        }
    }

    pub fn client_id(&self) -> Option<Uuid> {
        match self.access {
            AccessRole::Client { client_id, .. } => Some(client_id),
            _ => None,
        }
    }
}

/// O owner_id vem do papel. O admin da plataforma precisa informar o cabeçalho.
pub fn resolve_tenant(user_id: Uuid, access: AccessRole, header: Option<&str>) -> Result<TenantContext, AppError> {
    let owner_id = match access.owner_id() {
        Some(owner_id) => owner_id,
        None => {
            let raw = header.ok_or(AppError::TenantRequired)?;
            Uuid::parse_str(raw.trim()).map_err(|_| AppError::InvalidTenantHeader)?
        }
    };

    Ok(TenantContext { owner_id, user_id, access })
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .copied()
            .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Contexto da oficina não encontrado."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workshop_roles_ignore_the_header() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4().to_string();
        let ctx = resolve_tenant(Uuid::new_v4(), AccessRole::Admin { owner_id: owner }, Some(&other)).unwrap();
        assert_eq!(ctx.owner_id, owner);
    }

    #[test]
    fn platform_admin_picks_workshop_by_header() {
        let owner = Uuid::new_v4();
        let ctx = resolve_tenant(Uuid::new_v4(), AccessRole::PlatformAdmin, Some(&owner.to_string())).unwrap();
        assert_eq!(ctx.owner_id, owner);
    }

    #[test]
    fn platform_admin_without_header_is_rejected() {
        let err = resolve_tenant(Uuid::new_v4(), AccessRole::PlatformAdmin, None).unwrap_err();
        assert!(matches!(err, AppError::TenantRequired));

        let err = resolve_tenant(Uuid::new_v4(), AccessRole::PlatformAdmin, Some("nao-e-uuid")).unwrap_err();
        assert!(matches!(err, AppError::InvalidTenantHeader));
    }

    #[test]
    fn exposes_mechanic_and_client_ids() {
        let mechanic = Uuid::new_v4();
        let ctx = resolve_tenant(
            Uuid::new_v4(),
            AccessRole::Mechanic { owner_id: Uuid::new_v4(), mechanic_id: mechanic },
            None,
        )
        .unwrap();
        assert_eq!(ctx.mechanic_id(), Some(mechanic));
        assert_eq!(ctx.client_id(), None);
    }
}
