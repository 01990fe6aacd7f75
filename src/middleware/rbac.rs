// src/middleware/rbac.rs

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::AccessRole,
};

/// Define quais papéis passam por uma rota.
pub trait RoleDef: Send + Sync + 'static {
    fn allows(access: &AccessRole) -> bool;
}

/// Guardião: `_: RequireRole<WorkshopAdmin>` na assinatura do handler.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();

        let access = parts
            .extensions
            .get::<AuthenticatedUser>()
            .map(|auth| auth.access)
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

        if !T::allows(&access) {
            tracing::warn!("Acesso negado para o papel {:?}", access.user_role());
            return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// PAPÉIS
// ---

/// Dono da oficina (ou admin da plataforma operando uma oficina).
pub struct WorkshopAdmin;
impl RoleDef for WorkshopAdmin {
    fn allows(access: &AccessRole) -> bool {
        matches!(access, AccessRole::Admin { .. } | AccessRole::PlatformAdmin)
    }
}

/// Quem trabalha na oficina: dono e mecânicos.
pub struct WorkshopStaff;
impl RoleDef for WorkshopStaff {
    fn allows(access: &AccessRole) -> bool {
        !matches!(access, AccessRole::Client { .. })
    }
}

pub struct MechanicOnly;
impl RoleDef for MechanicOnly {
    fn allows(access: &AccessRole) -> bool {
        matches!(access, AccessRole::Mechanic { .. })
    }
}

pub struct ClientOnly;
impl RoleDef for ClientOnly {
    fn allows(access: &AccessRole) -> bool {
        matches!(access, AccessRole::Client { .. })
    }
}

pub struct PlatformAdminOnly;
impl RoleDef for PlatformAdminOnly {
    fn allows(access: &AccessRole) -> bool {
        matches!(access, AccessRole::PlatformAdmin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn roles() -> [AccessRole; 4] {
        let owner_id = Uuid::new_v4();
        [
            AccessRole::Admin { owner_id },
            AccessRole::Mechanic { owner_id, mechanic_id: Uuid::new_v4() },
            AccessRole::PlatformAdmin,
            AccessRole::Client { owner_id, client_id: Uuid::new_v4() },
        ]
    }

    #[test]
    fn admin_routes_accept_owner_and_platform_admin() {
        let [admin, mechanic, platform, client] = roles();
        assert!(WorkshopAdmin::allows(&admin));
        assert!(WorkshopAdmin::allows(&platform));
        assert!(!WorkshopAdmin::allows(&mechanic));
        assert!(!WorkshopAdmin::allows(&client));
    }

    #[test]
    fn clients_never_reach_staff_routes() {
        let [admin, mechanic, platform, client] = roles();
        assert!(WorkshopStaff::allows(&admin));
        assert!(WorkshopStaff::allows(&mechanic));
        assert!(WorkshopStaff::allows(&platform));
        assert!(!WorkshopStaff::allows(&client));
    }

    #[test]
    fn single_role_guards() {
        let [admin, mechanic, platform, client] = roles();
        assert!(MechanicOnly::allows(&mechanic) && !MechanicOnly::allows(&admin));
        assert!(ClientOnly::allows(&client) && !ClientOnly::allows(&mechanic));
        assert!(PlatformAdminOnly::allows(&platform) && !PlatformAdminOnly::allows(&admin));
    }
}
