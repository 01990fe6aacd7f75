// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Mechanic,
    PlatformAdmin,
    Client,
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[schema(example = "Oficina do Zé")]
    pub name: String,
    #[schema(example = "ze@oficina.com")]
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Papel de acesso resolvido uma única vez no login e carregado no token.
/// A oficina (owner_id) de cada requisição sai daqui.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessRole {
    Admin { owner_id: Uuid },
    Mechanic { owner_id: Uuid, mechanic_id: Uuid },
    PlatformAdmin,
    Client { owner_id: Uuid, client_id: Uuid },
}

impl AccessRole {
    /// Oficina fixa do papel. O admin da plataforma escolhe a oficina por cabeçalho.
    pub fn owner_id(&self) -> Option<Uuid> {
        match self {
            AccessRole::Admin { owner_id }
            | AccessRole::Mechanic { owner_id, .. }
            | AccessRole::Client { owner_id, .. } => Some(*owner_id),
            AccessRole::PlatformAdmin => None,
        }
    }

    pub fn user_role(&self) -> UserRole {
        match self {
            AccessRole::Admin { .. } => UserRole::Admin,
            AccessRole::Mechanic { .. } => UserRole::Mechanic,
            AccessRole::PlatformAdmin => UserRole::PlatformAdmin,
            AccessRole::Client { .. } => UserRole::Client,
        }
    }
}

// Dados para registro de um novo usuário (dono de oficina)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres."))]
    #[schema(example = "Oficina do Zé")]
    pub name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "ze@oficina.com")]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    #[schema(example = "segredo123")]
    pub password: String,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "ze@oficina.com")]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    #[schema(example = "segredo123")]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PasswordResetRequestPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetConfirmPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(equal = 6, message = "O código deve ter 6 dígitos."))]
    #[schema(example = "482913")]
    pub code: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub new_password: String,
}

// Cadastro de mecânico a partir do convite (link com o id da oficina)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MechanicSignupPayload {
    pub workshop_id: Uuid,
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres."))]
    pub name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    pub phone: Option<String>,
    pub specialty: Option<String>,
}

// Cadastro do cliente a partir do convite (link com o id do cliente)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientSignupPayload {
    pub client_id: Uuid,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub access: AccessRole,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: User,
    pub access: AccessRole,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // ID do usuário
    pub access: AccessRole,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PasswordReset {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_role_serializes_as_tagged_variant() {
        let owner = Uuid::new_v4();
        let mechanic = Uuid::new_v4();
        let value = serde_json::to_value(AccessRole::Mechanic { owner_id: owner, mechanic_id: mechanic }).unwrap();

        assert_eq!(value["kind"], "MECHANIC");
        assert_eq!(value["owner_id"], owner.to_string());

        let back: AccessRole = serde_json::from_value(value).unwrap();
        assert_eq!(back.owner_id(), Some(owner));
        assert_eq!(back.user_role(), UserRole::Mechanic);
    }

    #[test]
    fn platform_admin_has_no_fixed_workshop() {
        assert_eq!(AccessRole::PlatformAdmin.owner_id(), None);
    }
}
