// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CrmRepository, TeamRepository, UserRepository},
    models::{
        auth::{AccessRole, AuthResponse, Claims, User, UserRole},
        team::{EmploymentType, MechanicDraft},
    },
};

const TOKEN_TTL_DAYS: i64 = 7;
const RESET_CODE_TTL_MINUTES: i64 = 30;

/// Decide o papel de acesso de um usuário. A ordem importa:
/// admin da plataforma, mecânico vinculado, cliente vinculado e, por fim, dono de oficina.
pub fn resolve_access(
    user: &User,
    platform_admin_email: Option<&str>,
    mechanic_link: Option<(Uuid, Uuid)>,
    client_link: Option<(Uuid, Uuid)>,
) -> AccessRole {
    if platform_admin_email.is_some_and(|admin| admin.eq_ignore_ascii_case(&user.email)) {
        return AccessRole::PlatformAdmin;
    }
    if let Some((owner_id, mechanic_id)) = mechanic_link {
        return AccessRole::Mechanic { owner_id, mechanic_id };
    }
    if let Some((owner_id, client_id)) = client_link {
        return AccessRole::Client { owner_id, client_id };
    }
    AccessRole::Admin { owner_id: user.id }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    crm_repo: CrmRepository,
    team_repo: TeamRepository,
    jwt_secret: String,
    platform_admin_email: Option<String>,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        crm_repo: CrmRepository,
        team_repo: TeamRepository,
        jwt_secret: String,
        platform_admin_email: Option<String>,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, crm_repo, team_repo, jwt_secret, platform_admin_email, pool }
    }

    /// Cadastro de um dono de oficina. O id do usuário vira o owner_id da oficina.
    pub async fn register_user(&self, name: &str, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let email = normalize_email(email);
        let hashed_password = hash_password(password).await?;

        let user = self
            .user_repo
            .create_user(&self.pool, name.trim(), &email, &hashed_password, UserRole::Admin)
            .await?;

        let access = self.resolve_for(&user).await?;
        tracing::info!("Nova oficina cadastrada: {}", user.id);
        self.issue(&user, access)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AppError::InactiveUser);
        }

        let access = self.resolve_for(&user).await?;
        self.issue(&user, access)
    }

    /// Valida o token e devolve o usuário com o papel gravado nas claims.
    pub async fn validate_token(&self, token: &str) -> Result<(User, AccessRole), AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let user = self
            .user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if !user.is_active {
            return Err(AppError::InactiveUser);
        }

        Ok((user, token_data.claims.access))
    }

    // =========================================================================
    //  CONVITES
    // =========================================================================

    /// Mecânico se cadastra pelo link de convite da oficina.
    pub async fn signup_mechanic(
        &self,
        workshop_id: Uuid,
        name: &str,
        email: &str,
        password: &str,
        phone: Option<&str>,
        specialty: Option<&str>,
    ) -> Result<AuthResponse, AppError> {
        let workshop = self
            .user_repo
            .find_by_id(workshop_id)
            .await?
            .filter(|u| u.role == UserRole::Admin)
            .ok_or_else(|| AppError::ResourceNotFound("Oficina".into()))?;

        let email = normalize_email(email);
        let hashed_password = hash_password(password).await?;

        let mut tx = self.pool.begin().await?;

        let user = self
            .user_repo
            .create_user(&mut *tx, name.trim(), &email, &hashed_password, UserRole::Mechanic)
            .await?;

        let draft = MechanicDraft {
            name: name.trim().to_string(),
            phone: phone.unwrap_or_default().to_string(),
            email: Some(email.clone()),
            specialty: specialty.map(str::to_string),
            active: true,
            employment_type: EmploymentType::Commission,
            base_salary: None,
            commission_rate: None,
        };
        let mechanic = self
            .team_repo
            .create_mechanic(&mut *tx, workshop.id, Some(user.id), &draft)
            .await?;

        tx.commit().await?;

        tracing::info!("Mecânico {} entrou na oficina {}", mechanic.id, workshop.id);
        self.issue(&user, AccessRole::Mechanic { owner_id: workshop.id, mechanic_id: mechanic.id })
    }

    /// Cliente conclui o cadastro pelo convite e passa a ter login no portal.
    pub async fn signup_client(&self, client_id: Uuid, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let email = normalize_email(email);
        let hashed_password = hash_password(password).await?;

        let mut tx = self.pool.begin().await?;

        let client = self
            .crm_repo
            .find_client_by_id(&mut *tx, client_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Cliente".into()))?;

        if client.user_id.is_some() {
            return Err(AppError::UniqueConstraintViolation("Cliente".into()));
        }

        let user = self
            .user_repo
            .create_user(&mut *tx, &client.name, &email, &hashed_password, UserRole::Client)
            .await?;
        self.crm_repo.link_client_user(&mut *tx, client.id, user.id).await?;

        tx.commit().await?;

        self.issue(&user, AccessRole::Client { owner_id: client.owner_id, client_id: client.id })
    }

    // =========================================================================
    //  RECUPERAÇÃO DE SENHA
    // =========================================================================

    /// Gera um código de 6 dígitos. E-mail desconhecido não gera erro.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let email = normalize_email(email);
        let Some(user) = self.user_repo.find_by_email(&email).await? else {
            tracing::debug!("Recuperação pedida para e-mail desconhecido");
            return Ok(());
        };

        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        let code_hash = hash_password(&code).await?;
        let expires_at = Utc::now() + Duration::minutes(RESET_CODE_TTL_MINUTES);

        self.user_repo
            .create_password_reset(&self.pool, user.id, &code_hash, expires_at)
            .await?;

        // Sem provedor de e-mail: o código sai no log
        tracing::info!("Código de verificação para {}: {}", email, code);
        Ok(())
    }

    pub async fn confirm_password_reset(&self, email: &str, code: &str, new_password: &str) -> Result<(), AppError> {
        let user = self
            .user_repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::InvalidResetCode)?;

        let reset = self
            .user_repo
            .latest_password_reset(&self.pool, user.id)
            .await?
            .filter(|r| r.used_at.is_none() && r.expires_at > Utc::now())
            .ok_or(AppError::InvalidResetCode)?;

        if !verify_password(code, &reset.code_hash).await? {
            return Err(AppError::InvalidResetCode);
        }

        let hashed_password = hash_password(new_password).await?;

        let mut tx = self.pool.begin().await?;
        self.user_repo.update_password(&mut *tx, user.id, &hashed_password).await?;
        self.user_repo.mark_reset_used(&mut *tx, reset.id).await?;
        tx.commit().await?;

        tracing::info!("Senha redefinida para o usuário {}", user.id);
        Ok(())
    }

    // =========================================================================
    //  TOKEN
    // =========================================================================

    async fn resolve_for(&self, user: &User) -> Result<AccessRole, AppError> {
        let mechanic_link = self.user_repo.find_mechanic_link(&self.pool, user.id).await?;
        let client_link = self.user_repo.find_client_link(&self.pool, user.id).await?;

        Ok(resolve_access(user, self.platform_admin_email.as_deref(), mechanic_link, client_link))
    }

    fn issue(&self, user: &User, access: AccessRole) -> Result<AuthResponse, AppError> {
        let token = self.create_token(user.id, access)?;
        Ok(AuthResponse { token, access })
    }

    fn create_token(&self, user_id: Uuid, access: AccessRole) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + Duration::days(TOKEN_TTL_DAYS);

        let claims = Claims {
            sub: user_id,
            access,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Fulano".into(),
            email: email.into(),
            password_hash: String::new(),
            role: UserRole::Admin,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn platform_admin_wins_over_links() {
        let u = user("root@plataforma.com");
        let link = Some((Uuid::new_v4(), Uuid::new_v4()));

        let access = resolve_access(&u, Some("ROOT@plataforma.com"), link, link);
        assert_eq!(access, AccessRole::PlatformAdmin);
    }

    #[test]
    fn mechanic_link_comes_before_client_link() {
        let u = user("mecanico@oficina.com");
        let owner = Uuid::new_v4();
        let mechanic = Uuid::new_v4();

        let access = resolve_access(&u, None, Some((owner, mechanic)), Some((Uuid::new_v4(), Uuid::new_v4())));
        assert_eq!(access, AccessRole::Mechanic { owner_id: owner, mechanic_id: mechanic });
    }

    #[test]
    fn client_link_resolves_to_client() {
        let u = user("cliente@email.com");
        let owner = Uuid::new_v4();
        let client = Uuid::new_v4();

        let access = resolve_access(&u, Some("admin@plataforma.com"), None, Some((owner, client)));
        assert_eq!(access, AccessRole::Client { owner_id: owner, client_id: client });
    }

    #[test]
    fn unlinked_user_owns_a_workshop() {
        let u = user("dono@oficina.com");
        assert_eq!(resolve_access(&u, None, None, None), AccessRole::Admin { owner_id: u.id });
    }

    #[test]
    fn normalizes_email() {
        assert_eq!(normalize_email("  Dono@Oficina.COM "), "dono@oficina.com");
    }
}
