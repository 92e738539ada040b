//! Accounts, credentials and sessions.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use safenet_common::{AppError, AppResult, IdGenerator, config::BootstrapConfig};
use safenet_db::{
    entities::{
        organization, session,
        user::{self, Role},
    },
    repositories::{OrganizationRepository, SessionRepository, UserRepository},
};
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::Deserialize;
use validator::Validate;

use super::audit::{AuditEvent, AuditLogger};

/// Minimum password length for every account.
pub const MIN_PASSWORD_LENGTH: u64 = 8;

/// Input for registering a provider organization and its first account.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterProviderInput {
    #[validate(length(min = 1, max = 200))]
    pub org_name: String,

    #[validate(length(min = 1, max = 50))]
    pub category: String,

    #[validate(length(min = 1, max = 2000))]
    pub address: String,

    #[validate(length(min = 1, max = 20))]
    pub phone: String,

    /// Organization contact address, also used for the account.
    #[validate(email, length(max = 120))]
    pub email: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 80))]
    pub username: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    pub confirm_password: String,
}

/// Input for changing one's own password.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordInput {
    pub current_password: String,

    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: user::Model,
    pub session: session::Model,
}

/// Account service for identity and credential operations.
#[derive(Clone)]
pub struct AccountService {
    db: Arc<DatabaseConnection>,
    user_repo: UserRepository,
    org_repo: OrganizationRepository,
    session_repo: SessionRepository,
    audit: AuditLogger,
    id_gen: IdGenerator,
    session_ttl: Duration,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        user_repo: UserRepository,
        org_repo: OrganizationRepository,
        session_repo: SessionRepository,
        audit: AuditLogger,
        session_ttl_hours: i64,
    ) -> Self {
        Self {
            db,
            user_repo,
            org_repo,
            session_repo,
            audit,
            id_gen: IdGenerator::new(),
            session_ttl: Duration::hours(session_ttl_hours),
        }
    }

    /// Register an unverified organization together with its provider account.
    pub async fn register_provider(
        &self,
        input: RegisterProviderInput,
        client_ip: Option<&str>,
    ) -> AppResult<(organization::Model, user::Model)> {
        input.validate()?;

        if input.password != input.confirm_password {
            return Err(AppError::Validation("Passwords do not match".to_string()));
        }

        let username = input.username.trim().to_string();
        let email = input.email.trim().to_string();

        if self.user_repo.username_exists(&username).await? {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
        if self.user_repo.email_exists(&email).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let now = Utc::now();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let org = self
            .org_repo
            .create_in(
                &txn,
                organization::ActiveModel {
                    name: Set(input.org_name.trim().to_string()),
                    category: Set(input.category.trim().to_string()),
                    address: Set(input.address.trim().to_string()),
                    contact_phone: Set(input.phone.trim().to_string()),
                    contact_email: Set(email.clone()),
                    description: Set(non_blank(input.description)),
                    is_verified: Set(false),
                    verification_date: Set(None),
                    created_at: Set(now.into()),
                    rating: Set(0.0),
                    response_time_hours: Set(24),
                    logo_url: Set(None),
                    ..Default::default()
                },
            )
            .await?;

        let user = self
            .user_repo
            .create_in(
                &txn,
                user::ActiveModel {
                    username: Set(username),
                    email: Set(email),
                    password_hash: Set(password_hash),
                    role: Set(Role::Provider),
                    organization_id: Set(Some(org.id)),
                    is_active: Set(true),
                    created_at: Set(now.into()),
                    last_login: Set(None),
                    updated_at: Set(None),
                    ..Default::default()
                },
            )
            .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(organization_id = org.id, user_id = user.id, "Provider registered");
        self.audit
            .record(
                AuditEvent::ProviderRegistered,
                Some(user.id),
                client_ip,
                format!("Organization {} ({}) registered", org.id, org.name),
            )
            .await;

        Ok((org, user))
    }

    /// Log in through a role-specific entry point.
    ///
    /// Unknown users, wrong passwords, inactive accounts and accounts of the
    /// other role all produce the same `Unauthorized` error.
    pub async fn login(
        &self,
        role: Role,
        username: &str,
        password: &str,
        client_ip: Option<&str>,
    ) -> AppResult<LoginOutcome> {
        let (success_event, failure_event) = match role {
            Role::Admin => (AuditEvent::AdminLoginSuccess, AuditEvent::AdminLoginFailure),
            Role::Provider => (
                AuditEvent::ProviderLoginSuccess,
                AuditEvent::ProviderLoginFailure,
            ),
        };

        let candidate = self.user_repo.find_by_username(username.trim()).await?;

        let user = match candidate {
            Some(user)
                if user.role == role
                    && user.is_active
                    && verify_password(password, &user.password_hash).unwrap_or(false) =>
            {
                user
            }
            other => {
                let user_id = other.map(|u| u.id);
                tracing::info!(?user_id, role = role.as_str(), "Login failed");
                self.audit
                    .record(
                        failure_event,
                        user_id,
                        client_ip,
                        format!("Failed {} login", role.as_str()),
                    )
                    .await;
                return Err(AppError::Unauthorized);
            }
        };

        let now = Utc::now();
        let mut active: user::ActiveModel = user.into();
        active.last_login = Set(Some(now.into()));
        let user = self.user_repo.update(active).await?;

        let session = self
            .session_repo
            .create(session::ActiveModel {
                token: Set(self.id_gen.generate_token()),
                user_id: Set(user.id),
                created_at: Set(now.into()),
                expires_at: Set((now + self.session_ttl).into()),
            })
            .await?;

        tracing::info!(user_id = user.id, role = role.as_str(), "Login succeeded");
        self.audit
            .record(success_event, Some(user.id), client_ip, "Login succeeded")
            .await;

        Ok(LoginOutcome { user, session })
    }

    /// End a session.
    pub async fn logout(
        &self,
        token: &str,
        user_id: i32,
        client_ip: Option<&str>,
    ) -> AppResult<()> {
        self.session_repo.delete(token).await?;
        self.audit
            .record(AuditEvent::Logout, Some(user_id), client_ip, "User logged out")
            .await;
        Ok(())
    }

    /// Change the password of the calling user.
    pub async fn change_password(
        &self,
        user_id: i32,
        input: ChangePasswordInput,
        client_ip: Option<&str>,
    ) -> AppResult<()> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;
        if !verify_password(&input.current_password, &user.password_hash)? {
            return Err(AppError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(hash_password(&input.new_password)?);
        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(active).await?;

        self.audit
            .record(
                AuditEvent::PasswordChanged,
                Some(user_id),
                client_ip,
                "Password changed",
            )
            .await;
        Ok(())
    }

    /// Resolve a session token to its active user.
    pub async fn authenticate_session(&self, token: &str) -> AppResult<user::Model> {
        let session = self
            .session_repo
            .find_valid(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        match self.user_repo.find_by_id(session.user_id).await? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(AppError::Unauthorized),
        }
    }

    /// Delete expired sessions.
    pub async fn purge_expired_sessions(&self) -> AppResult<u64> {
        let removed = self.session_repo.delete_expired().await?;
        if removed > 0 {
            tracing::debug!(removed, "Purged expired sessions");
        }
        Ok(removed)
    }

    /// Ensure the configured administrator exists.
    ///
    /// Creates the account when no administrator exists yet. An existing
    /// administrator with the configured username only has its password
    /// replaced when `reset_password` is set. Returns the account that was
    /// created or reset.
    pub async fn bootstrap_admin(
        &self,
        config: &BootstrapConfig,
    ) -> AppResult<Option<user::Model>> {
        if (config.admin_password.len() as u64) < MIN_PASSWORD_LENGTH {
            return Err(AppError::Config(format!(
                "bootstrap admin password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        if let Some(existing) = self.user_repo.find_by_username(&config.admin_username).await? {
            if existing.role != Role::Admin {
                return Err(AppError::Conflict(format!(
                    "Username {} belongs to a non-admin account",
                    config.admin_username
                )));
            }
            if !config.reset_password {
                return Ok(None);
            }

            let mut active: user::ActiveModel = existing.into();
            active.password_hash = Set(hash_password(&config.admin_password)?);
            active.is_active = Set(true);
            active.updated_at = Set(Some(Utc::now().into()));
            let admin = self.user_repo.update(active).await?;

            tracing::warn!(user_id = admin.id, "Administrator password reset from configuration");
            self.audit
                .record(
                    AuditEvent::AdminBootstrapped,
                    Some(admin.id),
                    None,
                    "Administrator password reset",
                )
                .await;
            return Ok(Some(admin));
        }

        if self.user_repo.find_first_admin().await?.is_some() {
            return Ok(None);
        }

        if self.user_repo.email_exists(&config.admin_email).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let admin = self
            .user_repo
            .create(user::ActiveModel {
                username: Set(config.admin_username.clone()),
                email: Set(config.admin_email.clone()),
                password_hash: Set(hash_password(&config.admin_password)?),
                role: Set(Role::Admin),
                organization_id: Set(None),
                is_active: Set(true),
                created_at: Set(Utc::now().into()),
                last_login: Set(None),
                updated_at: Set(None),
                ..Default::default()
            })
            .await?;

        tracing::info!(user_id = admin.id, "Administrator account created");
        self.audit
            .record(
                AuditEvent::AdminBootstrapped,
                Some(admin.id),
                None,
                "Administrator account created",
            )
            .await;

        Ok(Some(admin))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Hash a password using Argon2.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use safenet_common::IpHasher;
    use safenet_db::repositories::SystemLogRepository;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, RuntimeErr};

    struct Mocks {
        txn: MockDatabase,
        users: MockDatabase,
        orgs: MockDatabase,
        sessions: MockDatabase,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                txn: MockDatabase::new(DatabaseBackend::Postgres),
                users: MockDatabase::new(DatabaseBackend::Postgres),
                orgs: MockDatabase::new(DatabaseBackend::Postgres),
                sessions: MockDatabase::new(DatabaseBackend::Postgres),
            }
        }

        fn into_service(self) -> AccountService {
            let audit = AuditLogger::new(
                SystemLogRepository::new(Arc::new(
                    MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
                )),
                IpHasher::new("test"),
            );
            AccountService::new(
                Arc::new(self.txn.into_connection()),
                UserRepository::new(Arc::new(self.users.into_connection())),
                OrganizationRepository::new(Arc::new(self.orgs.into_connection())),
                SessionRepository::new(Arc::new(self.sessions.into_connection())),
                audit,
                12,
            )
        }
    }

    fn count_row(n: i64) -> [std::collections::BTreeMap<&'static str, sea_orm::Value>; 1] {
        [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }]
    }

    fn test_user(id: i32, role: Role, password: &str) -> user::Model {
        user::Model {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.org"),
            password_hash: hash_password(password).unwrap(),
            role,
            organization_id: (role == Role::Provider).then_some(10),
            is_active: true,
            created_at: Utc::now().into(),
            last_login: None,
            updated_at: None,
        }
    }

    fn test_org(id: i32) -> organization::Model {
        organization::Model {
            id,
            name: "Harbor Legal Aid".to_string(),
            category: "Legal Aid".to_string(),
            address: "4 Quay Street".to_string(),
            contact_phone: "+15550000".to_string(),
            contact_email: "help@harbor.example".to_string(),
            description: None,
            is_verified: false,
            verification_date: None,
            created_at: Utc::now().into(),
            rating: 0.0,
            response_time_hours: 24,
            logo_url: None,
        }
    }

    fn register_input() -> RegisterProviderInput {
        RegisterProviderInput {
            org_name: "Harbor Legal Aid".to_string(),
            category: "Legal Aid".to_string(),
            address: "4 Quay Street".to_string(),
            phone: "+15550000".to_string(),
            email: "help@harbor.example".to_string(),
            description: Some("  ".to_string()),
            username: "harbor".to_string(),
            password: "correct horse".to_string(),
            confirm_password: "correct horse".to_string(),
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("test_password_123", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
        assert!(verify_password("test", "invalid_hash").is_err());
    }

    #[tokio::test]
    async fn test_register_rejects_mismatched_passwords() {
        let service = Mocks::new().into_service();
        let mut input = register_input();
        input.confirm_password = "something else".to_string();

        let result = service.register_provider(input, None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let service = Mocks::new().into_service();
        let mut input = register_input();
        input.password = "short".to_string();
        input.confirm_password = "short".to_string();

        let result = service.register_provider(input, None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_duplicate_username_conflicts() {
        let mut mocks = Mocks::new();
        mocks.users = mocks.users.append_query_results([count_row(1)]);
        let service = mocks.into_service();

        let result = service.register_provider(register_input(), None).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_race_on_unique_username_conflicts() {
        // Both pre-checks pass; a concurrent registration wins the insert.
        let mut mocks = Mocks::new();
        mocks.users = mocks
            .users
            .append_query_results([count_row(0)])
            .append_query_results([count_row(0)]);
        mocks.txn = mocks
            .txn
            .append_query_results([[test_org(10)]])
            .append_query_errors([DbErr::Query(RuntimeErr::Internal(
                "duplicate key value violates unique constraint \"user_username_key\"".to_string(),
            ))]);
        let service = mocks.into_service();

        let result = service.register_provider(register_input(), None).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_creates_unverified_org_and_provider() {
        let org = test_org(10);
        let user = test_user(5, Role::Provider, "correct horse");

        let mut mocks = Mocks::new();
        mocks.users = mocks
            .users
            .append_query_results([count_row(0)])
            .append_query_results([count_row(0)]);
        mocks.txn = mocks
            .txn
            .append_query_results([[org.clone()]])
            .append_query_results([[user.clone()]]);
        let service = mocks.into_service();

        let (created_org, created_user) =
            service.register_provider(register_input(), Some("198.51.100.4")).await.unwrap();

        assert!(!created_org.is_verified);
        assert_eq!(created_user.role, Role::Provider);
        assert_eq!(created_user.organization_id, Some(created_org.id));
    }

    #[tokio::test]
    async fn test_login_wrong_role_is_unauthorized() {
        let provider = test_user(5, Role::Provider, "correct horse");

        let mut mocks = Mocks::new();
        mocks.users = mocks.users.append_query_results([[provider]]);
        let service = mocks.into_service();

        let result = service
            .login(Role::Admin, "user5", "correct horse", None)
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_unauthorized() {
        let admin = test_user(1, Role::Admin, "correct horse");

        let mut mocks = Mocks::new();
        mocks.users = mocks.users.append_query_results([[admin]]);
        let service = mocks.into_service();

        let result = service.login(Role::Admin, "user1", "battery staple", None).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_unknown_user_is_unauthorized() {
        let mut mocks = Mocks::new();
        mocks.users = mocks.users.append_query_results([Vec::<user::Model>::new()]);
        let service = mocks.into_service();

        let result = service.login(Role::Provider, "ghost", "whatever1", None).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_success_creates_session() {
        let admin = test_user(1, Role::Admin, "correct horse");
        let now = Utc::now();
        let session = session::Model {
            token: "t".repeat(43),
            user_id: 1,
            created_at: now.into(),
            expires_at: (now + Duration::hours(12)).into(),
        };

        let mut mocks = Mocks::new();
        mocks.users = mocks
            .users
            .append_query_results([[admin.clone()]])
            .append_query_results([[admin]]);
        mocks.sessions = mocks.sessions.append_query_results([[session]]);
        let service = mocks.into_service();

        let outcome = service
            .login(Role::Admin, "user1", "correct horse", None)
            .await
            .unwrap();
        assert_eq!(outcome.user.id, 1);
        assert_eq!(outcome.session.user_id, 1);
    }

    #[tokio::test]
    async fn test_authenticate_session_rejects_inactive_user() {
        let now = Utc::now();
        let session = session::Model {
            token: "tok".to_string(),
            user_id: 1,
            created_at: now.into(),
            expires_at: (now + Duration::hours(1)).into(),
        };
        let mut user = test_user(1, Role::Provider, "correct horse");
        user.is_active = false;

        let mut mocks = Mocks::new();
        mocks.sessions = mocks.sessions.append_query_results([[session]]);
        mocks.users = mocks.users.append_query_results([[user]]);
        let service = mocks.into_service();

        let result = service.authenticate_session("tok").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_change_password_requires_current_password() {
        let user = test_user(1, Role::Provider, "correct horse");

        let mut mocks = Mocks::new();
        mocks.users = mocks.users.append_query_results([[user]]);
        let service = mocks.into_service();

        let input = ChangePasswordInput {
            current_password: "not it".to_string(),
            new_password: "a much better one".to_string(),
        };
        let result = service.change_password(1, input, None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_bootstrap_skips_when_admin_exists() {
        let existing = test_user(1, Role::Admin, "correct horse");

        let mut mocks = Mocks::new();
        mocks.users = mocks
            .users
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[existing]]);
        let service = mocks.into_service();

        let config = BootstrapConfig {
            admin_username: "root".to_string(),
            admin_email: "root@example.org".to_string(),
            admin_password: "long enough".to_string(),
            reset_password: false,
        };
        assert!(service.bootstrap_admin(&config).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_creates_admin() {
        let created = test_user(1, Role::Admin, "long enough");

        let mut mocks = Mocks::new();
        mocks.users = mocks
            .users
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([count_row(0)])
            .append_query_results([[created]]);
        let service = mocks.into_service();

        let config = BootstrapConfig {
            admin_username: "user1".to_string(),
            admin_email: "user1@example.org".to_string(),
            admin_password: "long enough".to_string(),
            reset_password: false,
        };
        let admin = service.bootstrap_admin(&config).await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.organization_id.is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_rejects_short_password() {
        let service = Mocks::new().into_service();
        let config = BootstrapConfig {
            admin_username: "root".to_string(),
            admin_email: "root@example.org".to_string(),
            admin_password: "short".to_string(),
            reset_password: false,
        };
        assert!(matches!(
            service.bootstrap_admin(&config).await,
            Err(AppError::Config(_))
        ));
    }
}
