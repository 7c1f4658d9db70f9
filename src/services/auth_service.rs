use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::auth::{self, TokenError, TokenKeys, TokenType};
use crate::config::SecurityConfig;
use crate::models::{LoginRequest, RegisterRequest, TokenResponse, User};
use crate::store::UserStore;

use super::ServiceError;

/// Registration, login, refresh and identity resolution. Owns the token
/// keys; stores are injected through the constructor.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    keys: TokenKeys,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, security: &SecurityConfig) -> Result<Self, TokenError> {
        let keys = TokenKeys::new(security)?;
        Ok(Self { users, keys })
    }

    /// Create a new account. The raw password is hashed immediately and
    /// never logged or echoed back.
    pub async fn register(&self, req: RegisterRequest) -> Result<User, ServiceError> {
        validate_registration(&req)?;

        if self.users.find_by_username(&req.username).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Username '{}' already exists",
                req.username
            )));
        }
        if self.users.find_by_email(&req.email).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Email '{}' already exists",
                req.email
            )));
        }

        let password_hash = auth::hash_password(&req.password)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        let user = self
            .users
            .insert(User {
                id: Uuid::new_v4(),
                username: req.username,
                email: req.email,
                full_name: req.full_name,
                password_hash,
                is_active: true,
                is_admin: false,
                created_at: Utc::now(),
                last_login: None,
            })
            .await?;

        info!("Registered user {}", user.username);
        Ok(user)
    }

    /// Authenticate by username or email and mint the token pair
    pub async fn login(&self, req: LoginRequest) -> Result<TokenResponse, ServiceError> {
        let user = self
            .users
            .find_by_username_or_email(&req.username)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid username or password".to_string()))?;

        if !auth::verify_password(&req.password, &user.password_hash) {
            return Err(ServiceError::Unauthorized(
                "Invalid username or password".to_string(),
            ));
        }

        if !user.is_active {
            return Err(ServiceError::Unauthorized(
                "User account is inactive".to_string(),
            ));
        }

        self.users.set_last_login(user.id, Utc::now()).await?;

        let access_token = self.generate(&user, TokenType::Access)?;
        let refresh_token = self.generate(&user, TokenType::Refresh)?;

        info!("User {} logged in", user.username);
        Ok(TokenResponse {
            access_token,
            refresh_token: Some(refresh_token),
            token_type: "bearer".to_string(),
            expires_in: self.keys.access_expiry_secs(),
        })
    }

    /// Exchange a valid refresh token for a fresh access token. The refresh
    /// token itself is neither rotated nor extended.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, ServiceError> {
        let claims = self
            .keys
            .verify(refresh_token, TokenType::Refresh)
            .map_err(|_| ServiceError::Unauthorized("Invalid or expired token".to_string()))?;

        let user = self.resolve_subject(claims.sub).await?;
        let access_token = self.generate(&user, TokenType::Access)?;

        Ok(TokenResponse {
            access_token,
            refresh_token: None,
            token_type: "bearer".to_string(),
            expires_in: self.keys.access_expiry_secs(),
        })
    }

    /// Resolve the identity behind an access token
    pub async fn current_user(&self, access_token: &str) -> Result<User, ServiceError> {
        let claims = self
            .keys
            .verify(access_token, TokenType::Access)
            .map_err(|_| ServiceError::Unauthorized("Invalid or expired token".to_string()))?;

        self.resolve_subject(claims.sub).await
    }

    /// Fetch the full record for an already-authenticated user id
    pub async fn user_by_id(&self, user_id: Uuid) -> Result<User, ServiceError> {
        self.resolve_subject(user_id).await
    }

    async fn resolve_subject(&self, user_id: Uuid) -> Result<User, ServiceError> {
        let user = self
            .users
            .find(user_id)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("User not found".to_string()))?;

        if !user.is_active {
            return Err(ServiceError::Unauthorized(
                "User account is inactive".to_string(),
            ));
        }

        Ok(user)
    }

    fn generate(&self, user: &User, token_type: TokenType) -> Result<String, ServiceError> {
        self.keys
            .generate(user.id, &user.username, token_type)
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }
}

fn validate_registration(req: &RegisterRequest) -> Result<(), ServiceError> {
    let mut field_errors = HashMap::new();

    if req.username.len() < 3 || req.username.len() > 100 {
        field_errors.insert(
            "username".to_string(),
            "Username must be between 3 and 100 characters".to_string(),
        );
    }
    if !req.email.contains('@') || req.email.len() > 255 {
        field_errors.insert("email".to_string(), "Invalid email address".to_string());
    }
    if req.full_name.is_empty() || req.full_name.len() > 255 {
        field_errors.insert(
            "full_name".to_string(),
            "Full name must be between 1 and 255 characters".to_string(),
        );
    }
    if req.password.len() < 6 || req.password.len() > 100 {
        field_errors.insert(
            "password".to_string(),
            "Password must be between 6 and 100 characters".to_string(),
        );
    }

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Validation {
            message: "Invalid registration data".to_string(),
            field_errors: Some(field_errors),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::store::MemoryStore;

    fn service() -> AuthService {
        let mut config = AppConfig::default();
        config.security.jwt_secret = "test-secret".to_string();
        AuthService::new(Arc::new(MemoryStore::default()), &config.security).unwrap()
    }

    fn alice() -> RegisterRequest {
        RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            full_name: "Alice Example".to_string(),
            password: "correct-horse".to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_login_round_trip() {
        let service = service();
        let user = service.register(alice()).await.unwrap();
        assert!(user.is_active);

        let tokens = service
            .login(LoginRequest {
                username: "alice".to_string(),
                password: "correct-horse".to_string(),
            })
            .await
            .unwrap();

        let me = service.current_user(&tokens.access_token).await.unwrap();
        assert_eq!(me.id, user.id);
        assert!(me.last_login.is_some());
    }

    #[tokio::test]
    async fn login_by_email_works() {
        let service = service();
        service.register(alice()).await.unwrap();

        let tokens = service
            .login(LoginRequest {
                username: "alice@example.com".to_string(),
                password: "correct-horse".to_string(),
            })
            .await;
        assert!(tokens.is_ok());
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let service = service();
        service.register(alice()).await.unwrap();

        let mut second = alice();
        second.email = "other@example.com".to_string();
        let err = service.register(second).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let service = service();
        service.register(alice()).await.unwrap();

        let mut second = alice();
        second.username = "alice2".to_string();
        let err = service.register(second).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn username_uniqueness_is_case_sensitive() {
        let service = service();
        service.register(alice()).await.unwrap();

        let mut second = alice();
        second.username = "Alice".to_string();
        second.email = "other@example.com".to_string();
        assert!(service.register(second).await.is_ok());
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let service = service();
        service.register(alice()).await.unwrap();

        let err = service
            .login(LoginRequest {
                username: "alice".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn short_password_fails_validation() {
        let service = service();
        let mut req = alice();
        req.password = "short".to_string();

        let err = service.register(req).await.unwrap_err();
        match err {
            ServiceError::Validation { field_errors, .. } => {
                assert!(field_errors.unwrap().contains_key("password"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn refresh_token_not_accepted_as_access_token() {
        let service = service();
        service.register(alice()).await.unwrap();
        let tokens = service
            .login(LoginRequest {
                username: "alice".to_string(),
                password: "correct-horse".to_string(),
            })
            .await
            .unwrap();

        let refresh_token = tokens.refresh_token.unwrap();
        assert!(matches!(
            service.current_user(&refresh_token).await,
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn access_token_not_accepted_for_refresh() {
        let service = service();
        service.register(alice()).await.unwrap();
        let tokens = service
            .login(LoginRequest {
                username: "alice".to_string(),
                password: "correct-horse".to_string(),
            })
            .await
            .unwrap();

        assert!(matches!(
            service.refresh(&tokens.access_token).await,
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn refresh_mints_new_access_token_only() {
        let service = service();
        service.register(alice()).await.unwrap();
        let tokens = service
            .login(LoginRequest {
                username: "alice".to_string(),
                password: "correct-horse".to_string(),
            })
            .await
            .unwrap();

        let refreshed = service.refresh(&tokens.refresh_token.unwrap()).await.unwrap();
        assert!(refreshed.refresh_token.is_none());
        assert!(service.current_user(&refreshed.access_token).await.is_ok());
    }
}
