use super::email::EmailProvider;
use super::jwt::JwtService;
use super::repository::{Filter, StoreError, Stores};
use super::ServiceError;
use crate::dtos::auth::{CreateUserRequest, LoginResponse, UserResponse};
use crate::models::{PasswordResetToken, Role, User};
use crate::utils::{hash_password_blocking, verify_password_blocking, Password};
use chrono::Utc;
use rand::RngCore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthService {
    stores: Stores,
    jwt: JwtService,
    email: Arc<dyn EmailProvider>,
    frontend_url: String,
}

impl AuthService {
    pub fn new(
        stores: Stores,
        jwt: JwtService,
        email: Arc<dyn EmailProvider>,
        frontend_url: String,
    ) -> Self {
        Self {
            stores,
            jwt,
            email,
            frontend_url,
        }
    }

    pub async fn login(&self, email: &str, password: String) -> Result<LoginResponse, ServiceError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        verify_password_blocking(Password::new(password), user.password_hash.clone())
            .await
            .map_err(|_| ServiceError::InvalidCredentials)?;

        let token = self.jwt.generate_token(&user)?;
        tracing::info!(user_id = %user.id, role = user.role.as_str(), "User logged in");

        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.expiry_seconds(),
            user: user.into(),
        })
    }

    pub async fn me(&self, user_id: &str) -> Result<UserResponse, ServiceError> {
        self.stores
            .users
            .get(user_id)
            .await?
            .map(UserResponse::from)
            .ok_or(ServiceError::NotFound("User"))
    }

    /// Succeeds whether or not the address belongs to a user.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ServiceError> {
        let Some(user) = self.find_by_email(email).await? else {
            tracing::info!("Password reset requested for unknown email");
            return Ok(());
        };

        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let reset = PasswordResetToken::issue(&user.id, hex::encode(bytes));
        self.stores.reset_tokens.insert(&reset).await?;

        if let Err(e) = self
            .email
            .send_password_reset_email(&user.email, &reset.token, &self.frontend_url)
            .await
        {
            tracing::error!(user_id = %user.id, error = %e, "Failed to send password reset email");
        } else {
            tracing::info!(user_id = %user.id, "Password reset email sent");
        }
        Ok(())
    }

    /// Consumes the token. Unknown and expired tokens are rejected alike.
    pub async fn reset_password(&self, token: &str, password: String) -> Result<(), ServiceError> {
        let reset = self
            .stores
            .reset_tokens
            .find_one(Filter::new().eq("token", token))
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        if reset.is_expired() {
            self.stores.reset_tokens.delete(&reset.id).await?;
            return Err(ServiceError::InvalidToken);
        }

        let mut user = self
            .stores
            .users
            .get(&reset.user_id)
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        // Single use: claim the token before changing anything.
        if !self.stores.reset_tokens.delete(&reset.id).await? {
            return Err(ServiceError::InvalidToken);
        }

        user.password_hash = hash_password_blocking(Password::new(password)).await?;
        user.updated_at = Utc::now();
        self.stores.users.replace(&user, None).await?;

        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }

    pub async fn create_user(&self, req: CreateUserRequest) -> Result<UserResponse, ServiceError> {
        let user = self
            .new_user(req.email, req.name, req.password, req.role)
            .await?;
        tracing::info!(user_id = %user.id, role = user.role.as_str(), "User created");
        Ok(user.into())
    }

    /// Creates the configured superadmin unless that email already exists.
    pub async fn bootstrap_superadmin(&self, email: &str, password: String) -> Result<(), ServiceError> {
        if self.find_by_email(email).await?.is_some() {
            return Ok(());
        }
        let user = self
            .new_user(
                email.to_string(),
                "Super Admin".to_string(),
                password,
                Role::Superadmin,
            )
            .await?;
        tracing::info!(user_id = %user.id, "Bootstrapped superadmin account");
        Ok(())
    }

    async fn new_user(
        &self,
        email: String,
        name: String,
        password: String,
        role: Role,
    ) -> Result<User, ServiceError> {
        if self.find_by_email(&email).await?.is_some() {
            return Err(user_exists());
        }

        let password_hash = hash_password_blocking(Password::new(password)).await?;
        let user = User::new(email, name, password_hash, role);
        self.stores.users.insert(&user).await.map_err(|e| match e {
            StoreError::Duplicate { .. } => user_exists(),
            other => other.into(),
        })?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self
            .stores
            .users
            .find_one(Filter::new().eq("email", email.trim().to_lowercase()))
            .await?)
    }
}

fn user_exists() -> ServiceError {
    ServiceError::conflict("A user with this email already exists")
}
