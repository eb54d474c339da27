//! Back-office accounts and password reset tokens.

use super::{new_id, Entity};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Superadmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        }
    }
}

/// Staff account. Never serialized to clients directly; see `UserResponse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    const COLLECTION: &'static str = "users";
    const UNIQUE_KEYS: &'static [&'static [&'static str]] = &[&["email"]];

    fn id(&self) -> &str {
        &self.id
    }
}

impl User {
    pub fn new(email: String, name: String, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            email: email.to_lowercase(),
            name,
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Single-use password reset token, valid for one hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetToken {
    #[serde(rename = "_id")]
    pub id: String,
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Entity for PasswordResetToken {
    const COLLECTION: &'static str = "password_reset_tokens";
    const UNIQUE_KEYS: &'static [&'static [&'static str]] = &[&["token"]];

    fn id(&self) -> &str {
        &self.id
    }
}

impl PasswordResetToken {
    pub const VALIDITY_MINUTES: i64 = 60;

    pub fn issue(user_id: &str, token: String) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            token,
            user_id: user_id.to_string(),
            expires_at: now + Duration::minutes(Self::VALIDITY_MINUTES),
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_token_expires_after_an_hour() {
        let mut token = PasswordResetToken::issue("user-1", "abc".into());
        assert!(!token.is_expired());

        token.expires_at = Utc::now() - Duration::seconds(1);
        assert!(token.is_expired());
    }

    #[test]
    fn new_user_email_is_normalized() {
        let user = User::new(
            "Admin@Example.COM".into(),
            "Admin".into(),
            "hash".into(),
            Role::Superadmin,
        );
        assert_eq!(user.email, "admin@example.com");
        assert_eq!(user.role.as_str(), "superadmin");
    }
}
