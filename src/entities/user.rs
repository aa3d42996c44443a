//! User entity - Entità utente con metodi per gestione password

use super::enums::UserRole;
use bcrypt::{hash, verify};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub nickname: String,
    pub email: String,
    pub role: UserRole,
    // hash bcrypt, non deve mai uscire verso il client
    #[serde(skip_serializing)]
    pub password: String,
    pub follower_count: i32,
    pub followee_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Verify if target_password matches the stored hashed password
    pub fn verify_password(&self, target_password: &str) -> bool {
        verify(target_password, &self.password).unwrap_or(false)
    }

    /// Hash a password using bcrypt with the configured cost
    pub fn hash_password(password: &str, rounds: u32) -> Result<String, bcrypt::BcryptError> {
        let hash = hash(password, rounds)?;
        Ok(hash)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
