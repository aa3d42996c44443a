//! User DTOs - Data Transfer Objects per utenti e follower

use crate::entities::{User, UserRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// struct per gestire io col client, la password non c'è proprio
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDTO {
    pub id: i32,
    pub nickname: String,
    pub email: String,
    pub role: UserRole,
    pub follower_count: i32,
    pub followee_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDTO {
    fn from(value: User) -> Self {
        Self {
            id: value.id,
            nickname: value.nickname,
            email: value.email,
            role: value.role,
            follower_count: value.follower_count,
            followee_count: value.followee_count,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// DTO per creare un nuovo utente, password già hashata
#[derive(Debug, Clone)]
pub struct CreateUserDTO {
    pub nickname: String,
    pub email: String,
    pub password: String,
}

/// Follower dell'utente corrente con lo stato della richiesta
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FollowerDTO {
    pub id: i32,
    pub nickname: String,
    pub email: String,
    pub is_confirmed: bool,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct FollowersQuery {
    #[serde(default)]
    pub include_not_confirmed: bool,
}
