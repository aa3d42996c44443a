//! UserFollower entity - Relazione follower -> followee

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct UserFollower {
    pub id: i32,
    pub follower_id: i32,
    pub followee_id: i32,
    // la richiesta resta pendente finché il followee non la conferma
    pub is_confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
