//! UserFollowerRepository - relazioni di follow tra utenti
//!
//! I contatori `follower_count`/`followee_count` cambiano solo quando una relazione
//! viene confermata o quando una relazione confermata viene rimossa.

use super::{Create, Read};
use crate::dtos::FollowerDTO;
use crate::entities::UserFollower;
use sqlx::{Error, MySqlPool};
use tracing::debug;

const FOLLOW_SELECT: &str =
    "SELECT id, follower_id, followee_id, is_confirmed, created_at, updated_at FROM user_followers";

/// Coppia (follower_id, followee_id)
#[derive(Debug, Clone, Copy)]
pub struct FollowPair {
    pub follower_id: i32,
    pub followee_id: i32,
}

pub struct UserFollowerRepository {
    connection_pool: MySqlPool,
}

impl UserFollowerRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Follower di un utente, solo confermati a meno di `include_not_confirmed`
    pub async fn find_followers(
        &self,
        followee_id: i32,
        include_not_confirmed: bool,
    ) -> Result<Vec<FollowerDTO>, Error> {
        let sql = format!(
            "SELECT u.id, u.nickname, u.email, uf.is_confirmed
             FROM user_followers uf
             JOIN users u ON u.id = uf.follower_id
             WHERE uf.followee_id = ? {}
             ORDER BY uf.id ASC",
            if include_not_confirmed { "" } else { "AND uf.is_confirmed = TRUE" }
        );

        sqlx::query_as::<_, FollowerDTO>(&sql)
            .bind(followee_id)
            .fetch_all(&self.connection_pool)
            .await
    }

    /// Conferma la richiesta e aggiorna i contatori di entrambi gli utenti.
    /// `RowNotFound` se non esiste una richiesta pendente.
    pub async fn confirm(&self, pair: FollowPair) -> Result<UserFollower, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query(
            "UPDATE user_followers SET is_confirmed = TRUE
             WHERE follower_id = ? AND followee_id = ? AND is_confirmed = FALSE",
        )
        .bind(pair.follower_id)
        .bind(pair.followee_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // niente da confermare: rollback implicito al drop
            return Err(Error::RowNotFound);
        }

        sqlx::query("UPDATE users SET follower_count = follower_count + 1 WHERE id = ?")
            .bind(pair.followee_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE users SET followee_count = followee_count + 1 WHERE id = ?")
            .bind(pair.follower_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(?pair, "Follow confirmed");

        self.read(&pair).await?.ok_or(Error::RowNotFound)
    }

    /// Rimuove la relazione (se c'è) e, se era confermata, decrementa i contatori
    pub async fn remove(&self, pair: FollowPair) -> Result<bool, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let confirmed: Option<bool> = sqlx::query_scalar(
            "SELECT is_confirmed FROM user_followers
             WHERE follower_id = ? AND followee_id = ? FOR UPDATE",
        )
        .bind(pair.follower_id)
        .bind(pair.followee_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(confirmed) = confirmed else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM user_followers WHERE follower_id = ? AND followee_id = ?")
            .bind(pair.follower_id)
            .bind(pair.followee_id)
            .execute(&mut *tx)
            .await?;

        if confirmed {
            sqlx::query(
                "UPDATE users SET follower_count = follower_count - 1 WHERE id = ? AND follower_count > 0",
            )
            .bind(pair.followee_id)
            .execute(&mut *tx)
            .await?;
            sqlx::query(
                "UPDATE users SET followee_count = followee_count - 1 WHERE id = ? AND followee_count > 0",
            )
            .bind(pair.follower_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}

impl Create<UserFollower, FollowPair> for UserFollowerRepository {
    async fn create(&self, data: &FollowPair) -> Result<UserFollower, Error> {
        sqlx::query("INSERT INTO user_followers (follower_id, followee_id) VALUES (?, ?)")
            .bind(data.follower_id)
            .bind(data.followee_id)
            .execute(&self.connection_pool)
            .await?;

        self.read(data).await?.ok_or(Error::RowNotFound)
    }
}

impl Read<UserFollower, FollowPair> for UserFollowerRepository {
    async fn read(&self, pair: &FollowPair) -> Result<Option<UserFollower>, Error> {
        sqlx::query_as::<_, UserFollower>(&format!(
            "{} WHERE follower_id = ? AND followee_id = ?",
            FOLLOW_SELECT
        ))
        .bind(pair.follower_id)
        .bind(pair.followee_id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}
