//! UserRepository - Repository per la gestione degli utenti

use super::{Create, Read, ReadMany};
use crate::dtos::CreateUserDTO;
use crate::entities::User;
use sqlx::{Error, MySql, MySqlPool, QueryBuilder};

const USER_COLUMNS: &str =
    "id, nickname, email, role, password, follower_count, followee_count, created_at, updated_at";

// USER REPO
pub struct UserRepository {
    connection_pool: MySqlPool,
}

impl UserRepository {
    pub fn new(connection_pool: MySqlPool) -> UserRepository {
        Self { connection_pool }
    }

    /// email univoca, usata dal login basic
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE nickname = ?",
            USER_COLUMNS
        ))
        .bind(nickname)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }

    pub async fn find_all(&self) -> Result<Vec<User>, Error> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY id ASC",
            USER_COLUMNS
        ))
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(users)
    }
}

impl Create<User, CreateUserDTO> for UserRepository {
    async fn create(&self, data: &CreateUserDTO) -> Result<User, Error> {
        let result = sqlx::query("INSERT INTO users (nickname, email, password) VALUES (?, ?, ?)")
            .bind(&data.nickname)
            .bind(&data.email)
            .bind(&data.password)
            .execute(&self.connection_pool)
            .await?;

        // Get the last inserted ID, i default (ruolo, contatori, timestamp) li mette il db
        let new_id = result.last_insert_id() as i32;
        self.read(&new_id).await?.ok_or(Error::RowNotFound)
    }
}

impl Read<User, i32> for UserRepository {
    async fn read(&self, id: &i32) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }
}

impl ReadMany<User, i32> for UserRepository {
    async fn read_many(&self, ids: &[i32]) -> Result<Vec<User>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<MySql>::new(format!(
            "SELECT {} FROM users WHERE id IN (",
            USER_COLUMNS
        ));
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let users = qb
            .build_query_as::<User>()
            .fetch_all(&self.connection_pool)
            .await?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;
    use sqlx::MySqlPool;

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users")))]
    async fn finds_fixture_users(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = UserRepository::new(pool);

        let alice = repo.find_by_email("alice@example.com").await?.expect("alice");
        assert_eq!(alice.nickname, "alice");
        assert_eq!(alice.role, UserRole::User);
        assert!(alice.verify_password("U*U"));

        let admin = repo.find_by_nickname("admin").await?.expect("admin");
        assert!(admin.is_admin());

        let many = repo.read_many(&[1, 3, 99]).await?;
        assert_eq!(many.len(), 2);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users")))]
    async fn create_returns_defaults(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = UserRepository::new(pool);
        let user = repo
            .create(&CreateUserDTO {
                nickname: "dora".to_string(),
                email: "dora@example.com".to_string(),
                password: "hash".to_string(),
            })
            .await?;

        assert!(user.id > 4);
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.follower_count, 0);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users")))]
    async fn duplicate_email_is_rejected(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = UserRepository::new(pool);
        let result = repo
            .create(&CreateUserDTO {
                nickname: "another".to_string(),
                email: "alice@example.com".to_string(),
                password: "hash".to_string(),
            })
            .await;

        assert!(matches!(result, Err(Error::Database(_))));
        Ok(())
    }
}
