//! ChatRepository - Repository per le chat e i loro membri (`chat_users`)

use super::pagination::{PageResult, PageSource, fetch_page};
use super::{Paginate, Read};
use crate::core::PaginationQuery;
use crate::core::pagination::{FieldKind, PaginatedField};
use crate::entities::{Chat, User};
use sqlx::{Error, MySql, MySqlPool, QueryBuilder};

const CHAT_SELECT: &str = "SELECT id, created_at, updated_at FROM chats";

pub const CHAT_FIELDS: &[PaginatedField] = &[
    PaginatedField::new("id", "id", FieldKind::Int),
    PaginatedField::new("createdAt", "created_at", FieldKind::DateTime),
    PaginatedField::new("updatedAt", "updated_at", FieldKind::DateTime),
];

/// Utente con la chat di appartenenza, per caricare i membri di più chat in una query
#[derive(Debug, sqlx::FromRow)]
pub struct ChatMember {
    pub chat_id: i32,
    #[sqlx(flatten)]
    pub user: User,
}

// CHAT REPO
pub struct ChatRepository {
    connection_pool: MySqlPool,
}

impl ChatRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Crea la chat e ne registra i membri in un'unica transazione.
    /// Un id utente inesistente fa fallire la foreign key e annulla tutto.
    pub async fn create_with_users(&self, user_ids: &[i32]) -> Result<Chat, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query("INSERT INTO chats () VALUES ()")
            .execute(&mut *tx)
            .await?;
        let chat_id = result.last_insert_id() as i32;

        if !user_ids.is_empty() {
            let mut qb = QueryBuilder::<MySql>::new("INSERT INTO chat_users (chat_id, user_id) ");
            qb.push_values(user_ids, |mut row, user_id| {
                row.push_bind(chat_id).push_bind(*user_id);
            });
            qb.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        self.read(&chat_id).await?.ok_or(Error::RowNotFound)
    }

    pub async fn exists(&self, chat_id: i32) -> Result<bool, Error> {
        let found: Option<i32> = sqlx::query_scalar("SELECT id FROM chats WHERE id = ?")
            .bind(chat_id)
            .fetch_optional(&self.connection_pool)
            .await?;
        Ok(found.is_some())
    }

    /// Membri di un insieme di chat
    pub async fn find_members(&self, chat_ids: &[i32]) -> Result<Vec<ChatMember>, Error> {
        if chat_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT cu.chat_id, u.id, u.nickname, u.email, u.role, u.password, \
             u.follower_count, u.followee_count, u.created_at, u.updated_at \
             FROM chat_users cu JOIN users u ON u.id = cu.user_id WHERE cu.chat_id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in chat_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY cu.chat_id ASC, u.id ASC");

        qb.build_query_as::<ChatMember>()
            .fetch_all(&self.connection_pool)
            .await
    }
}

impl Read<Chat, i32> for ChatRepository {
    async fn read(&self, id: &i32) -> Result<Option<Chat>, Error> {
        sqlx::query_as::<_, Chat>(&format!("{} WHERE id = ?", CHAT_SELECT))
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Paginate<Chat> for ChatRepository {
    type Scope = ();

    async fn paginate(&self, _: (), query: &PaginationQuery) -> Result<PageResult<Chat>, Error> {
        let source = PageSource {
            select: CHAT_SELECT,
            count: "SELECT COUNT(*) FROM chats",
            scope: None,
        };
        fetch_page(&self.connection_pool, &source, query).await
    }
}
