//! MessageRepository - Repository per la gestione dei messaggi

use super::pagination::{PageResult, PageSource, fetch_page};
use super::{Create, Paginate, Read};
use crate::core::PaginationQuery;
use crate::core::pagination::{FieldKind, PaginatedField};
use crate::dtos::CreateMessageDTO;
use crate::entities::Message;
use sqlx::{Error, MySqlPool};

const MESSAGE_SELECT: &str =
    "SELECT id, chat_id, author_id, message, created_at, updated_at FROM messages";

pub const MESSAGE_FIELDS: &[PaginatedField] = &[
    PaginatedField::new("id", "id", FieldKind::Int),
    PaginatedField::new("authorId", "author_id", FieldKind::Int),
    PaginatedField::new("message", "message", FieldKind::Text),
    PaginatedField::new("createdAt", "created_at", FieldKind::DateTime),
    PaginatedField::new("updatedAt", "updated_at", FieldKind::DateTime),
];

// MESSAGE REPO
pub struct MessageRepository {
    connection_pool: MySqlPool,
}

impl MessageRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }
}

impl Create<Message, CreateMessageDTO> for MessageRepository {
    async fn create(&self, data: &CreateMessageDTO) -> Result<Message, Error> {
        let result = sqlx::query("INSERT INTO messages (chat_id, author_id, message) VALUES (?, ?, ?)")
            .bind(data.chat_id)
            .bind(data.author_id)
            .bind(&data.message)
            .execute(&self.connection_pool)
            .await?;

        // Get the last inserted ID
        let new_id = result.last_insert_id() as i32;
        self.read(&new_id).await?.ok_or(Error::RowNotFound)
    }
}

impl Read<Message, i32> for MessageRepository {
    async fn read(&self, id: &i32) -> Result<Option<Message>, Error> {
        sqlx::query_as::<_, Message>(&format!("{} WHERE id = ?", MESSAGE_SELECT))
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Paginate<Message> for MessageRepository {
    /// id della chat
    type Scope = i32;

    async fn paginate(
        &self,
        chat_id: i32,
        query: &PaginationQuery,
    ) -> Result<PageResult<Message>, Error> {
        let source = PageSource {
            select: MESSAGE_SELECT,
            count: "SELECT COUNT(*) FROM messages",
            scope: Some(("chat_id", chat_id)),
        };
        fetch_page(&self.connection_pool, &source, query).await
    }
}
