//! CommentRepository - Repository per i commenti dei post
//!
//! Creazione e cancellazione aggiornano `posts.comment_count` nella stessa transazione.

use super::pagination::{PageResult, PageSource, fetch_page};
use super::{Delete, Paginate, Read, Update};
use crate::core::PaginationQuery;
use crate::core::pagination::{FieldKind, PaginatedField};
use crate::dtos::UpdateCommentDTO;
use crate::entities::Comment;
use sqlx::{Error, MySqlPool};
use tracing::debug;

const COMMENT_SELECT: &str =
    "SELECT id, post_id, author_id, comment, like_count, created_at, updated_at FROM comments";

pub const COMMENT_FIELDS: &[PaginatedField] = &[
    PaginatedField::new("id", "id", FieldKind::Int),
    PaginatedField::new("authorId", "author_id", FieldKind::Int),
    PaginatedField::new("comment", "comment", FieldKind::Text),
    PaginatedField::new("likeCount", "like_count", FieldKind::Int),
    PaginatedField::new("createdAt", "created_at", FieldKind::DateTime),
    PaginatedField::new("updatedAt", "updated_at", FieldKind::DateTime),
];

pub struct CommentRepository {
    connection_pool: MySqlPool,
}

impl CommentRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Inserisce il commento e incrementa il contatore del post
    pub async fn create_for_post(
        &self,
        post_id: i32,
        author_id: i32,
        comment: &str,
    ) -> Result<Comment, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query("INSERT INTO comments (post_id, author_id, comment) VALUES (?, ?, ?)")
            .bind(post_id)
            .bind(author_id)
            .bind(comment)
            .execute(&mut *tx)
            .await?;
        let new_id = result.last_insert_id() as i32;

        sqlx::query("UPDATE posts SET comment_count = comment_count + 1 WHERE id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(comment_id = new_id, post_id, "Comment created");

        self.read(&new_id).await?.ok_or(Error::RowNotFound)
    }
}

impl Read<Comment, i32> for CommentRepository {
    async fn read(&self, id: &i32) -> Result<Option<Comment>, Error> {
        sqlx::query_as::<_, Comment>(&format!("{} WHERE id = ?", COMMENT_SELECT))
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Update<Comment, UpdateCommentDTO, i32> for CommentRepository {
    async fn update(&self, id: &i32, data: &UpdateCommentDTO) -> Result<Comment, Error> {
        let current = self.read(id).await?.ok_or(Error::RowNotFound)?;

        let Some(comment) = &data.comment else {
            return Ok(current);
        };

        sqlx::query("UPDATE comments SET comment = ? WHERE id = ?")
            .bind(comment)
            .bind(id)
            .execute(&self.connection_pool)
            .await?;

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

impl Delete<i32> for CommentRepository {
    /// Cancella il commento e decrementa il contatore del post
    async fn delete(&self, id: &i32) -> Result<(), Error> {
        let mut tx = self.connection_pool.begin().await?;

        let post_id: i32 = sqlx::query_scalar("SELECT post_id FROM comments WHERE id = ? FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(Error::RowNotFound)?;

        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE posts SET comment_count = comment_count - 1 WHERE id = ? AND comment_count > 0")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

impl Paginate<Comment> for CommentRepository {
    /// id del post
    type Scope = i32;

    async fn paginate(
        &self,
        post_id: i32,
        query: &PaginationQuery,
    ) -> Result<PageResult<Comment>, Error> {
        let source = PageSource {
            select: COMMENT_SELECT,
            count: "SELECT COUNT(*) FROM comments",
            scope: Some(("post_id", post_id)),
        };
        fetch_page(&self.connection_pool, &source, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn comment_count(pool: &MySqlPool, post_id: i32) -> sqlx::Result<i32> {
        sqlx::query_scalar("SELECT comment_count FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_one(pool)
            .await
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "posts", "comments")))]
    async fn counter_follows_create_and_delete(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = CommentRepository::new(pool.clone());

        let created = repo.create_for_post(1, 4, "Moderazione").await?;
        assert_eq!(created.post_id, 1);
        assert_eq!(comment_count(&pool, 1).await?, 3);

        repo.delete(&created.id).await?;
        assert_eq!(comment_count(&pool, 1).await?, 2);
        assert!(matches!(repo.delete(&created.id).await, Err(Error::RowNotFound)));
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "posts", "comments")))]
    async fn comment_on_missing_post_rolls_back(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = CommentRepository::new(pool.clone());
        assert!(repo.create_for_post(999, 1, "x").await.is_err());

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(&pool)
            .await?;
        assert_eq!(total, 3);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "posts", "comments")))]
    async fn paginate_is_scoped_to_post(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = CommentRepository::new(pool);
        let query = PaginationQuery::parse(vec![], COMMENT_FIELDS).unwrap();
        let page = repo.paginate(1, &query).await?;
        let ids: Vec<i32> = page.rows.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
        Ok(())
    }
}
