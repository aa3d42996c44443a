//! PostRepository - Repository per la gestione dei post

use super::pagination::{PageResult, PageSource, fetch_page};
use super::{Delete, Paginate, Read, Update};
use crate::core::PaginationQuery;
use crate::core::pagination::{FieldKind, PaginatedField};
use crate::dtos::UpdatePostDTO;
use crate::entities::Post;
use sqlx::{Error, MySql, MySqlPool, QueryBuilder, Transaction};

const POST_SELECT: &str = "SELECT id, author_id, title, content, like_count, comment_count, created_at, updated_at FROM posts";

/// Campi su cui GET /posts può filtrare e ordinare
pub const POST_FIELDS: &[PaginatedField] = &[
    PaginatedField::new("id", "id", FieldKind::Int),
    PaginatedField::new("authorId", "author_id", FieldKind::Int),
    PaginatedField::new("title", "title", FieldKind::Text),
    PaginatedField::new("content", "content", FieldKind::Text),
    PaginatedField::new("likeCount", "like_count", FieldKind::Int),
    PaginatedField::new("commentCount", "comment_count", FieldKind::Int),
    PaginatedField::new("createdAt", "created_at", FieldKind::DateTime),
    PaginatedField::new("updatedAt", "updated_at", FieldKind::DateTime),
];

// POST REPO
pub struct PostRepository {
    connection_pool: MySqlPool,
}

impl PostRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Apre una transazione: post e immagini vengono scritti insieme
    pub async fn begin(&self) -> Result<Transaction<'static, MySql>, Error> {
        self.connection_pool.begin().await
    }

    /// Inserisce il post dentro la transazione e ritorna l'id generato
    pub async fn create_in_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        author_id: i32,
        title: &str,
        content: &str,
    ) -> Result<i32, Error> {
        let result = sqlx::query("INSERT INTO posts (author_id, title, content) VALUES (?, ?, ?)")
            .bind(author_id)
            .bind(title)
            .bind(content)
            .execute(&mut **tx)
            .await?;

        Ok(result.last_insert_id() as i32)
    }

    /// Crea `count` post generati per l'autore in un unico INSERT
    pub async fn generate_random(&self, author_id: i32, count: usize) -> Result<u64, Error> {
        let mut qb = QueryBuilder::<MySql>::new("INSERT INTO posts (author_id, title, content) ");
        qb.push_values(0..count, |mut row, i| {
            row.push_bind(author_id)
                .push_bind(format!("random post title {}", i))
                .push_bind(format!("random post content {}", i));
        });

        let result = qb.build().execute(&self.connection_pool).await?;
        Ok(result.rows_affected())
    }
}

impl Read<Post, i32> for PostRepository {
    async fn read(&self, id: &i32) -> Result<Option<Post>, Error> {
        let post = sqlx::query_as::<_, Post>(&format!("{} WHERE id = ?", POST_SELECT))
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await?;

        Ok(post)
    }
}

impl Update<Post, UpdatePostDTO, i32> for PostRepository {
    async fn update(&self, id: &i32, data: &UpdatePostDTO) -> Result<Post, Error> {
        // First, get the current post to ensure it exists
        let current_post = self.read(id).await?.ok_or(Error::RowNotFound)?;

        if data.title.is_none() && data.content.is_none() {
            return Ok(current_post);
        }

        let mut qb = QueryBuilder::<MySql>::new("UPDATE posts SET updated_at = CURRENT_TIMESTAMP(6)");
        if let Some(title) = &data.title {
            qb.push(", title = ").push_bind(title.clone());
        }
        if let Some(content) = &data.content {
            qb.push(", content = ").push_bind(content.clone());
        }
        qb.push(" WHERE id = ").push_bind(*id);
        qb.build().execute(&self.connection_pool).await?;

        // Fetch and return the updated post
        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

impl Delete<i32> for PostRepository {
    /// immagini e commenti vanno via in cascata
    async fn delete(&self, id: &i32) -> Result<(), Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::RowNotFound);
        }
        Ok(())
    }
}

impl Paginate<Post> for PostRepository {
    type Scope = ();

    async fn paginate(&self, _: (), query: &PaginationQuery) -> Result<PageResult<Post>, Error> {
        let source = PageSource {
            select: POST_SELECT,
            count: "SELECT COUNT(*) FROM posts",
            scope: None,
        };
        fetch_page(&self.connection_pool, &source, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(raw: &[(&str, &str)]) -> PaginationQuery {
        PaginationQuery::parse(
            raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            POST_FIELDS,
        )
        .unwrap()
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "posts")))]
    async fn cursor_pages_follow_ids(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = PostRepository::new(pool);

        let first = repo.paginate((), &query(&[("take", "10")])).await?;
        let ids: Vec<i32> = first.rows.iter().map(|p| p.id).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
        assert!(first.total.is_none());

        let second = repo
            .paginate((), &query(&[("take", "10"), ("where__id__more_than", "10")]))
            .await?;
        assert_eq!(second.rows.first().map(|p| p.id), Some(11));

        let desc = repo
            .paginate((), &query(&[("take", "3"), ("order__createdAt", "DESC")]))
            .await?;
        let ids: Vec<i32> = desc.rows.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![25, 24, 23]);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "posts")))]
    async fn page_mode_counts_with_filters(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = PostRepository::new(pool);

        let page = repo
            .paginate((), &query(&[("page", "2"), ("take", "5"), ("where__authorId", "1")]))
            .await?;
        // alice ha i 13 post dispari
        assert_eq!(page.total, Some(13));
        let ids: Vec<i32> = page.rows.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![11, 13, 15, 17, 19]);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "posts")))]
    async fn update_and_delete(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = PostRepository::new(pool);

        let updated = repo
            .update(
                &3,
                &UpdatePostDTO {
                    title: Some("Nuovo titolo".to_string()),
                    content: None,
                },
            )
            .await?;
        assert_eq!(updated.title, "Nuovo titolo");
        assert_eq!(updated.content, "Contenuto del post 3");

        repo.delete(&3).await?;
        assert!(repo.read(&3).await?.is_none());
        assert!(matches!(repo.delete(&3).await, Err(Error::RowNotFound)));
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users")))]
    async fn generates_random_posts(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = PostRepository::new(pool);
        assert_eq!(repo.generate_random(1, 100).await?, 100);
        Ok(())
    }
}
