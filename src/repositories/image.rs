use crate::entities::{Image, ImageType};
use sqlx::{Error, MySql, MySqlPool, QueryBuilder, Transaction};

const IMAGE_SELECT: &str =
    "SELECT id, `order`, `type`, path, post_id, created_at, updated_at FROM images";

pub struct ImageRepository {
    connection_pool: MySqlPool,
}

impl ImageRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    pub async fn create_in_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        post_id: i32,
        order: i32,
        path: &str,
    ) -> Result<i32, Error> {
        let result = sqlx::query(
            "INSERT INTO images (`order`, `type`, path, post_id) VALUES (?, ?, ?, ?)",
        )
        .bind(order)
        .bind(ImageType::PostImage)
        .bind(path)
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

        Ok(result.last_insert_id() as i32)
    }

    /// Immagini di più post, ordinate per post e poi per `order`
    pub async fn find_by_post_ids(&self, post_ids: &[i32]) -> Result<Vec<Image>, Error> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<MySql>::new(IMAGE_SELECT);
        qb.push(" WHERE post_id IN (");
        let mut separated = qb.separated(", ");
        for id in post_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY post_id ASC, `order` ASC");

        qb.build_query_as::<Image>()
            .fetch_all(&self.connection_pool)
            .await
    }
}
