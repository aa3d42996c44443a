//! Integration tests per gli endpoints dei post
//!
//! Test per:
//! - GET /posts (cursore e pagine, filtri, ordinamento)
//! - GET /posts/{id}
//! - POST /posts (con immagini caricate prima in /common/image)
//! - POST /posts/random
//! - PATCH /posts/{id}, DELETE /posts/{id} (solo autore o admin)

mod common;

#[cfg(test)]
mod post_tests {
    use super::common::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use axum_test::http::HeaderName;
    use axum_test::multipart::{MultipartForm, Part};
    use blog_server::core::storage;
    use blog_server::repositories::Read;
    use serde_json::{Value, json};
    use sqlx::MySqlPool;

    fn authorization() -> HeaderName {
        HeaderName::from_static("authorization")
    }

    fn ids(body: &Value) -> Vec<i64> {
        body["data"]
            .as_array()
            .expect("data should be an array")
            .iter()
            .map(|p| p["id"].as_i64().expect("id should be a number"))
            .collect()
    }

    async fn upload(server: &TestServer, name: &str) -> String {
        let form = MultipartForm::new().add_part(
            "image",
            Part::bytes(vec![0x89, 0x50, 0x4e, 0x47])
                .file_name(name)
                .mime_type("image/png"),
        );
        let response = server
            .post("/common/image")
            .add_header(authorization(), alice_auth())
            .multipart(form)
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["fileName"]
            .as_str()
            .expect("fileName missing")
            .to_string()
    }

    // ============================================================
    // Test per GET /posts - get_posts
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "posts")))]
    async fn test_cursor_pagination_walks_all_posts(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server
            .get("/posts")
            .add_query_param("take", 10)
            .add_header(authorization(), alice_auth())
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(ids(&body), (1..=10).collect::<Vec<i64>>());
        assert_eq!(body["count"], 10);
        assert_eq!(body["cursor"]["after"], 10);

        let next = body["next"].as_str().expect("next should be present");
        assert!(next.starts_with("http://localhost:3000/posts?"));
        assert!(next.contains("take=10"));
        assert!(next.contains("where__id__more_than=10"));

        let response = server
            .get("/posts")
            .add_query_param("take", 10)
            .add_query_param("where__id__more_than", 20)
            .add_header(authorization(), alice_auth())
            .await;
        let body: Value = response.json();
        assert_eq!(ids(&body), (21..=25).collect::<Vec<i64>>());
        // pagina non piena: nessun cursore
        assert!(body["cursor"]["after"].is_null());
        assert!(body["next"].is_null());

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "posts")))]
    async fn test_descending_cursor(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server
            .get("/posts")
            .add_query_param("take", 5)
            .add_query_param("order__createdAt", "DESC")
            .add_header(authorization(), alice_auth())
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(ids(&body), vec![25, 24, 23, 22, 21]);
        let next = body["next"].as_str().expect("next should be present");
        assert!(next.contains("where__id__less_than=21"));
        assert!(next.contains("order__createdAt=DESC"));

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "posts")))]
    async fn test_page_mode_returns_total(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server
            .get("/posts")
            .add_query_param("page", 3)
            .add_query_param("take", 10)
            .add_header(authorization(), alice_auth())
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(ids(&body), (21..=25).collect::<Vec<i64>>());
        assert_eq!(body["total"], 25);
        assert!(body.get("next").is_none());

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "posts")))]
    async fn test_filters(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server
            .get("/posts")
            .add_query_param("where__authorId__equal", 2)
            .add_query_param("where__title__like", "Post 1%")
            .add_header(authorization(), alice_auth())
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(ids(&body), vec![10, 12, 14, 16, 18]);

        let response = server
            .get("/posts")
            .add_query_param("where__id__in", "3,5,7")
            .add_header(authorization(), alice_auth())
            .await;
        assert_eq!(ids(&response.json::<Value>()), vec![3, 5, 7]);

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "posts")))]
    async fn test_bad_query_parameters(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let bad = [
            ("take", "0"),
            ("take", "101"),
            ("page", "0"),
            ("where__password__equal", "x"),
            ("where__id__sounds_like", "1"),
            ("where__id__equal", "abc"),
            ("order__createdAt", "SIDEWAYS"),
            ("foo", "bar"),
        ];

        for (key, value) in bad {
            server
                .get("/posts")
                .add_query_param(key, value)
                .add_header(authorization(), alice_auth())
                .await
                .assert_status_bad_request();
        }

        Ok(())
    }

    // ============================================================
    // Test per GET /posts/{id} - get_post
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "posts")))]
    async fn test_get_post_with_author_and_images(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server
            .get("/posts/1")
            .add_header(authorization(), bob_auth())
            .await;
        response.assert_status_ok();
        let post: Value = response.json();
        assert_eq!(post["author"]["nickname"], "alice");
        assert!(post["author"].get("password").is_none());

        let images = post["images"].as_array().expect("images array");
        assert_eq!(images.len(), 2);
        assert_eq!(images[0]["path"], "/public/posts/first.jpg");
        assert_eq!(images[1]["order"], 1);

        server
            .get("/posts/999")
            .add_header(authorization(), bob_auth())
            .await
            .assert_status_not_found();

        Ok(())
    }

    // ============================================================
    // Test per POST /posts - post_posts
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_create_post_moves_images(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());

        let first = upload(&server, "a.png").await;
        let second = upload(&server, "b.jpg").await;

        let body = json!({
            "title": "Con immagini",
            "content": "Due immagini",
            "images": [first, second]
        });
        let response = server
            .post("/posts")
            .add_header(authorization(), alice_auth())
            .json(&body)
            .await;
        response.assert_status(StatusCode::CREATED);

        let post: Value = response.json();
        assert_eq!(post["author"]["id"], 1);
        let images = post["images"].as_array().expect("images array");
        assert_eq!(images.len(), 2);
        assert_eq!(images[0]["path"], format!("/public/posts/{}", first));
        assert_eq!(images[1]["order"], 1);

        let public_dir = &state.config.public_dir;
        assert!(storage::posts_dir(public_dir).join(&first).exists());
        assert!(!storage::temp_dir(public_dir).join(&first).exists());

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_create_post_rolls_back_on_missing_image(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool.clone());
        let server = create_test_server(state.clone());

        let uploaded = upload(&server, "a.png").await;

        let body = json!({
            "title": "Rotto",
            "content": "La seconda immagine non esiste",
            "images": [uploaded, "missing.png"]
        });
        server
            .post("/posts")
            .add_header(authorization(), alice_auth())
            .json(&body)
            .await
            .assert_status_bad_request();

        // il primo file torna in temp e il post non esiste
        let public_dir = &state.config.public_dir;
        assert!(storage::temp_dir(public_dir).join(&uploaded).exists());
        assert!(!storage::posts_dir(public_dir).join(&uploaded).exists());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&pool)
            .await?;
        assert_eq!(count, 0);

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_create_post_validation(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        server
            .post("/posts")
            .add_header(authorization(), alice_auth())
            .json(&json!({"title": "", "content": "x"}))
            .await
            .assert_status_bad_request();

        // nomi con path traversal non vengono nemmeno cercati
        server
            .post("/posts")
            .add_header(authorization(), alice_auth())
            .json(&json!({"title": "t", "content": "c", "images": ["../secret.png"]}))
            .await
            .assert_status_bad_request();

        Ok(())
    }

    // ============================================================
    // Test per POST /posts/random - post_random_posts
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_random_posts(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server
            .post("/posts/random")
            .add_header(authorization(), bob_auth())
            .await;
        response.assert_status(StatusCode::CREATED);

        let response = server
            .get("/posts")
            .add_query_param("page", 1)
            .add_query_param("where__authorId__equal", 2)
            .add_header(authorization(), bob_auth())
            .await;
        assert_eq!(response.json::<Value>()["total"], 100);

        Ok(())
    }

    // ============================================================
    // Test per PATCH e DELETE /posts/{id}
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "posts")))]
    async fn test_patch_post_by_author(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server
            .patch("/posts/1")
            .add_header(authorization(), alice_auth())
            .json(&json!({"title": "Nuovo titolo"}))
            .await;
        response.assert_status_ok();
        let post: Value = response.json();
        assert_eq!(post["title"], "Nuovo titolo");
        assert_eq!(post["content"], "Contenuto del post 1");

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "posts")))]
    async fn test_post_ownership(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());

        // bob non è l'autore del post 1
        server
            .patch("/posts/1")
            .add_header(authorization(), bob_auth())
            .json(&json!({"title": "hack"}))
            .await
            .assert_status_forbidden();
        server
            .delete("/posts/1")
            .add_header(authorization(), bob_auth())
            .await
            .assert_status_forbidden();

        // post inesistente
        server
            .delete("/posts/999")
            .add_header(authorization(), alice_auth())
            .await
            .assert_status_not_found();

        // l'admin può cancellare tutto
        let response = server
            .delete("/posts/2")
            .add_header(authorization(), admin_auth())
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<i32>(), 2);
        assert!(state.post.read(&2).await?.is_none());

        Ok(())
    }
}
