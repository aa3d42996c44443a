//! Integration tests per gli endpoints di autenticazione
//!
//! Test per:
//! - POST /auth/register/email
//! - POST /auth/login/email
//! - POST /auth/token/access
//! - POST /auth/token/refresh
//!
//! Questi test usano `#[sqlx::test]` che:
//! - Crea automaticamente un database di test isolato
//! - Applica le migrations da `migrations/`
//! - Applica i fixtures specificati da `fixtures/`
//! - Pulisce il database al termine

mod common;

#[cfg(test)]
mod auth_tests {
    use super::common::*;
    use axum_test::http::HeaderName;
    use blog_server::auth::{TokenType, verify_token};
    use serde_json::{Value, json};
    use sqlx::MySqlPool;

    fn authorization() -> HeaderName {
        HeaderName::from_static("authorization")
    }

    // ============================================================
    // Test per POST /auth/register/email - register_email
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_register_returns_token_pair(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());

        let body = json!({
            "nickname": "dave",
            "email": "dave@example.com",
            "password": "secret1"
        });

        let response = server.post("/auth/register/email").json(&body).await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let tokens: Value = response.json();
        let access = tokens["accessToken"].as_str().expect("accessToken missing");
        let refresh = tokens["refreshToken"].as_str().expect("refreshToken missing");

        let claims = verify_token(access, JWT_SECRET).expect("access token should be valid");
        assert_eq!(claims.email, "dave@example.com");
        assert_eq!(claims.token_type, TokenType::Access);

        let claims = verify_token(refresh, JWT_SECRET).expect("refresh token should be valid");
        assert_eq!(claims.token_type, TokenType::Refresh);

        // La password deve essere salvata come hash
        let user = state
            .user
            .find_by_email("dave@example.com")
            .await?
            .expect("user should exist");
        assert_ne!(user.password, "secret1");
        assert!(user.verify_password("secret1"));

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_register_duplicate_nickname_or_email(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let same_nickname = json!({
            "nickname": "alice",
            "email": "other@example.com",
            "password": "secret1"
        });
        server
            .post("/auth/register/email")
            .json(&same_nickname)
            .await
            .assert_status_bad_request();

        let same_email = json!({
            "nickname": "other",
            "email": "alice@example.com",
            "password": "secret1"
        });
        server
            .post("/auth/register/email")
            .json(&same_email)
            .await
            .assert_status_bad_request();

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_register_validation(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let bodies = [
            json!({"nickname": "", "email": "x@example.com", "password": "secret1"}),
            json!({"nickname": "x".repeat(21), "email": "x@example.com", "password": "secret1"}),
            json!({"nickname": "x", "email": "not-an-email", "password": "secret1"}),
            json!({"nickname": "x", "email": "x@example.com", "password": "ab"}),
            json!({"nickname": "x", "email": "x@example.com", "password": "toolongpwd"}),
        ];

        for body in bodies {
            let response = server.post("/auth/register/email").json(&body).await;
            response.assert_status_bad_request();
        }

        Ok(())
    }

    // ============================================================
    // Test per POST /auth/login/email - login_email
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_login_success(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server
            .post("/auth/login/email")
            .add_header(authorization(), basic("alice@example.com", FIXTURE_PASSWORD))
            .await;

        response.assert_status_ok();
        let tokens: Value = response.json();
        let access = tokens["accessToken"].as_str().expect("accessToken missing");
        let claims = verify_token(access, JWT_SECRET).expect("access token should be valid");
        assert_eq!(claims.sub, 1);

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_login_after_register(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let body = json!({
            "nickname": "logintest",
            "email": "login@example.com",
            "password": "Login1"
        });
        server
            .post("/auth/register/email")
            .json(&body)
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        server
            .post("/auth/login/email")
            .add_header(authorization(), basic("login@example.com", "Login1"))
            .await
            .assert_status_ok();

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_login_wrong_password(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server
            .post("/auth/login/email")
            .add_header(authorization(), basic("alice@example.com", "wrong"))
            .await;

        response.assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_login_unknown_email(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server
            .post("/auth/login/email")
            .add_header(authorization(), basic("nobody@example.com", FIXTURE_PASSWORD))
            .await;

        response.assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_login_malformed_header(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        // Nessun header
        server
            .post("/auth/login/email")
            .await
            .assert_status_unauthorized();

        // Schema sbagliato
        server
            .post("/auth/login/email")
            .add_header(authorization(), "Bearer abc")
            .await
            .assert_status_unauthorized();

        // Basic senza i due punti
        server
            .post("/auth/login/email")
            .add_header(authorization(), "Basic YWxpY2U=")
            .await
            .assert_status_unauthorized();

        Ok(())
    }

    // ============================================================
    // Test per POST /auth/token/{access,refresh}
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_rotate_with_refresh_token(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let refresh = create_test_jwt(1, "alice@example.com", TokenType::Refresh, 3600);

        let response = server
            .post("/auth/token/access")
            .add_header(authorization(), bearer(&refresh))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        let access = body["accessToken"].as_str().expect("accessToken missing");
        let claims = verify_token(access, JWT_SECRET).expect("access token should be valid");
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.sub, 1);

        let response = server
            .post("/auth/token/refresh")
            .add_header(authorization(), bearer(&refresh))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        let rotated = body["refreshToken"].as_str().expect("refreshToken missing");
        let claims = verify_token(rotated, JWT_SECRET).expect("refresh token should be valid");
        assert_eq!(claims.token_type, TokenType::Refresh);

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_rotate_rejects_access_token(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server
            .post("/auth/token/access")
            .add_header(authorization(), alice_auth())
            .await;

        response.assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_expired_refresh_token(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let expired = create_test_jwt(1, "alice@example.com", TokenType::Refresh, -3600);

        let response = server
            .post("/auth/token/refresh")
            .add_header(authorization(), bearer(&expired))
            .await;

        response.assert_status_unauthorized();
        Ok(())
    }

    // ============================================================
    // Guardia globale: tutto fuori da /auth richiede un access token
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_protected_routes_require_access_token(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        server.get("/posts").await.assert_status_unauthorized();
        server.get("/chats").await.assert_status_unauthorized();
        server.get("/users/follow/me").await.assert_status_unauthorized();

        let refresh = create_test_jwt(1, "alice@example.com", TokenType::Refresh, 3600);
        server
            .get("/posts")
            .add_header(authorization(), bearer(&refresh))
            .await
            .assert_status_unauthorized();

        // Token firmato per un utente che non esiste
        server
            .get("/posts")
            .add_header(authorization(), bearer(&access_token_for(999, "ghost@example.com")))
            .await
            .assert_status_unauthorized();

        Ok(())
    }

    #[tokio::test]
    async fn test_guards_reject_before_database() {
        let server = create_test_server(lazy_state());

        server.get("/posts").await.assert_status_unauthorized();
        server
            .get("/chats")
            .add_header(authorization(), "Token abc")
            .await
            .assert_status_unauthorized();
        server
            .get("/users/follow/me")
            .add_header(authorization(), "Bearer not.a.jwt")
            .await
            .assert_status_unauthorized();
        server
            .post("/auth/login/email")
            .add_header(authorization(), "Basic !!!")
            .await
            .assert_status_unauthorized();
    }

    #[sqlx::test]
    async fn test_root_is_public(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server.get("/").await;
        response.assert_status_ok();
        response.assert_text("Server is running!");
        Ok(())
    }
}
