//! Shared constructors for tests: config, app server, users, and tokens.

use axum_test::TestServer;
use sqlx::PgPool;

use crate::{
    auth::{
        password::{self, Argon2Params},
        token::{self, TokenKind},
    },
    db::{handlers::Users, models::users::UserCreateDBRequest},
    types::UserId,
    AppState, Config,
};

/// Test configuration: fixed secret, registration enabled, cheap Argon2
/// parameters so hashing does not dominate test time.
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.secret_key = Some("test-secret-key-for-jwt".to_string());
    config.auth.allow_registration = true;
    config.auth.password.argon2_memory_kib = 1024;
    config.auth.password.argon2_iterations = 1;
    config
}

/// Build a test server around the full application router
pub async fn create_test_app(pool: PgPool) -> TestServer {
    create_test_app_with_config(pool, create_test_config()).await
}

pub async fn create_test_app_with_config(pool: PgPool, config: Config) -> TestServer {
    let state = AppState::builder().db(pool).config(config).build();
    let router = crate::build_router(state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// Insert a user directly, hashing the password with the test parameters
pub async fn create_test_user(pool: &PgPool, username: &str, password: &str) -> crate::db::models::users::UserDBResponse {
    let params = Argon2Params {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    };
    let password_hash = password::hash_string_with_params(password, Some(params)).unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let mut repo = Users::new(&mut conn);
    repo.create(&UserCreateDBRequest {
        username: username.to_string(),
        password_hash,
    })
    .await
    .unwrap()
}

/// Authorization header value for a valid access token for the given user
pub fn bearer_for(user_id: UserId, config: &Config) -> String {
    let token = token::create_token(user_id, TokenKind::Access, config).unwrap();
    format!("Bearer {token}")
}

/// Create a user and return an Authorization header value for them
pub async fn test_bearer(pool: &PgPool) -> String {
    let user = create_test_user(pool, "tester", "password123").await;
    bearer_for(user.id, &create_test_config())
}
