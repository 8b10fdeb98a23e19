use axum::{extract::State, http::StatusCode, Json};

use crate::{
    api::models::users::{CurrentUser, LoginRequest, RefreshRequest, RegisterRequest, TokenResponse, UserResponse},
    auth::{
        password::{self, Argon2Params},
        token::{self, TokenKind},
    },
    db::{handlers::Users, models::users::UserCreateDBRequest},
    errors::Error,
    AppState,
};

/// Register a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User registered successfully", body = UserResponse),
        (status = 400, description = "Invalid input or username already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<(StatusCode, Json<UserResponse>), Error> {
    if !state.config.auth.allow_registration {
        return Err(Error::BadRequest {
            message: "User registration is disabled".to_string(),
        });
    }

    request.validate()?;

    // Validate password length
    let password_config = &state.config.auth.password;
    if request.password.len() < password_config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    if request.password.len() > password_config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", password_config.max_length),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    // Pre-check for a friendlier message; the unique constraint still backs
    // this up under concurrent registration
    if user_repo.get_by_username(&request.username).await?.is_some() {
        return Err(Error::BadRequest {
            message: "User already exists".to_string(),
        });
    }

    // Hash the password on a blocking thread to avoid blocking async runtime
    let password = request.password.clone();
    let params = Argon2Params::from(password_config);
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string_with_params(&password, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let created_user = user_repo
        .create(&UserCreateDBRequest {
            username: request.username,
            password_hash,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(created_user))))
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<TokenResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    // The same message whether the user is missing or the password is wrong,
    // so responses do not reveal which usernames exist
    let invalid_credentials = || Error::Unauthenticated {
        message: Some("Invalid username or password".to_string()),
    };

    let user = user_repo.get_by_username(&request.username).await?.ok_or_else(invalid_credentials)?;

    // Verify password on a blocking thread to avoid blocking async runtime
    let password = request.password.clone();
    let hash = user.password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(invalid_credentials());
    }

    // Issue a fresh pair and pin the refresh token as the user's only one
    let pair = token::issue_token_pair(user.id, &state.config)?;
    user_repo.set_refresh_token(user.id, &pair.refresh_token).await?;

    Ok(Json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "bearer".to_string(),
    }))
}

/// Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "New token pair issued", body = TokenResponse),
        (status = 401, description = "Invalid, expired, or superseded refresh token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn refresh(State(state): State<AppState>, Json(request): Json<RefreshRequest>) -> Result<Json<TokenResponse>, Error> {
    let invalid_token = || Error::Unauthenticated {
        message: Some("Invalid or expired refresh token".to_string()),
    };

    let claims = token::decode_token_of_kind(&request.refresh_token, TokenKind::Refresh, &state.config).map_err(|e| match e {
        Error::Unauthenticated { .. } => invalid_token(),
        other => other,
    })?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    let user = user_repo.get_by_id(claims.sub).await?.ok_or_else(invalid_token)?;

    // A superseded token no longer matches the stored one and is rejected,
    // which is how reuse of an old refresh token is detected
    if user.refresh_token.as_deref() != Some(request.refresh_token.as_str()) {
        return Err(invalid_token());
    }

    let pair = token::issue_token_pair(user.id, &state.config)?;
    user_repo.set_refresh_token(user.id, &pair.refresh_token).await?;

    Ok(Json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "bearer".to_string(),
    }))
}

/// Current user, as resolved from the bearer access token
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "authentication",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid bearer token"),
    ),
    security(
        ("bearer_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn me(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    let user = user_repo.get_by_id(current_user.id).await?.ok_or_else(|| Error::Unauthenticated {
        message: Some("Token subject no longer exists".to_string()),
    })?;

    Ok(Json(UserResponse::from(user)))
}
