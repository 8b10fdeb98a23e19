use crate::{
    api::models::{
        beaches::{BeachCreate, BeachPatch, BeachReplace, BeachResponse, ListBeachesQuery},
        kiosks::KioskResponse,
    },
    db::{
        errors::DbError,
        handlers::{beaches::BeachFilter, Beaches, Kiosks, Repository},
        models::beaches::{BeachCreateDBRequest, BeachUpdateDBRequest},
    },
    errors::Error,
    types::BeachId,
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

use crate::api::models::users::CurrentUser;

fn beach_not_found(id: BeachId) -> Error {
    Error::NotFound {
        resource: "Beach".to_string(),
        id: id.to_string(),
    }
}

// GET /beaches - List beaches with optional filters
#[utoipa::path(
    get,
    path = "/api/v1/beaches",
    tag = "beaches",
    summary = "List beaches",
    description = "List beaches in insertion order, with optional filters; each beach includes its kiosks",
    params(ListBeachesQuery),
    responses(
        (status = 200, description = "List of beaches", body = [BeachResponse]),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn list_beaches(State(state): State<AppState>, Query(query): Query<ListBeachesQuery>) -> Result<Json<Vec<BeachResponse>>, Error> {
    let (skip, limit) = query.pagination.params();
    let filter = BeachFilter {
        skip,
        limit,
        state: query.state,
        municipality: query.municipality,
        has_bathing_area: query.has_bathing_area,
        has_lifeguard: query.has_lifeguard,
        has_kiosks: query.has_kiosks,
        min_rating: query.min_rating,
        max_rating: query.max_rating,
        min_length: query.min_length,
        max_length: query.max_length,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let beaches = {
        let mut repo = Beaches::new(&mut conn);
        repo.list(&filter).await?
    };

    // Eager-load kiosks for the whole page in one query
    let mut kiosks_by_beach = {
        let mut kiosk_repo = Kiosks::new(&mut conn);
        kiosk_repo.list_for_beaches(beaches.iter().map(|b| b.id).collect()).await?
    };

    let response = beaches
        .into_iter()
        .map(|beach| {
            let kiosks = kiosks_by_beach
                .remove(&beach.id)
                .unwrap_or_default()
                .into_iter()
                .map(KioskResponse::from)
                .collect();
            BeachResponse::from(beach).with_kiosks(kiosks)
        })
        .collect();

    Ok(Json(response))
}

// GET /beaches/{id} - Get a specific beach
#[utoipa::path(
    get,
    path = "/api/v1/beaches/{id}",
    tag = "beaches",
    summary = "Get beach",
    description = "Get a beach by ID, including its kiosks",
    params(
        ("id" = i64, Path, description = "Beach ID"),
    ),
    responses(
        (status = 200, description = "Beach", body = BeachResponse),
        (status = 404, description = "Beach not registered"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn get_beach(State(state): State<AppState>, Path(id): Path<BeachId>) -> Result<Json<BeachResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let beach = {
        let mut repo = Beaches::new(&mut conn);
        repo.get_by_id(id).await?.ok_or_else(|| beach_not_found(id))?
    };

    let kiosks = {
        let mut kiosk_repo = Kiosks::new(&mut conn);
        kiosk_repo
            .list_for_beaches(vec![beach.id])
            .await?
            .remove(&beach.id)
            .unwrap_or_default()
            .into_iter()
            .map(KioskResponse::from)
            .collect()
    };

    Ok(Json(BeachResponse::from(beach).with_kiosks(kiosks)))
}

// POST /beaches - Create a beach
#[utoipa::path(
    post,
    path = "/api/v1/beaches",
    tag = "beaches",
    summary = "Create beach",
    request_body = BeachCreate,
    responses(
        (status = 201, description = "Beach created", body = BeachResponse),
        (status = 400, description = "Validation failure or duplicate name"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("bearer_token" = [])
    )
)]
pub async fn create_beach(
    State(state): State<AppState>,
    _: CurrentUser,
    Json(beach_data): Json<BeachCreate>,
) -> Result<(StatusCode, Json<BeachResponse>), Error> {
    beach_data.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Beaches::new(&mut conn);

    let beach = repo.create(&BeachCreateDBRequest::from(beach_data)).await?;

    // A freshly created beach has no kiosks yet
    Ok((StatusCode::CREATED, Json(BeachResponse::from(beach))))
}

// PUT /beaches/{id} - Replace a beach
#[utoipa::path(
    put,
    path = "/api/v1/beaches/{id}",
    tag = "beaches",
    summary = "Replace beach",
    description = "Full update: every mutable field must be supplied; unknown fields are rejected",
    params(
        ("id" = i64, Path, description = "Beach ID"),
    ),
    request_body = BeachReplace,
    responses(
        (status = 200, description = "Beach replaced", body = BeachResponse),
        (status = 400, description = "Validation failure or duplicate name"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Beach not registered"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("bearer_token" = [])
    )
)]
pub async fn replace_beach(
    State(state): State<AppState>,
    Path(id): Path<BeachId>,
    _: CurrentUser,
    Json(beach_data): Json<BeachReplace>,
) -> Result<Json<BeachResponse>, Error> {
    beach_data.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let beach = {
        let mut repo = Beaches::new(&mut conn);
        repo.replace(id, &BeachCreateDBRequest::from(beach_data))
            .await
            .map_err(|e| match e {
                DbError::NotFound => beach_not_found(id),
                other => other.into(),
            })?
    };

    let kiosks = {
        let mut kiosk_repo = Kiosks::new(&mut conn);
        kiosk_repo
            .list_for_beaches(vec![beach.id])
            .await?
            .remove(&beach.id)
            .unwrap_or_default()
            .into_iter()
            .map(KioskResponse::from)
            .collect()
    };

    Ok(Json(BeachResponse::from(beach).with_kiosks(kiosks)))
}

// PATCH /beaches/{id} - Partially update a beach
#[utoipa::path(
    patch,
    path = "/api/v1/beaches/{id}",
    tag = "beaches",
    summary = "Update beach",
    description = "Partial update: applies only the supplied fields",
    params(
        ("id" = i64, Path, description = "Beach ID"),
    ),
    request_body = BeachPatch,
    responses(
        (status = 200, description = "Beach updated", body = BeachResponse),
        (status = 400, description = "Validation failure or no fields supplied"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Beach not registered"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("bearer_token" = [])
    )
)]
pub async fn update_beach(
    State(state): State<AppState>,
    Path(id): Path<BeachId>,
    _: CurrentUser,
    Json(beach_data): Json<BeachPatch>,
) -> Result<Json<BeachResponse>, Error> {
    if beach_data.is_empty() {
        return Err(Error::BadRequest {
            message: "No fields supplied".to_string(),
        });
    }
    beach_data.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let beach = {
        let mut repo = Beaches::new(&mut conn);
        repo.update(id, &BeachUpdateDBRequest::from(beach_data))
            .await
            .map_err(|e| match e {
                DbError::NotFound => beach_not_found(id),
                other => other.into(),
            })?
    };

    let kiosks = {
        let mut kiosk_repo = Kiosks::new(&mut conn);
        kiosk_repo
            .list_for_beaches(vec![beach.id])
            .await?
            .remove(&beach.id)
            .unwrap_or_default()
            .into_iter()
            .map(KioskResponse::from)
            .collect()
    };

    Ok(Json(BeachResponse::from(beach).with_kiosks(kiosks)))
}

// DELETE /beaches/{id} - Delete a beach
#[utoipa::path(
    delete,
    path = "/api/v1/beaches/{id}",
    tag = "beaches",
    summary = "Delete beach",
    description = "Delete a beach and, cascading, all of its kiosks",
    params(
        ("id" = i64, Path, description = "Beach ID"),
    ),
    responses(
        (status = 204, description = "Beach deleted"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Beach not registered"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("bearer_token" = [])
    )
)]
pub async fn delete_beach(State(state): State<AppState>, Path(id): Path<BeachId>, _: CurrentUser) -> Result<StatusCode, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Beaches::new(&mut conn);

    match repo.delete(id).await? {
        true => Ok(StatusCode::NO_CONTENT),
        false => Err(beach_not_found(id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use sqlx::PgPool;

    fn iracema_payload() -> serde_json::Value {
        serde_json::json!({
            "name": "Praia de Iracema",
            "state": "CE",
            "municipality": "Fortaleza",
            "latitude": -3.720235,
            "longitude": -38.528434,
            "length": 1500,
            "width": 50,
            "has_bathing_area": true,
            "has_lifeguard": true,
            "rating": 4.5
        })
    }

    fn copacabana_payload() -> serde_json::Value {
        serde_json::json!({
            "name": "Praia de Copacabana",
            "state": "RJ",
            "municipality": "Rio de Janeiro",
            "latitude": -22.971556,
            "longitude": -43.184306,
            "length": 4000,
            "width": 100,
            "has_bathing_area": true,
            "has_lifeguard": true,
            "rating": 4.7
        })
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_requires_authentication(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server.post("/api/v1/beaches").json(&iracema_payload()).await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get(axum::http::header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_then_get_round_trips(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let auth = test_bearer(&pool).await;

        let response = server
            .post("/api/v1/beaches")
            .add_header("authorization", auth.as_str())
            .json(&iracema_payload())
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let created: BeachResponse = response.json();
        assert_eq!(created.name, "Praia de Iracema");
        assert!(created.kiosks.is_empty());

        let response = server.get(&format!("/api/v1/beaches/{}", created.id)).await;
        response.assert_status_ok();
        let fetched: BeachResponse = response.json();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.rating, Some(4.5));
        assert_eq!(fetched.municipality, "Fortaleza");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_missing_beach_is_404(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server.get("/api/v1/beaches/4242").await;
        response.assert_status(axum::http::StatusCode::NOT_FOUND);
        assert!(response.text().contains("not registered"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_duplicate_name_is_400(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let auth = test_bearer(&pool).await;

        server
            .post("/api/v1/beaches")
            .add_header("authorization", auth.as_str())
            .json(&iracema_payload())
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .post("/api/v1/beaches")
            .add_header("authorization", auth.as_str())
            .json(&iracema_payload())
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);

        // Nothing from the second attempt was persisted
        let listed: Vec<BeachResponse> = server.get("/api/v1/beaches").await.json();
        assert_eq!(listed.len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_out_of_range_rating_is_400(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let auth = test_bearer(&pool).await;

        let mut payload = iracema_payload();
        payload["rating"] = serde_json::json!(6.0);
        let response = server.post("/api/v1/beaches").add_header("authorization", auth.as_str()).json(&payload).await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_min_rating_filter(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let auth = test_bearer(&pool).await;

        for payload in [iracema_payload(), copacabana_payload()] {
            server
                .post("/api/v1/beaches")
                .add_header("authorization", auth.as_str())
                .json(&payload)
                .await
                .assert_status(axum::http::StatusCode::CREATED);
        }

        let listed: Vec<BeachResponse> = server.get("/api/v1/beaches?min_rating=4.6").await.json();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Praia de Copacabana");

        // Other filters do not disturb the result
        let listed: Vec<BeachResponse> = server.get("/api/v1/beaches?has_lifeguard=true&min_rating=4.6").await.json();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Praia de Copacabana");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_includes_kiosks(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let auth = test_bearer(&pool).await;

        let beach: BeachResponse = server
            .post("/api/v1/beaches")
            .add_header("authorization", auth.as_str())
            .json(&iracema_payload())
            .await
            .json();

        server
            .post("/api/v1/kiosks")
            .add_header("authorization", auth.as_str())
            .json(&serde_json::json!({
                "name": "Quiosque Sol e Mar",
                "description": "Quiosque com drinks e petiscos",
                "score": 4.5,
                "latitude": -3.7201,
                "longitude": -38.5283,
                "accessible": true,
                "has_restroom": true,
                "price": 5,
                "max_occupancy": 100,
                "beach_id": beach.id
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let listed: Vec<BeachResponse> = server.get("/api/v1/beaches").await.json();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].kiosks.len(), 1);
        assert_eq!(listed[0].kiosks[0].name, "Quiosque Sol e Mar");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_replace_rejects_unknown_fields(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let auth = test_bearer(&pool).await;

        let beach: BeachResponse = server
            .post("/api/v1/beaches")
            .add_header("authorization", auth.as_str())
            .json(&iracema_payload())
            .await
            .json();

        let mut payload = copacabana_payload();
        payload["surprise"] = serde_json::json!("field");
        let response = server
            .put(&format!("/api/v1/beaches/{}", beach.id))
            .add_header("authorization", auth.as_str())
            .json(&payload)
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_replace_overwrites_all_fields(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let auth = test_bearer(&pool).await;

        let beach: BeachResponse = server
            .post("/api/v1/beaches")
            .add_header("authorization", auth.as_str())
            .json(&iracema_payload())
            .await
            .json();

        let response = server
            .put(&format!("/api/v1/beaches/{}", beach.id))
            .add_header("authorization", auth.as_str())
            .json(&copacabana_payload())
            .await;
        response.assert_status_ok();
        let replaced: BeachResponse = response.json();
        assert_eq!(replaced.id, beach.id);
        assert_eq!(replaced.name, "Praia de Copacabana");
        assert_eq!(replaced.state, "RJ");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_patch_empty_payload_is_400_and_untouched(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let auth = test_bearer(&pool).await;

        let beach: BeachResponse = server
            .post("/api/v1/beaches")
            .add_header("authorization", auth.as_str())
            .json(&iracema_payload())
            .await
            .json();

        let response = server
            .patch(&format!("/api/v1/beaches/{}", beach.id))
            .add_header("authorization", auth.as_str())
            .json(&serde_json::json!({}))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        assert!(response.text().contains("No fields supplied"));

        // Record untouched
        let fetched: BeachResponse = server.get(&format!("/api/v1/beaches/{}", beach.id)).await.json();
        assert_eq!(fetched.updated_at, beach.updated_at);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_patch_applies_supplied_fields_only(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let auth = test_bearer(&pool).await;

        let beach: BeachResponse = server
            .post("/api/v1/beaches")
            .add_header("authorization", auth.as_str())
            .json(&iracema_payload())
            .await
            .json();

        let response = server
            .patch(&format!("/api/v1/beaches/{}", beach.id))
            .add_header("authorization", auth.as_str())
            .json(&serde_json::json!({"rating": 4.9}))
            .await;
        response.assert_status_ok();
        let patched: BeachResponse = response.json();
        assert_eq!(patched.rating, Some(4.9));
        assert_eq!(patched.name, "Praia de Iracema");
        assert_eq!(patched.length, Some(1500));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_cascades_and_second_delete_is_404(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let auth = test_bearer(&pool).await;

        let beach: BeachResponse = server
            .post("/api/v1/beaches")
            .add_header("authorization", auth.as_str())
            .json(&iracema_payload())
            .await
            .json();

        let kiosk: crate::api::models::kiosks::KioskResponse = server
            .post("/api/v1/kiosks")
            .add_header("authorization", auth.as_str())
            .json(&serde_json::json!({
                "name": "Quiosque Sol e Mar",
                "latitude": -3.7201,
                "longitude": -38.5283,
                "beach_id": beach.id
            }))
            .await
            .json();

        server
            .delete(&format!("/api/v1/beaches/{}", beach.id))
            .add_header("authorization", auth.as_str())
            .await
            .assert_status(axum::http::StatusCode::NO_CONTENT);

        // Cascade removed the kiosk
        server
            .get(&format!("/api/v1/kiosks/{}", kiosk.id))
            .await
            .assert_status(axum::http::StatusCode::NOT_FOUND);

        // Deleting twice yields not-found the second time
        server
            .delete(&format!("/api/v1/beaches/{}", beach.id))
            .add_header("authorization", auth.as_str())
            .await
            .assert_status(axum::http::StatusCode::NOT_FOUND);
    }
}
