use crate::{
    api::models::{
        beaches::BeachResponse,
        kiosks::{KioskCreate, KioskPatch, KioskReplace, KioskResponse, ListKiosksQuery},
    },
    db::{
        errors::DbError,
        handlers::{kiosks::KioskFilter, Beaches, Kiosks, Repository},
        models::kiosks::{KioskCreateDBRequest, KioskReplaceDBRequest, KioskUpdateDBRequest},
    },
    errors::Error,
    types::KioskId,
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

use crate::api::models::users::CurrentUser;

fn kiosk_not_found(id: KioskId) -> Error {
    Error::NotFound {
        resource: "Kiosk".to_string(),
        id: id.to_string(),
    }
}

// GET /kiosks - List kiosks with optional filters
#[utoipa::path(
    get,
    path = "/api/v1/kiosks",
    tag = "kiosks",
    summary = "List kiosks",
    description = "List kiosks in insertion order, with optional filters; each kiosk includes its parent beach",
    params(ListKiosksQuery),
    responses(
        (status = 200, description = "List of kiosks", body = [KioskResponse]),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn list_kiosks(State(state): State<AppState>, Query(query): Query<ListKiosksQuery>) -> Result<Json<Vec<KioskResponse>>, Error> {
    let (skip, limit) = query.pagination.params();
    let filter = KioskFilter {
        skip,
        limit,
        beach_id: query.beach_id,
        accessible: query.accessible,
        has_restroom: query.has_restroom,
        min_score: query.min_score,
        max_score: query.max_score,
        max_price: query.max_price,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let kiosks = {
        let mut repo = Kiosks::new(&mut conn);
        repo.list(&filter).await?
    };

    // Eager-load parent beaches for the whole page in one query
    let beaches = {
        let mut beach_repo = Beaches::new(&mut conn);
        let beach_ids: Vec<_> = {
            let mut ids: Vec<_> = kiosks.iter().map(|k| k.beach_id).collect();
            ids.sort_unstable();
            ids.dedup();
            ids
        };
        beach_repo.get_bulk(beach_ids).await?
    };

    let response = kiosks
        .into_iter()
        .map(|kiosk| {
            let beach = beaches.get(&kiosk.beach_id).cloned().map(BeachResponse::from);
            let kiosk_response = KioskResponse::from(kiosk);
            match beach {
                Some(beach) => kiosk_response.with_beach(beach),
                None => kiosk_response,
            }
        })
        .collect();

    Ok(Json(response))
}

// GET /kiosks/{id} - Get a specific kiosk
#[utoipa::path(
    get,
    path = "/api/v1/kiosks/{id}",
    tag = "kiosks",
    summary = "Get kiosk",
    description = "Get a kiosk by ID, including its parent beach",
    params(
        ("id" = i64, Path, description = "Kiosk ID"),
    ),
    responses(
        (status = 200, description = "Kiosk", body = KioskResponse),
        (status = 404, description = "Kiosk not registered"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn get_kiosk(State(state): State<AppState>, Path(id): Path<KioskId>) -> Result<Json<KioskResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let kiosk = {
        let mut repo = Kiosks::new(&mut conn);
        repo.get_by_id(id).await?.ok_or_else(|| kiosk_not_found(id))?
    };

    let beach = {
        let mut beach_repo = Beaches::new(&mut conn);
        beach_repo.get_by_id(kiosk.beach_id).await?.map(BeachResponse::from)
    };

    let response = KioskResponse::from(kiosk);
    Ok(Json(match beach {
        Some(beach) => response.with_beach(beach),
        None => response,
    }))
}

// POST /kiosks - Create a kiosk
#[utoipa::path(
    post,
    path = "/api/v1/kiosks",
    tag = "kiosks",
    summary = "Create kiosk",
    description = "Create a kiosk belonging to an existing beach",
    request_body = KioskCreate,
    responses(
        (status = 201, description = "Kiosk created", body = KioskResponse),
        (status = 400, description = "Validation failure or unknown beach"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("bearer_token" = [])
    )
)]
pub async fn create_kiosk(
    State(state): State<AppState>,
    _: CurrentUser,
    Json(kiosk_data): Json<KioskCreate>,
) -> Result<(StatusCode, Json<KioskResponse>), Error> {
    kiosk_data.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let kiosk = {
        let mut repo = Kiosks::new(&mut conn);
        repo.create(&KioskCreateDBRequest::from(kiosk_data)).await?
    };

    let beach = {
        let mut beach_repo = Beaches::new(&mut conn);
        beach_repo.get_by_id(kiosk.beach_id).await?.map(BeachResponse::from)
    };

    let response = KioskResponse::from(kiosk);
    let response = match beach {
        Some(beach) => response.with_beach(beach),
        None => response,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

// PUT /kiosks/{id} - Replace a kiosk
#[utoipa::path(
    put,
    path = "/api/v1/kiosks/{id}",
    tag = "kiosks",
    summary = "Replace kiosk",
    description = "Full update: every mutable field must be supplied; unknown fields (including beach_id) are rejected",
    params(
        ("id" = i64, Path, description = "Kiosk ID"),
    ),
    request_body = KioskReplace,
    responses(
        (status = 200, description = "Kiosk replaced", body = KioskResponse),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Kiosk not registered"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("bearer_token" = [])
    )
)]
pub async fn replace_kiosk(
    State(state): State<AppState>,
    Path(id): Path<KioskId>,
    _: CurrentUser,
    Json(kiosk_data): Json<KioskReplace>,
) -> Result<Json<KioskResponse>, Error> {
    kiosk_data.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let kiosk = {
        let mut repo = Kiosks::new(&mut conn);
        repo.replace(id, &KioskReplaceDBRequest::from(kiosk_data))
            .await
            .map_err(|e| match e {
                DbError::NotFound => kiosk_not_found(id),
                other => other.into(),
            })?
    };

    let beach = {
        let mut beach_repo = Beaches::new(&mut conn);
        beach_repo.get_by_id(kiosk.beach_id).await?.map(BeachResponse::from)
    };

    let response = KioskResponse::from(kiosk);
    Ok(Json(match beach {
        Some(beach) => response.with_beach(beach),
        None => response,
    }))
}

// PATCH /kiosks/{id} - Partially update a kiosk
#[utoipa::path(
    patch,
    path = "/api/v1/kiosks/{id}",
    tag = "kiosks",
    summary = "Update kiosk",
    description = "Partial update: applies only the supplied fields",
    params(
        ("id" = i64, Path, description = "Kiosk ID"),
    ),
    request_body = KioskPatch,
    responses(
        (status = 200, description = "Kiosk updated", body = KioskResponse),
        (status = 400, description = "Validation failure or no fields supplied"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Kiosk not registered"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("bearer_token" = [])
    )
)]
pub async fn update_kiosk(
    State(state): State<AppState>,
    Path(id): Path<KioskId>,
    _: CurrentUser,
    Json(kiosk_data): Json<KioskPatch>,
) -> Result<Json<KioskResponse>, Error> {
    if kiosk_data.is_empty() {
        return Err(Error::BadRequest {
            message: "No fields supplied".to_string(),
        });
    }
    kiosk_data.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let kiosk = {
        let mut repo = Kiosks::new(&mut conn);
        repo.update(id, &KioskUpdateDBRequest::from(kiosk_data))
            .await
            .map_err(|e| match e {
                DbError::NotFound => kiosk_not_found(id),
                other => other.into(),
            })?
    };

    let beach = {
        let mut beach_repo = Beaches::new(&mut conn);
        beach_repo.get_by_id(kiosk.beach_id).await?.map(BeachResponse::from)
    };

    let response = KioskResponse::from(kiosk);
    Ok(Json(match beach {
        Some(beach) => response.with_beach(beach),
        None => response,
    }))
}

// DELETE /kiosks/{id} - Delete a kiosk
#[utoipa::path(
    delete,
    path = "/api/v1/kiosks/{id}",
    tag = "kiosks",
    summary = "Delete kiosk",
    params(
        ("id" = i64, Path, description = "Kiosk ID"),
    ),
    responses(
        (status = 204, description = "Kiosk deleted"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Kiosk not registered"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("bearer_token" = [])
    )
)]
pub async fn delete_kiosk(State(state): State<AppState>, Path(id): Path<KioskId>, _: CurrentUser) -> Result<StatusCode, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Kiosks::new(&mut conn);

    match repo.delete(id).await? {
        true => Ok(StatusCode::NO_CONTENT),
        false => Err(kiosk_not_found(id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use sqlx::PgPool;

    async fn create_beach(server: &axum_test::TestServer, auth: &str, name: &str) -> BeachResponse {
        server
            .post("/api/v1/beaches")
            .add_header("authorization", auth)
            .json(&serde_json::json!({
                "name": name,
                "state": "CE",
                "municipality": "Fortaleza",
                "latitude": -3.720235,
                "longitude": -38.528434,
                "rating": 4.5
            }))
            .await
            .json()
    }

    fn sol_e_mar_payload(beach_id: i64) -> serde_json::Value {
        serde_json::json!({
            "name": "Quiosque Sol e Mar",
            "description": "Quiosque com drinks e petiscos",
            "score": 4.5,
            "latitude": -3.7201,
            "longitude": -38.5283,
            "accessible": true,
            "has_restroom": true,
            "price": 5,
            "max_occupancy": 100,
            "beach_id": beach_id
        })
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_requires_authentication(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server.post("/api/v1/kiosks").json(&sol_e_mar_payload(1)).await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_then_get_includes_parent_beach(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let auth = test_bearer(&pool).await;
        let beach = create_beach(&server, &auth, "Praia de Iracema").await;

        let response = server
            .post("/api/v1/kiosks")
            .add_header("authorization", auth.as_str())
            .json(&sol_e_mar_payload(beach.id))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let created: KioskResponse = response.json();
        assert_eq!(created.beach_id, beach.id);
        assert_eq!(created.beach.as_ref().unwrap().name, "Praia de Iracema");

        let fetched: KioskResponse = server.get(&format!("/api/v1/kiosks/{}", created.id)).await.json();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.score, Some(4.5));
        assert_eq!(fetched.beach.as_ref().unwrap().id, beach.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_with_unknown_beach_is_400(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let auth = test_bearer(&pool).await;

        let response = server
            .post("/api/v1/kiosks")
            .add_header("authorization", auth.as_str())
            .json(&sol_e_mar_payload(4242))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_out_of_range_score_is_400(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let auth = test_bearer(&pool).await;
        let beach = create_beach(&server, &auth, "Praia de Iracema").await;

        let mut payload = sol_e_mar_payload(beach.id);
        payload["score"] = serde_json::json!(5.5);
        let response = server.post("/api/v1/kiosks").add_header("authorization", auth.as_str()).json(&payload).await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filter_by_beach(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let auth = test_bearer(&pool).await;
        let iracema = create_beach(&server, &auth, "Praia de Iracema").await;
        let copacabana = create_beach(&server, &auth, "Praia de Copacabana").await;

        server
            .post("/api/v1/kiosks")
            .add_header("authorization", auth.as_str())
            .json(&sol_e_mar_payload(iracema.id))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let mut other = sol_e_mar_payload(copacabana.id);
        other["name"] = serde_json::json!("Quiosque Praia Viva");
        server
            .post("/api/v1/kiosks")
            .add_header("authorization", auth.as_str())
            .json(&other)
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let listed: Vec<KioskResponse> = server.get(&format!("/api/v1/kiosks?beach_id={}", iracema.id)).await.json();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Quiosque Sol e Mar");
        assert_eq!(listed[0].beach.as_ref().unwrap().id, iracema.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_put_cannot_reparent(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let auth = test_bearer(&pool).await;
        let iracema = create_beach(&server, &auth, "Praia de Iracema").await;
        let copacabana = create_beach(&server, &auth, "Praia de Copacabana").await;

        let kiosk: KioskResponse = server
            .post("/api/v1/kiosks")
            .add_header("authorization", auth.as_str())
            .json(&sol_e_mar_payload(iracema.id))
            .await
            .json();

        // beach_id is not part of the replace schema and is rejected
        let response = server
            .put(&format!("/api/v1/kiosks/{}", kiosk.id))
            .add_header("authorization", auth.as_str())
            .json(&serde_json::json!({
                "name": "Quiosque Sol e Mar",
                "latitude": -3.7201,
                "longitude": -38.5283,
                "accessible": true,
                "has_restroom": true,
                "beach_id": copacabana.id
            }))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_patch_empty_payload_is_400(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let auth = test_bearer(&pool).await;
        let beach = create_beach(&server, &auth, "Praia de Iracema").await;

        let kiosk: KioskResponse = server
            .post("/api/v1/kiosks")
            .add_header("authorization", auth.as_str())
            .json(&sol_e_mar_payload(beach.id))
            .await
            .json();

        let response = server
            .patch(&format!("/api/v1/kiosks/{}", kiosk.id))
            .add_header("authorization", auth.as_str())
            .json(&serde_json::json!({}))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        assert!(response.text().contains("No fields supplied"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_patch_applies_supplied_fields_only(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let auth = test_bearer(&pool).await;
        let beach = create_beach(&server, &auth, "Praia de Iracema").await;

        let kiosk: KioskResponse = server
            .post("/api/v1/kiosks")
            .add_header("authorization", auth.as_str())
            .json(&sol_e_mar_payload(beach.id))
            .await
            .json();

        let response = server
            .patch(&format!("/api/v1/kiosks/{}", kiosk.id))
            .add_header("authorization", auth.as_str())
            .json(&serde_json::json!({"score": 5.0}))
            .await;
        response.assert_status_ok();
        let patched: KioskResponse = response.json();
        assert_eq!(patched.score, Some(5.0));
        assert_eq!(patched.name, "Quiosque Sol e Mar");
        assert_eq!(patched.beach_id, beach.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_twice_is_404(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let auth = test_bearer(&pool).await;
        let beach = create_beach(&server, &auth, "Praia de Iracema").await;

        let kiosk: KioskResponse = server
            .post("/api/v1/kiosks")
            .add_header("authorization", auth.as_str())
            .json(&sol_e_mar_payload(beach.id))
            .await
            .json();

        server
            .delete(&format!("/api/v1/kiosks/{}", kiosk.id))
            .add_header("authorization", auth.as_str())
            .await
            .assert_status(axum::http::StatusCode::NO_CONTENT);

        server
            .delete(&format!("/api/v1/kiosks/{}", kiosk.id))
            .add_header("authorization", auth.as_str())
            .await
            .assert_status(axum::http::StatusCode::NOT_FOUND);
    }
}
