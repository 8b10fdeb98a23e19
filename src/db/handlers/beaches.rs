//! Database repository for beaches.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::beaches::{BeachCreateDBRequest, BeachDBResponse, BeachUpdateDBRequest},
};
use crate::types::BeachId;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

/// Filter for listing beaches. Absent constraints match everything.
#[derive(Debug, Clone, Default)]
pub struct BeachFilter {
    pub skip: i64,
    pub limit: i64,
    pub state: Option<String>,
    pub municipality: Option<String>,
    pub has_bathing_area: Option<bool>,
    pub has_lifeguard: Option<bool>,
    pub has_kiosks: Option<bool>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub min_length: Option<i32>,
    pub max_length: Option<i32>,
}

impl BeachFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Beach {
    pub id: BeachId,
    pub name: String,
    pub state: String,
    pub municipality: String,
    pub latitude: f64,
    pub longitude: f64,
    pub length: Option<i32>,
    pub width: Option<i32>,
    pub has_bathing_area: bool,
    pub has_lifeguard: bool,
    pub rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Beach> for BeachDBResponse {
    fn from(src: Beach) -> Self {
        Self {
            id: src.id,
            name: src.name,
            state: src.state,
            municipality: src.municipality,
            latitude: src.latitude,
            longitude: src.longitude,
            length: src.length,
            width: src.width,
            has_bathing_area: src.has_bathing_area,
            has_lifeguard: src.has_lifeguard,
            rating: src.rating,
            created_at: src.created_at,
            updated_at: src.updated_at,
        }
    }
}

pub struct Beaches<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Beaches<'c> {
    type CreateRequest = BeachCreateDBRequest;
    type UpdateRequest = BeachUpdateDBRequest;
    type Response = BeachDBResponse;
    type Id = BeachId;
    type Filter = BeachFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        // created_at and updated_at use database DEFAULT NOW() for consistency
        let beach = sqlx::query_as!(
            Beach,
            r#"
            INSERT INTO beaches (name, state, municipality, latitude, longitude, length, width, has_bathing_area, has_lifeguard, rating)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
            request.name,
            request.state,
            request.municipality,
            request.latitude,
            request.longitude,
            request.length,
            request.width,
            request.has_bathing_area,
            request.has_lifeguard,
            request.rating
        )
        .fetch_one(&mut *self.db)
        .await?;

        Ok(beach.into())
    }

    #[instrument(skip(self), fields(beach_id = id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let beach = sqlx::query_as!(Beach, "SELECT * FROM beaches WHERE id = $1", id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(beach.map(Into::into))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        // Natural (insertion) order: ORDER BY id. Each absent filter imposes
        // no constraint.
        let beaches = sqlx::query_as!(
            Beach,
            r#"
            SELECT * FROM beaches
            WHERE ($3::text IS NULL OR state = $3)
              AND ($4::text IS NULL OR municipality = $4)
              AND ($5::boolean IS NULL OR has_bathing_area = $5)
              AND ($6::boolean IS NULL OR has_lifeguard = $6)
              AND ($7::boolean IS NULL
                   OR EXISTS (SELECT 1 FROM kiosks WHERE kiosks.beach_id = beaches.id) = $7)
              AND ($8::double precision IS NULL OR rating >= $8)
              AND ($9::double precision IS NULL OR rating <= $9)
              AND ($10::integer IS NULL OR length >= $10)
              AND ($11::integer IS NULL OR length <= $11)
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
            filter.limit,
            filter.skip,
            filter.state.as_deref(),
            filter.municipality.as_deref(),
            filter.has_bathing_area,
            filter.has_lifeguard,
            filter.has_kiosks,
            filter.min_rating,
            filter.max_rating,
            filter.min_length,
            filter.max_length
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(beaches.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, request), fields(beach_id = id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // Atomic update with conditional field updates
        let beach = sqlx::query_as!(
            Beach,
            r#"
            UPDATE beaches SET
                name = COALESCE($2, name),
                state = COALESCE($3, state),
                municipality = COALESCE($4, municipality),
                latitude = COALESCE($5, latitude),
                longitude = COALESCE($6, longitude),
                length = COALESCE($7, length),
                width = COALESCE($8, width),
                has_bathing_area = COALESCE($9, has_bathing_area),
                has_lifeguard = COALESCE($10, has_lifeguard),
                rating = COALESCE($11, rating),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
            id,
            request.name.as_deref(),
            request.state.as_deref(),
            request.municipality.as_deref(),
            request.latitude,
            request.longitude,
            request.length,
            request.width,
            request.has_bathing_area,
            request.has_lifeguard,
            request.rating
        )
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(beach.into())
    }

    #[instrument(skip(self), fields(beach_id = id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        // Kiosks go with their beach via ON DELETE CASCADE
        let result = sqlx::query!("DELETE FROM beaches WHERE id = $1", id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> Beaches<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Overwrite every mutable column with the supplied values. Unlike
    /// [`Repository::update`], optional columns are set to NULL when the
    /// request carries no value for them.
    #[instrument(skip(self, request), fields(beach_id = id), err)]
    pub async fn replace(&mut self, id: BeachId, request: &BeachCreateDBRequest) -> Result<BeachDBResponse> {
        let beach = sqlx::query_as!(
            Beach,
            r#"
            UPDATE beaches SET
                name = $2,
                state = $3,
                municipality = $4,
                latitude = $5,
                longitude = $6,
                length = $7,
                width = $8,
                has_bathing_area = $9,
                has_lifeguard = $10,
                rating = $11,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
            id,
            request.name,
            request.state,
            request.municipality,
            request.latitude,
            request.longitude,
            request.length,
            request.width,
            request.has_bathing_area,
            request.has_lifeguard,
            request.rating
        )
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(beach.into())
    }

    /// Get lots of beaches by their IDs, keyed by ID. Used to eager-load
    /// parents when listing kiosks.
    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn get_bulk(&mut self, ids: Vec<BeachId>) -> Result<std::collections::HashMap<BeachId, BeachDBResponse>> {
        if ids.is_empty() {
            return Ok(std::collections::HashMap::new());
        }

        let beaches = sqlx::query_as!(Beach, "SELECT * FROM beaches WHERE id = ANY($1)", &ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(beaches.into_iter().map(|b| (b.id, b.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Kiosks;
    use crate::db::models::kiosks::KioskCreateDBRequest;
    use sqlx::PgPool;

    fn iracema() -> BeachCreateDBRequest {
        BeachCreateDBRequest {
            name: "Praia de Iracema".to_string(),
            state: "CE".to_string(),
            municipality: "Fortaleza".to_string(),
            latitude: -3.720235,
            longitude: -38.528434,
            length: Some(1500),
            width: Some(50),
            has_bathing_area: true,
            has_lifeguard: true,
            rating: Some(4.5),
        }
    }

    fn copacabana() -> BeachCreateDBRequest {
        BeachCreateDBRequest {
            name: "Praia de Copacabana".to_string(),
            state: "RJ".to_string(),
            municipality: "Rio de Janeiro".to_string(),
            latitude: -22.971556,
            longitude: -43.184306,
            length: Some(4000),
            width: Some(100),
            has_bathing_area: true,
            has_lifeguard: true,
            rating: Some(4.7),
        }
    }

    fn kiosk_for(beach_id: BeachId) -> KioskCreateDBRequest {
        KioskCreateDBRequest {
            name: "Quiosque Sol e Mar".to_string(),
            description: Some("Drinks e petiscos".to_string()),
            score: Some(4.5),
            latitude: -3.7201,
            longitude: -38.5283,
            accessible: true,
            has_restroom: true,
            price: Some(5),
            max_occupancy: Some(100),
            beach_id,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_then_get_round_trips(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Beaches::new(&mut conn);

        let created = repo.create(&iracema()).await.unwrap();
        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.name, "Praia de Iracema");
        assert_eq!(fetched.state, "CE");
        assert_eq!(fetched.length, Some(1500));
        assert_eq!(fetched.rating, Some(4.5));
        assert!(fetched.has_bathing_area);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_name_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Beaches::new(&mut conn);

        repo.create(&iracema()).await.unwrap();
        let err = repo.create(&iracema()).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // Nothing from the second attempt was persisted
        let all = repo.list(&BeachFilter::new(0, 50)).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_min_rating_filter(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Beaches::new(&mut conn);

        repo.create(&iracema()).await.unwrap();
        repo.create(&copacabana()).await.unwrap();

        let filter = BeachFilter {
            min_rating: Some(4.6),
            ..BeachFilter::new(0, 50)
        };
        let result = repo.list(&filter).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Praia de Copacabana");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_natural_order_and_pagination(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Beaches::new(&mut conn);

        let first = repo.create(&iracema()).await.unwrap();
        let second = repo.create(&copacabana()).await.unwrap();

        let all = repo.list(&BeachFilter::new(0, 50)).await.unwrap();
        assert_eq!(all.iter().map(|b| b.id).collect::<Vec<_>>(), vec![first.id, second.id]);

        let page = repo.list(&BeachFilter::new(1, 50)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, second.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_has_kiosks_filter(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let with_kiosk;
        {
            let mut repo = Beaches::new(&mut conn);
            with_kiosk = repo.create(&iracema()).await.unwrap();
            repo.create(&copacabana()).await.unwrap();
        }
        {
            let mut kiosks = Kiosks::new(&mut conn);
            kiosks.create(&kiosk_for(with_kiosk.id)).await.unwrap();
        }

        let mut repo = Beaches::new(&mut conn);
        let filter = BeachFilter {
            has_kiosks: Some(true),
            ..BeachFilter::new(0, 50)
        };
        let result = repo.list(&filter).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, with_kiosk.id);

        let filter = BeachFilter {
            has_kiosks: Some(false),
            ..BeachFilter::new(0, 50)
        };
        let result = repo.list(&filter).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Praia de Copacabana");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_sparse_update_keeps_absent_fields(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Beaches::new(&mut conn);

        let created = repo.create(&iracema()).await.unwrap();
        let updated = repo
            .update(
                created.id,
                &BeachUpdateDBRequest {
                    rating: Some(4.9),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.rating, Some(4.9));
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.length, created.length);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_replace_nulls_absent_optionals(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Beaches::new(&mut conn);

        let created = repo.create(&iracema()).await.unwrap();
        let mut replacement = copacabana();
        replacement.name = "Praia de Iracema".to_string();
        replacement.rating = None;

        let replaced = repo.replace(created.id, &replacement).await.unwrap();
        assert_eq!(replaced.id, created.id);
        assert_eq!(replaced.municipality, "Rio de Janeiro");
        assert_eq!(replaced.rating, None);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_missing_beach_is_not_found(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Beaches::new(&mut conn);

        let err = repo
            .update(
                4242,
                &BeachUpdateDBRequest {
                    name: Some("Praia Fantasma".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_cascades_to_kiosks(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let beach;
        let kiosk;
        {
            let mut repo = Beaches::new(&mut conn);
            beach = repo.create(&iracema()).await.unwrap();
        }
        {
            let mut kiosks = Kiosks::new(&mut conn);
            kiosk = kiosks.create(&kiosk_for(beach.id)).await.unwrap();
        }

        let mut repo = Beaches::new(&mut conn);
        assert!(repo.delete(beach.id).await.unwrap());
        // Second delete finds nothing
        assert!(!repo.delete(beach.id).await.unwrap());

        let mut kiosks = Kiosks::new(&mut conn);
        assert!(kiosks.get_by_id(kiosk.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_bulk(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Beaches::new(&mut conn);

        assert!(repo.get_bulk(vec![]).await.unwrap().is_empty());

        let a = repo.create(&iracema()).await.unwrap();
        let b = repo.create(&copacabana()).await.unwrap();

        let map = repo.get_bulk(vec![a.id, b.id]).await.unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&a.id].name, "Praia de Iracema");
        assert_eq!(map[&b.id].name, "Praia de Copacabana");
    }
}
