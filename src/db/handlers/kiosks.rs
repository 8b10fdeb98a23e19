//! Database repository for kiosks.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::kiosks::{KioskCreateDBRequest, KioskDBResponse, KioskReplaceDBRequest, KioskUpdateDBRequest},
};
use crate::types::{BeachId, KioskId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

/// Filter for listing kiosks. Absent constraints match everything.
#[derive(Debug, Clone, Default)]
pub struct KioskFilter {
    pub skip: i64,
    pub limit: i64,
    pub beach_id: Option<BeachId>,
    pub accessible: Option<bool>,
    pub has_restroom: Option<bool>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub max_price: Option<i32>,
}

impl KioskFilter {
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
struct Kiosk {
    pub id: KioskId,
    pub name: String,
    pub description: Option<String>,
    pub score: Option<f64>,
    pub latitude: f64,
    pub longitude: f64,
    pub accessible: bool,
    pub has_restroom: bool,
    pub price: Option<i32>,
    pub max_occupancy: Option<i32>,
    pub beach_id: BeachId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Kiosk> for KioskDBResponse {
    fn from(src: Kiosk) -> Self {
        Self {
            id: src.id,
            name: src.name,
            description: src.description,
            score: src.score,
            latitude: src.latitude,
            longitude: src.longitude,
            accessible: src.accessible,
            has_restroom: src.has_restroom,
            price: src.price,
            max_occupancy: src.max_occupancy,
            beach_id: src.beach_id,
            created_at: src.created_at,
            updated_at: src.updated_at,
        }
    }
}

pub struct Kiosks<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Kiosks<'c> {
    type CreateRequest = KioskCreateDBRequest;
    type UpdateRequest = KioskUpdateDBRequest;
    type Response = KioskDBResponse;
    type Id = KioskId;
    type Filter = KioskFilter;

    #[instrument(skip(self, request), fields(name = %request.name, beach_id = request.beach_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let kiosk = sqlx::query_as!(
            Kiosk,
            r#"
            INSERT INTO kiosks (name, description, score, latitude, longitude, accessible, has_restroom, price, max_occupancy, beach_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
            request.name,
            request.description,
            request.score,
            request.latitude,
            request.longitude,
            request.accessible,
            request.has_restroom,
            request.price,
            request.max_occupancy,
            request.beach_id
        )
        .fetch_one(&mut *self.db)
        .await?;

        Ok(kiosk.into())
    }

    #[instrument(skip(self), fields(kiosk_id = id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let kiosk = sqlx::query_as!(Kiosk, "SELECT * FROM kiosks WHERE id = $1", id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(kiosk.map(Into::into))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let kiosks = sqlx::query_as!(
            Kiosk,
            r#"
            SELECT * FROM kiosks
            WHERE ($3::bigint IS NULL OR beach_id = $3)
              AND ($4::boolean IS NULL OR accessible = $4)
              AND ($5::boolean IS NULL OR has_restroom = $5)
              AND ($6::double precision IS NULL OR score >= $6)
              AND ($7::double precision IS NULL OR score <= $7)
              AND ($8::integer IS NULL OR price <= $8)
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
            filter.limit,
            filter.skip,
            filter.beach_id,
            filter.accessible,
            filter.has_restroom,
            filter.min_score,
            filter.max_score,
            filter.max_price
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(kiosks.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, request), fields(kiosk_id = id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // beach_id is deliberately not updatable: kiosks are never reparented
        let kiosk = sqlx::query_as!(
            Kiosk,
            r#"
            UPDATE kiosks SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                score = COALESCE($4, score),
                latitude = COALESCE($5, latitude),
                longitude = COALESCE($6, longitude),
                accessible = COALESCE($7, accessible),
                has_restroom = COALESCE($8, has_restroom),
                price = COALESCE($9, price),
                max_occupancy = COALESCE($10, max_occupancy),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
            id,
            request.name.as_deref(),
            request.description.as_deref(),
            request.score,
            request.latitude,
            request.longitude,
            request.accessible,
            request.has_restroom,
            request.price,
            request.max_occupancy
        )
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(kiosk.into())
    }

    #[instrument(skip(self), fields(kiosk_id = id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query!("DELETE FROM kiosks WHERE id = $1", id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> Kiosks<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Overwrite every mutable column with the supplied values. Optional
    /// columns are set to NULL when the request carries no value for them.
    #[instrument(skip(self, request), fields(kiosk_id = id), err)]
    pub async fn replace(&mut self, id: KioskId, request: &KioskReplaceDBRequest) -> Result<KioskDBResponse> {
        let kiosk = sqlx::query_as!(
            Kiosk,
            r#"
            UPDATE kiosks SET
                name = $2,
                description = $3,
                score = $4,
                latitude = $5,
                longitude = $6,
                accessible = $7,
                has_restroom = $8,
                price = $9,
                max_occupancy = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
            id,
            request.name,
            request.description,
            request.score,
            request.latitude,
            request.longitude,
            request.accessible,
            request.has_restroom,
            request.price,
            request.max_occupancy
        )
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(kiosk.into())
    }

    /// All kiosks belonging to the given beaches, grouped by beach, in
    /// natural order within each group. Used to eager-load kiosks when
    /// listing beaches.
    #[instrument(skip(self, beach_ids), fields(count = beach_ids.len()), err)]
    pub async fn list_for_beaches(&mut self, beach_ids: Vec<BeachId>) -> Result<std::collections::HashMap<BeachId, Vec<KioskDBResponse>>> {
        if beach_ids.is_empty() {
            return Ok(std::collections::HashMap::new());
        }

        let kiosks = sqlx::query_as!(Kiosk, "SELECT * FROM kiosks WHERE beach_id = ANY($1) ORDER BY id", &beach_ids)
            .fetch_all(&mut *self.db)
            .await?;

        let mut grouped: std::collections::HashMap<BeachId, Vec<KioskDBResponse>> = std::collections::HashMap::new();
        for kiosk in kiosks {
            grouped.entry(kiosk.beach_id).or_default().push(kiosk.into());
        }

        Ok(grouped)
    }
}
