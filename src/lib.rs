//! # orla: a beach & kiosk registry backend
//!
//! `orla` is a REST backend for a registry of beaches and the vendor kiosks
//! that operate on them. It exposes CRUD endpoints with filterable listings
//! for both resources, and a username/password authentication flow issuing
//! short-lived access tokens and longer-lived refresh tokens.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses PostgreSQL (via SQLx) for all persistence.
//!
//! ### Request Flow
//!
//! A request to a resource endpoint passes through the router into a handler
//! in [`api::handlers`]. The handler validates the payload against its
//! declared field domains, acquires a connection from the pool for the
//! duration of the request, and delegates to a repository in
//! [`db::handlers`]. Collection reads go through the filtering layer (a
//! `*Filter` struct translated into a single SQL query) and eagerly include
//! related entities: a beach listing carries each beach's kiosks, a kiosk
//! listing carries each kiosk's parent beach. Results are serialized back as
//! JSON; failures are translated to status codes at the boundary only, by
//! the [`errors::Error`] type.
//!
//! Mutating endpoints additionally require a bearer access token. The
//! [`auth`] module owns password hashing (Argon2id), token issuance and
//! verification (HS256 JWTs), and the extractor that resolves the token
//! subject to a stored user. Exactly one refresh token is valid per user at
//! a time: logging in or refreshing replaces the stored token, so a
//! superseded token can never be replayed.
//!
//! ### Core Components
//!
//! - **API layer** ([`api`]): RESTful resource endpoints under `/api/v1`
//!   plus the authentication group under `/auth`, documented with OpenAPI
//!   annotations and served at `/docs`.
//! - **Database layer** ([`db`]): one repository per entity behind the
//!   repository trait, plain record models, and a unified database error
//!   type. Uniqueness (beach name, username) and referential integrity are
//!   enforced by the store; violations roll back and surface as client
//!   errors.
//! - **Configuration** ([`config`]): a YAML file merged with `ORLA_`
//!   environment variables into an explicit `Config` passed to the
//!   components that need it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use orla::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = orla::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     orla::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! The application requires a PostgreSQL database and automatically runs
//! migrations on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! orla::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    db::handlers::{Beaches, Kiosks, Repository},
    db::models::{beaches::BeachCreateDBRequest, kiosks::KioskCreateDBRequest},
    openapi::ApiDoc,
};
use axum::{
    http::{self, HeaderValue},
    routing::get,
    routing::post,
    Router,
};
use bon::Builder;
pub use config::Config;
use config::CorsOrigin;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// Contains the connection pool and the configuration loaded at startup.
/// There is no other inter-request state: each handler acquires its own
/// connection from the pool and releases it when the request completes.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the orla database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Seed the database with the reference data set (runs only once).
///
/// Inserts three beaches and three kiosks inside one transaction. The
/// function is idempotent: when the beaches table already has rows, seeding
/// is skipped so restarts never duplicate or overwrite manual changes.
#[instrument(skip_all)]
pub async fn seed_database(db: &PgPool) -> Result<(), anyhow::Error> {
    let mut tx = db.begin().await?;

    let already_seeded = sqlx::query_scalar!("SELECT EXISTS(SELECT 1 FROM beaches)")
        .fetch_one(&mut *tx)
        .await?
        .unwrap_or(false);

    if already_seeded {
        info!("Database already contains beaches, skipping seeding");
        tx.commit().await?;
        return Ok(());
    }

    info!("Seeding database with reference beaches and kiosks");

    let beach_seeds = [
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
        },
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
        },
        BeachCreateDBRequest {
            name: "Praia do Sancho".to_string(),
            state: "PE".to_string(),
            municipality: "Fernando de Noronha".to_string(),
            latitude: -3.855,
            longitude: -32.443056,
            length: Some(300),
            width: Some(30),
            has_bathing_area: true,
            has_lifeguard: false,
            rating: Some(5.0),
        },
    ];

    let mut beach_ids = Vec::new();
    {
        let mut beaches = Beaches::new(&mut tx);
        for seed in &beach_seeds {
            let beach = beaches.create(seed).await?;
            debug!("Seeded beach: {}", beach.name);
            beach_ids.push(beach.id);
        }
    }

    let kiosk_seeds = [
        KioskCreateDBRequest {
            name: "Quiosque Sol e Mar".to_string(),
            description: Some("Quiosque com drinks e petiscos".to_string()),
            score: Some(4.5),
            latitude: -3.7201,
            longitude: -38.5283,
            accessible: true,
            has_restroom: true,
            price: Some(5),
            max_occupancy: Some(100),
            beach_id: beach_ids[0],
        },
        KioskCreateDBRequest {
            name: "Quiosque Praia Viva".to_string(),
            description: Some("Quiosque familiar".to_string()),
            score: Some(4.2),
            latitude: -22.9716,
            longitude: -43.1843,
            accessible: false,
            has_restroom: true,
            price: Some(3),
            max_occupancy: Some(80),
            beach_id: beach_ids[1],
        },
        KioskCreateDBRequest {
            name: "Quiosque Mar Azul".to_string(),
            description: Some("Quiosque rústico com vista para o mar".to_string()),
            score: Some(5.0),
            latitude: -3.7205,
            longitude: -38.529,
            accessible: true,
            has_restroom: false,
            price: Some(2),
            max_occupancy: Some(50),
            beach_id: beach_ids[0],
        },
    ];

    {
        let mut kiosks = Kiosks::new(&mut tx);
        for seed in &kiosk_seeds {
            let kiosk = kiosks.create(seed).await?;
            debug!("Seeded kiosk: {}", kiosk.name);
        }
    }

    // Commit the transaction - either everything succeeds or nothing changes
    tx.commit().await?;

    debug!("Database seeded successfully");

    Ok(())
}

/// Setup the database connection pool, run migrations, and optionally seed
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let pool_settings = &config.database.pool;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(pool_settings.max_connections)
        .min_connections(pool_settings.min_connections)
        .acquire_timeout(std::time::Duration::from_secs(pool_settings.acquire_timeout_secs))
        .idle_timeout(match pool_settings.idle_timeout_secs {
            0 => None,
            secs => Some(std::time::Duration::from_secs(secs)),
        })
        .connect(&config.database.url)
        .await?;

    migrator().run(&pool).await?;

    if config.seed_on_startup {
        seed_database(&pool).await?;
    }

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// Reads on the resource endpoints are public; every mutation goes through
/// the bearer-token extractor. The router also serves a health check at
/// `/healthz` and the OpenAPI UI at `/docs`.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    // Authentication routes (at root level)
    let auth_routes = Router::new()
        .route("/auth/register", post(api::handlers::auth::register))
        .route("/auth/login", post(api::handlers::auth::login))
        .route("/auth/refresh", post(api::handlers::auth::refresh))
        .route("/auth/me", get(api::handlers::auth::me))
        .with_state(state.clone());

    // Resource routes
    let api_routes = Router::new()
        .route(
            "/beaches",
            get(api::handlers::beaches::list_beaches).post(api::handlers::beaches::create_beach),
        )
        .route(
            "/beaches/{id}",
            get(api::handlers::beaches::get_beach)
                .put(api::handlers::beaches::replace_beach)
                .patch(api::handlers::beaches::update_beach)
                .delete(api::handlers::beaches::delete_beach),
        )
        .route(
            "/kiosks",
            get(api::handlers::kiosks::list_kiosks).post(api::handlers::kiosks::create_kiosk),
        )
        .route(
            "/kiosks/{id}",
            get(api::handlers::kiosks::get_kiosk)
                .put(api::handlers::kiosks::replace_kiosk)
                .patch(api::handlers::kiosks::update_kiosk)
                .delete(api::handlers::kiosks::delete_kiosk),
        )
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route(
            "/api-docs/openapi.json",
            get(|| async { axum::response::Json(ApiDoc::openapi()) }),
        )
        .merge(auth_routes)
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    // Create CORS layer from config
    let cors_layer = create_cors_layer(&state.config)?;

    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects the pool, runs migrations,
///    and optionally seeds the database
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts
///    handling requests
/// 3. **Shutdown**: when the shutdown signal resolves, the server drains
///    in-flight requests and closes the pool
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting orla with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;

        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "orla listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        // Run the server with graceful shutdown
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        // Close database connections
        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
