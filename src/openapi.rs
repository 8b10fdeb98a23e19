//! OpenAPI document assembly.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::models::{
    beaches::{BeachCreate, BeachPatch, BeachReplace, BeachResponse},
    kiosks::{KioskCreate, KioskPatch, KioskReplace, KioskResponse},
    pagination::Pagination,
    users::{LoginRequest, RefreshRequest, RegisterRequest, TokenResponse, UserResponse},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::auth::register,
        crate::api::handlers::auth::login,
        crate::api::handlers::auth::refresh,
        crate::api::handlers::auth::me,
        crate::api::handlers::beaches::list_beaches,
        crate::api::handlers::beaches::get_beach,
        crate::api::handlers::beaches::create_beach,
        crate::api::handlers::beaches::replace_beach,
        crate::api::handlers::beaches::update_beach,
        crate::api::handlers::beaches::delete_beach,
        crate::api::handlers::kiosks::list_kiosks,
        crate::api::handlers::kiosks::get_kiosk,
        crate::api::handlers::kiosks::create_kiosk,
        crate::api::handlers::kiosks::replace_kiosk,
        crate::api::handlers::kiosks::update_kiosk,
        crate::api::handlers::kiosks::delete_kiosk,
    ),
    components(schemas(
        BeachCreate,
        BeachReplace,
        BeachPatch,
        BeachResponse,
        KioskCreate,
        KioskReplace,
        KioskPatch,
        KioskResponse,
        Pagination,
        RegisterRequest,
        LoginRequest,
        RefreshRequest,
        TokenResponse,
        UserResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "authentication", description = "Registration, login, and token refresh"),
        (name = "beaches", description = "Beach registry"),
        (name = "kiosks", description = "Kiosks belonging to beaches"),
    ),
    info(
        title = "orla",
        description = "A registry of beaches and their kiosks",
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}
