//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Zvonek Door Hub API",
        version = "0.1.0",
        description = "Lock actuation, doorbell ring, live status socket, camera stream, and pairing accessors for the Zvonek smart doorbell.",
        license(name = "MIT")
    ),
    paths(
        // Door
        crate::routes::door::open_door,
        crate::routes::door::lock_door,
        crate::routes::door::ring,
        // Status
        crate::routes::status_ws::status_socket,
        // Camera
        crate::routes::camera::camera_stream,
        // HomeKit
        crate::routes::homekit::homekit_qr,
        crate::routes::homekit::homekit_code,
        crate::routes::homekit::homekit_status,
        // Accessory
        crate::routes::accessory::read_characteristic,
        crate::routes::accessory::write_characteristic,
        // Operations
        crate::routes::metrics::metrics,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::door::StatusView,
        crate::routes::door::ActionResponse,
        crate::routes::homekit::NotReady,
        crate::routes::homekit::PairingCode,
        crate::routes::homekit::PairingStatus,
        crate::routes::accessory::Characteristic,
        crate::routes::accessory::AccessoryWrite,
        crate::routes::metrics::MetricsReport,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "door", description = "Lock actuation and doorbell"),
        (name = "status", description = "Live status socket"),
        (name = "camera", description = "Camera stream"),
        (name = "homekit", description = "Pairing accessors"),
        (name = "accessory", description = "Loopback hook for the pairing collaborator"),
        (name = "operations", description = "Metrics"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` HTTP security scheme used by the actuation routes.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/open-door",
            "/api/lock-door",
            "/api/ring",
            "/ws/status",
            "/api/camera-stream",
            "/api/homekit-qr",
            "/api/homekit-code",
            "/api/homekit-status",
            "/internal/accessory/lock",
            "/metrics",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn declares_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer"));
    }
}
