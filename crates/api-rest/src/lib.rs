//! # API REST
//!
//! REST boundary for the Medex transformer.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (status-code mapping, JSON rejection, CORS)
//!
//! The boundary owns the error translation required by the core taxonomy:
//! malformed payloads are rejected here with `400` before the validator ever
//! runs; validation failures map to `422` with the full violation list;
//! creation and storage failures map to distinct `500` bodies without leaking
//! internal detail beyond an error kind and message.

#![warn(rust_2018_idioms)]

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use medex_core::{BundleStore, CoreError, TransformService, Violation};

/// Application state shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    service: Arc<TransformService<Arc<dyn BundleStore>>>,
}

impl AppState {
    /// State with production capabilities over the given store.
    pub fn new(store: Arc<dyn BundleStore>) -> Self {
        Self {
            service: Arc::new(TransformService::new(store)),
        }
    }

    /// State over a fully assembled service (tests pin ids and clock here).
    pub fn with_service(service: TransformService<Arc<dyn BundleStore>>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Health check response body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PingRes {
    pub status: String,
}

/// Error response body.
///
/// Shape shared by all failure outcomes: an error kind, a human-readable
/// message, and (for validation failures only) the aggregate violation list.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub violations: Option<Vec<Violation>>,
}

#[derive(OpenApi)]
#[openapi(paths(ping, transform), components(schemas(PingRes, ErrorRes)))]
struct ApiDoc;

/// Build the application router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/ping", get(ping))
        .route("/api/transform", post(transform))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/ping",
    responses(
        (status = 200, description = "Service is alive", body = PingRes)
    )
)]
/// Health check endpoint.
#[axum::debug_handler]
async fn ping() -> Json<PingRes> {
    Json(PingRes {
        status: "ok".into(),
    })
}

#[utoipa::path(
    post,
    path = "/api/transform",
    request_body = Object,
    responses(
        (status = 201, description = "Bundle created and stored", body = Object),
        (status = 400, description = "Malformed payload", body = ErrorRes),
        (status = 422, description = "Input validation failed", body = ErrorRes),
        (status = 500, description = "Creation or storage failure", body = ErrorRes)
    )
)]
/// Validate an encounter payload, transform it into a FHIR bundle, persist
/// the result and return it.
#[axum::debug_handler]
async fn transform(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<fhir::Bundle>), (StatusCode, Json<ErrorRes>)> {
    // Unparseable bodies and wrong content types never reach the validator.
    let Json(payload) = payload.map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorRes {
                error: "MalformedPayload".into(),
                message: rejection.body_text(),
                violations: None,
            }),
        )
    })?;

    match state.service.process(&payload) {
        Ok(bundle) => Ok((StatusCode::CREATED, Json(bundle))),
        Err(err) => Err(error_response(err)),
    }
}

fn error_response(err: CoreError) -> (StatusCode, Json<ErrorRes>) {
    match err {
        CoreError::Validation(failure) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorRes {
                error: "ValidationFailed".into(),
                message: format!("input validation failed: {failure}"),
                violations: Some(failure.violations),
            }),
        ),
        CoreError::Creation(err) => {
            tracing::error!("Document creation error: {:?}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorRes {
                    error: "ResourceCreationFailed".into(),
                    message: "Internal error while assembling the document".into(),
                    violations: None,
                }),
            )
        }
        CoreError::Storage(err) => {
            tracing::error!("Bundle storage error: {:?}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorRes {
                    error: "StorageFailed".into(),
                    message: "The document was valid but could not be stored".into(),
                    violations: None,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use chrono::{TimeZone, Utc};
    use http_body_util::BodyExt;
    use medex_core::{MemoryStore, StoreError};
    use medex_uuid::{FixedClock, SequenceIds};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state(store: Arc<dyn BundleStore>) -> AppState {
        AppState::with_service(TransformService::with_capabilities(
            store,
            Box::new(SequenceIds::new()),
            Box::new(FixedClock(
                Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap(),
            )),
        ))
    }

    fn post_transform(body: &str, content_type: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/transform")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_owned()))
            .expect("request")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("body is JSON")
    }

    #[tokio::test]
    async fn ping_reports_ok() {
        let app = router(test_state(Arc::new(MemoryStore::new())));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/ping")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn transform_returns_created_bundle() {
        let store = Arc::new(MemoryStore::new());
        let app = router(test_state(store.clone()));

        let payload = json!({
            "patient": {
                "vorname": "Max",
                "nachname": "Mustermann",
                "geburtsdatum": "1990-01-01",
                "geschlecht": "male"
            },
            "diagnosen": [{"icd10": "I10", "beschreibung": "Hypertonie"}]
        });

        let response = app
            .oneshot(post_transform(&payload.to_string(), "application/json"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["resourceType"], "Bundle");
        assert_eq!(body["type"], "collection");
        assert_eq!(body["entry"].as_array().map(Vec::len), Some(2));

        let patient = &body["entry"][0]["resource"];
        assert_eq!(patient["resourceType"], "Patient");
        assert_eq!(patient["name"][0]["family"], "Mustermann");
        assert_eq!(patient["name"][0]["given"][0], "Max");
        assert_eq!(patient["gender"], "male");
        assert_eq!(patient["birthDate"], "1990-01-01");

        let condition = &body["entry"][1]["resource"];
        assert_eq!(condition["resourceType"], "Condition");
        assert_eq!(condition["code"]["coding"][0]["code"], "I10");
        assert_eq!(condition["code"]["text"], "Hypertonie");

        // Stored under the returned bundle id.
        assert!(store.get(body["id"].as_str().expect("id")).is_some());
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_before_validation() {
        let app = router(test_state(Arc::new(MemoryStore::new())));
        let response = app
            .oneshot(post_transform("{not json", "application/json"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "MalformedPayload");
        assert!(body.get("violations").is_none());
    }

    #[tokio::test]
    async fn wrong_content_type_is_rejected_before_validation() {
        let app = router(test_state(Arc::new(MemoryStore::new())));
        let response = app
            .oneshot(post_transform("{}", "text/plain"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "MalformedPayload");
    }

    #[tokio::test]
    async fn validation_failure_maps_to_unprocessable_entity() {
        let store = Arc::new(MemoryStore::new());
        let app = router(test_state(store.clone()));

        let payload = json!({
            "patient": {
                "vorname": "Max",
                "nachname": "Mustermann",
                "geburtsdatum": "1990-01-01",
                "geschlecht": "invalid"
            }
        });

        let response = app
            .oneshot(post_transform(&payload.to_string(), "application/json"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"], "ValidationFailed");
        let violations = body["violations"].as_array().expect("violations list");
        assert!(violations.iter().any(|v| {
            v["path"] == "patient.geschlecht" && v["kind"] == "not_allowed"
        }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn storage_failure_maps_to_distinct_server_error() {
        struct FailingStore;
        impl BundleStore for FailingStore {
            fn save(&self, _: &str, _: &str, _: &str) -> Result<(), StoreError> {
                Err(StoreError::FileWrite(std::io::Error::other("disk full")))
            }
        }

        let app = router(test_state(Arc::new(FailingStore)));
        let payload = json!({
            "patient": {
                "vorname": "Max",
                "nachname": "Mustermann",
                "geburtsdatum": "1990-01-01",
                "geschlecht": "male"
            }
        });

        let response = app
            .oneshot(post_transform(&payload.to_string(), "application/json"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "StorageFailed");
        // No internal detail beyond kind and message.
        assert!(body["message"].as_str().expect("message").contains("stored"));
        assert!(!body["message"].as_str().expect("message").contains("disk full"));
    }
}
