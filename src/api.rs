//! HTTP API
//!
//! | Method & path | Handler |
//! |---|---|
//! | `GET /config` | global level |
//! | `PUT /config` | set global level |
//! | `GET /config/:subject` | subject's own level or `null` |
//! | `PUT /config/:subject` | set subject level |
//! | `POST /compatibility/subjects/:subject/versions/:version` | check a schema |
//!
//! Authentication is expected to be enforced in front of this router.

use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::error::SchemaError;
use crate::level::CompatibilityLevel;
use crate::registry::{CompatibilityVerdict, SchemaRegistry};
use crate::version::VersionSelector;

// ==================
// Error codes
// ==================

pub const SUBJECT_NOT_FOUND: u32 = 40401;
pub const VERSION_NOT_FOUND: u32 = 40402;
pub const INVALID_AVRO_SCHEMA: u32 = 42201;
pub const INVALID_REQUEST_BODY: u32 = 42202;
pub const INVALID_COMPATIBILITY_LEVEL: u32 = 42203;
pub const STORE_ERROR: u32 = 50001;

/// Error response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error_code: u32,
    pub message: String,
}

/// An error on its way out of a handler
#[derive(Debug)]
pub enum ApiError {
    /// Raised by the registry
    Registry(SchemaError),
    /// The JSON body was missing, malformed or of the wrong shape
    InvalidBody(JsonRejection),
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        let err = match self {
            ApiError::Registry(err) => err,
            ApiError::InvalidBody(_) => return StatusCode::UNPROCESSABLE_ENTITY,
        };
        match err {
            SchemaError::SubjectNotFound(_) | SchemaError::VersionNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            SchemaError::InvalidAvroSchema(_) | SchemaError::InvalidCompatibilityLevel(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            SchemaError::Store(_) | SchemaError::Io(_) | SchemaError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Fixed body for this error; details stay in the logs
    pub fn body(&self) -> ErrorResponse {
        let err = match self {
            ApiError::Registry(err) => err,
            ApiError::InvalidBody(_) => {
                return ErrorResponse {
                    error_code: INVALID_REQUEST_BODY,
                    message: "Invalid request body".to_string(),
                }
            }
        };
        let (error_code, message) = match err {
            SchemaError::SubjectNotFound(_) => (SUBJECT_NOT_FOUND, "Subject not found"),
            SchemaError::VersionNotFound { .. } => (VERSION_NOT_FOUND, "Version not found"),
            SchemaError::InvalidAvroSchema(_) => (INVALID_AVRO_SCHEMA, "Invalid Avro schema"),
            SchemaError::InvalidCompatibilityLevel(_) => {
                (INVALID_COMPATIBILITY_LEVEL, "Invalid compatibility level")
            }
            SchemaError::Store(_) | SchemaError::Io(_) | SchemaError::Json(_) => {
                (STORE_ERROR, "Error in the backend data store")
            }
        };
        ErrorResponse {
            error_code,
            message: message.to_string(),
        }
    }
}

impl From<SchemaError> for ApiError {
    fn from(err: SchemaError) -> Self {
        ApiError::Registry(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Registry(err) if !err.is_client_error() => {
                tracing::error!(error = %err, "request failed");
            }
            ApiError::Registry(err) => tracing::debug!(error = %err, "request rejected"),
            ApiError::InvalidBody(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "request body rejected");
            }
        }
        let status = self.status_code();
        (status, Json(self.body())).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ==================
// Request / response bodies
// ==================

/// Body of config reads and writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigBody {
    pub compatibility: Option<CompatibilityLevel>,
}

/// Body of a config write
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigUpdate {
    pub compatibility: String,
}

/// Body of a compatibility check
#[derive(Debug, Clone, Deserialize)]
pub struct CompatibilityRequest {
    pub schema: String,
}

// ==================
// Routes
// ==================

/// Build the API router
pub fn router(registry: SchemaRegistry) -> Router {
    Router::new()
        .route("/config", get(get_global_config).put(put_global_config))
        .route(
            "/config/:subject",
            get(get_subject_config).put(put_subject_config),
        )
        .route(
            "/compatibility/subjects/:subject/versions/:version",
            post(check_compatibility),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

/// Serve the API until the process is stopped
pub async fn serve(bind: SocketAddr, registry: SchemaRegistry) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "schema registry listening");
    axum::serve(listener, router(registry)).await
}

async fn get_global_config(State(registry): State<SchemaRegistry>) -> ApiResult<ConfigBody> {
    let level = registry.config().get_global()?;
    Ok(Json(ConfigBody {
        compatibility: Some(level),
    }))
}

async fn put_global_config(
    State(registry): State<SchemaRegistry>,
    update: Result<Json<ConfigUpdate>, JsonRejection>,
) -> ApiResult<ConfigBody> {
    let Json(update) = update?;
    let level = registry.config().set_global(&update.compatibility)?;
    Ok(Json(ConfigBody {
        compatibility: Some(level),
    }))
}

async fn get_subject_config(
    State(registry): State<SchemaRegistry>,
    Path(subject): Path<String>,
) -> ApiResult<ConfigBody> {
    let level = registry.subject_compatibility(&subject)?;
    Ok(Json(ConfigBody {
        compatibility: level,
    }))
}

async fn put_subject_config(
    State(registry): State<SchemaRegistry>,
    Path(subject): Path<String>,
    update: Result<Json<ConfigUpdate>, JsonRejection>,
) -> ApiResult<ConfigBody> {
    // A missing subject is reported ahead of a bad body.
    registry.subject(&subject)?;
    let Json(update) = update?;
    let level = registry.set_subject_compatibility(&subject, &update.compatibility)?;
    Ok(Json(ConfigBody {
        compatibility: Some(level),
    }))
}

async fn check_compatibility(
    State(registry): State<SchemaRegistry>,
    Path((subject, version)): Path<(String, String)>,
    request: Result<Json<CompatibilityRequest>, JsonRejection>,
) -> ApiResult<CompatibilityVerdict> {
    let selector = VersionSelector::parse(&version);
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            // Missing subject or version outranks a bad body.
            registry.versions().resolve(&subject, &selector)?;
            return Err(rejection.into());
        }
    };
    let verdict = registry.check_compatibility(&subject, &selector, &request.schema)?;
    Ok(Json(verdict))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Registry(SchemaError::SubjectNotFound("x".to_string())).status_code(),
            StatusCode::NOT_FOUND
        );
        let invalid = SchemaError::InvalidCompatibilityLevel("x".to_string());
        assert_eq!(
            ApiError::Registry(invalid).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Registry(SchemaError::Store(StoreError::Poisoned)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_bodies() {
        let body = ApiError::Registry(SchemaError::VersionNotFound {
            subject: "users".to_string(),
            selector: "latest".to_string(),
        })
        .body();
        assert_eq!(body.error_code, VERSION_NOT_FOUND);
        assert_eq!(body.message, "Version not found");

        let body = ApiError::Registry(SchemaError::InvalidAvroSchema("bad".to_string())).body();
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            serde_json::json!({"error_code": 42201, "message": "Invalid Avro schema"})
        );
    }
}
