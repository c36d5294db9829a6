//! API route handlers
//!
//! Routes are organized by functionality:
//!
//! - `health`: Liveness and cache metrics
//! - `corpus`: Building a corpus from parameters or an uploaded spreadsheet
//! - `explore`: Concordances and collocations over a corpus
//! - `export`: Zip downloads of corpus and analysis tables

pub mod corpus;
pub mod explore;
pub mod export;
pub mod health;

use crate::error::{ServerError, ServerResult};
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// JSON body whose rejections use the server's error format.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ServerError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// API version and base info (GET /)
///
/// # Response
///
/// ```json
/// {
///   "name": "Korpus Server",
///   "version": "0.1.0",
///   "api_version": "v1",
///   "endpoints": ["..."]
/// }
/// ```
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Korpus Server",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/api/v1/corpus",
            "/api/v1/corpus/upload",
            "/api/v1/concordances",
            "/api/v1/collocations",
            "/api/v1/export/corpus",
            "/api/v1/export/concordances",
            "/api/v1/export/collocations",
            "/health",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
