use axum::extract::{Path, State};
use axum::http::header::{
    ACCEPT_ENCODING, ACCEPT_RANGES, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE,
    RANGE, VARY,
};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Json, Response};
use depot_types::Oid;
use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};

use crate::encoding::{accepts_gzip, body_stream, STREAM_CHUNK_SIZE};
use crate::error::{error_response, ServerError, ServerResult};
use crate::metadata::RepoRef;
use crate::range::{self, Window, RANGE_NOT_SATISFIABLE_MESSAGE};
use crate::state::AppState;

const OCTET_STREAM: &str = "application/octet-stream";

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler() -> Json<serde_json::Value> {
    Json(json!({
        "name": "depot-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Path parameters of the object download routes.
#[derive(Debug, Deserialize)]
pub struct ObjectPath {
    pub owner: String,
    pub repo: String,
    pub oid: String,
    /// Present on the `/{oid}/{filename}` form; never consulted.
    #[serde(default)]
    pub filename: Option<String>,
}

/// Serve an object, honoring `Range` and `Accept-Encoding`.
pub async fn get_object(
    State(state): State<AppState>,
    Path(path): Path<ObjectPath>,
    headers: HeaderMap,
) -> ServerResult<Response> {
    let Ok(oid) = path.oid.parse::<Oid>() else {
        return Err(ServerError::ObjectNotFound);
    };
    let repo = RepoRef::new(path.owner, &path.repo);

    let Some(pointer) = state.meta.resolve(&repo, &oid).await? else {
        tracing::debug!(%repo, oid = %oid.short_hex(), "object not referenced by repository");
        return Err(ServerError::ObjectNotFound);
    };
    // Missing content or a stored size that disagrees with the pointer are
    // both treated as absent.
    if !state.store.verify(&pointer).await? {
        tracing::warn!(%repo, %pointer, "metadata references an object missing from the store");
        return Err(ServerError::ObjectNotFound);
    }

    let range_header = headers.get(RANGE).and_then(|v| v.to_str().ok());
    let outcome = range::resolve(range_header, pointer.size);
    let Some(window) = outcome.window() else {
        tracing::debug!(%pointer, range = ?range_header, "range not satisfiable");
        return Ok(error_response(
            StatusCode::RANGE_NOT_SATISFIABLE,
            RANGE_NOT_SATISFIABLE_MESSAGE,
        ));
    };

    let reader = state.store.open(&pointer, window.start).await?;
    let mut reader = BufReader::with_capacity(STREAM_CHUNK_SIZE, reader.take(window.len()));

    let client_accepts_gzip = headers
        .get_all(ACCEPT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(accepts_gzip);
    let prefix = reader.fill_buf().await?;
    let decision = ServingDecision {
        status: outcome.status(),
        window,
        use_compression: state
            .encoder
            .should_compress(client_accepts_gzip, window.len(), prefix),
    };

    tracing::debug!(
        %pointer,
        status = decision.status.as_u16(),
        start = window.start,
        len = window.len(),
        gzip = decision.use_compression,
        "serving object"
    );
    decision.respond(reader, state.encoder.is_enabled())
}

/// The complete output contract for one object response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServingDecision {
    pub status: StatusCode,
    pub window: Window,
    pub use_compression: bool,
}

impl ServingDecision {
    /// Write headers and stream `reader`, which must yield exactly the window.
    fn respond<R>(self, reader: R, vary: bool) -> ServerResult<Response>
    where
        R: AsyncBufRead + Send + 'static,
    {
        let mut response = axum::http::Response::builder()
            .status(self.status)
            .header(CONTENT_TYPE, OCTET_STREAM)
            .header(ACCEPT_RANGES, "bytes");
        if self.status == StatusCode::PARTIAL_CONTENT {
            response = response.header(CONTENT_RANGE, self.window.content_range());
        }
        if self.use_compression {
            response = response.header(CONTENT_ENCODING, "gzip");
        } else {
            response = response.header(CONTENT_LENGTH, self.window.len());
        }
        if vary {
            response = response.header(VARY, "Accept-Encoding");
        }

        response
            .body(body_stream(reader, self.use_compression))
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
