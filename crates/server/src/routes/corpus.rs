use crate::error::{ServerError, ServerResult};
use crate::routes::JsonBody;
use crate::state::ServerState;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use korpus::{
    AnalysisBackend, CorpusHandle, CorpusMetadata, CorpusParams, DisplayTable, ExplorerError,
    SearchBackend,
};
use serde::Serialize;
use std::sync::Arc;

/// Multipart field carrying the uploaded spreadsheet.
pub const UPLOAD_FIELD: &str = "spreadsheet";

/// A resolved corpus and the handle to send back on follow-up requests.
#[derive(Debug, Serialize)]
pub struct CorpusResponse {
    pub handle: CorpusHandle,
    pub table: DisplayTable,
}

/// Build a corpus from search parameters
pub async fn build_corpus<B>(
    State(state): State<Arc<ServerState<B>>>,
    JsonBody(params): JsonBody<CorpusParams>,
) -> ServerResult<impl IntoResponse>
where
    B: SearchBackend + AnalysisBackend + 'static,
{
    let handle = CorpusHandle::from(CorpusMetadata::try_from(params)?);
    let table = state.explorer.table(&handle).await?;
    Ok(Json(CorpusResponse { handle, table }))
}

/// Build a corpus from an uploaded `.xlsx`, `.csv` or `.zip` file
pub async fn upload_corpus<B>(
    State(state): State<Arc<ServerState<B>>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ServerResult<impl IntoResponse>
where
    B: SearchBackend + AnalysisBackend + 'static,
{
    let mut multipart = multipart.map_err(|rejection| ServerError::BadRequest(rejection.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServerError::BadRequest(err.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ServerError::BadRequest(err.body_text()))?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload.ok_or_else(|| {
        ServerError::BadRequest(format!("multipart field `{UPLOAD_FIELD}` is required"))
    })?;

    let (handle, corpus) = state.explorer.upload(&filename, &bytes).await?;
    let table = state
        .explorer
        .pipelines()
        .table(&corpus)
        .map_err(ExplorerError::from)?;

    tracing::info!(filename = %filename, rows = table.len(), "corpus_upload_served");
    Ok(Json(CorpusResponse { handle, table }))
}
