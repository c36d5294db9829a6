use crate::error::ServerResult;
use crate::routes::explore::{CollocationBody, ConcordanceBody};
use crate::routes::JsonBody;
use crate::state::ServerState;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use korpus::{AnalysisBackend, CorpusHandle, SearchBackend};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CorpusExportBody {
    pub corpus: CorpusHandle,
}

fn zip_response(filename: &str, bytes: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{filename}\"");
    (
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

pub async fn export_corpus<B>(
    State(state): State<Arc<ServerState<B>>>,
    JsonBody(body): JsonBody<CorpusExportBody>,
) -> ServerResult<impl IntoResponse>
where
    B: SearchBackend + AnalysisBackend + 'static,
{
    let bytes = state.explorer.export_corpus(&body.corpus).await?;
    Ok(zip_response("korpus.zip", bytes))
}

pub async fn export_concordances<B>(
    State(state): State<Arc<ServerState<B>>>,
    JsonBody(body): JsonBody<ConcordanceBody>,
) -> ServerResult<impl IntoResponse>
where
    B: SearchBackend + AnalysisBackend + 'static,
{
    let bytes = state
        .explorer
        .export_concordances(&body.corpus, &body.request)
        .await?;
    Ok(zip_response("konkordanser.zip", bytes))
}

pub async fn export_collocations<B>(
    State(state): State<Arc<ServerState<B>>>,
    JsonBody(body): JsonBody<CollocationBody>,
) -> ServerResult<impl IntoResponse>
where
    B: SearchBackend + AnalysisBackend + 'static,
{
    let bytes = state
        .explorer
        .export_collocations(&body.corpus, &body.request)
        .await?;
    Ok(zip_response("kollokasjoner.zip", bytes))
}
