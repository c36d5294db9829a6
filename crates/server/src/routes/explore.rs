use crate::error::ServerResult;
use crate::routes::JsonBody;
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use korpus::{
    AnalysisBackend, CollocationRequest, ConcordanceRequest, CorpusHandle, SearchBackend,
};
use serde::Deserialize;
use std::sync::Arc;

/// Concordance search over a caller-held corpus
#[derive(Debug, Deserialize)]
pub struct ConcordanceBody {
    pub corpus: CorpusHandle,
    #[serde(flatten)]
    pub request: ConcordanceRequest,
}

/// Collocation analysis over a caller-held corpus
#[derive(Debug, Deserialize)]
pub struct CollocationBody {
    pub corpus: CorpusHandle,
    #[serde(flatten)]
    pub request: CollocationRequest,
}

pub async fn concordances<B>(
    State(state): State<Arc<ServerState<B>>>,
    JsonBody(body): JsonBody<ConcordanceBody>,
) -> ServerResult<impl IntoResponse>
where
    B: SearchBackend + AnalysisBackend + 'static,
{
    let table = state.explorer.concordances(&body.corpus, &body.request).await?;
    Ok(Json(table))
}

/// Ranked collocates; the word cloud is only part of the export.
pub async fn collocations<B>(
    State(state): State<Arc<ServerState<B>>>,
    JsonBody(body): JsonBody<CollocationBody>,
) -> ServerResult<impl IntoResponse>
where
    B: SearchBackend + AnalysisBackend + 'static,
{
    let result = state.explorer.collocations(&body.corpus, &body.request).await?;
    Ok(Json(result.table))
}
