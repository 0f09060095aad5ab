use std::sync::Arc;

use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
  common::{errors::ApiError, logger::preview},
  protocol::tracks::{StreamLocator, TrackRecord},
  server::AppState,
};

#[derive(Debug, Deserialize)]
pub struct LoadTracksQuery {
  pub identifier: String,
}

#[derive(Debug, Deserialize)]
pub struct StreamTrackQuery {
  pub identifier: String,
  #[serde(default)]
  pub index: usize,
}

#[derive(Debug, Serialize)]
pub struct LoadTracksResponse {
  pub tracks: Vec<TrackRecord>,
}

#[derive(Debug, Serialize)]
pub struct StreamTrackResponse {
  pub track: TrackRecord,
  pub stream: StreamLocator,
}

#[derive(Debug, Serialize)]
pub struct SourcesResponse {
  pub sources: Vec<&'static str>,
}

/// GET /v1/loadtracks?identifier=...
pub async fn load_tracks(
  Query(params): Query<LoadTracksQuery>,
  State(state): State<Arc<AppState>>,
) -> Json<LoadTracksResponse> {
  info!("GET /v1/loadtracks: identifier='{}'", preview(&params.identifier));

  Json(LoadTracksResponse {
    tracks: state.resolver.resolve(&params.identifier).await,
  })
}

/// GET /v1/streamtrack?identifier=...&index=...
pub async fn stream_track(
  Query(params): Query<StreamTrackQuery>,
  State(state): State<Arc<AppState>>,
) -> Response {
  const PATH: &str = "/v1/streamtrack";
  info!(
    "GET /v1/streamtrack: identifier='{}' index={}",
    preview(&params.identifier),
    params.index
  );

  let mut tracks = state.resolver.resolve(&params.identifier).await;
  if params.index >= tracks.len() {
    let message = if tracks.is_empty() {
      "No matches found".to_string()
    } else {
      format!("Index {} out of range ({} tracks)", params.index, tracks.len())
    };
    return (StatusCode::NOT_FOUND, Json(ApiError::not_found(message, PATH))).into_response();
  }

  let track = tracks.swap_remove(params.index);
  match state.streams.stream(&track).await {
    Ok(stream) => Json(StreamTrackResponse { track, stream }).into_response(),
    Err(e) => {
      warn!("GET /v1/streamtrack: {}", e);
      (
        StatusCode::BAD_GATEWAY,
        Json(ApiError::bad_gateway(e.to_string(), PATH)),
      )
        .into_response()
    }
  }
}

/// GET /v1/sources
pub async fn list_sources(State(state): State<Arc<AppState>>) -> Json<SourcesResponse> {
  Json(SourcesResponse {
    sources: state.source_manager.source_names(),
  })
}
