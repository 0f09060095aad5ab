use std::sync::Arc;

use axum::{Router, middleware, routing::get};

use crate::{
  server::AppState,
  transport::{
    middleware::{add_response_headers, check_auth},
    routes::tracks,
  },
};

const API_V1: &str = "/v1";

pub fn router(state: Arc<AppState>) -> Router {
  let v1_routes = Router::new()
    .route("/loadtracks", get(tracks::load_tracks))
    .route("/streamtrack", get(tracks::stream_track))
    .route("/sources", get(tracks::list_sources));

  Router::new()
    .nest(API_V1, v1_routes)
    .layer(middleware::from_fn_with_state(state.clone(), check_auth))
    .layer(middleware::from_fn(add_response_headers))
    .with_state(state)
}
