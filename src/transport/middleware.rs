use std::sync::Arc;

use axum::{
  extract::{Request, State},
  http::{HeaderValue, StatusCode},
  middleware::Next,
  response::Response,
};
use tracing::warn;

use crate::server::AppState;

/// Rejects requests whose `Authorization` header does not match the
/// configured password. Without a password every request passes.
pub async fn check_auth(
  State(state): State<Arc<AppState>>,
  req: Request,
  next: Next,
) -> Result<Response, StatusCode> {
  let Some(password) = state.server.password.as_deref().filter(|p| !p.is_empty()) else {
    return Ok(next.run(req).await);
  };

  let auth_header = req
    .headers()
    .get("authorization")
    .and_then(|h| h.to_str().ok());

  match auth_header {
    Some(auth) if auth == password => Ok(next.run(req).await),
    Some(_) => {
      warn!("REST Authorization failed: Invalid password");
      Err(StatusCode::UNAUTHORIZED)
    }
    None => {
      warn!("REST Authorization failed: Missing Authorization header");
      Err(StatusCode::UNAUTHORIZED)
    }
  }
}

pub async fn add_response_headers(req: Request, next: Next) -> Response {
  let mut response = next.run(req).await;
  response
    .headers_mut()
    .insert("Kunang-Api-Version", HeaderValue::from_static("1"));
  response
}
