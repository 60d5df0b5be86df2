use axum::{extract::State, http::{HeaderMap, StatusCode}, Json};
use serde_json::{json, Value};

use crate::{
    middleware::rate_limit::client_ip,
    models::rsvp::{RsvpError, RsvpRequest},
    services::rsvp::RsvpService,
    AppState,
};

pub async fn submit_rsvp(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RsvpRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    state.rate_limiter.check(&client_ip(&headers))?;

    let rsvp = body
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))))?;

    match RsvpService::create(&state.db, &rsvp).await {
        Ok(row) => Ok((
            StatusCode::CREATED,
            Json(json!({ "success": true, "id": row.id })),
        )),
        Err(RsvpError::Database(e)) => {
            tracing::error!("RSVP insert failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to save RSVP" })),
            ))
        }
        Err(e) => Err((StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))),
    }
}
