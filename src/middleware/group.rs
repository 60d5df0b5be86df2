use std::collections::HashMap;

use axum::{
    extract::{FromRequestParts, Path},
    http::{request::Parts, StatusCode},
    Json,
};
use serde_json::{json, Value};

use crate::models::group::AccessGroup;

/// The `{group}` path segment, validated against the registry.
///
/// Resolved fresh on every request; an unknown group is a 404, never a
/// fallback to some default audience.
#[derive(Debug, Clone, Copy)]
pub struct VisitorGroup(pub AccessGroup);

fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Page not found" })))
}

impl<S> FromRequestParts<S> for VisitorGroup
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|_| not_found())?;

        let raw = params.get("group").ok_or_else(not_found)?;
        raw.parse::<AccessGroup>().map(VisitorGroup).map_err(|e| {
            tracing::debug!("rejected group segment: {e}");
            not_found()
        })
    }
}
