use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    middleware::{admin::AdminAuth, rate_limit::client_ip},
    models::{
        group::AccessGroup,
        photo::{DeletePhotoQuery, PhotoQuery},
    },
    services::photos::{PhotoService, UploadError, UploadForm},
    AppState,
};

type ApiError = (StatusCode, Json<Value>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

fn upload_error(e: UploadError) -> ApiError {
    match e {
        UploadError::Unauthorized => error(StatusCode::UNAUTHORIZED, "Invalid champion token"),
        other => error(StatusCode::BAD_REQUEST, other.to_string()),
    }
}

pub async fn list_photos(
    State(state): State<AppState>,
    Query(query): Query<PhotoQuery>,
) -> Result<Json<Value>, ApiError> {
    let group = query
        .group
        .parse::<AccessGroup>()
        .map_err(|_| error(StatusCode::NOT_FOUND, "Page not found"))?;

    PhotoService::list(&state.db, &state.photo_mirror, group, query.page, query.limit)
        .await
        .map(|page| Json(json!(page)))
        .map_err(|e| {
            tracing::error!("Photo listing failed: {e}");
            error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load photos")
        })
}

pub async fn upload_photos(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state.rate_limiter.check(&client_ip(&headers))?;

    let form = UploadForm::from_multipart(multipart).await.map_err(upload_error)?;
    let outcome = PhotoService::upload(
        &state.db,
        &state.storage,
        &state.photo_mirror,
        &state.config.champion_tokens,
        state.config.max_upload_bytes,
        form,
    )
    .await
    .map_err(upload_error)?;

    let status = if outcome.uploaded.is_empty() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(json!(outcome))))
}

pub async fn delete_photo(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
    Query(query): Query<DeletePhotoQuery>,
) -> Result<Json<Value>, ApiError> {
    if query.confirm != Some(true) {
        return Err(error(
            StatusCode::BAD_REQUEST,
            "Deletion must be confirmed with ?confirm=true",
        ));
    }

    match PhotoService::delete(&state.db, &state.storage, &state.photo_mirror, id).await {
        Ok(Some(summary)) if summary.any_succeeded() => Ok(Json(json!(summary))),
        Ok(Some(summary)) => {
            tracing::error!("Photo {id} could not be removed from any store");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to delete photo", "summary": summary })),
            ))
        }
        Ok(None) => Err(error(StatusCode::NOT_FOUND, "Photo not found")),
        Err(e) => {
            tracing::error!("Photo delete failed for {id}: {e}");
            Err(error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete photo"))
        }
    }
}
