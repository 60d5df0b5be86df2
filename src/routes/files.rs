use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::AppState;

/// Serve a blob held by a local storage provider, with HTTP range support.
/// The path is `{provider}/{key}`.
pub async fn serve_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    let (provider_name, key) = path.split_once('/').ok_or(StatusCode::NOT_FOUND)?;
    let root = state
        .storage
        .provider(provider_name)
        .and_then(|p| p.local_root())
        .ok_or(StatusCode::NOT_FOUND)?;
    let file_path = root.join(key);

    // The resolved file must stay inside the provider root
    let canonical_root = tokio::fs::canonicalize(root)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;
    let canonical_file = tokio::fs::canonicalize(&file_path)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;
    if !canonical_file.starts_with(&canonical_root) {
        return Err(StatusCode::FORBIDDEN);
    }

    let metadata = tokio::fs::metadata(&canonical_file)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;
    if !metadata.is_file() {
        return Err(StatusCode::NOT_FOUND);
    }
    let file_size = metadata.len();

    let content_type = mime_guess::from_path(&canonical_file)
        .first_raw()
        .unwrap_or("application/octet-stream");

    if let Some(range_header) = headers.get(header::RANGE) {
        let range_str = range_header.to_str().map_err(|_| StatusCode::BAD_REQUEST)?;
        let Some((start, end)) = parse_range(range_str, file_size) else {
            return Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, format!("bytes */{file_size}"))
                .body(Body::empty())
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR);
        };
        let length = end - start + 1;

        let mut file = tokio::fs::File::open(&canonical_file)
            .await
            .map_err(|_| StatusCode::NOT_FOUND)?;
        file.seek(std::io::SeekFrom::Start(start))
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        let mut buf = vec![0u8; length as usize];
        file.read_exact(&mut buf)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        return Response::builder()
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CONTENT_LENGTH, length.to_string())
            .header(
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", start, end, file_size),
            )
            .header(header::ACCEPT_RANGES, "bytes")
            .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
            .body(Body::from(buf))
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR);
    }

    let file_bytes = tokio::fs::read(&canonical_file)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, file_size.to_string())
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .header(header::CACHE_CONTROL, "public, max-age=86400")
        .body(Body::from(file_bytes))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// `bytes=start-end`, `bytes=start-` or the suffix form `bytes=-n`.
fn parse_range(range: &str, file_size: u64) -> Option<(u64, u64)> {
    let range = range.strip_prefix("bytes=")?;
    let (start, end) = range.split_once('-')?;
    if file_size == 0 {
        return None;
    }
    if start.is_empty() {
        let suffix: u64 = end.parse().ok()?;
        if suffix == 0 {
            return None;
        }
        return Some((file_size.saturating_sub(suffix), file_size - 1));
    }
    let start: u64 = start.parse().ok()?;
    let end: u64 = if end.is_empty() {
        file_size - 1
    } else {
        end.parse::<u64>().ok()?.min(file_size - 1)
    };
    if start > end {
        return None;
    }
    Some((start, end))
}
