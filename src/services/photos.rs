use std::{collections::BTreeSet, io::Cursor, path::Path};

use axum::extract::{multipart::MultipartError, Multipart};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    models::{
        group::AccessGroup,
        photo::{DeleteSummary, Photo, PhotoPage, RejectedFile, UploadOutcome},
    },
    services::{
        metrics::{MIRROR_WRITES_COUNTER, PHOTO_UPLOADS_COUNTER, UPLOAD_REJECTIONS_COUNTER},
        photo_mirror::JsonPhotoStore,
        storage::StorageRegistry,
    },
};

pub const MAX_FILES_PER_UPLOAD: usize = 5;
const DEFAULT_PAGE_SIZE: i64 = 24;
const MAX_PAGE_SIZE: i64 = 100;

const PHOTO_COLS: &str = "id, filename, original_name, url, provider, content_type, size_bytes,
     width, height, uploaded_by, uploader_group, captured_at, created_at, visible_to,
     is_approved, is_featured";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("invalid champion token")]
    Unauthorized,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("unknown group: {0}")]
    UnknownGroup(String),
    #[error("at most {MAX_FILES_PER_UPLOAD} files per upload")]
    TooManyFiles,
    #[error("invalid captured_at: {0}")]
    InvalidTimestamp(String),
    #[error("malformed upload: {0}")]
    Multipart(#[from] MultipartError),
}

#[derive(Debug)]
pub struct IncomingFile {
    pub name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Raw fields of an upload request, before any checks.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub champion_token: Option<String>,
    pub group: Option<String>,
    pub uploader: Option<String>,
    pub captured_at: Option<String>,
    pub visible_to: Vec<String>,
    pub files: Vec<IncomingFile>,
}

impl UploadForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, UploadError> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "file" | "files" | "files[]" => {
                    if form.files.len() == MAX_FILES_PER_UPLOAD {
                        return Err(UploadError::TooManyFiles);
                    }
                    let filename = field.file_name().unwrap_or("upload").to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await?;
                    form.files.push(IncomingFile {
                        name: filename,
                        content_type,
                        data,
                    });
                }
                "champion_token" => form.champion_token = Some(field.text().await?),
                "group" => form.group = Some(field.text().await?),
                "uploader" => form.uploader = Some(field.text().await?),
                "captured_at" => form.captured_at = Some(field.text().await?),
                // Accept "visible_to[]" or "visible_to", repeated or comma-separated
                "visible_to" | "visible_to[]" => {
                    let text = field.text().await?;
                    form.visible_to
                        .extend(text.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from));
                }
                _ => {}
            }
        }
        Ok(form)
    }
}

pub fn authorize(token: Option<&str>, allowed: &[String]) -> Result<(), UploadError> {
    match token.map(str::trim) {
        Some(token) if !token.is_empty() && allowed.iter().any(|t| t == token) => Ok(()),
        _ => Err(UploadError::Unauthorized),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Groups that may see the photo. Nothing listed means everyone.
fn parse_visibility(raw: &[String]) -> Result<Vec<AccessGroup>, UploadError> {
    if raw.is_empty() {
        return Ok(AccessGroup::ALL.to_vec());
    }
    let groups = raw
        .iter()
        .map(|g| g.parse::<AccessGroup>().map_err(|_| UploadError::UnknownGroup(g.clone())))
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(groups.into_iter().collect())
}

/// Image types the gallery stores, with the extension written into the
/// object key. Anything else, SVG included, is refused.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/avif", "avif"),
    ("image/heic", "heic"),
    ("image/heif", "heif"),
];

/// Why a file was turned away; the label feeds the rejection metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    TooLarge,
    Empty,
    NotImage,
    Storage,
    RecordFailed,
}

impl RejectReason {
    pub fn label(self) -> &'static str {
        match self {
            RejectReason::TooLarge => "too_large",
            RejectReason::Empty => "empty",
            RejectReason::NotImage => "not_image",
            RejectReason::Storage => "storage",
            RejectReason::RecordFailed => "record_failed",
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Rejection {
    pub reason: RejectReason,
    pub message: String,
}

impl Rejection {
    fn new(reason: RejectReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

/// A file that passed the type and size checks.
#[derive(Debug, PartialEq)]
pub struct AcceptedFile {
    pub content_type: String,
    pub extension: &'static str,
    pub warning: Option<String>,
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn ext_matches(ext: &str, canonical: &str, content_type: &str) -> bool {
    ext == canonical
        || mime_guess::from_ext(ext)
            .iter()
            .any(|m| m.essence_str() == content_type)
}

/// Images only. The declared type (or the one guessed from the name) must be
/// a known raster type and the filename extension, when there is one, must
/// agree with it. The stored extension always comes from the type.
/// HEIC/HEIF is let through with a warning because browsers cannot display it.
pub fn check_file(file: &IncomingFile, max_bytes: u64) -> Result<AcceptedFile, Rejection> {
    if file.data.len() as u64 > max_bytes {
        return Err(Rejection::new(
            RejectReason::TooLarge,
            format!("file is {} bytes, the limit is {} bytes", file.data.len(), max_bytes),
        ));
    }
    if file.data.is_empty() {
        return Err(Rejection::new(RejectReason::Empty, "file is empty"));
    }

    let declared = file
        .content_type
        .as_deref()
        .and_then(|ct| ct.parse::<mime::Mime>().ok())
        .filter(|m| m.essence_str() != mime::APPLICATION_OCTET_STREAM.essence_str());
    let mime = declared
        .or_else(|| mime_guess::from_path(&file.name).first())
        .ok_or_else(|| Rejection::new(RejectReason::NotImage, "unknown file type"))?;

    let content_type = mime.essence_str().to_ascii_lowercase();
    let &(content_type, extension) = IMAGE_TYPES
        .iter()
        .find(|(ct, _)| *ct == content_type)
        .ok_or_else(|| {
            Rejection::new(RejectReason::NotImage, format!("{content_type} is not a supported image"))
        })?;

    if let Some(ext) = extension_of(&file.name) {
        if !ext_matches(&ext, extension, content_type) {
            return Err(Rejection::new(
                RejectReason::NotImage,
                format!(".{ext} does not match {content_type}"),
            ));
        }
    }

    let warning = matches!(extension, "heic" | "heif").then(|| {
        format!(
            "{} is HEIC; it was saved but most browsers cannot display it",
            file.name
        )
    });

    Ok(AcceptedFile {
        content_type: content_type.to_string(),
        extension,
        warning,
    })
}

fn image_dimensions(data: &[u8]) -> Option<(i32, i32)> {
    let (w, h) = image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()?;
    Some((i32::try_from(w).ok()?, i32::try_from(h).ok()?))
}

/// A blob that made it into storage but is not recorded anywhere yet.
#[derive(Debug)]
pub struct StoredBlob {
    pub key: String,
    pub url: String,
    pub provider: String,
    pub accepted: AcceptedFile,
    pub size_bytes: i64,
    pub dimensions: Option<(i32, i32)>,
}

/// Validates one file and writes it to the first storage provider with room.
/// Validation failures never reach a provider.
pub async fn store_file(
    storage: &StorageRegistry,
    group: AccessGroup,
    file: &IncomingFile,
    max_bytes: u64,
) -> Result<StoredBlob, Rejection> {
    let accepted = check_file(file, max_bytes)?;
    let key = format!("{}/{}.{}", group.key(), Uuid::new_v4(), accepted.extension);

    let provider = storage
        .store(&key, file.data.clone(), &accepted.content_type)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store {} ({key}): {e}", file.name);
            Rejection::new(
                RejectReason::Storage,
                "storage is unavailable, please try again later",
            )
        })?;

    Ok(StoredBlob {
        url: provider.public_url(&key),
        provider: provider.name.clone(),
        size_bytes: file.data.len() as i64,
        dimensions: image_dimensions(&file.data),
        key,
        accepted,
    })
}

fn reject(outcome: &mut UploadOutcome, name: &str, rejection: Rejection) {
    UPLOAD_REJECTIONS_COUNTER
        .with_label_values(&[rejection.reason.label()])
        .inc();
    outcome.rejected.push(RejectedFile {
        name: name.to_string(),
        reason: rejection.message,
    });
}

pub struct PhotoService;

impl PhotoService {
    pub async fn upload(
        pool: &PgPool,
        storage: &StorageRegistry,
        mirror: &JsonPhotoStore,
        champion_tokens: &[String],
        max_bytes: u64,
        form: UploadForm,
    ) -> Result<UploadOutcome, UploadError> {
        authorize(form.champion_token.as_deref(), champion_tokens)?;

        let group_raw = non_empty(form.group).ok_or(UploadError::MissingField("group"))?;
        let group = group_raw
            .parse::<AccessGroup>()
            .map_err(|_| UploadError::UnknownGroup(group_raw.clone()))?;
        if form.files.is_empty() {
            return Err(UploadError::MissingField("file"));
        }
        if form.files.len() > MAX_FILES_PER_UPLOAD {
            return Err(UploadError::TooManyFiles);
        }
        let visible_to: Vec<String> = parse_visibility(&form.visible_to)?
            .into_iter()
            .map(|g| g.key().to_string())
            .collect();
        let captured_at = match non_empty(form.captured_at) {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(&raw)
                    .map(|d| d.with_timezone(&Utc))
                    .map_err(|_| UploadError::InvalidTimestamp(raw.clone()))?,
            ),
            None => None,
        };
        let uploaded_by = non_empty(form.uploader);

        let mut outcome = UploadOutcome::default();
        for file in &form.files {
            let blob = match store_file(storage, group, file, max_bytes).await {
                Ok(blob) => blob,
                Err(rejection) => {
                    reject(&mut outcome, &file.name, rejection);
                    continue;
                }
            };
            if let Some(warning) = &blob.accepted.warning {
                outcome.warnings.push(warning.clone());
            }

            let photo = Photo {
                id: Uuid::new_v4(),
                filename: blob.key,
                original_name: file.name.clone(),
                url: blob.url,
                provider: blob.provider,
                content_type: blob.accepted.content_type,
                size_bytes: blob.size_bytes,
                width: blob.dimensions.map(|d| d.0),
                height: blob.dimensions.map(|d| d.1),
                uploaded_by: uploaded_by.clone(),
                uploader_group: group.key().to_string(),
                captured_at,
                created_at: Utc::now(),
                visible_to: visible_to.clone(),
                is_approved: true,
                is_featured: false,
            };

            if let Err(e) = Self::insert(pool, &photo).await {
                tracing::error!("Photo insert failed, writing {} to the JSON mirror: {e}", photo.id);
                if let Err(e) = mirror.append(&photo).await {
                    tracing::error!("JSON mirror write failed for {}: {e}", photo.id);
                    reject(
                        &mut outcome,
                        &file.name,
                        Rejection::new(
                            RejectReason::RecordFailed,
                            "the photo was stored but could not be recorded",
                        ),
                    );
                    continue;
                }
                MIRROR_WRITES_COUNTER.with_label_values(&[group.key()]).inc();
            }

            PHOTO_UPLOADS_COUNTER
                .with_label_values(&[group.key(), photo.provider.as_str()])
                .inc();
            outcome.uploaded.push(photo);
        }

        tracing::info!(
            group = group.key(),
            uploaded = outcome.uploaded.len(),
            rejected = outcome.rejected.len(),
            "photo upload processed"
        );
        Ok(outcome)
    }

    async fn insert(pool: &PgPool, photo: &Photo) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO photos
             (id, filename, original_name, url, provider, content_type, size_bytes, width, height,
              uploaded_by, uploader_group, captured_at, created_at, visible_to, is_approved, is_featured)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(photo.id)
        .bind(&photo.filename)
        .bind(&photo.original_name)
        .bind(&photo.url)
        .bind(&photo.provider)
        .bind(&photo.content_type)
        .bind(photo.size_bytes)
        .bind(photo.width)
        .bind(photo.height)
        .bind(&photo.uploaded_by)
        .bind(&photo.uploader_group)
        .bind(photo.captured_at)
        .bind(photo.created_at)
        .bind(&photo.visible_to)
        .bind(photo.is_approved)
        .bind(photo.is_featured)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Approved photos visible to `group`, newest first. Records that only
    /// made it into the JSON mirror are listed alongside the table rows.
    pub async fn list(
        pool: &PgPool,
        mirror: &JsonPhotoStore,
        group: AccessGroup,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> anyhow::Result<PhotoPage> {
        let (page, limit, offset) = page_window(page, limit);

        let mirrored = mirror.visible_to(group.key()).await.unwrap_or_else(|e| {
            tracing::warn!("JSON mirror unreadable, listing database photos only: {e}");
            Vec::new()
        });
        let mirrored_ids: Vec<Uuid> = mirrored.iter().map(|p| p.id).collect();
        let in_database: Vec<Uuid> = if mirrored_ids.is_empty() {
            Vec::new()
        } else {
            sqlx::query_scalar("SELECT id FROM photos WHERE id = ANY($1)")
                .bind(&mirrored_ids)
                .fetch_all(pool)
                .await?
        };
        let mirror_only: Vec<Photo> = mirrored
            .into_iter()
            .filter(|p| !in_database.contains(&p.id))
            .collect();

        let db_total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)::BIGINT FROM photos WHERE $1 = ANY(visible_to) AND is_approved",
        )
        .bind(group.key())
        .fetch_one(pool)
        .await?;

        // Everything up to the end of this page; the mirror rows may sort
        // anywhere inside it.
        let db_rows = sqlx::query_as::<_, Photo>(&format!(
            "SELECT {PHOTO_COLS} FROM photos
             WHERE $1 = ANY(visible_to) AND is_approved
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        ))
        .bind(group.key())
        .bind(offset + limit)
        .fetch_all(pool)
        .await?;

        Ok(merge_page(db_rows, db_total, mirror_only, page, limit, offset))
    }

    /// Best-effort removal from storage, the database and the JSON mirror.
    /// `None` when neither record store knows the id.
    pub async fn delete(
        pool: &PgPool,
        storage: &StorageRegistry,
        mirror: &JsonPhotoStore,
        id: Uuid,
    ) -> anyhow::Result<Option<DeleteSummary>> {
        let db_lookup = sqlx::query_as::<_, Photo>(&format!(
            "SELECT {PHOTO_COLS} FROM photos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await;
        let record = match db_lookup {
            Ok(Some(record)) => record,
            Ok(None) => match mirror.find(id).await? {
                Some(record) => record,
                None => return Ok(None),
            },
            // The mirror can still locate it; if not, the photo's fate is unknown
            Err(e) => {
                tracing::warn!("Photo lookup in database failed for {id}: {e}");
                match mirror.find(id).await {
                    Ok(Some(record)) => record,
                    Ok(None) => anyhow::bail!("database lookup failed for photo {id}: {e}"),
                    Err(mirror_err) => anyhow::bail!(
                        "photo {id} lookup failed in database ({e}) and JSON mirror ({mirror_err})"
                    ),
                }
            }
        };

        let mut summary = DeleteSummary {
            id,
            ..Default::default()
        };

        let size = u64::try_from(record.size_bytes).unwrap_or(0);
        match storage.remove(&record.provider, &record.filename, size).await {
            Ok(()) => summary.storage = true,
            Err(e) => tracing::warn!("Blob delete failed for {id} on {}: {e}", record.provider),
        }

        match sqlx::query("DELETE FROM photos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
        {
            Ok(res) => summary.database = res.rows_affected() > 0,
            Err(e) => tracing::warn!("Database delete failed for {id}: {e}"),
        }

        match mirror.remove(id).await {
            Ok(removed) => summary.json_mirror = removed,
            Err(e) => tracing::warn!("JSON mirror delete failed for {id}: {e}"),
        }

        tracing::info!(
            %id,
            storage = summary.storage,
            database = summary.database,
            json_mirror = summary.json_mirror,
            "photo delete processed"
        );
        Ok(Some(summary))
    }
}

/// One page out of the database rows (already the newest `offset + limit`)
/// and the mirror-only records, newest first.
fn merge_page(
    mut rows: Vec<Photo>,
    db_total: i64,
    mirror_only: Vec<Photo>,
    page: i64,
    limit: i64,
    offset: i64,
) -> PhotoPage {
    let total = db_total + mirror_only.len() as i64;
    rows.extend(mirror_only);
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    let photos: Vec<Photo> = rows
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect();
    let has_more = offset + (photos.len() as i64) < total;
    PhotoPage {
        photos,
        page,
        limit,
        total,
        has_more,
    }
}

/// (page, limit, offset) with page >= 1 and limit clamped.
fn page_window(page: Option<i64>, limit: Option<i64>) -> (i64, i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = page.unwrap_or(1).max(1);
    (page, limit, (page - 1) * limit)
}
