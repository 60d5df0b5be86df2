use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_gauge, register_gauge_vec, CounterVec, Gauge, GaugeVec};
use sqlx::PgPool;
use tracing::{info, warn};

lazy_static! {
    // ── Event counters (increment on each event) ────────────────────────────
    pub static ref RSVP_COUNTER: CounterVec = register_counter_vec!(
        "api_rsvp_submissions_total",
        "RSVP submissions by group and answer",
        &["group", "attending"]
    ).unwrap();

    pub static ref PHOTO_UPLOADS_COUNTER: CounterVec = register_counter_vec!(
        "api_photo_uploads_total",
        "Photos stored, by uploader group and storage provider",
        &["group", "provider"]
    ).unwrap();

    pub static ref UPLOAD_REJECTIONS_COUNTER: CounterVec = register_counter_vec!(
        "api_photo_upload_rejections_total",
        "Files refused by the upload endpoint, by reason",
        &["reason"]
    ).unwrap();

    pub static ref MIRROR_WRITES_COUNTER: CounterVec = register_counter_vec!(
        "api_photo_mirror_writes_total",
        "Photo records written to the JSON mirror because the database insert failed",
        &["group"]
    ).unwrap();

    // ── Advisory storage usage (in-memory, resets on restart) ───────────────
    pub static ref STORAGE_USAGE_GAUGE: GaugeVec = register_gauge_vec!(
        "storage_provider_usage_bytes",
        "Bytes written to each storage provider since start-up",
        &["provider"]
    ).unwrap();

    // ── Business metrics ────────────────────────────────────────────────────
    pub static ref RSVPS_GAUGE: GaugeVec = register_gauge_vec!(
        "wedding_rsvps_total",
        "Stored RSVP rows by answer",
        &["attending"]
    ).unwrap();

    pub static ref PHOTOS_GAUGE: Gauge = register_gauge!(
        "wedding_photos_total",
        "Photos in the gallery table"
    ).unwrap();
}

/// Spawn the background metrics collector (refreshes every 5 minutes).
pub fn start(pool: PgPool) {
    tokio::spawn(async move {
        if let Err(e) = collect(&pool).await {
            warn!("Metrics: initial collection failed: {}", e);
        }
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(300)).await;
            if let Err(e) = collect(&pool).await {
                warn!("Metrics: collection failed: {}", e);
            }
        }
    });
}

async fn collect(pool: &PgPool) -> anyhow::Result<()> {
    let rsvp_counts: Vec<(String, i64)> =
        sqlx::query_as("SELECT attending, COUNT(*)::BIGINT FROM rsvps GROUP BY attending")
            .fetch_all(pool)
            .await?;
    for (attending, count) in &rsvp_counts {
        RSVPS_GAUGE.with_label_values(&[attending.as_str()]).set(*count as f64);
    }

    let photos: i64 = sqlx::query_scalar("SELECT COUNT(*)::BIGINT FROM photos")
        .fetch_one(pool)
        .await?;
    PHOTOS_GAUGE.set(photos as f64);

    info!("Metrics: collected {} rsvp bucket(s), {} photo(s)", rsvp_counts.len(), photos);
    Ok(())
}
