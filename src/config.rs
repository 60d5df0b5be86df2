use std::env;

use chrono::FixedOffset;
use serde::Deserialize;

const DEFAULT_MAX_UPLOAD_BYTES: u64 = 15 * 1024 * 1024;
const DEFAULT_LOCAL_QUOTA_BYTES: u64 = 5 * 1024 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub app_base_url: String,
    pub media_dir: String,
    pub admin_key: String,
    /// Shared secrets that authorize photo uploads.
    pub champion_tokens: Vec<String>,
    pub max_upload_bytes: u64,
    /// Priority order: the first provider with room wins.
    pub storage_providers: Vec<ProviderConfig>,
    pub photo_mirror_path: String,
    pub rate_limit_max: usize,
    pub rate_limit_window_secs: u64,
    /// Offset of the venue's local time from UTC, used by the countdown.
    pub venue_utc_offset_minutes: i32,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProviderConfig {
    pub name: String,
    pub quota_bytes: u64,
    /// Prefix for public object URLs. Local providers default to `/media/files/{name}`.
    pub public_base_url: Option<String>,
    #[serde(flatten)]
    pub kind: ProviderKind,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProviderKind {
    Local { root: String },
    Http { endpoint: String, token: Option<String> },
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let media_dir = env::var("MEDIA_DIR").unwrap_or_else(|_| "/data/media".into());
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost".into()),
            admin_key: env::var("ADMIN_KEY")
                .unwrap_or_else(|_| "change_this_admin_key".into()),
            champion_tokens: parse_tokens(&env::var("CHAMPION_TOKENS").unwrap_or_default()),
            max_upload_bytes: match env::var("MAX_UPLOAD_BYTES") {
                Ok(v) => v.parse()?,
                Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
            },
            storage_providers: parse_providers(
                env::var("STORAGE_PROVIDERS").ok().as_deref(),
                &media_dir,
            )?,
            photo_mirror_path: env::var("PHOTO_MIRROR_PATH")
                .unwrap_or_else(|_| format!("{media_dir}/photos.json")),
            rate_limit_max: env::var("RATE_LIMIT_MAX")
                .unwrap_or_else(|_| "20".into())
                .parse()?,
            rate_limit_window_secs: env::var("RATE_LIMIT_WINDOW_SECS")
                .unwrap_or_else(|_| "600".into())
                .parse()?,
            venue_utc_offset_minutes: env::var("VENUE_UTC_OFFSET_MINUTES")
                .unwrap_or_else(|_| "330".into())
                .parse()?,
            media_dir,
        })
    }

    /// `None` when the configured offset is outside ±24h.
    pub fn venue_offset(&self) -> Option<FixedOffset> {
        self.venue_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}

fn parse_tokens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn parse_providers(raw: Option<&str>, media_dir: &str) -> anyhow::Result<Vec<ProviderConfig>> {
    let providers = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(json) => serde_json::from_str::<Vec<ProviderConfig>>(json)
            .map_err(|e| anyhow::anyhow!("Invalid STORAGE_PROVIDERS: {e}"))?,
        None => vec![ProviderConfig {
            name: "local".into(),
            quota_bytes: DEFAULT_LOCAL_QUOTA_BYTES,
            public_base_url: None,
            kind: ProviderKind::Local {
                root: format!("{media_dir}/photos"),
            },
        }],
    };
    if providers.is_empty() {
        anyhow::bail!("STORAGE_PROVIDERS must list at least one provider");
    }
    Ok(providers)
}
