//! Priority-ordered blob storage across several providers.
//!
//! Usage figures are an in-memory estimate that starts at zero on every boot;
//! they steer new uploads away from full providers but are not authoritative.

use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
    sync::Mutex,
};

use bytes::Bytes;

use crate::{
    config::{ProviderConfig, ProviderKind},
    services::metrics::STORAGE_USAGE_GAUGE,
};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("no storage provider has room for {0} bytes")]
    NoCapacity(u64),
    #[error("unknown storage provider: {0}")]
    UnknownProvider(String),
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("provider {provider} answered {status}")]
    Status {
        provider: String,
        status: reqwest::StatusCode,
    },
}

enum Backend {
    Local {
        root: PathBuf,
    },
    Http {
        client: reqwest::Client,
        endpoint: String,
        token: Option<String>,
    },
}

pub struct Provider {
    pub name: String,
    pub quota_bytes: u64,
    public_base_url: String,
    backend: Backend,
}

/// Keys are relative, forward-slash paths without `..` segments.
fn check_key(key: &str) -> Result<(), StorageError> {
    let path = Path::new(key);
    let clean = !key.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if clean {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

impl Provider {
    fn from_config(config: &ProviderConfig, app_base_url: &str) -> Self {
        let (backend, default_base) = match &config.kind {
            ProviderKind::Local { root } => (
                Backend::Local {
                    root: PathBuf::from(root),
                },
                format!("{}/media/files/{}", app_base_url.trim_end_matches('/'), config.name),
            ),
            ProviderKind::Http { endpoint, token } => (
                Backend::Http {
                    client: reqwest::Client::new(),
                    endpoint: endpoint.trim_end_matches('/').to_string(),
                    token: token.clone(),
                },
                endpoint.trim_end_matches('/').to_string(),
            ),
        };
        Provider {
            name: config.name.clone(),
            quota_bytes: config.quota_bytes,
            public_base_url: config
                .public_base_url
                .as_deref()
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(default_base),
            backend,
        }
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    /// Directory holding this provider's objects, for local providers only.
    pub fn local_root(&self) -> Option<&Path> {
        match &self.backend {
            Backend::Local { root } => Some(root),
            Backend::Http { .. } => None,
        }
    }

    pub async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError> {
        check_key(key)?;
        match &self.backend {
            Backend::Local { root } => {
                let path = root.join(key);
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&path, &data).await?;
                Ok(())
            }
            Backend::Http {
                client,
                endpoint,
                token,
            } => {
                let mut req = client
                    .put(format!("{endpoint}/{key}"))
                    .header(reqwest::header::CONTENT_TYPE, content_type)
                    .body(data);
                if let Some(token) = token {
                    req = req.bearer_auth(token);
                }
                let res = req.send().await?;
                if !res.status().is_success() {
                    return Err(StorageError::Status {
                        provider: self.name.clone(),
                        status: res.status(),
                    });
                }
                Ok(())
            }
        }
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        check_key(key)?;
        match &self.backend {
            Backend::Local { root } => {
                match tokio::fs::remove_file(root.join(key)).await {
                    Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
                    _ => Ok(()),
                }
            }
            Backend::Http {
                client,
                endpoint,
                token,
            } => {
                let mut req = client.delete(format!("{endpoint}/{key}"));
                if let Some(token) = token {
                    req = req.bearer_auth(token);
                }
                let res = req.send().await?;
                // already gone counts as deleted
                if !res.status().is_success() && res.status() != reqwest::StatusCode::NOT_FOUND {
                    return Err(StorageError::Status {
                        provider: self.name.clone(),
                        status: res.status(),
                    });
                }
                Ok(())
            }
        }
    }
}

pub struct StorageRegistry {
    providers: Vec<Provider>,
    usage: Mutex<HashMap<String, u64>>,
}

impl StorageRegistry {
    pub fn from_config(configs: &[ProviderConfig], app_base_url: &str) -> Self {
        Self {
            providers: configs
                .iter()
                .map(|c| Provider::from_config(c, app_base_url))
                .collect(),
            usage: Mutex::new(HashMap::new()),
        }
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    pub fn provider(&self, name: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.name == name)
    }

    pub fn usage(&self, name: &str) -> u64 {
        self.lock_usage().get(name).copied().unwrap_or(0)
    }

    fn lock_usage(&self) -> std::sync::MutexGuard<'_, HashMap<String, u64>> {
        self.usage.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn adjust(&self, usage: &mut HashMap<String, u64>, name: &str, add: u64, sub: u64) {
        let entry = usage.entry(name.to_string()).or_insert(0);
        *entry = entry.saturating_add(add).saturating_sub(sub);
        STORAGE_USAGE_GAUGE.with_label_values(&[name]).set(*entry as f64);
    }

    /// First provider, in priority order, that still has room for `size` bytes.
    /// The bytes are reserved against it until [`release`](Self::release).
    fn reserve(&self, size: u64) -> Result<&Provider, StorageError> {
        let mut usage = self.lock_usage();
        let provider = self
            .providers
            .iter()
            .find(|p| {
                let used = usage.get(&p.name).copied().unwrap_or(0);
                used.saturating_add(size) <= p.quota_bytes
            })
            .ok_or(StorageError::NoCapacity(size))?;
        self.adjust(&mut usage, &provider.name, size, 0);
        Ok(provider)
    }

    fn release(&self, name: &str, size: u64) {
        let mut usage = self.lock_usage();
        self.adjust(&mut usage, name, 0, size);
    }

    /// Writes the object to the first provider with room and returns it.
    pub async fn store(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<&Provider, StorageError> {
        let size = data.len() as u64;
        let provider = self.reserve(size)?;
        match provider.put(key, data, content_type).await {
            Ok(()) => Ok(provider),
            Err(e) => {
                self.release(&provider.name, size);
                Err(e)
            }
        }
    }

    pub async fn remove(&self, provider_name: &str, key: &str, size: u64) -> Result<(), StorageError> {
        let provider = self
            .provider(provider_name)
            .ok_or_else(|| StorageError::UnknownProvider(provider_name.to_string()))?;
        provider.delete(key).await?;
        self.release(&provider.name, size);
        Ok(())
    }
}
