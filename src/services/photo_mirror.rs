use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::photo::Photo;

/// Photo records kept in a single JSON array file.
///
/// Takes the metadata write when the database is unavailable, and still holds
/// records from before the gallery moved to the database. Writes go through a
/// temp file and a rename so a crash never leaves a half-written array.
pub struct JsonPhotoStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonPhotoStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> anyhow::Result<Vec<Photo>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, records: &[Photo]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(records)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    pub async fn append(&self, photo: &Photo) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        records.push(photo.clone());
        self.write_all(&records).await
    }

    pub async fn find(&self, id: Uuid) -> anyhow::Result<Option<Photo>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.into_iter().find(|p| p.id == id))
    }

    /// Approved records whose visibility list contains `group`.
    pub async fn visible_to(&self, group: &str) -> anyhow::Result<Vec<Photo>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .filter(|p| p.is_approved && p.visible_to.iter().any(|g| g == group))
            .collect())
    }

    /// Returns whether a record was removed.
    pub async fn remove(&self, id: Uuid) -> anyhow::Result<bool> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        let before = records.len();
        records.retain(|p| p.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.write_all(&records).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn sample_photo(name: &str) -> Photo {
        Photo {
            id: Uuid::new_v4(),
            filename: format!("friends/{name}"),
            original_name: name.to_string(),
            url: format!("http://localhost/media/files/local/friends/{name}"),
            provider: "local".into(),
            content_type: "image/jpeg".into(),
            size_bytes: 1234,
            width: Some(800),
            height: Some(600),
            uploaded_by: Some("Meera".into()),
            uploader_group: "friends".into(),
            captured_at: None,
            created_at: Utc::now(),
            visible_to: vec!["friends".into(), "guests".into()],
            is_approved: true,
            is_featured: false,
        }
    }

    fn scratch_store() -> JsonPhotoStore {
        JsonPhotoStore::new(
            std::env::temp_dir()
                .join(format!("wedding-mirror-{}", Uuid::new_v4()))
                .join("photos.json"),
        )
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let store = scratch_store();
        assert_eq!(store.find(Uuid::new_v4()).await.unwrap(), None);
        assert!(!store.remove(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn append_find_remove() {
        let store = scratch_store();
        let first = sample_photo("a.jpg");
        let second = sample_photo("b.jpg");
        store.append(&first).await.unwrap();
        store.append(&second).await.unwrap();

        assert_eq!(store.find(second.id).await.unwrap(), Some(second.clone()));
        assert!(store.remove(first.id).await.unwrap());
        assert!(!store.remove(first.id).await.unwrap());
        assert_eq!(store.find(first.id).await.unwrap(), None);
        assert_eq!(store.find(second.id).await.unwrap(), Some(second));

        if let Some(dir) = store.path().parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
    }

    #[tokio::test]
    async fn visible_to_filters_group_and_approval() {
        let store = scratch_store();
        let shared = sample_photo("shared.jpg");
        let mut bride_only = sample_photo("bride.jpg");
        bride_only.visible_to = vec!["bride".into()];
        let mut hidden = sample_photo("hidden.jpg");
        hidden.is_approved = false;
        for photo in [&shared, &bride_only, &hidden] {
            store.append(photo).await.unwrap();
        }

        assert_eq!(store.visible_to("guests").await.unwrap(), vec![shared.clone()]);
        assert_eq!(store.visible_to("bride").await.unwrap(), vec![bride_only]);
        assert!(store.visible_to("groom").await.unwrap().is_empty());

        if let Some(dir) = store.path().parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
    }
}
