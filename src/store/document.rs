use std::path::PathBuf;

use async_trait::async_trait;
use log::{info, warn};
use tokio::{fs, sync::Mutex};
use uuid::Uuid;

use super::{JobFilter, JobStore, StoreError};
use crate::job::{Job, JobFields};

/// Postings held in insertion order, optionally mirrored to a JSON snapshot.
pub struct DocumentStore {
    docs: Mutex<Vec<Job>>,
    snapshot: Option<PathBuf>,
}

impl DocumentStore {
    pub fn in_memory() -> Self {
        Self {
            docs: Mutex::new(Vec::new()),
            snapshot: None,
        }
    }

    /// Opens the store, loading `snapshot` when it already exists.
    pub async fn connect(snapshot: Option<PathBuf>) -> Result<Self, StoreError> {
        let Some(path) = snapshot else {
            info!("document store running in memory");
            return Ok(Self::in_memory());
        };

        let docs: Vec<Job> = match fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        info!(
            "document store connected to {} ({} jobs)",
            path.display(),
            docs.len()
        );

        Ok(Self {
            docs: Mutex::new(docs),
            snapshot: Some(path),
        })
    }

    /// Flushes the current documents to the snapshot, if there is one.
    pub async fn disconnect(&self) -> Result<(), StoreError> {
        let docs = self.docs.lock().await;
        self.persist(&docs).await?;
        info!("document store disconnected ({} jobs)", docs.len());
        Ok(())
    }

    // written to a sibling file first so a crash never leaves half a snapshot
    async fn persist(&self, docs: &[Job]) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec(docs)?).await?;
        fs::rename(&tmp, path).await.map_err(|e| {
            warn!("failed to replace snapshot {}: {}", path.display(), e);
            StoreError::from(e)
        })
    }

    // applies a change to a copy and only keeps it once it is persisted
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut Vec<Job>) -> Option<T>,
    ) -> Result<Option<T>, StoreError> {
        let mut docs = self.docs.lock().await;
        let mut next = docs.to_vec();
        let Some(out) = change(&mut next) else {
            return Ok(None);
        };
        self.persist(&next).await?;
        *docs = next;
        Ok(Some(out))
    }
}

#[async_trait]
impl JobStore for DocumentStore {
    async fn find(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError> {
        let docs = self.docs.lock().await;
        Ok(docs.iter().filter(|job| filter.matches(job)).cloned().collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        let docs = self.docs.lock().await;
        Ok(docs.iter().find(|job| job.id == id).cloned())
    }

    async fn insert(&self, fields: JobFields) -> Result<Job, StoreError> {
        let job = Job::new(fields);
        self.commit(|docs| {
            docs.push(job.clone());
            Some(())
        })
        .await?;
        Ok(job)
    }

    async fn update(&self, id: Uuid, fields: JobFields) -> Result<Option<Job>, StoreError> {
        self.commit(|docs| {
            let job = docs.iter_mut().find(|job| job.id == id)?;
            job.fields = fields;
            Some(job.clone())
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        self.commit(|docs| {
            let index = docs.iter().position(|job| job.id == id)?;
            Some(docs.remove(index))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::fixtures;

    fn scratch_snapshot() -> PathBuf {
        std::env::temp_dir()
            .join(format!("jobboard-store-{}", Uuid::new_v4()))
            .join("jobs.json")
    }

    #[tokio::test]
    async fn find_keeps_insertion_order_and_filters_exactly() {
        let store = DocumentStore::in_memory();
        let a = store.insert(fixtures::fields("A", "Engineering")).await.unwrap();
        let b = store.insert(fixtures::fields("B", "Design")).await.unwrap();
        let c = store.insert(fixtures::fields("C", "Engineering")).await.unwrap();

        let all = store.find(&JobFilter::default()).await.unwrap();
        assert_eq!(all, vec![a.clone(), b, c.clone()]);

        let engineering = store.find(&JobFilter::categories(["Engineering"])).await.unwrap();
        assert_eq!(engineering, vec![a, c]);

        let lowercase = store.find(&JobFilter::categories(["engineering"])).await.unwrap();
        assert!(lowercase.is_empty());
    }

    #[tokio::test]
    async fn filter_with_several_categories_matches_any_of_them() {
        let store = DocumentStore::in_memory();
        let a = store.insert(fixtures::fields("A", "Engineering")).await.unwrap();
        let b = store.insert(fixtures::fields("B", "Design")).await.unwrap();
        let c = store.insert(fixtures::fields("C", "Sales")).await.unwrap();

        let filter = JobFilter::categories(["Sales", "Design"]);
        assert_eq!(store.find(&filter).await.unwrap(), vec![b, c]);

        let filter = JobFilter::categories(["Engineering", "Marketing"]);
        assert_eq!(store.find(&filter).await.unwrap(), vec![a]);
    }

    #[tokio::test]
    async fn update_replaces_fields_but_keeps_identity() {
        let store = DocumentStore::in_memory();
        let created = store.insert(fixtures::fields("A", "Engineering")).await.unwrap();
        let other = store.insert(fixtures::fields("B", "Design")).await.unwrap();

        let mut fields = fixtures::fields("A2", "Engineering");
        fields.salary = None;
        let updated = store.update(created.id, fields.clone()).await.unwrap().unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.posted_at, created.posted_at);
        assert_eq!(updated.fields, fields);

        let all = store.find(&JobFilter::default()).await.unwrap();
        assert_eq!(all, vec![updated, other]);
    }

    #[tokio::test]
    async fn missing_ids_are_none() {
        let store = DocumentStore::in_memory();
        let id = Uuid::new_v4();

        assert!(store.find_by_id(id).await.unwrap().is_none());
        assert!(store
            .update(id, fixtures::fields("A", "Engineering"))
            .await
            .unwrap()
            .is_none());
        assert!(store.delete(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_returns_last_state() {
        let store = DocumentStore::in_memory();
        let created = store.insert(fixtures::fields("A", "Engineering")).await.unwrap();

        let deleted = store.delete(created.id).await.unwrap();
        assert_eq!(deleted, Some(created.clone()));
        assert!(store.find_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn snapshot_survives_reconnect() {
        let path = scratch_snapshot();
        let store = DocumentStore::connect(Some(path.clone())).await.unwrap();
        let kept = store.insert(fixtures::fields("A", "Engineering")).await.unwrap();
        let dropped = store.insert(fixtures::fields("B", "Design")).await.unwrap();
        store.delete(dropped.id).await.unwrap();
        store.disconnect().await.unwrap();

        let reopened = DocumentStore::connect(Some(path.clone())).await.unwrap();
        let all = reopened.find(&JobFilter::default()).await.unwrap();
        assert_eq!(all, vec![kept]);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn corrupt_snapshot_fails_to_connect() {
        let path = scratch_snapshot();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"not json").unwrap();

        let result = DocumentStore::connect(Some(path.clone())).await;
        assert!(matches!(result, Err(StoreError::Snapshot(_))));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
