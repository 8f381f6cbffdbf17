//! Spark collection: CRUD over the `lumina_sparks` record.
//!
//! Every operation reads the whole list, changes it and writes it back. There
//! is no lock around that cycle, so two writers racing each other can lose an
//! update. Only one surface writes at a time in practice.

use crate::error::Result;
use crate::models::{Draft, Spark};

use super::kv::LocalStore;

/// Storage key for the spark list.
pub const SPARKS_KEY: &str = "lumina_sparks";

/// Storage key for the post queued for the composer content script.
pub const PENDING_POST_KEY: &str = "pendingPost";

/// Partial update for a spark. `None` leaves a field untouched.
///
/// Identifier and domain are not patchable.
#[derive(Debug, Clone, Default)]
pub struct SparkPatch {
    pub text: Option<String>,
    pub page_title: Option<String>,
    pub drafts: Option<Vec<Draft>>,
}

impl SparkPatch {
    pub fn drafts(drafts: Vec<Draft>) -> Self {
        Self {
            drafts: Some(drafts),
            ..Self::default()
        }
    }

    fn apply(self, spark: &mut Spark) {
        if let Some(text) = self.text {
            spark.text = text;
        }
        if let Some(title) = self.page_title {
            spark.page_title = title;
        }
        if let Some(drafts) = self.drafts {
            spark.drafts = drafts;
        }
    }
}

#[derive(Clone)]
pub struct SparkStore {
    store: LocalStore,
}

impl SparkStore {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub fn local(&self) -> &LocalStore {
        &self.store
    }

    /// All sparks, most recent first.
    pub async fn list(&self) -> Result<Vec<Spark>> {
        Ok(self.store.read(SPARKS_KEY).await?.unwrap_or_default())
    }

    async fn save(&self, sparks: &[Spark]) -> Result<()> {
        self.store.write(SPARKS_KEY, sparks).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Spark>> {
        Ok(self.list().await?.into_iter().find(|s| s.id == id))
    }

    /// Insert at the head of the collection.
    pub async fn create(&self, spark: Spark) -> Result<()> {
        let mut sparks = self.list().await?;
        tracing::debug!("[store] Adding spark {} from {}", spark.id, spark.domain);
        sparks.insert(0, spark);
        self.save(&sparks).await
    }

    /// Apply a patch to the spark with `id`.
    ///
    /// An unknown id is a no-op, not an error. Returns whether a spark was
    /// updated so callers can log the miss.
    pub async fn update(&self, id: &str, patch: SparkPatch) -> Result<bool> {
        let mut sparks = self.list().await?;
        let Some(spark) = sparks.iter_mut().find(|s| s.id == id) else {
            tracing::debug!("[store] Update for unknown spark {} ignored", id);
            return Ok(false);
        };

        patch.apply(spark);
        self.save(&sparks).await?;
        Ok(true)
    }

    /// Remove a spark and its drafts. Idempotent.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let mut sparks = self.list().await?;
        let before = sparks.len();
        sparks.retain(|s| s.id != id);
        if sparks.len() != before {
            self.save(&sparks).await?;
        }
        Ok(())
    }

    /// Queue text for the composer content script to insert.
    pub async fn set_pending_post(&self, text: &str) -> Result<()> {
        self.store.write(PENDING_POST_KEY, text).await
    }

    /// Take the queued post, clearing it.
    pub async fn take_pending_post(&self) -> Result<Option<String>> {
        let post: Option<String> = self.store.read(PENDING_POST_KEY).await?;
        if post.is_some() {
            self.store.remove(PENDING_POST_KEY).await?;
        }
        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DraftKind;
    use chrono::Utc;
    use tempfile::TempDir;

    fn spark(text: &str) -> Spark {
        Spark::new(text, "https://example.com/a", "Example", "example.com", Utc::now())
    }

    fn store() -> SparkStore {
        SparkStore::new(LocalStore::memory())
    }

    #[tokio::test]
    async fn test_create_inserts_at_head() {
        let store = store();
        let first = spark("first");
        let second = spark("second");
        store.create(first.clone()).await.unwrap();
        store.create(second.clone()).await.unwrap();

        let ids: Vec<_> = store.list().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_create_then_remove() {
        let store = store();
        let keep = spark("keep");
        let gone = spark("gone");
        store.create(keep.clone()).await.unwrap();
        store.create(gone.clone()).await.unwrap();

        store.remove(&gone.id).await.unwrap();
        let sparks = store.list().await.unwrap();
        assert!(sparks.iter().all(|s| s.id != gone.id));
        assert_eq!(sparks.len(), 1);

        // Idempotent
        store.remove(&gone.id).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_noop() {
        let store = store();
        store.create(spark("one")).await.unwrap();
        let before = store.list().await.unwrap();

        let applied = store
            .update("missing", SparkPatch::drafts(vec![]))
            .await
            .unwrap();

        assert!(!applied);
        assert_eq!(store.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_update_replaces_drafts_keeps_identity() {
        let store = store();
        let original = spark("one");
        store.create(original.clone()).await.unwrap();

        let drafts = vec![Draft::new(DraftKind::Tldr, "A", Utc::now())];
        let applied = store
            .update(&original.id, SparkPatch::drafts(drafts.clone()))
            .await
            .unwrap();
        assert!(applied);

        let updated = store.get(&original.id).await.unwrap().unwrap();
        assert_eq!(updated.drafts, drafts);
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.domain, original.domain);
        assert_eq!(updated.text, original.text);
    }

    #[tokio::test]
    async fn test_pending_post_taken_once() {
        let store = store();
        store.set_pending_post("Ship it").await.unwrap();
        assert_eq!(store.take_pending_post().await.unwrap(), Some("Ship it".to_string()));
        assert_eq!(store.take_pending_post().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_backed_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        let one = spark("one");
        SparkStore::new(LocalStore::file(&path))
            .create(one.clone())
            .await
            .unwrap();

        let reopened = SparkStore::new(LocalStore::file(&path));
        assert_eq!(reopened.get(&one.id).await.unwrap(), Some(one));
    }
}
