//! Query memoization
//!
//! Wraps any [`Warehouse`] and keeps each successful result for a fixed TTL,
//! keyed by operation and document id. Failed queries are never cached.

use async_trait::async_trait;
use gwas_common::{DocumentSummary, ImagePageRef, PageRecord, TextPageStat, TraitRecord};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use super::{Warehouse, WarehouseError};

/// Map of values that expire `ttl` after insertion
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, (Instant, V)>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Live value for `key`, if any
    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|(inserted, _)| inserted.elapsed() < self.ttl)
            .map(|(_, value)| value.clone())
    }

    pub async fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, (inserted, _)| inserted.elapsed() < self.ttl);
        entries.insert(key, (Instant::now(), value));
    }

    /// Cached value, or the result of `load` (stored only on success)
    pub async fn get_or_load<F, Fut, E>(&self, key: K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            debug!(key = ?key, "Cache hit");
            return Ok(value);
        }

        let value = load().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum QueryKey {
    Documents,
    Traits(String),
    Pages(String),
    TextLengths(String),
    Images(String),
}

/// [`Warehouse`] decorator memoizing every query
pub struct CachedWarehouse {
    inner: Arc<dyn Warehouse>,
    documents: TtlCache<QueryKey, Vec<DocumentSummary>>,
    traits: TtlCache<QueryKey, Option<TraitRecord>>,
    pages: TtlCache<QueryKey, Vec<PageRecord>>,
    text_lengths: TtlCache<QueryKey, Vec<TextPageStat>>,
    images: TtlCache<QueryKey, Vec<ImagePageRef>>,
}

impl CachedWarehouse {
    pub fn new(inner: Arc<dyn Warehouse>, ttl: Duration) -> Self {
        Self {
            inner,
            documents: TtlCache::new(ttl),
            traits: TtlCache::new(ttl),
            pages: TtlCache::new(ttl),
            text_lengths: TtlCache::new(ttl),
            images: TtlCache::new(ttl),
        }
    }

    /// Drop every cached result
    pub async fn invalidate(&self) {
        self.documents.clear().await;
        self.traits.clear().await;
        self.pages.clear().await;
        self.text_lengths.clear().await;
        self.images.clear().await;
    }
}

#[async_trait]
impl Warehouse for CachedWarehouse {
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, WarehouseError> {
        self.documents
            .get_or_load(QueryKey::Documents, || self.inner.list_documents())
            .await
    }

    async fn trait_record(&self, document_id: &str) -> Result<Option<TraitRecord>, WarehouseError> {
        self.traits
            .get_or_load(QueryKey::Traits(document_id.to_string()), || {
                self.inner.trait_record(document_id)
            })
            .await
    }

    async fn document_pages(&self, document_id: &str) -> Result<Vec<PageRecord>, WarehouseError> {
        self.pages
            .get_or_load(QueryKey::Pages(document_id.to_string()), || {
                self.inner.document_pages(document_id)
            })
            .await
    }

    async fn text_page_lengths(&self, document_id: &str) -> Result<Vec<TextPageStat>, WarehouseError> {
        self.text_lengths
            .get_or_load(QueryKey::TextLengths(document_id.to_string()), || {
                self.inner.text_page_lengths(document_id)
            })
            .await
    }

    async fn image_pages(&self, document_id: &str) -> Result<Vec<ImagePageRef>, WarehouseError> {
        self.images
            .get_or_load(QueryKey::Images(document_id.to_string()), || {
                self.inner.image_pages(document_id)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and fails while `fail` is set
    #[derive(Default)]
    struct CountingWarehouse {
        calls: AtomicUsize,
        fail: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl Warehouse for CountingWarehouse {
        async fn list_documents(&self) -> Result<Vec<DocumentSummary>, WarehouseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(WarehouseError::Unavailable("offline".to_string()));
            }
            Ok(vec![DocumentSummary {
                document_id: "doc-1".to_string(),
                pdf_filename: "wheat.pdf".to_string(),
                page_count: 9,
                extraction_timestamp: Utc::now(),
                file_url: "@GWAS.PDF_RAW.PDF_STAGE/wheat.pdf".to_string(),
            }])
        }

        async fn trait_record(&self, document_id: &str) -> Result<Option<TraitRecord>, WarehouseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(TraitRecord::new(document_id)))
        }

        async fn document_pages(&self, _: &str) -> Result<Vec<PageRecord>, WarehouseError> {
            Ok(Vec::new())
        }

        async fn text_page_lengths(&self, _: &str) -> Result<Vec<TextPageStat>, WarehouseError> {
            Ok(Vec::new())
        }

        async fn image_pages(&self, _: &str) -> Result<Vec<ImagePageRef>, WarehouseError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_repeat_query_hits_cache() {
        let inner = Arc::new(CountingWarehouse::default());
        let cached = CachedWarehouse::new(inner.clone(), Duration::from_secs(600));

        cached.list_documents().await.unwrap();
        cached.list_documents().await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_keyed_by_document() {
        let inner = Arc::new(CountingWarehouse::default());
        let cached = CachedWarehouse::new(inner.clone(), Duration::from_secs(600));

        cached.trait_record("a").await.unwrap();
        cached.trait_record("b").await.unwrap();
        cached.trait_record("a").await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_not_cached() {
        let inner = Arc::new(CountingWarehouse::default());
        inner.fail.store(true, Ordering::SeqCst);
        let cached = CachedWarehouse::new(inner.clone(), Duration::from_secs(600));

        assert!(cached.list_documents().await.is_err());
        inner.fail.store(false, Ordering::SeqCst);
        assert!(cached.list_documents().await.is_ok());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let inner = Arc::new(CountingWarehouse::default());
        let cached = CachedWarehouse::new(inner.clone(), Duration::from_millis(20));

        cached.list_documents().await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        cached.list_documents().await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let inner = Arc::new(CountingWarehouse::default());
        let cached = CachedWarehouse::new(inner.clone(), Duration::from_secs(600));

        cached.list_documents().await.unwrap();
        cached.invalidate().await;
        cached.list_documents().await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
