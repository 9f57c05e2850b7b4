//! Depth-indexed polygon layer cache.
//!
//! Tracks which depth buckets were already fetched, shares one in-flight fetch
//! between concurrent callers of the same bucket, and keeps the visibility
//! state of the base surface layer and the filtered depth layer.

use emu_core::models::{DepthBucket, LayerHandle};
use emu_core::Result;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

type SharedFetch = Shared<BoxFuture<'static, Result<LayerHandle>>>;

/// Which layer is drawn after a depth request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerVisibility {
    pub surface_visible: bool,
    pub depth_layer_visible: bool,

    /// Filter predicate applied to the depth layer, if any
    pub definition_expression: Option<String>,
}

impl Default for LayerVisibility {
    fn default() -> Self {
        Self { surface_visible: true, depth_layer_visible: false, definition_expression: None }
    }
}

/// Layer to display for a bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DepthLayer {
    /// The pre-existing base surface layer
    Surface,

    /// A fetched polygon layer scoped by a filter predicate
    Filtered { handle: LayerHandle, definition_expression: String },
}

/// Hit/miss counters for the depth cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DepthCacheStats {
    pub hits: u64,
    pub misses: u64,

    /// Callers that joined a fetch already in flight
    pub shared_waits: u64,

    pub failures: u64,
}

impl DepthCacheStats {
    /// Fraction of bucket requests answered without a new fetch
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.shared_waits;
        if total == 0 {
            0.0
        } else {
            (self.hits + self.shared_waits) as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct DepthState {
    fetched: HashMap<DepthBucket, LayerHandle>,
    in_flight: HashMap<DepthBucket, SharedFetch>,
    visibility: LayerVisibility,
    stats: DepthCacheStats,

    /// Bumped by every visibility request; only the newest may apply
    generation: u64,
}

/// Cache of depth-bucket layers with single-flight fetching
#[derive(Default)]
pub struct DepthLayerCache {
    state: Mutex<DepthState>,
}

impl fmt::Debug for DepthLayerCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("DepthLayerCache")
            .field("fetched", &state.fetched.keys().collect::<Vec<_>>())
            .field("in_flight", &state.in_flight.keys().collect::<Vec<_>>())
            .field("visibility", &state.visibility)
            .field("stats", &state.stats)
            .finish()
    }
}

impl DepthLayerCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DepthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Map a slider value onto a depth bucket
    pub fn bucket(raw: i32) -> DepthBucket {
        DepthBucket::from_slider(raw)
    }

    pub fn is_cached(&self, bucket: DepthBucket) -> bool {
        self.lock().fetched.contains_key(&bucket)
    }

    /// Buckets fetched so far, ascending
    pub fn cached_buckets(&self) -> Vec<DepthBucket> {
        let mut buckets: Vec<DepthBucket> = self.lock().fetched.keys().copied().collect();
        buckets.sort();
        buckets
    }

    pub fn visibility(&self) -> LayerVisibility {
        self.lock().visibility.clone()
    }

    pub fn stats(&self) -> DepthCacheStats {
        self.lock().stats
    }

    /// Resolve the layer for a bucket and make it the visible one.
    ///
    /// The surface bucket only toggles visibility. Any other bucket is served
    /// from the fetched set or fetched once via `fetch`; on failure the
    /// bucket stays unmarked and the visibility state is left unchanged.
    /// Visibility follows the most recent request: a fetch that completes
    /// after a newer request still caches its layer but does not show it.
    pub async fn ensure_cached<F, Fut>(&self, bucket: DepthBucket, fetch: F) -> Result<DepthLayer>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<LayerHandle>> + Send + 'static,
    {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            if bucket.is_surface() {
                state.visibility.surface_visible = true;
                state.visibility.depth_layer_visible = false;
                tracing::debug!("Showing surface layer");
                return Ok(DepthLayer::Surface);
            }
            state.generation
        };

        let handle = self.fetch_once(bucket, fetch).await?;
        let definition_expression = bucket.definition_expression();

        let mut state = self.lock();
        if state.generation == generation {
            state.visibility = LayerVisibility {
                surface_visible: false,
                depth_layer_visible: true,
                definition_expression: Some(definition_expression.clone()),
            };
        } else {
            tracing::debug!(%bucket, "Depth layer superseded by a newer request");
        }

        Ok(DepthLayer::Filtered { handle, definition_expression })
    }

    /// Fetch a bucket into the cache without touching visibility
    pub async fn prefetch<F, Fut>(&self, bucket: DepthBucket, fetch: F) -> Result<LayerHandle>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<LayerHandle>> + Send + 'static,
    {
        self.fetch_once(bucket, fetch).await
    }

    async fn fetch_once<F, Fut>(&self, bucket: DepthBucket, fetch: F) -> Result<LayerHandle>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<LayerHandle>> + Send + 'static,
    {
        let shared = {
            let mut state = self.lock();

            if let Some(handle) = state.fetched.get(&bucket).cloned() {
                state.stats.hits += 1;
                tracing::debug!(%bucket, "Depth layer cache hit");
                return Ok(handle);
            }

            if let Some(shared) = state.in_flight.get(&bucket).cloned() {
                state.stats.shared_waits += 1;
                tracing::debug!(%bucket, "Joining in-flight depth layer fetch");
                shared
            } else {
                state.stats.misses += 1;
                tracing::debug!(%bucket, "Depth layer cache miss, fetching");
                let shared = fetch().boxed().shared();
                state.in_flight.insert(bucket, shared.clone());
                shared
            }
        };

        let result = shared.clone().await;

        // Whichever waiter finishes first records the outcome; later waiters
        // find the entry already replaced or removed.
        let mut state = self.lock();
        let current = state.in_flight.get(&bucket).is_some_and(|f| f.ptr_eq(&shared));
        if current {
            state.in_flight.remove(&bucket);
            match &result {
                Ok(handle) => {
                    state.fetched.insert(bucket, handle.clone());
                    tracing::info!(%bucket, features = handle.feature_count, "Cached depth layer");
                }
                Err(e) => {
                    state.stats.failures += 1;
                    tracing::error!(%bucket, error = %e, "Depth layer fetch failed");
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::EmuError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn handle(bucket: DepthBucket) -> LayerHandle {
        LayerHandle { layer_id: format!("depth-{}", bucket), bucket, feature_count: 3 }
    }

    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
        bucket: DepthBucket,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<LayerHandle>> {
        let calls = Arc::clone(calls);
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(handle(bucket))
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_second_request_is_cache_hit() {
        let cache = DepthLayerCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let bucket = DepthLayerCache::bucket(35);

        cache.ensure_cached(bucket, counting_fetch(&calls, bucket)).await.unwrap();
        let layer = cache.ensure_cached(bucket, counting_fetch(&calls, bucket)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(layer, DepthLayer::Filtered { ref definition_expression, .. }
            if definition_expression == "Depth = 30"));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_surface_toggles_visibility_without_fetch() {
        let cache = DepthLayerCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let deep = DepthLayerCache::bucket(50);

        cache.ensure_cached(deep, counting_fetch(&calls, deep)).await.unwrap();
        let visibility = cache.visibility();
        assert!(!visibility.surface_visible);
        assert!(visibility.depth_layer_visible);
        assert_eq!(visibility.definition_expression.as_deref(), Some("Depth = 50"));

        let surface = DepthLayerCache::bucket(4);
        let layer = cache.ensure_cached(surface, counting_fetch(&calls, surface)).await.unwrap();

        assert_eq!(layer, DepthLayer::Surface);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.visibility().surface_visible);
        assert!(!cache.visibility().depth_layer_visible);
        assert!(!cache.is_cached(surface));
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() {
        let cache = Arc::new(DepthLayerCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let bucket = DepthLayerCache::bucket(72);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let fetch = counting_fetch(&calls, bucket);
                tokio::spawn(async move { cache.ensure_cached(bucket, fetch).await })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_cached(bucket));
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits + stats.shared_waits, 7);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_bucket_unmarked() {
        let cache = DepthLayerCache::new();
        let bucket = DepthLayerCache::bucket(20);

        let result = cache
            .ensure_cached(bucket, || async {
                Err(EmuError::provider("query_by_depth_predicate", "service unavailable"))
            })
            .await;

        assert!(result.is_err());
        assert!(!cache.is_cached(bucket));
        assert_eq!(cache.visibility(), LayerVisibility::default());
        assert_eq!(cache.stats().failures, 1);

        let calls = Arc::new(AtomicUsize::new(0));
        cache.ensure_cached(bucket, counting_fetch(&calls, bucket)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_cached(bucket));
    }

    #[tokio::test]
    async fn test_prefetch_keeps_visibility() {
        let cache = DepthLayerCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let bucket = DepthLayerCache::bucket(10);
        assert!(bucket.is_surface());

        let warm = DepthBucket::from_band(10).unwrap();
        cache.prefetch(warm, counting_fetch(&calls, warm)).await.unwrap();

        assert!(cache.is_cached(warm));
        assert_eq!(cache.visibility(), LayerVisibility::default());
        assert_eq!(cache.cached_buckets(), vec![warm]);
    }

    #[tokio::test]
    async fn test_newer_surface_request_wins_over_slow_fetch() {
        let cache = Arc::new(DepthLayerCache::new());
        let deep = DepthLayerCache::bucket(55);

        let slow = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .ensure_cached(deep, move || async move {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(handle(deep))
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(5)).await;
        let surface = DepthLayerCache::bucket(3);
        let calls = Arc::new(AtomicUsize::new(0));
        cache.ensure_cached(surface, counting_fetch(&calls, surface)).await.unwrap();

        slow.await.unwrap().unwrap();

        assert_eq!(cache.visibility(), LayerVisibility::default());
        assert!(cache.is_cached(deep));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_newer_depth_request_wins_over_slow_fetch() {
        let cache = Arc::new(DepthLayerCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let slow_bucket = DepthLayerCache::bucket(80);
        let fast_bucket = DepthLayerCache::bucket(20);

        let slow = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .ensure_cached(slow_bucket, move || async move {
                        tokio::time::sleep(Duration::from_millis(80)).await;
                        Ok(handle(slow_bucket))
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.ensure_cached(fast_bucket, counting_fetch(&calls, fast_bucket)).await.unwrap();
        slow.await.unwrap().unwrap();

        assert_eq!(cache.visibility().definition_expression.as_deref(), Some("Depth = 20"));
    }

    #[test]
    fn test_hit_rate() {
        let stats = DepthCacheStats { hits: 3, misses: 1, shared_waits: 0, failures: 0 };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert_eq!(DepthCacheStats::default().hit_rate(), 0.0);
    }
}
