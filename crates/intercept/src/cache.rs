//! Materialized-result cache keyed by the executed expression.
//!
//! Sits between the interception layer and a backing source: results are
//! memoized per expression, so repeated enumerations of an unchanged
//! (rewritten) query skip the round-trip entirely. Keys are the canonical
//! JSON form of the expression, deterministic because object values are
//! ordered maps. Only materialized results are cached; streaming passes
//! through to the wrapped source untouched.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use async_trait::async_trait;
use intercept_api::{Expr, Result};
use tokio::sync::RwLock;
use tracing::debug;

use crate::query::{EagerLoadSource, QueryProvider, StreamSource};

struct CacheEntry<T> {
    rows: Vec<T>,
    stored_at: Instant,
}

/// Caching wrapper around a query provider.
///
/// Entries never expire unless a TTL is set; `invalidate_all` clears the
/// cache explicitly. Capability probes pass through to the wrapped
/// source, so a cached source is exactly as capable as its inner one.
pub struct CachedSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<dyn QueryProvider<T>>,
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    ttl: Option<Duration>,
}

impl<T> CachedSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(inner: Arc<dyn QueryProvider<T>>) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
            ttl: None,
        }
    }

    /// Cache with an expiry: entries older than `ttl` are re-fetched.
    pub fn with_ttl(inner: Arc<dyn QueryProvider<T>>, ttl: Duration) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    /// Drop every cached result.
    pub async fn invalidate_all(&self) {
        self.entries.write().await.clear();
    }

    /// Number of live entries (expired ones included until re-fetched).
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn cache_key(expr: &Expr) -> Result<String> {
        serde_json::to_string(expr)
            .map_err(|e| anyhow!("failed to derive cache key: {e}").into())
    }

    fn is_fresh(&self, entry: &CacheEntry<T>) -> bool {
        match self.ttl {
            Some(ttl) => entry.stored_at.elapsed() < ttl,
            None => true,
        }
    }
}

#[async_trait]
impl<T> QueryProvider<T> for CachedSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn execute(&self, expr: &Expr) -> Result<Vec<T>> {
        let key = Self::cache_key(expr)?;
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&key) {
                if self.is_fresh(entry) {
                    debug!(source = expr.source_name(), "query cache hit");
                    return Ok(entry.rows.clone());
                }
            }
        }

        let rows = self.inner.execute(expr).await?;
        self.entries.write().await.insert(
            key,
            CacheEntry {
                rows: rows.clone(),
                stored_at: Instant::now(),
            },
        );
        Ok(rows)
    }

    fn streaming(&self) -> Option<&dyn StreamSource<T>> {
        self.inner.streaming()
    }

    fn eager_loading(&self) -> Option<&dyn EagerLoadSource> {
        self.inner.eager_loading()
    }
}
