//! Animal data provider seam and the per-call fetch scope

use crate::animal::{Animal, AnimalId};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Source of animal records.
///
/// All storage backends implement this trait. Implementations must not
/// treat missing ids as errors in batched fetches: absent ids are simply
/// left out of the result.
#[async_trait]
pub trait AnimalProvider: Send + Sync {
    /// Get a single animal by id
    async fn get_animal(&self, id: &AnimalId) -> Result<Option<Animal>>;

    /// Get several animals in one round trip
    async fn get_animals(&self, ids: &[AnimalId]) -> Result<Vec<Animal>>;
}

#[async_trait]
impl<P: AnimalProvider + ?Sized> AnimalProvider for std::sync::Arc<P> {
    async fn get_animal(&self, id: &AnimalId) -> Result<Option<Animal>> {
        (**self).get_animal(id).await
    }

    async fn get_animals(&self, ids: &[AnimalId]) -> Result<Vec<Animal>> {
        (**self).get_animals(ids).await
    }
}

/// Counters for one fetch scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchStats {
    /// Round trips made to the provider
    pub requests: usize,
    /// Ids served from the scope cache
    pub cache_hits: usize,
    /// Batched fetches dropped because the provider was unavailable
    pub truncated: usize,
}

/// Memoization scope for a single analysis call.
///
/// Every animal is fetched at most once per scope, so the same ancestor
/// reached through several paths resolves to one consistent snapshot.
/// A scope must not outlive the call that created it.
pub struct FetchScope<'a> {
    provider: &'a dyn AnimalProvider,
    timeout: Option<Duration>,
    cache: Mutex<HashMap<AnimalId, Option<Animal>>>,
    stats: Mutex<FetchStats>,
}

impl<'a> FetchScope<'a> {
    pub fn new(provider: &'a dyn AnimalProvider) -> Self {
        Self {
            provider,
            timeout: None,
            cache: Mutex::new(HashMap::new()),
            stats: Mutex::new(FetchStats::default()),
        }
    }

    /// Bound every provider call by `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch one animal, failing with `NotFound` when the provider has no record
    pub async fn require(&self, id: &AnimalId) -> Result<Animal> {
        if let Some(cached) = self.cached(id)? {
            return cached.ok_or_else(|| Error::NotFound(id.to_string()));
        }

        self.bump(|s| s.requests += 1)?;
        let fetched = self.bounded(self.provider.get_animal(id)).await?;
        self.lock_cache()?.insert(id.clone(), fetched.clone());

        fetched.ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Fetch many animals in one batched call; absent ids are skipped.
    ///
    /// Ids already resolved in this scope are served from the cache.
    pub async fn fetch_many(&self, ids: &[AnimalId]) -> Result<Vec<Animal>> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        let mut missing = Vec::new();

        {
            let cache = self.lock_cache()?;
            for id in ids {
                if !seen.insert(id) {
                    continue;
                }
                match cache.get(id) {
                    Some(entry) => found.extend(entry.clone()),
                    None => missing.push(id.clone()),
                }
            }
        }
        let hits = seen.len() - missing.len();
        self.bump(|s| s.cache_hits += hits)?;

        if missing.is_empty() {
            return Ok(found);
        }

        self.bump(|s| s.requests += 1)?;
        let fetched = self.bounded(self.provider.get_animals(&missing)).await?;

        let mut cache = self.lock_cache()?;
        for id in &missing {
            cache.entry(id.clone()).or_insert(None);
        }
        for animal in fetched {
            cache.insert(animal.id.clone(), Some(animal.clone()));
            found.push(animal);
        }

        Ok(found)
    }

    /// Like `fetch_many`, but an unavailable provider yields an empty batch
    pub async fn fetch_many_lenient(&self, ids: &[AnimalId]) -> Result<Vec<Animal>> {
        match self.fetch_many(ids).await {
            Ok(animals) => Ok(animals),
            Err(err) if err.is_unavailable() => {
                tracing::warn!("Treating {} ancestors as absent: {}", ids.len(), err);
                self.bump(|s| s.truncated += 1)?;
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Look up an animal already resolved in this scope
    pub fn get_cached(&self, id: &AnimalId) -> Option<Animal> {
        self.cached(id).ok().flatten().flatten()
    }

    pub fn stats(&self) -> FetchStats {
        self.stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    async fn bounded<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                Error::DataUnavailable(format!("Provider timed out after {:?}", limit))
            })?,
            None => fut.await,
        }
    }

    fn cached(&self, id: &AnimalId) -> Result<Option<Option<Animal>>> {
        Ok(self.lock_cache()?.get(id).cloned())
    }

    fn lock_cache(&self) -> Result<std::sync::MutexGuard<'_, HashMap<AnimalId, Option<Animal>>>> {
        self.cache
            .lock()
            .map_err(|e| Error::Internal(format!("Lock error: {}", e)))
    }

    fn bump(&self, f: impl FnOnce(&mut FetchStats)) -> Result<()> {
        let mut stats = self
            .stats
            .lock()
            .map_err(|e| Error::Internal(format!("Lock error: {}", e)))?;
        f(&mut stats);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubProvider;
    use super::*;

    fn herd() -> StubProvider {
        StubProvider::new(vec![
            Animal::new("a", "Alder"),
            Animal::new("b", "Birch"),
            Animal::new("c", "Cedar"),
        ])
    }

    #[tokio::test]
    async fn test_require_memoizes() {
        let provider = herd();
        let scope = FetchScope::new(&provider);

        let first = scope.require(&AnimalId::new("a")).await.unwrap();
        let second = scope.require(&AnimalId::new("a")).await.unwrap();

        assert_eq!(first.name, second.name);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_require_unknown_is_not_found() {
        let provider = herd();
        let scope = FetchScope::new(&provider);

        let err = scope.require(&AnimalId::new("zzz")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        // Negative results are memoized too
        assert!(scope.require(&AnimalId::new("zzz")).await.is_err());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_many_batches_only_misses() {
        let provider = herd();
        let scope = FetchScope::new(&provider);

        scope.require(&AnimalId::new("a")).await.unwrap();
        let ids = vec![
            AnimalId::new("a"),
            AnimalId::new("b"),
            AnimalId::new("b"),
            AnimalId::new("missing"),
        ];
        let animals = scope.fetch_many(&ids).await.unwrap();

        assert_eq!(animals.len(), 2);
        assert_eq!(provider.calls(), 2);
        let stats = scope.stats();
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.cache_hits, 1);

        // Everything is now cached, including the miss
        scope.fetch_many(&ids).await.unwrap();
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_lenient_fetch_swallows_outage() {
        let provider = herd().failing_on("b");
        let scope = FetchScope::new(&provider);

        let ids = vec![AnimalId::new("b"), AnimalId::new("c")];
        assert!(scope.fetch_many(&ids).await.unwrap_err().is_unavailable());

        let animals = scope.fetch_many_lenient(&ids).await.unwrap();
        assert!(animals.is_empty());
        assert_eq!(scope.stats().truncated, 1);
    }

    #[tokio::test]
    async fn test_timeout_surfaces_as_unavailable() {
        let provider = herd().with_delay(Duration::from_millis(200));
        let scope = FetchScope::new(&provider).with_timeout(Some(Duration::from_millis(10)));

        let err = scope.require(&AnimalId::new("a")).await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
