use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::engine::store::{SpriteCache, SpriteCacheRepository};

/// Id recorded for names the remote API could not resolve.
pub const UNKNOWN_ID: u32 = 9999;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteInfo {
    pub id: u32,
    pub img_url: String,
}

impl SpriteInfo {
    pub fn unknown() -> Self {
        Self { id: UNKNOWN_ID, img_url: String::new() }
    }

    pub fn is_unknown(&self) -> bool {
        self.id == UNKNOWN_ID
    }
}

/// Names whose API keys are unreliable to look up.
const SPECIAL_IDS: &[(&str, u32)] = &[
    ("nidoran-f", 29),
    ("nidoran-m", 32),
];

/// Cache key for a display name, following PokeAPI's naming.
///
/// "Nidoran♀" -> "nidoran-f", "Mr. Mime" -> "mr-mime", "Farfetch'd" -> "farfetchd".
pub fn lookup_key(name: &str) -> String {
    name.to_lowercase()
        .replace('♀', "-f")
        .replace('♂', "-m")
        .replace(['.', '\''], "")
        .replace(' ', "-")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(u32),
    /// The API answered with a non-success status.
    Missing(u16),
}

/// Remote species lookup by normalized key.
#[async_trait]
pub trait SpeciesLookup: Send + Sync {
    async fn lookup(&self, key: &str) -> Result<LookupOutcome>;
}

/// Owned sprite cache. Inserts are buffered in memory until `flush`.
pub struct SpriteStore {
    entries: Mutex<SpriteCache>,
    dirty: AtomicBool,
    save_lock: tokio::sync::Mutex<()>,
    repo: Arc<dyn SpriteCacheRepository>,
}

impl SpriteStore {
    pub fn load(repo: Arc<dyn SpriteCacheRepository>) -> Result<Self> {
        let entries = repo.load_cache()?;
        debug!("Loaded {} cached sprites", entries.len());
        Ok(Self {
            entries: Mutex::new(entries),
            dirty: AtomicBool::new(false),
            save_lock: tokio::sync::Mutex::new(()),
            repo,
        })
    }

    pub fn get(&self, key: &str) -> Option<SpriteInfo> {
        self.entries.lock().get(key).cloned()
    }

    pub fn put(&self, key: &str, info: SpriteInfo) {
        self.entries.lock().insert(key.to_string(), info);
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Writes the cache if anything was inserted since the last write.
    pub async fn flush(&self) {
        let _guard = self.save_lock.lock().await;
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return;
        }
        let snapshot = self.entries.lock().clone();
        let count = snapshot.len();
        let repo = Arc::clone(&self.repo);
        match tokio::task::spawn_blocking(move || repo.save_cache(&snapshot)).await {
            Ok(Ok(())) => debug!("Saved {} cached sprites", count),
            Ok(Err(e)) => {
                error!("Failed to write sprite cache: {:#}", e);
                self.dirty.store(true, Ordering::SeqCst);
            }
            Err(e) => {
                error!("Sprite cache writer did not finish: {}", e);
                self.dirty.store(true, Ordering::SeqCst);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct SpriteResolver {
    store: SpriteStore,
    lookup: Arc<dyn SpeciesLookup>,
    sprite_base: String,
}

impl SpriteResolver {
    pub fn new(store: SpriteStore, lookup: Arc<dyn SpeciesLookup>, sprite_base: &str) -> Self {
        Self {
            store,
            lookup,
            sprite_base: sprite_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn store(&self) -> &SpriteStore {
        &self.store
    }

    pub fn img_url(&self, id: u32) -> String {
        if id == UNKNOWN_ID {
            String::new()
        } else {
            format!("{}/{}.png", self.sprite_base, id)
        }
    }

    /// Never fails: lookups that go wrong resolve to the cached `SpriteInfo::unknown()`.
    pub async fn resolve(&self, name: &str) -> SpriteInfo {
        let info = self.resolve_buffered(name).await;
        self.store.flush().await;
        info
    }

    /// Resolves every name in order, writing the cache at most once.
    pub async fn resolve_all<'n, I>(&self, names: I) -> Vec<SpriteInfo>
    where
        I: IntoIterator<Item = &'n str>,
    {
        let mut out = Vec::new();
        for name in names {
            out.push(self.resolve_buffered(name).await);
        }
        self.store.flush().await;
        out
    }

    async fn resolve_buffered(&self, name: &str) -> SpriteInfo {
        let key = lookup_key(name);
        if let Some(info) = self.store.get(&key) {
            return info;
        }

        let id = match SPECIAL_IDS.iter().find(|(k, _)| *k == key) {
            Some((_, id)) => *id,
            None => match self.lookup.lookup(&key).await {
                Ok(LookupOutcome::Found(id)) => id,
                Ok(LookupOutcome::Missing(status)) => {
                    warn!("No species found for '{}' (HTTP {})", key, status);
                    UNKNOWN_ID
                }
                Err(e) => {
                    warn!("Species lookup for '{}' failed: {:#}", key, e);
                    UNKNOWN_ID
                }
            },
        };

        let info = SpriteInfo { id, img_url: self.img_url(id) };
        self.store.put(&key, info.clone());
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::store::JsonFileStore;
    use anyhow::anyhow;
    use std::sync::atomic::AtomicUsize;

    struct CountingLookup {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SpeciesLookup for CountingLookup {
        async fn lookup(&self, key: &str) -> Result<LookupOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(anyhow!("connection refused"));
            }
            match key {
                "bulbasaur" => Ok(LookupOutcome::Found(1)),
                "mr-mime" => Ok(LookupOutcome::Found(122)),
                _ => Ok(LookupOutcome::Missing(404)),
            }
        }
    }

    fn make_resolver(dir: &std::path::Path, fail: bool) -> (SpriteResolver, Arc<CountingLookup>) {
        let repo = Arc::new(JsonFileStore::new(dir.join("state.json"), dir.join("cache.json")));
        let store = SpriteStore::load(repo).expect("load store");
        let lookup = Arc::new(CountingLookup { calls: AtomicUsize::new(0), fail });
        (SpriteResolver::new(store, lookup.clone(), "https://sprites.test/pokemon/"), lookup)
    }

    #[test]
    fn test_lookup_key() {
        assert_eq!(lookup_key("Nidoran♀"), "nidoran-f");
        assert_eq!(lookup_key("Nidoran♂"), "nidoran-m");
        assert_eq!(lookup_key("Mr. Mime"), "mr-mime");
        assert_eq!(lookup_key("Farfetch'd"), "farfetchd");
        assert_eq!(lookup_key("Bulbasaur"), "bulbasaur");
    }

    #[tokio::test]
    async fn test_resolve_is_cached_after_first_call() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (resolver, lookup) = make_resolver(dir.path(), false);

        let first = resolver.resolve("Mr. Mime").await;
        assert_eq!(first, SpriteInfo { id: 122, img_url: "https://sprites.test/pokemon/122.png".to_string() });
        let second = resolver.resolve("Mr. Mime").await;
        assert_eq!(first, second);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);

        let raw = std::fs::read_to_string(dir.path().join("cache.json")).expect("cache written");
        assert!(raw.contains("\"mr-mime\""));
    }

    #[tokio::test]
    async fn test_special_names_skip_remote_lookup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (resolver, lookup) = make_resolver(dir.path(), true);

        assert_eq!(resolver.resolve("Nidoran♀").await.id, 29);
        assert_eq!(resolver.resolve("Nidoran♂").await.id, 32);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
        assert_eq!(resolver.store().len(), 2);
    }

    #[tokio::test]
    async fn test_failures_cache_the_unknown_sentinel() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (resolver, lookup) = make_resolver(dir.path(), true);

        let info = resolver.resolve("Bulbasaur").await;
        assert!(info.is_unknown());
        assert_eq!(info.img_url, "");
        resolver.resolve("Bulbasaur").await;
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);

        // A fresh resolver over the same cache file does not retry either.
        let (reloaded, lookup) = make_resolver(dir.path(), false);
        assert!(reloaded.resolve("Bulbasaur").await.is_unknown());
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_species_resolves_to_unknown() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (resolver, _) = make_resolver(dir.path(), false);
        assert_eq!(resolver.resolve("Missingno").await, SpriteInfo::unknown());
    }

    /// Counts cache writes.
    struct CountingRepo {
        saves: AtomicUsize,
    }

    impl SpriteCacheRepository for CountingRepo {
        fn load_cache(&self) -> Result<SpriteCache> {
            Ok(SpriteCache::new())
        }

        fn save_cache(&self, _cache: &SpriteCache) -> Result<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_resolve_all_writes_cache_once() {
        let repo = Arc::new(CountingRepo { saves: AtomicUsize::new(0) });
        let store = SpriteStore::load(repo.clone()).expect("load store");
        let lookup = Arc::new(CountingLookup { calls: AtomicUsize::new(0), fail: false });
        let resolver = SpriteResolver::new(store, lookup, "https://sprites.test/pokemon");

        let infos = resolver.resolve_all(["Bulbasaur", "Mr. Mime", "Missingno", "Bulbasaur"]).await;
        assert_eq!(infos.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 122, UNKNOWN_ID, 1]);
        assert_eq!(repo.saves.load(Ordering::SeqCst), 1);

        // Everything is cached now, so nothing new is written.
        resolver.resolve_all(["Bulbasaur", "Mr. Mime"]).await;
        resolver.resolve("Missingno").await;
        assert_eq!(repo.saves.load(Ordering::SeqCst), 1);
    }
}
