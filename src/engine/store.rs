use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::sprites::SpriteInfo;
use crate::engine::state::TrackerState;

pub type SpriteCache = BTreeMap<String, SpriteInfo>;

/// Raw persisted tracker state. Validation against the catalog happens in `TrackerState`.
pub trait StateRepository: Send + Sync {
    fn load_state(&self) -> Result<Option<Value>>;
    fn save_state(&self, state: &TrackerState) -> Result<()>;
}

pub trait SpriteCacheRepository: Send + Sync {
    fn load_cache(&self) -> Result<SpriteCache>;
    fn save_cache(&self, cache: &SpriteCache) -> Result<()>;
}

/// JSON files on local disk, rewritten whole on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    state_path: PathBuf,
    cache_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(state_path: impl Into<PathBuf>, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            state_path: state_path.into(),
            cache_path: cache_path.into(),
        }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

impl StateRepository for JsonFileStore {
    fn load_state(&self) -> Result<Option<Value>> {
        if !self.state_path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.state_path)
            .with_context(|| format!("reading {}", self.state_path.display()))?;
        match serde_json::from_str(&content) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                warn!("State file {} is not valid JSON ({}); using defaults", self.state_path.display(), e);
                Ok(None)
            }
        }
    }

    fn save_state(&self, state: &TrackerState) -> Result<()> {
        debug!("Saving state to {}", self.state_path.display());
        write_json(&self.state_path, state, true)
    }
}

impl SpriteCacheRepository for JsonFileStore {
    fn load_cache(&self) -> Result<SpriteCache> {
        if !self.cache_path.exists() {
            return Ok(SpriteCache::new());
        }
        let content = fs::read_to_string(&self.cache_path)
            .with_context(|| format!("reading {}", self.cache_path.display()))?;
        match serde_json::from_str(&content) {
            Ok(cache) => Ok(cache),
            Err(e) => {
                warn!("Sprite cache {} is unreadable ({}); starting empty", self.cache_path.display(), e);
                Ok(SpriteCache::new())
            }
        }
    }

    fn save_cache(&self, cache: &SpriteCache) -> Result<()> {
        write_json(&self.cache_path, cache, false)
    }
}
