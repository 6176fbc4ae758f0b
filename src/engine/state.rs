use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::engine::catalog::GameCatalog;
use crate::engine::dex::GameEntry;

pub const MIN_TITLE_SIZE: u32 = 8;
pub const MAX_TITLE_SIZE: u32 = 200;

/// The whole persisted state of the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerState {
    pub generation: String,
    pub game: String,
    pub index: usize,
    /// Caught flag per sprite id. Keys serialize as strings.
    pub caught: BTreeMap<u32, bool>,
    pub title_size: u32,
}

impl TrackerState {
    /// First generation, its first game, nothing caught.
    pub fn initial(catalog: &GameCatalog, title_size: u32) -> Self {
        let (generation, game) = catalog.default_selection().unwrap_or_default();
        Self {
            generation,
            game,
            index: 0,
            caught: BTreeMap::new(),
            title_size: clamp_title_size(i64::from(title_size)),
        }
    }

    /// Builds a state from persisted JSON, keeping each field only if it is usable.
    pub fn from_value(value: Option<Value>, catalog: &GameCatalog, default_title_size: u32) -> Self {
        let mut state = Self::initial(catalog, default_title_size);
        let obj = match value {
            Some(Value::Object(obj)) => obj,
            Some(other) => {
                warn!("Ignoring persisted state of unexpected shape: {}", other);
                return state;
            }
            None => return state,
        };

        if let Some(generation) = obj.get("generation").and_then(Value::as_str) {
            if catalog.generation(generation).is_some() {
                if generation != state.generation {
                    state.game = catalog.games_for(generation).into_iter().next().unwrap_or_default();
                }
                state.generation = generation.to_string();
            } else {
                debug!("Persisted generation '{}' is not in the catalog", generation);
            }
        }

        if let Some(game) = obj.get("game").and_then(Value::as_str) {
            if catalog.games_for(&state.generation).iter().any(|g| g == game) {
                state.game = game.to_string();
            }
        }

        if let Some(index) = obj.get("index").and_then(Value::as_u64) {
            state.index = usize::try_from(index).unwrap_or(0);
        }

        if let Some(caught) = obj.get("caught").and_then(Value::as_object) {
            for (key, flag) in caught {
                if let (Ok(id), Some(flag)) = (key.trim().parse::<u32>(), flag.as_bool()) {
                    state.caught.insert(id, flag);
                }
            }
        }

        if let Some(size) = obj.get("title_size").and_then(Value::as_i64) {
            state.title_size = clamp_title_size(size);
        }

        state
    }

    pub fn is_caught(&self, id: u32) -> bool {
        self.caught.get(&id).copied().unwrap_or(false)
    }

    /// Switches to `generation`/`game`. An unknown generation is ignored; a game outside
    /// the generation falls back to its first game.
    pub fn select(&mut self, catalog: &GameCatalog, generation: &str, game: &str) -> bool {
        let games = catalog.games_for(generation);
        let first = match games.first() {
            Some(first) => first.clone(),
            None => {
                warn!("Ignoring selection of unknown generation '{}'", generation);
                return false;
            }
        };
        self.generation = generation.to_string();
        self.game = if games.iter().any(|g| g == game) { game.to_string() } else { first };
        self.index = 0;
        true
    }

    /// Pulls a stale index back into `0..len`; an empty list pins it to 0.
    pub fn clamp_index(&mut self, len: usize) -> bool {
        let clamped = self.index.min(len.saturating_sub(1));
        if clamped == self.index {
            return false;
        }
        debug!("Clamping index {} to {} (list of {})", self.index, clamped, len);
        self.index = clamped;
        true
    }

    pub fn next(&mut self, len: usize) -> bool {
        if len > 0 && self.index < len - 1 {
            self.index += 1;
            true
        } else {
            false
        }
    }

    pub fn prev(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    pub fn toggle(&mut self, id: u32) -> bool {
        let flag = !self.is_caught(id);
        self.caught.insert(id, flag);
        flag
    }

    /// Jumps to the entry with sprite `id`, if the list has one.
    pub fn set_current(&mut self, id: u32, list: &[GameEntry]) -> bool {
        match list.iter().position(|p| p.id == id) {
            Some(i) => {
                self.index = i;
                true
            }
            None => false,
        }
    }

    pub fn set_title_size(&mut self, size: i64) {
        self.title_size = clamp_title_size(size);
    }
}

fn clamp_title_size(size: i64) -> u32 {
    size.clamp(i64::from(MIN_TITLE_SIZE), i64::from(MAX_TITLE_SIZE)) as u32
}
