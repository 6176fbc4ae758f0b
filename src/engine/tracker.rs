use anyhow::Result;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::engine::catalog::GameCatalog;
use crate::engine::dex::{DexBuilder, DexEntry, GameEntry};
use crate::engine::sprites::SpriteResolver;
use crate::engine::state::TrackerState;
use crate::engine::store::StateRepository;

/// Everything a request needs: reference data, sprites and the state repository.
pub struct Tracker {
    catalog: GameCatalog,
    sprites: SpriteResolver,
    states: Arc<dyn StateRepository>,
    write_lock: Mutex<()>,
    default_title_size: u32,
}

impl Tracker {
    pub fn new(
        catalog: GameCatalog,
        sprites: SpriteResolver,
        states: Arc<dyn StateRepository>,
        default_title_size: u32,
    ) -> Self {
        Self {
            catalog,
            sprites,
            states,
            write_lock: Mutex::new(()),
            default_title_size,
        }
    }

    pub fn catalog(&self) -> &GameCatalog {
        &self.catalog
    }

    /// Serializes load-mutate-save sequences. Hold the guard until the state is saved.
    pub async fn begin_update(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Persisted state, or the default when there is none or it cannot be read.
    pub fn load_state(&self) -> TrackerState {
        let raw = match self.states.load_state() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Could not read tracker state: {:#}", e);
                None
            }
        };
        TrackerState::from_value(raw, &self.catalog, self.default_title_size)
    }

    /// Persisted state together with its game's list, index clamped into the list.
    pub async fn load_with_list(&self) -> (TrackerState, Vec<GameEntry>) {
        let mut state = self.load_state();
        let list = self.game_list(&state).await;
        state.clamp_index(list.len());
        (state, list)
    }

    pub fn save_state(&self, state: &TrackerState) -> Result<()> {
        debug!("Persisting state: {} / {} #{}", state.generation, state.game, state.index);
        self.states.save_state(state)
    }

    pub async fn game_list(&self, state: &TrackerState) -> Vec<GameEntry> {
        DexBuilder::new(&self.catalog, &self.sprites)
            .ordered_game_list(&state.generation, &state.game)
            .await
    }

    pub async fn dex_list(&self, generation: Option<&str>) -> Vec<DexEntry> {
        DexBuilder::new(&self.catalog, &self.sprites)
            .full_dex_list(generation)
            .await
    }
}
