use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;

use livedex_rs::config::{Config, DEFAULT_CONFIG_PATH};
use livedex_rs::engine::catalog::GameCatalog;
use livedex_rs::engine::sprites::{SpriteResolver, SpriteStore};
use livedex_rs::engine::store::JsonFileStore;
use livedex_rs::engine::tracker::Tracker;
use livedex_rs::pokeapi::client::PokeApiClient;
use livedex_rs::web::app::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Load config
    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load_or_create(&config_path)?;
    info!("Loaded config from {}", config_path);

    let catalog = GameCatalog::load(&config.data.catalog_path)?;

    let store = Arc::new(JsonFileStore::new(
        config.data.state_path.clone(),
        config.data.sprite_cache_path.clone(),
    ));
    let sprites = SpriteStore::load(store.clone())?;
    info!("{} sprites cached", sprites.len());

    let lookup = Arc::new(PokeApiClient::new(&config)?);
    let resolver = SpriteResolver::new(sprites, lookup, &config.network.sprite_base);
    let tracker = Tracker::new(catalog, resolver, store, config.display.default_title_size);

    let listener = TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.server.bind_addr))?;

    app::serve(listener, AppState::new(tracker)).await
}
