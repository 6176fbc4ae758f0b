use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use std::fs;
use url::Url;

pub const DEFAULT_CONFIG_PATH: &str = "livedex.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub network: NetworkConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DataConfig {
    pub catalog_path: PathBuf,
    pub state_path: PathBuf,
    pub sprite_cache_path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NetworkConfig {
    pub api_base: String,
    pub sprite_base: String,
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
    pub proxy_ip: Option<String>,
    pub proxy_port: Option<u16>,
    pub proxy_auth_user: Option<String>,
    pub proxy_auth_password: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DisplayConfig {
    pub default_title_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: "127.0.0.1:5000".to_string(),
            },
            data: DataConfig {
                catalog_path: PathBuf::from("data/games.json"),
                state_path: PathBuf::from("data/state.json"),
                sprite_cache_path: PathBuf::from("data/pokemon_cache.json"),
            },
            network: NetworkConfig {
                api_base: "https://pokeapi.co/api/v2".to_string(),
                sprite_base: "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon".to_string(),
                timeout_secs: 5,
                user_agent: None,
                proxy_ip: None,
                proxy_port: None,
                proxy_auth_user: None,
                proxy_auth_password: None,
            },
            display: DisplayConfig {
                default_title_size: 32,
            },
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading config {}", path.as_ref().display()))?;
        let mut config: Config = toml::from_str(&content)?;

        config.server.bind_addr = config.server.bind_addr.trim().to_string();
        config.network.api_base = config.network.api_base.trim().trim_end_matches('/').to_string();
        config.network.sprite_base = config.network.sprite_base.trim().trim_end_matches('/').to_string();

        Url::parse(&config.network.api_base).context("network.api_base is not a valid URL")?;
        Url::parse(&config.network.sprite_base).context("network.sprite_base is not a valid URL")?;

        Ok(config)
    }

    /// Loads the config at `path`, writing the defaults there first if the file is missing.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Config::load(path)
        } else {
            let cfg = Config::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
