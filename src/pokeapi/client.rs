use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, Proxy};
use crate::config::Config;
use crate::engine::sprites::{LookupOutcome, SpeciesLookup};
use crate::pokeapi::types::PokemonResource;
use log::debug;
use std::time::Duration;

pub struct PokeApiClient {
    client: Client,
    api_base: String,
}

impl PokeApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut client_builder = Client::builder()
            .timeout(Duration::from_secs(config.network.timeout_secs.max(1)));

        if let Some(ua) = &config.network.user_agent {
            client_builder = client_builder.user_agent(ua);
        } else {
            client_builder = client_builder.user_agent(concat!("livedex/", env!("CARGO_PKG_VERSION")));
        }

        if let Some(proxy_ip) = &config.network.proxy_ip {
            if let Some(proxy_port) = config.network.proxy_port {
                let proxy_url = format!("http://{}:{}", proxy_ip, proxy_port);
                let mut proxy = Proxy::all(&proxy_url)?;
                if let (Some(user), Some(pass)) = (&config.network.proxy_auth_user, &config.network.proxy_auth_password) {
                    proxy = proxy.basic_auth(user, pass);
                }
                client_builder = client_builder.proxy(proxy);
            }
        }

        let client = client_builder.build()?;

        Ok(Self {
            client,
            api_base: config.network.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn pokemon_url(&self, key: &str) -> String {
        format!("{}/pokemon/{}", self.api_base, key)
    }
}

#[async_trait]
impl SpeciesLookup for PokeApiClient {
    async fn lookup(&self, key: &str) -> Result<LookupOutcome> {
        if key.is_empty() || key.contains('/') {
            return Err(anyhow!("'{}' is not a valid species key", key));
        }

        let url = self.pokemon_url(key);
        debug!("GET {}", url);
        let res = self.client.get(&url).send().await?;

        if !res.status().is_success() {
            return Ok(LookupOutcome::Missing(res.status().as_u16()));
        }

        let body: PokemonResource = res.json().await?;
        debug!("Resolved '{}' to #{} ({})", key, body.id, body.name);
        Ok(LookupOutcome::Found(body.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pokemon_url() {
        let mut config = Config::default();
        config.network.api_base = "http://127.0.0.1:9/api/v2/".to_string();
        let client = PokeApiClient::new(&config).expect("client");
        assert_eq!(client.pokemon_url("mr-mime"), "http://127.0.0.1:9/api/v2/pokemon/mr-mime");
    }

    #[tokio::test]
    async fn test_unreachable_api_is_an_error() {
        let mut config = Config::default();
        config.network.api_base = "http://127.0.0.1:9".to_string();
        config.network.timeout_secs = 1;
        let client = PokeApiClient::new(&config).expect("client");
        assert!(client.lookup("pikachu").await.is_err());
        assert!(client.lookup("").await.is_err());
    }
}
