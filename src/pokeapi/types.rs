use serde::Deserialize;

/// The slice of `GET /pokemon/{name}` the tracker needs.
#[derive(Debug, Clone, Deserialize)]
pub struct PokemonResource {
    pub id: u32,
    pub name: String,
}
