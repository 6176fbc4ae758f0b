use anyhow::{anyhow, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounter {
    pub name: String,
    pub location: String,
}

/// Encounter table shared by every title of a slash-joined combo key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameCombo {
    pub key: String,
    pub entries: Vec<Encounter>,
}

impl GameCombo {
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.key.split('/').map(str::trim)
    }

    pub fn contains(&self, game: &str) -> bool {
        self.titles().any(|t| t == game)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub name: String,
    pub combos: Vec<GameCombo>,
}

impl Generation {
    /// Every individual title of this generation, in catalog order.
    pub fn games(&self) -> Vec<String> {
        self.combos
            .iter()
            .flat_map(|c| c.titles().map(str::to_string))
            .collect()
    }

    pub fn combo_for(&self, game: &str) -> Option<&GameCombo> {
        self.combos.iter().find(|c| c.contains(game))
    }
}

/// Immutable reference data. Generation and combo order follow the source file.
#[derive(Debug, Clone, Default)]
pub struct GameCatalog {
    generations: Vec<Generation>,
    known_games: BTreeSet<String>,
}

impl GameCatalog {
    pub fn new(generations: Vec<Generation>) -> Self {
        let known_games = generations
            .iter()
            .flat_map(|g| g.games())
            .collect();
        Self { generations, known_games }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading catalog {}", path.as_ref().display()))?;
        let catalog = Self::from_json_str(&content)?;
        info!(
            "Loaded catalog: {} generations, {} known games",
            catalog.generations.len(),
            catalog.known_games.len()
        );
        Ok(catalog)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(content)?;
        Self::from_value(root)
    }

    pub fn from_value(root: Value) -> Result<Self> {
        let gens = match root {
            Value::Object(map) => map,
            _ => return Err(anyhow!("catalog root must be an object of generations")),
        };

        let mut generations = Vec::with_capacity(gens.len());
        for (gen_name, combos_val) in gens {
            let combos_map = match combos_val {
                Value::Object(map) => map,
                _ => return Err(anyhow!("generation '{}' must map combo keys to lists", gen_name)),
            };
            let mut combos = Vec::with_capacity(combos_map.len());
            for (key, entries_val) in combos_map {
                let entries: Vec<Encounter> = serde_json::from_value(entries_val)
                    .with_context(|| format!("invalid encounter list for {} / {}", gen_name, key))?;
                combos.push(GameCombo { key, entries });
            }
            generations.push(Generation { name: gen_name, combos });
        }
        Ok(Self::new(generations))
    }

    pub fn to_value(&self) -> Value {
        let mut root = serde_json::Map::new();
        for generation in &self.generations {
            let mut combos = serde_json::Map::new();
            for combo in &generation.combos {
                combos.insert(combo.key.clone(), serde_json::json!(combo.entries));
            }
            root.insert(generation.name.clone(), Value::Object(combos));
        }
        Value::Object(root)
    }

    pub fn generations(&self) -> &[Generation] {
        &self.generations
    }

    pub fn into_generations(self) -> Vec<Generation> {
        self.generations
    }

    pub fn generation_names(&self) -> Vec<String> {
        self.generations.iter().map(|g| g.name.clone()).collect()
    }

    pub fn generation(&self, name: &str) -> Option<&Generation> {
        self.generations.iter().find(|g| g.name == name)
    }

    pub fn known_games(&self) -> &BTreeSet<String> {
        &self.known_games
    }

    /// Titles of `generation`; empty for an unknown generation.
    pub fn games_for(&self, generation: &str) -> Vec<String> {
        self.generation(generation).map(Generation::games).unwrap_or_default()
    }

    /// Encounters of the combo that contains `game` within `generation`.
    pub fn entries_for(&self, generation: &str, game: &str) -> &[Encounter] {
        self.generation(generation)
            .and_then(|g| g.combo_for(game))
            .map(|c| c.entries.as_slice())
            .unwrap_or(&[])
    }

    /// First generation and the first title of its first combo.
    pub fn default_selection(&self) -> Option<(String, String)> {
        let generation = self.generations.first()?;
        let game = generation.combos.first()?.titles().next()?.to_string();
        Some((generation.name.clone(), game))
    }
}
