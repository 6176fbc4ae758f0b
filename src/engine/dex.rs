use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::engine::catalog::GameCatalog;
use crate::engine::location::{parse_location, route_number};
use crate::engine::sprites::SpriteResolver;
use crate::engine::state::TrackerState;

/// Sort tier for locations that are neither starters nor routes.
const LAST_TIER: i64 = 9999;

/// One step of the traversal for the active game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameEntry {
    pub id: u32,
    pub name: String,
    pub location: String,
    pub img_url: String,
}

impl GameEntry {
    pub fn placeholder() -> Self {
        Self {
            id: 0,
            name: "Unknown".to_string(),
            location: String::new(),
            img_url: String::new(),
        }
    }
}

/// A species folded across every generation and game it appears in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DexEntry {
    pub id: u32,
    pub name: String,
    pub img_url: String,
    pub generations: Vec<String>,
    pub games: Vec<String>,
    pub locations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub index: usize,
    pub title_size: u32,
    pub caught_count: usize,
    pub total_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Dex,
    Catch,
}

impl SortMode {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("catch") => SortMode::Catch,
            _ => SortMode::Dex,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Dex => "dex",
            SortMode::Catch => "catch",
        }
    }
}

/// Traversal order: starters first, then routes by number, then everything else.
fn sort_tier(location: &str) -> i64 {
    let loc = location.to_lowercase();
    if loc.contains("starter") {
        -1
    } else {
        route_number(&loc).map_or(LAST_TIER, i64::from)
    }
}

fn traversal_order(a: &GameEntry, b: &GameEntry) -> Ordering {
    sort_tier(&a.location)
        .cmp(&sort_tier(&b.location))
        .then_with(|| a.name.cmp(&b.name))
}

pub struct DexBuilder<'a> {
    catalog: &'a GameCatalog,
    sprites: &'a SpriteResolver,
}

impl<'a> DexBuilder<'a> {
    pub fn new(catalog: &'a GameCatalog, sprites: &'a SpriteResolver) -> Self {
        Self { catalog, sprites }
    }

    /// Encounters available in `game`, in traversal order.
    pub async fn ordered_game_list(&self, generation: &str, game: &str) -> Vec<GameEntry> {
        let known = self.catalog.known_games();
        let available: Vec<_> = self
            .catalog
            .entries_for(generation, game)
            .iter()
            .map(|entry| (entry, parse_location(&entry.location, known)))
            .filter(|(_, parsed)| parsed.applies_to(game))
            .collect();
        let names: Vec<&str> = available.iter().map(|(entry, _)| entry.name.as_str()).collect();
        let infos = self.sprites.resolve_all(names).await;

        let mut list: Vec<GameEntry> = available
            .into_iter()
            .zip(infos)
            .map(|((entry, parsed), info)| GameEntry {
                id: info.id,
                name: entry.name.clone(),
                location: parsed.base,
                img_url: info.img_url,
            })
            .collect();
        list.sort_by(traversal_order);
        list
    }

    /// One record per sprite id across the whole catalog, sorted by id.
    pub async fn full_dex_list(&self, filter_generation: Option<&str>) -> Vec<DexEntry> {
        struct Fold {
            name: String,
            img_url: String,
            generations: BTreeSet<String>,
            games: BTreeSet<String>,
            locations: BTreeMap<String, String>,
        }

        let known = self.catalog.known_games();
        let names = self
            .catalog
            .generations()
            .iter()
            .flat_map(|g| g.combos.iter())
            .flat_map(|c| c.entries.iter())
            .map(|e| e.name.as_str())
            .collect::<Vec<&str>>();
        let mut infos = self.sprites.resolve_all(names).await.into_iter();
        let mut all: BTreeMap<u32, Fold> = BTreeMap::new();

        for generation in self.catalog.generations() {
            for combo in &generation.combos {
                let base_games: Vec<&str> = combo.titles().collect();
                for entry in &combo.entries {
                    let parsed = parse_location(&entry.location, known);
                    let Some(info) = infos.next() else {
                        break;
                    };
                    let p = all.entry(info.id).or_insert_with(|| Fold {
                        name: entry.name.clone(),
                        img_url: info.img_url.clone(),
                        generations: BTreeSet::new(),
                        games: BTreeSet::new(),
                        locations: BTreeMap::new(),
                    });
                    p.generations.insert(generation.name.clone());

                    let games: Vec<&str> = if parsed.variants.is_empty() {
                        base_games.clone()
                    } else {
                        parsed.variants.iter().map(String::as_str).collect()
                    };
                    for g in games {
                        p.games.insert(g.to_string());
                        p.locations.insert(g.to_string(), parsed.base.clone());
                    }
                }
            }
        }

        all.into_iter()
            .filter(|(_, p)| filter_generation.map_or(true, |g| p.generations.contains(g)))
            .map(|(id, p)| DexEntry {
                id,
                name: p.name,
                img_url: p.img_url,
                generations: p.generations.into_iter().collect(),
                games: p.games.into_iter().collect(),
                locations: p.locations,
            })
            .collect()
    }
}

/// Entry at the state's index, clamping the index into range first.
pub fn current_pokemon(state: &mut TrackerState, list: &[GameEntry]) -> GameEntry {
    if list.is_empty() {
        return GameEntry::placeholder();
    }
    state.clamp_index(list.len());
    list[state.index].clone()
}

pub fn progress(state: &TrackerState, dex: &[DexEntry]) -> Progress {
    Progress {
        index: state.index,
        title_size: state.title_size,
        caught_count: dex.iter().filter(|p| state.is_caught(p.id)).count(),
        total_count: dex.len(),
    }
}

/// Reorders `dex` to follow the game's traversal order; species not in it go last.
pub fn sort_by_catch_order(dex: &mut [DexEntry], list: &[GameEntry]) {
    let mut order: HashMap<u32, usize> = HashMap::new();
    for (i, p) in list.iter().enumerate() {
        order.insert(p.id, i);
    }
    dex.sort_by_key(|p| order.get(&p.id).copied().unwrap_or(usize::MAX));
}

/// Splits into (uncaught, caught), preserving order.
pub fn partition_caught(dex: Vec<DexEntry>, state: &TrackerState) -> (Vec<DexEntry>, Vec<DexEntry>) {
    let (caught, uncaught): (Vec<_>, Vec<_>) = dex.into_iter().partition(|p| state.is_caught(p.id));
    (uncaught, caught)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::sprites::{LookupOutcome, SpeciesLookup, SpriteStore};
    use crate::engine::store::JsonFileStore;
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    struct TableLookup;

    #[async_trait]
    impl SpeciesLookup for TableLookup {
        async fn lookup(&self, key: &str) -> Result<LookupOutcome> {
            let id = match key {
                "bulbasaur" => 1,
                "charmander" => 4,
                "squirtle" => 7,
                "pidgey" => 16,
                "rattata" => 19,
                "spearow" => 21,
                "ekans" => 23,
                "sandshrew" => 27,
                "zubat" => 41,
                "oddish" => 43,
                "chikorita" => 152,
                _ => return Ok(LookupOutcome::Missing(404)),
            };
            Ok(LookupOutcome::Found(id))
        }
    }

    fn catalog() -> GameCatalog {
        GameCatalog::from_value(json!({
            "Generation I": {
                "Red/Blue": [
                    {"name": "Zubat", "location": "Mt. Moon"},
                    {"name": "Spearow", "location": "Route 22"},
                    {"name": "Rattata", "location": "Route 1"},
                    {"name": "Pidgey", "location": "Route 1"},
                    {"name": "Squirtle", "location": "Starter"},
                    {"name": "Bulbasaur", "location": "Starter"},
                    {"name": "Ekans", "location": "Route 4 (Red)"},
                    {"name": "Sandshrew", "location": "Route 4 (Blue)"},
                    {"name": "Oddish", "location": "Route 24 (rare)"}
                ],
                "Yellow": [
                    {"name": "Pidgey", "location": "Route 1"}
                ]
            },
            "Generation II": {
                "Gold/Silver": [
                    {"name": "Chikorita", "location": "Starter (New Bark Town)"},
                    {"name": "Pidgey", "location": "Route 29"},
                    {"name": "Zubat", "location": "Dark Cave"}
                ]
            }
        }))
        .expect("catalog")
    }

    fn resolver(dir: &std::path::Path) -> SpriteResolver {
        let repo = Arc::new(JsonFileStore::new(dir.join("state.json"), dir.join("cache.json")));
        let store = SpriteStore::load(repo).expect("store");
        SpriteResolver::new(store, Arc::new(TableLookup), "https://img.test")
    }

    #[tokio::test]
    async fn test_ordered_game_list() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sprites = resolver(dir.path());
        let catalog = catalog();
        let builder = DexBuilder::new(&catalog, &sprites);

        let red = builder.ordered_game_list("Generation I", "Red").await;
        let names: Vec<&str> = red.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Bulbasaur", "Squirtle", "Pidgey", "Rattata", "Ekans", "Spearow", "Oddish", "Zubat"]
        );
        assert_eq!(red[4].location, "Route 4");
        assert_eq!(red[6].location, "Route 24 (rare)");
        assert_eq!(red[0].img_url, "https://img.test/1.png");

        let blue = builder.ordered_game_list("Generation I", "Blue").await;
        assert!(blue.iter().any(|p| p.name == "Sandshrew"));
        assert!(!blue.iter().any(|p| p.name == "Ekans"));

        assert!(builder.ordered_game_list("Generation I", "Gold").await.is_empty());
    }

    #[tokio::test]
    async fn test_full_dex_list_folds_by_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sprites = resolver(dir.path());
        let catalog = catalog();
        let builder = DexBuilder::new(&catalog, &sprites);

        let dex = builder.full_dex_list(None).await;
        let ids: Vec<u32> = dex.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 7, 16, 19, 21, 23, 27, 41, 43, 152]);

        let pidgey = dex.iter().find(|p| p.id == 16).expect("pidgey");
        assert_eq!(pidgey.generations, vec!["Generation I", "Generation II"]);
        assert_eq!(pidgey.games, vec!["Blue", "Gold", "Red", "Silver", "Yellow"]);
        assert_eq!(pidgey.locations["Gold"], "Route 29");
        assert_eq!(pidgey.locations["Yellow"], "Route 1");

        let ekans = dex.iter().find(|p| p.id == 23).expect("ekans");
        assert_eq!(ekans.games, vec!["Red"]);
        assert_eq!(ekans.locations["Red"], "Route 4");

        let gen2 = builder.full_dex_list(Some("Generation II")).await;
        let ids: Vec<u32> = gen2.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![16, 41, 152]);
    }

    #[tokio::test]
    async fn test_catch_flow_example() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sprites = resolver(dir.path());
        let catalog = GameCatalog::from_value(json!({
            "GenI": {"Red/Blue": [
                {"name": "Bulbasaur", "location": "Starter"},
                {"name": "Pidgey", "location": "Route 1"}
            ]}
        }))
        .expect("catalog");
        let builder = DexBuilder::new(&catalog, &sprites);

        let mut state = TrackerState::initial(&catalog, 32);
        assert!(state.select(&catalog, "GenI", "Red"));
        let list = builder.ordered_game_list(&state.generation, &state.game).await;
        assert_eq!(list.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(), vec!["Bulbasaur", "Pidgey"]);

        let id = current_pokemon(&mut state, &list).id;
        state.toggle(id);
        state.next(list.len());
        let id = current_pokemon(&mut state, &list).id;
        state.toggle(id);
        assert!(state.is_caught(1));
        assert!(state.is_caught(16));

        let dex = builder.full_dex_list(Some("GenI")).await;
        let p = progress(&state, &dex);
        assert_eq!((p.caught_count, p.total_count), (2, 2));
    }

    #[test]
    fn test_current_pokemon_clamps_and_handles_empty() {
        let catalog = catalog();
        let mut state = TrackerState::initial(&catalog, 32);
        state.index = 7;
        assert_eq!(current_pokemon(&mut state, &[]), GameEntry::placeholder());
        assert_eq!(state.index, 7);

        let list = vec![GameEntry { id: 1, name: "Bulbasaur".into(), location: "Starter".into(), img_url: String::new() }];
        assert_eq!(current_pokemon(&mut state, &list).id, 1);
        assert_eq!(state.index, 0);
    }

    #[test]
    fn test_catch_sort_and_partition() {
        let dex_entry = |id: u32| DexEntry {
            id,
            name: id.to_string(),
            img_url: String::new(),
            generations: vec![],
            games: vec![],
            locations: BTreeMap::new(),
        };
        let game_entry = |id: u32| GameEntry { id, name: id.to_string(), location: String::new(), img_url: String::new() };

        let mut dex = vec![dex_entry(1), dex_entry(4), dex_entry(16), dex_entry(99)];
        sort_by_catch_order(&mut dex, &[game_entry(16), game_entry(1), game_entry(4)]);
        assert_eq!(dex.iter().map(|p| p.id).collect::<Vec<_>>(), vec![16, 1, 4, 99]);

        let mut state = TrackerState::initial(&catalog(), 32);
        state.toggle(1);
        state.toggle(99);
        state.toggle(99);
        let (uncaught, caught) = partition_caught(dex, &state);
        assert_eq!(uncaught.iter().map(|p| p.id).collect::<Vec<_>>(), vec![16, 4, 99]);
        assert_eq!(caught.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_sort_mode_parse() {
        assert_eq!(SortMode::parse(Some("catch")), SortMode::Catch);
        assert_eq!(SortMode::parse(Some("bogus")), SortMode::Dex);
        assert_eq!(SortMode::parse(None).as_str(), "dex");
    }
}
