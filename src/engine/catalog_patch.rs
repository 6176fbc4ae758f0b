use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::engine::catalog::{Encounter, GameCatalog, GameCombo};

/// Corrections to apply to a catalog file, read from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogPatch {
    #[serde(default, rename = "fix")]
    pub fixes: Vec<CatalogFix>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFix {
    pub generation: String,
    /// Combos whose locations are rewritten from the two maps below.
    #[serde(default)]
    pub combos: Vec<String>,
    /// Evolution -> pre-evolution. Matching entries become "Evolve <pre-evolution>".
    #[serde(default)]
    pub evolves_from: BTreeMap<String, String>,
    #[serde(default)]
    pub base_locations: BTreeMap<String, String>,
    #[serde(default)]
    pub replace: Vec<ComboReplacement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComboReplacement {
    pub combo: String,
    pub entries: Vec<Encounter>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchReport {
    pub relabeled: usize,
    pub replaced_combos: usize,
}

impl CatalogPatch {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading patch {}", path.as_ref().display()))?;
        Ok(toml::from_str(&content)?)
    }

    pub fn apply(&self, catalog: GameCatalog) -> Result<(GameCatalog, PatchReport)> {
        let mut generations = catalog.into_generations();
        let mut report = PatchReport::default();

        for fix in &self.fixes {
            let generation = generations
                .iter_mut()
                .find(|g| g.name == fix.generation)
                .ok_or_else(|| anyhow!("generation '{}' is not in the catalog", fix.generation))?;

            for combo_key in &fix.combos {
                let Some(combo) = generation.combos.iter_mut().find(|c| &c.key == combo_key) else {
                    warn!("Skipping unknown combo '{}' in {}", combo_key, fix.generation);
                    continue;
                };
                for entry in &mut combo.entries {
                    let location = match fix.evolves_from.get(&entry.name) {
                        Some(parent) => Some(format!("Evolve {}", parent)),
                        None => fix.base_locations.get(&entry.name).cloned(),
                    };
                    if let Some(location) = location {
                        if location != entry.location {
                            entry.location = location;
                            report.relabeled += 1;
                        }
                    }
                }
            }

            for replacement in &fix.replace {
                match generation.combos.iter_mut().find(|c| c.key == replacement.combo) {
                    Some(combo) => combo.entries = replacement.entries.clone(),
                    None => generation.combos.push(GameCombo {
                        key: replacement.combo.clone(),
                        entries: replacement.entries.clone(),
                    }),
                }
                report.replaced_combos += 1;
            }
        }

        info!(
            "Catalog patch: {} locations relabeled, {} combos replaced",
            report.relabeled, report.replaced_combos
        );
        Ok((GameCatalog::new(generations), report))
    }
}

/// Writes the catalog the way it is checked in: pretty JSON with a trailing newline.
pub fn write_catalog<P: AsRef<Path>>(catalog: &GameCatalog, path: P) -> Result<()> {
    let mut content = serde_json::to_string_pretty(&catalog.to_value())?;
    content.push('\n');
    fs::write(path.as_ref(), content)
        .with_context(|| format!("writing catalog {}", path.as_ref().display()))?;
    Ok(())
}
