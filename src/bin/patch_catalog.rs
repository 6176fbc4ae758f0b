use anyhow::{anyhow, Result};

use livedex_rs::engine::catalog::GameCatalog;
use livedex_rs::engine::catalog_patch::{write_catalog, CatalogPatch};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let (catalog_path, patch_path) = match (args.next(), args.next()) {
        (Some(c), Some(p)) => (c, p),
        _ => return Err(anyhow!("usage: patch_catalog <games.json> <patch.toml>")),
    };

    let catalog = GameCatalog::load(&catalog_path)?;
    let patch = CatalogPatch::load(&patch_path)?;
    let (patched, report) = patch.apply(catalog)?;
    write_catalog(&patched, &catalog_path)?;

    println!(
        "Patched {}: {} locations relabeled, {} combos replaced",
        catalog_path, report.relabeled, report.replaced_combos
    );
    Ok(())
}
