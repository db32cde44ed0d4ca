//! Catalog command handlers (stats, get, find, reload)

use anyhow::{Context, Result};
use itemtable::{CatalogOptions, Category, ItemCatalog, LoadSummary, SqliteSource};
use std::path::Path;
use tracing::{debug, info};

/// Open the database and run the first load pass
pub fn open(db: &Path, options: CatalogOptions) -> Result<ItemCatalog<SqliteSource>> {
    debug!("Opening item database {}", db.display());
    let mut source = SqliteSource::open(db)
        .with_context(|| format!("Failed to open database {}", db.display()))?;
    if let Some(layout) = options.layout {
        source = source.with_layout(layout);
    }
    ItemCatalog::load(source, options).context("Failed to load item templates")
}

pub fn stats(db: &Path, options: CatalogOptions) -> Result<()> {
    let catalog = open(db, options)?;
    print_summary(&catalog.last_summary());
    Ok(())
}

pub fn get(db: &Path, options: CatalogOptions, id: u32) -> Result<()> {
    let catalog = open(db, options)?;
    match catalog.template(id) {
        Some(template) => {
            let json = serde_json::to_string_pretty(template.as_ref())
                .context("Failed to serialize template")?;
            println!("{}", json);
        }
        None => println!("No such item: {}", id),
    }
    Ok(())
}

pub fn find(db: &Path, options: CatalogOptions, name: &str, without_space: bool) -> Result<()> {
    let catalog = open(db, options)?;
    let id = if without_space {
        catalog.find_id_by_name_without_space(name)
    } else {
        catalog.find_id_by_name(name)
    };
    println!("{}", id);
    Ok(())
}

pub fn reload(db: &Path, options: CatalogOptions, times: u32) -> Result<()> {
    let catalog = open(db, options)?;
    println!("{}", catalog.last_summary());
    for i in 1..=times {
        info!("Reload {} of {}", i, times);
        let summary = catalog.reload().context("Reload failed")?;
        println!("{}", summary);
    }
    Ok(())
}

fn print_summary(summary: &LoadSummary) {
    println!("{}", summary);
    println!();
    println!("Layout: {}", summary.layout);
    for category in Category::BUILD_ORDER {
        let count = summary.counts.get(&category).copied().unwrap_or(0);
        println!("  {:<12} {:>6}", category.to_string(), count);
    }

    if summary.unverified > 0 {
        println!();
        println!("Unverified fallbacks: {}", summary.unverified);
    }

    if !summary.skipped.is_empty() {
        println!();
        println!("Skipped rows ({}):", summary.skipped.len());
        for row in &summary.skipped {
            println!("  {}", row);
        }
    }

    if !summary.unmapped.is_empty() {
        println!();
        println!("Unmapped tokens:");
        for (field, token) in &summary.unmapped {
            println!("  {:<10} {:?}", field, token);
        }
    }

    let collisions = &summary.collisions;
    if collisions.collision_count() > 0 {
        println!();
        println!("Collisions:");
        for c in &collisions.id_collisions {
            println!("  id {}: {} replaced by {}", c.id, c.replaced, c.winner);
        }
        for c in &collisions.name_collisions {
            println!("  name {:?}: {} replaced by {}", c.key, c.replaced, c.winner);
        }
    }
}
