//! Row fixtures shared by the unit tests.

use crate::row::Value;
use crate::source::{MemorySource, SchemaLayout, ARMORS, ETC_ITEMS, ITEMS, WEAPONS};

const COMMON: &[&str] = &[
    "id",
    "name",
    "weight",
    "inv_gfx_id",
    "grd_gfx_id",
    "bless",
    "tradable",
    "deletable",
    "min_level",
    "max_level",
    "material",
];

fn columns(extra: &[&'static str]) -> Vec<&'static str> {
    COMMON.iter().chain(extra).copied().collect()
}

fn common(id: i64, name: &str) -> Vec<(&'static str, Value)> {
    vec![
        ("id", Value::from(id)),
        ("name", Value::from(name)),
        ("weight", Value::from(100)),
        ("inv_gfx_id", Value::from(10)),
        ("grd_gfx_id", Value::from(20)),
        ("bless", Value::from(1)),
        ("tradable", Value::from(true)),
        ("deletable", Value::from(true)),
        ("min_level", Value::from(0)),
        ("max_level", Value::from(0)),
        ("material", Value::from("iron")),
    ]
}

pub fn weapon(id: i64, name: &str, kind: &str) -> Vec<(&'static str, Value)> {
    let mut cells = common(id, name);
    cells.extend([
        ("type", Value::from(kind)),
        ("dmg_small", Value::from(8)),
        ("dmg_large", Value::from(12)),
        ("range", Value::from(1)),
        ("safe_enchant", Value::from(6)),
    ]);
    cells
}

pub fn armor(id: i64, name: &str, kind: &str, use_type: &str) -> Vec<(&'static str, Value)> {
    let mut cells = common(id, name);
    cells.extend([
        ("type", Value::from(kind)),
        ("ac", Value::from(-3)),
        ("use_type", Value::from(use_type)),
    ]);
    cells
}

pub fn etc(id: i64, name: &str, kind: &str, use_type: &str) -> Vec<(&'static str, Value)> {
    let mut cells = common(id, name);
    cells.extend([
        ("item_type", Value::from(kind)),
        ("use_type", Value::from(use_type)),
        ("stackable", Value::from(true)),
    ]);
    cells
}

/// Empty legacy tables; the weapons table carries no enchant columns
pub fn legacy_tables() -> MemorySource {
    MemorySource::new(SchemaLayout::Legacy)
        .with_table(
            ETC_ITEMS,
            columns(&["item_type", "use_type", "stackable", "food_volume"]),
        )
        .with_table(
            WEAPONS,
            columns(&["type", "dmg_small", "dmg_large", "range", "safe_enchant"]),
        )
        .with_table(ARMORS, columns(&["type", "ac", "use_type", "enchant_ac"]))
}

/// A small legacy catalog
pub fn legacy_source() -> MemorySource {
    legacy_tables()
        .with_row(WEAPONS, weapon(1, "Fire Sword", "sword"))
        .with_row(WEAPONS, weapon(2, "Great Axe", "axe"))
        .with_row(ARMORS, armor(20_001, "Iron Helm", "helm", "helm"))
        .with_row(ARMORS, armor(20_002, "Ring of Wit", "accessory", "ring"))
        .with_row(ETC_ITEMS, etc(40_001, "Red Potion", "potion", "healing"))
        .with_row(ETC_ITEMS, etc(40_002, "Teleport Scroll", "mystery", "ntele"))
}

/// A merged `items` table
pub fn merged_source() -> MemorySource {
    let mut cols = columns(&[
        "category",
        "type",
        "use_type",
        "dmg_small",
        "dmg_large",
        "range",
        "ac",
        "stackable",
    ]);
    cols.push("enchant_ac");
    let mut source = MemorySource::new(SchemaLayout::Merged).with_table(ITEMS, cols);

    let mut wand = weapon(1, "Oak Wand", "wand");
    wand.push(("category", Value::from("weapon")));
    source.push_row(ITEMS, wand);

    let mut earring = armor(20_010, "Earring of Luck", "earring", "earring");
    earring.push(("category", Value::from("accessory")));
    source.push_row(ITEMS, earring);

    let mut cloak = armor(20_011, "Dark Cloak", "cloak", "cloak");
    cloak.push(("category", Value::from("armor")));
    source.push_row(ITEMS, cloak);

    let mut bread = common(40_010, "Bread");
    bread.extend([
        ("category", Value::from("etcitem")),
        ("type", Value::from("food")),
        ("use_type", Value::from("normal")),
        ("stackable", Value::from(true)),
    ]);
    source.push_row(ITEMS, bread);
    source
}
