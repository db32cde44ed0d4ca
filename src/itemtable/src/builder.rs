//! Template builder.
//!
//! One builder per category. Each scans the whole row set and keeps the rows
//! that classify into its category, so the three legacy tables and the
//! merged table go through the same code. A bad row is recorded in the
//! `PassLog` and skipped; nothing here can fail the pass.

use crate::error::{MissingMapping, RowError, RowResult, SkippedRow};
use crate::normalize::{Kind, Normalized, Normalizer, RawItem, RawUseType, Resolution};
use crate::reference::{self, material_by_name, Category};
use crate::row::{RowRef, Table, Value};
use crate::source::{RowSet, ARMORS, ETC_ITEMS, WEAPONS};
use crate::template::{
    ArmorTemplate, ClassFlags, ConsumableTemplate, EnchantBonus, ItemHeader, ItemTemplate,
    StatBonus, WeaponTemplate,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Columns every row must have
pub const REQUIRED_COLUMNS: &[&str] = &[
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
];

/// Columns holding the raw kind token, in lookup order
const TYPE_COLUMNS: &[&str] = &["type", "item_type"];

/// Diagnostics collected over one load pass, shared by the three builders
#[derive(Debug, Default)]
pub struct PassLog {
    skipped: BTreeMap<(String, usize), SkippedRow>,
    unmapped: BTreeSet<(&'static str, String)>,
    unverified: BTreeSet<u32>,
}

impl PassLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skipped row; a row seen by several builders is kept once
    fn skip(
        &mut self,
        table: &str,
        index: usize,
        item_id: Option<i64>,
        name: Option<String>,
        error: RowError,
    ) {
        let key = (table.to_string(), index);
        if self.skipped.contains_key(&key) {
            return;
        }
        let first_token = match &error {
            RowError::Mapping(m) => self.unmapped.insert((m.field, m.token.clone())),
            _ => true,
        };
        let row = SkippedRow {
            table: table.to_string(),
            item_id,
            name,
            error,
        };
        if first_token {
            warn!("Skipping row: {}", row);
        } else {
            debug!("Skipping row: {}", row);
        }
        self.skipped.insert(key, row);
    }

    fn unverified(&mut self, id: u32, name: &str, guess: &str) {
        if self.unverified.insert(id) {
            warn!("Item {} ({}): {} (unverified)", id, name, guess);
        }
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SkippedRow> {
        self.skipped.values()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Distinct (field, token) pairs with no mapping
    pub fn unmapped(&self) -> impl Iterator<Item = &(&'static str, String)> {
        self.unmapped.iter()
    }

    /// Templates built from a fallback guess (accessory slot, spell icon)
    pub fn unverified_count(&self) -> usize {
        self.unverified.len()
    }
}

/// Builds the templates of one category
#[derive(Debug, Clone, Copy)]
pub struct TemplateBuilder<'n> {
    target: Category,
    normalizer: &'n Normalizer,
}

impl<'n> TemplateBuilder<'n> {
    pub fn new(target: Category, normalizer: &'n Normalizer) -> Self {
        Self { target, normalizer }
    }

    pub fn target(&self) -> Category {
        self.target
    }

    /// Build every template of this builder's category
    pub fn build(&self, rows: &RowSet, log: &mut PassLog) -> Vec<ItemTemplate> {
        let mut templates = Vec::new();
        for table in &rows.tables {
            let table_category = match legacy_category(&table.name) {
                Some(c) if c != self.target => continue,
                other => other,
            };
            self.note_missing_optional(table);

            for (index, row) in table.rows().enumerate() {
                match self.build_row(&row, table_category) {
                    Ok(Some(t)) => {
                        if let Some(guess) = fallback_guess(&t) {
                            log.unverified(t.id(), t.name(), &guess);
                        }
                        templates.push(t);
                    }
                    Ok(None) => {}
                    Err(error) => {
                        let item_id = row.int64("id").ok();
                        let name = row.text_opt("name");
                        log.skip(&table.name, index, item_id, name, error);
                    }
                }
            }
        }
        debug!("Built {} {} templates", templates.len(), self.target);
        templates
    }

    fn note_missing_optional(&self, table: &Table) {
        let missing = EnchantBonus::COLUMNS
            .iter()
            .filter(|c| !table.columns.has(c))
            .count();
        if missing > 0 {
            debug!(
                "Table {} lacks {} of {} enchant bonus columns, using 0",
                table.name,
                missing,
                EnchantBonus::COLUMNS.len()
            );
        }
    }

    /// `Ok(None)` when the row belongs to another category
    fn build_row(
        &self,
        row: &RowRef<'_>,
        table_category: Option<Category>,
    ) -> RowResult<Option<ItemTemplate>> {
        let raw_id = row.int64("id")?;
        if raw_id <= 0 {
            return Err(RowError::ReservedId(raw_id));
        }
        let id = u32::try_from(raw_id).map_err(|_| RowError::OutOfRange {
            column: "id",
            value: raw_id,
        })?;

        let type_column = TYPE_COLUMNS
            .iter()
            .copied()
            .find(|c| row.columns().has(c))
            .ok_or(RowError::MissingColumn("type"))?;
        let type_token = row.text(type_column)?;
        let category_token = match table_category {
            Some(_) => None,
            None => row.text_opt("category"),
        };
        let raw = RawItem {
            item_id: raw_id,
            table_category,
            category_token: category_token.as_deref(),
            type_token: &type_token,
            use_type: raw_use_type(row)?,
            food_volume: row.int_or_zero("food_volume")?,
        };

        if self.normalizer.category(&raw)? != self.target {
            return Ok(None);
        }
        let normalized = self.normalizer.normalize(&raw)?;
        if normalized.resolution == Some(Resolution::Fallback) {
            debug!("Item {}: no consumable kind for {:?}, using other", id, type_token);
        }
        let header = read_header(row, id, &normalized)?;

        let template = match normalized.kind {
            Kind::Weapon(kind) => ItemTemplate::Weapon(read_weapon(row, header, kind)?),
            Kind::Armor(kind) => {
                ItemTemplate::Armor(read_armor(row, header, kind, normalized.unverified)?)
            }
            Kind::Consumable(kind) => ItemTemplate::Consumable(read_consumable(
                row,
                header,
                kind,
                normalized.unverified,
            )?),
        };
        Ok(Some(template))
    }
}

/// Category implied by a legacy table name; `None` for the merged table
fn legacy_category(table: &str) -> Option<Category> {
    match table.to_ascii_lowercase().as_str() {
        ETC_ITEMS => Some(Category::Consumable),
        WEAPONS => Some(Category::Weapon),
        ARMORS => Some(Category::Armor),
        _ => None,
    }
}

/// Numeric cells and numeric text are codes and must fit an `i32`; other
/// text is a token for the normalizer
fn raw_use_type<'a>(row: &RowRef<'a>) -> RowResult<RawUseType<'a>> {
    match row.value("use_type") {
        Some(Value::Text(t)) if t.trim().parse::<i64>().is_err() => {
            Ok(RawUseType::Token(t.as_str()))
        }
        _ => Ok(row
            .int_opt("use_type")?
            .map_or(RawUseType::Absent, RawUseType::Code)),
    }
}

/// What a template built from a fallback rule assumed
fn fallback_guess(template: &ItemTemplate) -> Option<String> {
    match template {
        ItemTemplate::Armor(a) if a.unverified_slot => Some(format!(
            "accessory slot not recognized, assuming {}",
            a.kind.name
        )),
        ItemTemplate::Consumable(c) if c.unverified_kind => Some(format!(
            "use type {} taken as {}",
            c.header.use_type, c.kind.name
        )),
        _ => None,
    }
}

fn read_header(row: &RowRef<'_>, id: u32, normalized: &Normalized) -> RowResult<ItemHeader> {
    for column in REQUIRED_COLUMNS {
        if !row.columns().has(column) {
            return Err(RowError::MissingColumn(*column));
        }
    }
    let name = row.text("name")?;
    let material = match row.text_opt("material") {
        None => reference::default_material(),
        Some(token) => {
            let token = token.trim().to_ascii_lowercase();
            material_by_name(&token).ok_or(MissingMapping {
                item_id: i64::from(id),
                field: "material",
                token,
            })?
        }
    };

    Ok(ItemHeader {
        id,
        unidentified_name_id: row.text_opt("unidentified_name_id").unwrap_or_else(|| name.clone()),
        identified_name_id: row.text_opt("identified_name_id").unwrap_or_else(|| name.clone()),
        name,
        material,
        weight: row.int("weight")?,
        inv_gfx_id: row.int("inv_gfx_id")?,
        grd_gfx_id: row.int("grd_gfx_id")?,
        item_desc_id: row.int_or_zero("item_desc_id")?,
        min_level: row.int("min_level")?,
        max_level: row.int("max_level")?,
        bless: row.int("bless")?,
        tradable: row.flag("tradable")?,
        deletable: row.flag("deletable")?,
        sealable: row.flag_or_false("sealable")?,
        dmg_small: row.int_or_zero("dmg_small")?,
        dmg_large: row.int_or_zero("dmg_large")?,
        use_type: normalized.use_type,
        charge_time: row.int_or_zero("charge_time")?,
        expiration_time: row.text_opt("expiration_time").filter(|s| !s.is_empty()),
        enchant_bonus: read_enchant_bonus(row)?,
    })
}

fn read_enchant_bonus(row: &RowRef<'_>) -> RowResult<EnchantBonus> {
    let mut values = [0; 31];
    for (slot, column) in values.iter_mut().zip(EnchantBonus::COLUMNS) {
        *slot = row.int_or_zero(*column)?;
    }
    Ok(EnchantBonus::from_values(&values))
}

fn read_classes(row: &RowRef<'_>) -> RowResult<ClassFlags> {
    Ok(ClassFlags {
        royal: row.flag_or_false("use_royal")?,
        knight: row.flag_or_false("use_knight")?,
        elf: row.flag_or_false("use_elf")?,
        wizard: row.flag_or_false("use_wizard")?,
        darkelf: row.flag_or_false("use_darkelf")?,
        dragonknight: row.flag_or_false("use_dragonknight")?,
        illusionist: row.flag_or_false("use_illusionist")?,
    })
}

fn read_stats(row: &RowRef<'_>) -> RowResult<StatBonus> {
    Ok(StatBonus {
        str: row.small_or_zero("str")?,
        dex: row.small_or_zero("dex")?,
        con: row.small_or_zero("con")?,
        int: row.small_or_zero("int")?,
        wis: row.small_or_zero("wis")?,
        cha: row.small_or_zero("cha")?,
        hp: row.int_or_zero("hp")?,
        mp: row.int_or_zero("mp")?,
        hpr: row.int_or_zero("hpr")?,
        mpr: row.int_or_zero("mpr")?,
        sp: row.int_or_zero("sp")?,
        mr: row.int_or_zero("mr")?,
    })
}

fn read_weapon(
    row: &RowRef<'_>,
    mut header: ItemHeader,
    kind: &'static reference::WeaponKind,
) -> RowResult<WeaponTemplate> {
    header.dmg_small = row.int("dmg_small")?;
    header.dmg_large = row.int("dmg_large")?;
    Ok(WeaponTemplate {
        kind,
        two_handed: row.flag_or_false("is_twohanded")?,
        range: row.int("range")?,
        safe_enchant: row.int_or_zero("safe_enchant")?,
        classes: read_classes(row)?,
        hit_modifier: row.int_or_zero("hit_modifier")?,
        dmg_modifier: row.int_or_zero("dmg_modifier")?,
        magic_dmg_modifier: row.int_or_zero("magic_dmg_modifier")?,
        stats: read_stats(row)?,
        double_dmg_chance: row.int_or_zero("double_dmg_chance")?,
        weakness_exposure: row.int_or_zero("weakness_exposure")?,
        can_be_damaged: row.flag_or_false("can_be_dmg")?,
        haste: row.flag_or_false("is_haste")?,
        header,
    })
}

fn read_armor(
    row: &RowRef<'_>,
    header: ItemHeader,
    kind: &'static reference::ArmorKind,
    unverified_slot: bool,
) -> RowResult<ArmorTemplate> {
    Ok(ArmorTemplate {
        kind,
        unverified_slot,
        grade: row.int_or_zero("grade")?,
        ac: row.int("ac")?,
        safe_enchant: row.int_or_zero("safe_enchant")?,
        classes: read_classes(row)?,
        stats: read_stats(row)?,
        damage_reduction: row.int_or_zero("damage_reduction")?,
        weight_reduction: row.int_or_zero("weight_reduction")?,
        hit_modifier: row.int_or_zero("hit_modifier")?,
        dmg_modifier: row.int_or_zero("dmg_modifier")?,
        bow_hit_modifier: row.int_or_zero("bow_hit_modifier")?,
        bow_dmg_modifier: row.int_or_zero("bow_dmg_modifier")?,
        defense_earth: row.int_or_zero("defense_earth")?,
        defense_water: row.int_or_zero("defense_water")?,
        defense_wind: row.int_or_zero("defense_wind")?,
        defense_fire: row.int_or_zero("defense_fire")?,
        resist_stun: row.int_or_zero("resist_stun")?,
        resist_stone: row.int_or_zero("resist_stone")?,
        resist_sleep: row.int_or_zero("resist_sleep")?,
        resist_freeze: row.int_or_zero("resist_freeze")?,
        resist_hold: row.int_or_zero("resist_hold")?,
        resist_blind: row.int_or_zero("resist_blind")?,
        haste: row.flag_or_false("is_haste")?,
        exp_bonus: row.int_or_zero("exp_bonus")?,
        potion_recovery_rate: row.int_or_zero("potion_recovery_rate")?,
        header,
    })
}

fn read_consumable(
    row: &RowRef<'_>,
    header: ItemHeader,
    kind: &'static reference::EtcKind,
    unverified_kind: bool,
) -> RowResult<ConsumableTemplate> {
    Ok(ConsumableTemplate {
        kind,
        unverified_kind,
        stackable: row.flag("stackable")?,
        food_volume: row.int_or_zero("food_volume")?,
        max_charge_count: row.int_or_zero("max_charge_count")?,
        delay_id: row.int_or_zero("delay_id")?,
        delay_time: row.int_or_zero("delay_time")?,
        delay_effect: row.int_or_zero("delay_effect")?,
        loc_x: row.int_or_zero("loc_x")?,
        loc_y: row.int_or_zero("loc_y")?,
        map_id: row.small_or_zero("map_id")?,
        save_at_once: row.flag_or_false("save_at_once")?,
        header,
    })
}
