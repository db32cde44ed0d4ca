//! Item templates.
//!
//! A template is the immutable description of an item type. Each category
//! variant composes the shared `ItemHeader` with only its own fields.

use crate::reference::{ArmorKind, Category, EtcKind, Material, WeaponKind};
use serde::Serialize;

/// Per-enchant-level bonus increments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnchantBonus {
    pub ac: i32,
    pub str: i32,
    pub dex: i32,
    pub con: i32,
    pub int: i32,
    pub wis: i32,
    pub cha: i32,
    pub hp: i32,
    pub hpr: i32,
    pub mp: i32,
    pub mpr: i32,
    pub mr: i32,
    pub sp: i32,
    pub hit_modifier: i32,
    pub dmg_modifier: i32,
    pub bow_hit_modifier: i32,
    pub bow_dmg_modifier: i32,
    pub weight_reduction: i32,
    pub damage_reduction: i32,
    pub defense_earth: i32,
    pub defense_water: i32,
    pub defense_fire: i32,
    pub defense_wind: i32,
    pub resist_stun: i32,
    pub resist_stone: i32,
    pub resist_sleep: i32,
    pub resist_freeze: i32,
    pub resist_hold: i32,
    pub resist_blind: i32,
    pub exp_bonus: i32,
    pub potion_recovery_rate: i32,
}

impl EnchantBonus {
    /// Optional columns holding the bonus, in field order
    pub const COLUMNS: &'static [&'static str] = &[
        "enchant_ac",
        "enchant_str",
        "enchant_dex",
        "enchant_con",
        "enchant_int",
        "enchant_wis",
        "enchant_cha",
        "enchant_hp",
        "enchant_hpr",
        "enchant_mp",
        "enchant_mpr",
        "enchant_mr",
        "enchant_sp",
        "enchant_hit_modifier",
        "enchant_dmg_modifier",
        "enchant_bow_hit_modifier",
        "enchant_bow_dmg_modifier",
        "enchant_weight_reduction",
        "enchant_damage_reduction",
        "enchant_defense_earth",
        "enchant_defense_water",
        "enchant_defense_fire",
        "enchant_defense_wind",
        "enchant_resist_stun",
        "enchant_resist_stone",
        "enchant_resist_sleep",
        "enchant_resist_freeze",
        "enchant_resist_hold",
        "enchant_resist_blind",
        "enchant_exp_bonus",
        "enchant_potion_recovery_rate",
    ];

    /// Build from values given in `COLUMNS` order
    pub fn from_values(v: &[i32; 31]) -> Self {
        Self {
            ac: v[0],
            str: v[1],
            dex: v[2],
            con: v[3],
            int: v[4],
            wis: v[5],
            cha: v[6],
            hp: v[7],
            hpr: v[8],
            mp: v[9],
            mpr: v[10],
            mr: v[11],
            sp: v[12],
            hit_modifier: v[13],
            dmg_modifier: v[14],
            bow_hit_modifier: v[15],
            bow_dmg_modifier: v[16],
            weight_reduction: v[17],
            damage_reduction: v[18],
            defense_earth: v[19],
            defense_water: v[20],
            defense_fire: v[21],
            defense_wind: v[22],
            resist_stun: v[23],
            resist_stone: v[24],
            resist_sleep: v[25],
            resist_freeze: v[26],
            resist_hold: v[27],
            resist_blind: v[28],
            exp_bonus: v[29],
            potion_recovery_rate: v[30],
        }
    }

    /// Values in `COLUMNS` order
    pub fn values(&self) -> [i32; 31] {
        [
            self.ac,
            self.str,
            self.dex,
            self.con,
            self.int,
            self.wis,
            self.cha,
            self.hp,
            self.hpr,
            self.mp,
            self.mpr,
            self.mr,
            self.sp,
            self.hit_modifier,
            self.dmg_modifier,
            self.bow_hit_modifier,
            self.bow_dmg_modifier,
            self.weight_reduction,
            self.damage_reduction,
            self.defense_earth,
            self.defense_water,
            self.defense_fire,
            self.defense_wind,
            self.resist_stun,
            self.resist_stone,
            self.resist_sleep,
            self.resist_freeze,
            self.resist_hold,
            self.resist_blind,
            self.exp_bonus,
            self.potion_recovery_rate,
        ]
    }

    /// Total bonus at an enchant level (negative levels give no bonus)
    pub fn at_level(&self, level: i32) -> Self {
        let level = level.max(0);
        let mut v = self.values();
        for x in &mut v {
            *x = x.saturating_mul(level);
        }
        Self::from_values(&v)
    }

    pub fn is_zero(&self) -> bool {
        self.values().iter().all(|&v| v == 0)
    }
}

/// Stat bonuses granted while equipped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatBonus {
    pub str: i16,
    pub dex: i16,
    pub con: i16,
    pub int: i16,
    pub wis: i16,
    pub cha: i16,
    pub hp: i32,
    pub mp: i32,
    pub hpr: i32,
    pub mpr: i32,
    pub sp: i32,
    pub mr: i32,
}

/// Character classes allowed to equip the item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassFlags {
    pub royal: bool,
    pub knight: bool,
    pub elf: bool,
    pub wizard: bool,
    pub darkelf: bool,
    pub dragonknight: bool,
    pub illusionist: bool,
}

impl ClassFlags {
    pub fn any(&self) -> bool {
        self.royal
            || self.knight
            || self.elf
            || self.wizard
            || self.darkelf
            || self.dragonknight
            || self.illusionist
    }
}

/// Fields shared by every category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemHeader {
    pub id: u32,
    pub name: String,
    pub unidentified_name_id: String,
    pub identified_name_id: String,
    pub material: &'static Material,
    pub weight: i32,
    pub inv_gfx_id: i32,
    pub grd_gfx_id: i32,
    pub item_desc_id: i32,
    pub min_level: i32,
    pub max_level: i32,
    pub bless: i32,
    pub tradable: bool,
    pub deletable: bool,
    pub sealable: bool,
    pub dmg_small: i32,
    pub dmg_large: i32,
    pub use_type: i32,
    pub charge_time: i32,
    pub expiration_time: Option<String>,
    pub enchant_bonus: EnchantBonus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeaponTemplate {
    pub header: ItemHeader,
    pub kind: &'static WeaponKind,
    pub two_handed: bool,
    pub range: i32,
    pub safe_enchant: i32,
    pub classes: ClassFlags,
    pub hit_modifier: i32,
    pub dmg_modifier: i32,
    pub magic_dmg_modifier: i32,
    pub stats: StatBonus,
    pub double_dmg_chance: i32,
    pub weakness_exposure: i32,
    pub can_be_damaged: bool,
    pub haste: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArmorTemplate {
    pub header: ItemHeader,
    pub kind: &'static ArmorKind,
    /// The slot came from the accessory fallback, not from the row
    pub unverified_slot: bool,
    pub grade: i32,
    pub ac: i32,
    pub safe_enchant: i32,
    pub classes: ClassFlags,
    pub stats: StatBonus,
    pub damage_reduction: i32,
    pub weight_reduction: i32,
    pub hit_modifier: i32,
    pub dmg_modifier: i32,
    pub bow_hit_modifier: i32,
    pub bow_dmg_modifier: i32,
    pub defense_earth: i32,
    pub defense_water: i32,
    pub defense_wind: i32,
    pub defense_fire: i32,
    pub resist_stun: i32,
    pub resist_stone: i32,
    pub resist_sleep: i32,
    pub resist_freeze: i32,
    pub resist_hold: i32,
    pub resist_blind: i32,
    pub haste: bool,
    pub exp_bonus: i32,
    pub potion_recovery_rate: i32,
}

/// Consumable ("etc item") template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumableTemplate {
    pub header: ItemHeader,
    pub kind: &'static EtcKind,
    /// Kind taken from the reserved spell icon use type, not from the data
    pub unverified_kind: bool,
    pub stackable: bool,
    pub food_volume: i32,
    pub max_charge_count: i32,
    pub delay_id: i32,
    pub delay_time: i32,
    pub delay_effect: i32,
    pub loc_x: i32,
    pub loc_y: i32,
    pub map_id: i16,
    pub save_at_once: bool,
}

/// An item template of any category
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum ItemTemplate {
    Weapon(WeaponTemplate),
    Armor(ArmorTemplate),
    Consumable(ConsumableTemplate),
}

impl ItemTemplate {
    pub fn header(&self) -> &ItemHeader {
        match self {
            Self::Weapon(w) => &w.header,
            Self::Armor(a) => &a.header,
            Self::Consumable(c) => &c.header,
        }
    }

    pub fn id(&self) -> u32 {
        self.header().id
    }

    pub fn name(&self) -> &str {
        &self.header().name
    }

    pub fn category(&self) -> Category {
        match self {
            Self::Weapon(_) => Category::Weapon,
            Self::Armor(_) => Category::Armor,
            Self::Consumable(_) => Category::Consumable,
        }
    }

    /// Name of the weapon kind, armor slot or consumable kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Weapon(w) => w.kind.name,
            Self::Armor(a) => a.kind.name,
            Self::Consumable(c) => c.kind.name,
        }
    }

    pub fn enchant_bonus(&self) -> &EnchantBonus {
        &self.header().enchant_bonus
    }

    pub fn as_weapon(&self) -> Option<&WeaponTemplate> {
        match self {
            Self::Weapon(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_armor(&self) -> Option<&ArmorTemplate> {
        match self {
            Self::Armor(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_consumable(&self) -> Option<&ConsumableTemplate> {
        match self {
            Self::Consumable(c) => Some(c),
            _ => None,
        }
    }
}
