//! Reference tables for item classification.
//!
//! Codes are the numeric values the game client expects; names are the raw
//! tokens found in the item tables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level item category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Consumable,
    Weapon,
    Armor,
}

impl Category {
    /// Index build order; a later category overwrites an earlier one on collision
    pub const BUILD_ORDER: [Category; 3] = [Self::Consumable, Self::Weapon, Self::Armor];

    /// Client-side category code
    pub fn code(&self) -> i32 {
        match self {
            Self::Consumable => 0,
            Self::Weapon => 1,
            Self::Armor => 2,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Consumable => write!(f, "consumable"),
            Self::Weapon => write!(f, "weapon"),
            Self::Armor => write!(f, "armor"),
        }
    }
}

/// Weapon kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeaponKind {
    pub code: i32,
    pub name: &'static str,
    /// Graphic class the client uses to draw the swing
    pub graphic_class: i32,
}

/// All weapon kinds
pub const WEAPON_KINDS: &[WeaponKind] = &[
    WeaponKind {
        code: 1,
        name: "sword",
        graphic_class: 4,
    },
    WeaponKind {
        code: 2,
        name: "twohandsword",
        graphic_class: 50,
    },
    WeaponKind {
        code: 3,
        name: "dagger",
        graphic_class: 46,
    },
    WeaponKind {
        code: 4,
        name: "bow",
        graphic_class: 20,
    },
    WeaponKind {
        code: 5,
        name: "arrow",
        graphic_class: 66,
    },
    WeaponKind {
        code: 6,
        name: "spear",
        graphic_class: 24,
    },
    WeaponKind {
        code: 7,
        name: "blunt",
        graphic_class: 11,
    },
    WeaponKind {
        code: 8,
        name: "staff",
        graphic_class: 40,
    },
    WeaponKind {
        code: 9,
        name: "claw",
        graphic_class: 58,
    },
    WeaponKind {
        code: 10,
        name: "dualsword",
        graphic_class: 54,
    },
    WeaponKind {
        code: 11,
        name: "gauntlet",
        graphic_class: 62,
    },
    WeaponKind {
        code: 12,
        name: "sting",
        graphic_class: 2922,
    },
    WeaponKind {
        code: 13,
        name: "chainsword",
        graphic_class: 24,
    },
    WeaponKind {
        code: 14,
        name: "kiringku",
        graphic_class: 58,
    },
];

pub fn weapon_kind_by_name(name: &str) -> Option<&'static WeaponKind> {
    WEAPON_KINDS.iter().find(|k| k.name == name)
}

/// Armor slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArmorKind {
    pub code: i32,
    pub name: &'static str,
    /// Use type of an item worn in this slot
    pub use_type: i32,
}

/// All armor slots
pub const ARMOR_KINDS: &[ArmorKind] = &[
    ArmorKind {
        code: 0,
        name: "none",
        use_type: -1,
    },
    ArmorKind {
        code: 1,
        name: "helm",
        use_type: 22,
    },
    ArmorKind {
        code: 2,
        name: "armor",
        use_type: 2,
    },
    ArmorKind {
        code: 3,
        name: "t_shirt",
        use_type: 18,
    },
    ArmorKind {
        code: 4,
        name: "cloak",
        use_type: 19,
    },
    ArmorKind {
        code: 5,
        name: "glove",
        use_type: 20,
    },
    ArmorKind {
        code: 6,
        name: "boots",
        use_type: 21,
    },
    ArmorKind {
        code: 7,
        name: "shield",
        use_type: 25,
    },
    ArmorKind {
        code: 8,
        name: "guarder",
        use_type: 25,
    },
    ArmorKind {
        code: 10,
        name: "amulet",
        use_type: 24,
    },
    ArmorKind {
        code: 11,
        name: "ring",
        use_type: 23,
    },
    ArmorKind {
        code: 12,
        name: "earring",
        use_type: 40,
    },
    ArmorKind {
        code: 13,
        name: "belt",
        use_type: 37,
    },
    ArmorKind {
        code: 14,
        name: "pattern_back",
        use_type: 45,
    },
    ArmorKind {
        code: 15,
        name: "pattern_left",
        use_type: 44,
    },
    ArmorKind {
        code: 16,
        name: "pattern_right",
        use_type: 43,
    },
    ArmorKind {
        code: 17,
        name: "talisman_left",
        use_type: 47,
    },
    ArmorKind {
        code: 18,
        name: "talisman_right",
        use_type: 48,
    },
];

pub fn armor_kind_by_name(name: &str) -> Option<&'static ArmorKind> {
    ARMOR_KINDS.iter().find(|k| k.name == name)
}

/// Accessory slots an "accessory" row can resolve to
pub const ACCESSORY_SLOTS: &[&str] = &["ring", "amulet", "earring", "belt"];

/// Accessory slot worn with the given use type, if any
pub fn accessory_by_use_type(use_type: i32) -> Option<&'static ArmorKind> {
    ARMOR_KINDS
        .iter()
        .filter(|k| ACCESSORY_SLOTS.contains(&k.name))
        .find(|k| k.use_type == use_type)
}

/// Consumable ("etc item") kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EtcKind {
    pub code: i32,
    pub name: &'static str,
}

/// All consumable kinds
pub const ETC_KINDS: &[EtcKind] = &[
    EtcKind {
        code: 0,
        name: "arrow",
    },
    EtcKind {
        code: 1,
        name: "wand",
    },
    EtcKind {
        code: 2,
        name: "light",
    },
    EtcKind {
        code: 3,
        name: "gem",
    },
    EtcKind {
        code: 4,
        name: "totem",
    },
    EtcKind {
        code: 5,
        name: "firecracker",
    },
    EtcKind {
        code: 6,
        name: "potion",
    },
    EtcKind {
        code: 7,
        name: "food",
    },
    EtcKind {
        code: 8,
        name: "scroll",
    },
    EtcKind {
        code: 9,
        name: "questitem",
    },
    EtcKind {
        code: 10,
        name: "spellbook",
    },
    EtcKind {
        code: 11,
        name: "petitem",
    },
    EtcKind {
        code: 12,
        name: "other",
    },
    EtcKind {
        code: 13,
        name: "material",
    },
    EtcKind {
        code: 14,
        name: "event",
    },
    EtcKind {
        code: 15,
        name: "sting",
    },
    EtcKind {
        code: 16,
        name: "treasure_box",
    },
    EtcKind {
        code: 18,
        name: "spellscroll",
    },
    EtcKind {
        code: 19,
        name: "spellwand",
    },
    EtcKind {
        code: 20,
        name: "spellicon",
    },
    EtcKind {
        code: 21,
        name: "protect_scroll",
    },
    EtcKind {
        code: 22,
        name: "unique_scroll",
    },
];

pub fn etc_kind_by_name(name: &str) -> Option<&'static EtcKind> {
    ETC_KINDS.iter().find(|k| k.name == name)
}

/// Item material
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Material {
    pub code: i32,
    pub name: &'static str,
}

pub const MATERIALS: &[Material] = &[
    Material {
        code: 0,
        name: "none",
    },
    Material {
        code: 1,
        name: "liquid",
    },
    Material {
        code: 2,
        name: "web",
    },
    Material {
        code: 3,
        name: "vegetation",
    },
    Material {
        code: 4,
        name: "animalmatter",
    },
    Material {
        code: 5,
        name: "paper",
    },
    Material {
        code: 6,
        name: "cloth",
    },
    Material {
        code: 7,
        name: "leather",
    },
    Material {
        code: 8,
        name: "wood",
    },
    Material {
        code: 9,
        name: "bone",
    },
    Material {
        code: 10,
        name: "dragonscale",
    },
    Material {
        code: 11,
        name: "iron",
    },
    Material {
        code: 12,
        name: "steel",
    },
    Material {
        code: 13,
        name: "copper",
    },
    Material {
        code: 14,
        name: "silver",
    },
    Material {
        code: 15,
        name: "gold",
    },
    Material {
        code: 16,
        name: "platinum",
    },
    Material {
        code: 17,
        name: "mithril",
    },
    Material {
        code: 18,
        name: "blackmithril",
    },
    Material {
        code: 19,
        name: "glass",
    },
    Material {
        code: 20,
        name: "gemstone",
    },
    Material {
        code: 21,
        name: "mineral",
    },
    Material {
        code: 22,
        name: "orichalcum",
    },
];

pub fn material_by_name(name: &str) -> Option<&'static Material> {
    MATERIALS.iter().find(|m| m.name == name)
}

/// Material used when the column is absent
pub fn default_material() -> &'static Material {
    &MATERIALS[0]
}

/// Use type tokens and their client codes
pub const USE_TYPES: &[(&str, i32)] = &[
    ("none", -1),
    ("normal", 0),
    ("weapon", 1),
    ("armor", 2),
    ("spell_long", 5),
    ("ntele", 6),
    ("identify", 7),
    ("res", 8),
    ("choice", 14),
    ("instrument", 15),
    ("sosc", 16),
    ("spell_short", 17),
    ("t_shirt", 18),
    ("cloak", 19),
    ("glove", 20),
    ("boots", 21),
    ("helm", 22),
    ("ring", 23),
    ("amulet", 24),
    ("shield", 25),
    ("guarder", 25),
    ("dai", 26),
    ("zel", 27),
    ("blank", 28),
    ("btele", 29),
    ("spell_buff", 30),
    ("belt", 37),
    ("spell_point", 39),
    ("earring", 40),
    ("fishing_rod", 42),
    ("pattern_right", 43),
    ("pattern_left", 44),
    ("pattern_back", 45),
    ("talisman_left", 47),
    ("talisman_right", 48),
    ("elixir", 58),
    ("healing", 59),
    ("cure", 60),
    ("haste", 61),
    ("brave", 62),
    ("third_speed", 63),
    ("magic_eye", 64),
    ("magic_healing", 65),
    ("bless_eva", 66),
    ("magic_regeneration", 67),
    ("wisdom", 68),
    ("flora", 69),
    ("poly", 70),
    ("npc_talk", 71),
    ("roulette", 72),
    ("teleport", 73),
    ("spawn", 74),
    ("furniture", 75),
    ("material", 77),
    ("extra", 78),
];

pub fn use_type_by_name(name: &str) -> Option<i32> {
    USE_TYPES.iter().find(|(n, _)| *n == name).map(|(_, c)| *c)
}

/// Use type carried by every weapon
pub const WEAPON_USE_TYPE: i32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weapon_kind_lookup() {
        let k = weapon_kind_by_name("twohandsword").unwrap();
        assert_eq!(k.code, 2);
        assert_eq!(k.graphic_class, 50);
        assert!(weapon_kind_by_name("twohand").is_none());
    }

    #[test]
    fn test_accessory_by_use_type() {
        assert_eq!(accessory_by_use_type(23).map(|k| k.name), Some("ring"));
        assert_eq!(accessory_by_use_type(24).map(|k| k.name), Some("amulet"));
        assert_eq!(accessory_by_use_type(37).map(|k| k.name), Some("belt"));
        assert_eq!(accessory_by_use_type(40).map(|k| k.name), Some("earring"));
        // helm use type is not an accessory
        assert!(accessory_by_use_type(22).is_none());
    }

    #[test]
    fn test_codes_are_unique_per_table() {
        let mut codes: Vec<i32> = ETC_KINDS.iter().map(|k| k.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), ETC_KINDS.len());

        let mut codes: Vec<i32> = ARMOR_KINDS.iter().map(|k| k.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), ARMOR_KINDS.len());
    }

    #[test]
    fn test_use_type_lookup() {
        assert_eq!(use_type_by_name("none"), Some(-1));
        assert_eq!(use_type_by_name("guarder"), Some(25));
        assert_eq!(use_type_by_name("wand"), None);
    }

    #[test]
    fn test_category_order() {
        assert_eq!(
            Category::BUILD_ORDER,
            [Category::Consumable, Category::Weapon, Category::Armor]
        );
        assert_eq!(Category::Armor.code(), 2);
    }
}
