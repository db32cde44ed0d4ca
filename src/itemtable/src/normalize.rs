//! Type normalization.
//!
//! Maps the raw category, type and use-type tokens of a row onto a canonical
//! category, kind and use-type code. Pure: the same input always yields the
//! same output, and nothing is logged here. The builder decides what to
//! report.

use crate::error::{ConfigError, MissingMapping};
use crate::reference::{
    self, accessory_by_use_type, armor_kind_by_name, etc_kind_by_name, use_type_by_name,
    weapon_kind_by_name, ArmorKind, Category, EtcKind, WeaponKind,
};
use crate::source::SchemaLayout;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ops::RangeInclusive;

/// Aliases applied in every layout
const COMMON_ALIASES: &[(&str, &str)] = &[
    ("twohand", "twohandsword"),
    ("axe", "blunt"),
    ("shirt", "t_shirt"),
    ("treasurebox", "treasure_box"),
];

/// Weapon aliases used by the merged table only. In the legacy layout
/// "wand" is a consumable kind.
const MERGED_WEAPON_ALIASES: &[(&str, &str)] = &[("wand", "staff")];

/// Category tokens of the merged table
const CONSUMABLE_CATEGORY_TOKENS: &[&str] = &["etc", "etcitem", "etc_item", "item", "consumable"];

const ACCESSORY: &str = "accessory";

/// Use-type token that marks spell icon display items
const SPELL_ICON_TOKENS: &[&str] = &["spell_icon", "spellicon"];

const POTION_USE_TYPES: RangeInclusive<i32> = 58..=69;
const MATERIAL_USE_TYPES: RangeInclusive<i32> = 77..=78;

fn is_scroll_use_type(code: i32) -> bool {
    matches!(code, 5..=17 | 26..=30 | 39 | 73)
}

/// Overridable fallbacks. The defaults reproduce the historical behavior,
/// which was never verified against the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Slot for an accessory whose use type names no accessory slot
    pub accessory_fallback: String,
    /// Reserved use-type code of spell icon display items; `None` disables it
    pub spell_icon_use_type: Option<i32>,
    /// Consumable kind forced for specific item ids
    #[serde(with = "id_keys")]
    pub id_overrides: BTreeMap<i64, String>,
}

/// Item ids as string map keys, which TOML requires
mod id_keys {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(map: &BTreeMap<i64, String>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_map(map.iter().map(|(id, kind)| (id.to_string(), kind)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<i64, String>, D::Error> {
        BTreeMap::<String, String>::deserialize(d)?
            .into_iter()
            .map(|(id, kind)| {
                id.trim()
                    .parse()
                    .map(|id| (id, kind))
                    .map_err(|_| D::Error::custom(format!("invalid item id {:?}", id)))
            })
            .collect()
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            accessory_fallback: "ring".to_string(),
            spell_icon_use_type: Some(99),
            id_overrides: BTreeMap::new(),
        }
    }
}

/// Use-type cell as found on the row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawUseType<'a> {
    Absent,
    Code(i32),
    Token(&'a str),
}

/// The classification inputs of one row
#[derive(Debug, Clone, Copy)]
pub struct RawItem<'a> {
    pub item_id: i64,
    /// Category implied by the legacy table the row came from
    pub table_category: Option<Category>,
    /// Free-text `category` column of the merged table
    pub category_token: Option<&'a str>,
    pub type_token: &'a str,
    pub use_type: RawUseType<'a>,
    pub food_volume: i32,
}

/// Canonical kind of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Weapon(&'static WeaponKind),
    Armor(&'static ArmorKind),
    Consumable(&'static EtcKind),
}

impl Kind {
    pub fn category(&self) -> Category {
        match self {
            Self::Weapon(_) => Category::Weapon,
            Self::Armor(_) => Category::Armor,
            Self::Consumable(_) => Category::Consumable,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Weapon(k) => k.name,
            Self::Armor(k) => k.name,
            Self::Consumable(k) => k.name,
        }
    }
}

/// How a consumable kind was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    IdOverride,
    SpellIcon,
    Token,
    FoodVolume,
    UseTypeBucket,
    Fallback,
}

/// Normalizer output for one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalized {
    pub kind: Kind,
    pub use_type: i32,
    /// The kind came from a fallback rule rather than from the data
    pub unverified: bool,
    /// Consumable cascade step that decided the kind
    pub resolution: Option<Resolution>,
}

impl Normalized {
    pub fn category(&self) -> Category {
        self.kind.category()
    }

    fn exact(kind: Kind, use_type: i32) -> Self {
        Self {
            kind,
            use_type,
            unverified: false,
            resolution: None,
        }
    }
}

/// Row classifier, chosen once per schema layout
#[derive(Debug, Clone)]
pub struct Normalizer {
    layout: SchemaLayout,
    accessory_fallback: &'static ArmorKind,
    spell_icon_use_type: Option<i32>,
    id_overrides: HashMap<i64, &'static EtcKind>,
}

impl Normalizer {
    pub fn new(layout: SchemaLayout, config: &NormalizerConfig) -> Result<Self, ConfigError> {
        let fallback = config.accessory_fallback.trim().to_ascii_lowercase();
        let accessory_fallback = armor_kind_by_name(&fallback)
            .filter(|k| reference::ACCESSORY_SLOTS.contains(&k.name))
            .ok_or_else(|| ConfigError::AccessoryFallback(config.accessory_fallback.clone()))?;

        let id_overrides = config
            .id_overrides
            .iter()
            .map(|(&item_id, kind)| {
                etc_kind_by_name(&kind.trim().to_ascii_lowercase())
                    .map(|k| (item_id, k))
                    .ok_or_else(|| ConfigError::OverrideKind {
                        item_id,
                        kind: kind.clone(),
                    })
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            layout,
            accessory_fallback,
            spell_icon_use_type: config.spell_icon_use_type,
            id_overrides,
        })
    }

    pub fn layout(&self) -> SchemaLayout {
        self.layout
    }

    /// Category of one row, without resolving its kind
    pub fn category(&self, raw: &RawItem<'_>) -> Result<Category, MissingMapping> {
        match raw.table_category {
            Some(c) => Ok(c),
            None => {
                let category_token = category_token(raw);
                self.category_of(raw.item_id, category_token.as_deref(), &canonical(raw.type_token))
            }
        }
    }

    /// Classify one row
    pub fn normalize(&self, raw: &RawItem<'_>) -> Result<Normalized, MissingMapping> {
        let token = canonical(raw.type_token);
        let accessory =
            token == ACCESSORY || category_token(raw).as_deref() == Some(ACCESSORY);

        match self.category(raw)? {
            Category::Weapon => self.weapon(raw.item_id, &token),
            Category::Armor if accessory => Ok(self.accessory(raw.use_type)),
            Category::Armor => self.armor(raw.item_id, &token),
            Category::Consumable => self.consumable(raw, &token),
        }
    }

    /// Resolve a raw use type to its client code
    pub fn use_type_code(&self, item_id: i64, raw: RawUseType<'_>) -> Result<i32, MissingMapping> {
        match raw {
            RawUseType::Absent => Ok(0),
            RawUseType::Code(c) => Ok(c),
            RawUseType::Token(t) => {
                let t = canonical(t);
                if let Ok(code) = t.parse::<i32>() {
                    return Ok(code);
                }
                if SPELL_ICON_TOKENS.contains(&t.as_str()) {
                    if let Some(code) = self.spell_icon_use_type {
                        return Ok(code);
                    }
                }
                use_type_by_name(&t).ok_or(MissingMapping {
                    item_id,
                    field: "use_type",
                    token: t,
                })
            }
        }
    }

    fn alias<'t>(&self, token: &'t str, weapon: bool) -> &'t str {
        let merged = weapon && self.layout == SchemaLayout::Merged;
        COMMON_ALIASES
            .iter()
            .chain(MERGED_WEAPON_ALIASES.iter().filter(|_| merged))
            .find(|(from, _)| *from == token)
            .map_or(token, |(_, to)| *to)
    }

    fn category_of(
        &self,
        item_id: i64,
        category_token: Option<&str>,
        token: &str,
    ) -> Result<Category, MissingMapping> {
        match category_token {
            Some("weapon") => Ok(Category::Weapon),
            Some("armor") | Some(ACCESSORY) => Ok(Category::Armor),
            Some(t) if CONSUMABLE_CATEGORY_TOKENS.contains(&t) => Ok(Category::Consumable),
            Some(t) => Err(MissingMapping {
                item_id,
                field: "category",
                token: t.to_string(),
            }),
            // No category column: weapon, then armor, then consumable
            None if weapon_kind_by_name(self.alias(token, true)).is_some() => Ok(Category::Weapon),
            None if token == ACCESSORY
                || armor_kind_by_name(self.alias(token, false)).is_some() =>
            {
                Ok(Category::Armor)
            }
            None => Ok(Category::Consumable),
        }
    }

    fn weapon(&self, item_id: i64, token: &str) -> Result<Normalized, MissingMapping> {
        weapon_kind_by_name(self.alias(token, true))
            .map(|k| Normalized::exact(Kind::Weapon(k), reference::WEAPON_USE_TYPE))
            .ok_or_else(|| MissingMapping {
                item_id,
                field: "type",
                token: token.to_string(),
            })
    }

    fn armor(&self, item_id: i64, token: &str) -> Result<Normalized, MissingMapping> {
        armor_kind_by_name(self.alias(token, false))
            .map(|k| Normalized::exact(Kind::Armor(k), k.use_type))
            .ok_or_else(|| MissingMapping {
                item_id,
                field: "type",
                token: token.to_string(),
            })
    }

    fn accessory(&self, raw: RawUseType<'_>) -> Normalized {
        let slot = match raw {
            RawUseType::Absent => None,
            RawUseType::Code(c) => accessory_by_use_type(c),
            RawUseType::Token(t) => {
                let t = canonical(t);
                t.parse::<i32>()
                    .ok()
                    .or_else(|| use_type_by_name(&t))
                    .and_then(accessory_by_use_type)
            }
        };
        match slot {
            Some(k) => Normalized::exact(Kind::Armor(k), k.use_type),
            None => Normalized {
                kind: Kind::Armor(self.accessory_fallback),
                use_type: self.accessory_fallback.use_type,
                unverified: true,
                resolution: None,
            },
        }
    }

    fn consumable(&self, raw: &RawItem<'_>, token: &str) -> Result<Normalized, MissingMapping> {
        let use_type = self.use_type_code(raw.item_id, raw.use_type)?;
        let (kind, resolution) =
            self.consumable_kind(raw.item_id, token, use_type, raw.food_volume);
        Ok(Normalized {
            kind: Kind::Consumable(kind),
            use_type,
            unverified: resolution == Resolution::SpellIcon,
            resolution: Some(resolution),
        })
    }

    /// Total: every input ends in some kind
    fn consumable_kind(
        &self,
        item_id: i64,
        token: &str,
        use_type: i32,
        food_volume: i32,
    ) -> (&'static EtcKind, Resolution) {
        if let Some(k) = self.id_overrides.get(&item_id) {
            return (*k, Resolution::IdOverride);
        }
        if self.spell_icon_use_type == Some(use_type) {
            return (etc_kind("spellicon"), Resolution::SpellIcon);
        }
        if let Some(k) = etc_kind_by_name(self.alias(token, false)) {
            return (k, Resolution::Token);
        }
        if food_volume > 0 {
            return (etc_kind("food"), Resolution::FoodVolume);
        }
        let bucket = if POTION_USE_TYPES.contains(&use_type) {
            Some("potion")
        } else if is_scroll_use_type(use_type) {
            Some("scroll")
        } else if MATERIAL_USE_TYPES.contains(&use_type) {
            Some("material")
        } else {
            None
        };
        match bucket {
            Some(name) => (etc_kind(name), Resolution::UseTypeBucket),
            None => (etc_kind("other"), Resolution::Fallback),
        }
    }
}

fn canonical(token: &str) -> String {
    token.trim().to_ascii_lowercase()
}

fn category_token(raw: &RawItem<'_>) -> Option<String> {
    raw.category_token.map(canonical).filter(|t| !t.is_empty())
}

/// Kinds named here are all present in `ETC_KINDS`
fn etc_kind(name: &str) -> &'static EtcKind {
    etc_kind_by_name(name).unwrap_or(&reference::ETC_KINDS[12])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy() -> Normalizer {
        Normalizer::new(SchemaLayout::Legacy, &NormalizerConfig::default()).unwrap()
    }

    fn merged() -> Normalizer {
        Normalizer::new(SchemaLayout::Merged, &NormalizerConfig::default()).unwrap()
    }

    fn raw<'a>(
        category: Option<Category>,
        token: &'a str,
        use_type: RawUseType<'a>,
    ) -> RawItem<'a> {
        RawItem {
            item_id: 100,
            table_category: category,
            category_token: None,
            type_token: token,
            use_type,
            food_volume: 0,
        }
    }

    #[test]
    fn test_weapon_aliases() {
        let n = legacy();
        let two = n
            .normalize(&raw(Some(Category::Weapon), "twohand", RawUseType::Absent))
            .unwrap();
        assert_eq!(two.kind.name(), "twohandsword");
        assert_eq!(two.use_type, 1);

        let axe = n
            .normalize(&raw(Some(Category::Weapon), "Axe", RawUseType::Absent))
            .unwrap();
        assert_eq!(axe.kind.name(), "blunt");
    }

    #[test]
    fn test_wand_alias_is_layout_specific() {
        let legacy_weapon =
            legacy().normalize(&raw(Some(Category::Weapon), "wand", RawUseType::Absent));
        assert_eq!(
            legacy_weapon.unwrap_err(),
            MissingMapping {
                item_id: 100,
                field: "type",
                token: "wand".to_string()
            }
        );

        let mut item = raw(None, "wand", RawUseType::Absent);
        item.category_token = Some("weapon");
        assert_eq!(merged().normalize(&item).unwrap().kind.name(), "staff");

        // consumable wands stay wands in both layouts
        let etc = legacy()
            .normalize(&raw(Some(Category::Consumable), "wand", RawUseType::Token("normal")))
            .unwrap();
        assert_eq!(etc.kind.name(), "wand");
    }

    #[test]
    fn test_shirt_alias() {
        let n = legacy()
            .normalize(&raw(Some(Category::Armor), "shirt", RawUseType::Absent))
            .unwrap();
        assert_eq!(n.kind.name(), "t_shirt");
        assert_eq!(n.use_type, 18);
    }

    #[test]
    fn test_accessory_resolution() {
        let n = legacy();
        let cases = [
            (RawUseType::Token("amulet"), "amulet"),
            (RawUseType::Token("earring"), "earring"),
            (RawUseType::Code(37), "belt"),
            (RawUseType::Token("23"), "ring"),
        ];
        for (use_type, expected) in cases {
            let out = n
                .normalize(&raw(Some(Category::Armor), "accessory", use_type))
                .unwrap();
            assert_eq!(out.kind.name(), expected);
            assert!(!out.unverified);
        }
    }

    #[test]
    fn test_accessory_fallback_is_flagged() {
        let out = legacy()
            .normalize(&raw(Some(Category::Armor), "accessory", RawUseType::Token("mystery")))
            .unwrap();
        assert_eq!(out.kind.name(), "ring");
        assert!(out.unverified);

        let config = NormalizerConfig {
            accessory_fallback: "amulet".to_string(),
            ..Default::default()
        };
        let n = Normalizer::new(SchemaLayout::Legacy, &config).unwrap();
        let out = n
            .normalize(&raw(Some(Category::Armor), "accessory", RawUseType::Absent))
            .unwrap();
        assert_eq!(out.kind.name(), "amulet");
        assert_eq!(out.use_type, 24);
    }

    #[test]
    fn test_invalid_config() {
        let config = NormalizerConfig {
            accessory_fallback: "helm".to_string(),
            ..Default::default()
        };
        assert_eq!(
            Normalizer::new(SchemaLayout::Legacy, &config).unwrap_err(),
            ConfigError::AccessoryFallback("helm".to_string())
        );

        let mut config = NormalizerConfig::default();
        config.id_overrides.insert(5, "pie".to_string());
        assert!(matches!(
            Normalizer::new(SchemaLayout::Legacy, &config),
            Err(ConfigError::OverrideKind { item_id: 5, .. })
        ));
    }

    #[test]
    fn test_consumable_cascade_order() {
        let mut config = NormalizerConfig::default();
        config.id_overrides.insert(100, "gem".to_string());
        let with_override = Normalizer::new(SchemaLayout::Legacy, &config).unwrap();

        // id override beats everything
        let out = with_override
            .normalize(&raw(Some(Category::Consumable), "potion", RawUseType::Code(99)))
            .unwrap();
        assert_eq!(out.kind.name(), "gem");
        assert_eq!(out.resolution, Some(Resolution::IdOverride));

        let n = legacy();
        // reserved spell icon code beats the free-text token
        let out = n
            .normalize(&raw(Some(Category::Consumable), "potion", RawUseType::Token("spell_icon")))
            .unwrap();
        assert_eq!(out.kind.name(), "spellicon");
        assert_eq!(out.use_type, 99);
        assert!(out.unverified);

        // token beats food volume
        let mut item = raw(Some(Category::Consumable), "scroll", RawUseType::Token("normal"));
        item.food_volume = 10;
        assert_eq!(n.normalize(&item).unwrap().kind.name(), "scroll");

        // food volume beats use-type buckets
        let mut item = raw(Some(Category::Consumable), "snack", RawUseType::Token("healing"));
        item.food_volume = 10;
        let out = n.normalize(&item).unwrap();
        assert_eq!(out.kind.name(), "food");
        assert_eq!(out.resolution, Some(Resolution::FoodVolume));
    }

    #[test]
    fn test_use_type_buckets_and_fallback() {
        let n = legacy();
        let bucket = |use_type| {
            n.normalize(&raw(Some(Category::Consumable), "unknown_thing", use_type))
                .unwrap()
                .kind
                .name()
        };
        assert_eq!(bucket(RawUseType::Token("healing")), "potion");
        assert_eq!(bucket(RawUseType::Token("ntele")), "scroll");
        assert_eq!(bucket(RawUseType::Token("teleport")), "scroll");
        assert_eq!(bucket(RawUseType::Token("material")), "material");
        assert_eq!(bucket(RawUseType::Token("normal")), "other");
        assert_eq!(bucket(RawUseType::Absent), "other");
    }

    #[test]
    fn test_spell_icon_override_can_be_disabled() {
        let config = NormalizerConfig {
            spell_icon_use_type: None,
            ..Default::default()
        };
        let n = Normalizer::new(SchemaLayout::Legacy, &config).unwrap();
        let err = n
            .normalize(&raw(Some(Category::Consumable), "other", RawUseType::Token("spell_icon")))
            .unwrap_err();
        assert_eq!(err.field, "use_type");

        // the code is no longer reserved
        let out = n
            .normalize(&raw(Some(Category::Consumable), "other", RawUseType::Code(99)))
            .unwrap();
        assert_eq!(out.kind.name(), "other");
    }

    #[test]
    fn test_unknown_use_type_token() {
        let err = legacy()
            .normalize(&raw(Some(Category::Consumable), "potion", RawUseType::Token("chug")))
            .unwrap_err();
        assert_eq!(err.token, "chug");
        assert_eq!(err.item_id, 100);
    }

    #[test]
    fn test_merged_category_inference() {
        let n = merged();
        let mut item = raw(None, "helm", RawUseType::Absent);
        assert_eq!(n.normalize(&item).unwrap().category(), Category::Armor);

        item.type_token = "dagger";
        assert_eq!(n.normalize(&item).unwrap().category(), Category::Weapon);

        item.type_token = "potion";
        item.use_type = RawUseType::Token("healing");
        assert_eq!(n.normalize(&item).unwrap().category(), Category::Consumable);

        item.type_token = "ring";
        item.category_token = Some("Accessory");
        item.use_type = RawUseType::Token("earring");
        assert_eq!(n.normalize(&item).unwrap().kind.name(), "earring");

        item.category_token = Some("furniture");
        assert_eq!(n.normalize(&item).unwrap_err().field, "category");
    }

    #[test]
    fn test_normalization_is_deterministic() {
        let n = merged();
        let item = RawItem {
            item_id: 40_308,
            table_category: None,
            category_token: Some("etcitem"),
            type_token: "mystery",
            use_type: RawUseType::Token("brave"),
            food_volume: 0,
        };
        let first = n.normalize(&item).unwrap();
        for _ in 0..10 {
            assert_eq!(n.normalize(&item).unwrap(), first);
        }
    }
}
