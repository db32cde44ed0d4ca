//! Catalog index: the id map and both name maps of one load pass.

use crate::reference::Category;
use crate::template::ItemTemplate;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Sentinel returned by name lookups that miss. Never a valid item id.
pub const NO_ITEM: u32 = 0;

/// Remove every space character, as the stripped-name map does
pub fn strip_spaces(name: &str) -> String {
    name.replace(' ', "")
}

/// An id claimed by templates of two categories (or twice by one)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdCollision {
    pub id: u32,
    pub replaced: Category,
    pub winner: Category,
}

/// Two distinct names that strip to the same key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCollision {
    pub key: String,
    pub replaced: u32,
    pub winner: u32,
}

/// Data-integrity findings of one index build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub id_collisions: Vec<IdCollision>,
    pub name_collisions: Vec<NameCollision>,
}

impl IndexReport {
    pub fn collision_count(&self) -> usize {
        self.id_collisions.len() + self.name_collisions.len()
    }
}

/// One immutable, internally consistent view of the catalog
#[derive(Debug, Default)]
pub struct Snapshot {
    generation: u64,
    by_id: HashMap<u32, Arc<ItemTemplate>>,
    by_name: HashMap<String, u32>,
    by_stripped_name: HashMap<String, u32>,
    counts: BTreeMap<Category, usize>,
}

impl Snapshot {
    /// Load pass that produced this snapshot, starting at 1
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn template(&self, id: u32) -> Option<&Arc<ItemTemplate>> {
        self.by_id.get(&id)
    }

    /// Exact name match, `NO_ITEM` on miss
    pub fn id_by_name(&self, name: &str) -> u32 {
        self.by_name.get(name).copied().unwrap_or(NO_ITEM)
    }

    /// Match ignoring spaces on both sides, `NO_ITEM` on miss
    pub fn id_by_name_without_space(&self, name: &str) -> u32 {
        self.by_stripped_name
            .get(&strip_spaces(name))
            .copied()
            .unwrap_or(NO_ITEM)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Templates in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ItemTemplate>> {
        self.by_id.values()
    }

    pub fn count(&self, category: Category) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    /// Per-category template counts, in category order
    pub fn counts(&self) -> &BTreeMap<Category, usize> {
        &self.counts
    }

    /// Every name entry resolves to a template carrying that name
    pub fn is_consistent(&self) -> bool {
        let exact = self.by_name.iter().all(|(name, id)| {
            self.by_id.get(id).is_some_and(|t| t.name() == name)
        });
        let stripped = self.by_stripped_name.iter().all(|(key, id)| {
            self.by_id
                .get(id)
                .is_some_and(|t| strip_spaces(t.name()) == *key)
        });
        exact && stripped
    }
}

/// Assembles a `Snapshot` from builder output
pub struct CatalogIndex;

impl CatalogIndex {
    /// Index the batches in the order given. A later template replaces an
    /// earlier one with the same id, and a later name replaces an earlier
    /// one with the same key.
    pub fn build<I>(generation: u64, batches: I) -> (Snapshot, IndexReport)
    where
        I: IntoIterator<Item = Vec<ItemTemplate>>,
    {
        let mut report = IndexReport::default();
        let mut by_id: HashMap<u32, Arc<ItemTemplate>> = HashMap::new();
        let mut order: Vec<Arc<ItemTemplate>> = Vec::new();

        for template in batches.into_iter().flatten() {
            let template = Arc::new(template);
            if let Some(previous) = by_id.insert(template.id(), Arc::clone(&template)) {
                warn!(
                    "Item id {} defined twice: {} {:?} replaced by {} {:?}",
                    template.id(),
                    previous.category(),
                    previous.name(),
                    template.category(),
                    template.name()
                );
                report.id_collisions.push(IdCollision {
                    id: template.id(),
                    replaced: previous.category(),
                    winner: template.category(),
                });
            }
            order.push(template);
        }

        let mut by_name: HashMap<String, u32> = HashMap::new();
        let mut by_stripped_name: HashMap<String, u32> = HashMap::new();
        // Replaced templates are skipped so the name maps only point at survivors
        let survivors = order
            .iter()
            .filter(|t| by_id.get(&t.id()).is_some_and(|live| Arc::ptr_eq(live, t)));
        for template in survivors {
            let id = template.id();
            by_name.insert(template.name().to_string(), id);

            let key = strip_spaces(template.name());
            if let Some(previous) = by_stripped_name.insert(key.clone(), id) {
                if previous != id {
                    debug!("Name key {:?}: item {} replaced by {}", key, previous, id);
                    report.name_collisions.push(NameCollision {
                        key,
                        replaced: previous,
                        winner: id,
                    });
                }
            }
        }

        let mut counts = BTreeMap::new();
        for template in by_id.values() {
            *counts.entry(template.category()).or_insert(0) += 1;
        }

        let snapshot = Snapshot {
            generation,
            by_id,
            by_name,
            by_stripped_name,
            counts,
        };
        (snapshot, report)
    }
}
