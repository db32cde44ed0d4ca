//! Catalog facade and reload coordinator.
//!
//! Every load pass (fetch, normalize, build, index) produces a complete
//! `Snapshot` off to the side. Publication swaps one `Arc`, so a reader holds
//! either the old snapshot or the new one, never parts of both. Readers that
//! need several lookups to agree should take `snapshot()` once and query it.

use crate::builder::{PassLog, TemplateBuilder};
use crate::error::{CatalogError, SkippedRow, SourceError};
use crate::index::{CatalogIndex, IndexReport, Snapshot};
use crate::instance::{IdAllocator, ItemInstance};
use crate::normalize::{Normalizer, NormalizerConfig};
use crate::reference::Category;
use crate::source::{RowSource, SchemaLayout};
use crate::template::ItemTemplate;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Load options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogOptions {
    /// Force a schema layout; `None` uses the one the source reports
    pub layout: Option<SchemaLayout>,
    pub normalizer: NormalizerConfig,
}

/// Outcome of one successful load pass
#[derive(Debug, Clone)]
pub struct LoadSummary {
    pub generation: u64,
    pub layout: SchemaLayout,
    pub counts: BTreeMap<Category, usize>,
    pub skipped: Vec<SkippedRow>,
    /// Distinct (field, token) pairs with no mapping
    pub unmapped: Vec<(&'static str, String)>,
    pub unverified: usize,
    pub collisions: IndexReport,
    pub elapsed: Duration,
}

impl LoadSummary {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loading items...OK! {} items (", self.total())?;
        for (i, category) in Category::BUILD_ORDER.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let count = self.counts.get(category).copied().unwrap_or(0);
            write!(f, "{} {}", category, count)?;
        }
        write!(
            f,
            "), {} skipped, {} collisions, generation {}, {}ms",
            self.skipped.len(),
            self.collisions.collision_count(),
            self.generation,
            self.elapsed.as_millis()
        )
    }
}

/// A snapshot and the summary of the pass that built it, swapped as one
struct Published {
    snapshot: Arc<Snapshot>,
    summary: Arc<LoadSummary>,
}

/// The item template catalog
pub struct ItemCatalog<S> {
    source: S,
    options: CatalogOptions,
    legacy: Normalizer,
    merged: Normalizer,
    current: RwLock<Published>,
    reload_guard: Mutex<()>,
}

impl<S: RowSource> ItemCatalog<S> {
    /// Validate the options and run the first load pass
    pub fn load(source: S, options: CatalogOptions) -> Result<Self, CatalogError> {
        let legacy = Normalizer::new(SchemaLayout::Legacy, &options.normalizer)?;
        let merged = Normalizer::new(SchemaLayout::Merged, &options.normalizer)?;

        let mut catalog = Self {
            source,
            options,
            legacy,
            merged,
            current: RwLock::new(Published {
                snapshot: Arc::new(Snapshot::default()),
                summary: Arc::new(LoadSummary {
                    generation: 0,
                    layout: SchemaLayout::Legacy,
                    counts: BTreeMap::new(),
                    skipped: Vec::new(),
                    unmapped: Vec::new(),
                    unverified: 0,
                    collisions: IndexReport::default(),
                    elapsed: Duration::ZERO,
                }),
            }),
            reload_guard: Mutex::new(()),
        };

        let (snapshot, summary) = catalog.run_pass(1).map_err(CatalogError::InitialLoad)?;
        info!("{}", summary);
        *catalog.current.get_mut() = Published {
            snapshot: Arc::new(snapshot),
            summary: Arc::new(summary),
        };
        Ok(catalog)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn options(&self) -> &CatalogOptions {
        &self.options
    }

    /// The published snapshot. Lookups on it stay consistent with each
    /// other even if a reload publishes meanwhile.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read().snapshot)
    }

    pub fn template(&self, id: u32) -> Option<Arc<ItemTemplate>> {
        self.snapshot().template(id).cloned()
    }

    /// Exact name lookup; 0 on miss
    pub fn find_id_by_name(&self, name: &str) -> u32 {
        self.snapshot().id_by_name(name)
    }

    /// Lookup ignoring spaces; 0 on miss
    pub fn find_id_by_name_without_space(&self, name: &str) -> u32 {
        self.snapshot().id_by_name_without_space(name)
    }

    /// Summary of the pass behind the published snapshot
    pub fn last_summary(&self) -> Arc<LoadSummary> {
        Arc::clone(&self.current.read().summary)
    }

    /// The published snapshot together with the summary of its pass
    pub fn published(&self) -> (Arc<Snapshot>, Arc<LoadSummary>) {
        let current = self.current.read();
        (Arc::clone(&current.snapshot), Arc::clone(&current.summary))
    }

    /// Create a live instance of a template. No object id is consumed when
    /// the template does not exist.
    pub fn instantiate(&self, id: u32, ids: &dyn IdAllocator) -> Option<ItemInstance> {
        let template = self.template(id)?;
        Some(ItemInstance::new(ids.next_id(), template))
    }

    /// Rebuild and publish, waiting for any reload already running
    pub fn reload(&self) -> Result<LoadSummary, CatalogError> {
        let _guard = self.reload_guard.lock();
        self.rebuild()
    }

    /// Rebuild and publish, or fail at once if a reload is running
    pub fn try_reload(&self) -> Result<LoadSummary, CatalogError> {
        let _guard = self
            .reload_guard
            .try_lock()
            .ok_or(CatalogError::ReloadInProgress)?;
        self.rebuild()
    }

    /// Caller holds the reload guard
    fn rebuild(&self) -> Result<LoadSummary, CatalogError> {
        let previous = self.snapshot().generation();
        match self.run_pass(previous + 1) {
            Ok((snapshot, summary)) => {
                info!("{}", summary);
                *self.current.write() = Published {
                    snapshot: Arc::new(snapshot),
                    summary: Arc::new(summary.clone()),
                };
                Ok(summary)
            }
            Err(e) => {
                warn!("Reload failed, keeping generation {}: {}", previous, e);
                Err(CatalogError::ReloadFailed(e))
            }
        }
    }

    fn normalizer(&self, layout: SchemaLayout) -> &Normalizer {
        match layout {
            SchemaLayout::Legacy => &self.legacy,
            SchemaLayout::Merged => &self.merged,
        }
    }

    /// Fetch, normalize, build and index without touching published state
    fn run_pass(&self, generation: u64) -> Result<(Snapshot, LoadSummary), SourceError> {
        let started = Instant::now();
        let rows = self.source.fetch()?;
        let layout = self.options.layout.unwrap_or(rows.layout);
        let normalizer = self.normalizer(layout);

        let mut log = PassLog::new();
        let batches: Vec<Vec<ItemTemplate>> = Category::BUILD_ORDER
            .iter()
            .map(|category| TemplateBuilder::new(*category, normalizer).build(&rows, &mut log))
            .collect();
        let (snapshot, collisions) = CatalogIndex::build(generation, batches);

        if log.skipped_count() > 0 {
            warn!("Skipped {} item rows", log.skipped_count());
        }

        let summary = LoadSummary {
            generation,
            layout,
            counts: snapshot.counts().clone(),
            skipped: log.skipped().cloned().collect(),
            unmapped: log.unmapped().cloned().collect(),
            unverified: log.unverified_count(),
            collisions,
            elapsed: started.elapsed(),
        };
        Ok((snapshot, summary))
    }
}

impl<S> fmt::Debug for ItemCatalog<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = self.current.read();
        f.debug_struct("ItemCatalog")
            .field("generation", &current.snapshot.generation())
            .field("templates", &current.snapshot.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, SourceResult};
    use crate::fixtures;
    use crate::instance::SequentialIds;
    use crate::source::{MemorySource, RowSet, ARMORS, ETC_ITEMS, WEAPONS};
    use std::sync::mpsc;

    /// Source whose rows can be swapped, made unavailable, or paused mid-fetch
    struct TestSource {
        rows: Mutex<Option<MemorySource>>,
        gate: Mutex<Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>>,
    }

    impl TestSource {
        fn new(rows: MemorySource) -> Self {
            Self {
                rows: Mutex::new(Some(rows)),
                gate: Mutex::new(None),
            }
        }

        fn set(&self, rows: Option<MemorySource>) {
            *self.rows.lock() = rows;
        }

        /// Pause the next fetch: it signals `entered`, then waits on `release`
        fn pause_next(&self) -> (mpsc::Receiver<()>, mpsc::Sender<()>) {
            let (entered_tx, entered_rx) = mpsc::channel();
            let (release_tx, release_rx) = mpsc::channel();
            *self.gate.lock() = Some((entered_tx, release_rx));
            (entered_rx, release_tx)
        }
    }

    impl RowSource for TestSource {
        fn fetch(&self) -> SourceResult<RowSet> {
            let rows = self.rows.lock().clone();
            let gate = self.gate.lock().take();
            if let Some((entered, release)) = gate {
                let _ = entered.send(());
                let _ = release.recv();
            }
            match rows {
                Some(source) => source.fetch(),
                None => Err(SourceError::Unavailable("connection refused".to_string())),
            }
        }
    }

    fn renamed_source() -> MemorySource {
        fixtures::legacy_tables()
            .with_row(WEAPONS, fixtures::weapon(1, "Frost Sword", "sword"))
            .with_row(WEAPONS, fixtures::weapon(3, "Long Bow", "bow"))
    }

    #[test]
    fn test_load_and_lookup() {
        let catalog =
            ItemCatalog::load(fixtures::legacy_source(), CatalogOptions::default()).unwrap();
        assert_eq!(catalog.find_id_by_name("Fire Sword"), 1);
        assert_eq!(catalog.find_id_by_name_without_space("FireSword"), 1);
        assert_eq!(
            catalog.find_id_by_name_without_space("Fire Sword"),
            catalog.find_id_by_name_without_space("FireSword")
        );
        assert_eq!(catalog.find_id_by_name("Nonexistent Item"), 0);
        assert_eq!(catalog.find_id_by_name_without_space("Nonexistent"), 0);
        assert!(catalog.template(424_242).is_none());

        let sword = catalog.template(1).unwrap();
        assert_eq!(sword.category(), Category::Weapon);
        assert!(sword.enchant_bonus().is_zero());

        let summary = catalog.last_summary();
        assert_eq!(summary.generation, 1);
        assert_eq!(summary.total(), 6);
        assert!(summary.to_string().starts_with("loading items...OK! 6 items"));
    }

    #[test]
    fn test_summary_counts_unverified_fallbacks() {
        let source = fixtures::legacy_source()
            .with_row(ETC_ITEMS, fixtures::etc(40_300, "Icon: Heal", "other", "spell_icon"))
            .with_row(ARMORS, fixtures::armor(20_200, "Odd Charm", "accessory", "normal"));
        let catalog = ItemCatalog::load(source, CatalogOptions::default()).unwrap();
        let (snapshot, summary) = catalog.published();
        assert_eq!(summary.unverified, 2);
        assert_eq!(summary.generation, snapshot.generation());

        let icon = snapshot.template(40_300).unwrap();
        assert!(icon.as_consumable().unwrap().unverified_kind);
        assert_eq!(icon.kind_name(), "spellicon");
    }

    #[test]
    fn test_merged_layout_load() {
        let catalog =
            ItemCatalog::load(fixtures::merged_source(), CatalogOptions::default()).unwrap();
        assert_eq!(catalog.last_summary().layout, SchemaLayout::Merged);
        assert_eq!(catalog.template(1).unwrap().kind_name(), "staff");
        assert_eq!(catalog.snapshot().count(Category::Armor), 2);
    }

    #[test]
    fn test_initial_load_failure() {
        let source = TestSource::new(fixtures::legacy_source());
        source.set(None);
        let err = ItemCatalog::load(source, CatalogOptions::default()).unwrap_err();
        assert!(matches!(err, CatalogError::InitialLoad(SourceError::Unavailable(_))));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = CatalogOptions {
            normalizer: NormalizerConfig {
                accessory_fallback: "boots".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = ItemCatalog::load(fixtures::legacy_source(), options).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Config(ConfigError::AccessoryFallback(_))
        ));
    }

    #[test]
    fn test_reload_publishes_new_generation() {
        let catalog =
            ItemCatalog::load(TestSource::new(fixtures::legacy_source()), CatalogOptions::default())
                .unwrap();
        catalog.source().set(Some(renamed_source()));

        let summary = catalog.reload().unwrap();
        assert_eq!(summary.generation, 2);
        assert_eq!(catalog.find_id_by_name("Frost Sword"), 1);
        assert_eq!(catalog.find_id_by_name("Fire Sword"), 0);
        assert_eq!(catalog.find_id_by_name("Long Bow"), 3);
        assert!(catalog.template(20_001).is_none());
        assert_eq!(catalog.last_summary().generation, 2);
    }

    #[test]
    fn test_failed_reload_keeps_snapshot() {
        let catalog =
            ItemCatalog::load(TestSource::new(fixtures::legacy_source()), CatalogOptions::default())
                .unwrap();
        let before = catalog.snapshot();

        catalog.source().set(None);
        let err = catalog.reload().unwrap_err();
        assert!(matches!(err, CatalogError::ReloadFailed(_)));

        let after = catalog.snapshot();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.generation(), 1);
        assert_eq!(catalog.find_id_by_name("Fire Sword"), 1);
        assert_eq!(catalog.template(40_001).unwrap().name(), "Red Potion");
        assert_eq!(catalog.last_summary().generation, 1);

        // the next good reload continues the generation count
        catalog.source().set(Some(fixtures::legacy_source()));
        assert_eq!(catalog.reload().unwrap().generation, 2);
    }

    #[test]
    fn test_instantiate() {
        let catalog =
            ItemCatalog::load(fixtures::legacy_source(), CatalogOptions::default()).unwrap();
        let ids = SequentialIds::default();

        assert!(catalog.instantiate(999_999, &ids).is_none());
        let potion = catalog.instantiate(40_001, &ids).unwrap();
        // the miss above consumed no id
        assert_eq!(potion.object_id, 1);
        assert_eq!(potion.item_id(), 40_001);

        let second = catalog.instantiate(40_001, &ids).unwrap();
        assert_eq!(second.object_id, 2);
        assert!(Arc::ptr_eq(&potion.template, &second.template));
    }

    #[test]
    fn test_readers_never_see_mixed_snapshot() {
        let catalog =
            ItemCatalog::load(TestSource::new(fixtures::legacy_source()), CatalogOptions::default())
                .unwrap();
        catalog.source().set(Some(renamed_source()));
        let (entered, release) = catalog.source().pause_next();

        std::thread::scope(|scope| {
            let reloader = scope.spawn(|| catalog.reload());
            entered.recv().unwrap();

            // the build is in flight
            assert!(matches!(
                catalog.try_reload(),
                Err(CatalogError::ReloadInProgress)
            ));

            let readers: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        let mut seen_new = false;
                        let deadline = Instant::now() + Duration::from_secs(10);
                        while Instant::now() < deadline {
                            let (snap, summary) = catalog.published();
                            assert!(snap.is_consistent());
                            assert_eq!(summary.generation, snap.generation());
                            assert_eq!(summary.total(), snap.len());
                            match snap.generation() {
                                1 => {
                                    assert_eq!(snap.id_by_name("Fire Sword"), 1);
                                    assert_eq!(snap.id_by_name("Frost Sword"), 0);
                                    assert_eq!(snap.template(1).unwrap().name(), "Fire Sword");
                                    assert_eq!(snap.len(), 6);
                                }
                                2 => {
                                    assert_eq!(snap.id_by_name("Fire Sword"), 0);
                                    assert_eq!(snap.id_by_name_without_space("FrostSword"), 1);
                                    assert_eq!(snap.template(1).unwrap().name(), "Frost Sword");
                                    assert_eq!(snap.len(), 2);
                                    seen_new = true;
                                    break;
                                }
                                other => panic!("unexpected generation {}", other),
                            }
                        }
                        seen_new
                    })
                })
                .collect();

            release.send(()).unwrap();
            let summary = reloader.join().unwrap().unwrap();
            assert_eq!(summary.generation, 2);
            for reader in readers {
                assert!(reader.join().unwrap());
            }
        });
    }
}
