//! Item Template Catalog
//!
//! Loads item definitions from a relational row source, normalizes the
//! historical schema shapes (three legacy per-category tables, or one merged
//! table) into one template model, and serves O(1) lookups by id and by
//! display name. Reloads build a complete snapshot off to the side and
//! publish it in one swap.
//!
//! # Features
//!
//! - `sqlite` (default) - `SqliteSource`, a synchronous row source using rusqlite
//!
//! # Example
//!
//! ```no_run
//! use itemtable::{CatalogOptions, ItemCatalog, SqliteSource};
//!
//! let source = SqliteSource::open("items.db").unwrap();
//! let catalog = ItemCatalog::load(source, CatalogOptions::default()).unwrap();
//!
//! let id = catalog.find_id_by_name_without_space("FireSword");
//! if let Some(template) = catalog.template(id) {
//!     println!("{} is a {}", template.name(), template.kind_name());
//! }
//!
//! // Rebuild from the database; the old snapshot stays live on failure
//! catalog.reload().unwrap();
//! ```

pub mod builder;
pub mod catalog;
pub mod error;
pub mod index;
pub mod instance;
pub mod normalize;
pub mod reference;
pub mod row;
pub mod source;
pub mod template;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod fixtures;

pub use catalog::{CatalogOptions, ItemCatalog, LoadSummary};
pub use error::{
    CatalogError, ConfigError, MissingMapping, RowError, SkippedRow, SourceError, SourceResult,
};
pub use index::{Snapshot, NO_ITEM};
pub use instance::{IdAllocator, ItemInstance, SequentialIds};
pub use normalize::NormalizerConfig;
pub use reference::Category;
pub use source::{MemorySource, RowSet, RowSource, SchemaLayout};
pub use template::{
    ArmorTemplate, ConsumableTemplate, EnchantBonus, ItemHeader, ItemTemplate, WeaponTemplate,
};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSource;
