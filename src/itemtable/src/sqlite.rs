//! SQLite row source using rusqlite (synchronous).
//!
//! Tables are read with `SELECT *`, so the column set comes from the database
//! itself and older schemas simply lack some optional columns.

use crate::error::{SourceError, SourceResult};
use crate::row::{Columns, Table, Value};
use crate::source::{RowSet, RowSource, SchemaLayout, ARMORS, ETC_ITEMS, ITEMS, WEAPONS};
use parking_lot::Mutex;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default database location
pub const DEFAULT_DB_PATH: &str = "share/items.db";

/// DDL for the item tables. Only the merged table carries enchant bonus
/// columns, and only a few of them.
pub mod schema {
    pub const ETC_ITEMS_TABLE: &str = r#"
        CREATE TABLE IF NOT EXISTS etc_items (
            id INTEGER PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            unidentified_name_id TEXT,
            identified_name_id TEXT,
            item_type TEXT NOT NULL,
            use_type TEXT,
            material TEXT,
            weight INTEGER NOT NULL DEFAULT 0,
            inv_gfx_id INTEGER NOT NULL DEFAULT 0,
            grd_gfx_id INTEGER NOT NULL DEFAULT 0,
            item_desc_id INTEGER DEFAULT 0,
            stackable INTEGER NOT NULL DEFAULT 0,
            max_charge_count INTEGER DEFAULT 0,
            dmg_small INTEGER DEFAULT 0,
            dmg_large INTEGER DEFAULT 0,
            min_level INTEGER NOT NULL DEFAULT 0,
            max_level INTEGER NOT NULL DEFAULT 0,
            loc_x INTEGER DEFAULT 0,
            loc_y INTEGER DEFAULT 0,
            map_id INTEGER DEFAULT 0,
            bless INTEGER NOT NULL DEFAULT 1,
            tradable INTEGER NOT NULL DEFAULT 1,
            deletable INTEGER NOT NULL DEFAULT 1,
            sealable INTEGER DEFAULT 0,
            delay_id INTEGER DEFAULT 0,
            delay_time INTEGER DEFAULT 0,
            delay_effect INTEGER DEFAULT 0,
            food_volume INTEGER DEFAULT 0,
            save_at_once INTEGER DEFAULT 1,
            charge_time INTEGER DEFAULT 0,
            expiration_time TEXT
        )
    "#;

    pub const WEAPONS_TABLE: &str = r#"
        CREATE TABLE IF NOT EXISTS weapons (
            id INTEGER PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            unidentified_name_id TEXT,
            identified_name_id TEXT,
            type TEXT NOT NULL,
            material TEXT,
            weight INTEGER NOT NULL DEFAULT 0,
            inv_gfx_id INTEGER NOT NULL DEFAULT 0,
            grd_gfx_id INTEGER NOT NULL DEFAULT 0,
            item_desc_id INTEGER DEFAULT 0,
            dmg_small INTEGER NOT NULL DEFAULT 0,
            dmg_large INTEGER NOT NULL DEFAULT 0,
            "range" INTEGER NOT NULL DEFAULT 1,
            safe_enchant INTEGER DEFAULT 0,
            use_royal INTEGER DEFAULT 0,
            use_knight INTEGER DEFAULT 0,
            use_elf INTEGER DEFAULT 0,
            use_wizard INTEGER DEFAULT 0,
            use_darkelf INTEGER DEFAULT 0,
            use_dragonknight INTEGER DEFAULT 0,
            use_illusionist INTEGER DEFAULT 0,
            hit_modifier INTEGER DEFAULT 0,
            dmg_modifier INTEGER DEFAULT 0,
            magic_dmg_modifier INTEGER DEFAULT 0,
            str INTEGER DEFAULT 0,
            dex INTEGER DEFAULT 0,
            con INTEGER DEFAULT 0,
            int INTEGER DEFAULT 0,
            wis INTEGER DEFAULT 0,
            cha INTEGER DEFAULT 0,
            hp INTEGER DEFAULT 0,
            mp INTEGER DEFAULT 0,
            hpr INTEGER DEFAULT 0,
            mpr INTEGER DEFAULT 0,
            sp INTEGER DEFAULT 0,
            mr INTEGER DEFAULT 0,
            double_dmg_chance INTEGER DEFAULT 0,
            weakness_exposure INTEGER DEFAULT 0,
            can_be_dmg INTEGER DEFAULT 1,
            is_haste INTEGER DEFAULT 0,
            is_twohanded INTEGER DEFAULT 0,
            min_level INTEGER NOT NULL DEFAULT 0,
            max_level INTEGER NOT NULL DEFAULT 0,
            bless INTEGER NOT NULL DEFAULT 1,
            tradable INTEGER NOT NULL DEFAULT 1,
            deletable INTEGER NOT NULL DEFAULT 1,
            sealable INTEGER DEFAULT 0,
            charge_time INTEGER DEFAULT 0,
            expiration_time TEXT
        )
    "#;

    pub const ARMORS_TABLE: &str = r#"
        CREATE TABLE IF NOT EXISTS armors (
            id INTEGER PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            unidentified_name_id TEXT,
            identified_name_id TEXT,
            type TEXT NOT NULL,
            use_type TEXT,
            material TEXT,
            grade INTEGER DEFAULT 0,
            weight INTEGER NOT NULL DEFAULT 0,
            inv_gfx_id INTEGER NOT NULL DEFAULT 0,
            grd_gfx_id INTEGER NOT NULL DEFAULT 0,
            item_desc_id INTEGER DEFAULT 0,
            ac INTEGER NOT NULL DEFAULT 0,
            safe_enchant INTEGER DEFAULT 0,
            use_royal INTEGER DEFAULT 0,
            use_knight INTEGER DEFAULT 0,
            use_elf INTEGER DEFAULT 0,
            use_wizard INTEGER DEFAULT 0,
            use_darkelf INTEGER DEFAULT 0,
            use_dragonknight INTEGER DEFAULT 0,
            use_illusionist INTEGER DEFAULT 0,
            str INTEGER DEFAULT 0,
            dex INTEGER DEFAULT 0,
            con INTEGER DEFAULT 0,
            int INTEGER DEFAULT 0,
            wis INTEGER DEFAULT 0,
            cha INTEGER DEFAULT 0,
            hp INTEGER DEFAULT 0,
            mp INTEGER DEFAULT 0,
            hpr INTEGER DEFAULT 0,
            mpr INTEGER DEFAULT 0,
            sp INTEGER DEFAULT 0,
            mr INTEGER DEFAULT 0,
            damage_reduction INTEGER DEFAULT 0,
            weight_reduction INTEGER DEFAULT 0,
            hit_modifier INTEGER DEFAULT 0,
            dmg_modifier INTEGER DEFAULT 0,
            bow_hit_modifier INTEGER DEFAULT 0,
            bow_dmg_modifier INTEGER DEFAULT 0,
            defense_earth INTEGER DEFAULT 0,
            defense_water INTEGER DEFAULT 0,
            defense_wind INTEGER DEFAULT 0,
            defense_fire INTEGER DEFAULT 0,
            resist_stun INTEGER DEFAULT 0,
            resist_stone INTEGER DEFAULT 0,
            resist_sleep INTEGER DEFAULT 0,
            resist_freeze INTEGER DEFAULT 0,
            resist_hold INTEGER DEFAULT 0,
            resist_blind INTEGER DEFAULT 0,
            is_haste INTEGER DEFAULT 0,
            exp_bonus INTEGER DEFAULT 0,
            potion_recovery_rate INTEGER DEFAULT 0,
            min_level INTEGER NOT NULL DEFAULT 0,
            max_level INTEGER NOT NULL DEFAULT 0,
            bless INTEGER NOT NULL DEFAULT 1,
            tradable INTEGER NOT NULL DEFAULT 1,
            deletable INTEGER NOT NULL DEFAULT 1,
            sealable INTEGER DEFAULT 0,
            charge_time INTEGER DEFAULT 0,
            expiration_time TEXT
        )
    "#;

    /// Merged layout: one table, the category in its own column
    pub const ITEMS_TABLE: &str = r#"
        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            unidentified_name_id TEXT,
            identified_name_id TEXT,
            category TEXT,
            type TEXT NOT NULL,
            use_type TEXT,
            material TEXT,
            weight INTEGER NOT NULL DEFAULT 0,
            inv_gfx_id INTEGER NOT NULL DEFAULT 0,
            grd_gfx_id INTEGER NOT NULL DEFAULT 0,
            item_desc_id INTEGER DEFAULT 0,
            dmg_small INTEGER DEFAULT 0,
            dmg_large INTEGER DEFAULT 0,
            "range" INTEGER DEFAULT 0,
            ac INTEGER DEFAULT 0,
            safe_enchant INTEGER DEFAULT 0,
            stackable INTEGER DEFAULT 0,
            food_volume INTEGER DEFAULT 0,
            min_level INTEGER NOT NULL DEFAULT 0,
            max_level INTEGER NOT NULL DEFAULT 0,
            bless INTEGER NOT NULL DEFAULT 1,
            tradable INTEGER NOT NULL DEFAULT 1,
            deletable INTEGER NOT NULL DEFAULT 1,
            sealable INTEGER DEFAULT 0,
            enchant_ac INTEGER DEFAULT 0,
            enchant_hit_modifier INTEGER DEFAULT 0,
            enchant_dmg_modifier INTEGER DEFAULT 0
        )
    "#;

    /// Tables of the legacy layout
    pub const LEGACY: &[&str] = &[ETC_ITEMS_TABLE, WEAPONS_TABLE, ARMORS_TABLE];
}

enum Target {
    Path(PathBuf),
    Connection(Mutex<Connection>),
}

/// SQLite-backed row source
pub struct SqliteSource {
    target: Target,
    layout: Option<SchemaLayout>,
}

impl SqliteSource {
    /// Use the database at `path`, opened read-only on every fetch
    pub fn open<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        let path = path.as_ref().to_path_buf();
        // Fail early on a missing or unreadable file
        open_read_only(&path)?;
        Ok(Self {
            target: Target::Path(path),
            layout: None,
        })
    }

    /// Use an already open connection (in-memory databases, tests)
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            target: Target::Connection(Mutex::new(conn)),
            layout: None,
        }
    }

    /// Skip layout detection
    pub fn with_layout(mut self, layout: SchemaLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.target {
            Target::Path(p) => Some(p),
            Target::Connection(_) => None,
        }
    }

    fn read(&self, conn: &Connection) -> SourceResult<RowSet> {
        let existing = table_names(conn)?;
        let layout = match self.layout {
            Some(layout) => layout,
            None => detect_layout(&existing)?,
        };
        let wanted: &[&str] = match layout {
            SchemaLayout::Legacy => &[ETC_ITEMS, WEAPONS, ARMORS],
            SchemaLayout::Merged => &[ITEMS],
        };

        let mut rows = RowSet::new(layout);
        for name in wanted {
            if !existing.contains(*name) {
                warn!("Table {} not found, skipping", name);
                continue;
            }
            rows.tables.push(read_table(conn, name)?);
        }
        if rows.tables.is_empty() {
            return Err(SourceError::NoTables);
        }
        debug!("Fetched {} rows ({} layout)", rows.row_count(), layout);
        Ok(rows)
    }
}

impl RowSource for SqliteSource {
    fn fetch(&self) -> SourceResult<RowSet> {
        match &self.target {
            Target::Path(path) => self.read(&open_read_only(path)?),
            Target::Connection(conn) => self.read(&conn.lock()),
        }
    }
}

fn open_read_only(path: &Path) -> SourceResult<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| SourceError::Unavailable(format!("{}: {}", path.display(), e)))
}

/// Lowercased names of all tables
fn table_names(conn: &Connection) -> SourceResult<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .map(|name| name.map(|n| n.to_ascii_lowercase()))
        .collect::<Result<HashSet<String>, rusqlite::Error>>()?;
    Ok(names)
}

/// `items` means merged; any legacy table means legacy
pub fn detect_layout(tables: &HashSet<String>) -> SourceResult<SchemaLayout> {
    if tables.contains(ITEMS) {
        Ok(SchemaLayout::Merged)
    } else if [ETC_ITEMS, WEAPONS, ARMORS].iter().any(|t| tables.contains(*t)) {
        Ok(SchemaLayout::Legacy)
    } else {
        Err(SourceError::NoTables)
    }
}

fn read_table(conn: &Connection, name: &str) -> SourceResult<Table> {
    let query_error = |e: rusqlite::Error| SourceError::Query {
        table: name.to_string(),
        message: e.to_string(),
    };

    let mut stmt = conn
        .prepare(&format!("SELECT * FROM \"{}\"", name))
        .map_err(query_error)?;
    let columns = Columns::new(stmt.column_names());
    let width = columns.len();
    let mut table = Table::new(name, columns);

    let mut rows = stmt.query([]).map_err(query_error)?;
    while let Some(row) = rows.next().map_err(query_error)? {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(to_value(row.get_ref(i).map_err(query_error)?));
        }
        table.push_row(values);
    }
    Ok(table)
}

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Text(String::from_utf8_lossy(b).into_owned()),
    }
}
