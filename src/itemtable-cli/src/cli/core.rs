//! Core CLI definitions

use clap::{Parser, Subcommand};
use itemtable::SchemaLayout;
use std::path::PathBuf;

/// Schema layout selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LayoutArg {
    /// Detect from the tables present (or use the configured layout)
    #[default]
    Auto,
    /// Separate etc_items, weapons and armors tables
    Legacy,
    /// One items table with a category column
    Merged,
}

impl LayoutArg {
    pub fn layout(self) -> Option<SchemaLayout> {
        match self {
            Self::Auto => None,
            Self::Legacy => Some(SchemaLayout::Legacy),
            Self::Merged => Some(SchemaLayout::Merged),
        }
    }
}

#[derive(Parser)]
#[command(name = "itemtable")]
#[command(about = "Item template catalog tool", long_about = None)]
pub struct Cli {
    /// Path to database file (can also set ITEMTABLE_DB env var)
    #[arg(short, long, env = "ITEMTABLE_DB", global = true)]
    pub database: Option<PathBuf>,

    /// Schema layout of the database
    #[arg(short, long, value_enum, default_value_t = LayoutArg::Auto, global = true)]
    pub layout: LayoutArg,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the catalog and print the load summary
    #[command(visible_alias = "s")]
    Stats,

    /// Show one item template as JSON
    #[command(visible_alias = "g")]
    Get {
        /// Item id
        id: u32,
    },

    /// Find an item id by display name (prints 0 when not found)
    #[command(visible_alias = "f")]
    Find {
        /// Display name
        name: String,

        /// Ignore spaces when matching
        #[arg(short = 'w', long)]
        without_space: bool,
    },

    /// Load, then reload the catalog and print each summary
    #[command(visible_alias = "r")]
    Reload {
        /// Number of reloads
        #[arg(short, long, default_value_t = 1)]
        times: u32,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Set the default database path
        #[arg(long)]
        default_db: Option<PathBuf>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
