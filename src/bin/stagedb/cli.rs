use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI для StageDB поверх файлового хоста (<root>/snapshots).
/// Записи - ItemStack в форме "type[*amount]", например minecraft:diamond*3.
#[derive(Parser, Debug)]
#[command(name = "stagedb", version, about = "StageDB CLI", arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Store one item under key
    Set {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        table: String,
        #[arg(long)]
        key: String,
        /// Item as "type[*amount]"
        #[arg(long)]
        item: String,
    },
    /// Store an ordered list of items under key
    SetItems {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        table: String,
        #[arg(long)]
        key: String,
        /// Items as "type[*amount]", in order (repeat the flag or comma-separate)
        #[arg(long = "item", required = true, value_delimiter = ',')]
        items: Vec<String>,
    },
    /// Get item by key (from cache after load; --fresh re-reads the snapshot)
    Get {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        table: String,
        #[arg(long)]
        key: String,
        #[arg(long)]
        fresh: bool,
        #[arg(long)]
        json: bool,
    },
    /// Get item list by key
    GetItems {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        table: String,
        #[arg(long)]
        key: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete key (single item, or the item list with --items)
    Del {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        table: String,
        #[arg(long)]
        key: String,
        #[arg(long)]
        items: bool,
    },
    /// List keys that have a snapshot. --json prints a JSON array.
    Keys {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        table: String,
        #[arg(long)]
        json: bool,
    },
    /// Print every key with its item. --json prints a JSON object.
    Dump {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        table: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete every key of a table
    Clear {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        table: String,
    },
    /// Show config, queue/cache counters and metrics
    Status {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        table: String,
        #[arg(long)]
        json: bool,
    },
}
