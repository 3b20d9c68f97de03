//! Command line argument parsing for the Kindred CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Kindred - nested-object and parent/child document queries
#[derive(Parser, Debug, Clone)]
#[command(name = "kindred")]
#[command(about = "Index documents and query them through nested objects and parent/child joins")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct KindredArgs {
    /// Directory holding the collection files
    #[arg(short = 'd', long, env = "KINDRED_DATA_DIR", default_value = "./data", global = true)]
    pub data_dir: PathBuf,

    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl KindredArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create an empty collection
    #[command(name = "create-collection")]
    CreateCollection(CreateCollectionArgs),

    /// Declare or extend the mapping of a type
    #[command(name = "put-mapping")]
    PutMapping(PutMappingArgs),

    /// Index one document
    Index(IndexArgs),

    /// Delete one document
    Delete(DeleteArgs),

    /// Apply newline-delimited bulk operations
    Bulk(BulkArgs),

    /// Search a collection with a JSON request body
    Search(SearchArgs),

    /// Fetch one committed document
    Get(GetArgs),

    /// Report engine health
    Health,

    /// List collections
    List,
}

/// Arguments for creating a collection
#[derive(Parser, Debug, Clone)]
pub struct CreateCollectionArgs {
    /// Collection name
    #[arg(value_name = "COLLECTION")]
    pub collection: String,
}

/// Arguments for declaring a mapping
#[derive(Parser, Debug, Clone)]
pub struct PutMappingArgs {
    /// Collection name
    #[arg(value_name = "COLLECTION")]
    pub collection: String,

    /// Document type
    #[arg(value_name = "TYPE")]
    pub doc_type: String,

    /// Mapping JSON: inline, `@file`, or `-` for stdin
    #[arg(value_name = "MAPPING")]
    pub mapping: String,
}

/// Arguments for indexing a document
#[derive(Parser, Debug, Clone)]
pub struct IndexArgs {
    /// Collection name
    #[arg(value_name = "COLLECTION")]
    pub collection: String,

    /// Document type
    #[arg(value_name = "TYPE")]
    pub doc_type: String,

    /// Document JSON: inline, `@file`, or `-` for stdin
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Document id (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Parent id, for child types
    #[arg(long)]
    pub parent: Option<String>,
}

/// Arguments for deleting a document
#[derive(Parser, Debug, Clone)]
pub struct DeleteArgs {
    /// Collection name
    #[arg(value_name = "COLLECTION")]
    pub collection: String,

    /// Document type
    #[arg(value_name = "TYPE")]
    pub doc_type: String,

    /// Document id
    #[arg(value_name = "ID")]
    pub id: String,
}

/// Arguments for bulk ingestion
#[derive(Parser, Debug, Clone)]
pub struct BulkArgs {
    /// Collection name
    #[arg(value_name = "COLLECTION")]
    pub collection: String,

    /// Newline-delimited bulk file, or `-` for stdin
    #[arg(value_name = "FILE")]
    pub file: String,
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Collection name
    #[arg(value_name = "COLLECTION")]
    pub collection: String,

    /// Request JSON: inline, `@file`, or `-` for stdin (default: match all)
    #[arg(value_name = "REQUEST")]
    pub request: Option<String>,

    /// Restrict to these types (comma-separated)
    #[arg(short = 't', long = "type", value_delimiter = ',')]
    pub types: Vec<String>,

    /// Maximum number of hits to return
    #[arg(short, long)]
    pub size: Option<usize>,

    /// Number of hits to skip
    #[arg(long)]
    pub from: Option<usize>,
}

/// Arguments for fetching a document
#[derive(Parser, Debug, Clone)]
pub struct GetArgs {
    /// Collection name
    #[arg(value_name = "COLLECTION")]
    pub collection: String,

    /// Document type
    #[arg(value_name = "TYPE")]
    pub doc_type: String,

    /// Document id
    #[arg(value_name = "ID")]
    pub id: String,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
