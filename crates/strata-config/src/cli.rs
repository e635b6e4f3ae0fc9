//! Command-line overrides shared by the strata binaries.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, EncodingSetting};

/// Flags that override settings loaded from `config.ron`.
///
/// Binaries flatten this into their own argument struct.
#[derive(Parser, Debug, Default)]
pub struct CliArgs {
    /// Path to config directory (overrides default location).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Block state table to load.
    #[arg(long, global = true)]
    pub state_table: Option<PathBuf>,

    /// Lowest block height of the world.
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub min_y: Option<i32>,

    /// Highest block height of the world.
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub max_y: Option<i32>,

    /// Chunk encoding.
    #[arg(long, global = true, value_enum)]
    pub encoding: Option<EncodingSetting>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref path) = args.state_table {
            self.world.state_table = Some(path.clone());
        }
        if let Some(min_y) = args.min_y {
            self.world.min_y = min_y;
        }
        if let Some(max_y) = args.max_y {
            self.world.max_y = max_y;
        }
        if let Some(encoding) = args.encoding {
            self.codec.encoding = encoding;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
