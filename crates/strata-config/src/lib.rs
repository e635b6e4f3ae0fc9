//! Configuration for the strata tools.
//!
//! Settings persist to disk as `config.ron`. Every section falls back to its
//! defaults when missing, CLI flags override loaded values, and `reload`
//! reports whether the file changed.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CodecConfig, Config, DebugConfig, EncodingSetting, StateTableFlavor, WorldConfig,
    default_config_dir,
};
pub use error::ConfigError;
