//! Command-line front end for the block state registry and chunk codecs.
//!
//! `stats` builds the registry from the configured state table and reports
//! what it holds. `roundtrip` encodes generated chunks in both encodings on a
//! pool of worker threads, decodes them back and checks they survive intact.

mod sample;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use clap::{Parser, Subcommand};
use serde::Serialize;
use strata_config::{CliArgs, Config, EncodingSetting, StateTableFlavor, default_config_dir};
use strata_world::{
    BlockStateRegistry, BufferPool, ChunkCodec, CodecError, Encoding, NbtFlavor, RegistryError,
    VerticalRange,
};
use tracing::{error, info, warn};

/// Block state registry and chunk codec tools.
#[derive(Parser, Debug)]
#[command(name = "strata-tool", version)]
struct ToolArgs {
    #[command(flatten)]
    common: CliArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the registry from the state table and report its contents.
    Stats {
        /// Print the report as JSON on stdout.
        #[arg(long)]
        json: bool,
    },
    /// Encode generated chunks, decode them again and compare.
    Roundtrip {
        /// Number of chunks to generate.
        #[arg(long, default_value_t = 16)]
        chunks: u32,
        /// Worker threads sharing the codec.
        #[arg(long, default_value_t = 4)]
        threads: usize,
        /// Check both encodings instead of only the configured one.
        #[arg(long)]
        all_encodings: bool,
    },
}

/// Errors that end a tool run.
#[derive(Debug, thiserror::Error)]
enum ToolError {
    #[error("failed to read state table {path}: {source}")]
    StateTable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no state table configured (set world.state_table or pass --state-table)")]
    NoStateTable,
    #[error("world range {min}..={max} is not usable")]
    Range { min: i32, max: i32 },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("{failed} of {total} chunks failed the round trip")]
    RoundtripFailed { failed: usize, total: usize },
    #[error("failed to write report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Summary printed by `stats --json`.
#[derive(Debug, Serialize)]
struct RegistryReport {
    states: usize,
    air_id: u32,
    block_names: usize,
    most_states: Option<(String, usize)>,
    carries_nbt: usize,
    random_ticking: usize,
}

fn main() {
    let args = ToolArgs::parse();

    let config_dir = args
        .common
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from(".strata"));

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args.common);
    if let Err(e) = config.validate() {
        eprintln!("{e}");
        std::process::exit(2);
    }

    let log_dir = config_dir.join("logs");
    if let Err(e) = strata_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config))
    {
        eprintln!("Failed to initialize logging: {e}");
    }

    if let Err(e) = run(args.command, &config) {
        error!(error = %e, "strata-tool failed");
        std::process::exit(1);
    }
}

fn run(command: Command, config: &Config) -> Result<(), ToolError> {
    match command {
        Command::Stats { json } => {
            let registry = load_registry(config)?;
            let report = registry_report(&registry);
            info!(
                states = report.states,
                air_id = report.air_id,
                block_names = report.block_names,
                "registry loaded"
            );
            if let Some((name, count)) = &report.most_states {
                info!(name = %name, count = *count, "block with the most states");
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(())
        }
        Command::Roundtrip {
            chunks,
            threads,
            all_encodings,
        } => {
            let registry = match config.world.state_table {
                Some(_) => load_registry(config)?,
                None => {
                    info!("no state table configured, using built-in sample states");
                    sample::sample_registry()?
                }
            };
            let codec = build_codec(config, registry)?;
            let encodings = if all_encodings {
                vec![Encoding::Network, Encoding::Disk]
            } else {
                vec![configured_encoding(config)]
            };
            roundtrip(&codec, &encodings, chunks, threads.max(1))
        }
    }
}

fn load_registry(config: &Config) -> Result<BlockStateRegistry, ToolError> {
    let path = config
        .world
        .state_table
        .as_ref()
        .ok_or(ToolError::NoStateTable)?;
    let data = std::fs::read(path).map_err(|source| ToolError::StateTable {
        path: path.clone(),
        source,
    })?;
    let flavor = match config.world.state_table_flavor {
        StateTableFlavor::LittleEndian => NbtFlavor::LittleEndian,
        StateTableFlavor::NetworkLittleEndian => NbtFlavor::NetworkLittleEndian,
    };
    info!(path = %path.display(), bytes = data.len(), ?flavor, "reading state table");
    Ok(BlockStateRegistry::from_state_table(&data, flavor)?)
}

fn configured_encoding(config: &Config) -> Encoding {
    match config.codec.encoding {
        EncodingSetting::Network => Encoding::Network,
        EncodingSetting::Disk => Encoding::Disk,
    }
}

fn build_codec(config: &Config, registry: BlockStateRegistry) -> Result<ChunkCodec, ToolError> {
    let range = VerticalRange::new(config.world.min_y, config.world.max_y).ok_or(
        ToolError::Range {
            min: config.world.min_y,
            max: config.world.max_y,
        },
    )?;
    let pool = BufferPool::new(config.codec.pool_capacity, config.codec.buffer_capacity);
    Ok(ChunkCodec::new(Arc::new(registry), range, pool)
        .with_default_biome(config.world.default_biome))
}

fn registry_report(registry: &BlockStateRegistry) -> RegistryReport {
    let mut per_name: std::collections::BTreeMap<&str, usize> = Default::default();
    let mut carries_nbt = 0;
    let mut random_ticking = 0;
    for (id, record) in registry.iter() {
        *per_name.entry(record.name.as_str()).or_default() += 1;
        carries_nbt += usize::from(registry.carries_nbt(id));
        random_ticking += usize::from(registry.random_ticks(id));
    }
    let most_states = per_name
        .iter()
        .max_by_key(|&(name, count)| (*count, std::cmp::Reverse(*name)))
        .map(|(name, count)| (name.to_string(), *count));

    RegistryReport {
        states: registry.len(),
        air_id: registry.air_id(),
        block_names: per_name.len(),
        most_states,
        carries_nbt,
        random_ticking,
    }
}

/// Encodes and decodes `chunks` generated chunks across `threads` workers.
///
/// A chunk that fails is logged and counted; the others keep going.
fn roundtrip(
    codec: &ChunkCodec,
    encodings: &[Encoding],
    chunks: u32,
    threads: usize,
) -> Result<(), ToolError> {
    let next = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let bytes: Vec<AtomicUsize> = encodings.iter().map(|_| AtomicUsize::new(0)).collect();

    std::thread::scope(|s| {
        for _ in 0..threads {
            s.spawn(|| {
                loop {
                    let seed = next.fetch_add(1, Ordering::Relaxed);
                    if seed >= chunks as usize {
                        break;
                    }
                    let chunk = sample::generate_chunk(codec, seed as u32);
                    for (&encoding, total) in encodings.iter().zip(&bytes) {
                        match check_chunk(codec, &chunk, encoding) {
                            Ok(size) => {
                                total.fetch_add(size, Ordering::Relaxed);
                            }
                            Err(e) => {
                                warn!(seed, ?encoding, error = %e, "chunk skipped");
                                failed.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                }
            });
        }
    });

    for (encoding, total) in encodings.iter().zip(bytes) {
        info!(?encoding, bytes = total.into_inner(), "encoded size");
    }
    let failed = failed.into_inner();
    info!(
        chunks,
        threads,
        failed,
        fresh_buffers = codec.pool().allocations(),
        "round trip finished"
    );
    if failed > 0 {
        return Err(ToolError::RoundtripFailed {
            failed,
            total: chunks as usize * encodings.len(),
        });
    }
    Ok(())
}

/// Round-trips one chunk and returns its encoded size.
fn check_chunk(
    codec: &ChunkCodec,
    chunk: &strata_world::Chunk,
    encoding: Encoding,
) -> Result<usize, CodecError> {
    let data = codec.encode(chunk, encoding)?;
    let decoded = codec.decode(&data, encoding)?;
    if &decoded != chunk {
        return Err(CodecError::MalformedPalette(
            "decoded chunk differs from the original".to_string(),
        ));
    }
    let sub_chunk_bytes: usize = data.sub_chunks.iter().map(Vec::len).sum();
    Ok(sub_chunk_bytes + data.biomes.len() + data.block_nbt.len())
}

#[cfg(test)]
mod tests {
    use strata_world::nbt::NbtWriter;

    use super::*;

    #[test]
    fn test_stats_report_counts_names() {
        let registry = sample::sample_registry().unwrap();
        let report = registry_report(&registry);
        assert_eq!(report.states, 50);
        assert_eq!(report.block_names, 8);
        assert_eq!(
            report.most_states,
            Some(("minecraft:concrete_lamp".to_string(), 32))
        );
        assert_eq!(report.carries_nbt, 0);
    }

    #[test]
    fn test_load_registry_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("states.nbt");
        let registry = sample::sample_registry().unwrap();
        let mut data = Vec::new();
        for (_, record) in registry.iter() {
            NbtWriter::new(&mut data, NbtFlavor::LittleEndian)
                .write_root(&record.to_nbt())
                .unwrap();
        }
        std::fs::write(&path, data).unwrap();

        let mut config = Config::default();
        config.world.state_table = Some(path);
        config.world.state_table_flavor = StateTableFlavor::LittleEndian;
        let loaded = load_registry(&config).unwrap();
        assert_eq!(loaded.len(), registry.len());
    }

    #[test]
    fn test_missing_state_table() {
        assert!(matches!(
            load_registry(&Config::default()),
            Err(ToolError::NoStateTable)
        ));
    }

    #[test]
    fn test_roundtrip_command() {
        let config = Config::default();
        let codec = build_codec(&config, sample::sample_registry().unwrap()).unwrap();
        roundtrip(&codec, &[Encoding::Network, Encoding::Disk], 6, 3).unwrap();
    }

    #[test]
    fn test_bad_range_rejected() {
        let mut config = Config::default();
        config.world.min_y = 5;
        assert!(matches!(
            build_codec(&config, sample::sample_registry().unwrap()),
            Err(ToolError::Range { min: 5, .. })
        ));
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let args = ToolArgs::try_parse_from([
            "strata-tool",
            "roundtrip",
            "--chunks",
            "3",
            "--encoding",
            "disk",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::Roundtrip {
                chunks: 3,
                all_encodings: false,
                ..
            }
        ));

        let mut config = Config::default();
        config.apply_cli_overrides(&args.common);
        assert_eq!(configured_encoding(&config), Encoding::Disk);
    }
}
