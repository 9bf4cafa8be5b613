use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use dedupe_lib::entity_identification::aliases::AliasRegistry;
use dedupe_lib::output::OutputWriter;
use dedupe_lib::pipeline::{run_merge, MatchThresholds};
use dedupe_lib::sources::load_batches;
use dedupe_lib::utils::env::load_env;
use dedupe_lib::utils::get_memory_usage;
use dedupe_lib::utils::merge_config::{self, MergeConfig};
use dedupe_lib::utils::progress_bars::progress_config::{self, ProgressConfig};

/// Merges football player and club CSV datasets into canonical JSON records.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root directory scanned recursively for CSV files
    #[arg(long)]
    data_lake: Option<PathBuf>,

    /// Directory the JSON output is written to
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON file of alias table overrides (source tag -> table)
    #[arg(long)]
    aliases: Option<PathBuf>,

    /// Minimum token overlap score for a fuzzy match
    #[arg(long)]
    token_threshold: Option<f64>,

    /// Minimum edit-distance ratio for a fuzzy match
    #[arg(long)]
    edit_threshold: Option<f64>,

    /// Maximum players per group file before it is split into parts
    #[arg(long)]
    max_per_file: Option<usize>,

    /// Run the merge but write nothing
    #[arg(long)]
    dry_run: bool,

    /// Print the supported environment variables and exit
    #[arg(long)]
    print_env: bool,
}

impl Cli {
    fn apply(self, mut config: MergeConfig) -> MergeConfig {
        if let Some(dir) = self.data_lake {
            config.data_lake_dir = dir;
        }
        if let Some(dir) = self.output {
            config.output_dir = dir;
        }
        if let Some(path) = self.aliases {
            config.alias_table_path = Some(path);
        }
        if let Some(t) = self.token_threshold {
            config.token_threshold = t;
        }
        if let Some(t) = self.edit_threshold {
            config.edit_threshold = t;
        }
        if let Some(n) = self.max_per_file {
            config.max_players_per_file = n;
        }
        config.dry_run = self.dry_run;
        config
    }
}

fn main() -> Result<()> {
    // Initialize logging and environment
    env_logger::init();
    load_env();

    let cli = Cli::parse();
    if cli.print_env {
        merge_config::print_env_config_example();
        println!();
        progress_config::print_env_config_example();
        return Ok(());
    }

    info!("Starting football player and club merge");
    let run_start = Instant::now();
    let mut phase_times = HashMap::new();

    let config = cli.apply(MergeConfig::from_env());
    config.validate().context("Invalid merge configuration")?;
    config.log_config();

    let progress_config = ProgressConfig::from_env();
    info!(
        "Progress tracking: enabled={}, detailed={}",
        progress_config.enabled, progress_config.detailed
    );
    let multi_progress = progress_config.create_multi_progress();

    let mut aliases = AliasRegistry::default();
    if let Some(path) = &config.alias_table_path {
        let replaced = aliases
            .load_overrides(path)
            .context("Failed to load alias overrides")?;
        info!("Applied {} alias table overrides", replaced);
    }

    // Phase 1: acquisition
    let phase_start = Instant::now();
    info!("Phase 1: Scanning data lake...");
    let batches = load_batches(&config.data_lake_dir).context("Failed to load source batches")?;
    phase_times.insert("acquisition", phase_start.elapsed());

    // Phase 2: merge and club linking
    let phase_start = Instant::now();
    info!("Phase 2: Merging sources...");
    let thresholds = MatchThresholds {
        token: config.token_threshold,
        edit: config.edit_threshold,
    };
    let outcome = run_merge(
        &batches,
        &aliases,
        thresholds,
        &progress_config,
        multi_progress.as_ref(),
    );
    phase_times.insert("merge", phase_start.elapsed());

    // Phase 3: output
    let phase_start = Instant::now();
    info!("Phase 3: Writing output...");
    let writer = OutputWriter::new(
        &config.output_dir,
        config.max_players_per_file,
        config.dry_run,
    );
    let index = writer
        .write_all(&outcome.players, &outcome.clubs, &batches)
        .context("Failed to write output")?;
    phase_times.insert("output", phase_start.elapsed());

    info!("🎉 Run {} finished in {:.2?}", writer.run_id(), run_start.elapsed());
    for phase in ["acquisition", "merge", "output"] {
        if let Some(duration) = phase_times.get(phase) {
            info!("   {}: {:.2?}", phase, duration);
        }
    }
    info!(
        "   Players: {} | Clubs: {} | Linked: {} | Files: {}",
        outcome.players.len(),
        outcome.clubs.len(),
        outcome.links.linked(),
        index.files.len() + 1
    );
    for stats in &outcome.batches {
        info!(
            "   Batch {}: {} rows, {} new, {} updated",
            stats.source_tag, stats.rows, stats.entities_created, stats.entities_updated
        );
    }
    if progress_config.should_show_memory() {
        info!("   Memory: {} MB", get_memory_usage());
    }
    if config.dry_run {
        info!("🧪 Dry run complete; nothing was written to {}", config.output_dir.display());
    } else {
        info!("Outputs in {}", config.output_dir.display());
    }
    Ok(())
}
