//! Command-line surface: global `--data-dir`/`--config-dir`/`--log-level`
//! flags plus one subcommand per pipeline stage, grounded on
//! `src/analysis/query.rs`'s `#[derive(Parser)] pub enum Query` idiom (one
//! `#[command(about = "...")]` variant per operation, `#[arg(...)]` on its
//! fields) extended with a struct-of-globals wrapper since this binary is
//! invoked once per process rather than read from an interactive loop.

use crate::badlog::BadLog;
use crate::config::Configuration;
use crate::constants::Action;
use crate::orchestrator;
use crate::orchestrator::Stage;
use crate::store::Store;
use clap::Parser;
use clap::Subcommand;
use rand::rngs::StdRng;
use rand::RngCore;
use rand::SeedableRng;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Root of the content-addressed artifact store.
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory holding the per-concern `.cfg` configuration files.
    #[arg(long, default_value = "config")]
    pub config_dir: PathBuf,

    /// Terminal logging verbosity; the file log always runs at DEBUG.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Seed for the pipeline's injectable RNG and, salted separately, the
    /// corpus assembler's dedicated RNG; omitted means draw from the
    /// operating system's entropy source.
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(about = "Run the import/generate-graphs stage")]
    Import,
    #[command(about = "Run the import/generate-graphs stage", alias = "graph")]
    Graphs,
    #[command(about = "Run the layouts stage")]
    Layouts,
    #[command(about = "Run the interpolations stage")]
    LayInter,
    #[command(about = "Run the worsenings stage")]
    LayWorse,
    #[command(about = "Run the properties stage")]
    Properties,
    #[command(about = "Run the metrics stage")]
    Metrics,
    #[command(about = "Train the discriminator model and fit baseline weights")]
    Model,
    #[command(about = "Score the test corpus against the model and baselines")]
    Eval,
    #[command(about = "Run every stage in order, resuming from whatever is already done")]
    Run,
    #[command(about = "Scan the store for referential, file, and range violations")]
    Check {
        /// Delete rows whose repair is a safe single-row delete.
        #[arg(long)]
        repair: bool,
    },
    #[command(about = "Delete stored rows from a stage onward, for a clean re-run")]
    Clean {
        /// Innermost stage to clear; omit to clear everything including graphs.
        #[arg(long)]
        stage: Option<String>,
    },
}

/// Parse argv, run the requested command, and return the process exit code
/// per the documented convention: 0 success, 1 on any fatal/sanity/config
/// error, 130 on SIGINT.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    if let Err(err) = crate::logging::init(match cli.log_level.parse::<crate::logging::LogLevel>() {
        Ok(level) => level,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    }) {
        eprintln!("{err}");
        return 1;
    }

    match dispatch(&cli).await {
        Ok(()) if crate::errors::interrupted() => 130,
        Ok(()) => 0,
        Err(err) => {
            log::error!("{err}");
            1
        }
    }
}

async fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    let mut store = Store::open(&cli.data_dir)?;
    let config = Configuration::load(&cli.config_dir)?;
    let bad_log_path = cli.data_dir.join("badlog.bin");
    let mut bad_log = BadLog::open(Some(&bad_log_path))?;
    let seed = match cli.seed {
        Some(seed) => seed,
        None => StdRng::from_os_rng().next_u64(),
    };
    let mut rng = StdRng::seed_from_u64(seed);

    let result = run_command(&cli.command, &mut store, &config, &mut bad_log, &mut rng, seed).await;
    bad_log.flush()?;
    result
}

async fn run_command(
    command: &Command,
    store: &mut Store,
    config: &Configuration,
    bad_log: &mut BadLog,
    rng: &mut StdRng,
    corpus_seed: u64,
) -> anyhow::Result<()> {
    match command {
        Command::Import | Command::Graphs => orchestrator::run_one(Stage::Graphs, store, config, bad_log, rng, corpus_seed).await,
        Command::Layouts => orchestrator::run_one(Stage::Layouts, store, config, bad_log, rng, corpus_seed).await,
        Command::LayInter => orchestrator::run_one(Stage::LayInter, store, config, bad_log, rng, corpus_seed).await,
        Command::LayWorse => orchestrator::run_one(Stage::LayWorse, store, config, bad_log, rng, corpus_seed).await,
        Command::Properties => orchestrator::run_one(Stage::Properties, store, config, bad_log, rng, corpus_seed).await,
        Command::Metrics => orchestrator::run_one(Stage::Metrics, store, config, bad_log, rng, corpus_seed).await,
        Command::Model => orchestrator::run_one(Stage::Model, store, config, bad_log, rng, corpus_seed).await,
        Command::Eval => orchestrator::run_one(Stage::Eval, store, config, bad_log, rng, corpus_seed).await,
        Command::Run => orchestrator::run_all(store, config, bad_log, rng, corpus_seed).await,
        Command::Check { repair } => run_check(store, *repair),
        Command::Clean { stage } => run_clean(store, stage.as_deref()),
    }
}

fn run_check(store: &mut Store, repair: bool) -> anyhow::Result<()> {
    let report = crate::integrity::check(store)?;
    for issue in &report.issues {
        log::warn!("{}: {}", issue.kind, issue.detail);
    }
    if report.is_clean() {
        log::info!("integrity check found no issues");
    } else {
        log::warn!("integrity check found {} issue(s)", report.issues.len());
    }
    if repair {
        let removed = crate::integrity::repair(store, &report)?;
        log::info!("repaired {removed} row(s)");
    }
    Ok(())
}

fn run_clean(store: &mut Store, stage: Option<&str>) -> anyhow::Result<()> {
    let stage = stage.map(Action::parse).transpose()?;
    store.clean(stage)?;
    match stage {
        Some(action) => log::info!("cleaned everything from {} onward", action.name()),
        None => log::info!("cleaned the entire store"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_and_a_stage_subcommand() {
        let cli = Cli::try_parse_from([
            "graphstudy",
            "--data-dir",
            "/tmp/data",
            "--config-dir",
            "/tmp/config",
            "--seed",
            "7",
            "layouts",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, PathBuf::from("/tmp/data"));
        assert_eq!(cli.config_dir, PathBuf::from("/tmp/config"));
        assert_eq!(cli.seed, Some(7));
        assert!(matches!(cli.command, Command::Layouts));
    }

    #[test]
    fn parses_check_with_repair_flag() {
        let cli = Cli::try_parse_from(["graphstudy", "check", "--repair"]).unwrap();
        assert!(matches!(cli.command, Command::Check { repair: true }));
    }

    #[test]
    fn parses_clean_with_optional_stage() {
        let cli = Cli::try_parse_from(["graphstudy", "clean", "--stage", "model"]).unwrap();
        match cli.command {
            Command::Clean { stage } => assert_eq!(stage.as_deref(), Some("model")),
            _ => panic!("expected Clean"),
        }
    }

    #[test]
    fn import_and_graphs_are_aliases_for_the_same_dispatch() {
        let import = Cli::try_parse_from(["graphstudy", "import"]).unwrap();
        let graphs = Cli::try_parse_from(["graphstudy", "graphs"]).unwrap();
        assert!(matches!(import.command, Command::Import));
        assert!(matches!(graphs.command, Command::Graphs));
    }
}
