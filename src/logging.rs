//! Logging setup and the SIGINT handler: a term + file logger via `simplelog`,
//! with ctrl-c flipping the process-wide interrupt flag for graceful shutdown.

use std::str::FromStr;

/// Logging levels selectable by well-known name, with unambiguous-abbreviation
/// matching (e.g. "WARN" and "W" both resolve to `Warning`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    const ALL: [(&'static str, LogLevel); 4] = [
        ("DEBUG", LogLevel::Debug),
        ("INFO", LogLevel::Info),
        ("WARNING", LogLevel::Warning),
        ("ERROR", LogLevel::Error),
    ];

    pub fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let canonical = name.trim().to_ascii_uppercase();
        let candidates: Vec<_> = Self::ALL
            .iter()
            .filter(|(full, _)| full.starts_with(&canonical))
            .collect();
        match candidates.as_slice() {
            [] => anyhow::bail!("Unknown logging level: {name:?}"),
            [(_, level)] => Ok(*level),
            many => {
                let names: Vec<_> = many.iter().map(|(full, _)| *full).collect();
                anyhow::bail!(
                    "Ambiguous logging level {name:?} matches multiple names: {}",
                    names.join(", ")
                )
            }
        }
    }
}

/// Initialize term + file logging and install the SIGINT handler. Call once
/// from the binary entry point before touching the store.
pub fn init(level: LogLevel) -> anyhow::Result<()> {
    std::fs::create_dir_all("logs")?;
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{stamp}.log"))?,
    );
    let term = simplelog::TermLogger::new(
        level.to_filter(),
        config,
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file])
        .map_err(|e| anyhow::anyhow!("logger already initialized: {e}"))?;
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupt received, finishing current unit of work");
            crate::errors::set_interrupted();
        }
    });
    Ok(())
}
