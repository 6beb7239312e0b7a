//! Typed desired-sets per stage, parsed from plain-text files under a
//! configuration directory. One file per concern.

mod corpus;
mod graphs;
mod imports;
mod properties;
mod puncture;
mod rates;
mod reader;
mod sizes;

pub use corpus::CorpusConfig;
pub use graphs::GraphsConfig;
pub use imports::ImportSourceSpec;
pub use imports::ImportsConfig;
pub use properties::PropertiesConfig;
pub use puncture::PunctureConfig;
pub use rates::RatesConfig;
pub use reader::ConfigReader;
pub use sizes::SizeSetConfig;

use crate::constants::InterKind;
use crate::constants::Kernel;
use crate::constants::WorseKind;
use std::path::Path;
use std::path::PathBuf;

/// The desired-set configuration files, loaded together.
pub struct Configuration {
    pub configdir: PathBuf,
    pub import_sources: ImportsConfig,
    pub desired_graphs: GraphsConfig,
    pub desired_layouts: SizeSetConfig<crate::constants::LayoutKind>,
    pub desired_lay_inter: RatesConfig<InterKind>,
    pub desired_lay_worse: RatesConfig<WorseKind>,
    pub desired_properties_disc: PropertiesConfig,
    pub desired_properties_cont: PropertiesConfig,
    pub desired_metrics: SizeSetConfig<crate::constants::MetricKind>,
    pub puncture: PunctureConfig,
    pub corpus: CorpusConfig,
}

impl Configuration {
    pub fn load(configdir: &Path) -> anyhow::Result<Self> {
        let mut seen = Vec::new();
        let config = Self {
            configdir: configdir.to_path_buf(),
            import_sources: ImportsConfig::load(configdir, &mut seen)?,
            desired_graphs: GraphsConfig::load(configdir, &mut seen)?,
            desired_layouts: SizeSetConfig::load(configdir, "layouts.cfg", &mut seen, |t| {
                crate::constants::LayoutKind::parse(t)
            })?,
            desired_lay_inter: RatesConfig::load(configdir, "lay-inter.cfg", &mut seen, |t| {
                InterKind::parse(t)
            })?,
            desired_lay_worse: RatesConfig::load(configdir, "lay-worse.cfg", &mut seen, |t| {
                WorseKind::parse(t)
            })?,
            desired_properties_disc: PropertiesConfig::load(
                configdir,
                "properties-disc.cfg",
                Kernel::disc(),
                &mut seen,
            )?,
            desired_properties_cont: PropertiesConfig::load(
                configdir,
                "properties-cont.cfg",
                Kernel::cont(),
                &mut seen,
            )?,
            desired_metrics: SizeSetConfig::load(configdir, "metrics.cfg", &mut seen, |t| {
                crate::constants::MetricKind::parse(t)
            })?,
            puncture: PunctureConfig::load(configdir, &mut seen)?,
            corpus: CorpusConfig::load(configdir, &mut seen)?,
        };
        warn_unrecognized_files(configdir, &seen);
        check_puncture_envvar(&config.puncture)?;
        Ok(config)
    }
}

fn warn_unrecognized_files(configdir: &Path, recognized: &[PathBuf]) {
    let Ok(entries) = std::fs::read_dir(configdir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("cfg")
            || path.extension().and_then(|e| e.to_str()) == Some("json")
        {
            if !recognized.contains(&path) {
                log::warn!("unrecognized configuration file {:?}", path);
            }
        }
    }
}

/// `MSC_PUNCTURE` asserts `len(puncture) == expected` at startup.
fn check_puncture_envvar(puncture: &PunctureConfig) -> anyhow::Result<()> {
    let Ok(raw) = std::env::var("MSC_PUNCTURE") else {
        log::warn!("environment variable MSC_PUNCTURE is not set; cannot check punctures");
        return Ok(());
    };
    let expected: usize = match raw.parse() {
        Ok(n) => n,
        Err(_) => {
            log::warn!("ignoring bogus value of environment variable MSC_PUNCTURE={raw:?}");
            return Ok(());
        }
    };
    if expected != puncture.properties.len() {
        return Err(crate::errors::GraphStudyError::sanity(format!(
            "expected {expected} punctured properties but found {}",
            puncture.properties.len()
        ))
        .into());
    }
    Ok(())
}
