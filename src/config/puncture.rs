//! `puncture.cfg`: properties to EXCLUDE from feature vectors (ablation hook).

use super::reader::ConfigReader;
use crate::constants::Prop;
use std::collections::BTreeSet;
use std::path::Path;

const BASENAME: &str = "puncture.cfg";

#[derive(Debug, Clone, Default)]
pub struct PunctureConfig {
    pub properties: BTreeSet<Prop>,
}

impl PunctureConfig {
    pub fn load(configdir: &Path, seen: &mut Vec<std::path::PathBuf>) -> anyhow::Result<Self> {
        let path = configdir.join(BASENAME);
        if !path.exists() {
            return Ok(Self {
                properties: BTreeSet::new(),
            });
        }
        seen.push(path.clone());
        let reader = ConfigReader::open(&path)?;
        let mut properties = BTreeSet::new();
        for (lineno, line) in reader {
            let word = line.split_whitespace().next().ok_or_else(|| {
                crate::errors::GraphStudyError::config("empty row", BASENAME, Some(lineno))
            })?;
            let prop = Prop::parse(word).map_err(|_| {
                crate::errors::GraphStudyError::config(
                    format!("unknown property: {word}"),
                    BASENAME,
                    Some(lineno),
                )
            })?;
            properties.insert(prop);
        }
        Ok(Self { properties })
    }

    pub fn is_punctured(&self, prop: Prop) -> bool {
        self.properties.contains(&prop)
    }
}
