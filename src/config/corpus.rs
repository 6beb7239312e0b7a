//! `corpus.cfg`: a single `dedup-threshold VALUE` row controlling how
//! aggressively the corpus assembler drops pairs whose layouts look like
//! near-duplicates. Only exact-match dedup (threshold `0.0`) is implemented;
//! a positive threshold is rejected at load time.

use super::reader::ConfigReader;
use std::path::Path;

const BASENAME: &str = "corpus.cfg";

pub struct CorpusConfig {
    pub dedup_threshold: f64,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self { dedup_threshold: 0.0 }
    }
}

impl CorpusConfig {
    pub fn load(configdir: &Path, seen: &mut Vec<std::path::PathBuf>) -> anyhow::Result<Self> {
        let path = configdir.join(BASENAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        seen.push(path.clone());
        let reader = ConfigReader::open(&path)?;
        let mut dedup_threshold = 0.0;
        for (lineno, line) in reader {
            let mut words = line.split_whitespace();
            let key = words
                .next()
                .ok_or_else(|| crate::errors::GraphStudyError::config("empty row", BASENAME, Some(lineno)))?;
            if key != "dedup-threshold" {
                return Err(crate::errors::GraphStudyError::config(
                    format!("unknown corpus config key: {key}"),
                    BASENAME,
                    Some(lineno),
                )
                .into());
            }
            let value: f64 = words
                .next()
                .ok_or_else(|| crate::errors::GraphStudyError::config("dedup-threshold needs a value", BASENAME, Some(lineno)))?
                .parse()
                .map_err(|_| crate::errors::GraphStudyError::config("dedup-threshold must be a float", BASENAME, Some(lineno)))?;
            if value > 0.0 {
                return Err(crate::errors::GraphStudyError::config(
                    "near-duplicate dedup is not implemented; only dedup-threshold 0.0 (exact match) is supported",
                    BASENAME,
                    Some(lineno),
                )
                .into());
            }
            dedup_threshold = value;
        }
        Ok(Self { dedup_threshold })
    }
}
