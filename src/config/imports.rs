//! `imports.json`: a map from import-generator name to a source definition
//! object with `type ∈ {"DIR", "TAR", "URL"}` and type-specific attributes.
//! Unknown attributes are rejected; every key must name an import generator.

use crate::constants::Generator;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

const BASENAME: &str = "imports.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ImportSourceSpec {
    #[serde(rename = "DIR")]
    Dir {
        directory: PathBuf,
        pattern: Option<String>,
        #[serde(default)]
        recursive: bool,
    },
    #[serde(rename = "TAR")]
    Tar {
        url: PathBuf,
        cache: Option<PathBuf>,
        checksum: Option<String>,
        pattern: Option<String>,
    },
    #[serde(rename = "URL")]
    Url {
        urls: Vec<String>,
        name: String,
        cache: PathBuf,
    },
}

pub struct ImportsConfig {
    pub sources: BTreeMap<Generator, ImportSourceSpec>,
}

impl ImportsConfig {
    pub fn load(configdir: &Path, seen: &mut Vec<PathBuf>) -> anyhow::Result<Self> {
        let path = configdir.join(BASENAME);
        if !path.exists() {
            return Ok(Self {
                sources: BTreeMap::new(),
            });
        }
        seen.push(path.clone());
        let text = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            crate::errors::GraphStudyError::config(format!("malformed JSON: {e}"), BASENAME, Some(e.line()))
        })?;
        let serde_json::Value::Object(map) = value else {
            return Err(crate::errors::GraphStudyError::config(
                "expected a JSON object mapping generator names to import sources",
                BASENAME,
                None,
            )
            .into());
        };
        let mut sources = BTreeMap::new();
        for (key, item) in map {
            let generator = Generator::parse(&key).map_err(|_| {
                crate::errors::GraphStudyError::config(format!("unknown import generator: {key}"), BASENAME, None)
            })?;
            if !generator.imported() {
                return Err(crate::errors::GraphStudyError::config(
                    format!("{key} is not an import generator"),
                    BASENAME,
                    None,
                )
                .into());
            }
            let source: ImportSourceSpec = serde_json::from_value(item).map_err(|e| {
                crate::errors::GraphStudyError::config(format!("invalid import source for {key}: {e}"), BASENAME, None)
            })?;
            sources.insert(generator, source);
        }
        Ok(Self { sources })
    }
}
