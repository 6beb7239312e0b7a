//! `graphs.cfg`: a matrix of (generator, size) -> desired count.

use super::reader::ConfigReader;
use crate::constants::GraphSize;
use crate::constants::Generator;
use std::collections::BTreeMap;
use std::path::Path;

pub struct GraphsConfig {
    /// `None` count means "unbounded" (`*` in the file).
    pub desired: BTreeMap<(Generator, GraphSize), Option<u64>>,
}

const BASENAME: &str = "graphs.cfg";

impl GraphsConfig {
    pub fn load(configdir: &Path, seen: &mut Vec<std::path::PathBuf>) -> anyhow::Result<Self> {
        let path = configdir.join(BASENAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        seen.push(path.clone());
        let reader = ConfigReader::open(&path)?;
        let mut desired = BTreeMap::new();
        let mut sizes: Option<Vec<GraphSize>> = None;
        for (lineno, line) in reader {
            let words: Vec<&str> = line.split_whitespace().collect();
            match &sizes {
                None => {
                    let mut row = Vec::new();
                    for w in &words {
                        row.push(GraphSize::parse(w).map_err(|_| {
                            crate::errors::GraphStudyError::config(
                                format!("unknown graph size: {w}"),
                                BASENAME,
                                Some(lineno),
                            )
                        })?);
                    }
                    sizes = Some(row);
                }
                Some(header) => {
                    let (head, tail) = words.split_first().ok_or_else(|| {
                        crate::errors::GraphStudyError::config("empty row", BASENAME, Some(lineno))
                    })?;
                    let gen = Generator::parse(head).map_err(|_| {
                        crate::errors::GraphStudyError::config(
                            format!("unknown graph generator: {head}"),
                            BASENAME,
                            Some(lineno),
                        )
                    })?;
                    if tail.len() != header.len() {
                        return Err(crate::errors::GraphStudyError::config(
                            format!("expected {} columns but found {}", header.len(), tail.len()),
                            BASENAME,
                            Some(lineno),
                        )
                        .into());
                    }
                    for (size, word) in header.iter().zip(tail) {
                        let count = if *word == "*" {
                            None
                        } else {
                            let n: i64 = word.parse().map_err(|_| {
                                crate::errors::GraphStudyError::config(
                                    format!("not a valid integer: {word}"),
                                    BASENAME,
                                    Some(lineno),
                                )
                            })?;
                            if n < 0 {
                                return Err(crate::errors::GraphStudyError::config(
                                    "number of graphs cannot be negative",
                                    BASENAME,
                                    Some(lineno),
                                )
                                .into());
                            }
                            Some(n as u64)
                        };
                        desired.insert((gen, *size), count);
                    }
                }
            }
        }
        Ok(Self { desired })
    }
}

impl Default for GraphsConfig {
    /// Three small + two medium graphs per non-import generator, plus five
    /// small ROME imports.
    fn default() -> Self {
        let mut desired = BTreeMap::new();
        for gen in Generator::all().iter().filter(|g| !g.imported()) {
            desired.insert((*gen, GraphSize::Small), Some(3));
            desired.insert((*gen, GraphSize::Medium), Some(2));
        }
        desired.insert((Generator::Rome, GraphSize::Small), Some(5));
        Self { desired }
    }
}
