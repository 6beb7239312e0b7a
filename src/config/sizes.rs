//! Generic "key -> set of graph sizes" config, shared by `layouts.cfg` and
//! `metrics.cfg`. Supports a `...` range syntax: a leading `...` means "from
//! the smallest size", a trailing `...` means "through the largest", and
//! `LO ... HI` means the inclusive range.

use super::reader::ConfigReader;
use crate::constants::GraphSize;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;

pub struct SizeSetConfig<T> {
    pub desired: BTreeMap<T, BTreeSet<GraphSize>>,
}

impl<T: Ord + Copy> SizeSetConfig<T> {
    pub fn load(
        configdir: &Path,
        basename: &str,
        seen: &mut Vec<std::path::PathBuf>,
        parse_key: impl Fn(&str) -> anyhow::Result<T>,
    ) -> anyhow::Result<Self> {
        let path = configdir.join(basename);
        if !path.exists() {
            return Ok(Self {
                desired: BTreeMap::new(),
            });
        }
        seen.push(path.clone());
        let reader = ConfigReader::open(&path)?;
        let mut desired = BTreeMap::new();
        for (lineno, line) in reader {
            let mut words = line.split_whitespace();
            let head = words
                .next()
                .ok_or_else(|| crate::errors::GraphStudyError::config("empty row", basename, Some(lineno)))?;
            let key = parse_key(head)
                .map_err(|e| crate::errors::GraphStudyError::config(e.to_string(), basename, Some(lineno)))?;
            if desired.contains_key(&key) {
                return Err(crate::errors::GraphStudyError::config(
                    "duplicate row",
                    basename,
                    Some(lineno),
                )
                .into());
            }
            let tail: Vec<&str> = words.collect();
            let sizes = expand_size_range(&tail).map_err(|msg| {
                crate::errors::GraphStudyError::config(msg, basename, Some(lineno))
            })?;
            desired.insert(key, sizes);
        }
        Ok(Self { desired })
    }
}

fn expand_size_range(words: &[&str]) -> Result<BTreeSet<GraphSize>, String> {
    if words.is_empty() {
        return Ok(BTreeSet::new());
    }
    let mut specs: Vec<Option<GraphSize>> = Vec::new();
    for w in words {
        if *w == "..." {
            specs.push(None);
        } else {
            specs.push(Some(
                GraphSize::parse(w).map_err(|_| format!("unknown graph size: {w}"))?,
            ));
        }
    }
    if specs.first() == Some(&None) {
        specs.insert(0, Some(*GraphSize::all().first().unwrap()));
    }
    if specs.last() == Some(&None) {
        specs.push(Some(*GraphSize::all().last().unwrap()));
    }
    let mut result = BTreeSet::new();
    let mut i = 0;
    while i < specs.len() {
        match specs[i] {
            Some(size) => {
                result.insert(size);
                i += 1;
            }
            None => {
                let lo = specs[i - 1].expect("range has a resolved lower bound");
                let hi = specs[i + 1].expect("range has a resolved upper bound");
                if lo > hi {
                    return Err(format!(
                        "{:?} ... {:?} is not a valid range",
                        lo, hi
                    ));
                }
                for z in GraphSize::all() {
                    if *z >= lo && *z <= hi {
                        result.insert(*z);
                    }
                }
                i += 1;
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::LayoutKind;

    #[test]
    fn parses_ranges_and_explicit_lists() {
        let text = "RANDOM_NORMAL    MEDIUM ...\nRANDOM_UNIFORM   ... MEDIUM\nNATIVE           ...\nFMMM             LARGE TINY\nSTRESS           SMALL ... LARGE\n";
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("layouts.cfg"), text).unwrap();
        let mut seen = Vec::new();
        let cfg = SizeSetConfig::load(dir.path(), "layouts.cfg", &mut seen, LayoutKind::parse).unwrap();
        assert_eq!(
            cfg.desired[&LayoutKind::Native],
            GraphSize::all().iter().copied().collect()
        );
        assert!(cfg.desired[&LayoutKind::Fmmm].contains(&GraphSize::Large));
        assert!(cfg.desired[&LayoutKind::Fmmm].contains(&GraphSize::Tiny));
        assert_eq!(cfg.desired[&LayoutKind::Fmmm].len(), 2);
        assert!(cfg.desired[&LayoutKind::Stress].contains(&GraphSize::Medium));
    }
}
