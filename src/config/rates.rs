//! Rate-table configs (`lay-inter.cfg`, `lay-worse.cfg`): one row per method,
//! listing the transformation rates in `[0, 1]` to compute.

use super::reader::ConfigReader;
use std::collections::BTreeMap;
use std::path::Path;

pub struct RatesConfig<T> {
    pub desired: BTreeMap<T, Vec<f64>>,
}

impl<T: Ord + Copy> RatesConfig<T> {
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
            let head = words.next().ok_or_else(|| {
                crate::errors::GraphStudyError::config("empty row", basename, Some(lineno))
            })?;
            let key = parse_key(head).map_err(|e| {
                crate::errors::GraphStudyError::config(e.to_string(), basename, Some(lineno))
            })?;
            if desired.contains_key(&key) {
                return Err(
                    crate::errors::GraphStudyError::config("duplicate row", basename, Some(lineno))
                        .into(),
                );
            }
            let mut rates = Vec::new();
            for w in words {
                let r: f64 = w.parse().map_err(|_| {
                    crate::errors::GraphStudyError::config(
                        format!("not a floating-point value: {w}"),
                        basename,
                        Some(lineno),
                    )
                })?;
                if !(0.0..=1.0).contains(&r) {
                    return Err(crate::errors::GraphStudyError::config(
                        format!("transformation rates must be in the unit interval (note: {r})"),
                        basename,
                        Some(lineno),
                    )
                    .into());
                }
                rates.push(r);
            }
            desired.insert(key, rates);
        }
        Ok(Self { desired })
    }

    /// Quantized rates still missing for `key`: multiply by 1000 and round
    /// before comparing, so floating-point jitter doesn't cause re-computation.
    pub fn missing(&self, key: &T, have: &[f64]) -> Vec<f64> {
        let Some(wanted) = self.desired.get(key) else {
            return Vec::new();
        };
        let have_q: std::collections::BTreeSet<i64> =
            have.iter().map(|r| (r * 1000.0).round() as i64).collect();
        wanted
            .iter()
            .filter(|r| !have_q.contains(&((*r * 1000.0).round() as i64)))
            .copied()
            .collect()
    }
}
