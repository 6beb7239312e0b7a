//! `properties-disc.cfg` / `properties-cont.cfg`: the set of properties
//! desired for a given kernel kind. Syntax is a flat list of property names.

use super::reader::ConfigReader;
use crate::constants::Kernel;
use crate::constants::Prop;
use std::collections::BTreeSet;
use std::path::Path;

pub struct PropertiesConfig {
    pub kernel: Kernel,
    pub desired: BTreeSet<Prop>,
}

impl PropertiesConfig {
    pub fn load(
        configdir: &Path,
        basename: &str,
        kernel: Kernel,
        seen: &mut Vec<std::path::PathBuf>,
    ) -> anyhow::Result<Self> {
        let path = configdir.join(basename);
        if !path.exists() {
            return Ok(Self {
                kernel,
                desired: Prop::all().iter().copied().collect(),
            });
        }
        seen.push(path.clone());
        let reader = ConfigReader::open(&path)?;
        let mut desired = BTreeSet::new();
        for (lineno, line) in reader {
            let word = line.split_whitespace().next().ok_or_else(|| {
                crate::errors::GraphStudyError::config("empty row", basename, Some(lineno))
            })?;
            let prop = Prop::parse(word).map_err(|_| {
                crate::errors::GraphStudyError::config(
                    format!("unknown property: {word}"),
                    basename,
                    Some(lineno),
                )
            })?;
            desired.insert(prop);
        }
        Ok(Self { kernel, desired })
    }
}
