//! File-naming rules and the tagged data-root directory layout. Files are
//! written to a temporary path first and moved into place with `rename` so a
//! crash mid-write never leaves a half-written artifact referenced by a row.

use crate::constants::DATA_ROOT_TAG_FILE;
use crate::constants::DATA_ROOT_TAG_MAGIC;
use crate::constants::GRAPH_FILE_SUFFIX;
use crate::constants::LAYOUT_FILE_SUFFIX;
use crate::constants::Generator;
use crate::constants::LayoutKind;
use crate::constants::Prop;
use crate::ids::Id16;
use std::path::Path;
use std::path::PathBuf;

/// Ensure `root` is (or can become) a tagged data root: write the tag file if
/// the directory is empty, or verify it if the tag already exists. Refuses to
/// operate on a directory that holds unrelated content.
pub fn ensure_data_root(root: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(root)
        .map_err(|e| anyhow::anyhow!("cannot create data root {}: {e}", root.display()))?;
    let tag = root.join(DATA_ROOT_TAG_FILE);
    match std::fs::read_to_string(&tag) {
        Ok(contents) => {
            if contents != DATA_ROOT_TAG_MAGIC {
                anyhow::bail!("{} exists but has an unrecognized tag", tag.display());
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let mut entries = std::fs::read_dir(root)?;
            if entries.next().is_some() {
                anyhow::bail!(
                    "refusing to use {} as a data root: directory is non-empty and untagged",
                    root.display()
                );
            }
            std::fs::write(&tag, DATA_ROOT_TAG_MAGIC)?;
        }
        Err(e) => return Err(anyhow::anyhow!("cannot read {}: {e}", tag.display())),
    }
    Ok(())
}

pub fn graphs_dir(root: &Path) -> PathBuf {
    root.join("graphs")
}

pub fn layouts_dir(root: &Path) -> PathBuf {
    root.join("layouts")
}

pub fn properties_dir(root: &Path) -> PathBuf {
    root.join("properties")
}

/// `<data-root>/model/`, shared with `crate::model::persistence` and
/// `crate::baselines`' own `huang.json`; kept as a second literal here (not a
/// call into `model::model_dir`) so `clean` never has to reach upward into a
/// module that itself depends on the store.
pub fn model_dir(root: &Path) -> PathBuf {
    root.join("model")
}

pub fn graph_path(root: &Path, id: Id16, generator: Generator) -> PathBuf {
    graphs_dir(root).join(format!("{}-{}{GRAPH_FILE_SUFFIX}", id, generator.name()))
}

pub fn layout_path(root: &Path, graph: Id16, id: Id16, kind: Option<LayoutKind>) -> PathBuf {
    let stem = match kind {
        Some(k) => format!("{id}-{}", k.name()),
        None => id.to_string(),
    };
    layouts_dir(root).join(graph.to_string()).join(format!("{stem}{LAYOUT_FILE_SUFFIX}"))
}

fn property_dir(root: &Path, id: Id16, prop: Prop) -> PathBuf {
    let hex = id.to_string();
    let (head, tail) = hex.split_at(2);
    properties_dir(root).join(head).join(tail).join(prop.name())
}

/// Remove a directory tree if present, for `clean`; a directory that was
/// never created (e.g. no properties computed yet) is not an error.
pub fn remove_dir_if_exists(path: &Path) -> anyhow::Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(anyhow::anyhow!("cannot remove {}: {e}", path.display())),
    }
}

/// Remove a single file if present, for `clean`'s per-row deletes; tolerates
/// a file already missing the same way the original's `clean_inter`/
/// `clean_worse` swallow `FileNotFoundError`.
pub fn remove_file_if_exists(path: &Path) -> anyhow::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(anyhow::anyhow!("cannot remove {}: {e}", path.display())),
    }
}

pub fn histogram_path(root: &Path, id: Id16, prop: Prop, bincount: u64) -> PathBuf {
    property_dir(root, id, prop).join(format!("histogram-{bincount}.xml.gz"))
}

pub fn sliding_average_path(root: &Path, id: Id16, prop: Prop, sigma: f64) -> PathBuf {
    property_dir(root, id, prop).join(format!("gaussian-{sigma}.xml.gz"))
}

/// Move `tmp` into `dest`, creating parent directories as needed. The rename
/// itself is atomic on a single filesystem; `tmp` and `dest` must be on the
/// same device.
pub fn commit(tmp: &Path, dest: &Path) -> anyhow::Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::rename(tmp, dest)
        .map_err(|e| anyhow::anyhow!("cannot move {} to {}: {e}", tmp.display(), dest.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_an_empty_directory_and_accepts_it_again() {
        let dir = tempfile::tempdir().unwrap();
        ensure_data_root(dir.path()).unwrap();
        ensure_data_root(dir.path()).unwrap();
        assert!(dir.path().join(DATA_ROOT_TAG_FILE).exists());
    }

    #[test]
    fn refuses_an_untagged_nonempty_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("unrelated.txt"), b"hi").unwrap();
        assert!(ensure_data_root(dir.path()).is_err());
    }
}
