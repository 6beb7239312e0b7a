//! Directory import source: walk a directory (optionally recursively),
//! yielding files whose name matches an optional glob-lite `pattern`
//! (a single leading `*` wildcard, e.g. `*.xml.gz`).

use super::GraphBlob;
use super::ImportSource;
use std::path::PathBuf;
use walkdir::WalkDir;

pub struct DirSource {
    entries: std::vec::IntoIter<PathBuf>,
}

impl DirSource {
    pub fn new(directory: PathBuf, pattern: Option<String>, recursive: bool) -> anyhow::Result<Self> {
        if !directory.is_dir() {
            anyhow::bail!("import directory {} does not exist", directory.display());
        }
        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut entries: Vec<PathBuf> = WalkDir::new(&directory)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| matches_pattern(p, pattern.as_deref()))
            .collect();
        entries.sort();
        Ok(Self {
            entries: entries.into_iter(),
        })
    }
}

fn matches_pattern(path: &std::path::Path, pattern: Option<&str>) -> bool {
    let Some(pattern) = pattern else {
        return true;
    };
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    match pattern.strip_prefix('*') {
        Some(suffix) => name.ends_with(suffix),
        None => name == pattern,
    }
}

#[async_trait::async_trait]
impl ImportSource for DirSource {
    async fn next(&mut self) -> anyhow::Result<Option<GraphBlob>> {
        let Some(path) = self.entries.next() else {
            return Ok(None);
        };
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("import")
            .to_string();
        Ok(Some(GraphBlob { name, bytes }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn yields_matching_files_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.xml.gz"), b"b").unwrap();
        std::fs::write(dir.path().join("a.xml.gz"), b"a").unwrap();
        std::fs::write(dir.path().join("ignore.txt"), b"x").unwrap();
        let mut source = DirSource::new(dir.path().to_path_buf(), Some("*.xml.gz".into()), false).unwrap();
        let first = source.next().await.unwrap().unwrap();
        let second = source.next().await.unwrap().unwrap();
        assert_eq!(first.name, "a.xml.gz");
        assert_eq!(second.name, "b.xml.gz");
        assert!(source.next().await.unwrap().is_none());
    }
}
