//! Tar (optionally gzip-compressed) import source: fetches the archive once
//! into the cache directory (downloading if `url` looks like an http(s)
//! location, copying otherwise), verifies an optional checksum, then yields
//! each matching entry.

use super::url::fetch_to_cache;
use super::GraphBlob;
use super::ImportSource;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

pub struct TarSource {
    entries: std::vec::IntoIter<GraphBlob>,
}

impl TarSource {
    pub async fn new(
        url: PathBuf,
        cache: PathBuf,
        checksum: Option<String>,
        pattern: Option<String>,
    ) -> anyhow::Result<Self> {
        let archive_path = fetch_to_cache(&url.to_string_lossy(), &cache).await?;
        if let Some(expected) = &checksum {
            verify_checksum(&archive_path, expected)?;
        }
        let entries = extract(&archive_path, pattern.as_deref())?;
        Ok(Self {
            entries: entries.into_iter(),
        })
    }
}

fn verify_checksum(path: &Path, expected: &str) -> anyhow::Result<()> {
    let fingerprint = crate::fingerprint::Fingerprint::of_file(path)?;
    if fingerprint.to_hex() != expected.to_ascii_lowercase() {
        anyhow::bail!(
            "checksum mismatch for {}: expected {expected}, got {}",
            path.display(),
            fingerprint.to_hex()
        );
    }
    Ok(())
}

fn extract(path: &Path, pattern: Option<&str>) -> anyhow::Result<Vec<GraphBlob>> {
    let file = std::fs::File::open(path).map_err(|e| anyhow::anyhow!("cannot open {}: {e}", path.display()))?;
    let reader: Box<dyn Read> = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        Box::new(flate2::read::GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    let mut archive = ::tar::Archive::new(reader);
    let mut blobs = Vec::new();
    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry.path()?.to_string_lossy().into_owned();
        if !matches_pattern(&name, pattern) {
            continue;
        }
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        blobs.push(GraphBlob { name, bytes });
    }
    blobs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(blobs)
}

fn matches_pattern(name: &str, pattern: Option<&str>) -> bool {
    let Some(pattern) = pattern else {
        return true;
    };
    match pattern.strip_prefix('*') {
        Some(suffix) => name.ends_with(suffix),
        None => name == pattern,
    }
}

#[async_trait::async_trait]
impl ImportSource for TarSource {
    async fn next(&mut self) -> anyhow::Result<Option<GraphBlob>> {
        Ok(self.entries.next())
    }
}
