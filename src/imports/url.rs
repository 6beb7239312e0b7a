//! URL import source: fetch each candidate URL in turn until one succeeds,
//! cache the bytes keyed by checksum, and yield a single named blob.

use super::GraphBlob;
use super::ImportSource;
use std::path::Path;
use std::path::PathBuf;

pub struct UrlSource {
    urls: std::vec::IntoIter<String>,
    name: String,
    cache: PathBuf,
    done: bool,
}

impl UrlSource {
    pub fn new(urls: Vec<String>, name: String, cache: PathBuf) -> Self {
        Self {
            urls: urls.into_iter(),
            name,
            cache,
            done: false,
        }
    }
}

#[async_trait::async_trait]
impl ImportSource for UrlSource {
    async fn next(&mut self) -> anyhow::Result<Option<GraphBlob>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;
        let mut last_error = None;
        for url in self.urls.by_ref() {
            match fetch_to_cache(&url, &self.cache).await {
                Ok(path) => {
                    let bytes = tokio::fs::read(&path).await?;
                    return Ok(Some(GraphBlob {
                        name: self.name.clone(),
                        bytes,
                    }));
                }
                Err(e) => last_error = Some(e),
            }
        }
        match last_error {
            Some(e) => Err(anyhow::anyhow!("all candidate URLs for {:?} failed: {e}", self.name)),
            None => Ok(None),
        }
    }
}

/// Fetch `source` into `cache`, keyed by a content-addressed name so repeat
/// runs reuse the download. `source` may be a local path or an http(s) URL.
pub async fn fetch_to_cache(source: &str, cache: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(cache)?;
    if !source.starts_with("http://") && !source.starts_with("https://") {
        return Ok(PathBuf::from(source));
    }
    let key = crate::fingerprint::Fingerprint::of_bytes(source.as_bytes()).to_hex();
    let dest = cache.join(&key);
    if dest.exists() {
        return Ok(dest);
    }
    let response = reqwest::get(source)
        .await
        .map_err(|e| anyhow::anyhow!("cannot fetch {source}: {e}"))?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("cannot fetch {source}: {e}"))?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| anyhow::anyhow!("cannot read response body from {source}: {e}"))?;
    let tmp = cache.join(format!("{key}.tmp"));
    std::fs::write(&tmp, &bytes)?;
    std::fs::rename(&tmp, &dest)?;
    Ok(dest)
}
