//! Content-hash fingerprints, used to detect duplicate graphs/layouts.
//!
//! Once computed for a stored artifact, a fingerprint is never recomputed or
//! changed in place.

use sha2::Digest;
use sha2::Sha256;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(Vec<u8>);

impl Fingerprint {
    pub fn of_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().to_vec())
    }

    pub fn of_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| anyhow::anyhow!("fingerprint: cannot read {}: {e}", path.display()))?;
        Ok(Self::of_bytes(&data))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_and_content_sensitive() {
        let a = Fingerprint::of_bytes(b"hello");
        let b = Fingerprint::of_bytes(b"hello");
        let c = Fingerprint::of_bytes(b"world");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
