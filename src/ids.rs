//! Opaque 16-byte IDs, presented as lowercase hex.
//!
//! An all-zero `Id16` is the sentinel meaning "no ID".

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Id16([u8; 16]);

impl Id16 {
    pub const NONE: Id16 = Id16([0u8; 16]);

    /// Panics if `bytes` is not exactly 16 bytes long; callers reading a
    /// fixed-width BLOB column can rely on that invariant.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let arr: [u8; 16] = bytes.try_into().expect("id must be exactly 16 bytes");
        Self(arr)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    /// Draw 16 random bytes from the given RNG.
    pub fn random(rng: &mut impl rand::RngCore) -> Self {
        let mut bytes = [0u8; 16];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Id16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Id16 {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| anyhow::anyhow!("invalid id hex {s:?}: {e}"))?;
        let arr: [u8; 16] = bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("id must be exactly 16 bytes, got {s:?}"))?;
        Ok(Self(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn none_is_all_zero_and_falsy() {
        assert!(Id16::NONE.is_none());
        assert_eq!(Id16::NONE.to_hex(), "00000000000000000000000000000000");
    }

    #[test]
    fn roundtrips_through_hex() {
        let id = Id16::from_bytes(&[0xCA; 16]);
        let text = id.to_hex();
        let parsed: Id16 = text.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn random_ids_are_well_formed() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let id = Id16::random(&mut rng);
        assert_eq!(id.bytes().len(), 16);
    }

    #[test]
    fn equal_iff_same_bytes() {
        let a = Id16::from_bytes(&[1; 16]);
        let b = Id16::from_bytes(&[1; 16]);
        let c = Id16::from_bytes(&[2; 16]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
