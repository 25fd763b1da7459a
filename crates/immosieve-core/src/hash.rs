//! Stable hashing for query plans and result digests.

use blake3::Hasher;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn to_hex(&self) -> String {
        use std::fmt::Write as _;
        self.0.iter().fold(String::with_capacity(64), |mut s, b| {
            let _ = write!(&mut s, "{:02x}", b);
            s
        })
    }

    /// Combine two digests into one, order-independently.
    pub fn xor(self, other: Hash256) -> Hash256 {
        let mut out = [0u8; 32];
        for (o, (a, b)) in out.iter_mut().zip(self.0.iter().zip(other.0.iter())) {
            *o = a ^ b;
        }
        Hash256(out)
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

pub fn hash_bytes(bytes: &[u8]) -> Hash256 {
    let mut h = Hasher::new();
    h.update(bytes);
    Hash256(h.finalize().into())
}

pub fn hash_str(s: &str) -> Hash256 {
    hash_bytes(s.as_bytes())
}

/// Hash any serde-serializable value deterministically (via JSON).
pub fn hash_serde<T: Serialize>(v: &T) -> Result<Hash256, crate::error::Error> {
    let bytes = serde_json::to_vec(v)?;
    Ok(hash_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_is_64_chars() {
        let h = hash_str("zimmer>=3");
        assert_eq!(h.to_hex().len(), 64);
        assert_eq!(h, hash_str("zimmer>=3"));
        assert_ne!(h, hash_str("zimmer>3"));
    }

    #[test]
    fn test_xor_commutes() {
        let a = hash_str("a");
        let b = hash_str("b");
        assert_eq!(a.xor(b), b.xor(a));
        assert_eq!(a.xor(a), Hash256([0u8; 32]));
    }
}
