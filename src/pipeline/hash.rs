//! Content fingerprinting.

use sha2::{Digest, Sha256};

use crate::models::Fingerprint;

/// SHA-256 of the UTF-8 bytes of already normalized text, hex encoded.
pub fn fingerprint(normalized: &str) -> Fingerprint {
    let digest = Sha256::digest(normalized.as_bytes());
    Fingerprint::from_hex(hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            fingerprint("").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            fingerprint("abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_deterministic_and_distinct() {
        assert_eq!(fingerprint("limit: 10/s"), fingerprint("limit: 10/s"));
        assert_ne!(fingerprint("limit: 10/s"), fingerprint("limit: 20/s"));
        assert_eq!(fingerprint("x").as_str().len(), 64);
    }
}
