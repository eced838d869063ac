//! Content fingerprints used to detect whether previously scored text changed.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of the exact bytes of `text`.
///
/// Unsalted, so a fingerprint stays valid across restarts and hosts.
/// The empty string hashes like any other input.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_matches_sha256_vector() {
        assert_eq!(
            fingerprint("hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_empty_text_has_well_defined_fingerprint() {
        assert_eq!(
            fingerprint(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let text = "Java developer, 5 years";
        assert_eq!(fingerprint(text), fingerprint(text));
    }

    #[test]
    fn test_whitespace_changes_fingerprint() {
        assert_ne!(
            fingerprint("Java developer"),
            fingerprint("Java developer ")
        );
    }
}
