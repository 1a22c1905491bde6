use sha2::{Digest, Sha256};

/// Hex SHA-256 of a digit string, for checking output against published
/// digests.
pub fn digest_digits(digits: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(digits.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            digest_digits("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_depends_on_every_digit() {
        assert_ne!(digest_digits("3141592653"), digest_digits("3141592654"));
    }
}
