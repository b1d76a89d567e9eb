use crate::constants::share::TOKEN_BYTES;
use rand::rngs::OsRng;
use rand::RngCore;

/// Produces share tokens.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Hex-encoded bytes from the operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsTokenGenerator;

impl TokenGenerator for OsTokenGenerator {
    fn generate(&self) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_hex_and_distinct() {
        let generator = OsTokenGenerator;
        let a = generator.generate();
        let b = generator.generate();
        assert_eq!(a.len(), TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
