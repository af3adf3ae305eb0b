use sha1::{Digest, Sha1};

/// Sum of all octets, mod 65536. Used as the trailing checksum of session
/// key payloads and of unprotected secret key material.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.1>
pub fn calculate_simple(data: &[u8]) -> u16 {
    data.iter().fold(0u16, |acc, b| acc.wrapping_add(*b as u16))
}

/// SHA-1 over secret key material, the integrity check of S2K usage 254.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.5.3>
pub fn calculate_sha1(data: &[u8]) -> Vec<u8> {
    Sha1::digest(data).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple() {
        assert_eq!(calculate_simple(&[]), 0);
        assert_eq!(calculate_simple(&[1, 2, 3]), 6);
        // wraps mod 65536
        assert_eq!(calculate_simple(&[0xFF; 257]), (0xFFu16).wrapping_mul(257));
    }

    #[test]
    fn test_sha1_len() {
        assert_eq!(calculate_sha1(b"abc").len(), 20);
    }
}
