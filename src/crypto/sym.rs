use aes::{Aes128, Aes192, Aes256};
use blowfish::Blowfish;
use cast5::Cast5;
use cfb_mode::cipher::KeyIvInit;
use cfb_mode::{BufDecryptor, BufEncryptor};
use des::TdesEde3;
use num_enum::{FromPrimitive, IntoPrimitive};
use twofish::Twofish;

use crate::errors::{Error, Result};

macro_rules! cfb_encrypt {
    ($cipher:ty, $key:expr, $iv:expr, $data:expr) => {{
        let mut mode = BufEncryptor::<$cipher>::new_from_slices($key, $iv)?;
        mode.encrypt($data);
    }};
}

macro_rules! cfb_decrypt {
    ($cipher:ty, $key:expr, $iv:expr, $data:expr) => {{
        let mut mode = BufDecryptor::<$cipher>::new_from_slices($key, $iv)?;
        mode.decrypt($data);
    }};
}

/// Available symmetric key algorithms.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-9.2>
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SymmetricKeyAlgorithm {
    /// Plaintext or unencrypted data
    Plaintext = 0,
    IDEA = 1,
    /// TripleDES (DES-EDE, 168 bit key derived from 192)
    TripleDES = 2,
    /// CAST5 (128 bit key, as per RFC 2144)
    CAST5 = 3,
    /// Blowfish (128 bit key, 16 rounds)
    Blowfish = 4,
    AES128 = 7,
    AES192 = 8,
    AES256 = 9,
    /// Twofish with 256-bit key
    Twofish = 10,

    #[num_enum(catch_all)]
    Other(u8),
}

impl Default for SymmetricKeyAlgorithm {
    fn default() -> Self {
        Self::AES128
    }
}

impl SymmetricKeyAlgorithm {
    /// The size of a single block in octets.
    pub fn block_size(self) -> usize {
        match self {
            SymmetricKeyAlgorithm::IDEA
            | SymmetricKeyAlgorithm::TripleDES
            | SymmetricKeyAlgorithm::CAST5
            | SymmetricKeyAlgorithm::Blowfish => 8,
            SymmetricKeyAlgorithm::AES128
            | SymmetricKeyAlgorithm::AES192
            | SymmetricKeyAlgorithm::AES256
            | SymmetricKeyAlgorithm::Twofish => 16,
            SymmetricKeyAlgorithm::Plaintext | SymmetricKeyAlgorithm::Other(_) => 0,
        }
    }

    /// Whether this crate carries a CFB implementation for the algorithm.
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            SymmetricKeyAlgorithm::TripleDES
                | SymmetricKeyAlgorithm::CAST5
                | SymmetricKeyAlgorithm::Blowfish
                | SymmetricKeyAlgorithm::AES128
                | SymmetricKeyAlgorithm::AES192
                | SymmetricKeyAlgorithm::AES256
                | SymmetricKeyAlgorithm::Twofish
        )
    }

    /// The key size in octets.
    pub fn key_size(self) -> usize {
        match self {
            SymmetricKeyAlgorithm::IDEA
            | SymmetricKeyAlgorithm::CAST5
            | SymmetricKeyAlgorithm::Blowfish
            | SymmetricKeyAlgorithm::AES128 => 16,
            SymmetricKeyAlgorithm::TripleDES | SymmetricKeyAlgorithm::AES192 => 24,
            SymmetricKeyAlgorithm::AES256 | SymmetricKeyAlgorithm::Twofish => 32,
            SymmetricKeyAlgorithm::Plaintext | SymmetricKeyAlgorithm::Other(_) => 0,
        }
    }

    /// Regular CFB encryption of `data` in place.
    pub fn encrypt_with_iv_regular(self, key: &[u8], iv: &[u8], data: &mut [u8]) -> Result<()> {
        match self {
            SymmetricKeyAlgorithm::TripleDES => cfb_encrypt!(TdesEde3, key, iv, data),
            SymmetricKeyAlgorithm::CAST5 => cfb_encrypt!(Cast5, key, iv, data),
            SymmetricKeyAlgorithm::Blowfish => cfb_encrypt!(Blowfish, key, iv, data),
            SymmetricKeyAlgorithm::AES128 => cfb_encrypt!(Aes128, key, iv, data),
            SymmetricKeyAlgorithm::AES192 => cfb_encrypt!(Aes192, key, iv, data),
            SymmetricKeyAlgorithm::AES256 => cfb_encrypt!(Aes256, key, iv, data),
            SymmetricKeyAlgorithm::Twofish => cfb_encrypt!(Twofish, key, iv, data),
            _ => {
                return Err(Error::CryptoUnavailable {
                    message: format!("cipher {self:?}"),
                })
            }
        }
        Ok(())
    }

    /// Regular CFB decryption of `data` in place.
    pub fn decrypt_with_iv_regular(self, key: &[u8], iv: &[u8], data: &mut [u8]) -> Result<()> {
        match self {
            SymmetricKeyAlgorithm::TripleDES => cfb_decrypt!(TdesEde3, key, iv, data),
            SymmetricKeyAlgorithm::CAST5 => cfb_decrypt!(Cast5, key, iv, data),
            SymmetricKeyAlgorithm::Blowfish => cfb_decrypt!(Blowfish, key, iv, data),
            SymmetricKeyAlgorithm::AES128 => cfb_decrypt!(Aes128, key, iv, data),
            SymmetricKeyAlgorithm::AES192 => cfb_decrypt!(Aes192, key, iv, data),
            SymmetricKeyAlgorithm::AES256 => cfb_decrypt!(Aes256, key, iv, data),
            SymmetricKeyAlgorithm::Twofish => cfb_decrypt!(Twofish, key, iv, data),
            _ => {
                return Err(Error::CryptoUnavailable {
                    message: format!("cipher {self:?}"),
                })
            }
        }
        Ok(())
    }

    /// CFB encryption with a zero IV and without resynchronization, as used
    /// by the integrity protected data packet (SEIPD). The caller provides
    /// the full plaintext, including the `block_size + 2` random prefix.
    pub fn encrypt_protected(self, key: &[u8], data: &mut [u8]) -> Result<()> {
        let iv = vec![0u8; self.block_size()];
        self.encrypt_with_iv_regular(key, &iv, data)
    }

    /// CFB decryption with a zero IV and without resynchronization (SEIPD).
    /// Decrypts in place; the result still carries the random prefix.
    pub fn decrypt_protected(self, key: &[u8], data: &mut [u8]) -> Result<()> {
        let iv = vec![0u8; self.block_size()];
        self.decrypt_with_iv_regular(key, &iv, data)
    }

    /// OpenPGP CFB decryption *with* resynchronization, as used by the legacy
    /// SED packet (RFC 4880 §13.9): after the `block_size + 2` quick check
    /// prefix the feedback register is reloaded from the ciphertext.
    ///
    /// Verifies the two repeated quick check octets and returns the data
    /// portion, without the prefix.
    pub fn decrypt<'a>(self, key: &[u8], ciphertext: &'a mut [u8]) -> Result<&'a [u8]> {
        let bs = self.block_size();
        ensure!(bs > 0, "cipher {:?} has no block size", self);
        ensure!(ciphertext.len() >= bs + 2, "invalid ciphertext length");

        // the resync IV is the last full ciphertext block of the prefix
        let resync_iv = ciphertext[2..bs + 2].to_vec();

        let (prefix, data) = ciphertext.split_at_mut(bs + 2);

        let zero_iv = vec![0u8; bs];
        self.decrypt_with_iv_regular(key, &zero_iv, prefix)?;

        if prefix[bs - 2] != prefix[bs] || prefix[bs - 1] != prefix[bs + 1] {
            return Err(Error::CryptoFailure {
                message: "quick check mismatch, wrong session key".to_string(),
            });
        }

        self.decrypt_with_iv_regular(key, &resync_iv, data)?;

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! roundtrip {
        ($name:ident, $alg:path) => {
            #[test]
            fn $name() {
                let data = vec![2u8; 256];
                let key = vec![1u8; $alg.key_size()];
                let iv = vec![3u8; $alg.block_size()];

                let mut ciphertext = data.clone();
                $alg.encrypt_with_iv_regular(&key, &iv, &mut ciphertext)
                    .unwrap();
                assert_ne!(data, ciphertext);

                let mut plaintext = ciphertext.clone();
                $alg.decrypt_with_iv_regular(&key, &iv, &mut plaintext)
                    .unwrap();
                assert_eq!(data, plaintext);
            }
        };
    }

    roundtrip!(roundtrip_aes128, SymmetricKeyAlgorithm::AES128);
    roundtrip!(roundtrip_aes192, SymmetricKeyAlgorithm::AES192);
    roundtrip!(roundtrip_aes256, SymmetricKeyAlgorithm::AES256);
    roundtrip!(roundtrip_tripledes, SymmetricKeyAlgorithm::TripleDES);
    roundtrip!(roundtrip_blowfish, SymmetricKeyAlgorithm::Blowfish);
    roundtrip!(roundtrip_twofish, SymmetricKeyAlgorithm::Twofish);
    roundtrip!(roundtrip_cast5, SymmetricKeyAlgorithm::CAST5);

    #[test]
    fn test_protected_roundtrip() {
        let alg = SymmetricKeyAlgorithm::AES128;
        let key = vec![7u8; alg.key_size()];

        let mut buf = b"some protected content".to_vec();
        alg.encrypt_protected(&key, &mut buf).unwrap();
        assert_ne!(&buf, b"some protected content");
        alg.decrypt_protected(&key, &mut buf).unwrap();
        assert_eq!(&buf, b"some protected content");
    }

    #[test]
    fn test_resync_decrypt_quick_check() {
        let alg = SymmetricKeyAlgorithm::AES128;
        let key = vec![9u8; alg.key_size()];
        let bs = alg.block_size();

        // mimic a SED emitter: random prefix with repeated last two octets,
        // prefix encrypted with zero iv, data with resync
        let mut prefix: Vec<u8> = (0..bs as u8).collect();
        prefix.push(prefix[bs - 2]);
        prefix.push(prefix[bs - 1]);

        let zero_iv = vec![0u8; bs];
        alg.encrypt_with_iv_regular(&key, &zero_iv, &mut prefix)
            .unwrap();

        let resync_iv = prefix[2..bs + 2].to_vec();
        let mut data = b"legacy encrypted data".to_vec();
        alg.encrypt_with_iv_regular(&key, &resync_iv, &mut data)
            .unwrap();

        let mut ciphertext = prefix;
        ciphertext.extend_from_slice(&data);

        let out = alg.decrypt(&key, &mut ciphertext).unwrap();
        assert_eq!(out, b"legacy encrypted data");
    }

    #[test]
    fn test_resync_decrypt_rejects_bad_prefix() {
        let alg = SymmetricKeyAlgorithm::AES128;
        let key = vec![9u8; alg.key_size()];
        let bs = alg.block_size();

        // prefix without the repeated quick check octets
        let mut prefix: Vec<u8> = (10..(bs as u8 + 12)).collect();
        assert_ne!(prefix[bs - 2], prefix[bs]);

        let zero_iv = vec![0u8; bs];
        alg.encrypt_with_iv_regular(&key, &zero_iv, &mut prefix)
            .unwrap();

        prefix.extend_from_slice(&[0u8; 8]);
        assert!(alg.decrypt(&key, &mut prefix).is_err());
    }

    #[test]
    fn test_unknown_cipher() {
        let mut buf = [0u8; 16];
        assert!(matches!(
            SymmetricKeyAlgorithm::IDEA.decrypt_with_iv_regular(&[0; 16], &[0; 8], &mut buf),
            Err(Error::CryptoUnavailable { .. })
        ));
    }
}
