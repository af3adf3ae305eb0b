use std::io;

use rand::{CryptoRng, Rng};

use crate::crypto::checksum;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::de::Deserialize;
use crate::errors::{Error, Result};
use crate::packet::packet_trait::PacketTrait;
use crate::ser::Serialize;
use crate::types::{Tag, Version};

/// MDC packet framing: tag octet, length octet, SHA-1 digest.
const MDC_LEN: usize = 22;

/// Symmetrically Encrypted Integrity Protected Data Packet (version 1):
/// CFB ciphertext over `prefix | inner packets | MDC`.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.13>
#[derive(Clone, PartialEq, Eq)]
pub struct SymEncryptedProtectedData {
    packet_version: Version,
    /// The ciphertext, without the leading version octet.
    data: Vec<u8>,
}

impl SymEncryptedProtectedData {
    /// Encrypt a serialized packet stream: prepend the `block_size + 2`
    /// random quick check prefix, append the MDC packet, run CFB with a
    /// zero IV and no resynchronization.
    pub fn encrypt_with_rng<R: CryptoRng + Rng>(
        rng: &mut R,
        alg: SymmetricKeyAlgorithm,
        key: &[u8],
        plaintext: &[u8],
    ) -> Result<Self> {
        let bs = alg.block_size();
        ensure!(bs > 0, "cipher {:?} has no block size", alg);

        let mut prefix = vec![0u8; bs + 2];
        rng.fill(&mut prefix[..bs]);
        prefix[bs] = prefix[bs - 2];
        prefix[bs + 1] = prefix[bs - 1];

        let mut buf = prefix;
        buf.extend_from_slice(plaintext);
        // MDC packet header, hashed along with the content
        buf.extend_from_slice(&[0xD3, 0x14]);
        let mdc = checksum::calculate_sha1(&buf);
        buf.extend_from_slice(&mdc);

        alg.encrypt_protected(key, &mut buf)?;

        Ok(SymEncryptedProtectedData {
            packet_version: Default::default(),
            data: buf,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Decrypt and verify the MDC. Returns the inner packet stream, without
    /// prefix and MDC. A missing or mismatching MDC is fatal; no plaintext
    /// is released in that case.
    pub fn decrypt(&self, alg: SymmetricKeyAlgorithm, key: &[u8]) -> Result<Vec<u8>> {
        let bs = alg.block_size();
        ensure!(bs > 0, "cipher {:?} has no block size", alg);

        if self.data.len() < bs + 2 + MDC_LEN {
            return Err(Error::IntegrityCheckFailed);
        }

        let mut plaintext = self.data.clone();
        alg.decrypt_protected(key, &mut plaintext)?;

        let mdc_offset = plaintext.len() - MDC_LEN;
        let (content, mdc) = plaintext.split_at(mdc_offset);

        if mdc[0] != 0xD3 || mdc[1] != 0x14 {
            return Err(Error::IntegrityCheckFailed);
        }
        // the digest covers prefix, inner packets and the MDC header octets
        if checksum::calculate_sha1(&plaintext[..mdc_offset + 2]) != mdc[2..] {
            return Err(Error::IntegrityCheckFailed);
        }

        Ok(content[bs + 2..].to_vec())
    }
}

impl Deserialize for SymEncryptedProtectedData {
    fn from_slice(packet_version: Version, input: &[u8]) -> Result<Self> {
        ensure!(input.len() > 1, "invalid input length");
        ensure_eq!(input[0], 0x01, "unsupported seipd version");

        Ok(SymEncryptedProtectedData {
            packet_version,
            data: input[1..].to_vec(),
        })
    }
}

impl Serialize for SymEncryptedProtectedData {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[0x01])?;
        writer.write_all(&self.data)?;
        Ok(())
    }
}

impl PacketTrait for SymEncryptedProtectedData {
    fn packet_version(&self) -> Version {
        self.packet_version
    }

    fn tag(&self) -> Tag {
        Tag::SymEncryptedProtectedData
    }
}

impl std::fmt::Debug for SymEncryptedProtectedData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymEncryptedProtectedData")
            .field("packet_version", &self.packet_version)
            .field("data", &hex::encode(&self.data))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let alg = SymmetricKeyAlgorithm::AES128;
        let key = vec![3u8; alg.key_size()];

        let packet =
            SymEncryptedProtectedData::encrypt_with_rng(&mut rng, alg, &key, b"inner packets")
                .unwrap();
        let plain = packet.decrypt(alg, &key).unwrap();
        assert_eq!(plain, b"inner packets");
    }

    #[test]
    fn test_tamper_detected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let alg = SymmetricKeyAlgorithm::AES128;
        let key = vec![3u8; alg.key_size()];

        let packet =
            SymEncryptedProtectedData::encrypt_with_rng(&mut rng, alg, &key, b"inner packets")
                .unwrap();

        // flip one ciphertext byte anywhere: the mdc has to catch it
        for idx in [0, 5, packet.data.len() - 1] {
            let mut tampered = packet.clone();
            tampered.data[idx] ^= 0x01;
            assert!(matches!(
                tampered.decrypt(alg, &key),
                Err(Error::IntegrityCheckFailed)
            ));
        }
    }

    #[test]
    fn test_truncated_mdc_detected() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let alg = SymmetricKeyAlgorithm::AES128;
        let key = vec![3u8; alg.key_size()];

        let mut packet =
            SymEncryptedProtectedData::encrypt_with_rng(&mut rng, alg, &key, b"inner packets")
                .unwrap();

        // strip the 22 octet MDC from the tail
        let new_len = packet.data.len() - MDC_LEN;
        packet.data.truncate(new_len);
        assert!(matches!(
            packet.decrypt(alg, &key),
            Err(Error::IntegrityCheckFailed)
        ));
    }
}
