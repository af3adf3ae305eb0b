use std::io;

use nom::combinator::{map, rest};
use nom::number::streaming::be_u8;
use rand::{CryptoRng, Rng};

use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::de::Deserialize;
use crate::errors::Result;
use crate::packet::packet_trait::PacketTrait;
use crate::ser::Serialize;
use crate::types::{s2k_parser, StringToKey, Tag, Version};

/// Symmetric-Key Encrypted Session Key Packet (version 4).
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.3>
#[derive(Clone, PartialEq, Eq)]
pub struct SymKeyEncryptedSessionKey {
    packet_version: Version,
    sym_algorithm: SymmetricKeyAlgorithm,
    s2k: StringToKey,
    /// When absent, the S2K derived key *is* the session key.
    encrypted_key: Option<Vec<u8>>,
}

impl SymKeyEncryptedSessionKey {
    /// The simple form: no encrypted session key, the message session key
    /// is derived from the passphrase directly.
    pub fn from_passphrase<R: CryptoRng + Rng>(
        rng: &mut R,
        alg: SymmetricKeyAlgorithm,
    ) -> Self {
        SymKeyEncryptedSessionKey {
            packet_version: Default::default(),
            sym_algorithm: alg,
            s2k: StringToKey::new_default(rng),
            encrypted_key: None,
        }
    }

    pub fn sym_algorithm(&self) -> SymmetricKeyAlgorithm {
        self.sym_algorithm
    }

    pub fn s2k(&self) -> &StringToKey {
        &self.s2k
    }

    /// Recover `(sym_alg, session_key)` from the passphrase.
    pub fn unwrap_session_key(
        &self,
        passphrase: &str,
    ) -> Result<(SymmetricKeyAlgorithm, Vec<u8>)> {
        ensure!(
            self.sym_algorithm != SymmetricKeyAlgorithm::Plaintext,
            "skesk encryption algorithm cannot be plaintext"
        );

        let key = self
            .s2k
            .derive_key(passphrase, self.sym_algorithm.key_size())?;

        match &self.encrypted_key {
            None => Ok((self.sym_algorithm, key)),
            Some(encrypted) => {
                // CFB with a zero IV over `sym_alg | session_key`
                let mut plaintext = encrypted.clone();
                let iv = vec![0u8; self.sym_algorithm.block_size()];
                self.sym_algorithm
                    .decrypt_with_iv_regular(&key, &iv, &mut plaintext)?;

                ensure!(!plaintext.is_empty(), "empty skesk payload");
                let alg = SymmetricKeyAlgorithm::from(plaintext[0]);
                ensure_eq!(
                    plaintext.len() - 1,
                    alg.key_size(),
                    "invalid session key length"
                );

                Ok((alg, plaintext[1..].to_vec()))
            }
        }
    }
}

impl Deserialize for SymKeyEncryptedSessionKey {
    fn from_slice(packet_version: Version, input: &[u8]) -> Result<Self> {
        let (i, version) = be_u8(input)?;
        ensure_eq!(version, 4, "invalid skesk version");

        let (i, sym_algorithm) = map(be_u8, SymmetricKeyAlgorithm::from)(i)?;
        let (i, s2k) = s2k_parser(i)?;
        let (_, encrypted) = rest::<_, crate::errors::Error>(i)?;

        Ok(SymKeyEncryptedSessionKey {
            packet_version,
            sym_algorithm,
            s2k,
            encrypted_key: (!encrypted.is_empty()).then(|| encrypted.to_vec()),
        })
    }
}

impl Serialize for SymKeyEncryptedSessionKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[0x04, u8::from(self.sym_algorithm)])?;
        self.s2k.to_writer(writer)?;

        if let Some(ref encrypted) = self.encrypted_key {
            writer.write_all(encrypted)?;
        }

        Ok(())
    }
}

impl PacketTrait for SymKeyEncryptedSessionKey {
    fn packet_version(&self) -> Version {
        self.packet_version
    }

    fn tag(&self) -> Tag {
        Tag::SymKeyEncryptedSessionKey
    }
}

impl std::fmt::Debug for SymKeyEncryptedSessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymKeyEncryptedSessionKey")
            .field("packet_version", &self.packet_version)
            .field("sym_algorithm", &self.sym_algorithm)
            .field("s2k", &self.s2k)
            .field(
                "encrypted_key",
                &self.encrypted_key.as_ref().map(hex::encode),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn test_roundtrip_and_derive() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let esk =
            SymKeyEncryptedSessionKey::from_passphrase(&mut rng, SymmetricKeyAlgorithm::AES256);

        let buf = esk.to_bytes().unwrap();
        let back = SymKeyEncryptedSessionKey::from_slice(Version::New, &buf).unwrap();
        assert_eq!(esk, back);

        let (alg, key) = back.unwrap_session_key("secret").unwrap();
        assert_eq!(alg, SymmetricKeyAlgorithm::AES256);
        assert_eq!(key.len(), 32);
        assert_eq!(key, esk.unwrap_session_key("secret").unwrap().1);
        assert_ne!(key, esk.unwrap_session_key("other").unwrap().1);
    }
}
