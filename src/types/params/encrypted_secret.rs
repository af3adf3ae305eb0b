use std::io;

use byteorder::{BigEndian, ByteOrder};

use crate::crypto::checksum;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{Error, Result};
use crate::ser::Serialize;
use crate::types::params::PlainSecretParams;
use crate::types::s2k::StringToKey;

/// Passphrase protected secret key material, as stored inside a secret key
/// packet. Stays encrypted until `unlock` is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedSecretParams {
    /// CFB encrypted MPI block, including the trailing integrity check.
    data: Vec<u8>,
    iv: Vec<u8>,
    encryption_algorithm: SymmetricKeyAlgorithm,
    string_to_key: StringToKey,
    /// The S2K usage octet this was framed with (254, 255, or a legacy
    /// cipher id).
    string_to_key_id: u8,
}

impl EncryptedSecretParams {
    pub fn new(
        data: Vec<u8>,
        iv: Vec<u8>,
        alg: SymmetricKeyAlgorithm,
        s2k: StringToKey,
        id: u8,
    ) -> Self {
        debug_assert_ne!(id, 0, "0 marks unencrypted params");
        EncryptedSecretParams {
            data,
            iv,
            encryption_algorithm: alg,
            string_to_key: s2k,
            string_to_key_id: id,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn encryption_algorithm(&self) -> SymmetricKeyAlgorithm {
        self.encryption_algorithm
    }

    pub fn string_to_key(&self) -> &StringToKey {
        &self.string_to_key
    }

    pub fn string_to_key_id(&self) -> u8 {
        self.string_to_key_id
    }

    /// Decrypt with the given passphrase and check the integrity of the
    /// result. A failed check means the passphrase was wrong.
    pub fn unlock(&self, passphrase: &str, alg: PublicKeyAlgorithm) -> Result<PlainSecretParams> {
        let key = self
            .string_to_key
            .derive_key(passphrase, self.encryption_algorithm.key_size())?;

        let mut plaintext = self.data.clone();
        self.encryption_algorithm
            .decrypt_with_iv_regular(&key, &self.iv, &mut plaintext)?;

        let mpis = match self.string_to_key_id {
            254 => {
                // trailing 20-octet SHA-1
                if plaintext.len() < 20 {
                    return Err(Error::PassphraseIncorrect);
                }
                let (mpis, expected) = plaintext.split_at(plaintext.len() - 20);
                if checksum::calculate_sha1(mpis) != expected {
                    return Err(Error::PassphraseIncorrect);
                }
                mpis
            }
            _ => {
                // trailing two-octet sum
                if plaintext.len() < 2 {
                    return Err(Error::PassphraseIncorrect);
                }
                let (mpis, expected) = plaintext.split_at(plaintext.len() - 2);
                if checksum::calculate_simple(mpis) != BigEndian::read_u16(expected) {
                    return Err(Error::PassphraseIncorrect);
                }
                mpis
            }
        };

        PlainSecretParams::from_slice(mpis, alg).map_err(|_| Error::PassphraseIncorrect)
    }
}

impl Serialize for EncryptedSecretParams {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[self.string_to_key_id])?;

        match self.string_to_key_id {
            0 => bail!("encrypted params framed as unencrypted"),
            1..=253 => {
                // legacy: the usage octet doubles as the cipher id
                writer.write_all(&self.iv)?;
            }
            254..=255 => {
                writer.write_all(&[u8::from(self.encryption_algorithm)])?;
                self.string_to_key.to_writer(writer)?;
                writer.write_all(&self.iv)?;
            }
        }

        writer.write_all(&self.data)?;

        Ok(())
    }
}
