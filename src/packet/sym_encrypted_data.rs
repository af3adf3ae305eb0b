use std::io;

use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::de::Deserialize;
use crate::errors::Result;
use crate::packet::packet_trait::PacketTrait;
use crate::ser::Serialize;
use crate::types::{Tag, Version};

/// Symmetrically Encrypted Data Packet: the legacy envelope without
/// integrity protection. Accepted on decrypt, never emitted.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.7>
#[derive(Clone, PartialEq, Eq)]
pub struct SymEncryptedData {
    packet_version: Version,
    data: Vec<u8>,
}

impl SymEncryptedData {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Decrypt via the resynchronizing OpenPGP CFB variant; the quick check
    /// octets are the only protection this format has.
    pub fn decrypt(&self, alg: SymmetricKeyAlgorithm, key: &[u8]) -> Result<Vec<u8>> {
        let mut ciphertext = self.data.clone();
        let plain = alg.decrypt(key, &mut ciphertext)?;
        Ok(plain.to_vec())
    }
}

impl Deserialize for SymEncryptedData {
    fn from_slice(packet_version: Version, input: &[u8]) -> Result<Self> {
        Ok(SymEncryptedData {
            packet_version,
            data: input.to_vec(),
        })
    }
}

impl Serialize for SymEncryptedData {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.data)?;
        Ok(())
    }
}

impl PacketTrait for SymEncryptedData {
    fn packet_version(&self) -> Version {
        self.packet_version
    }

    fn tag(&self) -> Tag {
        Tag::SymEncryptedData
    }
}

impl std::fmt::Debug for SymEncryptedData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymEncryptedData")
            .field("packet_version", &self.packet_version)
            .field("data", &hex::encode(&self.data))
            .finish()
    }
}
