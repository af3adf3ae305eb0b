use std::io;

use crate::de::Deserialize;
use crate::errors::Result;
use crate::packet::packet_trait::PacketTrait;
use crate::ser::Serialize;
use crate::types::{Tag, Version};

/// Modification Detection Code Packet: SHA-1 over the preceding plaintext
/// of a SEIPD packet. Always the last inner packet.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.14>
#[derive(Clone, PartialEq, Eq)]
pub struct ModDetectionCode {
    packet_version: Version,
    hash: [u8; 20],
}

impl ModDetectionCode {
    pub fn hash(&self) -> &[u8; 20] {
        &self.hash
    }
}

impl Deserialize for ModDetectionCode {
    fn from_slice(packet_version: Version, input: &[u8]) -> Result<Self> {
        ensure_eq!(input.len(), 20, "invalid mdc length");

        let mut hash = [0u8; 20];
        hash.copy_from_slice(input);

        Ok(ModDetectionCode {
            packet_version,
            hash,
        })
    }
}

impl Serialize for ModDetectionCode {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.hash[..])?;
        Ok(())
    }
}

impl PacketTrait for ModDetectionCode {
    fn packet_version(&self) -> Version {
        self.packet_version
    }

    fn tag(&self) -> Tag {
        Tag::ModDetectionCode
    }
}

impl std::fmt::Debug for ModDetectionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ModDetectionCode({})", hex::encode(self.hash))
    }
}
