use std::io;

use crate::de::Deserialize;
use crate::errors::Result;
use crate::packet::packet_trait::PacketTrait;
use crate::ser::Serialize;
use crate::types::{Tag, Version};

/// "PGP" as UTF-8 octets.
const PGP: [u8; 3] = [0x50, 0x47, 0x50];

/// Marker Packet. Carries no content and is skipped by consumers.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.8>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    packet_version: Version,
}

impl Deserialize for Marker {
    fn from_slice(packet_version: Version, input: &[u8]) -> Result<Self> {
        ensure_eq!(input, &PGP[..], "invalid marker");

        Ok(Marker { packet_version })
    }
}

impl Serialize for Marker {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&PGP[..])?;
        Ok(())
    }
}

impl PacketTrait for Marker {
    fn packet_version(&self) -> Version {
        self.packet_version
    }

    fn tag(&self) -> Tag {
        Tag::Marker
    }
}
