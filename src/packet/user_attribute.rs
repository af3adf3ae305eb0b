use std::io;

use crate::de::Deserialize;
use crate::errors::Result;
use crate::packet::packet_trait::PacketTrait;
use crate::ser::Serialize;
use crate::types::{Tag, Version};

/// User Attribute Packet. The subpacket stream is preserved verbatim; only
/// the image subpacket type is recognized.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.12>
#[derive(Clone, PartialEq, Eq)]
pub struct UserAttribute {
    packet_version: Version,
    data: Vec<u8>,
}

impl UserAttribute {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether the first contained subpacket is an image (type 1).
    pub fn is_image(&self) -> bool {
        // subpacket: length | type | body
        let skip = match self.data.first().copied() {
            Some(0..=191) => 1,
            Some(192..=254) => 2,
            Some(255) => 5,
            None => return false,
        };
        self.data.get(skip) == Some(&1)
    }
}

impl Deserialize for UserAttribute {
    fn from_slice(packet_version: Version, input: &[u8]) -> Result<Self> {
        Ok(UserAttribute {
            packet_version,
            data: input.to_vec(),
        })
    }
}

impl Serialize for UserAttribute {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.data)?;
        Ok(())
    }
}

impl PacketTrait for UserAttribute {
    fn packet_version(&self) -> Version {
        self.packet_version
    }

    fn tag(&self) -> Tag {
        Tag::UserAttribute
    }
}

impl std::fmt::Debug for UserAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAttribute")
            .field("packet_version", &self.packet_version)
            .field("is_image", &self.is_image())
            .field("data", &hex::encode(&self.data))
            .finish()
    }
}
