use std::io;
use std::str;

use crate::de::Deserialize;
use crate::errors::Result;
use crate::packet::packet_trait::PacketTrait;
use crate::ser::Serialize;
use crate::types::{Tag, Version};

/// User ID Packet: by convention an RFC 2822 mail name-addr.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.11>
#[derive(Clone, PartialEq, Eq)]
pub struct UserId {
    packet_version: Version,
    id: Vec<u8>,
}

impl UserId {
    pub fn from_str(packet_version: Version, id: &str) -> Self {
        UserId {
            packet_version,
            id: id.as_bytes().to_vec(),
        }
    }

    pub fn id(&self) -> &[u8] {
        &self.id
    }

    pub fn id_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.id)
    }
}

impl Deserialize for UserId {
    fn from_slice(packet_version: Version, input: &[u8]) -> Result<Self> {
        Ok(UserId {
            packet_version,
            id: input.to_vec(),
        })
    }
}

impl Serialize for UserId {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.id)?;
        Ok(())
    }
}

impl PacketTrait for UserId {
    fn packet_version(&self) -> Version {
        self.packet_version
    }

    fn tag(&self) -> Tag {
        Tag::UserId
    }
}

impl std::fmt::Debug for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserId({:?})", self.id_str())
    }
}
