use std::io;

use log::warn;

use crate::de::Deserialize;
use crate::errors::Result;
use crate::packet::packet_trait::PacketTrait;
use crate::ser::Serialize;
use crate::types::{Tag, Version};

/// Trust Packet. Only meaningful in local keyring files; the content is
/// ignored and not re-emitted.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.10>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trust {
    packet_version: Version,
}

impl Deserialize for Trust {
    fn from_slice(packet_version: Version, _input: &[u8]) -> Result<Self> {
        warn!("ignoring trust packet");

        Ok(Trust { packet_version })
    }
}

impl Serialize for Trust {
    fn to_writer<W: io::Write>(&self, _writer: &mut W) -> Result<()> {
        Ok(())
    }
}

impl PacketTrait for Trust {
    fn packet_version(&self) -> Version {
        self.packet_version
    }

    fn tag(&self) -> Tag {
        Tag::Trust
    }
}
