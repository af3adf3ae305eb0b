use log::warn;

use crate::armor::{self, BlockType};
use crate::errors::{Error, Result};
use crate::packet::{Packet, PacketParser};

/// Entry points shared by everything that is assembled from a packet
/// stream: keys, messages, standalone signatures.
pub trait Deserializable: Sized {
    /// Assemble compositions from parsed packets.
    fn from_packets(packets: &mut dyn Iterator<Item = Result<Packet>>) -> Result<Vec<Self>>;

    /// Which armor block types may hold this composition.
    fn matches_block_type(typ: BlockType) -> bool;

    /// Parse a binary packet stream into compositions.
    fn from_bytes_many(bytes: &[u8]) -> Result<Vec<Self>> {
        let mut parser = PacketParser::new(bytes);
        Self::from_packets(&mut parser)
    }

    /// Parse a binary packet stream expecting exactly one composition.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut all = Self::from_bytes_many(bytes)?;
        ensure!(all.len() < 2, "expected a single composition");

        all.pop().ok_or_else(|| Error::InvalidMessage {
            message: "no usable content".to_string(),
        })
    }

    /// Parse armored input, surfacing every matching block.
    fn from_armor_many(input: &[u8]) -> Result<Vec<Self>> {
        let blocks = armor::dearmor(input)?;

        let mut out = Vec::new();
        for block in &blocks {
            if !Self::matches_block_type(block.typ) {
                warn!("skipping armor block {:?}", block.typ);
                continue;
            }
            out.extend(Self::from_bytes_many(&block.data)?);
        }

        Ok(out)
    }

    /// Parse armored input expecting exactly one composition.
    fn from_armor_single(input: &[u8]) -> Result<Self> {
        let mut all = Self::from_armor_many(input)?;
        ensure!(all.len() < 2, "expected a single composition");

        all.pop().ok_or_else(|| Error::InvalidMessage {
            message: "no usable content".to_string(),
        })
    }

    /// Parse an armored string.
    fn from_string(input: &str) -> Result<Self> {
        Self::from_armor_single(input.as_bytes())
    }

    /// Auto-detect armored vs binary input.
    fn from_auto(input: &[u8]) -> Result<Vec<Self>> {
        if armor::is_armored(input) {
            Self::from_armor_many(input)
        } else {
            Self::from_bytes_many(input)
        }
    }
}
