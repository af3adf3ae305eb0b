use std::io;

use crate::armor::{self, BlockType};
use crate::composed::Deserializable;
use crate::errors::Result;
use crate::packet::{write_packet, Packet, Signature};
use crate::ser::Serialize;
use crate::types::PublicKeyTrait;

/// A detached signature, as produced by `sign --detach`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandaloneSignature {
    pub signature: Signature,
}

impl StandaloneSignature {
    pub fn new(signature: Signature) -> Self {
        StandaloneSignature { signature }
    }

    /// Verify against the raw signed document.
    pub fn verify(&self, key: &impl PublicKeyTrait, data: &[u8]) -> Result<()> {
        self.signature.verify(key, data)
    }

    pub fn to_armored_writer(&self, writer: &mut impl io::Write) -> Result<()> {
        armor::write(self, BlockType::Signature, writer, None)
    }

    pub fn to_armored_string(&self) -> Result<String> {
        armor::write_string(self, BlockType::Signature)
    }
}

impl Serialize for StandaloneSignature {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        write_packet(writer, &self.signature)
    }
}

impl Deserializable for StandaloneSignature {
    fn from_packets(packets: &mut dyn Iterator<Item = Result<Packet>>) -> Result<Vec<Self>> {
        let mut out = Vec::new();
        for packet in packets {
            let signature: Signature = packet?.try_into()?;
            out.push(StandaloneSignature { signature });
        }
        Ok(out)
    }

    fn matches_block_type(typ: BlockType) -> bool {
        matches!(typ, BlockType::Signature)
    }
}
