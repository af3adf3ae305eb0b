//! ASCII Armor: Base64 transport encoding with CRC-24 integrity and
//! `-----BEGIN PGP …-----` framing.
//! Ref: <https://tools.ietf.org/html/rfc4880#section-6>

mod reader;
mod writer;

pub use self::reader::{dearmor, is_armored, Block};
pub use self::writer::{write, write_string};

use std::collections::BTreeMap;
use std::fmt;

/// Armor block types emitted and recognized by this crate.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum BlockType {
    Message,
    PublicKey,
    PrivateKey,
    Signature,
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockType::Message => f.write_str("PGP MESSAGE"),
            BlockType::PublicKey => f.write_str("PGP PUBLIC KEY BLOCK"),
            BlockType::PrivateKey => f.write_str("PGP PRIVATE KEY BLOCK"),
            BlockType::Signature => f.write_str("PGP SIGNATURE"),
        }
    }
}

impl BlockType {
    fn from_label(label: &str) -> Option<BlockType> {
        match label {
            "PGP MESSAGE" => Some(BlockType::Message),
            "PGP PUBLIC KEY BLOCK" => Some(BlockType::PublicKey),
            "PGP PRIVATE KEY BLOCK" => Some(BlockType::PrivateKey),
            "PGP SIGNATURE" => Some(BlockType::Signature),
            _ => None,
        }
    }
}

/// Armor headers (`Key: Value` lines after the BEGIN marker).
pub type Headers = BTreeMap<String, Vec<String>>;
