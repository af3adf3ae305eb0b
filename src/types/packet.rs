use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::errors::Result;

/// Packet tags, the kind discriminator of the OpenPGP grammar.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-4.3>
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Tag {
    /// Public-Key Encrypted Session Key Packet
    PublicKeyEncryptedSessionKey = 1,
    /// Signature Packet
    Signature = 2,
    /// Symmetric-Key Encrypted Session Key Packet
    SymKeyEncryptedSessionKey = 3,
    /// One-Pass Signature Packet
    OnePassSignature = 4,
    /// Secret-Key Packet
    SecretKey = 5,
    /// Public-Key Packet
    PublicKey = 6,
    /// Secret-Subkey Packet
    SecretSubkey = 7,
    /// Compressed Data Packet
    CompressedData = 8,
    /// Symmetrically Encrypted Data Packet (no integrity protection)
    SymEncryptedData = 9,
    /// Marker Packet
    Marker = 10,
    /// Literal Data Packet
    LiteralData = 11,
    /// Trust Packet
    Trust = 12,
    /// User ID Packet
    UserId = 13,
    /// Public-Subkey Packet
    PublicSubkey = 14,
    /// User Attribute Packet
    UserAttribute = 17,
    /// Sym. Encrypted and Integrity Protected Data Packet
    SymEncryptedProtectedData = 18,
    /// Modification Detection Code Packet
    ModDetectionCode = 19,

    #[num_enum(catch_all)]
    Other(u8),
}

/// The header form a packet was (or will be) framed with: the old RFC 1991
/// format or the new RFC 4880 one.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Version {
    Old,
    #[default]
    New,
}

impl Version {
    /// Write a full packet header (tag byte plus length) for a body of
    /// `len` octets, using the smallest legal length form.
    pub fn write_header(self, writer: &mut impl io::Write, tag: Tag, len: usize) -> Result<()> {
        let tag: u8 = tag.into();

        match self {
            Version::Old => {
                if len < 256 {
                    writer.write_u8(0b1000_0000 | (tag << 2))?;
                    writer.write_u8(len as u8)?;
                } else if len < 65536 {
                    writer.write_u8(0b1000_0001 | (tag << 2))?;
                    writer.write_u16::<BigEndian>(len as u16)?;
                } else {
                    writer.write_u8(0b1000_0010 | (tag << 2))?;
                    writer.write_u32::<BigEndian>(len as u32)?;
                }
            }
            Version::New => {
                writer.write_u8(0b1100_0000 | tag)?;
                crate::util::write_packet_length(len, writer)?;
            }
        }

        Ok(())
    }
}

/// Body length, as encoded in a packet header.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PacketLength {
    Fixed(usize),
    /// Old format length type 3: the body extends to the end of the input.
    Indeterminate,
    /// New format partial body length, the first chunk size.
    Partial(usize),
}

impl From<usize> for PacketLength {
    fn from(len: usize) -> PacketLength {
        PacketLength::Fixed(len)
    }
}

/// Key packet versions. V4 is the implemented target.
#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum KeyVersion {
    V2 = 2,
    V3 = 3,
    V4 = 4,
    V5 = 5,
    V6 = 6,

    #[num_enum(catch_all)]
    Other(u8),
}

impl Default for KeyVersion {
    fn default() -> Self {
        Self::V4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_from_u8() {
        assert_eq!(Tag::from(1u8), Tag::PublicKeyEncryptedSessionKey);
        assert_eq!(Tag::from(18u8), Tag::SymEncryptedProtectedData);
        assert_eq!(Tag::from(42u8), Tag::Other(42));
        assert_eq!(u8::from(Tag::LiteralData), 11);
    }

    #[test]
    fn test_write_header_new() {
        let mut buf = Vec::new();
        Version::New
            .write_header(&mut buf, Tag::PublicKeyEncryptedSessionKey, 13)
            .unwrap();
        assert_eq!(buf, vec![0xC1, 13]);

        let mut buf = Vec::new();
        Version::New
            .write_header(&mut buf, Tag::Signature, 302)
            .unwrap();
        assert_eq!(hex::encode(buf), "c2c06e");
    }

    #[test]
    fn test_write_header_old() {
        let mut buf = Vec::new();
        Version::Old
            .write_header(&mut buf, Tag::Signature, 7)
            .unwrap();
        assert_eq!(buf, vec![0b1000_1000, 7]);
    }
}
