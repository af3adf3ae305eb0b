use std::io;

use crate::errors::{Error, Result};
use crate::packet::packet_trait::PacketTrait;
use crate::packet::{
    CompressedData, LiteralData, Marker, ModDetectionCode, OnePassSignature, PublicKey,
    PublicKeyEncryptedSessionKey, PublicSubkey, SecretKey, SecretSubkey, Signature,
    SymEncryptedData, SymEncryptedProtectedData, SymKeyEncryptedSessionKey, Trust, UserAttribute,
    UserId,
};
use crate::ser::Serialize;
use crate::types::{Tag, Version};

/// The closed sum of packet kinds the codec understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    CompressedData(CompressedData),
    PublicKey(PublicKey),
    PublicSubkey(PublicSubkey),
    SecretKey(SecretKey),
    SecretSubkey(SecretSubkey),
    LiteralData(LiteralData),
    Marker(Marker),
    ModDetectionCode(ModDetectionCode),
    OnePassSignature(OnePassSignature),
    PublicKeyEncryptedSessionKey(PublicKeyEncryptedSessionKey),
    Signature(Signature),
    SymEncryptedData(SymEncryptedData),
    SymEncryptedProtectedData(SymEncryptedProtectedData),
    SymKeyEncryptedSessionKey(SymKeyEncryptedSessionKey),
    Trust(Trust),
    UserAttribute(UserAttribute),
    UserId(UserId),
}

macro_rules! delegate {
    ($self:ident, $p:ident, $action:expr) => {
        match $self {
            Packet::CompressedData($p) => $action,
            Packet::PublicKey($p) => $action,
            Packet::PublicSubkey($p) => $action,
            Packet::SecretKey($p) => $action,
            Packet::SecretSubkey($p) => $action,
            Packet::LiteralData($p) => $action,
            Packet::Marker($p) => $action,
            Packet::ModDetectionCode($p) => $action,
            Packet::OnePassSignature($p) => $action,
            Packet::PublicKeyEncryptedSessionKey($p) => $action,
            Packet::Signature($p) => $action,
            Packet::SymEncryptedData($p) => $action,
            Packet::SymEncryptedProtectedData($p) => $action,
            Packet::SymKeyEncryptedSessionKey($p) => $action,
            Packet::Trust($p) => $action,
            Packet::UserAttribute($p) => $action,
            Packet::UserId($p) => $action,
        }
    };
}

impl Packet {
    pub fn tag(&self) -> Tag {
        delegate!(self, p, p.tag())
    }

    pub fn packet_version(&self) -> Version {
        delegate!(self, p, p.packet_version())
    }
}

impl Serialize for Packet {
    /// Write the full framed packet: header and body.
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        delegate!(self, p, super::write_packet(writer, p))
    }
}

macro_rules! impl_conversions {
    ($name:ident) => {
        impl From<$name> for Packet {
            fn from(p: $name) -> Packet {
                Packet::$name(p)
            }
        }

        impl TryFrom<Packet> for $name {
            type Error = Error;

            fn try_from(p: Packet) -> Result<$name> {
                match p {
                    Packet::$name(p) => Ok(p),
                    _ => Err(Error::InvalidMessage {
                        message: format!("unexpected packet {:?}", p.tag()),
                    }),
                }
            }
        }
    };
}

impl_conversions!(CompressedData);
impl_conversions!(PublicKey);
impl_conversions!(PublicSubkey);
impl_conversions!(SecretKey);
impl_conversions!(SecretSubkey);
impl_conversions!(LiteralData);
impl_conversions!(Marker);
impl_conversions!(ModDetectionCode);
impl_conversions!(OnePassSignature);
impl_conversions!(PublicKeyEncryptedSessionKey);
impl_conversions!(Signature);
impl_conversions!(SymEncryptedData);
impl_conversions!(SymEncryptedProtectedData);
impl_conversions!(SymKeyEncryptedSessionKey);
impl_conversions!(Trust);
impl_conversions!(UserAttribute);
impl_conversions!(UserId);
