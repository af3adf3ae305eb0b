//! Packet level types: per kind body grammars, the tag dispatched sum type,
//! and the slice based parser with single octet resynchronization.

mod compressed_data;
mod key;
mod literal_data;
mod many;
mod marker;
mod mod_detection_code;
mod one_pass_signature;
mod packet_sum;
pub(crate) mod packet_trait;
mod public_key_encrypted_session_key;
mod public_key_parser;
mod secret_key_parser;
pub mod signature;
mod single;
mod sym_encrypted_data;
mod sym_encrypted_protected_data;
mod sym_key_encrypted_session_key;
mod trust;
mod user_attribute;
mod user_id;

use std::io;

pub use self::compressed_data::CompressedData;
pub use self::key::{PubKeyInner, PublicKey, PublicSubkey, SecretKey, SecretSubkey};
pub use self::literal_data::{DataMode, LiteralData};
pub use self::many::PacketParser;
pub use self::marker::Marker;
pub use self::mod_detection_code::ModDetectionCode;
pub use self::one_pass_signature::OnePassSignature;
pub use self::packet_sum::Packet;
pub use self::packet_trait::PacketTrait;
pub use self::public_key_encrypted_session_key::PublicKeyEncryptedSessionKey;
pub use self::signature::{
    KeyFlags, Signature, SignatureConfig, SignatureType, SignatureVersion, Subpacket,
    SubpacketData, SubpacketType,
};
pub use self::single::{body_parser, parser, ParseResult};
pub use self::sym_encrypted_data::SymEncryptedData;
pub use self::sym_encrypted_protected_data::SymEncryptedProtectedData;
pub use self::sym_key_encrypted_session_key::SymKeyEncryptedSessionKey;
pub use self::trust::Trust;
pub use self::user_attribute::UserAttribute;
pub use self::user_id::UserId;

use crate::errors::Result;
use crate::ser::Serialize;

/// Frame a packet: the smallest legal header for its body, then the body.
pub fn write_packet(writer: &mut impl io::Write, packet: &impl PacketTrait) -> Result<()> {
    let body = packet.to_bytes()?;
    packet
        .packet_version()
        .write_header(writer, packet.tag(), body.len())?;
    writer.write_all(&body)?;

    Ok(())
}
