use nom::bytes::streaming::take;
use nom::combinator::rest;
use nom::number::streaming::{be_u16, be_u32, be_u8};

use crate::de::Deserialize;
use crate::errors::{Error, IResult, Result};
use crate::packet::packet_sum::Packet;
use crate::packet::{
    CompressedData, LiteralData, Marker, ModDetectionCode, OnePassSignature, PublicKey,
    PublicKeyEncryptedSessionKey, PublicSubkey, SecretKey, SecretSubkey, Signature,
    SymEncryptedData, SymEncryptedProtectedData, SymKeyEncryptedSessionKey, Trust, UserAttribute,
    UserId,
};
use crate::types::{PacketLength, Tag, Version};

/// The framed body of a single packet.
#[derive(Debug)]
pub enum ParseResult<'a> {
    Fixed(&'a [u8]),
    /// Old format length type 3: everything up to the end of the input.
    Indeterminate(&'a [u8]),
    /// New format partial lengths, one slice per chunk.
    Partial(Vec<&'a [u8]>),
}

/// Parse a new format body length.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-4.2.2>
fn read_packet_len(i: &[u8]) -> IResult<&[u8], PacketLength> {
    let (i, olen) = be_u8(i)?;
    match olen {
        // One-octet
        0..=191 => Ok((i, PacketLength::Fixed(olen as usize))),
        // Two-octet
        192..=223 => {
            let (i, a) = be_u8(i)?;
            Ok((
                i,
                PacketLength::Fixed(((olen as usize - 192) << 8) + 192 + a as usize),
            ))
        }
        // Partial body length
        224..=254 => Ok((i, PacketLength::Partial(1 << (olen as usize & 0x1F)))),
        // Five-octet
        255 => {
            let (i, len) = be_u32(i)?;
            Ok((i, PacketLength::Fixed(len as usize)))
        }
    }
}

/// Collect the chunks of a partial body length sequence. The final chunk is
/// announced with a regular length form.
fn read_partial_bodies(input: &[u8], first_len: usize) -> IResult<&[u8], ParseResult<'_>> {
    let (mut rest, first) = take(first_len)(input)?;
    let mut out = vec![first];

    loop {
        let (i, len) = read_packet_len(rest)?;
        match len {
            PacketLength::Partial(len) => {
                let (i, chunk) = take(len)(i)?;
                out.push(chunk);
                rest = i;
            }
            PacketLength::Fixed(len) => {
                let (i, chunk) = take(len)(i)?;
                out.push(chunk);
                rest = i;
                break;
            }
            PacketLength::Indeterminate => {
                // not legal inside a new style packet, tolerate by reading
                // everything that is left
                out.push(i);
                rest = &[];
                break;
            }
        }
    }

    Ok((rest, ParseResult::Partial(out)))
}

/// Parse one packet header and its framed body.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-4.2>
pub fn parser(i: &[u8]) -> IResult<&[u8], (Version, Tag, PacketLength, ParseResult<'_>)> {
    let (i, head) = be_u8(i)?;

    // bit 7 is always set on a packet header
    if head & 0x80 == 0 {
        return Err(nom::Err::Error(Error::InvalidMessage {
            message: format!("invalid header byte 0x{head:02x}"),
        }));
    }

    let (i, version, tag, len) = if head & 0x40 != 0 {
        // new format: the low six bits are the tag
        let tag = Tag::from(head & 0x3F);
        let (i, len) = read_packet_len(i)?;
        (i, Version::New, tag, len)
    } else {
        // old format: four tag bits, two length type bits
        let tag = Tag::from((head & 0x3C) >> 2);
        let (i, len) = match head & 0x03 {
            0 => {
                let (i, l) = be_u8(i)?;
                (i, PacketLength::Fixed(l as usize))
            }
            1 => {
                let (i, l) = be_u16(i)?;
                (i, PacketLength::Fixed(l as usize))
            }
            2 => {
                let (i, l) = be_u32(i)?;
                (i, PacketLength::Fixed(l as usize))
            }
            _ => (i, PacketLength::Indeterminate),
        };
        (i, Version::Old, tag, len)
    };

    let (i, body) = match len {
        PacketLength::Fixed(length) => {
            let (i, body) = take(length)(i)?;
            (i, ParseResult::Fixed(body))
        }
        PacketLength::Indeterminate => {
            let (i, body) = rest(i)?;
            (i, ParseResult::Indeterminate(body))
        }
        PacketLength::Partial(length) => read_partial_bodies(i, length)?,
    };

    Ok((i, (version, tag, len, body)))
}

/// Parse a packet body into its kind. Hard failures are wrapped so callers
/// can skip the packet; `Unsupported` stays visible as a soft error.
pub fn body_parser(ver: Version, tag: Tag, body: &[u8]) -> Result<Packet> {
    let res: Result<Packet> = match tag {
        Tag::PublicKeyEncryptedSessionKey => {
            PublicKeyEncryptedSessionKey::from_slice(ver, body).map(Into::into)
        }
        Tag::Signature => Signature::from_slice(ver, body).map(Into::into),
        Tag::SymKeyEncryptedSessionKey => {
            SymKeyEncryptedSessionKey::from_slice(ver, body).map(Into::into)
        }
        Tag::OnePassSignature => OnePassSignature::from_slice(ver, body).map(Into::into),
        Tag::SecretKey => SecretKey::from_slice(ver, body).map(Into::into),
        Tag::PublicKey => PublicKey::from_slice(ver, body).map(Into::into),
        Tag::SecretSubkey => SecretSubkey::from_slice(ver, body).map(Into::into),
        Tag::CompressedData => CompressedData::from_slice(ver, body).map(Into::into),
        Tag::SymEncryptedData => SymEncryptedData::from_slice(ver, body).map(Into::into),
        Tag::Marker => Marker::from_slice(ver, body).map(Into::into),
        Tag::LiteralData => LiteralData::from_slice(ver, body).map(Into::into),
        Tag::Trust => Trust::from_slice(ver, body).map(Into::into),
        Tag::UserId => UserId::from_slice(ver, body).map(Into::into),
        Tag::PublicSubkey => PublicSubkey::from_slice(ver, body).map(Into::into),
        Tag::UserAttribute => UserAttribute::from_slice(ver, body).map(Into::into),
        Tag::SymEncryptedProtectedData => {
            SymEncryptedProtectedData::from_slice(ver, body).map(Into::into)
        }
        Tag::ModDetectionCode => ModDetectionCode::from_slice(ver, body).map(Into::into),
        Tag::Other(id) => Err(Error::Unsupported {
            message: format!("unknown packet tag {id}"),
        }),
    };

    match res {
        Ok(p) => Ok(p),
        Err(err) if err.is_soft() => Err(err),
        Err(err) => Err(Error::InvalidPacketContent {
            source: Box::new(err),
        }),
    }
}
