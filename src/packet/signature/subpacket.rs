use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use chrono::{DateTime, TimeZone, Utc};
use log::warn;
use nom::bytes::complete::take;
use nom::combinator::map_opt;
use nom::number::complete::{be_u32, be_u8};
use num_enum::{FromPrimitive, IntoPrimitive};
use smallvec::SmallVec;

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{IResult, Result};
use crate::ser::Serialize;
use crate::types::{CompressionAlgorithm, KeyId};
use crate::util::{packet_length, write_packet_length};

/// Signature subpacket type octet, without the criticality bit.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.2.3.1>
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SubpacketType {
    SignatureCreationTime = 2,
    SignatureExpirationTime = 3,
    ExportableCertification = 4,
    TrustSignature = 5,
    RegularExpression = 6,
    Revocable = 7,
    KeyExpirationTime = 9,
    PreferredSymmetricAlgorithms = 11,
    RevocationKey = 12,
    Issuer = 16,
    Notation = 20,
    PreferredHashAlgorithms = 21,
    PreferredCompressionAlgorithms = 22,
    KeyServerPreferences = 23,
    PreferredKeyServer = 24,
    PrimaryUserId = 25,
    PolicyUri = 26,
    KeyFlags = 27,
    SignersUserId = 28,
    RevocationReason = 29,
    Features = 30,
    SignatureTarget = 31,
    EmbeddedSignature = 32,
    IssuerFingerprint = 33,

    #[num_enum(catch_all)]
    Other(u8),
}

/// A single subpacket, with its criticality bit preserved.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Subpacket {
    pub is_critical: bool,
    pub data: SubpacketData,
}

impl Subpacket {
    /// A non critical subpacket.
    pub fn regular(data: SubpacketData) -> Self {
        Subpacket {
            is_critical: false,
            data,
        }
    }

    pub fn typ(&self) -> SubpacketType {
        self.data.typ()
    }
}

/// Subpacket payloads the pipeline consumes, decoded; everything else is
/// preserved raw so signatures round-trip byte for byte.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SubpacketData {
    /// The time the signature was made.
    SignatureCreationTime(DateTime<Utc>),
    /// Seconds after the creation time at which the signature expires.
    SignatureExpirationTime(u32),
    /// Seconds after the key creation time at which the key expires.
    KeyExpirationTime(u32),
    /// The eight octet key id of the issuing key.
    Issuer(KeyId),
    /// Ranked cipher preferences of the key holder.
    PreferredSymmetricAlgorithms(SmallVec<[SymmetricKeyAlgorithm; 8]>),
    PreferredHashAlgorithms(SmallVec<[HashAlgorithm; 8]>),
    PreferredCompressionAlgorithms(SmallVec<[CompressionAlgorithm; 8]>),
    /// Capability flags of the bound key.
    KeyFlags(SmallVec<[u8; 1]>),
    Features(SmallVec<[u8; 1]>),
    PrimaryUserId(bool),
    /// Key version octet followed by the fingerprint.
    IssuerFingerprint(Vec<u8>),
    /// Anything else, raw.
    Other(u8, Vec<u8>),
}

impl SubpacketData {
    pub fn typ(&self) -> SubpacketType {
        match self {
            SubpacketData::SignatureCreationTime(_) => SubpacketType::SignatureCreationTime,
            SubpacketData::SignatureExpirationTime(_) => SubpacketType::SignatureExpirationTime,
            SubpacketData::KeyExpirationTime(_) => SubpacketType::KeyExpirationTime,
            SubpacketData::Issuer(_) => SubpacketType::Issuer,
            SubpacketData::PreferredSymmetricAlgorithms(_) => {
                SubpacketType::PreferredSymmetricAlgorithms
            }
            SubpacketData::PreferredHashAlgorithms(_) => SubpacketType::PreferredHashAlgorithms,
            SubpacketData::PreferredCompressionAlgorithms(_) => {
                SubpacketType::PreferredCompressionAlgorithms
            }
            SubpacketData::KeyFlags(_) => SubpacketType::KeyFlags,
            SubpacketData::Features(_) => SubpacketType::Features,
            SubpacketData::PrimaryUserId(_) => SubpacketType::PrimaryUserId,
            SubpacketData::IssuerFingerprint(_) => SubpacketType::IssuerFingerprint,
            SubpacketData::Other(typ, _) => SubpacketType::from(*typ),
        }
    }

    fn body_to_writer(&self, writer: &mut impl io::Write) -> Result<()> {
        match self {
            SubpacketData::SignatureCreationTime(t) => {
                writer.write_u32::<BigEndian>(t.timestamp() as u32)?;
            }
            SubpacketData::SignatureExpirationTime(d) | SubpacketData::KeyExpirationTime(d) => {
                writer.write_u32::<BigEndian>(*d)?;
            }
            SubpacketData::Issuer(id) => {
                writer.write_all(id.as_ref())?;
            }
            SubpacketData::PreferredSymmetricAlgorithms(algs) => {
                for alg in algs {
                    writer.write_u8((*alg).into())?;
                }
            }
            SubpacketData::PreferredHashAlgorithms(algs) => {
                for alg in algs {
                    writer.write_u8((*alg).into())?;
                }
            }
            SubpacketData::PreferredCompressionAlgorithms(algs) => {
                for alg in algs {
                    writer.write_u8((*alg).into())?;
                }
            }
            SubpacketData::KeyFlags(flags) | SubpacketData::Features(flags) => {
                writer.write_all(flags)?;
            }
            SubpacketData::PrimaryUserId(is_primary) => {
                writer.write_u8(u8::from(*is_primary))?;
            }
            SubpacketData::IssuerFingerprint(data) | SubpacketData::Other(_, data) => {
                writer.write_all(data)?;
            }
        }

        Ok(())
    }
}

impl Serialize for Subpacket {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        let mut body = Vec::new();
        self.data.body_to_writer(&mut body)?;

        write_packet_length(1 + body.len(), writer)?;

        let mut typ: u8 = self.typ().into();
        if self.is_critical {
            typ |= 0x80;
        }
        writer.write_u8(typ)?;
        writer.write_all(&body)?;

        Ok(())
    }
}

fn creation_time(body: &[u8]) -> IResult<&[u8], SubpacketData> {
    map_opt(be_u32, |ts| {
        Utc.timestamp_opt(i64::from(ts), 0)
            .single()
            .map(SubpacketData::SignatureCreationTime)
    })(body)
}

fn issuer(body: &[u8]) -> IResult<&[u8], SubpacketData> {
    let (body, raw) = take(8usize)(body)?;
    let id = KeyId::from_slice(raw).map_err(nom::Err::Error)?;
    Ok((body, SubpacketData::Issuer(id)))
}

fn parse_body(typ: SubpacketType, body: &[u8]) -> Result<SubpacketData> {
    let data = match typ {
        SubpacketType::SignatureCreationTime => creation_time(body)?.1,
        SubpacketType::SignatureExpirationTime => {
            SubpacketData::SignatureExpirationTime(be_u32::<_, crate::errors::Error>(body)?.1)
        }
        SubpacketType::KeyExpirationTime => {
            SubpacketData::KeyExpirationTime(be_u32::<_, crate::errors::Error>(body)?.1)
        }
        SubpacketType::Issuer => issuer(body)?.1,
        SubpacketType::PreferredSymmetricAlgorithms => SubpacketData::PreferredSymmetricAlgorithms(
            body.iter().map(|v| SymmetricKeyAlgorithm::from(*v)).collect(),
        ),
        SubpacketType::PreferredHashAlgorithms => SubpacketData::PreferredHashAlgorithms(
            body.iter().map(|v| HashAlgorithm::from(*v)).collect(),
        ),
        SubpacketType::PreferredCompressionAlgorithms => {
            SubpacketData::PreferredCompressionAlgorithms(
                body.iter().map(|v| CompressionAlgorithm::from(*v)).collect(),
            )
        }
        SubpacketType::KeyFlags => SubpacketData::KeyFlags(SmallVec::from_slice(body)),
        SubpacketType::Features => SubpacketData::Features(SmallVec::from_slice(body)),
        SubpacketType::PrimaryUserId => {
            SubpacketData::PrimaryUserId(be_u8::<_, crate::errors::Error>(body)?.1 == 1)
        }
        SubpacketType::IssuerFingerprint => SubpacketData::IssuerFingerprint(body.to_vec()),
        _ => SubpacketData::Other(typ.into(), body.to_vec()),
    };

    Ok(data)
}

/// Parse a full subpacket area. Subpackets of a known type whose body does
/// not parse are kept raw rather than failing the whole signature.
pub fn subpackets(mut i: &[u8]) -> Result<Vec<Subpacket>> {
    let mut out = Vec::new();

    while !i.is_empty() {
        let (rest, len) = packet_length(i)?;
        ensure!(len >= 1, "invalid subpacket length");
        ensure!(rest.len() >= len, "subpacket overruns the area");

        let typ_raw = rest[0];
        let is_critical = typ_raw & 0x80 != 0;
        let typ = SubpacketType::from(typ_raw & 0x7F);
        let body = &rest[1..len];

        let data = match parse_body(typ, body) {
            Ok(data) => data,
            Err(err) => {
                warn!("unparseable subpacket {:?}: {:?}", typ, err);
                SubpacketData::Other(typ_raw & 0x7F, body.to_vec())
            }
        };

        out.push(Subpacket { is_critical, data });
        i = &rest[len..];
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(sp: Subpacket) {
        let buf = sp.to_bytes().unwrap();
        let back = subpackets(&buf).unwrap();
        assert_eq!(back, vec![sp]);
    }

    #[test]
    fn test_subpacket_roundtrips() {
        roundtrip(Subpacket::regular(SubpacketData::SignatureCreationTime(
            Utc.timestamp_opt(1_600_000_000, 0).unwrap(),
        )));
        roundtrip(Subpacket::regular(SubpacketData::Issuer(
            KeyId::from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap(),
        )));
        roundtrip(Subpacket::regular(
            SubpacketData::PreferredSymmetricAlgorithms(
                [
                    SymmetricKeyAlgorithm::AES256,
                    SymmetricKeyAlgorithm::AES128,
                ]
                .into_iter()
                .collect(),
            ),
        ));
        roundtrip(Subpacket::regular(SubpacketData::KeyFlags(
            SmallVec::from_slice(&[0x0C]),
        )));
        roundtrip(Subpacket {
            is_critical: true,
            data: SubpacketData::Other(100, vec![1, 2, 3]),
        });
    }

    #[test]
    fn test_unknown_body_kept_raw() {
        // an issuer subpacket with a truncated body falls back to raw
        let mut buf = Vec::new();
        write_packet_length(1 + 3, &mut buf).unwrap();
        buf.push(u8::from(SubpacketType::Issuer));
        buf.extend_from_slice(&[1, 2, 3]);

        let parsed = subpackets(&buf).unwrap();
        assert_eq!(
            parsed,
            vec![Subpacket::regular(SubpacketData::Other(
                16,
                vec![1, 2, 3]
            ))]
        );
    }
}
