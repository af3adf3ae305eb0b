use std::io;

use byteorder::{BigEndian, ByteOrder};
use nom::bytes::streaming::take;
use nom::combinator::rest;
use nom::multi::length_data;
use nom::number::streaming::be_u8;
use rand::{CryptoRng, Rng};

use crate::crypto::checksum;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::de::Deserialize;
use crate::errors::{Error, IResult, Result};
use crate::packet::packet_trait::PacketTrait;
use crate::ser::Serialize;
use crate::types::{mpi, KeyId, KeyTrait, Mpi, PublicKeyTrait, SecretKeyRepr, Tag, Version};

/// Public-Key Encrypted Session Key Packet (version 3).
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.1>
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKeyEncryptedSessionKey {
    packet_version: Version,
    id: KeyId,
    algorithm: PublicKeyAlgorithm,
    values: EncryptedValues,
}

/// The algorithm specific ciphertext. Algorithms whose operations this
/// crate does not carry keep their material verbatim, so the packet still
/// round-trips.
#[derive(Clone, PartialEq, Eq)]
enum EncryptedValues {
    Mpis(Vec<Mpi>),
    Raw(Vec<u8>),
}

impl PublicKeyEncryptedSessionKey {
    /// Wrap `session_key` for the given recipient key: the encrypted payload
    /// is `sym_alg | session_key | checksum`.
    pub fn from_session_key<R: CryptoRng + Rng>(
        rng: &mut R,
        session_key: &[u8],
        alg: SymmetricKeyAlgorithm,
        pkey: &(impl PublicKeyTrait + KeyTrait),
    ) -> Result<Self> {
        let mut data = Vec::with_capacity(session_key.len() + 3);
        data.push(u8::from(alg));
        data.extend_from_slice(session_key);
        data.extend_from_slice(&checksum::calculate_simple(session_key).to_be_bytes());

        let mpis = pkey.encrypt(rng, &data)?;

        Ok(PublicKeyEncryptedSessionKey {
            packet_version: Default::default(),
            id: pkey.key_id(),
            algorithm: pkey.algorithm(),
            values: EncryptedValues::Mpis(mpis),
        })
    }

    pub fn id(&self) -> &KeyId {
        &self.id
    }

    pub fn algorithm(&self) -> PublicKeyAlgorithm {
        self.algorithm
    }

    pub fn mpis(&self) -> Result<&[Mpi]> {
        match &self.values {
            EncryptedValues::Mpis(mpis) => Ok(mpis),
            EncryptedValues::Raw(_) => Err(Error::CryptoUnavailable {
                message: format!("session key decryption with {:?}", self.algorithm),
            }),
        }
    }

    /// Recover `(sym_alg, session_key)` with an unlocked secret key,
    /// validating the payload checksum.
    pub fn unwrap_session_key(
        &self,
        repr: &SecretKeyRepr,
    ) -> Result<(SymmetricKeyAlgorithm, Vec<u8>)> {
        let decrypted = repr.decrypt(self.mpis()?)?;

        if decrypted.len() < 3 {
            return Err(Error::InvalidMessage {
                message: "session key payload too short".to_string(),
            });
        }

        let alg = SymmetricKeyAlgorithm::from(decrypted[0]);
        let (key, expected) = decrypted[1..].split_at(decrypted.len() - 3);

        if checksum::calculate_simple(key) != BigEndian::read_u16(expected) {
            return Err(Error::InvalidMessage {
                message: "session key checksum mismatch".to_string(),
            });
        }

        ensure_eq!(key.len(), alg.key_size(), "invalid session key length");

        Ok((alg, key.to_vec()))
    }
}

fn parse_values(alg: PublicKeyAlgorithm) -> impl Fn(&[u8]) -> IResult<&[u8], EncryptedValues> {
    move |i: &[u8]| match alg {
        PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSAEncrypt | PublicKeyAlgorithm::RSASign => {
            let (i, m) = mpi(i)?;
            Ok((i, EncryptedValues::Mpis(vec![m])))
        }
        PublicKeyAlgorithm::Elgamal | PublicKeyAlgorithm::ElgamalEncrypt => {
            let (i, first) = mpi(i)?;
            let (i, second) = mpi(i)?;
            Ok((i, EncryptedValues::Mpis(vec![first, second])))
        }
        PublicKeyAlgorithm::ECDH => {
            // an MPI point plus a length prefixed wrapped key; kept raw
            let start = i;
            let (i, _point) = mpi(i)?;
            let (i, _wrapped) = length_data(be_u8)(i)?;
            let consumed = start.len() - i.len();
            Ok((i, EncryptedValues::Raw(start[..consumed].to_vec())))
        }
        _ => {
            let (i, data) = rest(i)?;
            Ok((i, EncryptedValues::Raw(data.to_vec())))
        }
    }
}

impl Deserialize for PublicKeyEncryptedSessionKey {
    fn from_slice(packet_version: Version, input: &[u8]) -> Result<Self> {
        let (i, version) = be_u8(input)?;
        ensure_eq!(version, 3, "invalid pkesk version");

        let (i, id) = take(8usize)(i)?;
        let (i, alg) = be_u8(i)?;
        let algorithm = PublicKeyAlgorithm::from(alg);
        let (_, values) = parse_values(algorithm)(i)?;

        Ok(PublicKeyEncryptedSessionKey {
            packet_version,
            id: KeyId::from_slice(id)?,
            algorithm,
            values,
        })
    }
}

impl Serialize for PublicKeyEncryptedSessionKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[0x03])?;
        writer.write_all(self.id.as_ref())?;
        writer.write_all(&[u8::from(self.algorithm)])?;

        match &self.values {
            EncryptedValues::Mpis(mpis) => {
                for m in mpis {
                    m.to_writer(writer)?;
                }
            }
            EncryptedValues::Raw(data) => {
                writer.write_all(data)?;
            }
        }

        Ok(())
    }
}

impl PacketTrait for PublicKeyEncryptedSessionKey {
    fn packet_version(&self) -> Version {
        self.packet_version
    }

    fn tag(&self) -> Tag {
        Tag::PublicKeyEncryptedSessionKey
    }
}

impl std::fmt::Debug for PublicKeyEncryptedSessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKeyEncryptedSessionKey")
            .field("packet_version", &self.packet_version)
            .field("id", &self.id)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}
