use nom::bytes::streaming::take;
use nom::combinator::{complete, map, map_res};
use nom::multi::many0;
use nom::number::streaming::{be_u16, be_u8};

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::de::Deserialize;
use crate::errors::{Error, IResult, Result};
use crate::packet::signature::subpacket::subpackets;
use crate::packet::signature::types::{Signature, SignatureConfig, SignatureType, SignatureVersion};
use crate::types::{mpi, Mpi, Version};

/// The algorithm specific signature MPIs.
fn actual_signature(typ: PublicKeyAlgorithm) -> impl Fn(&[u8]) -> IResult<&[u8], Vec<Mpi>> {
    move |i: &[u8]| match typ {
        PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSAEncrypt | PublicKeyAlgorithm::RSASign => {
            let (i, s) = mpi(i)?;
            Ok((i, vec![s]))
        }
        PublicKeyAlgorithm::DSA | PublicKeyAlgorithm::ECDSA | PublicKeyAlgorithm::EdDSA => {
            let (i, r) = mpi(i)?;
            let (i, s) = mpi(i)?;
            Ok((i, vec![r, s]))
        }
        _ => many0(complete(mpi))(i),
    }
}

/// Parse a V4 signature body, after the version octet.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.2.3>
fn v4_parser(packet_version: Version) -> impl Fn(&[u8]) -> IResult<&[u8], Signature> {
    move |i: &[u8]| {
        let (i, typ) = map_res(be_u8, SignatureType::try_from)(i)?;
        let (i, pub_alg) = map(be_u8, PublicKeyAlgorithm::from)(i)?;
        let (i, hash_alg) = map(be_u8, HashAlgorithm::from)(i)?;

        let (i, hsub_len) = be_u16(i)?;
        let (i, hsub_raw) = take(hsub_len)(i)?;
        let hashed_subpackets = subpackets(hsub_raw).map_err(nom::Err::Error)?;

        let (i, usub_len) = be_u16(i)?;
        let (i, usub_raw) = take(usub_len)(i)?;
        let unhashed_subpackets = subpackets(usub_raw).map_err(nom::Err::Error)?;

        let (i, ls_hash) = take(2usize)(i)?;
        let (i, signature) = actual_signature(pub_alg)(i)?;

        let config = SignatureConfig {
            version: SignatureVersion::V4,
            typ,
            pub_alg,
            hash_alg,
            hashed_subpackets,
            unhashed_subpackets,
        };

        let mut sig = Signature::from_config(config, [ls_hash[0], ls_hash[1]], signature);
        sig.packet_version = packet_version;

        Ok((i, sig))
    }
}

impl Deserialize for Signature {
    fn from_slice(packet_version: Version, input: &[u8]) -> Result<Self> {
        let (i, version) = be_u8::<_, Error>(input)?;

        match version {
            4 => {
                let (_, sig) = v4_parser(packet_version)(i)?;
                Ok(sig)
            }
            2 | 3 => Err(Error::Unsupported {
                message: format!("V{version} signatures"),
            }),
            _ => Err(Error::InvalidMessage {
                message: format!("unknown signature version {version}"),
            }),
        }
    }
}
