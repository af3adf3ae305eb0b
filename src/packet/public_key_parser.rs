use chrono::{DateTime, TimeZone, Utc};
use nom::combinator::{map, map_opt, rest};
use nom::multi::length_data;
use nom::number::streaming::{be_u32, be_u8};

use crate::crypto::ecc_curve::ecc_curve_from_oid;
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{Error, IResult};
use crate::types::{mpi, KeyVersion, PublicParams};

fn rsa(i: &[u8]) -> IResult<&[u8], PublicParams> {
    let (i, n) = mpi(i)?;
    let (i, e) = mpi(i)?;
    Ok((i, PublicParams::RSA { n, e }))
}

fn dsa(i: &[u8]) -> IResult<&[u8], PublicParams> {
    let (i, p) = mpi(i)?;
    let (i, q) = mpi(i)?;
    let (i, g) = mpi(i)?;
    let (i, y) = mpi(i)?;
    Ok((i, PublicParams::DSA { p, q, g, y }))
}

fn elgamal(i: &[u8]) -> IResult<&[u8], PublicParams> {
    let (i, p) = mpi(i)?;
    let (i, g) = mpi(i)?;
    let (i, y) = mpi(i)?;
    Ok((i, PublicParams::Elgamal { p, g, y }))
}

/// Ref: <https://tools.ietf.org/html/rfc6637#section-9>
fn ecdsa(i: &[u8]) -> IResult<&[u8], PublicParams> {
    let (i, curve) = map(length_data(be_u8), ecc_curve_from_oid)(i)?;
    let (i, p) = mpi(i)?;
    Ok((i, PublicParams::ECDSA { curve, p }))
}

/// Ref: <https://tools.ietf.org/html/rfc6637#section-9>
fn ecdh(i: &[u8]) -> IResult<&[u8], PublicParams> {
    let (i, curve) = map(length_data(be_u8), ecc_curve_from_oid)(i)?;
    let (i, p) = mpi(i)?;
    // kdf parameters: length, reserved 0x01, hash id, wrap cipher id
    let (i, _len) = be_u8(i)?;
    let (i, one) = be_u8(i)?;
    if one != 0x01 {
        return Err(nom::Err::Error(Error::InvalidMessage {
            message: "invalid ecdh kdf parameters".to_string(),
        }));
    }
    let (i, hash) = map(be_u8, HashAlgorithm::from)(i)?;
    let (i, alg_sym) = map(be_u8, SymmetricKeyAlgorithm::from)(i)?;

    Ok((
        i,
        PublicParams::ECDH {
            curve,
            p,
            hash,
            alg_sym,
        },
    ))
}

/// Ref: <https://datatracker.ietf.org/doc/html/draft-koch-eddsa-for-openpgp-00#section-4>
fn eddsa(i: &[u8]) -> IResult<&[u8], PublicParams> {
    let (i, curve) = map(length_data(be_u8), ecc_curve_from_oid)(i)?;
    let (i, q) = mpi(i)?;
    Ok((i, PublicParams::EdDSA { curve, q }))
}

fn unknown(i: &[u8]) -> IResult<&[u8], PublicParams> {
    let (i, data) = rest(i)?;
    Ok((
        i,
        PublicParams::Unknown {
            data: data.to_vec(),
        },
    ))
}

/// Parse the algorithm specific public fields.
pub(crate) fn parse_pub_fields(
    typ: PublicKeyAlgorithm,
) -> impl Fn(&[u8]) -> IResult<&[u8], PublicParams> {
    move |i: &[u8]| match typ {
        PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSAEncrypt | PublicKeyAlgorithm::RSASign => {
            rsa(i)
        }
        PublicKeyAlgorithm::DSA => dsa(i),
        PublicKeyAlgorithm::Elgamal | PublicKeyAlgorithm::ElgamalEncrypt => elgamal(i),
        PublicKeyAlgorithm::ECDSA => ecdsa(i),
        PublicKeyAlgorithm::ECDH => ecdh(i),
        PublicKeyAlgorithm::EdDSA => eddsa(i),
        _ => unknown(i),
    }
}

/// Parse the shared layout of public key and subkey packets (Tag 6 / 14).
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.5.2>
#[allow(clippy::type_complexity)]
pub(crate) fn parse(
    i: &[u8],
) -> IResult<
    &[u8],
    (
        KeyVersion,
        PublicKeyAlgorithm,
        DateTime<Utc>,
        Option<u16>,
        PublicParams,
    ),
> {
    let (i, key_ver) = map(be_u8, KeyVersion::from)(i)?;

    if key_ver != KeyVersion::V4 {
        return Err(nom::Err::Error(Error::Unsupported {
            message: format!("key version {:?}", key_ver),
        }));
    }

    let (i, created_at) = map_opt(be_u32, |v| Utc.timestamp_opt(i64::from(v), 0).single())(i)?;
    let (i, alg) = map(be_u8, PublicKeyAlgorithm::from)(i)?;
    let (i, params) = parse_pub_fields(alg)(i)?;

    Ok((i, (key_ver, alg, created_at, None, params)))
}
