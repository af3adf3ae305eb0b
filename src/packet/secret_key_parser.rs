use chrono::{DateTime, Utc};
use nom::combinator::{map_res, rest};

use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::IResult;
use crate::packet::public_key_parser;
use crate::types::{KeyVersion, PublicParams, SecretParams};

/// Parse a secret key or subkey packet (Tag 5 / 7): the public layout
/// followed by the possibly encrypted secret fields.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.5.3>
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
        SecretParams,
    ),
> {
    let (i, (key_ver, alg, created_at, expiration, pub_params)) = public_key_parser::parse(i)?;
    let (i, secret_params) = map_res(rest, |v| SecretParams::from_slice(v, alg))(i)?;

    Ok((i, (key_ver, alg, created_at, expiration, pub_params, secret_params)))
}
