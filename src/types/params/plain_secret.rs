use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use nom::combinator::all_consuming;
use num_bigint::BigUint;
use zeroize::Zeroize;

use crate::crypto::checksum;
use crate::crypto::ecc_curve::ECCCurve;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::{IResult, Result};
use crate::ser::Serialize;
use crate::types::mpi::{mpi, Mpi};
use crate::types::params::PublicParams;
use crate::types::secret_key_repr::{EdDSASecretKey, SecretKeyRepr};

/// Decrypted secret key material. Zeroed on drop.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.5.3>
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlainSecretParams {
    RSA { d: Mpi, p: Mpi, q: Mpi, u: Mpi },
    DSA(Mpi),
    ECDSA(Mpi),
    ECDH(Mpi),
    Elgamal(Mpi),
    EdDSA(Mpi),
}

impl PlainSecretParams {
    /// Parse the algorithm specific secret fields. `data` must contain
    /// exactly the MPIs, without any trailing checksum.
    pub fn from_slice(data: &[u8], alg: PublicKeyAlgorithm) -> Result<Self> {
        let (_, params) = all_consuming(|i| parse_secret_fields(i, alg))(data)?;
        Ok(params)
    }

    fn to_writer_raw<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            PlainSecretParams::RSA { d, p, q, u } => {
                d.to_writer(writer)?;
                p.to_writer(writer)?;
                q.to_writer(writer)?;
                u.to_writer(writer)?;
            }
            PlainSecretParams::DSA(x)
            | PlainSecretParams::ECDSA(x)
            | PlainSecretParams::ECDH(x)
            | PlainSecretParams::Elgamal(x)
            | PlainSecretParams::EdDSA(x) => {
                x.to_writer(writer)?;
            }
        }

        Ok(())
    }

    /// The raw MPI block, as hashed by the integrity checks and as fed into
    /// the CFB encryption when locking the key.
    pub fn to_raw_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.to_writer_raw(&mut buf)?;
        Ok(buf)
    }

    pub fn checksum_simple(&self) -> Result<u16> {
        Ok(checksum::calculate_simple(&self.to_raw_bytes()?))
    }

    pub fn checksum_sha1(&self) -> Result<Vec<u8>> {
        Ok(checksum::calculate_sha1(&self.to_raw_bytes()?))
    }

    /// Turn the raw MPIs into an operational secret key.
    pub fn as_repr(&self, public_params: &PublicParams) -> Result<SecretKeyRepr> {
        match self {
            PlainSecretParams::RSA { d, p, q, .. } => match public_params {
                PublicParams::RSA { n, e } => {
                    let key = rsa::RsaPrivateKey::from_components(
                        BigUint::from(n),
                        BigUint::from(e),
                        BigUint::from(d),
                        vec![BigUint::from(p), BigUint::from(q)],
                    )?;
                    key.validate()?;
                    Ok(SecretKeyRepr::RSA(key))
                }
                _ => bail!("inconsistent key state"),
            },
            PlainSecretParams::EdDSA(d) => match public_params {
                PublicParams::EdDSA { curve, .. } => match curve {
                    ECCCurve::Ed25519 => {
                        let mut secret = [0u8; 32];
                        secret.copy_from_slice(&d.to_padded(32)?);
                        Ok(SecretKeyRepr::EdDSA(EdDSASecretKey { secret }))
                    }
                    _ => unsupported_err!("curve {:?} for EdDSA", curve),
                },
                _ => bail!("inconsistent key state"),
            },
            PlainSecretParams::DSA(_) => unsupported_err!("signing with DSA"),
            PlainSecretParams::ECDSA(_) => unsupported_err!("signing with ECDSA"),
            PlainSecretParams::ECDH(_) => unsupported_err!("decryption with ECDH"),
            PlainSecretParams::Elgamal(_) => unsupported_err!("decryption with Elgamal"),
        }
    }
}

impl Serialize for PlainSecretParams {
    /// Emit as stored in an unprotected secret key packet: S2K usage octet
    /// zero, the MPIs, then the two-octet checksum.
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(0)?;
        let raw = self.to_raw_bytes()?;
        writer.write_all(&raw)?;
        writer.write_u16::<BigEndian>(checksum::calculate_simple(&raw))?;

        Ok(())
    }
}

impl Zeroize for PlainSecretParams {
    fn zeroize(&mut self) {
        match self {
            PlainSecretParams::RSA { d, p, q, u } => {
                for x in [d, p, q, u] {
                    x.zeroize();
                }
            }
            PlainSecretParams::DSA(x)
            | PlainSecretParams::ECDSA(x)
            | PlainSecretParams::ECDH(x)
            | PlainSecretParams::Elgamal(x)
            | PlainSecretParams::EdDSA(x) => {
                x.zeroize();
            }
        }
    }
}

impl Drop for PlainSecretParams {
    fn drop(&mut self) {
        self.zeroize();
    }
}

fn parse_secret_fields(i: &[u8], alg: PublicKeyAlgorithm) -> IResult<&[u8], PlainSecretParams> {
    match alg {
        PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSAEncrypt | PublicKeyAlgorithm::RSASign => {
            let (i, d) = mpi(i)?;
            let (i, p) = mpi(i)?;
            let (i, q) = mpi(i)?;
            let (i, u) = mpi(i)?;
            Ok((i, PlainSecretParams::RSA { d, p, q, u }))
        }
        PublicKeyAlgorithm::DSA => {
            let (i, x) = mpi(i)?;
            Ok((i, PlainSecretParams::DSA(x)))
        }
        PublicKeyAlgorithm::ECDSA => {
            let (i, x) = mpi(i)?;
            Ok((i, PlainSecretParams::ECDSA(x)))
        }
        PublicKeyAlgorithm::ECDH => {
            let (i, x) = mpi(i)?;
            Ok((i, PlainSecretParams::ECDH(x)))
        }
        PublicKeyAlgorithm::ElgamalEncrypt | PublicKeyAlgorithm::Elgamal => {
            let (i, x) = mpi(i)?;
            Ok((i, PlainSecretParams::Elgamal(x)))
        }
        PublicKeyAlgorithm::EdDSA => {
            let (i, x) = mpi(i)?;
            Ok((i, PlainSecretParams::EdDSA(x)))
        }
        _ => Err(nom::Err::Error(crate::errors::Error::Unsupported {
            message: format!("secret params for {alg:?}"),
        })),
    }
}
