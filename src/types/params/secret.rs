use std::io;

use byteorder::{BigEndian, ByteOrder};
use nom::bytes::streaming::take;
use nom::combinator::rest;
use nom::number::streaming::be_u8;
use rand::{CryptoRng, Rng};

use crate::crypto::checksum;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{Error, IResult, Result};
use crate::ser::Serialize;
use crate::types::params::{EncryptedSecretParams, PlainSecretParams};
use crate::types::s2k::{s2k_parser, StringToKey};

/// The secret portion of a key packet, possibly passphrase protected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretParams {
    Plain(PlainSecretParams),
    Encrypted(EncryptedSecretParams),
}

impl SecretParams {
    pub fn is_encrypted(&self) -> bool {
        matches!(self, SecretParams::Encrypted(_))
    }

    pub fn from_slice(data: &[u8], alg: PublicKeyAlgorithm) -> Result<Self> {
        let (_, params) = parse_secret_params(alg)(data)?;
        Ok(params)
    }

    /// Protect plain secret material under a passphrase: S2K usage 254,
    /// AES-128 CFB, iterated-salted key derivation, SHA-1 integrity.
    pub fn encrypt<R: CryptoRng + Rng>(
        rng: &mut R,
        plain: &PlainSecretParams,
        passphrase: &str,
    ) -> Result<Self> {
        let alg = SymmetricKeyAlgorithm::AES128;
        let s2k = StringToKey::new_default(rng);
        let key = s2k.derive_key(passphrase, alg.key_size())?;

        let mut iv = vec![0u8; alg.block_size()];
        rng.fill(&mut iv[..]);

        let mut data = plain.to_raw_bytes()?;
        data.extend_from_slice(&plain.checksum_sha1()?);
        alg.encrypt_with_iv_regular(&key, &iv, &mut data)?;

        Ok(SecretParams::Encrypted(EncryptedSecretParams::new(
            data, iv, alg, s2k, 254,
        )))
    }
}

impl Serialize for SecretParams {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            SecretParams::Plain(p) => p.to_writer(writer),
            SecretParams::Encrypted(p) => p.to_writer(writer),
        }
    }
}

/// Parse the secret fields of a key packet: the S2K usage octet, the
/// optional protection header, and the (possibly encrypted) MPI block.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.5.3>
fn parse_secret_params(
    alg: PublicKeyAlgorithm,
) -> impl Fn(&[u8]) -> IResult<&[u8], SecretParams> {
    move |i: &[u8]| {
        let (i, s2k_usage) = be_u8(i)?;

        match s2k_usage {
            // unencrypted: the MPIs followed by a two-octet checksum in the clear
            0 => {
                let (i, data) = rest(i)?;
                if data.len() < 2 {
                    return Err(nom::Err::Error(Error::InvalidMessage {
                        message: "secret key material too short".to_string(),
                    }));
                }
                let (mpis, expected) = data.split_at(data.len() - 2);
                if checksum::calculate_simple(mpis) != BigEndian::read_u16(expected) {
                    return Err(nom::Err::Error(Error::InvalidMessage {
                        message: "secret key checksum mismatch".to_string(),
                    }));
                }
                let params = PlainSecretParams::from_slice(mpis, alg)
                    .map_err(nom::Err::Error)?;
                Ok((i, SecretParams::Plain(params)))
            }
            // encrypted, with an explicit cipher octet and S2K specifier
            254 | 255 => {
                let (i, sym_alg) = be_u8(i)?;
                let sym_alg = SymmetricKeyAlgorithm::from(sym_alg);
                let (i, s2k) = s2k_parser(i)?;
                let (i, iv) = take(sym_alg.block_size())(i)?;
                let (i, data) = rest(i)?;
                Ok((
                    i,
                    SecretParams::Encrypted(EncryptedSecretParams::new(
                        data.to_vec(),
                        iv.to_vec(),
                        sym_alg,
                        s2k,
                        s2k_usage,
                    )),
                ))
            }
            // legacy: the usage octet is the cipher id, key derived via MD5
            // simple S2K
            _ => {
                let sym_alg = SymmetricKeyAlgorithm::from(s2k_usage);
                let (i, iv) = take(sym_alg.block_size())(i)?;
                let (i, data) = rest(i)?;
                let s2k = legacy_s2k();
                Ok((
                    i,
                    SecretParams::Encrypted(EncryptedSecretParams::new(
                        data.to_vec(),
                        iv.to_vec(),
                        sym_alg,
                        s2k,
                        s2k_usage,
                    )),
                ))
            }
        }
    }
}

/// The implicit MD5 simple S2K of pre-4880 secret keys.
fn legacy_s2k() -> StringToKey {
    let (_, s2k) = s2k_parser(&[0, 1]).expect("static simple s2k");
    s2k
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::types::Mpi;

    #[test]
    fn test_plain_roundtrip() {
        let plain = PlainSecretParams::RSA {
            d: Mpi::from_slice(&[5, 6, 7]),
            p: Mpi::from_slice(&[1, 2]),
            q: Mpi::from_slice(&[3, 4]),
            u: Mpi::from_slice(&[9]),
        };

        let buf = SecretParams::Plain(plain.clone()).to_bytes().unwrap();
        let back = SecretParams::from_slice(&buf, PublicKeyAlgorithm::RSA).unwrap();
        assert_eq!(back, SecretParams::Plain(plain));
    }

    #[test]
    fn test_lock_unlock() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let plain = PlainSecretParams::EdDSA(Mpi::from_slice(&[0x17; 32]));

        let locked = SecretParams::encrypt(&mut rng, &plain, "hunter2").unwrap();
        assert!(locked.is_encrypted());

        // survives serialization
        let buf = locked.to_bytes().unwrap();
        let back = SecretParams::from_slice(&buf, PublicKeyAlgorithm::EdDSA).unwrap();
        assert_eq!(back, locked);

        let SecretParams::Encrypted(enc) = back else {
            unreachable!()
        };
        let unlocked = enc.unlock("hunter2", PublicKeyAlgorithm::EdDSA).unwrap();
        assert_eq!(unlocked, plain);

        assert!(matches!(
            enc.unlock("wrong", PublicKeyAlgorithm::EdDSA),
            Err(Error::PassphraseIncorrect)
        ));
    }
}
