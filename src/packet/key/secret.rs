use rand::{CryptoRng, Rng};

use crate::errors::{Error, Result};
use crate::packet::key::public::{PubKeyInner, PublicKey, PublicSubkey};
use crate::packet::secret_key_parser;
use crate::ser::Serialize;
use crate::types::{
    PlainSecretParams, SecretKeyRepr, SecretParams, Tag,
};

macro_rules! impl_secret_key {
    ($name:ident, $tag:expr, $public:ident) => {
        /// Ref: <https://tools.ietf.org/html/rfc4880#section-5.5.3>
        #[derive(Debug, PartialEq, Eq, Clone)]
        pub struct $name {
            details: $public,
            secret_params: SecretParams,
        }

        impl $name {
            pub fn new(details: $public, secret_params: SecretParams) -> Self {
                $name {
                    details,
                    secret_params,
                }
            }

            pub fn secret_params(&self) -> &SecretParams {
                &self.secret_params
            }

            /// Whether usage requires a passphrase.
            pub fn is_locked(&self) -> bool {
                self.secret_params.is_encrypted()
            }

            /// The public half of this key.
            pub fn public_key(&self) -> $public {
                self.details.clone()
            }

            /// Replace plaintext secret material with a passphrase protected
            /// block (S2K usage 254).
            pub fn lock<R: CryptoRng + Rng>(
                &mut self,
                rng: &mut R,
                passphrase: &str,
            ) -> Result<()> {
                match &self.secret_params {
                    SecretParams::Plain(plain) => {
                        self.secret_params = SecretParams::encrypt(rng, plain, passphrase)?;
                        Ok(())
                    }
                    SecretParams::Encrypted(_) => bail!("key is already locked"),
                }
            }
        }

        impl $crate::types::SecretKeyTrait for $name {
            type PublicKey = $public;

            fn unlock<F, G, T>(&self, pw: F, work: G) -> Result<T>
            where
                F: FnOnce() -> Option<String>,
                G: FnOnce(&SecretKeyRepr) -> Result<T>,
            {
                use $crate::types::KeyTrait;

                let plain: PlainSecretParams = match &self.secret_params {
                    SecretParams::Plain(k) => k.clone(),
                    SecretParams::Encrypted(locked) => {
                        let Some(passphrase) = pw() else {
                            return Err(Error::PassphraseRequired);
                        };
                        locked.unlock(&passphrase, self.algorithm())?
                    }
                };

                let repr = plain.as_repr(self.details.public_params())?;
                work(&repr)
            }

            fn public_key(&self) -> Self::PublicKey {
                self.details.clone()
            }
        }

        impl $crate::types::KeyTrait for $name {
            fn fingerprint(&self) -> Vec<u8> {
                use $crate::types::KeyTrait;
                self.details.fingerprint()
            }

            fn key_id(&self) -> $crate::types::KeyId {
                use $crate::types::KeyTrait;
                self.details.key_id()
            }

            fn algorithm(&self) -> $crate::crypto::public_key::PublicKeyAlgorithm {
                use $crate::types::KeyTrait;
                self.details.algorithm()
            }
        }

        impl $crate::de::Deserialize for $name {
            fn from_slice(
                packet_version: $crate::types::Version,
                input: &[u8],
            ) -> Result<Self> {
                let (_, details) = secret_key_parser::parse(input)?;
                let (version, algorithm, created_at, expiration, public_params, secret_params) =
                    details;

                let inner =
                    PubKeyInner::new(version, algorithm, created_at, expiration, public_params)?;
                let _ = packet_version;

                Ok($name {
                    details: $public::from_inner(inner),
                    secret_params,
                })
            }
        }

        impl Serialize for $name {
            fn to_writer<W: std::io::Write>(&self, writer: &mut W) -> Result<()> {
                self.details.to_writer(writer)?;
                self.secret_params.to_writer(writer)?;
                Ok(())
            }
        }

        impl $crate::packet::packet_trait::PacketTrait for $name {
            fn packet_version(&self) -> $crate::types::Version {
                use $crate::packet::packet_trait::PacketTrait;
                self.details.packet_version()
            }

            fn tag(&self) -> Tag {
                $tag
            }
        }
    };
}

impl_secret_key!(SecretKey, Tag::SecretKey, PublicKey);
impl_secret_key!(SecretSubkey, Tag::SecretSubkey, PublicSubkey);

#[cfg(test)]
mod tests {
    use chrono::{SubsecRound, TimeZone, Utc};
    use num_bigint::traits::ModInverse;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rsa::traits::{PrivateKeyParts, PublicKeyParts};

    use super::*;
    use crate::crypto::public_key::PublicKeyAlgorithm;
    use crate::de::Deserialize;
    use crate::types::{KeyVersion, Mpi, PublicParams, SecretKeyTrait, Version};

    fn test_secret_key() -> SecretKey {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let key = rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap();

        let pub_key = PublicKey::new(
            KeyVersion::V4,
            PublicKeyAlgorithm::RSA,
            Utc.timestamp_opt(1_600_000_000, 0)
                .unwrap()
                .trunc_subsecs(0),
            None,
            PublicParams::RSA {
                n: Mpi::from_slice(&key.n().to_bytes_be()),
                e: Mpi::from_slice(&key.e().to_bytes_be()),
            },
        )
        .unwrap();

        let p = &key.primes()[0];
        let q = &key.primes()[1];
        let u = p.clone().mod_inverse(q).unwrap().to_biguint().unwrap();

        SecretKey::new(
            pub_key,
            SecretParams::Plain(PlainSecretParams::RSA {
                d: Mpi::from_slice(&key.d().to_bytes_be()),
                p: Mpi::from_slice(&p.to_bytes_be()),
                q: Mpi::from_slice(&q.to_bytes_be()),
                u: Mpi::from_slice(&u.to_bytes_be()),
            }),
        )
    }

    #[test]
    fn test_roundtrip_plain() {
        let key = test_secret_key();
        let buf = key.to_bytes().unwrap();
        let back = SecretKey::from_slice(Version::New, &buf).unwrap();
        assert_eq!(key, back);
    }

    #[test]
    fn test_lock_roundtrip_unlock() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut key = test_secret_key();
        key.lock(&mut rng, "hunter2").unwrap();
        assert!(key.is_locked());

        let buf = key.to_bytes().unwrap();
        let back = SecretKey::from_slice(Version::New, &buf).unwrap();
        assert_eq!(key, back);

        // usable with the right passphrase
        back.unlock(|| Some("hunter2".to_string()), |_| Ok(()))
            .unwrap();

        // wrong passphrase is detected by the sha1 check
        assert!(matches!(
            back.unlock(|| Some("wrong".to_string()), |_| Ok(())),
            Err(Error::PassphraseIncorrect)
        ));

        // missing passphrase is reported as such
        assert!(matches!(
            back.unlock(|| None, |_| Ok(())),
            Err(Error::PassphraseRequired)
        ));
    }
}
