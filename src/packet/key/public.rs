use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use rand::{CryptoRng, Rng};

use crate::crypto::checksum;
use crate::crypto::ecc_curve::ECCCurve;
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::{self};
use crate::errors::Result;
use crate::packet::public_key_parser;
use crate::ser::Serialize;
use crate::types::{KeyVersion, Mpi, PublicParams, Tag, Version};

/// The shared layout of public key and subkey packets.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.5.2>
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PubKeyInner {
    packet_version: Version,
    version: KeyVersion,
    algorithm: PublicKeyAlgorithm,
    created_at: DateTime<Utc>,
    expiration: Option<u16>,
    public_params: PublicParams,
}

impl PubKeyInner {
    pub fn new(
        version: KeyVersion,
        algorithm: PublicKeyAlgorithm,
        created_at: DateTime<Utc>,
        expiration: Option<u16>,
        public_params: PublicParams,
    ) -> Result<Self> {
        ensure_eq!(version, KeyVersion::V4, "only V4 keys are supported");

        Ok(PubKeyInner {
            packet_version: Default::default(),
            version,
            algorithm,
            created_at,
            expiration,
            public_params,
        })
    }

    fn body_to_writer(&self, writer: &mut impl io::Write) -> Result<()> {
        writer.write_u8(self.version.into())?;
        writer.write_u32::<BigEndian>(self.created_at.timestamp() as u32)?;
        writer.write_u8(self.algorithm.into())?;
        self.public_params.to_writer(writer)?;

        Ok(())
    }

    fn fingerprint(&self) -> Vec<u8> {
        // SHA-1 over 0x99 | len16 | body (RFC 4880 §12.2)
        let mut body = Vec::new();
        self.body_to_writer(&mut body).expect("write to vec");

        let mut buf = Vec::with_capacity(body.len() + 3);
        buf.push(0x99);
        buf.extend_from_slice(&(body.len() as u16).to_be_bytes());
        buf.extend_from_slice(&body);

        checksum::calculate_sha1(&buf)
    }

    fn verify_signature(&self, hash: HashAlgorithm, digest: &[u8], sig: &[Mpi]) -> Result<()> {
        match &self.public_params {
            PublicParams::RSA { n, e } => {
                ensure!(!sig.is_empty(), "missing rsa signature mpi");
                crypto::rsa::verify(n, e, hash, digest, &sig[0])
            }
            PublicParams::DSA { p, q, g, y } => {
                ensure_eq!(sig.len(), 2, "invalid dsa signature");
                crypto::dsa::verify(
                    &BigUint::from(p),
                    &BigUint::from(q),
                    &BigUint::from(g),
                    &BigUint::from(y),
                    digest,
                    &BigUint::from(&sig[0]),
                    &BigUint::from(&sig[1]),
                )
            }
            PublicParams::EdDSA { curve, q } => {
                ensure_eq!(curve, &ECCCurve::Ed25519, "invalid eddsa curve");
                ensure_eq!(sig.len(), 2, "invalid eddsa signature");
                crypto::eddsa::verify(q, digest, &sig[0], &sig[1])
            }
            _ => unsupported_err!("signature verification with {:?}", self.algorithm),
        }
    }

    fn encrypt<R: CryptoRng + Rng>(&self, rng: &mut R, plain: &[u8]) -> Result<Vec<Mpi>> {
        match &self.public_params {
            PublicParams::RSA { n, e } => crypto::rsa::encrypt(rng, n, e, plain),
            _ => unsupported_err!("encryption with {:?}", self.algorithm),
        }
    }
}

macro_rules! impl_public_key {
    ($name:ident, $tag:expr) => {
        #[derive(Debug, PartialEq, Eq, Clone)]
        pub struct $name(PubKeyInner);

        impl $name {
            pub fn new(
                version: $crate::types::KeyVersion,
                algorithm: $crate::crypto::public_key::PublicKeyAlgorithm,
                created_at: chrono::DateTime<chrono::Utc>,
                expiration: Option<u16>,
                public_params: $crate::types::PublicParams,
            ) -> $crate::errors::Result<Self> {
                Ok($name(PubKeyInner::new(
                    version,
                    algorithm,
                    created_at,
                    expiration,
                    public_params,
                )?))
            }

            pub(crate) fn from_inner(inner: PubKeyInner) -> Self {
                $name(inner)
            }

            pub fn version(&self) -> $crate::types::KeyVersion {
                self.0.version
            }

            pub fn created_at(&self) -> &chrono::DateTime<chrono::Utc> {
                &self.0.created_at
            }

            pub fn public_params(&self) -> &$crate::types::PublicParams {
                &self.0.public_params
            }
        }

        impl $crate::de::Deserialize for $name {
            fn from_slice(
                packet_version: $crate::types::Version,
                input: &[u8],
            ) -> $crate::errors::Result<Self> {
                let (_, details) = public_key_parser::parse(input)?;
                let (version, algorithm, created_at, expiration, public_params) = details;

                let mut inner =
                    PubKeyInner::new(version, algorithm, created_at, expiration, public_params)?;
                inner.packet_version = packet_version;

                Ok($name(inner))
            }
        }

        impl $crate::ser::Serialize for $name {
            fn to_writer<W: std::io::Write>(&self, writer: &mut W) -> $crate::errors::Result<()> {
                self.0.body_to_writer(writer)
            }
        }

        impl $crate::packet::packet_trait::PacketTrait for $name {
            fn packet_version(&self) -> $crate::types::Version {
                self.0.packet_version
            }

            fn tag(&self) -> $crate::types::Tag {
                $tag
            }
        }

        impl $crate::types::KeyTrait for $name {
            fn fingerprint(&self) -> Vec<u8> {
                self.0.fingerprint()
            }

            fn key_id(&self) -> $crate::types::KeyId {
                let fp = self.0.fingerprint();
                $crate::types::KeyId::from_slice(&fp[12..]).expect("v4 fingerprint")
            }

            fn algorithm(&self) -> $crate::crypto::public_key::PublicKeyAlgorithm {
                self.0.algorithm
            }
        }

        impl $crate::types::PublicKeyTrait for $name {
            fn verify_signature(
                &self,
                hash: $crate::crypto::hash::HashAlgorithm,
                digest: &[u8],
                sig: &[$crate::types::Mpi],
            ) -> $crate::errors::Result<()> {
                self.0.verify_signature(hash, digest, sig)
            }

            fn encrypt<R: rand::CryptoRng + rand::Rng>(
                &self,
                rng: &mut R,
                plain: &[u8],
            ) -> $crate::errors::Result<Vec<$crate::types::Mpi>> {
                self.0.encrypt(rng, plain)
            }

            fn serialize_for_hashing(
                &self,
                writer: &mut impl std::io::Write,
            ) -> $crate::errors::Result<()> {
                let mut body = Vec::new();
                self.0.body_to_writer(&mut body)?;

                writer.write_all(&[0x99])?;
                writer.write_all(&(body.len() as u16).to_be_bytes())?;
                writer.write_all(&body)?;

                Ok(())
            }
        }
    };
}

impl_public_key!(PublicKey, Tag::PublicKey);
impl_public_key!(PublicSubkey, Tag::PublicSubkey);

#[cfg(test)]
mod tests {
    use chrono::{SubsecRound, TimeZone};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rsa::traits::PublicKeyParts;

    use super::*;
    use crate::de::Deserialize;
    use crate::types::KeyTrait;

    fn test_key() -> PublicKey {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let key = rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap();

        PublicKey::new(
            KeyVersion::V4,
            PublicKeyAlgorithm::RSA,
            Utc.timestamp_opt(1_600_000_000, 0).unwrap().trunc_subsecs(0),
            None,
            PublicParams::RSA {
                n: Mpi::from_slice(&key.n().to_bytes_be()),
                e: Mpi::from_slice(&key.e().to_bytes_be()),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_fingerprint_shape() {
        let key = test_key();
        let fp = key.fingerprint();
        assert_eq!(fp.len(), 20);
        assert_eq!(key.key_id().as_ref(), &fp[12..]);
    }

    #[test]
    fn test_roundtrip() {
        let key = test_key();
        let buf = key.to_bytes().unwrap();
        let back = PublicKey::from_slice(Version::New, &buf).unwrap();
        assert_eq!(key, back);
        assert_eq!(key.fingerprint(), back.fingerprint());
    }
}
