//! Shared test fixtures: programmatically built RSA keys with a signing
//! primary and an encryption subkey, certified the way GnuPG lays keys out.

use std::sync::OnceLock;

use chrono::{SubsecRound, TimeZone, Utc};
use num_bigint::traits::ModInverse;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use smallvec::SmallVec;

use opgp::composed::{
    SignedKeyDetails, SignedSecretKey, SignedSecretSubKey, SignedUser,
};
use opgp::crypto::hash::HashAlgorithm;
use opgp::crypto::public_key::PublicKeyAlgorithm;
use opgp::crypto::sym::SymmetricKeyAlgorithm;
use opgp::packet::{
    self, SignatureConfig, SignatureType, Subpacket, SubpacketData,
};
use opgp::types::{
    KeyVersion, Mpi, PlainSecretParams, PublicParams, SecretParams, Tag, Version,
};

fn rsa_key_packets(
    rng: &mut ChaCha8Rng,
    bits: usize,
) -> (PublicParams, PlainSecretParams) {
    let key = rsa::RsaPrivateKey::new(rng, bits).expect("rsa keygen");

    let p = &key.primes()[0];
    let q = &key.primes()[1];
    let u = p
        .clone()
        .mod_inverse(q)
        .expect("valid prime")
        .to_biguint()
        .expect("positive");

    (
        PublicParams::RSA {
            n: Mpi::from_slice(&key.n().to_bytes_be()),
            e: Mpi::from_slice(&key.e().to_bytes_be()),
        },
        PlainSecretParams::RSA {
            d: Mpi::from_slice(&key.d().to_bytes_be()),
            p: Mpi::from_slice(&p.to_bytes_be()),
            q: Mpi::from_slice(&q.to_bytes_be()),
            u: Mpi::from_slice(&u.to_bytes_be()),
        },
    )
}

/// Build a complete transferable secret key: certified user id with
/// algorithm preferences, and an encryption subkey bound by the primary.
pub fn build_secret_key(seed: u64, user: &str) -> SignedSecretKey {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let created = Utc
        .timestamp_opt(1_700_000_000, 0)
        .unwrap()
        .trunc_subsecs(0);

    let (primary_pub_params, primary_secret) = rsa_key_packets(&mut rng, 2048);
    let primary_pub = packet::PublicKey::new(
        KeyVersion::V4,
        PublicKeyAlgorithm::RSA,
        created,
        None,
        primary_pub_params,
    )
    .unwrap();
    let primary = packet::SecretKey::new(primary_pub, SecretParams::Plain(primary_secret));

    let (sub_pub_params, sub_secret) = rsa_key_packets(&mut rng, 2048);
    let sub_pub = packet::PublicSubkey::new(
        KeyVersion::V4,
        PublicKeyAlgorithm::RSA,
        created,
        None,
        sub_pub_params,
    )
    .unwrap();
    let subkey = packet::SecretSubkey::new(sub_pub, SecretParams::Plain(sub_secret));

    // positive certification: certify+sign flags, cipher preferences
    let user_id = packet::UserId::from_str(Version::New, user);
    let mut cert_config =
        SignatureConfig::v4(SignatureType::CertPositive, HashAlgorithm::SHA2_256, &primary);
    cert_config
        .hashed_subpackets
        .push(Subpacket::regular(SubpacketData::KeyFlags(
            SmallVec::from_slice(&[0x03]),
        )));
    cert_config
        .hashed_subpackets
        .push(Subpacket::regular(SubpacketData::PreferredSymmetricAlgorithms(
            [
                SymmetricKeyAlgorithm::AES256,
                SymmetricKeyAlgorithm::AES192,
                SymmetricKeyAlgorithm::AES128,
            ]
            .into_iter()
            .collect(),
        )));
    let cert = cert_config
        .sign_certification(&primary, || None, Tag::UserId, &user_id)
        .unwrap();

    // subkey binding: encryption flags
    let mut binding_config =
        SignatureConfig::v4(SignatureType::SubkeyBinding, HashAlgorithm::SHA2_256, &primary);
    binding_config
        .hashed_subpackets
        .push(Subpacket::regular(SubpacketData::KeyFlags(
            SmallVec::from_slice(&[0x0C]),
        )));
    let binding = binding_config
        .sign_key_binding(&primary, || None, &subkey.public_key())
        .unwrap();

    let details = SignedKeyDetails::new(
        Vec::new(),
        Vec::new(),
        vec![SignedUser::new(user_id, vec![cert])],
        Vec::new(),
    );

    SignedSecretKey::new(
        primary,
        details,
        Vec::new(),
        vec![SignedSecretSubKey::new(subkey, vec![binding])],
    )
}

/// The key most tests share; generating RSA material is slow enough to be
/// worth caching per test binary.
pub fn alice() -> &'static SignedSecretKey {
    static KEY: OnceLock<SignedSecretKey> = OnceLock::new();
    KEY.get_or_init(|| build_secret_key(1, "Alice <alice@example.org>"))
}

pub fn bob() -> &'static SignedSecretKey {
    static KEY: OnceLock<SignedSecretKey> = OnceLock::new();
    KEY.get_or_init(|| build_secret_key(2, "Bob <bob@example.org>"))
}
