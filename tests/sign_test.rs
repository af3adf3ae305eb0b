mod common;

use common::alice;

use opgp::api;
use opgp::composed::{Deserializable, Message, PublicOrSecret, StandaloneSignature};
use opgp::crypto::hash::HashAlgorithm;
use opgp::errors::Error;
use opgp::ser::Serialize;

fn no_pw() -> Option<String> {
    None
}

#[test]
fn test_detached_sign_verify() {
    let _ = pretty_env_logger::try_init();

    let alice = alice();
    let keys = vec![PublicOrSecret::Public(alice.public_key())];

    // one mebibyte of zeros, per the classic large input check
    let zeros = vec![0u8; 1024 * 1024];

    let sig = api::sign(&zeros, alice, no_pw, HashAlgorithm::SHA2_256, true).unwrap();
    assert!(api::verify(&zeros, Some(&sig), &keys, no_pw).unwrap());

    // one flipped byte and the signature no longer matches
    let mut mutated = zeros.clone();
    mutated[512 * 1024] = 1;
    assert!(!api::verify(&mutated, Some(&sig), &keys, no_pw).unwrap());
}

#[test]
fn test_detached_signature_armor_roundtrip() {
    let alice = alice();

    let sig = api::sign(b"payload", alice, no_pw, HashAlgorithm::SHA2_512, true).unwrap();
    let parsed = StandaloneSignature::from_bytes(&sig).unwrap();

    let armored = parsed.to_armored_string().unwrap();
    assert!(armored.starts_with("-----BEGIN PGP SIGNATURE-----"));

    let back = StandaloneSignature::from_armor_single(armored.as_bytes()).unwrap();
    assert_eq!(parsed, back);

    // armored detached signatures verify too
    let keys = vec![PublicOrSecret::Public(alice.public_key())];
    assert!(api::verify(b"payload", Some(armored.as_bytes()), &keys, no_pw).unwrap());
}

#[test]
fn test_embedded_sign_verify() {
    let alice = alice();
    let keys = vec![PublicOrSecret::Public(alice.public_key())];

    let signed = api::sign(b"signed content", alice, no_pw, HashAlgorithm::SHA2_512, false)
        .unwrap();

    // the one pass bracket: OPS | literal | signature
    let message = Message::from_bytes(&signed).unwrap();
    let Message::Signed {
        one_pass_signature, ..
    } = &message
    else {
        panic!("expected signed message");
    };
    assert!(one_pass_signature.is_some());

    // the bracket survives an emit/parse cycle byte for byte
    let re_emitted = message.to_bytes().unwrap();
    assert_eq!(signed, re_emitted);

    assert!(api::verify(&signed, None, &keys, no_pw).unwrap());
}

#[test]
fn test_encrypt_sign_roundtrip() {
    let alice = alice();
    let pub_key = alice.public_key();
    let keys = vec![PublicOrSecret::Secret(alice.clone())];

    let ciphertext = api::encrypt(
        b"signed and sealed",
        &[&pub_key],
        Some(alice),
        no_pw,
        true,
    )
    .unwrap();

    // decrypt with signature verification against the same key set
    let plaintext = api::decrypt(&ciphertext, &keys, no_pw, true).unwrap();
    assert_eq!(plaintext, b"signed and sealed");

    // verify as a standalone operation, decrypting on the way
    assert!(api::verify(&ciphertext, None, &keys, no_pw).unwrap());
}

#[test]
fn test_verify_unsigned_is_not_signed() {
    let alice = alice();
    let keys = vec![PublicOrSecret::Secret(alice.clone())];

    let ciphertext =
        api::encrypt(b"no signature here", &[&alice.public_key()], None, no_pw, false).unwrap();

    let err = api::decrypt(&ciphertext, &keys, no_pw, true).unwrap_err();
    assert!(matches!(err, Error::NotSigned), "{err:?}");
}

#[test]
fn test_verify_with_wrong_key() {
    let alice = alice();
    let stranger = common::bob();

    let signed = api::sign(b"from alice", alice, no_pw, HashAlgorithm::SHA2_512, false)
        .unwrap();

    // the stranger's keyring does not hold the issuer
    let keys = vec![PublicOrSecret::Public(stranger.public_key())];
    let err = api::verify(&signed, None, &keys, no_pw).unwrap_err();
    assert!(matches!(err, Error::InvalidSignature), "{err:?}");
}

#[test]
fn test_text_mode_normalization() {
    let alice = alice();

    // a text literal signs the CRLF normalized stream, so the same content
    // with different line endings carries the same signature hash input
    let message = Message::new_literal("", "line one\nline two\n");
    let signed = message
        .sign(alice, no_pw, HashAlgorithm::SHA2_256)
        .unwrap();
    signed.verify(&alice.public_key().primary_key).unwrap();

    let bytes = signed.to_bytes().unwrap();
    let parsed = Message::from_bytes(&bytes).unwrap();
    parsed.verify(&alice.public_key().primary_key).unwrap();
}
