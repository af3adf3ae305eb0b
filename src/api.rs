//! The operations consumed by CLI and binding layers: keyring reading and
//! the encrypt / decrypt / sign / verify pipeline over raw bytes.

use std::path::{Path, PathBuf};

use log::warn;

use crate::armor;
use crate::composed::{
    Deserializable, Message, PublicOrSecret, SignedPublicKey, SignedSecretKey,
    StandaloneSignature,
};
use crate::crypto::hash::HashAlgorithm;
use crate::errors::{Error, Result};
use crate::packet::{SignatureConfig, SignatureType};
use crate::ser::Serialize;

/// Read a keyring from armored or binary input. Malformed or empty input
/// yields an empty list, never an error.
pub fn read_keys(input: &[u8]) -> Vec<PublicOrSecret> {
    if input.is_empty() {
        return Vec::new();
    }

    match PublicOrSecret::from_auto(input) {
        Ok(keys) => keys,
        Err(err) => {
            warn!("unreadable keyring: {:?}", err);
            Vec::new()
        }
    }
}

/// Read a keyring from a file. A leading `~` expands to the home
/// directory; directories and unreadable files yield an empty list.
pub fn read_keys_from_file(path: impl AsRef<Path>) -> Vec<PublicOrSecret> {
    let path = expand_tilde(path.as_ref());

    match std::fs::metadata(&path) {
        Ok(meta) if meta.is_dir() => {
            warn!("refusing to read keys from directory {:?}", path);
            return Vec::new();
        }
        Err(err) => {
            warn!("cannot stat {:?}: {}", path, err);
            return Vec::new();
        }
        Ok(_) => {}
    }

    match std::fs::read(&path) {
        Ok(bytes) => read_keys(&bytes),
        Err(err) => {
            warn!("cannot read {:?}: {}", path, err);
            Vec::new()
        }
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}

/// Encrypt (and optionally sign) `data` to every recipient in `keys`.
///
/// Unsigned content is wrapped in ZLIB compression; signed content carries
/// the one-pass signature bracket instead. The envelope is always the
/// integrity protected SEIPD form.
pub fn encrypt<F>(
    data: &[u8],
    keys: &[&SignedPublicKey],
    sign_key: Option<&SignedSecretKey>,
    key_pw: F,
    armored: bool,
) -> Result<Vec<u8>>
where
    F: Fn() -> Option<String>,
{
    let literal = Message::new_literal_bytes(b"", data);

    let inner = match sign_key {
        Some(key) => literal.sign(key, &key_pw, HashAlgorithm::SHA2_512)?,
        None => literal.compress(Default::default())?,
    };

    let encrypted = inner.encrypt_to_keys(&mut rand::thread_rng(), keys)?;

    if armored {
        encrypted.to_armored_bytes()
    } else {
        encrypted.to_bytes()
    }
}

/// Decrypt a message with any key from `keys`, optionally verifying an
/// embedded signature against the same key set.
pub fn decrypt<F>(
    data: &[u8],
    keys: &[PublicOrSecret],
    key_pw: F,
    verify_signature: bool,
) -> Result<Vec<u8>>
where
    F: Fn() -> Option<String>,
{
    let secrets: Vec<&SignedSecretKey> = keys
        .iter()
        .filter_map(|k| match k {
            PublicOrSecret::Secret(k) => Some(k),
            PublicOrSecret::Public(_) => None,
        })
        .collect();

    let messages = if armor::is_armored(data) {
        Message::from_armor_many(data)?
    } else {
        Message::from_bytes_many(data)?
    };

    // multiple blocks are legal; the first decryptable one wins
    let mut last_err = None;
    for message in &messages {
        let opened = if message.is_encrypted() {
            message.decrypt(&key_pw, &secrets)
        } else {
            Ok(message.clone())
        };

        match opened {
            Ok(message) => {
                if verify_signature && !verify_message(&message, keys)? {
                    return Err(Error::InvalidSignature);
                }

                return message.get_content()?.ok_or_else(|| Error::InvalidMessage {
                    message: "no literal content".to_string(),
                });
            }
            Err(err) => last_err = Some(err),
        }
    }

    Err(last_err.unwrap_or(Error::InvalidMessage {
        message: "no usable content".to_string(),
    }))
}

/// Sign `data`: a lone signature packet when detached, the one-pass
/// bracket otherwise. V4 signatures; SHA-512 unless the caller picks
/// another hash.
pub fn sign<F>(
    data: &[u8],
    key: &SignedSecretKey,
    key_pw: F,
    hash_alg: HashAlgorithm,
    detached: bool,
) -> Result<Vec<u8>>
where
    F: Fn() -> Option<String>,
{
    if detached {
        let config = SignatureConfig::v4(SignatureType::Binary, hash_alg, &key.primary_key);
        let signature = config.sign(&key.primary_key, &key_pw, data)?;

        StandaloneSignature::new(signature).to_bytes()
    } else {
        Message::new_literal_bytes(b"", data)
            .sign(key, &key_pw, hash_alg)?
            .to_bytes()
    }
}

/// Verify `data`. With a detached signature, `data` is the raw signed
/// document; otherwise `data` is a (possibly encrypted) message whose
/// embedded signature is checked.
///
/// Returns `Ok(false)` for a signature that does not match, errors for
/// structural problems: `NotSigned` when there is no signature at all,
/// `InvalidSignature` when the issuing key is not in `keys`.
pub fn verify<F>(
    data: &[u8],
    detached_sig: Option<&[u8]>,
    keys: &[PublicOrSecret],
    key_pw: F,
) -> Result<bool>
where
    F: Fn() -> Option<String>,
{
    match detached_sig {
        Some(sig) => {
            let signature = if armor::is_armored(sig) {
                StandaloneSignature::from_armor_single(sig)?
            } else {
                StandaloneSignature::from_bytes(sig)?
            };

            let candidates: Vec<SignedPublicKey> =
                candidate_keys(&signature.signature, keys).collect();
            if candidates.is_empty() {
                // the issuing key is not part of the key set
                return Err(Error::InvalidSignature);
            }

            for key in &candidates {
                match signature.verify(&key.primary_key, data) {
                    Ok(()) => return Ok(true),
                    Err(Error::InvalidSignature) => continue,
                    Err(err) => return Err(err),
                }
            }

            Ok(false)
        }
        None => {
            let message = if armor::is_armored(data) {
                Message::from_armor_single(data)?
            } else {
                Message::from_bytes(data)?
            };

            let message = if message.is_encrypted() {
                let secrets: Vec<&SignedSecretKey> = keys
                    .iter()
                    .filter_map(|k| match k {
                        PublicOrSecret::Secret(k) => Some(k),
                        PublicOrSecret::Public(_) => None,
                    })
                    .collect();
                message.decrypt(&key_pw, &secrets)?
            } else {
                message
            };

            verify_message(&message, keys)
        }
    }
}

/// The public keys worth trying for a signature: those matching the issuer
/// subpacket, or every key when the signature does not name one.
fn candidate_keys<'a>(
    signature: &crate::packet::Signature,
    keys: &'a [PublicOrSecret],
) -> impl Iterator<Item = SignedPublicKey> + 'a {
    let issuer = signature.issuer();

    keys.iter()
        .filter(move |key| match issuer {
            Some(id) => key.has_key_id(&id),
            None => true,
        })
        .map(|key| key.clone().into_public())
}

/// Verify the embedded signature of a decrypted message against the key
/// set. `Ok(false)` means the signature did not match; a missing signature
/// or a missing issuer key is an error.
fn verify_message(message: &Message, keys: &[PublicOrSecret]) -> Result<bool> {
    let signature = message.signature().ok_or(Error::NotSigned)?;

    let candidates: Vec<SignedPublicKey> = candidate_keys(signature, keys).collect();
    if candidates.is_empty() {
        // the issuing key is not in the key set
        return Err(Error::InvalidSignature);
    }

    for key in &candidates {
        match message.verify(&key.primary_key) {
            Ok(()) => return Ok(true),
            Err(Error::InvalidSignature) => continue,
            Err(err) => return Err(err),
        }
    }

    Ok(false)
}
