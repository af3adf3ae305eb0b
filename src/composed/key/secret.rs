use std::io;

use log::warn;

use crate::armor::{self, BlockType};
use crate::composed::key::public::{SignedPublicKey, SignedPublicSubKey};
use crate::composed::key::shared::SignedKeyDetails;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::Result;
use crate::packet::{self, write_packet, KeyFlags, Signature};
use crate::ser::Serialize;
use crate::types::{KeyId, KeyTrait, SecretKeyRepr, SecretKeyTrait};

/// A secret key as transferred: primary secret key, details, subkeys of
/// both flavors.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-11.2>
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignedSecretKey {
    pub primary_key: packet::SecretKey,
    pub details: SignedKeyDetails,
    pub public_subkeys: Vec<SignedPublicSubKey>,
    pub secret_subkeys: Vec<SignedSecretSubKey>,
}

/// A secret subkey with its binding signatures.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignedSecretSubKey {
    pub key: packet::SecretSubkey,
    pub signatures: Vec<Signature>,
}

/// The secret key packet selected to service one PKESK: a subkey or the
/// primary.
#[derive(Debug, Clone, Copy)]
pub enum DecryptionKeyRef<'a> {
    Primary(&'a packet::SecretKey),
    Subkey(&'a packet::SecretSubkey),
}

impl SignedSecretKey {
    pub fn new(
        primary_key: packet::SecretKey,
        details: SignedKeyDetails,
        public_subkeys: Vec<SignedPublicSubKey>,
        mut secret_subkeys: Vec<SignedSecretSubKey>,
    ) -> Self {
        secret_subkeys.retain(|key| {
            if key.signatures.is_empty() {
                warn!("ignoring unsigned subkey {:?}", key.key);
                false
            } else {
                true
            }
        });

        SignedSecretKey {
            primary_key,
            details,
            public_subkeys,
            secret_subkeys,
        }
    }

    /// Verify self certifications and subkey bindings.
    pub fn verify(&self) -> Result<()> {
        let pub_key = self.primary_key.public_key();
        self.details.verify(&pub_key)?;
        for subkey in &self.public_subkeys {
            subkey.verify(&pub_key)?;
        }
        for subkey in &self.secret_subkeys {
            subkey.verify(&pub_key)?;
        }

        Ok(())
    }

    pub fn has_key_id(&self, id: &KeyId) -> bool {
        self.primary_key.key_id() == *id
            || self.secret_subkeys.iter().any(|k| k.key.key_id() == *id)
            || self.public_subkeys.iter().any(|k| k.key.key_id() == *id)
    }

    /// The secret key packet addressed by a PKESK: the matching encryption
    /// capable subkey, the primary when it matches and can decrypt, or any
    /// encryption capable secret on a wildcard id.
    pub fn decryption_key(&self, id: &KeyId) -> Option<DecryptionKeyRef<'_>> {
        if id.is_wildcard() {
            for subkey in &self.secret_subkeys {
                if subkey.key.is_encryption_key() {
                    return Some(DecryptionKeyRef::Subkey(&subkey.key));
                }
            }
            return self
                .primary_key
                .is_encryption_key()
                .then_some(DecryptionKeyRef::Primary(&self.primary_key));
        }

        for subkey in &self.secret_subkeys {
            if subkey.key.key_id() == *id && subkey.key.is_encryption_key() {
                return Some(DecryptionKeyRef::Subkey(&subkey.key));
            }
        }

        if self.primary_key.key_id() == *id && self.primary_key.is_encryption_key() {
            return Some(DecryptionKeyRef::Primary(&self.primary_key));
        }

        None
    }

    /// The public half of the whole key.
    pub fn public_key(&self) -> SignedPublicKey {
        let mut subkeys: Vec<SignedPublicSubKey> = self.public_subkeys.clone();
        subkeys.extend(self.secret_subkeys.iter().map(|sub| SignedPublicSubKey {
            key: sub.key.public_key(),
            signatures: sub.signatures.clone(),
        }));

        SignedPublicKey::new(
            self.primary_key.public_key(),
            self.details.clone(),
            subkeys,
        )
    }

    pub fn to_armored_writer(&self, writer: &mut impl io::Write) -> Result<()> {
        armor::write(self, BlockType::PrivateKey, writer, None)
    }

    pub fn to_armored_string(&self) -> Result<String> {
        armor::write_string(self, BlockType::PrivateKey)
    }
}

impl Serialize for SignedSecretKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        write_packet(writer, &self.primary_key)?;
        self.details.to_writer(writer)?;
        for subkey in &self.public_subkeys {
            subkey.to_writer(writer)?;
        }
        for subkey in &self.secret_subkeys {
            subkey.to_writer(writer)?;
        }

        Ok(())
    }
}

impl KeyTrait for SignedSecretKey {
    fn fingerprint(&self) -> Vec<u8> {
        self.primary_key.fingerprint()
    }

    fn key_id(&self) -> KeyId {
        self.primary_key.key_id()
    }

    fn algorithm(&self) -> PublicKeyAlgorithm {
        self.primary_key.algorithm()
    }
}

impl SecretKeyTrait for SignedSecretKey {
    type PublicKey = packet::PublicKey;

    fn unlock<F, G, T>(&self, pw: F, work: G) -> Result<T>
    where
        F: FnOnce() -> Option<String>,
        G: FnOnce(&SecretKeyRepr) -> Result<T>,
    {
        self.primary_key.unlock(pw, work)
    }

    fn public_key(&self) -> Self::PublicKey {
        self.primary_key.public_key()
    }
}

impl SignedSecretSubKey {
    pub fn new(key: packet::SecretSubkey, mut signatures: Vec<Signature>) -> Self {
        signatures.retain(|sig| {
            if sig.typ() != crate::packet::SignatureType::SubkeyBinding
                && sig.typ() != crate::packet::SignatureType::SubkeyRevocation
            {
                warn!("ignoring unexpected signature {:?} on subkey", sig.typ());
                false
            } else {
                true
            }
        });

        SignedSecretSubKey { key, signatures }
    }

    pub fn verify(&self, primary: &impl crate::types::PublicKeyTrait) -> Result<()> {
        ensure!(!self.signatures.is_empty(), "no signature found");

        for sig in &self.signatures {
            sig.verify_key_binding(primary, &self.key.public_key())?;
        }

        Ok(())
    }

    pub fn key_flags(&self) -> KeyFlags {
        self.signatures
            .first()
            .map(|sig| sig.key_flags())
            .unwrap_or_default()
    }
}

impl Serialize for SignedSecretSubKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        write_packet(writer, &self.key)?;
        for sig in &self.signatures {
            write_packet(writer, sig)?;
        }

        Ok(())
    }
}

impl KeyTrait for DecryptionKeyRef<'_> {
    fn fingerprint(&self) -> Vec<u8> {
        match self {
            DecryptionKeyRef::Primary(k) => k.fingerprint(),
            DecryptionKeyRef::Subkey(k) => k.fingerprint(),
        }
    }

    fn key_id(&self) -> KeyId {
        match self {
            DecryptionKeyRef::Primary(k) => k.key_id(),
            DecryptionKeyRef::Subkey(k) => k.key_id(),
        }
    }

    fn algorithm(&self) -> PublicKeyAlgorithm {
        match self {
            DecryptionKeyRef::Primary(k) => k.algorithm(),
            DecryptionKeyRef::Subkey(k) => k.algorithm(),
        }
    }
}

impl DecryptionKeyRef<'_> {
    pub fn is_locked(&self) -> bool {
        match self {
            DecryptionKeyRef::Primary(k) => k.is_locked(),
            DecryptionKeyRef::Subkey(k) => k.is_locked(),
        }
    }

    /// Run `work` with the unlocked secret material.
    pub fn unlock<F, G, T>(&self, pw: F, work: G) -> Result<T>
    where
        F: FnOnce() -> Option<String>,
        G: FnOnce(&SecretKeyRepr) -> Result<T>,
    {
        match self {
            DecryptionKeyRef::Primary(k) => k.unlock(pw, work),
            DecryptionKeyRef::Subkey(k) => k.unlock(pw, work),
        }
    }
}
