use std::io;

use chrono::{DateTime, Duration, Utc};
use log::warn;
use rand::{CryptoRng, Rng};

use crate::armor::{self, BlockType};
use crate::composed::key::shared::SignedKeyDetails;
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::Result;
use crate::packet::{self, write_packet, KeyFlags, Signature};
use crate::ser::Serialize;
use crate::types::{KeyId, KeyTrait, Mpi, PublicKeyTrait};

/// A public key as transferred: primary key, details, bound subkeys.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-11.1>
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignedPublicKey {
    pub primary_key: packet::PublicKey,
    pub details: SignedKeyDetails,
    pub public_subkeys: Vec<SignedPublicSubKey>,
}

/// A public subkey with its binding signatures.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignedPublicSubKey {
    pub key: packet::PublicSubkey,
    pub signatures: Vec<Signature>,
}

/// The key packet actually used when wrapping a session key to a
/// recipient: a bound subkey, or the primary itself.
#[derive(Debug, Clone, Copy)]
pub enum EncryptionKeyRef<'a> {
    Primary(&'a packet::PublicKey),
    Subkey(&'a packet::PublicSubkey),
}

impl SignedPublicKey {
    pub fn new(
        primary_key: packet::PublicKey,
        details: SignedKeyDetails,
        mut public_subkeys: Vec<SignedPublicSubKey>,
    ) -> Self {
        public_subkeys.retain(|key| {
            if key.signatures.is_empty() {
                warn!("ignoring unsigned subkey {:?}", key.key);
                false
            } else {
                true
            }
        });

        SignedPublicKey {
            primary_key,
            details,
            public_subkeys,
        }
    }

    /// Verify self certifications and subkey bindings.
    pub fn verify(&self) -> Result<()> {
        self.details.verify(&self.primary_key)?;
        for subkey in &self.public_subkeys {
            subkey.verify(&self.primary_key)?;
        }

        Ok(())
    }

    pub fn has_key_id(&self, id: &KeyId) -> bool {
        self.primary_key.key_id() == *id
            || self.public_subkeys.iter().any(|k| k.key.key_id() == *id)
    }

    /// Locate the key packet to encrypt to: the first subkey flagged for
    /// encryption whose binding self signature verifies, the primary as a
    /// last resort when it can encrypt itself.
    pub fn encryption_key(&self) -> Option<EncryptionKeyRef<'_>> {
        for subkey in &self.public_subkeys {
            if !subkey.key.is_encryption_key() || !subkey.key_flags().encrypt() {
                continue;
            }
            match subkey.verify(&self.primary_key) {
                Ok(()) => return Some(EncryptionKeyRef::Subkey(&subkey.key)),
                Err(err) => warn!("skipping badly bound subkey: {:?}", err),
            }
        }

        if self.primary_key.is_encryption_key() {
            return Some(EncryptionKeyRef::Primary(&self.primary_key));
        }

        None
    }

    /// The key holder's symmetric algorithm preferences (subpacket 11 of a
    /// self certification), in rank order.
    pub fn preferred_symmetric_algorithms(
        &self,
    ) -> smallvec::SmallVec<[crate::crypto::sym::SymmetricKeyAlgorithm; 8]> {
        self.details.preferred_symmetric_algorithms()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let expiration = self.details.key_expiration_time()?;
        Some(*self.primary_key.created_at() + Duration::seconds(i64::from(expiration)))
    }

    pub fn to_armored_writer(&self, writer: &mut impl io::Write) -> Result<()> {
        armor::write(self, BlockType::PublicKey, writer, None)
    }

    pub fn to_armored_string(&self) -> Result<String> {
        armor::write_string(self, BlockType::PublicKey)
    }
}

impl Serialize for SignedPublicKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        write_packet(writer, &self.primary_key)?;
        self.details.to_writer(writer)?;
        for subkey in &self.public_subkeys {
            subkey.to_writer(writer)?;
        }

        Ok(())
    }
}

impl KeyTrait for SignedPublicKey {
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

impl PublicKeyTrait for SignedPublicKey {
    fn verify_signature(&self, hash: HashAlgorithm, digest: &[u8], sig: &[Mpi]) -> Result<()> {
        self.primary_key.verify_signature(hash, digest, sig)
    }

    fn encrypt<R: CryptoRng + Rng>(&self, rng: &mut R, plain: &[u8]) -> Result<Vec<Mpi>> {
        self.primary_key.encrypt(rng, plain)
    }

    fn serialize_for_hashing(&self, writer: &mut impl io::Write) -> Result<()> {
        self.primary_key.serialize_for_hashing(writer)
    }
}

impl SignedPublicSubKey {
    pub fn new(key: packet::PublicSubkey, mut signatures: Vec<Signature>) -> Self {
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

        SignedPublicSubKey { key, signatures }
    }

    /// Verify the binding made by the primary key.
    pub fn verify(&self, primary: &impl PublicKeyTrait) -> Result<()> {
        ensure!(!self.signatures.is_empty(), "no signature found");

        for sig in &self.signatures {
            sig.verify_key_binding(primary, &self.key)?;
        }

        Ok(())
    }

    /// Capability flags from the binding signature.
    pub fn key_flags(&self) -> KeyFlags {
        self.signatures
            .first()
            .map(|sig| sig.key_flags())
            .unwrap_or_default()
    }
}

impl Serialize for SignedPublicSubKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        write_packet(writer, &self.key)?;
        for sig in &self.signatures {
            write_packet(writer, sig)?;
        }

        Ok(())
    }
}

impl KeyTrait for EncryptionKeyRef<'_> {
    fn fingerprint(&self) -> Vec<u8> {
        match self {
            EncryptionKeyRef::Primary(k) => k.fingerprint(),
            EncryptionKeyRef::Subkey(k) => k.fingerprint(),
        }
    }

    fn key_id(&self) -> KeyId {
        match self {
            EncryptionKeyRef::Primary(k) => k.key_id(),
            EncryptionKeyRef::Subkey(k) => k.key_id(),
        }
    }

    fn algorithm(&self) -> PublicKeyAlgorithm {
        match self {
            EncryptionKeyRef::Primary(k) => k.algorithm(),
            EncryptionKeyRef::Subkey(k) => k.algorithm(),
        }
    }
}

impl PublicKeyTrait for EncryptionKeyRef<'_> {
    fn verify_signature(&self, hash: HashAlgorithm, digest: &[u8], sig: &[Mpi]) -> Result<()> {
        match self {
            EncryptionKeyRef::Primary(k) => k.verify_signature(hash, digest, sig),
            EncryptionKeyRef::Subkey(k) => k.verify_signature(hash, digest, sig),
        }
    }

    fn encrypt<R: CryptoRng + Rng>(&self, rng: &mut R, plain: &[u8]) -> Result<Vec<Mpi>> {
        match self {
            EncryptionKeyRef::Primary(k) => k.encrypt(rng, plain),
            EncryptionKeyRef::Subkey(k) => k.encrypt(rng, plain),
        }
    }

    fn serialize_for_hashing(&self, writer: &mut impl io::Write) -> Result<()> {
        match self {
            EncryptionKeyRef::Primary(k) => k.serialize_for_hashing(writer),
            EncryptionKeyRef::Subkey(k) => k.serialize_for_hashing(writer),
        }
    }
}
