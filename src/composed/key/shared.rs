use std::io;

use log::debug;
use smallvec::SmallVec;

use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{Error, Result};
use crate::packet::{self, write_packet, Signature, SignatureType, UserAttribute, UserId};
use crate::ser::Serialize;
use crate::types::{KeyId, PublicKeyTrait, Tag};

/// A user id plus the certifications bound to it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignedUser {
    pub id: UserId,
    pub signatures: Vec<Signature>,
}

impl SignedUser {
    pub fn new(id: UserId, signatures: Vec<Signature>) -> Self {
        SignedUser { id, signatures }
    }

    /// Verify the first self certification against the given primary key.
    pub fn verify(&self, key: &impl PublicKeyTrait) -> Result<()> {
        debug!("verify signed user {:?}", self.id);
        ensure!(!self.signatures.is_empty(), "no signature found");

        for sig in &self.signatures {
            sig.verify_certification(key, Tag::UserId, &self.id)?;
        }

        Ok(())
    }
}

impl Serialize for SignedUser {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        write_packet(writer, &self.id)?;
        for sig in &self.signatures {
            write_packet(writer, sig)?;
        }
        Ok(())
    }
}

/// A user attribute plus its certifications.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignedUserAttribute {
    pub attr: UserAttribute,
    pub signatures: Vec<Signature>,
}

impl SignedUserAttribute {
    pub fn new(attr: UserAttribute, signatures: Vec<Signature>) -> Self {
        SignedUserAttribute { attr, signatures }
    }

    pub fn verify(&self, key: &impl PublicKeyTrait) -> Result<()> {
        ensure!(!self.signatures.is_empty(), "no signature found");

        for sig in &self.signatures {
            sig.verify_certification(key, Tag::UserAttribute, &self.attr)?;
        }

        Ok(())
    }
}

impl Serialize for SignedUserAttribute {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        write_packet(writer, &self.attr)?;
        for sig in &self.signatures {
            write_packet(writer, sig)?;
        }
        Ok(())
    }
}

/// Everything bound to a primary key besides its subkeys: revocations,
/// direct key signatures and certified users.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignedKeyDetails {
    pub revocation_signatures: Vec<Signature>,
    pub direct_signatures: Vec<Signature>,
    pub users: Vec<SignedUser>,
    pub user_attributes: Vec<SignedUserAttribute>,
}

impl SignedKeyDetails {
    pub fn new(
        revocation_signatures: Vec<Signature>,
        direct_signatures: Vec<Signature>,
        users: Vec<SignedUser>,
        user_attributes: Vec<SignedUserAttribute>,
    ) -> Self {
        SignedKeyDetails {
            revocation_signatures,
            direct_signatures,
            users,
            user_attributes,
        }
    }

    /// Verify all user and attribute certifications.
    pub fn verify(&self, key: &impl PublicKeyTrait) -> Result<()> {
        for user in &self.users {
            user.verify(key)?;
        }
        for attr in &self.user_attributes {
            attr.verify(key)?;
        }

        Ok(())
    }

    /// The key holder's ranked symmetric algorithm preferences, from the
    /// self certification subpackets.
    pub fn preferred_symmetric_algorithms(&self) -> SmallVec<[SymmetricKeyAlgorithm; 8]> {
        for user in &self.users {
            for sig in &user.signatures {
                if !sig.is_certification() {
                    continue;
                }
                let prefs = sig.preferred_symmetric_algs();
                if !prefs.is_empty() {
                    return prefs.iter().copied().collect();
                }
            }
        }

        SmallVec::new()
    }

    /// The declared key expiration (seconds after creation), if any.
    pub fn key_expiration_time(&self) -> Option<u32> {
        self.users
            .iter()
            .flat_map(|u| &u.signatures)
            .find_map(|sig| sig.key_expiration_time())
    }

    pub fn is_revoked(&self) -> bool {
        self.revocation_signatures
            .iter()
            .any(|sig| sig.typ() == SignatureType::KeyRevocation)
    }
}

impl Serialize for SignedKeyDetails {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        for sig in &self.revocation_signatures {
            write_packet(writer, sig)?;
        }
        for sig in &self.direct_signatures {
            write_packet(writer, sig)?;
        }
        for user in &self.users {
            user.to_writer(writer)?;
        }
        for attr in &self.user_attributes {
            attr.to_writer(writer)?;
        }

        Ok(())
    }
}

/// A parsed key of either flavor, the element type of a keyring read.
#[derive(Debug, PartialEq, Eq, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum PublicOrSecret {
    Public(super::SignedPublicKey),
    Secret(super::SignedSecretKey),
}

impl PublicOrSecret {
    pub fn is_public(&self) -> bool {
        matches!(self, PublicOrSecret::Public(_))
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, PublicOrSecret::Secret(_))
    }

    /// Whether the primary or any subkey carries the given id.
    pub fn has_key_id(&self, id: &KeyId) -> bool {
        match self {
            PublicOrSecret::Public(k) => k.has_key_id(id),
            PublicOrSecret::Secret(k) => k.has_key_id(id),
        }
    }

    pub fn verify(&self) -> Result<()> {
        match self {
            PublicOrSecret::Public(k) => k.verify(),
            PublicOrSecret::Secret(k) => k.verify(),
        }
    }

    pub fn into_secret(self) -> Result<super::SignedSecretKey> {
        match self {
            PublicOrSecret::Secret(k) => Ok(k),
            PublicOrSecret::Public(_) => Err(Error::Message {
                message: "not a secret key".to_string(),
            }),
        }
    }

    pub fn into_public(self) -> super::SignedPublicKey {
        match self {
            PublicOrSecret::Public(k) => k,
            PublicOrSecret::Secret(k) => k.public_key(),
        }
    }

    pub fn to_armored_string(&self) -> Result<String> {
        match self {
            PublicOrSecret::Public(k) => k.to_armored_string(),
            PublicOrSecret::Secret(k) => k.to_armored_string(),
        }
    }
}

impl Serialize for PublicOrSecret {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            PublicOrSecret::Public(k) => k.to_writer(writer),
            PublicOrSecret::Secret(k) => k.to_writer(writer),
        }
    }
}

/// Find the key holding `id` (primary or any subkey) in a keyring.
pub fn find_key<'a>(id: &KeyId, keys: &'a [PublicOrSecret]) -> Option<&'a PublicOrSecret> {
    keys.iter().find(|k| k.has_key_id(id))
}

impl crate::composed::Deserializable for PublicOrSecret {
    fn from_packets(
        packets: &mut dyn Iterator<Item = Result<packet::Packet>>,
    ) -> Result<Vec<Self>> {
        super::key_parser::parse_keyring(packets)
    }

    fn matches_block_type(typ: crate::armor::BlockType) -> bool {
        matches!(
            typ,
            crate::armor::BlockType::PublicKey | crate::armor::BlockType::PrivateKey
        )
    }
}
