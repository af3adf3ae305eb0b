use byteorder::{BigEndian, ByteOrder};
use chrono::{DateTime, SubsecRound, Utc};
use smallvec::SmallVec;

use crate::crypto::hash::{HashAlgorithm, Hasher};
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::{Error, Result};
use crate::packet::packet_trait::PacketTrait;
use crate::packet::signature::subpacket::{Subpacket, SubpacketData};
use crate::ser::Serialize;
use crate::types::{KeyId, Mpi, PublicKeyTrait, SecretKeyTrait, Tag, Version};
use crate::util::normalize_crlf;

/// Signature packet versions. Only V4 is produced and verified.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum SignatureVersion {
    V2 = 2,
    V3 = 3,
    V4 = 4,
}

/// What a signature covers.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.2.1>
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum SignatureType {
    /// Signature over a binary document.
    Binary = 0x00,
    /// Signature over a canonical text document (CRLF line endings).
    Text = 0x01,
    Standalone = 0x02,
    CertGeneric = 0x10,
    CertPersona = 0x11,
    CertCasual = 0x12,
    CertPositive = 0x13,
    SubkeyBinding = 0x18,
    KeyBinding = 0x19,
    Key = 0x1F,
    KeyRevocation = 0x20,
    SubkeyRevocation = 0x28,
    CertRevocation = 0x30,
    Timestamp = 0x40,
    ThirdParty = 0x50,
}

impl TryFrom<u8> for SignatureType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0x00 => SignatureType::Binary,
            0x01 => SignatureType::Text,
            0x02 => SignatureType::Standalone,
            0x10 => SignatureType::CertGeneric,
            0x11 => SignatureType::CertPersona,
            0x12 => SignatureType::CertCasual,
            0x13 => SignatureType::CertPositive,
            0x18 => SignatureType::SubkeyBinding,
            0x19 => SignatureType::KeyBinding,
            0x1F => SignatureType::Key,
            0x20 => SignatureType::KeyRevocation,
            0x28 => SignatureType::SubkeyRevocation,
            0x30 => SignatureType::CertRevocation,
            0x40 => SignatureType::Timestamp,
            0x50 => SignatureType::ThirdParty,
            _ => {
                return Err(Error::InvalidMessage {
                    message: format!("invalid signature type 0x{value:02x}"),
                })
            }
        })
    }
}

impl From<SignatureType> for u8 {
    fn from(value: SignatureType) -> u8 {
        value as u8
    }
}

/// Key capability flags from subpacket 27.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.2.3.21>
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct KeyFlags(SmallVec<[u8; 1]>);

impl KeyFlags {
    pub fn from_bits(bits: u8) -> Self {
        KeyFlags(SmallVec::from_slice(&[bits]))
    }

    fn bits(&self) -> u8 {
        self.0.first().copied().unwrap_or(0)
    }

    pub fn certify(&self) -> bool {
        self.bits() & 0x01 != 0
    }

    pub fn sign(&self) -> bool {
        self.bits() & 0x02 != 0
    }

    pub fn encrypt_comms(&self) -> bool {
        self.bits() & 0x04 != 0
    }

    pub fn encrypt_storage(&self) -> bool {
        self.bits() & 0x08 != 0
    }

    pub fn encrypt(&self) -> bool {
        self.encrypt_comms() || self.encrypt_storage()
    }

    pub(crate) fn from_raw(raw: &SmallVec<[u8; 1]>) -> Self {
        KeyFlags(raw.clone())
    }
}

/// The signed fields of a signature packet; what remains once the actual
/// signature MPIs and the hash preview are split off. This is also the
/// builder used to produce new signatures.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignatureConfig {
    pub version: SignatureVersion,
    pub typ: SignatureType,
    pub pub_alg: PublicKeyAlgorithm,
    pub hash_alg: HashAlgorithm,
    pub hashed_subpackets: Vec<Subpacket>,
    pub unhashed_subpackets: Vec<Subpacket>,
}

impl SignatureConfig {
    /// A fresh V4 signature configuration carrying a creation time and the
    /// issuer key id.
    pub fn v4<K: SecretKeyTrait>(
        typ: SignatureType,
        hash_alg: HashAlgorithm,
        key: &K,
    ) -> SignatureConfig {
        SignatureConfig {
            version: SignatureVersion::V4,
            typ,
            pub_alg: key.algorithm(),
            hash_alg,
            hashed_subpackets: vec![Subpacket::regular(SubpacketData::SignatureCreationTime(
                Utc::now().trunc_subsecs(0),
            ))],
            unhashed_subpackets: vec![Subpacket::regular(SubpacketData::Issuer(key.key_id()))],
        }
    }

    /// Hash the canonicalized signed portion of the packet: version, type,
    /// algorithms and the hashed subpacket area. Returns the octet count,
    /// which feeds the trailer.
    pub(crate) fn hash_signature_data(&self, hasher: &mut Box<dyn Hasher>) -> Result<usize> {
        ensure_eq!(
            self.version,
            SignatureVersion::V4,
            "only V4 signatures are supported"
        );

        let mut hashed = Vec::new();
        for sp in &self.hashed_subpackets {
            sp.to_writer(&mut hashed)?;
        }
        ensure!(hashed.len() <= 0xFFFF, "hashed subpacket area too large");

        let mut buf = Vec::with_capacity(6 + hashed.len());
        buf.push(self.version as u8);
        buf.push(self.typ.into());
        buf.push(self.pub_alg.into());
        buf.push(self.hash_alg.into());
        buf.extend_from_slice(&(hashed.len() as u16).to_be_bytes());
        buf.extend_from_slice(&hashed);

        hasher.update(&buf);

        Ok(buf.len())
    }

    /// The final V4 trailer: `0x04 0xFF` and the 32 bit count of hashed
    /// signature octets.
    pub(crate) fn trailer(&self, len: usize) -> [u8; 6] {
        let mut trailer = [0x04, 0xFF, 0, 0, 0, 0];
        BigEndian::write_u32(&mut trailer[2..], len as u32);
        trailer
    }

    /// The full digest over a document: the canonicalized data, the signed
    /// fields, the trailer.
    pub fn hash_data_to_sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut hasher = self.hash_alg.new_hasher()?;

        match self.typ {
            SignatureType::Text => hasher.update(&normalize_crlf(data)),
            _ => hasher.update(data),
        }

        let len = self.hash_signature_data(&mut hasher)?;
        hasher.update(&self.trailer(len));

        Ok(hasher.finish())
    }

    /// The digest for a subkey binding: both keys under their `0x99`
    /// framing, then the signed fields.
    pub fn hash_key_binding(
        &self,
        signer: &impl PublicKeyTrait,
        bound: &impl PublicKeyTrait,
    ) -> Result<Vec<u8>> {
        let mut hasher = self.hash_alg.new_hasher()?;

        signer.serialize_for_hashing(&mut hasher)?;
        bound.serialize_for_hashing(&mut hasher)?;

        let len = self.hash_signature_data(&mut hasher)?;
        hasher.update(&self.trailer(len));

        Ok(hasher.finish())
    }

    /// The digest for a certification: the key, the user id (or attribute)
    /// under its length prefixed framing, then the signed fields.
    pub fn hash_certification(
        &self,
        key: &impl PublicKeyTrait,
        tag: Tag,
        id: &impl Serialize,
    ) -> Result<Vec<u8>> {
        let mut hasher = self.hash_alg.new_hasher()?;

        key.serialize_for_hashing(&mut hasher)?;

        let prefix = match tag {
            Tag::UserId => 0xB4,
            Tag::UserAttribute => 0xD1,
            _ => bail!("invalid tag for certification: {:?}", tag),
        };

        let body = id.to_bytes()?;
        let mut framed = [prefix, 0, 0, 0, 0];
        BigEndian::write_u32(&mut framed[1..], body.len() as u32);
        hasher.update(&framed);
        hasher.update(&body);

        let len = self.hash_signature_data(&mut hasher)?;
        hasher.update(&self.trailer(len));

        Ok(hasher.finish())
    }

    /// Sign a document.
    pub fn sign<K, F>(self, key: &K, key_pw: F, data: &[u8]) -> Result<Signature>
    where
        K: SecretKeyTrait,
        F: FnOnce() -> Option<String>,
    {
        let digest = self.hash_data_to_sign(data)?;
        let signature = key.create_signature(key_pw, self.hash_alg, &digest)?;

        Ok(Signature::from_config(
            self,
            [digest[0], digest[1]],
            signature,
        ))
    }

    /// Sign a subkey binding.
    pub fn sign_key_binding<K, F>(
        self,
        signer: &K,
        key_pw: F,
        bound: &impl PublicKeyTrait,
    ) -> Result<Signature>
    where
        K: SecretKeyTrait,
        K::PublicKey: PublicKeyTrait,
        F: FnOnce() -> Option<String>,
    {
        let digest = self.hash_key_binding(&signer.public_key(), bound)?;
        let signature = signer.create_signature(key_pw, self.hash_alg, &digest)?;

        Ok(Signature::from_config(
            self,
            [digest[0], digest[1]],
            signature,
        ))
    }

    /// Sign a certification over a user id.
    pub fn sign_certification<K, F>(
        self,
        signer: &K,
        key_pw: F,
        tag: Tag,
        id: &impl Serialize,
    ) -> Result<Signature>
    where
        K: SecretKeyTrait,
        K::PublicKey: PublicKeyTrait,
        F: FnOnce() -> Option<String>,
    {
        let digest = self.hash_certification(&signer.public_key(), tag, id)?;
        let signature = signer.create_signature(key_pw, self.hash_alg, &digest)?;

        Ok(Signature::from_config(
            self,
            [digest[0], digest[1]],
            signature,
        ))
    }
}

/// Signature Packet.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.2>
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Signature {
    pub(crate) packet_version: Version,
    pub config: SignatureConfig,
    /// The leftmost 16 bits of the signed digest.
    pub signed_hash_value: [u8; 2],
    pub signature: Vec<Mpi>,
}

impl Signature {
    pub fn from_config(
        config: SignatureConfig,
        signed_hash_value: [u8; 2],
        signature: Vec<Mpi>,
    ) -> Self {
        Signature {
            packet_version: Default::default(),
            config,
            signed_hash_value,
            signature,
        }
    }

    pub fn typ(&self) -> SignatureType {
        self.config.typ
    }

    pub fn hash_alg(&self) -> HashAlgorithm {
        self.config.hash_alg
    }

    pub fn is_certification(&self) -> bool {
        matches!(
            self.config.typ,
            SignatureType::CertGeneric
                | SignatureType::CertPersona
                | SignatureType::CertCasual
                | SignatureType::CertPositive
        )
    }

    fn find_subpacket<'a, T>(
        &'a self,
        pick: impl Fn(&'a SubpacketData) -> Option<T>,
    ) -> Option<T> {
        self.config
            .hashed_subpackets
            .iter()
            .chain(self.config.unhashed_subpackets.iter())
            .find_map(|sp| pick(&sp.data))
    }

    /// The issuing key id, from the issuer subpacket.
    pub fn issuer(&self) -> Option<KeyId> {
        self.find_subpacket(|data| match data {
            SubpacketData::Issuer(id) => Some(*id),
            _ => None,
        })
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.find_subpacket(|data| match data {
            SubpacketData::SignatureCreationTime(t) => Some(*t),
            _ => None,
        })
    }

    pub fn key_expiration_time(&self) -> Option<u32> {
        self.find_subpacket(|data| match data {
            SubpacketData::KeyExpirationTime(d) => Some(*d),
            _ => None,
        })
    }

    pub fn key_flags(&self) -> KeyFlags {
        self.find_subpacket(|data| match data {
            SubpacketData::KeyFlags(flags) => Some(KeyFlags::from_raw(flags)),
            _ => None,
        })
        .unwrap_or_default()
    }

    pub fn preferred_symmetric_algs(&self) -> &[crate::crypto::sym::SymmetricKeyAlgorithm] {
        self.find_subpacket(|data| match data {
            SubpacketData::PreferredSymmetricAlgorithms(algs) => Some(&algs[..]),
            _ => None,
        })
        .unwrap_or(&[])
    }

    pub fn preferred_hash_algs(&self) -> &[HashAlgorithm] {
        self.find_subpacket(|data| match data {
            SubpacketData::PreferredHashAlgorithms(algs) => Some(&algs[..]),
            _ => None,
        })
        .unwrap_or(&[])
    }

    pub fn preferred_compression_algs(&self) -> &[crate::types::CompressionAlgorithm] {
        self.find_subpacket(|data| match data {
            SubpacketData::PreferredCompressionAlgorithms(algs) => Some(&algs[..]),
            _ => None,
        })
        .unwrap_or(&[])
    }

    /// Verify this signature over a document.
    pub fn verify(&self, key: &impl PublicKeyTrait, data: &[u8]) -> Result<()> {
        let digest = self.config.hash_data_to_sign(data)?;

        if digest[0..2] != self.signed_hash_value {
            return Err(Error::InvalidSignature);
        }

        key.verify_signature(self.config.hash_alg, &digest, &self.signature)
    }

    /// Verify a subkey binding made by `signer` over `bound`.
    pub fn verify_key_binding(
        &self,
        signer: &impl PublicKeyTrait,
        bound: &impl PublicKeyTrait,
    ) -> Result<()> {
        let digest = self.config.hash_key_binding(signer, bound)?;

        if digest[0..2] != self.signed_hash_value {
            return Err(Error::InvalidSignature);
        }

        signer.verify_signature(self.config.hash_alg, &digest, &self.signature)
    }

    /// Verify a certification over a user id or attribute.
    pub fn verify_certification(
        &self,
        key: &impl PublicKeyTrait,
        tag: Tag,
        id: &impl Serialize,
    ) -> Result<()> {
        let digest = self.config.hash_certification(key, tag, id)?;

        if digest[0..2] != self.signed_hash_value {
            return Err(Error::InvalidSignature);
        }

        key.verify_signature(self.config.hash_alg, &digest, &self.signature)
    }
}

impl PacketTrait for Signature {
    fn packet_version(&self) -> Version {
        self.packet_version
    }

    fn tag(&self) -> Tag {
        Tag::Signature
    }
}
