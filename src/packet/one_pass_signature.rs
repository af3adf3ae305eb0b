use std::io;

use nom::bytes::streaming::take;
use nom::combinator::{map, map_res};
use nom::number::streaming::be_u8;

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::de::Deserialize;
use crate::errors::Result;
use crate::packet::packet_trait::PacketTrait;
use crate::packet::signature::SignatureType;
use crate::ser::Serialize;
use crate::types::{KeyId, Tag, Version};

/// One-Pass Signature Packet (version 3, the only one RFC 4880 defines).
/// Announces a trailing signature so the content can be hashed in one pass.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.4>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnePassSignature {
    packet_version: Version,
    typ: SignatureType,
    hash_algorithm: HashAlgorithm,
    pub_algorithm: PublicKeyAlgorithm,
    key_id: KeyId,
    /// Zero when another one-pass signature follows that also covers this
    /// content (nested bracket), non zero on the innermost.
    last: u8,
}

impl OnePassSignature {
    pub fn from_details(
        typ: SignatureType,
        hash_algorithm: HashAlgorithm,
        pub_algorithm: PublicKeyAlgorithm,
        key_id: KeyId,
    ) -> Self {
        OnePassSignature {
            packet_version: Default::default(),
            typ,
            hash_algorithm,
            pub_algorithm,
            key_id,
            last: 1,
        }
    }

    pub fn typ(&self) -> SignatureType {
        self.typ
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }

    pub fn is_nested(&self) -> bool {
        self.last == 0
    }

    pub fn set_is_nested(&mut self) {
        self.last = 0;
    }
}

impl Deserialize for OnePassSignature {
    fn from_slice(packet_version: Version, input: &[u8]) -> Result<Self> {
        let (i, version) = be_u8(input)?;
        ensure_eq!(version, 3, "invalid one pass signature version");

        let (i, typ) = map_res(be_u8, SignatureType::try_from)(i)?;
        let (i, hash_algorithm) = map(be_u8, HashAlgorithm::from)(i)?;
        let (i, pub_algorithm) = map(be_u8, PublicKeyAlgorithm::from)(i)?;
        let (i, key_id) = map_res(take(8usize), KeyId::from_slice)(i)?;
        let (_, last) = be_u8(i)?;

        Ok(OnePassSignature {
            packet_version,
            typ,
            hash_algorithm,
            pub_algorithm,
            key_id,
            last,
        })
    }
}

impl Serialize for OnePassSignature {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[
            0x03,
            self.typ.into(),
            self.hash_algorithm.into(),
            self.pub_algorithm.into(),
        ])?;
        writer.write_all(self.key_id.as_ref())?;
        writer.write_all(&[self.last])?;

        Ok(())
    }
}

impl PacketTrait for OnePassSignature {
    fn packet_version(&self) -> Version {
        self.packet_version
    }

    fn tag(&self) -> Tag {
        Tag::OnePassSignature
    }
}
