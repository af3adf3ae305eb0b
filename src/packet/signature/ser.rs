use std::io;

use byteorder::{BigEndian, WriteBytesExt};

use crate::errors::Result;
use crate::packet::signature::types::Signature;
use crate::ser::Serialize;

impl Serialize for Signature {
    /// Emit the V4 signature body.
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[
            self.config.version as u8,
            self.config.typ.into(),
            self.config.pub_alg.into(),
            self.config.hash_alg.into(),
        ])?;

        let mut hashed = Vec::new();
        for sp in &self.config.hashed_subpackets {
            sp.to_writer(&mut hashed)?;
        }
        writer.write_u16::<BigEndian>(hashed.len() as u16)?;
        writer.write_all(&hashed)?;

        let mut unhashed = Vec::new();
        for sp in &self.config.unhashed_subpackets {
            sp.to_writer(&mut unhashed)?;
        }
        writer.write_u16::<BigEndian>(unhashed.len() as u16)?;
        writer.write_all(&unhashed)?;

        writer.write_all(&self.signed_hash_value)?;

        for v in &self.signature {
            v.to_writer(writer)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use smallvec::SmallVec;

    use crate::crypto::hash::HashAlgorithm;
    use crate::crypto::public_key::PublicKeyAlgorithm;
    use crate::de::Deserialize;
    use crate::packet::signature::subpacket::{Subpacket, SubpacketData};
    use crate::packet::signature::types::{
        Signature, SignatureConfig, SignatureType, SignatureVersion,
    };
    use crate::ser::Serialize;
    use crate::types::{KeyId, Mpi, Version};

    #[test]
    fn test_signature_roundtrip() {
        let config = SignatureConfig {
            version: SignatureVersion::V4,
            typ: SignatureType::Binary,
            pub_alg: PublicKeyAlgorithm::RSA,
            hash_alg: HashAlgorithm::SHA2_256,
            hashed_subpackets: vec![
                Subpacket::regular(SubpacketData::SignatureCreationTime(
                    Utc.timestamp_opt(1_600_000_000, 0).unwrap(),
                )),
                Subpacket::regular(SubpacketData::KeyFlags(SmallVec::from_slice(&[0x03]))),
            ],
            unhashed_subpackets: vec![Subpacket::regular(SubpacketData::Issuer(
                KeyId::from_slice(&[8, 7, 6, 5, 4, 3, 2, 1]).unwrap(),
            ))],
        };

        let sig = Signature::from_config(
            config,
            [0xAB, 0xCD],
            vec![Mpi::from_slice(&[0x11; 128])],
        );

        let buf = sig.to_bytes().unwrap();
        let back = Signature::from_slice(Version::New, &buf).unwrap();
        assert_eq!(sig, back);

        assert_eq!(back.issuer(), Some(KeyId::from_slice(&[8, 7, 6, 5, 4, 3, 2, 1]).unwrap()));
        assert!(back.key_flags().certify());
        assert!(back.key_flags().sign());
        assert!(!back.key_flags().encrypt());
    }
}
