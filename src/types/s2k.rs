use std::io;

use nom::bytes::streaming::take;
use nom::combinator::cond;
use nom::number::streaming::be_u8;
use num_enum::{FromPrimitive, IntoPrimitive};
use rand::{CryptoRng, Rng};

use crate::crypto::hash::HashAlgorithm;
use crate::errors::{IResult, Result};
use crate::ser::Serialize;

/// Exponent bias of the iterated-salted coded count.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-3.7.1.3>
const EXPBIAS: u32 = 6;

/// Default coded count, decodes to 8 388 608 octets.
const DEFAULT_COUNT: u8 = 224;

/// String-to-Key specifier: turns a passphrase into a symmetric key.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-3.7>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringToKey {
    typ: StringToKeyType,
    hash: HashAlgorithm,
    salt: Option<Vec<u8>>,
    count: Option<u8>,
}

/// Available String-to-Key methods.
#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum StringToKeyType {
    Simple = 0,
    Salted = 1,
    Reserved = 2,
    IteratedAndSalted = 3,

    #[num_enum(catch_all)]
    Other(u8),
}

impl StringToKeyType {
    fn has_salt(self) -> bool {
        matches!(
            self,
            StringToKeyType::Salted | StringToKeyType::IteratedAndSalted
        )
    }

    fn has_count(self) -> bool {
        matches!(self, StringToKeyType::IteratedAndSalted)
    }
}

impl StringToKey {
    pub fn new_default<R: CryptoRng + Rng>(rng: &mut R) -> Self {
        StringToKey::new_iterated(rng, HashAlgorithm::default(), DEFAULT_COUNT)
    }

    pub fn new_iterated<R: CryptoRng + Rng>(rng: &mut R, hash: HashAlgorithm, count: u8) -> Self {
        let mut salt = vec![0u8; 8];
        rng.fill(&mut salt[..]);

        StringToKey {
            typ: StringToKeyType::IteratedAndSalted,
            hash,
            salt: Some(salt),
            count: Some(count),
        }
    }

    pub fn typ(&self) -> StringToKeyType {
        self.typ
    }

    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    pub fn salt(&self) -> Option<&[u8]> {
        self.salt.as_deref()
    }

    /// Decodes the coded count into the octet count to hash.
    pub fn count(&self) -> Option<usize> {
        let c = self.count?;
        Some(((16u32 + u32::from(c & 15)) << (u32::from(c >> 4) + EXPBIAS)) as usize)
    }

    /// Derive a symmetric key of `key_size` octets from `passphrase`.
    pub fn derive_key(&self, passphrase: &str, key_size: usize) -> Result<Vec<u8>> {
        let digest_size = self.hash.digest_size();
        ensure!(digest_size > 0, "invalid hash algorithm {:?}", self.hash);

        let mut key = Vec::with_capacity(key_size);
        let mut round = 0;

        while key.len() < key_size {
            let mut hasher = self.hash.new_hasher()?;

            // each additional round is preloaded with one more zero octet
            if round > 0 {
                hasher.update(&vec![0u8; round]);
            }

            match self.typ {
                StringToKeyType::Simple => {
                    hasher.update(passphrase.as_bytes());
                }
                StringToKeyType::Salted => {
                    hasher.update(self.salt.as_ref().expect("salted s2k"));
                    hasher.update(passphrase.as_bytes());
                }
                StringToKeyType::IteratedAndSalted => {
                    let salt = self.salt.as_ref().expect("iterated s2k");
                    let pw = passphrase.as_bytes();
                    let chunk = salt.len() + pw.len();
                    let mut todo = self.count().expect("iterated s2k").max(chunk);

                    while todo > chunk {
                        hasher.update(salt);
                        hasher.update(pw);
                        todo -= chunk;
                    }

                    if todo <= salt.len() {
                        hasher.update(&salt[..todo]);
                    } else {
                        hasher.update(salt);
                        hasher.update(&pw[..todo - salt.len()]);
                    }
                }
                _ => unsupported_err!("S2K type {:?}", self.typ),
            }

            let digest = hasher.finish();
            let missing = key_size - key.len();
            key.extend_from_slice(&digest[..missing.min(digest_size)]);
            round += 1;
        }

        Ok(key)
    }
}

pub fn s2k_parser(i: &[u8]) -> IResult<&[u8], StringToKey> {
    let (i, typ) = be_u8(i)?;
    let typ = StringToKeyType::from(typ);
    let (i, hash) = be_u8(i)?;
    let (i, salt) = cond(typ.has_salt(), take(8usize))(i)?;
    let (i, count) = cond(typ.has_count(), be_u8)(i)?;

    Ok((
        i,
        StringToKey {
            typ,
            hash: HashAlgorithm::from(hash),
            salt: salt.map(|s| s.to_vec()),
            count,
        },
    ))
}

impl Serialize for StringToKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[u8::from(self.typ), u8::from(self.hash)])?;

        if let Some(ref salt) = self.salt {
            writer.write_all(salt)?;
        }
        if let Some(count) = self.count {
            writer.write_all(&[count])?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn test_s2k_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let s2k = StringToKey::new_default(&mut rng);

        let buf = s2k.to_bytes().unwrap();
        assert_eq!(buf.len(), 10);
        let (rest, back) = s2k_parser(&buf).unwrap();
        assert!(rest.is_empty());
        assert_eq!(s2k, back);
    }

    #[test]
    fn test_coded_count() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let s2k = StringToKey::new_iterated(&mut rng, HashAlgorithm::SHA2_256, 224);
        assert_eq!(s2k.count(), Some(8_388_608));
    }

    #[test]
    fn test_derive_key_stretches() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        // SHA-1 digests are 20 octets; a 24 octet key takes two rounds
        let s2k = StringToKey::new_iterated(&mut rng, HashAlgorithm::SHA1, 96);

        let key = s2k.derive_key("test", 24).unwrap();
        assert_eq!(key.len(), 24);

        // stable for the same passphrase, different for another
        assert_eq!(key, s2k.derive_key("test", 24).unwrap());
        assert_ne!(key, s2k.derive_key("other", 24).unwrap());
    }
}
