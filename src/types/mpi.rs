use std::fmt;
use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use nom::bytes::streaming::take;
use nom::number::streaming::be_u16;
use num_bigint::BigUint;

use crate::errors::{Error, IResult, Result};
use crate::ser::Serialize;

/// Number of bits we accept when reading or writing MPIs.
/// The value is the same as gnupg uses.
const MAX_EXTERN_MPI_BITS: u16 = 16384;

/// An owned multiprecision integer as defined in RFC 4880 §3.2: a big-endian
/// magnitude with leading zeros stripped, serialized behind a two-octet bit
/// count.
#[derive(Default, Clone, PartialEq, Eq, Hash)]
pub struct Mpi(Vec<u8>);

impl Mpi {
    /// Wraps `raw` as an MPI, stripping leading zero octets.
    pub fn from_slice(raw: &[u8]) -> Self {
        let offset = raw.iter().position(|b| *b != 0).unwrap_or(raw.len());
        Mpi(raw[offset..].to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The value, left padded with zeros to exactly `size` octets. Useful for
    /// fixed width consumers (EdDSA points, block cipher keys).
    pub fn to_padded(&self, size: usize) -> Result<Vec<u8>> {
        ensure!(self.0.len() <= size, "mpi too large for {} octets", size);
        let mut out = vec![0u8; size - self.0.len()];
        out.extend_from_slice(&self.0);
        Ok(out)
    }

    /// Number of significant bits.
    fn bit_size(&self) -> usize {
        match self.0.first() {
            Some(first) => self.0.len() * 8 - first.leading_zeros() as usize,
            None => 0,
        }
    }
}

/// Parse a length-prefixed MPI.
pub fn mpi(i: &[u8]) -> IResult<&[u8], Mpi> {
    let (i, len_bits) = be_u16(i)?;
    if len_bits > MAX_EXTERN_MPI_BITS {
        return Err(nom::Err::Error(Error::InvalidMessage {
            message: format!("mpi too long: {len_bits} bits"),
        }));
    }

    let len_bytes = (len_bits as usize + 7) >> 3;
    let (i, raw) = take(len_bytes)(i)?;

    Ok((i, Mpi::from_slice(raw)))
}

impl Serialize for Mpi {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u16::<BigEndian>(self.bit_size() as u16)?;
        writer.write_all(&self.0)?;
        Ok(())
    }
}

impl AsRef<[u8]> for Mpi {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl zeroize::Zeroize for Mpi {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl From<&BigUint> for Mpi {
    fn from(other: &BigUint) -> Mpi {
        Mpi::from_slice(&other.to_bytes_be())
    }
}

impl From<BigUint> for Mpi {
    fn from(other: BigUint) -> Mpi {
        Mpi::from(&other)
    }
}

impl From<&Mpi> for BigUint {
    fn from(other: &Mpi) -> BigUint {
        BigUint::from_bytes_be(other.as_bytes())
    }
}

impl fmt::Debug for Mpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mpi({})", hex::encode(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mpi_parse() {
        // The number 511 (0x1FF).
        let (rest, v) = mpi(&[0x00, 0x09, 0x01, 0xFF]).unwrap();
        assert!(rest.is_empty());
        assert_eq!(v, Mpi::from_slice(&[0x01, 0xFF]));

        // Leading zeros are stripped on read.
        let (_, v) = mpi(&[0x00, 0x08, 0x00, 0x7F]).unwrap();
        assert_eq!(v.as_bytes(), &[0x7F]);
    }

    #[test]
    fn test_mpi_roundtrip() {
        for raw in [&[0x01u8, 0xFF][..], &[0x7F][..], &[0x80, 0, 0, 1][..]] {
            let v = Mpi::from_slice(raw);
            let buf = v.to_bytes().unwrap();
            let (rest, back) = mpi(&buf).unwrap();
            assert!(rest.is_empty());
            assert_eq!(v, back);
        }
    }

    #[test]
    fn test_mpi_bit_size() {
        let mut buf = Vec::new();
        Mpi::from_slice(&[0x01, 0xFF]).to_writer(&mut buf).unwrap();
        assert_eq!(buf, vec![0x00, 0x09, 0x01, 0xFF]);
    }

    #[test]
    fn test_to_padded() {
        let v = Mpi::from_slice(&[0x01, 0x02]);
        assert_eq!(v.to_padded(4).unwrap(), vec![0, 0, 1, 2]);
        assert!(v.to_padded(1).is_err());
    }
}
