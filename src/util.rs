use std::io;

use byteorder::{BigEndian, WriteBytesExt};

use crate::errors::{IResult, Result};

/// Write a length in the new-format encoding (RFC 4880 §4.2.2), used both
/// for packet headers and for signature subpacket framing.
pub fn write_packet_length(len: usize, writer: &mut impl io::Write) -> Result<()> {
    if len < 192 {
        writer.write_u8(len as u8)?;
    } else if len < 8384 {
        writer.write_u8((((len - 192) >> 8) + 192) as u8)?;
        writer.write_u8(((len - 192) & 0xFF) as u8)?;
    } else {
        writer.write_u8(255)?;
        writer.write_u32::<BigEndian>(len as u32)?;
    }

    Ok(())
}

/// How many octets `write_packet_length` produces for `len`.
pub fn packet_length_len(len: usize) -> usize {
    if len < 192 {
        1
    } else if len < 8384 {
        2
    } else {
        5
    }
}

/// Parse a new-format encoded length. Partial lengths are not allowed here,
/// this is used for signature subpackets.
pub fn packet_length(i: &[u8]) -> IResult<&[u8], usize> {
    use nom::number::streaming::{be_u32, be_u8};

    let (i, olen) = be_u8(i)?;
    match olen {
        // One-octet
        0..=191 => Ok((i, olen as usize)),
        // Two-octet
        192..=254 => {
            let (i, a) = be_u8(i)?;
            Ok((i, ((olen as usize - 192) << 8) + 192 + a as usize))
        }
        // Five-octet
        255 => {
            let (i, len) = be_u32(i)?;
            Ok((i, len as usize))
        }
    }
}

/// Lossy conversion of raw bytes into a string, for user ids and file names.
pub fn read_string(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_string()
}

/// Normalize line endings to CRLF, as required when hashing text-mode
/// documents (RFC 4880 §5.2.1, §5.9).
pub fn normalize_crlf(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'\r' => {
                out.push(b'\r');
                out.push(b'\n');
                // swallow a following \n, it is already accounted for
                if data.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
            }
            b'\n' => {
                out.push(b'\r');
                out.push(b'\n');
            }
            c => out.push(c),
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_length_roundtrip() {
        for len in [0usize, 1, 191, 192, 193, 8000, 8383, 8384, 100_000] {
            let mut buf = Vec::new();
            write_packet_length(len, &mut buf).unwrap();
            assert_eq!(buf.len(), packet_length_len(len));
            let (rest, back) = packet_length(&buf).unwrap();
            assert!(rest.is_empty());
            assert_eq!(back, len, "length {len}");
        }
    }

    #[test]
    fn test_normalize_crlf() {
        assert_eq!(normalize_crlf(b"a\nb"), b"a\r\nb".to_vec());
        assert_eq!(normalize_crlf(b"a\r\nb"), b"a\r\nb".to_vec());
        assert_eq!(normalize_crlf(b"a\rb"), b"a\r\nb".to_vec());
        assert_eq!(normalize_crlf(b"ab"), b"ab".to_vec());
    }
}
