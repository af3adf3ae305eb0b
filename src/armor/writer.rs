use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::armor::{BlockType, Headers};
use crate::errors::Result;
use crate::ser::Serialize;

/// Octets of binary input per armor line (64 Base64 columns).
const LINE_WIDTH: usize = 48;

/// Write `source` as an armored block: marker lines, optional headers,
/// Base64 at 64 columns, the CRC-24 line. CRLF line endings throughout.
pub fn write(
    source: &impl Serialize,
    typ: BlockType,
    writer: &mut impl Write,
    headers: Option<&Headers>,
) -> Result<()> {
    let body = source.to_bytes()?;

    write!(writer, "-----BEGIN {typ}-----\r\n")?;

    if let Some(headers) = headers {
        for (key, values) in headers.iter() {
            for value in values {
                write!(writer, "{key}: {value}\r\n")?;
            }
        }
    }
    writer.write_all(b"\r\n")?;

    for chunk in body.chunks(LINE_WIDTH) {
        writer.write_all(STANDARD.encode(chunk).as_bytes())?;
        writer.write_all(b"\r\n")?;
    }

    let crc = crc24::hash_raw(&body);
    let crc_buf = [(crc >> 16) as u8, (crc >> 8) as u8, crc as u8];
    write!(writer, "={}\r\n", STANDARD.encode(crc_buf))?;

    write!(writer, "-----END {typ}-----\r\n")?;

    Ok(())
}

/// Convenience wrapper returning the armored block as a string.
pub fn write_string(source: &impl Serialize, typ: BlockType) -> Result<String> {
    let mut buf = Vec::new();
    write(source, typ, &mut buf, None)?;
    Ok(String::from_utf8(buf).expect("armor output is ascii"))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Raw(Vec<u8>);

    impl Serialize for Raw {
        fn to_writer<W: Write>(&self, w: &mut W) -> Result<()> {
            w.write_all(&self.0)?;
            Ok(())
        }
    }

    #[test]
    fn test_shape() {
        let out = write_string(&Raw(vec![0xAB; 100]), BlockType::Message).unwrap();

        assert!(out.starts_with("-----BEGIN PGP MESSAGE-----\r\n"));
        assert!(out.ends_with("-----END PGP MESSAGE-----\r\n"));

        let lines: Vec<&str> = out.trim_end().split("\r\n").collect();
        // all body lines stay within 64 columns
        for line in &lines[1..lines.len() - 2] {
            assert!(line.len() <= 64, "{line}");
        }
        // checksum line: '=' plus four base64 chars
        let crc_line = lines[lines.len() - 2];
        assert_eq!(crc_line.len(), 5);
        assert!(crc_line.starts_with('='));
    }
}
