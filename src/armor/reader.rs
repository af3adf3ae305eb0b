use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::warn;

use crate::armor::{BlockType, Headers};
use crate::errors::{Error, Result};

/// One decoded armor block.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Block {
    pub typ: BlockType,
    pub headers: Headers,
    pub data: Vec<u8>,
}

/// True when the input starts with an armor BEGIN marker (leading
/// whitespace tolerated).
pub fn is_armored(input: &[u8]) -> bool {
    let start = input
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(0);
    input[start..].starts_with(b"-----BEGIN PGP ")
}

fn begin_label(line: &str) -> Option<&str> {
    line.trim_end()
        .strip_prefix("-----BEGIN ")?
        .strip_suffix("-----")
}

fn end_label(line: &str) -> Option<&str> {
    line.trim_end()
        .strip_prefix("-----END ")?
        .strip_suffix("-----")
}

/// Extract every armor block from the input, in order. Blocks of a type we
/// do not recognize are skipped with a warning; a CRC-24 mismatch rejects
/// the block.
pub fn dearmor(input: &[u8]) -> Result<Vec<Block>> {
    let text = std::str::from_utf8(input).map_err(|_| Error::InvalidMessage {
        message: "armored input is not valid utf-8".to_string(),
    })?;

    let mut blocks = Vec::new();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        let Some(label) = begin_label(line) else {
            continue;
        };

        let Some(typ) = BlockType::from_label(label) else {
            warn!("skipping unknown armor block type {label:?}");
            continue;
        };

        let mut headers = Headers::new();
        let mut body = String::new();
        let mut checksum = None;
        let mut closed = false;
        let mut in_headers = true;

        for line in lines.by_ref() {
            let trimmed = line.trim_end();

            if let Some(end) = end_label(trimmed) {
                if end != label {
                    return Err(Error::InvalidMessage {
                        message: format!("mismatched armor markers: {label:?} vs {end:?}"),
                    });
                }
                closed = true;
                break;
            }

            if in_headers {
                if trimmed.is_empty() {
                    in_headers = false;
                    continue;
                }
                if let Some((key, value)) = trimmed.split_once(": ") {
                    headers
                        .entry(key.to_string())
                        .or_default()
                        .push(value.to_string());
                    continue;
                }
                // no headers at all: this is already body data
                in_headers = false;
            }

            if let Some(crc) = trimmed.strip_prefix('=') {
                checksum = Some(crc.to_string());
            } else {
                body.push_str(trimmed);
            }
        }

        if !closed {
            return Err(Error::InvalidMessage {
                message: "unterminated armor block".to_string(),
            });
        }

        let data = STANDARD
            .decode(body.as_bytes())
            .map_err(|e| Error::InvalidMessage {
                message: format!("invalid armor base64: {e}"),
            })?;

        if let Some(crc) = checksum {
            let crc_raw = STANDARD
                .decode(crc.as_bytes())
                .map_err(|e| Error::InvalidMessage {
                    message: format!("invalid armor checksum encoding: {e}"),
                })?;
            ensure_eq!(crc_raw.len(), 3, "invalid armor checksum length");

            let expected =
                (crc_raw[0] as u32) << 16 | (crc_raw[1] as u32) << 8 | crc_raw[2] as u32;
            if crc24::hash_raw(&data) != expected {
                return Err(Error::InvalidMessage {
                    message: "armor crc24 mismatch".to_string(),
                });
            }
        }

        blocks.push(Block { typ, headers, data });
    }

    if blocks.is_empty() {
        return Err(Error::InvalidMessage {
            message: "no armor block found".to_string(),
        });
    }

    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armor::write_string;
    use crate::errors::Result as CrateResult;
    use crate::ser::Serialize;

    struct Raw(Vec<u8>);

    impl Serialize for Raw {
        fn to_writer<W: std::io::Write>(&self, w: &mut W) -> CrateResult<()> {
            w.write_all(&self.0)?;
            Ok(())
        }
    }

    #[test]
    fn test_is_armored() {
        assert!(is_armored(b"-----BEGIN PGP MESSAGE-----\r\n"));
        assert!(is_armored(b"\n  -----BEGIN PGP PUBLIC KEY BLOCK-----"));
        assert!(!is_armored(b"\x99\x01binary"));
        assert!(!is_armored(b"-----BEGIN CERTIFICATE-----"));
    }

    #[test]
    fn test_roundtrip() {
        let payload: Vec<u8> = (0u8..=255).collect();
        let armored = write_string(&Raw(payload.clone()), BlockType::Message).unwrap();

        let blocks = dearmor(armored.as_bytes()).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].typ, BlockType::Message);
        assert_eq!(blocks[0].data, payload);
    }

    #[test]
    fn test_lf_only_input() {
        let armored = write_string(&Raw(b"hello".to_vec()), BlockType::Signature).unwrap();
        let lf_only = armored.replace("\r\n", "\n");

        let blocks = dearmor(lf_only.as_bytes()).unwrap();
        assert_eq!(blocks[0].data, b"hello");
    }

    #[test]
    fn test_crc_mismatch_rejected() {
        let armored = write_string(&Raw(b"hello".to_vec()), BlockType::Message).unwrap();

        // swap the checksum line for a wrong one
        let mut lines: Vec<&str> = armored.trim_end().split("\r\n").collect();
        let idx = lines.len() - 2;
        assert!(lines[idx].starts_with('='));
        lines[idx] = "=AAAA";
        let broken = lines.join("\r\n");

        assert!(dearmor(broken.as_bytes()).is_err());
    }

    #[test]
    fn test_multiple_blocks() {
        let one = write_string(&Raw(b"one".to_vec()), BlockType::Message).unwrap();
        let two = write_string(&Raw(b"two".to_vec()), BlockType::Signature).unwrap();
        let both = format!("{one}\r\n{two}");

        let blocks = dearmor(both.as_bytes()).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].data, b"one");
        assert_eq!(blocks[1].data, b"two");
    }

    #[test]
    fn test_headers_parsed() {
        let mut armored = String::from("-----BEGIN PGP MESSAGE-----\n");
        armored.push_str("Version: test 1.0\n\n");
        armored.push_str(&STANDARD.encode(b"x"));
        armored.push('\n');
        armored.push_str("-----END PGP MESSAGE-----\n");

        let blocks = dearmor(armored.as_bytes()).unwrap();
        assert_eq!(blocks[0].data, b"x");
        assert_eq!(
            blocks[0].headers.get("Version"),
            Some(&vec!["test 1.0".to_string()])
        );
    }
}
