use log::{debug, warn};

use crate::errors::Result;
use crate::packet::packet_sum::Packet;
use crate::packet::single::{self, ParseResult};
use crate::types::Tag;

/// Iterator over the packets of a byte slice.
///
/// Recovery policy: a header that does not parse advances exactly one octet
/// and retries, which tolerates marker debris and trailing junk in real
/// world streams. A packet whose *body* is malformed is surfaced as one
/// `Err` item and skipped as a whole. Truncated data at the end of the
/// input ends iteration.
pub struct PacketParser<'a> {
    input: &'a [u8],
    offset: usize,
    resyncs: usize,
}

impl<'a> PacketParser<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        PacketParser {
            input,
            offset: 0,
            resyncs: 0,
        }
    }

    /// How many single octet resynchronizations happened so far.
    pub fn resyncs(&self) -> usize {
        self.resyncs
    }
}

impl Iterator for PacketParser<'_> {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.offset < self.input.len() {
            let i = &self.input[self.offset..];

            let (rest, (version, tag, _len, body)) = match single::parser(i) {
                Ok(v) => v,
                Err(err) => {
                    // unrecognized or overrunning header: skip one octet
                    debug!("resync at offset {}: {:?}", self.offset, err);
                    self.offset += 1;
                    self.resyncs += 1;
                    continue;
                }
            };

            self.offset += i.len() - rest.len();

            let res = match body {
                ParseResult::Fixed(body) => single::body_parser(version, tag, body),
                ParseResult::Indeterminate(body) => single::body_parser(version, tag, body),
                ParseResult::Partial(chunks) => {
                    // https://tools.ietf.org/html/rfc4880#section-4.2.2.4
                    // partial lengths are only allowed on data packets, and
                    // the first chunk must hold at least 512 octets
                    if !matches!(
                        tag,
                        Tag::LiteralData
                            | Tag::CompressedData
                            | Tag::SymEncryptedData
                            | Tag::SymEncryptedProtectedData
                    ) {
                        warn!("partial body length on {:?}", tag);
                        return Some(Err(format_err!(
                            "partial body length is not allowed for {:?}",
                            tag
                        )));
                    }
                    if chunks.first().map(|c| c.len() < 512).unwrap_or(true) {
                        return Some(Err(format_err!("first partial chunk shorter than 512")));
                    }

                    single::body_parser(version, tag, &chunks.concat())
                }
            };

            return Some(res);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::LiteralData;
    use crate::ser::Serialize;

    #[test]
    fn test_parse_emitted_stream() {
        let a: Packet = LiteralData::from_bytes(b"a", b"first".to_vec()).into();
        let b: Packet = LiteralData::from_bytes(b"b", b"second".to_vec()).into();

        let mut buf = Vec::new();
        a.to_writer(&mut buf).unwrap();
        b.to_writer(&mut buf).unwrap();

        let packets: Vec<Packet> = PacketParser::new(&buf).collect::<Result<_>>().unwrap();
        assert_eq!(packets, vec![a, b]);
    }

    #[test]
    fn test_resync_over_junk() {
        let p: Packet = LiteralData::from_bytes(b"x", b"payload".to_vec()).into();

        // leading garbage without the high bit set cannot be a header
        let mut buf = vec![0x00, 0x7F, 0x23];
        p.to_writer(&mut buf).unwrap();

        let mut parser = PacketParser::new(&buf);
        let parsed = parser.next().unwrap().unwrap();
        assert_eq!(parsed, p);
        assert_eq!(parser.resyncs(), 3);
        assert!(parser.next().is_none());
    }

    #[test]
    fn test_incomplete_tail_stops() {
        // a new format header announcing more data than present
        let buf = [0xC1, 0x20, 0x01, 0x02];
        let mut parser = PacketParser::new(&buf);
        // every scan position overruns, nothing is produced
        assert!(parser.next().is_none());
    }

    #[test]
    fn test_old_format_header() {
        let lit = LiteralData::from_bytes(b"f", b"old style".to_vec());
        let body = lit.to_bytes().unwrap();

        // old format literal data: tag 11, one octet length
        let mut buf = vec![0b1000_0000 | (11 << 2), body.len() as u8];
        buf.extend_from_slice(&body);

        let packets: Vec<Packet> = PacketParser::new(&buf).collect::<Result<_>>().unwrap();
        assert_eq!(packets.len(), 1);
        let Packet::LiteralData(parsed) = &packets[0] else {
            panic!("expected literal data");
        };
        assert_eq!(parsed.data(), lit.data());
    }
}
