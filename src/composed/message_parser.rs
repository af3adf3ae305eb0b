use log::warn;

use crate::armor::BlockType;
use crate::composed::message::{Edata, Esk, Message};
use crate::composed::Deserializable;
use crate::errors::{Error, Result};
use crate::packet::Packet;
use crate::types::Tag;

type Packets<'a> = std::iter::Peekable<&'a mut dyn Iterator<Item = Packet>>;

/// Parse one message off the packet stream, per the grammar
/// `Message :- Literal | Compressed | ESK* Encrypted+ | Signed`.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-11.3>
fn next(packets: &mut Packets<'_>) -> Option<Result<Message>> {
    while let Some(packet) = packets.next() {
        match packet.tag() {
            Tag::LiteralData => {
                return Some(packet.try_into().map(Message::Literal));
            }
            Tag::CompressedData => {
                return Some(packet.try_into().map(Message::Compressed));
            }
            Tag::PublicKeyEncryptedSessionKey | Tag::SymKeyEncryptedSessionKey => {
                let first: Esk = err_opt!(packet.try_into());
                let mut esk = vec![first];

                while packets
                    .peek()
                    .map(|p| {
                        matches!(
                            p.tag(),
                            Tag::PublicKeyEncryptedSessionKey | Tag::SymKeyEncryptedSessionKey
                        )
                    })
                    .unwrap_or(false)
                {
                    let p = packets.next().expect("peeked");
                    esk.push(err_opt!(p.try_into()));
                }

                let mut edata = Vec::new();
                while packets
                    .peek()
                    .map(|p| {
                        matches!(
                            p.tag(),
                            Tag::SymEncryptedData | Tag::SymEncryptedProtectedData
                        )
                    })
                    .unwrap_or(false)
                {
                    let p = packets.next().expect("peeked");
                    edata.push(err_opt!(p.try_into()));
                }

                if edata.is_empty() {
                    return Some(Err(Error::InvalidMessage {
                        message: "session keys without encrypted data".to_string(),
                    }));
                }

                return Some(Ok(Message::Encrypted { esk, edata }));
            }
            Tag::SymEncryptedData | Tag::SymEncryptedProtectedData => {
                let first: Edata = err_opt!(packet.try_into());
                let mut edata = vec![first];

                while packets
                    .peek()
                    .map(|p| {
                        matches!(
                            p.tag(),
                            Tag::SymEncryptedData | Tag::SymEncryptedProtectedData
                        )
                    })
                    .unwrap_or(false)
                {
                    let p = packets.next().expect("peeked");
                    edata.push(err_opt!(p.try_into()));
                }

                return Some(Ok(Message::Encrypted {
                    esk: Vec::new(),
                    edata,
                }));
            }
            Tag::Signature => {
                let signature = err_opt!(packet.try_into());
                let message = match next(packets) {
                    Some(Ok(message)) => Some(Box::new(message)),
                    Some(Err(err)) => return Some(Err(err)),
                    None => None,
                };

                return Some(Ok(Message::Signed {
                    message,
                    one_pass_signature: None,
                    signature,
                }));
            }
            Tag::OnePassSignature => {
                let one_pass = err_opt!(packet.try_into());
                let message = match next(packets) {
                    Some(Ok(message)) => Some(Box::new(message)),
                    Some(Err(err)) => return Some(Err(err)),
                    None => None,
                };

                // the trailing half of the bracket
                if packets.peek().map(|p| p.tag()) != Some(Tag::Signature) {
                    return Some(Err(Error::InvalidMessage {
                        message: "one pass signature without trailing signature".to_string(),
                    }));
                }
                let signature = err_opt!(packets.next().expect("peeked").try_into());

                return Some(Ok(Message::Signed {
                    message,
                    one_pass_signature: Some(one_pass),
                    signature,
                }));
            }
            Tag::Marker => {
                // markers are skipped wherever they appear
            }
            tag => {
                return Some(Err(Error::InvalidMessage {
                    message: format!("unexpected packet {tag:?}"),
                }));
            }
        }
    }

    None
}

impl Deserializable for Message {
    fn from_packets(packets: &mut dyn Iterator<Item = Result<Packet>>) -> Result<Vec<Self>> {
        // soft errors mark packets that are skippable by design
        let mut ok_packets = packets.filter_map(|p| match p {
            Ok(p) => Some(Ok(p)),
            Err(err) if err.is_soft() => {
                warn!("skipping unsupported packet: {:?}", err);
                None
            }
            Err(err) => Some(Err(err)),
        });

        // fail fast on the first hard error
        let mut collected = Vec::new();
        for p in &mut ok_packets {
            collected.push(p?);
        }

        let mut iter = collected.into_iter();
        let mut peekable: Packets<'_> =
            (&mut iter as &mut dyn Iterator<Item = Packet>).peekable();

        let mut messages = Vec::new();
        while let Some(message) = next(&mut peekable) {
            messages.push(message?);
        }

        Ok(messages)
    }

    fn matches_block_type(typ: BlockType) -> bool {
        matches!(typ, BlockType::Message)
    }
}
