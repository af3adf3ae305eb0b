use std::io;

use log::{debug, warn};
use rand::{CryptoRng, Rng};

use crate::armor::{self, BlockType};
use crate::composed::key::{SignedPublicKey, SignedSecretKey};
use crate::composed::Deserializable;
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{Error, Result};
use crate::packet::{
    write_packet, CompressedData, LiteralData, OnePassSignature, Packet,
    PublicKeyEncryptedSessionKey, Signature, SignatureConfig, SignatureType,
    SymEncryptedData, SymEncryptedProtectedData, SymKeyEncryptedSessionKey,
};
use crate::ser::Serialize;
use crate::types::{CompressionAlgorithm, KeyTrait, PublicKeyTrait, Tag};

/// An encrypted session key packet, of either flavor.
/// `ESK :- PKESK | SKESK` (RFC 4880 §11.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Esk {
    PublicKeyEncryptedSessionKey(PublicKeyEncryptedSessionKey),
    SymKeyEncryptedSessionKey(SymKeyEncryptedSessionKey),
}

impl Esk {
    pub fn tag(&self) -> Tag {
        match self {
            Esk::PublicKeyEncryptedSessionKey(_) => Tag::PublicKeyEncryptedSessionKey,
            Esk::SymKeyEncryptedSessionKey(_) => Tag::SymKeyEncryptedSessionKey,
        }
    }

    fn as_public(&self) -> Option<&PublicKeyEncryptedSessionKey> {
        match self {
            Esk::PublicKeyEncryptedSessionKey(esk) => Some(esk),
            _ => None,
        }
    }

    fn as_symmetric(&self) -> Option<&SymKeyEncryptedSessionKey> {
        match self {
            Esk::SymKeyEncryptedSessionKey(esk) => Some(esk),
            _ => None,
        }
    }
}

impl TryFrom<Packet> for Esk {
    type Error = Error;

    fn try_from(p: Packet) -> Result<Esk> {
        match p {
            Packet::PublicKeyEncryptedSessionKey(esk) => {
                Ok(Esk::PublicKeyEncryptedSessionKey(esk))
            }
            Packet::SymKeyEncryptedSessionKey(esk) => Ok(Esk::SymKeyEncryptedSessionKey(esk)),
            _ => Err(Error::InvalidMessage {
                message: format!("unexpected packet {:?}", p.tag()),
            }),
        }
    }
}

impl Serialize for Esk {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            Esk::PublicKeyEncryptedSessionKey(esk) => write_packet(writer, esk),
            Esk::SymKeyEncryptedSessionKey(esk) => write_packet(writer, esk),
        }
    }
}

/// An encrypted data packet: SEIPD (preferred) or the legacy SED.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edata {
    SymEncryptedData(SymEncryptedData),
    SymEncryptedProtectedData(SymEncryptedProtectedData),
}

impl Edata {
    pub fn tag(&self) -> Tag {
        match self {
            Edata::SymEncryptedData(_) => Tag::SymEncryptedData,
            Edata::SymEncryptedProtectedData(_) => Tag::SymEncryptedProtectedData,
        }
    }
}

impl TryFrom<Packet> for Edata {
    type Error = Error;

    fn try_from(p: Packet) -> Result<Edata> {
        match p {
            Packet::SymEncryptedData(data) => Ok(Edata::SymEncryptedData(data)),
            Packet::SymEncryptedProtectedData(data) => {
                Ok(Edata::SymEncryptedProtectedData(data))
            }
            _ => Err(Error::InvalidMessage {
                message: format!("unexpected packet {:?}", p.tag()),
            }),
        }
    }
}

impl Serialize for Edata {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            Edata::SymEncryptedData(data) => write_packet(writer, data),
            Edata::SymEncryptedProtectedData(data) => write_packet(writer, data),
        }
    }
}

/// A well formed OpenPGP message.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-11.3>
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Literal(LiteralData),
    Compressed(CompressedData),
    Signed {
        /// The content that is signed; absent for a bare signature stream.
        message: Option<Box<Message>>,
        one_pass_signature: Option<OnePassSignature>,
        signature: Signature,
    },
    Encrypted {
        esk: Vec<Esk>,
        edata: Vec<Edata>,
    },
}

impl Message {
    /// A binary literal message.
    pub fn new_literal_bytes(file_name: &[u8], data: &[u8]) -> Self {
        Message::Literal(LiteralData::from_bytes(file_name, data.to_vec()))
    }

    /// A utf-8 literal message.
    pub fn new_literal(file_name: &str, data: &str) -> Self {
        Message::Literal(LiteralData::from_str(file_name.as_bytes(), data))
    }

    /// Wrap in a compressed data packet.
    pub fn compress(&self, alg: CompressionAlgorithm) -> Result<Message> {
        Ok(Message::Compressed(CompressedData::from_compressed(
            alg,
            &self.to_bytes()?,
        )?))
    }

    /// Unwrap one level of compression.
    pub fn decompress(self) -> Result<Message> {
        match self {
            Message::Compressed(data) => Message::from_bytes(&data.decompress()?),
            other => Ok(other),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Message::Literal(_))
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, Message::Encrypted { .. })
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, Message::Signed { .. })
    }

    /// The signature of a signed message, if any.
    pub fn signature(&self) -> Option<&Signature> {
        match self {
            Message::Signed { signature, .. } => Some(signature),
            _ => None,
        }
    }

    /// The literal body, descending through compression and signature
    /// wrappers. `None` for (still) encrypted content.
    pub fn get_content(&self) -> Result<Option<Vec<u8>>> {
        match self {
            Message::Literal(data) => Ok(Some(data.data().to_vec())),
            Message::Compressed(data) => {
                Message::from_bytes(&data.decompress()?)?.get_content()
            }
            Message::Signed { message, .. } => match message {
                Some(message) => message.get_content(),
                None => Ok(None),
            },
            Message::Encrypted { .. } => Ok(None),
        }
    }

    /// The literal data packet, when the message is a plain literal.
    pub fn get_literal(&self) -> Option<&LiteralData> {
        match self {
            Message::Literal(data) => Some(data),
            Message::Signed { message, .. } => message.as_ref().and_then(|m| m.get_literal()),
            _ => None,
        }
    }

    /// Sign the message. Produces the one-pass bracket
    /// `OnePassSignature | content | Signature`.
    pub fn sign<F>(
        self,
        key: &SignedSecretKey,
        key_pw: F,
        hash_alg: HashAlgorithm,
    ) -> Result<Message>
    where
        F: FnOnce() -> Option<String>,
    {
        let (typ, data) = match &self {
            Message::Literal(l) => {
                let typ = if l.is_binary() {
                    SignatureType::Binary
                } else {
                    SignatureType::Text
                };
                (typ, l.data().to_vec())
            }
            other => {
                let content = other.get_content()?.ok_or_else(|| Error::InvalidMessage {
                    message: "cannot sign encrypted content".to_string(),
                })?;
                (SignatureType::Binary, content)
            }
        };

        let config = SignatureConfig::v4(typ, hash_alg, &key.primary_key);
        let signature = config.sign(&key.primary_key, key_pw, &data)?;

        let mut one_pass = OnePassSignature::from_details(
            typ,
            hash_alg,
            key.primary_key.algorithm(),
            key.primary_key.key_id(),
        );
        // LIFO bracket: every one-pass but the innermost announces a nested
        // sequence
        if matches!(
            &self,
            Message::Signed {
                one_pass_signature: Some(_),
                ..
            }
        ) {
            one_pass.set_is_nested();
        }

        Ok(Message::Signed {
            message: Some(Box::new(self)),
            one_pass_signature: Some(one_pass),
            signature,
        })
    }

    /// Verify the signature of a signed message against `key`.
    pub fn verify(&self, key: &impl PublicKeyTrait) -> Result<()> {
        match self {
            Message::Signed {
                message, signature, ..
            } => {
                let message = message.as_ref().ok_or(Error::NotSigned)?;
                let content = message.get_content()?.ok_or_else(|| Error::InvalidMessage {
                    message: "cannot verify encrypted content".to_string(),
                })?;
                signature.verify(key, &content)
            }
            Message::Compressed(data) => {
                Message::from_bytes(&data.decompress()?)?.verify(key)
            }
            _ => Err(Error::NotSigned),
        }
    }

    /// Encrypt to a set of recipients: one PKESK each, a fresh session key,
    /// SEIPD with MDC around the serialized content.
    pub fn encrypt_to_keys<R: CryptoRng + Rng>(
        &self,
        rng: &mut R,
        keys: &[&SignedPublicKey],
    ) -> Result<Message> {
        ensure!(!keys.is_empty(), "no recipient keys");

        let alg = preferred_symmetric_algorithm(keys);
        debug!("encrypting with {:?}", alg);

        let mut session_key = vec![0u8; alg.key_size()];
        rng.fill_bytes(&mut session_key);

        let mut esk = Vec::with_capacity(keys.len());
        for key in keys {
            let target = key.encryption_key().ok_or_else(|| Error::Message {
                message: format!("no usable encryption key in {:?}", key.key_id()),
            })?;
            esk.push(Esk::PublicKeyEncryptedSessionKey(
                PublicKeyEncryptedSessionKey::from_session_key(rng, &session_key, alg, &target)?,
            ));
        }

        let edata =
            SymEncryptedProtectedData::encrypt_with_rng(rng, alg, &session_key, &self.to_bytes()?)?;

        Ok(Message::Encrypted {
            esk,
            edata: vec![Edata::SymEncryptedProtectedData(edata)],
        })
    }

    /// Encrypt under a passphrase: a SKESK whose derived key is the session
    /// key, and a SEIPD envelope.
    pub fn encrypt_with_password<R, F>(
        &self,
        rng: &mut R,
        msg_pw: F,
        alg: SymmetricKeyAlgorithm,
    ) -> Result<Message>
    where
        R: CryptoRng + Rng,
        F: FnOnce() -> Option<String>,
    {
        let skesk = SymKeyEncryptedSessionKey::from_passphrase(rng, alg);
        let pw = msg_pw().ok_or(Error::PassphraseRequired)?;
        let (_, session_key) = skesk.unwrap_session_key(&pw)?;

        let edata =
            SymEncryptedProtectedData::encrypt_with_rng(rng, alg, &session_key, &self.to_bytes()?)?;

        Ok(Message::Encrypted {
            esk: vec![Esk::SymKeyEncryptedSessionKey(skesk)],
            edata: vec![Edata::SymEncryptedProtectedData(edata)],
        })
    }

    /// Decrypt with any matching secret key: scan the PKESKs for one
    /// addressed to a key we hold, unlock it (consulting the passphrase
    /// callback), recover the session key and open the envelope.
    pub fn decrypt<F>(&self, key_pw: F, keys: &[&SignedSecretKey]) -> Result<Message>
    where
        F: Fn() -> Option<String>,
    {
        let Message::Encrypted { esk, edata } = self else {
            return Err(Error::InvalidMessage {
                message: "message is not encrypted".to_string(),
            });
        };

        let mut missing_passphrase = false;
        let mut passphrase_incorrect = false;

        for pkesk in esk.iter().filter_map(Esk::as_public) {
            for key in keys {
                let Some(secret) = key.decryption_key(pkesk.id()) else {
                    continue;
                };
                debug!("session key candidate {:?}", secret.key_id());

                match secret.unlock(&key_pw, |repr| pkesk.unwrap_session_key(repr)) {
                    Ok((alg, session_key)) => {
                        return decrypt_edata(edata, alg, &session_key);
                    }
                    Err(Error::PassphraseRequired) => missing_passphrase = true,
                    Err(Error::PassphraseIncorrect) => passphrase_incorrect = true,
                    Err(err) => warn!("candidate key failed: {:?}", err),
                }
            }
        }

        if passphrase_incorrect {
            Err(Error::PassphraseIncorrect)
        } else if missing_passphrase {
            Err(Error::PassphraseRequired)
        } else {
            Err(Error::InvalidMessage {
                message: "no session key could be recovered".to_string(),
            })
        }
    }

    /// Decrypt a passphrase protected message.
    pub fn decrypt_with_password<F>(&self, msg_pw: F) -> Result<Message>
    where
        F: Fn() -> Option<String>,
    {
        let Message::Encrypted { esk, edata } = self else {
            return Err(Error::InvalidMessage {
                message: "message is not encrypted".to_string(),
            });
        };

        let mut skesks = esk.iter().filter_map(Esk::as_symmetric).peekable();
        if skesks.peek().is_none() {
            return Err(Error::InvalidMessage {
                message: "no symmetric session key packet".to_string(),
            });
        }

        let pw = msg_pw().ok_or(Error::PassphraseRequired)?;

        for skesk in skesks {
            match skesk
                .unwrap_session_key(&pw)
                .and_then(|(alg, session_key)| decrypt_edata(edata, alg, &session_key))
            {
                Ok(message) => return Ok(message),
                Err(err @ Error::IntegrityCheckFailed) => return Err(err),
                Err(err) => warn!("skesk candidate failed: {:?}", err),
            }
        }

        Err(Error::PassphraseIncorrect)
    }

    pub fn to_armored_writer(&self, writer: &mut impl io::Write) -> Result<()> {
        armor::write(self, BlockType::Message, writer, None)
    }

    pub fn to_armored_string(&self) -> Result<String> {
        armor::write_string(self, BlockType::Message)
    }

    pub fn to_armored_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.to_armored_string()?.into_bytes())
    }
}

/// Open the first encrypted data packet. Both SEIPD and the legacy SED are
/// terminal: exactly one packet is consumed, its plaintext is parsed as a
/// fresh, separate packet stream.
fn decrypt_edata(edata: &[Edata], alg: SymmetricKeyAlgorithm, key: &[u8]) -> Result<Message> {
    let first = edata.first().ok_or_else(|| Error::InvalidMessage {
        message: "no encrypted data packet".to_string(),
    })?;

    let plaintext = match first {
        Edata::SymEncryptedProtectedData(data) => data.decrypt(alg, key)?,
        Edata::SymEncryptedData(data) => {
            warn!("decrypting legacy data without integrity protection");
            data.decrypt(alg, key)?
        }
    };

    Message::from_bytes(&plaintext)
}

/// Resolve the strongest symmetric algorithm every recipient declares
/// support for (subpacket 11), AES-128 when nothing is shared.
pub fn preferred_symmetric_algorithm(keys: &[&SignedPublicKey]) -> SymmetricKeyAlgorithm {
    let mut iter = keys.iter();
    let Some(first) = iter.next() else {
        return SymmetricKeyAlgorithm::default();
    };

    let mut common: Vec<SymmetricKeyAlgorithm> =
        first.preferred_symmetric_algorithms().to_vec();
    for key in iter {
        let prefs = key.preferred_symmetric_algorithms();
        common.retain(|alg| prefs.contains(alg));
    }

    common
        .into_iter()
        .find(|alg| alg.is_supported())
        .unwrap_or_default()
}

impl Serialize for Message {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            Message::Literal(data) => write_packet(writer, data),
            Message::Compressed(data) => write_packet(writer, data),
            Message::Signed {
                message,
                one_pass_signature,
                signature,
            } => {
                if let Some(ops) = one_pass_signature {
                    write_packet(writer, ops)?;
                }
                if let Some(message) = message {
                    message.to_writer(writer)?;
                }
                write_packet(writer, signature)
            }
            Message::Encrypted { esk, edata } => {
                for packet in esk {
                    packet.to_writer(writer)?;
                }
                for packet in edata {
                    packet.to_writer(writer)?;
                }
                Ok(())
            }
        }
    }
}
