use log::{debug, warn};

use crate::composed::key::public::{SignedPublicKey, SignedPublicSubKey};
use crate::composed::key::secret::{SignedSecretKey, SignedSecretSubKey};
use crate::composed::key::shared::{
    PublicOrSecret, SignedKeyDetails, SignedUser, SignedUserAttribute,
};
use crate::errors::Result;
use crate::packet::{Packet, Signature, SignatureType};
use crate::types::Tag;

type Packets<'a> = std::iter::Peekable<&'a mut dyn Iterator<Item = Packet>>;

fn take_sigs(packets: &mut Packets<'_>) -> Vec<Signature> {
    let mut sigs = Vec::new();
    while let Some(packet) = packets.next_if(|p| p.tag() == Tag::Signature) {
        let Packet::Signature(sig) = packet else {
            unreachable!("checked tag");
        };
        sigs.push(sig);
    }
    sigs
}

/// Group a packet stream into transferable keys.
///
/// The expected layout per key (RFC 4880 §11.1 / §11.2): one primary key
/// packet, revocation and direct signatures, user ids and attributes with
/// their certifications, then subkeys with their binding signatures.
/// Unparseable packets are skipped so a damaged keyring still yields its
/// readable keys.
pub(crate) fn parse_keyring(
    packets: &mut dyn Iterator<Item = Result<Packet>>,
) -> Result<Vec<PublicOrSecret>> {
    let mut ok_packets = packets.filter_map(|p| match p {
        Ok(p) => Some(p),
        Err(err) => {
            warn!("skipping unreadable packet: {:?}", err);
            None
        }
    });
    let mut iter: Packets<'_> =
        (&mut ok_packets as &mut dyn Iterator<Item = Packet>).peekable();

    let mut keys = Vec::new();

    loop {
        // scan for the next primary key packet
        while let Some(p) =
            iter.next_if(|p| p.tag() != Tag::PublicKey && p.tag() != Tag::SecretKey)
        {
            warn!("ignoring unexpected packet {:?}", p.tag());
        }
        let Some(primary) = iter.next() else {
            break;
        };
        debug!("primary key packet {:?}", primary.tag());

        // revocations first, everything else counts as a direct signature
        let mut revocation_signatures = Vec::new();
        let mut direct_signatures = Vec::new();
        for sig in take_sigs(&mut iter) {
            if sig.typ() == SignatureType::KeyRevocation {
                revocation_signatures.push(sig);
            } else {
                direct_signatures.push(sig);
            }
        }

        // user ids and attributes, each with its certifications
        let mut users = Vec::new();
        let mut user_attributes = Vec::new();
        while let Some(p) = iter.next_if(|p| matches!(p.tag(), Tag::UserId | Tag::UserAttribute)) {
            match p {
                Packet::UserId(id) => {
                    let sigs = take_sigs(&mut iter);
                    users.push(SignedUser::new(id, sigs));
                }
                Packet::UserAttribute(attr) => {
                    let sigs = take_sigs(&mut iter);
                    user_attributes.push(SignedUserAttribute::new(attr, sigs));
                }
                _ => unreachable!("checked tag"),
            }
        }

        if users.is_empty() {
            warn!("key without user ids");
        }

        // subkeys with their binding signatures
        let mut public_subkeys = Vec::new();
        let mut secret_subkeys = Vec::new();
        while let Some(p) =
            iter.next_if(|p| matches!(p.tag(), Tag::PublicSubkey | Tag::SecretSubkey))
        {
            match p {
                Packet::PublicSubkey(key) => {
                    let sigs = take_sigs(&mut iter);
                    public_subkeys.push(SignedPublicSubKey::new(key, sigs));
                }
                Packet::SecretSubkey(key) => {
                    let sigs = take_sigs(&mut iter);
                    secret_subkeys.push(SignedSecretSubKey::new(key, sigs));
                }
                _ => unreachable!("checked tag"),
            }
        }

        let details = SignedKeyDetails::new(
            revocation_signatures,
            direct_signatures,
            users,
            user_attributes,
        );

        match primary {
            Packet::PublicKey(key) => {
                if !secret_subkeys.is_empty() {
                    warn!("ignoring secret subkeys under a public primary key");
                }
                keys.push(PublicOrSecret::Public(SignedPublicKey::new(
                    key,
                    details,
                    public_subkeys,
                )));
            }
            Packet::SecretKey(key) => {
                keys.push(PublicOrSecret::Secret(SignedSecretKey::new(
                    key,
                    details,
                    public_subkeys,
                    secret_subkeys,
                )));
            }
            _ => unreachable!("checked tag"),
        }
    }

    Ok(keys)
}
