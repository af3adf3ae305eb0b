//! Composed values assembled from packet streams: transferable keys, the
//! message grammar and standalone signatures, plus the pipeline that
//! encrypts, decrypts, signs and verifies.

pub mod key;
mod message;
mod message_parser;
mod shared;
mod signature;

pub use self::key::{
    find_key, DecryptionKeyRef, EncryptionKeyRef, PublicOrSecret, SignedKeyDetails,
    SignedPublicKey, SignedPublicSubKey, SignedSecretKey, SignedSecretSubKey, SignedUser,
    SignedUserAttribute,
};
pub use self::message::{preferred_symmetric_algorithm, Edata, Esk, Message};
pub use self::shared::Deserializable;
pub use self::signature::StandaloneSignature;
