mod key_parser;
mod public;
mod secret;
mod shared;

pub use self::public::{EncryptionKeyRef, SignedPublicKey, SignedPublicSubKey};
pub use self::secret::{DecryptionKeyRef, SignedSecretKey, SignedSecretSubKey};
pub use self::shared::{
    find_key, PublicOrSecret, SignedKeyDetails, SignedUser, SignedUserAttribute,
};
