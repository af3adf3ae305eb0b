mod encrypted_secret;
mod plain_secret;
mod public;
mod secret;

pub use self::encrypted_secret::EncryptedSecretParams;
pub use self::plain_secret::PlainSecretParams;
pub use self::public::PublicParams;
pub use self::secret::SecretParams;
