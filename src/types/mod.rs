mod compression;
mod key_id;
mod key_traits;
mod mpi;
mod packet;
mod params;
mod s2k;
mod secret_key_repr;

pub use self::compression::CompressionAlgorithm;
pub use self::key_id::KeyId;
pub use self::key_traits::{KeyTrait, PublicKeyTrait, SecretKeyTrait};
pub use self::mpi::{mpi, Mpi};
pub use self::packet::{KeyVersion, PacketLength, Tag, Version};
pub use self::params::{
    EncryptedSecretParams, PlainSecretParams, PublicParams, SecretParams,
};
pub use self::s2k::{s2k_parser, StringToKey, StringToKeyType};
pub use self::secret_key_repr::{EdDSASecretKey, SecretKeyRepr};
