//! Facade over the cryptographic primitives: block ciphers in OpenPGP CFB
//! mode, hashes, public key operations and checksums. Algorithms the crate
//! does not carry fail closed with `CryptoUnavailable`.

pub mod checksum;
pub mod dsa;
pub mod ecc_curve;
pub mod eddsa;
pub mod hash;
pub mod public_key;
pub mod rsa;
pub mod sym;

pub use self::ecc_curve::{ecc_curve_from_oid, ECCCurve};
pub use self::hash::HashAlgorithm;
pub use self::public_key::PublicKeyAlgorithm;
pub use self::sym::SymmetricKeyAlgorithm;
