use std::io;

use rand::{CryptoRng, Rng};

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::Result;
use crate::types::{KeyId, Mpi, SecretKeyRepr};

/// Shared surface of public and secret key packets.
pub trait KeyTrait {
    /// The 20-octet V4 fingerprint of the public portion.
    fn fingerprint(&self) -> Vec<u8>;
    /// The last 8 octets of the fingerprint.
    fn key_id(&self) -> KeyId;
    fn algorithm(&self) -> PublicKeyAlgorithm;

    fn is_signing_key(&self) -> bool {
        self.algorithm().is_signing()
    }

    fn is_encryption_key(&self) -> bool {
        self.algorithm().is_encryption()
    }
}

impl<T: KeyTrait> KeyTrait for &T {
    fn fingerprint(&self) -> Vec<u8> {
        (*self).fingerprint()
    }

    fn key_id(&self) -> KeyId {
        (*self).key_id()
    }

    fn algorithm(&self) -> PublicKeyAlgorithm {
        (*self).algorithm()
    }
}

pub trait PublicKeyTrait: KeyTrait {
    /// Verify a signature over an externally computed digest.
    fn verify_signature(&self, hash: HashAlgorithm, digest: &[u8], sig: &[Mpi]) -> Result<()>;

    /// Wrap a session key payload to this key.
    fn encrypt<R: CryptoRng + Rng>(&self, rng: &mut R, plain: &[u8]) -> Result<Vec<Mpi>>;

    /// Write the `0x99 | len16 | body` framing under which key material is
    /// hashed into signatures (RFC 4880 §5.2.4).
    fn serialize_for_hashing(&self, writer: &mut impl io::Write) -> Result<()>;
}

pub trait SecretKeyTrait: KeyTrait {
    type PublicKey;

    /// Run `work` with the unlocked secret material. For locked keys the
    /// passphrase callback is consulted; `None` means no passphrase was
    /// available and surfaces as `PassphraseRequired`.
    fn unlock<F, G, T>(&self, pw: F, work: G) -> Result<T>
    where
        F: FnOnce() -> Option<String>,
        G: FnOnce(&SecretKeyRepr) -> Result<T>;

    /// Sign an externally computed digest.
    fn create_signature<F>(&self, key_pw: F, hash: HashAlgorithm, digest: &[u8]) -> Result<Vec<Mpi>>
    where
        F: FnOnce() -> Option<String>,
    {
        self.unlock(key_pw, |repr| repr.create_signature(hash, digest))
    }

    /// The public half of this key.
    fn public_key(&self) -> Self::PublicKey;
}
