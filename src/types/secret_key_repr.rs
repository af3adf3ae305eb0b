use zeroize::Zeroize;

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::{self};
use crate::errors::Result;
use crate::types::Mpi;

/// An unlocked secret key, in its operational form. Lives only inside
/// `unlock` scopes; the material is zeroed when dropped.
#[derive(Debug)]
pub enum SecretKeyRepr {
    RSA(rsa::RsaPrivateKey),
    EdDSA(EdDSASecretKey),
}

pub struct EdDSASecretKey {
    pub secret: [u8; 32],
}

impl std::fmt::Debug for EdDSASecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdDSASecretKey").finish_non_exhaustive()
    }
}

impl Drop for EdDSASecretKey {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl SecretKeyRepr {
    /// Recover an encrypted session key payload from PKESK MPIs.
    pub fn decrypt(&self, mpis: &[Mpi]) -> Result<Vec<u8>> {
        match self {
            SecretKeyRepr::RSA(key) => crypto::rsa::decrypt(key, mpis),
            SecretKeyRepr::EdDSA(_) => unsupported_err!("decryption with EdDSA"),
        }
    }

    /// Sign an externally computed digest.
    pub fn create_signature(&self, hash: HashAlgorithm, digest: &[u8]) -> Result<Vec<Mpi>> {
        match self {
            SecretKeyRepr::RSA(key) => crypto::rsa::sign(key, hash, digest),
            SecretKeyRepr::EdDSA(key) => crypto::eddsa::sign(&key.secret, digest),
        }
    }
}
