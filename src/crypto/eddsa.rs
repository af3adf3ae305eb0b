use signature::{Signer, Verifier};

use crate::errors::{Error, Result};
use crate::types::Mpi;

/// EdDSA over Curve25519, in the legacy OpenPGP framing: the public point is
/// an MPI of `0x40` followed by the 32 compressed octets, the signature is
/// the pair of MPIs `r`, `s`.
/// Ref: <https://datatracker.ietf.org/doc/html/draft-koch-eddsa-for-openpgp-00>

/// Produce an EdDSA signature over an externally computed digest.
pub fn sign(secret: &[u8], digest: &[u8]) -> Result<Vec<Mpi>> {
    let raw: [u8; 32] = secret
        .try_into()
        .map_err(|_| Error::CryptoFailure {
            message: "invalid eddsa secret length".to_string(),
        })?;
    let key = ed25519_dalek::SigningKey::from_bytes(&raw);

    let sig = key.sign(digest).to_bytes();
    let (r, s) = sig.split_at(32);

    Ok(vec![Mpi::from_slice(r), Mpi::from_slice(s)])
}

/// Verify an EdDSA signature against a digest.
pub fn verify(q: &Mpi, digest: &[u8], r: &Mpi, s: &Mpi) -> Result<()> {
    let q = q.as_bytes();
    ensure!(
        q.len() == 33 && q[0] == 0x40,
        "invalid eddsa public point encoding"
    );

    let public: [u8; 32] = q[1..].try_into().expect("length checked");
    let key = ed25519_dalek::VerifyingKey::from_bytes(&public)?;

    let mut sig = [0u8; 64];
    sig[..32].copy_from_slice(&r.to_padded(32)?);
    sig[32..].copy_from_slice(&s.to_padded(32)?);

    key.verify(digest, &ed25519_dalek::Signature::from_bytes(&sig))
        .map_err(|_| Error::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::crypto::hash::HashAlgorithm;

    #[test]
    fn test_sign_verify() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut secret = [0u8; 32];
        rng.fill_bytes(&mut secret);

        let signing = ed25519_dalek::SigningKey::from_bytes(&secret);
        let mut q = vec![0x40];
        q.extend_from_slice(signing.verifying_key().as_bytes());
        let q = Mpi::from_slice(&q);

        let digest = HashAlgorithm::SHA2_512.digest(b"sign me").unwrap();
        let sig = sign(&secret, &digest).unwrap();
        assert_eq!(sig.len(), 2);

        verify(&q, &digest, &sig[0], &sig[1]).unwrap();

        let wrong = HashAlgorithm::SHA2_512.digest(b"not me").unwrap();
        assert!(verify(&q, &wrong, &sig[0], &sig[1]).is_err());
    }
}
