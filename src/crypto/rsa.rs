use num_bigint::BigUint;
use rand::{CryptoRng, Rng};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};

use crate::crypto::hash::HashAlgorithm;
use crate::errors::{Error, Result};
use crate::types::Mpi;

fn public_key(n: &Mpi, e: &Mpi) -> Result<RsaPublicKey> {
    RsaPublicKey::new(
        BigUint::from_bytes_be(n.as_bytes()),
        BigUint::from_bytes_be(e.as_bytes()),
    )
    .map_err(Into::into)
}

/// PKCS#1 v1.5 signature scheme for the given hash, carrying the DigestInfo
/// prefix the hash is registered under.
fn signature_scheme(hash: HashAlgorithm) -> Result<Pkcs1v15Sign> {
    match hash {
        HashAlgorithm::MD5 => Ok(Pkcs1v15Sign::new::<md5::Md5>()),
        HashAlgorithm::SHA1 => Ok(Pkcs1v15Sign::new::<sha1::Sha1>()),
        HashAlgorithm::SHA2_224 => Ok(Pkcs1v15Sign::new::<sha2::Sha224>()),
        HashAlgorithm::SHA2_256 => Ok(Pkcs1v15Sign::new::<sha2::Sha256>()),
        HashAlgorithm::SHA2_384 => Ok(Pkcs1v15Sign::new::<sha2::Sha384>()),
        HashAlgorithm::SHA2_512 => Ok(Pkcs1v15Sign::new::<sha2::Sha512>()),
        _ => Err(Error::CryptoUnavailable {
            message: format!("rsa signatures with {hash:?}"),
        }),
    }
}

/// RSA encryption using PKCS#1 v1.5 padding.
pub fn encrypt<R: CryptoRng + Rng>(
    rng: &mut R,
    n: &Mpi,
    e: &Mpi,
    plaintext: &[u8],
) -> Result<Vec<Mpi>> {
    let key = public_key(n, e)?;
    let data = key.encrypt(rng, Pkcs1v15Encrypt, plaintext)?;

    Ok(vec![Mpi::from_slice(&data)])
}

/// RSA decryption using PKCS#1 v1.5 padding. The ciphertext is the single
/// MPI of a PKESK packet.
pub fn decrypt(priv_key: &RsaPrivateKey, mpis: &[Mpi]) -> Result<Vec<u8>> {
    ensure_eq!(mpis.len(), 1, "rsa ciphertext is a single mpi");

    // the mpi encoding strips leading zeros, the raw ciphertext is as wide
    // as the modulus
    let ciphertext = mpis[0].to_padded(priv_key.size())?;
    let m = priv_key.decrypt(Pkcs1v15Encrypt, &ciphertext)?;

    Ok(m)
}

/// Produce an RSA, PKCS#1 v1.5 padded signature over an externally computed
/// digest.
pub fn sign(priv_key: &RsaPrivateKey, hash: HashAlgorithm, digest: &[u8]) -> Result<Vec<Mpi>> {
    let sig = priv_key.sign(signature_scheme(hash)?, digest)?;

    Ok(vec![Mpi::from_slice(&sig)])
}

/// Verify an RSA, PKCS#1 v1.5 padded signature.
pub fn verify(n: &Mpi, e: &Mpi, hash: HashAlgorithm, digest: &[u8], sig: &Mpi) -> Result<()> {
    let key = public_key(n, e)?;
    let sig = sig.to_padded(key.size())?;

    key.verify(signature_scheme(hash)?, digest, &sig)
        .map_err(|_| Error::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let key = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let n = Mpi::from_slice(&key.n().to_bytes_be());
        let e = Mpi::from_slice(&key.e().to_bytes_be());

        let mpis = encrypt(&mut rng, &n, &e, b"top secret").unwrap();
        assert_eq!(mpis.len(), 1);

        let back = decrypt(&key, &mpis).unwrap();
        assert_eq!(back, b"top secret");
    }

    #[test]
    fn test_sign_verify() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let key = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let n = Mpi::from_slice(&key.n().to_bytes_be());
        let e = Mpi::from_slice(&key.e().to_bytes_be());

        let digest = HashAlgorithm::SHA2_256.digest(b"signed data").unwrap();
        let sig = sign(&key, HashAlgorithm::SHA2_256, &digest).unwrap();

        verify(&n, &e, HashAlgorithm::SHA2_256, &digest, &sig[0]).unwrap();

        let other = HashAlgorithm::SHA2_256.digest(b"tampered").unwrap();
        assert!(verify(&n, &e, HashAlgorithm::SHA2_256, &other, &sig[0]).is_err());
    }
}
