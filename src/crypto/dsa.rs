use num_bigint::traits::ModInverse;
use num_bigint::BigUint;
use num_traits::{CheckedSub, Zero};

use crate::errors::{Error, Result};

/// Implements bits2int as defined in RFC 6979 §2.3.2: interpret the leftmost
/// `qlen` bits of the digest as an integer.
fn bits_to_int(data: &[u8], q: &BigUint) -> BigUint {
    let excess_bits = (data.len() * 8).saturating_sub(q.bits());
    BigUint::from_bytes_be(data) >> excess_bits
}

/// Equivalent to `bits_to_int(data, q) % q`, one conditional subtraction is
/// enough because the input is at most qlen bits.
fn bits_to_int_mod(data: &[u8], q: &BigUint) -> BigUint {
    let tmp = bits_to_int(data, q);
    tmp.checked_sub(q).unwrap_or(tmp)
}

/// Modular inverse of `i` mod `q`; fails when `q` is not prime, which means
/// the key itself is invalid.
fn inverse(i: &BigUint, q: &BigUint) -> Result<BigUint> {
    i.mod_inverse(q)
        .and_then(|x| x.to_biguint())
        .ok_or_else(|| Error::CryptoFailure {
            message: "invalid dsa key".to_string(),
        })
}

/// Verify a DSA signature (FIPS 186-4 §4.7).
pub fn verify(
    p: &BigUint,
    q: &BigUint,
    g: &BigUint,
    y: &BigUint,
    hashed: &[u8],
    r: &BigUint,
    s: &BigUint,
) -> Result<()> {
    if !(&BigUint::zero() < r && r < q && &BigUint::zero() < s && s < q) {
        return Err(Error::InvalidSignature);
    }

    let h = bits_to_int_mod(hashed, q);

    let w = inverse(s, q)?;
    let u1 = (h * &w) % q;
    let u2 = (r * &w) % q;
    let v = ((g.modpow(&u1, p) * y.modpow(&u2, p)) % p) % q;

    if &v != r {
        return Err(Error::InvalidSignature);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use num_traits::Num;

    use super::*;

    fn hex_num(s: &str) -> BigUint {
        BigUint::from_str_radix(s, 16).unwrap()
    }

    /// Test vector from RFC 6979 appendix A.2.1 (1024 bit key, SHA-1,
    /// message "sample").
    #[test]
    fn test_verify_rfc6979_vector() {
        let p = hex_num(
            "86F5CA03DCFEB225063FF830A0C769B9DD9D6153AD91D7CE27F787C43278B447\
             E6533B86B18BED6E8A48B784A14C252C5BE0DBF60B86D6385BD2F12FB763ED88\
             73ABFD3F5BA2E0A8C0A59082EAC056935E529DAF7C610467899C77ADEDFC846C\
             881870B7B19B2B58F9BE0521A17002E3BDD6B86685EE90B3D9A1B02B782B1779",
        );
        let q = hex_num("996F967F6C8E388D9E28D01E205FBA957A5698B1");
        let g = hex_num(
            "07B0F92546150B62514BB771E2A0C0CE387F03BDA6C56B505209FF25FD3C133D\
             89BBCD97E904E09114D9A7DEFDEADFC9078EA544D2E401AEECC40BB9FBBF78FD\
             87995A10A1C27CB7789B594BA7EFB5C4326A9FE59A070E136DB77175464ADCA4\
             17BE5DCE2F40D10A46A3A3943F26AB7FD9C0398FF8C76EE0A56826A8A88F1DBD",
        );
        let y = hex_num(
            "5DF5E01DED31D0297E274E1691C192FE5868FEF9E19A84776454B100CF16F653\
             92195A38B90523E2542EE61871C0440CB87C322FC4B4D2EC5E1E7EC766E1BE8D\
             4CE935437DC11C3C8FD426338933EBFE739CB3465F4D3668C5E473508253B1E6\
             82F65CBDC4FAE93C2EA212390E54905A86E2223170B44EAA7DA5DD9FFCFB7F3B",
        );

        let hashed = crate::crypto::hash::HashAlgorithm::SHA1
            .digest(b"sample")
            .unwrap();
        let r = hex_num("2E1A0C2562B2912CAAF89186FB0F42001585DA55");
        let s = hex_num("29EFB6B0AFF2D7A68EB70CA313022253B9A88DF5");

        verify(&p, &q, &g, &y, &hashed, &r, &s).unwrap();

        // flipping the message fails
        let other = crate::crypto::hash::HashAlgorithm::SHA1
            .digest(b"sampler")
            .unwrap();
        assert!(verify(&p, &q, &g, &y, &other, &r, &s).is_err());
    }
}
