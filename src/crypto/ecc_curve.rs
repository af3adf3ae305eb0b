/// Named curves used by ECDH / ECDSA / EdDSA key material.
/// Ref: <https://tools.ietf.org/html/rfc6637#section-11>
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ECCCurve {
    Curve25519,
    Ed25519,
    P256,
    P384,
    P521,
    /// Any OID we do not know; kept raw so the key still round-trips.
    Unknown(Vec<u8>),
}

impl ECCCurve {
    /// The ASN.1 OID, as serialized into key packets.
    pub fn oid(&self) -> Vec<u8> {
        match self {
            ECCCurve::Curve25519 => vec![0x2B, 0x06, 0x01, 0x04, 0x01, 0x97, 0x55, 0x01, 0x05, 0x01],
            ECCCurve::Ed25519 => vec![0x2B, 0x06, 0x01, 0x04, 0x01, 0xDA, 0x47, 0x0F, 0x01],
            ECCCurve::P256 => vec![0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07],
            ECCCurve::P384 => vec![0x2B, 0x81, 0x04, 0x00, 0x22],
            ECCCurve::P521 => vec![0x2B, 0x81, 0x04, 0x00, 0x23],
            ECCCurve::Unknown(oid) => oid.clone(),
        }
    }
}

/// Map a serialized OID back to the curve. Total: unknown OIDs are preserved.
pub fn ecc_curve_from_oid(oid: &[u8]) -> ECCCurve {
    for known in [
        ECCCurve::Curve25519,
        ECCCurve::Ed25519,
        ECCCurve::P256,
        ECCCurve::P384,
        ECCCurve::P521,
    ] {
        if known.oid() == oid {
            return known;
        }
    }

    ECCCurve::Unknown(oid.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oid_roundtrip() {
        for curve in [
            ECCCurve::Curve25519,
            ECCCurve::Ed25519,
            ECCCurve::P256,
            ECCCurve::P384,
            ECCCurve::P521,
            ECCCurve::Unknown(vec![1, 2, 3]),
        ] {
            assert_eq!(ecc_curve_from_oid(&curve.oid()), curve);
        }
    }
}
