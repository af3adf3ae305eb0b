use std::fmt;

use crate::errors::Result;

/// The last eight octets of a key fingerprint.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct KeyId([u8; 8]);

impl KeyId {
    pub fn from_slice(input: &[u8]) -> Result<KeyId> {
        ensure_eq!(input.len(), 8, "invalid key id length");

        let mut r = [0u8; 8];
        r.copy_from_slice(input);
        Ok(KeyId(r))
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// The wildcard id (all zeros), addressing an anonymous recipient.
    pub fn is_wildcard(&self) -> bool {
        self.0 == [0u8; 8]
    }
}

impl AsRef<[u8]> for KeyId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", hex::encode(self.0))
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = hex::encode(self.0);
        out.make_ascii_uppercase();
        write!(f, "{out}")
    }
}
