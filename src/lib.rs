#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, clippy::all)]

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

#[macro_use]
pub mod errors;

pub mod api;
pub mod armor;
pub mod composed;
pub mod crypto;
pub mod de;
pub mod packet;
pub mod ser;
pub mod types;
pub mod util;

// the common surface, re-exported for easier use
pub use self::composed::{
    Deserializable, Message, PublicOrSecret, SignedPublicKey, SignedSecretKey,
    StandaloneSignature,
};
pub use self::errors::{Error, Result};

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
