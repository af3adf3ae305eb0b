mod de;
mod ser;
mod subpacket;
mod types;

pub use self::subpacket::{subpackets, Subpacket, SubpacketData, SubpacketType};
pub use self::types::{KeyFlags, Signature, SignatureConfig, SignatureType, SignatureVersion};
