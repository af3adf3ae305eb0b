use crate::ser::Serialize;
use crate::types::{Tag, Version};

/// Behavior every packet kind shares: the tag it is framed with and the
/// header form it came from (or defaults to on emit). The `Serialize` impl
/// of a packet writes the *body* only; `write_packet` adds the header.
pub trait PacketTrait: Serialize {
    fn packet_version(&self) -> Version;
    fn tag(&self) -> Tag;
}

impl<T: PacketTrait> PacketTrait for &T {
    fn packet_version(&self) -> Version {
        (*self).packet_version()
    }

    fn tag(&self) -> Tag {
        (*self).tag()
    }
}
