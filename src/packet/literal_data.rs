use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use nom::bytes::streaming::take;
use nom::combinator::{map, map_opt, rest};
use nom::number::streaming::{be_u32, be_u8};
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::de::Deserialize;
use crate::errors::Result;
use crate::packet::packet_trait::PacketTrait;
use crate::ser::Serialize;
use crate::types::{Tag, Version};
use crate::util::normalize_crlf;

/// Literal Data Packet
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.9>
#[derive(Clone, PartialEq, Eq)]
pub struct LiteralData {
    packet_version: Version,
    mode: DataMode,
    /// File name hint, at most 255 octets.
    file_name: Vec<u8>,
    created: DateTime<Utc>,
    data: Vec<u8>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum DataMode {
    Binary = b'b',
    Text = b't',
    Utf8 = b'u',
    /// Deprecated local mode marker.
    Local = b'l',

    #[num_enum(catch_all)]
    Other(u8),
}

impl LiteralData {
    /// Create a binary literal with the current timestamp.
    pub fn from_bytes(file_name: &[u8], data: Vec<u8>) -> Self {
        LiteralData {
            packet_version: Default::default(),
            mode: DataMode::Binary,
            file_name: file_name.to_vec(),
            created: Utc::now().trunc_subsecs(0),
            data,
        }
    }

    /// Create a text literal with the current timestamp.
    pub fn from_str(file_name: &[u8], data: &str) -> Self {
        LiteralData {
            packet_version: Default::default(),
            mode: DataMode::Utf8,
            file_name: file_name.to_vec(),
            created: Utc::now().trunc_subsecs(0),
            data: data.as_bytes().to_vec(),
        }
    }

    pub fn mode(&self) -> DataMode {
        self.mode
    }

    pub fn is_binary(&self) -> bool {
        self.mode == DataMode::Binary
    }

    pub fn file_name(&self) -> &[u8] {
        &self.file_name
    }

    pub fn created(&self) -> &DateTime<Utc> {
        &self.created
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// The octets a signature over this literal covers: text modes are
    /// CRLF normalized, binary is hashed as is.
    pub fn signable_data(&self) -> Vec<u8> {
        match self.mode {
            DataMode::Binary | DataMode::Local | DataMode::Other(_) => self.data.clone(),
            DataMode::Text | DataMode::Utf8 => normalize_crlf(&self.data),
        }
    }
}

impl Deserialize for LiteralData {
    fn from_slice(packet_version: Version, input: &[u8]) -> Result<Self> {
        let (i, mode) = map(be_u8, DataMode::from)(input)?;
        let (i, name_len) = be_u8(i)?;
        let (i, file_name) = take(name_len as usize)(i)?;
        let (i, created) = map_opt(be_u32, |v| Utc.timestamp_opt(i64::from(v), 0).single())(i)?;
        let (_, data) = rest::<_, crate::errors::Error>(i)?;

        Ok(LiteralData {
            packet_version,
            mode,
            file_name: file_name.to_vec(),
            created,
            data: data.to_vec(),
        })
    }
}

impl Serialize for LiteralData {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.mode.into())?;
        writer.write_u8(self.file_name.len() as u8)?;
        writer.write_all(&self.file_name)?;
        writer.write_u32::<BigEndian>(self.created.timestamp() as u32)?;
        writer.write_all(&self.data)?;

        Ok(())
    }
}

impl PacketTrait for LiteralData {
    fn packet_version(&self) -> Version {
        self.packet_version
    }

    fn tag(&self) -> Tag {
        Tag::LiteralData
    }
}

impl std::fmt::Debug for LiteralData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiteralData")
            .field("packet_version", &self.packet_version)
            .field("mode", &self.mode)
            .field("created", &self.created)
            .field("file_name", &String::from_utf8_lossy(&self.file_name))
            .field("data", &hex::encode(&self.data))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let lit = LiteralData::from_bytes(b"hello.txt", b"Hello, World!".to_vec());
        let buf = lit.to_bytes().unwrap();
        let back = LiteralData::from_slice(Version::New, &buf).unwrap();
        assert_eq!(lit, back);
    }

    #[test]
    fn test_signable_data_text() {
        let lit = LiteralData::from_str(b"", "one\ntwo\n");
        assert_eq!(lit.signable_data(), b"one\r\ntwo\r\n".to_vec());

        let bin = LiteralData::from_bytes(b"", b"one\ntwo\n".to_vec());
        assert_eq!(bin.signable_data(), b"one\ntwo\n".to_vec());
    }
}
