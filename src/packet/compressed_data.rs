use std::io::{self, Read, Write};

use byteorder::WriteBytesExt;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::de::Deserialize;
use crate::errors::Result;
use crate::packet::packet_trait::PacketTrait;
use crate::ser::Serialize;
use crate::types::{CompressionAlgorithm, Tag, Version};

/// Compressed Data Packet. The body is a compressed packet stream.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-5.6>
#[derive(Clone, PartialEq, Eq)]
pub struct CompressedData {
    packet_version: Version,
    compression_algorithm: CompressionAlgorithm,
    compressed_data: Vec<u8>,
}

impl CompressedData {
    /// Compress a serialized packet stream, ZLIB by default.
    pub fn from_compressed(alg: CompressionAlgorithm, data: &[u8]) -> Result<Self> {
        let compressed_data = match alg {
            CompressionAlgorithm::Uncompressed => data.to_vec(),
            CompressionAlgorithm::ZIP => {
                let mut enc =
                    flate2::write::DeflateEncoder::new(Vec::new(), Compression::default());
                enc.write_all(data)?;
                enc.finish()?
            }
            CompressionAlgorithm::ZLIB => {
                let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
                enc.write_all(data)?;
                enc.finish()?
            }
            CompressionAlgorithm::BZip2 => {
                let mut enc =
                    bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
                enc.write_all(data)?;
                enc.finish()?
            }
            CompressionAlgorithm::Other(_) => {
                unsupported_err!("compression algorithm {:?}", alg)
            }
        };

        Ok(CompressedData {
            packet_version: Default::default(),
            compression_algorithm: alg,
            compressed_data,
        })
    }

    pub fn compression_algorithm(&self) -> CompressionAlgorithm {
        self.compression_algorithm
    }

    pub fn compressed_data(&self) -> &[u8] {
        &self.compressed_data
    }

    /// Inflate the contained packet stream.
    pub fn decompress(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        match self.compression_algorithm {
            CompressionAlgorithm::Uncompressed => {
                out.extend_from_slice(&self.compressed_data);
            }
            CompressionAlgorithm::ZIP => {
                DeflateDecoder::new(&self.compressed_data[..]).read_to_end(&mut out)?;
            }
            CompressionAlgorithm::ZLIB => {
                ZlibDecoder::new(&self.compressed_data[..]).read_to_end(&mut out)?;
            }
            CompressionAlgorithm::BZip2 => {
                bzip2::read::BzDecoder::new(&self.compressed_data[..]).read_to_end(&mut out)?;
            }
            CompressionAlgorithm::Other(_) => {
                unsupported_err!("compression algorithm {:?}", self.compression_algorithm)
            }
        }

        Ok(out)
    }
}

impl Deserialize for CompressedData {
    fn from_slice(packet_version: Version, input: &[u8]) -> Result<Self> {
        ensure!(!input.is_empty(), "input too short");

        Ok(CompressedData {
            packet_version,
            compression_algorithm: CompressionAlgorithm::from(input[0]),
            compressed_data: input[1..].to_vec(),
        })
    }
}

impl Serialize for CompressedData {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.compression_algorithm.into())?;
        writer.write_all(&self.compressed_data)?;
        Ok(())
    }
}

impl PacketTrait for CompressedData {
    fn packet_version(&self) -> Version {
        self.packet_version
    }

    fn tag(&self) -> Tag {
        Tag::CompressedData
    }
}

impl std::fmt::Debug for CompressedData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressedData")
            .field("packet_version", &self.packet_version)
            .field("compression_algorithm", &self.compression_algorithm)
            .field("compressed_data", &hex::encode(&self.compressed_data))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_roundtrip() {
        for alg in [
            CompressionAlgorithm::Uncompressed,
            CompressionAlgorithm::ZIP,
            CompressionAlgorithm::ZLIB,
            CompressionAlgorithm::BZip2,
        ] {
            let data = b"a packet stream, repeated: a packet stream".to_vec();
            let packet = CompressedData::from_compressed(alg, &data).unwrap();
            assert_eq!(packet.decompress().unwrap(), data, "{alg:?}");

            let buf = packet.to_bytes().unwrap();
            let back = CompressedData::from_slice(Version::New, &buf).unwrap();
            assert_eq!(packet, back);
        }
    }
}
