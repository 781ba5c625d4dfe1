use crate::error::{Error, Result};
use crate::tagged::{self, TaggedRecord, TaggedWriter};
use crate::wire;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

const FIELD_IS_OVERFLOWS: u64 = 1;
const FIELD_BUCKET_NUM: u64 = 2;

/// `bucket_num` value meaning "not applicable".
pub const NO_BUCKET: i32 = -1;

/// Per-block metadata sent ahead of the block body.
///
/// `is_overflows` and `bucket_num` describe two-level aggregation on the
/// server: whether the block holds rows that overflowed the grouping limit,
/// and which bucket it belongs to. They are opaque here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMetadata {
    pub is_overflows: bool,
    pub bucket_num: i32,
}

impl Default for BlockMetadata {
    fn default() -> Self {
        Self {
            is_overflows: false,
            bucket_num: NO_BUCKET,
        }
    }
}

impl BlockMetadata {
    pub fn new(is_overflows: bool, bucket_num: i32) -> Self {
        Self {
            is_overflows,
            bucket_num,
        }
    }

    pub fn write<B: BufMut>(&self, buf: &mut B) {
        tagged::encode_record(self, buf);
    }

    /// Decode fields from `buf` up to the terminator, leaving any following
    /// bytes unread.
    pub fn read<B: Buf>(&mut self, buf: &mut B) -> Result<()> {
        tagged::decode_record(self, buf)
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(8);
        self.write(&mut buf);
        buf.freeze()
    }

    /// Decode a standalone record. Bytes after the terminator are an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = bytes;
        let mut metadata = Self::default();
        metadata.read(&mut cursor)?;
        if cursor.has_remaining() {
            return Err(Error::Decode(format!(
                "{} trailing bytes after block metadata",
                cursor.remaining()
            )));
        }
        Ok(metadata)
    }
}

impl TaggedRecord for BlockMetadata {
    fn write_fields<B: BufMut>(&self, writer: &mut TaggedWriter<'_, B>) {
        writer
            .field_bool(FIELD_IS_OVERFLOWS, self.is_overflows)
            .field_i32(FIELD_BUCKET_NUM, self.bucket_num);
    }

    fn read_field<B: Buf>(&mut self, tag: u64, buf: &mut B) -> Result<()> {
        match tag {
            FIELD_IS_OVERFLOWS => self.is_overflows = wire::read_u8(buf)? != 0,
            FIELD_BUCKET_NUM => self.bucket_num = wire::read_i32(buf)?,
            other => return Err(Error::UnknownTag(other)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let metadata = BlockMetadata::default();
        assert!(!metadata.is_overflows);
        assert_eq!(metadata.bucket_num, -1);
    }

    #[test]
    fn test_wire_layout() {
        let bytes = BlockMetadata::default().to_bytes();
        assert_eq!(&bytes[..], &[1u8, 0, 2, 0xFF, 0xFF, 0xFF, 0xFF, 0]);

        let bytes = BlockMetadata::new(true, 5).to_bytes();
        assert_eq!(&bytes[..], &[1u8, 1, 2, 5, 0, 0, 0, 0]);
    }

    #[test]
    fn test_round_trip_extremes() {
        for is_overflows in [false, true] {
            for bucket_num in [0, -1, 1, i32::MIN, i32::MAX] {
                let original = BlockMetadata::new(is_overflows, bucket_num);
                let decoded = BlockMetadata::from_bytes(&original.to_bytes()).unwrap();
                assert_eq!(decoded, original);
            }
        }
    }

    #[test]
    fn test_absent_fields_keep_defaults() {
        let metadata = BlockMetadata::from_bytes(&[0]).unwrap();
        assert_eq!(metadata, BlockMetadata::default());

        let metadata = BlockMetadata::from_bytes(&[2, 7, 0, 0, 0, 0]).unwrap();
        assert_eq!(metadata, BlockMetadata::new(false, 7));
    }

    #[test]
    fn test_nonzero_flag_byte_is_true() {
        let metadata = BlockMetadata::from_bytes(&[1, 0x02, 0]).unwrap();
        assert!(metadata.is_overflows);
    }

    #[test]
    fn test_unknown_tag() {
        let result = BlockMetadata::from_bytes(&[3, 0]);
        assert!(matches!(result, Err(Error::UnknownTag(3))));
    }

    #[test]
    fn test_truncated_input() {
        let bytes = BlockMetadata::new(true, 42).to_bytes();
        for len in 0..bytes.len() {
            let result = BlockMetadata::from_bytes(&bytes[..len]);
            assert!(result.unwrap_err().is_decode(), "prefix of {} bytes", len);
        }
    }

    #[test]
    fn test_read_stops_at_terminator() {
        let mut buf = BytesMut::new();
        BlockMetadata::new(true, 3).write(&mut buf);
        buf.put_slice(b"body");

        let mut cursor = &buf[..];
        let mut metadata = BlockMetadata::default();
        metadata.read(&mut cursor).unwrap();
        assert_eq!(metadata, BlockMetadata::new(true, 3));
        assert_eq!(cursor, b"body");

        assert!(matches!(
            BlockMetadata::from_bytes(&buf),
            Err(Error::Decode(_))
        ));
    }
}
