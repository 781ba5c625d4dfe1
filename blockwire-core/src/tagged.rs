//! Tagged-field record format.
//!
//! ```text
//! record := (tag:varint payload)* terminator:varint(0)
//! ```
//!
//! Each field is a varint tag followed by a fixed-width payload whose layout
//! is known from the tag. Tag 0 is reserved for the terminator. Payloads are
//! not length-prefixed, so a reader cannot step over a tag it does not know:
//! unknown tags are rejected with [`Error::UnknownTag`].

use crate::error::{Error, Result};
use crate::wire;
use bytes::{Buf, BufMut};
use tracing::{trace, warn};

pub const TERMINATOR: u64 = 0;

/// A record that can be written and read as a sequence of tagged fields.
pub trait TaggedRecord {
    /// Emit every field through `writer`. The terminator is written by the caller.
    fn write_fields<B: BufMut>(&self, writer: &mut TaggedWriter<'_, B>);

    /// Consume the payload of `tag` from `buf` and assign it.
    /// Must return [`Error::UnknownTag`] for tags the record does not define.
    fn read_field<B: Buf>(&mut self, tag: u64, buf: &mut B) -> Result<()>;
}

/// Appends tagged fields to a buffer.
pub struct TaggedWriter<'a, B: BufMut> {
    buf: &'a mut B,
}

impl<'a, B: BufMut> TaggedWriter<'a, B> {
    pub fn new(buf: &'a mut B) -> Self {
        Self { buf }
    }

    fn tag(&mut self, tag: u64) {
        debug_assert_ne!(tag, TERMINATOR, "tag 0 is reserved for the terminator");
        wire::write_varint(tag, self.buf);
    }

    pub fn field_u8(&mut self, tag: u64, value: u8) -> &mut Self {
        self.tag(tag);
        wire::write_u8(value, self.buf);
        self
    }

    pub fn field_bool(&mut self, tag: u64, value: bool) -> &mut Self {
        self.field_u8(tag, value as u8)
    }

    pub fn field_i32(&mut self, tag: u64, value: i32) -> &mut Self {
        self.tag(tag);
        wire::write_i32(value, self.buf);
        self
    }
}

pub fn encode_record<R: TaggedRecord, B: BufMut>(record: &R, buf: &mut B) {
    let mut writer = TaggedWriter::new(buf);
    record.write_fields(&mut writer);
    wire::write_varint(TERMINATOR, buf);
}

/// Read fields into `record` until the terminator. Fields absent from the
/// input keep their current values.
pub fn decode_record<R: TaggedRecord, B: Buf>(record: &mut R, buf: &mut B) -> Result<()> {
    loop {
        let tag = wire::read_varint(buf)
            .map_err(|e| Error::Decode(format!("reading field tag: {}", e)))?;
        if tag == TERMINATOR {
            return Ok(());
        }

        trace!(tag, "decoding tagged field");
        match record.read_field(tag, buf) {
            Ok(()) => {}
            Err(Error::UnknownTag(tag)) => {
                warn!(tag, "rejecting record with unknown field tag");
                return Err(Error::UnknownTag(tag));
            }
            Err(Error::Decode(msg)) => {
                return Err(Error::Decode(format!("field {}: {}", tag, msg)));
            }
            Err(e) => return Err(e),
        }
    }
}
