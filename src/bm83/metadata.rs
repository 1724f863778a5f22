//! Reassembly of track metadata from a get-element-attributes reply.
//!
//! Reply layout (offsets from DB0):
//!
//! ```text
//! [0..11)  AVC header (database, ctype, subunit, opcode, company id, pdu, ...)
//! [11]     attribute count
//! [12..]   per attribute:
//!            3 bytes  padding (upper bytes of the 32-bit attribute id)
//!            1 byte   attribute id
//!            2 bytes  character set (UTF-8 assumed)
//!            2 bytes  value length, big-endian
//!            n bytes  value
//! ```

use super::protocol::element_attribute;
use super::state::{copy_text, Metadata};
use crate::error::Error;
use crate::{log_debug, log_warn};

const ATTRIBUTE_COUNT_OFFSET: usize = 11;

/// Bounds-checked forward reader over a payload.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    fn skip(&mut self, n: usize) -> Option<()> {
        self.take(n).map(|_| ())
    }

    fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn u16_be(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_be_bytes([b[0], b[1]]))
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.buf.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }
}

/// Replace `metadata` with the attributes carried in `payload`.
///
/// Returns `Error::FieldTruncated` when any value had to be shortened; the
/// other fields are still filled in.
pub fn assemble(payload: &[u8], metadata: &mut Metadata) -> Result<(), Error> {
    metadata.clear();

    let Some(&count) = payload.get(ATTRIBUTE_COUNT_OFFSET) else {
        return Ok(());
    };

    let mut reader = Reader::new(payload, ATTRIBUTE_COUNT_OFFSET + 1);
    let mut result = Ok(());

    for _ in 0..count {
        let Some((kind, value)) = next_attribute(&mut reader) else {
            log_warn!("BT: Metadata attribute runs past frame end");
            break;
        };
        let field = match kind {
            element_attribute::TITLE => &mut metadata.title,
            element_attribute::ARTIST => &mut metadata.artist,
            element_attribute::ALBUM => &mut metadata.album,
            _ => continue,
        };
        if let Err(e) = copy_text(field, value) {
            result = Err(e);
        }
    }

    log_debug!(
        "BT: title={},artist={},album={}",
        metadata.title.as_str(),
        metadata.artist.as_str(),
        metadata.album.as_str()
    );
    result
}

fn next_attribute<'a>(reader: &mut Reader<'a>) -> Option<(u8, &'a [u8])> {
    reader.skip(3)?;
    let kind = reader.u8()?;
    reader.skip(2)?;
    let len = reader.u16_be()?;
    let value = reader.take(usize::from(len))?;
    Some((kind, value))
}
