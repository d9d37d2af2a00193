use crate::boxes::{BoxHeader, Extent, FourCC};
use crate::error::{ParseError, Result};
use crate::known_boxes::KnownBox;
use crate::registry::{Container, Dispatch};
use crate::util::read_exact_or_eof;
use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, warn};
use std::io::{self, Read};

/// Read a box envelope. `start` is the stream offset of its first byte.
///
/// Returns `EndOfStream` when the source is exhausted before the first byte.
pub fn read_box_header(r: &mut dyn Read, start: u64) -> Result<BoxHeader> {
    let mut size = [0u8; 4];
    if !read_exact_or_eof(r, &mut size)? {
        return Err(ParseError::EndOfStream);
    }
    let size32 = u32::from_be_bytes(size);
    let mut typ = [0u8; 4];
    r.read_exact(&mut typ)?;

    let large_size = if size32 == 1 {
        Some(r.read_u64::<BigEndian>()?)
    } else {
        None
    };

    let mut user_type = None;
    if &typ == b"uuid" {
        let mut u = [0u8; 16];
        r.read_exact(&mut u)?;
        user_type = Some(u);
    }

    BoxHeader::from_envelope(size32, FourCC(typ), large_size, user_type, start)
}

/// Decode one box whose header has been read, or skip its payload if
/// `parent` does not know the type.
pub fn parse_box<P: Container + ?Sized>(parent: &mut P, hdr: BoxHeader, r: &mut dyn Read) -> Result<()> {
    let typ = hdr.typ;
    let payload_size = hdr.payload_size;
    let kind = if KnownBox::from(typ).is_container() { "container" } else { "box" };
    debug!("{} {} at {} ({} payload bytes)", kind, typ, hdr.start, payload_size);

    let mut payload = Read::take(&mut *r, payload_size);
    match parent.create_child(hdr, &mut payload)? {
        Dispatch::Parsed => {
            let left = payload.limit();
            if left != 0 {
                return Err(ParseError::FieldAccounting {
                    typ,
                    parsed: payload_size - left,
                    expected: payload_size,
                });
            }
        }
        Dispatch::Unknown => {
            warn!("{}; skipping {} bytes", ParseError::UnknownBoxType(typ), payload_size);
            let skipped = io::copy(&mut payload, &mut io::sink())?;
            if skipped < payload_size {
                return Err(ParseError::TruncatedInput(format!(
                    "{} payload ends after {} of {} bytes",
                    typ, skipped, payload_size
                )));
            }
        }
    }
    Ok(())
}

/// Walk the child boxes filling `extent`, handing each to `parent`.
///
/// Returns how many children were walked, skipped ones included. The
/// children's box sizes must add up to `extent.size` exactly.
pub fn parse_children<P: Container + ?Sized>(
    parent: &mut P,
    r: &mut dyn Read,
    extent: Extent,
) -> Result<usize> {
    let mut parsed = 0u64;
    let mut count = 0;
    while parsed < extent.size {
        let left = extent.size - parsed;
        if left < 8 {
            return Err(ParseError::SizeMismatch {
                typ: extent.typ,
                parsed,
                expected: extent.size,
            });
        }
        let mut hdr = match read_box_header(r, extent.start + parsed) {
            Err(ParseError::EndOfStream) => {
                return Err(ParseError::TruncatedInput(format!(
                    "{} ends {} bytes early",
                    extent.typ, left
                )));
            }
            other => other?,
        };
        count += 1;

        if hdr.is_open_ended() {
            if !extent.open_ended {
                return Err(ParseError::OpenEndedBox(hdr.typ));
            }
            let available = left.checked_sub(hdr.header_size).ok_or(ParseError::SizeMismatch {
                typ: extent.typ,
                parsed: parsed + hdr.header_size,
                expected: extent.size,
            })?;
            hdr.resolve_open_ended(available);
            parse_box(parent, hdr, r)?;
            break;
        }

        let box_size = hdr.box_size();
        if box_size > left {
            return Err(ParseError::SizeMismatch {
                typ: extent.typ,
                parsed: parsed + box_size,
                expected: extent.size,
            });
        }
        parse_box(parent, hdr, r)?;
        parsed += box_size;
    }
    Ok(count)
}
