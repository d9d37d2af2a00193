use crate::boxes::BoxHeader;
use crate::error::Result;
use log::warn;
use std::io::Read;

/// A decoded box node.
pub trait Mp4Box {
    fn header(&self) -> &BoxHeader;

    /// Decode the payload. `r` yields exactly the box's payload bytes.
    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()>;
}

/// What a container did with a child header offered to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Parsed,
    Unknown,
}

/// A node whose payload holds child boxes.
///
/// Implementations match on the child's type, construct it directly inside
/// their own storage and decode it there; anything they do not recognise is
/// reported as `Dispatch::Unknown` without touching `r`.
pub trait Container {
    fn create_child(&mut self, hdr: BoxHeader, r: &mut dyn Read) -> Result<Dispatch>;
}

/// Store `child` in a singleton slot, then decode it in place.
pub fn decode_into<B: Mp4Box>(slot: &mut Option<B>, child: B, r: &mut dyn Read) -> Result<Dispatch> {
    if let Some(old) = slot {
        warn!("duplicate {} box replaces the earlier one", old.header().typ);
    }
    slot.insert(child).parse_payload(r)?;
    Ok(Dispatch::Parsed)
}

/// Append `child` to a repeatable slot, then decode it in place.
pub fn decode_push<B: Mp4Box>(list: &mut Vec<B>, child: B, r: &mut dyn Read) -> Result<Dispatch> {
    list.push(child);
    let last = list.len() - 1;
    list[last].parse_payload(r)?;
    Ok(Dispatch::Parsed)
}
