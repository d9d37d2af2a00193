//! Typed MP4 box tree.
//!
//! Each box type is a struct owning its decoded fields and, for containers,
//! its children. [`Boxes`] is the root of a decoded file.

pub mod avcc;
pub mod esds;
pub mod ftyp;
pub mod mdat;
pub mod mdia;
pub mod minf;
pub mod moov;
pub mod stbl;
pub mod stsd;
pub mod trak;
pub mod udta;

pub use avcc::{AvcCBox, AvcDecoderConfigurationRecord};
pub use esds::EsdsBox;
pub use ftyp::FtypBox;
pub use mdat::{FreeBox, MdatBox};
pub use mdia::{HdlrBox, MdhdBox, MdiaBox};
pub use minf::{DinfBox, DrefBox, MinfBox, SmhdBox, VmhdBox};
pub use moov::{MoovBox, MvhdBox};
pub use stbl::{Co64Box, CttsBox, StblBox, StcoBox, StscBox, StssBox, StszBox, SttsBox};
pub use stsd::{AudioSampleEntry, SampleEntry, StsdBox, VisualSampleEntry};
pub use trak::{EdtsBox, ElstBox, TkhdBox, TrakBox};
pub use udta::{CprtBox, MetaBox, UdtaBox};

use crate::boxes::BoxHeader;
use crate::error::{ParseError, Result};
use crate::known_boxes::KnownBox;
use crate::parser::{parse_box, read_box_header};
use crate::registry::{Container, Dispatch, decode_into, decode_push};
use crate::util::ByteCursor;
use byteorder::{BigEndian, ReadBytesExt};
use serde::Serialize;
use std::io::Read;

/// A decoded MP4 file.
///
/// Created empty, then filled by [`Boxes::parse`] as each top-level box is
/// committed. Boxes decoded before a failure stay in place.
#[derive(Debug, Default, Serialize)]
pub struct Boxes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ftyp: Option<FtypBox>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub free: Vec<FreeBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mdat: Option<MdatBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moov: Option<MoovBox>,
}

impl Boxes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode top-level boxes until the source is exhausted.
    pub fn parse(&mut self, r: &mut dyn Read) -> Result<()> {
        let mut offset = 0u64;
        loop {
            let mut hdr = match read_box_header(r, offset) {
                Err(ParseError::EndOfStream) => return Ok(()),
                other => other?,
            };
            if hdr.is_open_ended() {
                let mut rest = Vec::new();
                r.read_to_end(&mut rest)?;
                hdr.resolve_open_ended(rest.len() as u64);
                return parse_box(self, hdr, &mut rest.as_slice());
            }
            offset += hdr.box_size();
            parse_box(self, hdr, r)?;
        }
    }

    /// Tracks of the movie, in file order.
    pub fn tracks(&self) -> &[TrakBox] {
        self.moov.as_ref().map(|m| m.trak.as_slice()).unwrap_or(&[])
    }
}

impl Container for Boxes {
    fn create_child(&mut self, hdr: BoxHeader, r: &mut dyn Read) -> Result<Dispatch> {
        match KnownBox::from(hdr.typ) {
            KnownBox::Ftyp => decode_into(&mut self.ftyp, FtypBox::new(hdr), r),
            KnownBox::Free | KnownBox::Skip => decode_push(&mut self.free, FreeBox::new(hdr), r),
            KnownBox::Mdat => decode_into(&mut self.mdat, MdatBox::new(hdr), r),
            KnownBox::Moov => decode_into(&mut self.moov, MoovBox::new(hdr), r),
            _ => Ok(Dispatch::Unknown),
        }
    }
}

// ---------- Helpers ----------

/// A time or duration that is 8 bytes wide in version 1 boxes and 4 bytes otherwise.
fn read_versioned(c: &mut ByteCursor, version: u8) -> Result<u64> {
    Ok(if version == 1 {
        c.read_u64::<BigEndian>()?
    } else {
        c.read_u32::<BigEndian>()? as u64
    })
}

/// ISO-639-2/T language packed as three 5-bit letters offset from 0x60.
fn lang_from_u16(code: u16) -> String {
    if code == 0 {
        return "und".to_string();
    }
    let c1 = ((code >> 10) & 0x1F) as u8 + 0x60;
    let c2 = ((code >> 5) & 0x1F) as u8 + 0x60;
    let c3 = (code & 0x1F) as u8 + 0x60;
    format!("{}{}{}", c1 as char, c2 as char, c3 as char)
}

/// Text up to the first NUL, or all of it.
fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
