use crate::error::{ParseError, Result};
use crate::known_boxes::KnownBox;
use crate::util::hex_opt;
use byteorder::ReadBytesExt;
use serde::{Serialize, Serializer};
use std::fmt;
use std::io::Read;

#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub fn from_str(s: &str) -> Option<Self> {
        let b = s.as_bytes();
        if b.len() == 4 {
            Some(FourCC([b[0], b[1], b[2], b[3]]))
        } else {
            None
        }
    }

    pub fn as_str_lossy(&self) -> String {
        self.0
            .iter()
            .map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&self.as_str_lossy())
    }
}

/// The envelope every box starts with.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BoxHeader {
    pub size: u32, // declared 32-bit size; 1 = see large_size, 0 = to end of stream
    #[serde(rename = "type")]
    pub typ: FourCC,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "hex_opt")]
    pub user_type: Option<[u8; 16]>,
    #[serde(skip)]
    pub header_size: u64, // 8, 16, 24 or 32
    #[serde(skip)]
    pub start: u64, // stream offset of the size field
    #[serde(skip)]
    pub payload_size: u64, // bytes left after every header field read so far
    #[serde(skip)]
    total_size: u64,
}

impl BoxHeader {
    /// Build the header of a plain 8-byte-envelope box around `payload_size` bytes.
    pub fn new(typ: FourCC, payload_size: u64) -> Self {
        let total_size = 8 + payload_size;
        Self {
            size: total_size as u32,
            typ,
            large_size: None,
            user_type: None,
            header_size: 8,
            start: 0,
            payload_size,
            total_size,
        }
    }

    /// Assemble a header from its decoded envelope fields.
    pub(crate) fn from_envelope(
        size: u32,
        typ: FourCC,
        large_size: Option<u64>,
        user_type: Option<[u8; 16]>,
        start: u64,
    ) -> Result<Self> {
        let header_size = 8
            + if large_size.is_some() { 8 } else { 0 }
            + if user_type.is_some() { 16 } else { 0 };
        let declared = large_size.unwrap_or(size as u64);
        let payload_size = if size == 0 {
            0
        } else {
            declared.checked_sub(header_size).ok_or(ParseError::NegativePayload {
                typ,
                size: declared,
                header_size,
            })?
        };
        Ok(Self {
            size,
            typ,
            large_size,
            user_type,
            header_size,
            start,
            payload_size,
            total_size: if size == 0 { header_size } else { declared },
        })
    }

    /// Total box size including the header.
    pub fn box_size(&self) -> u64 {
        self.total_size
    }

    /// `size == 0`: the payload runs to the end of the enclosing stream.
    pub fn is_open_ended(&self) -> bool {
        self.size == 0
    }

    /// Fix the payload length of an open-ended box once the enclosing extent is known.
    pub fn resolve_open_ended(&mut self, available: u64) {
        self.payload_size = available;
        self.total_size = self.header_size + available;
    }

    /// Stream offset of the first payload byte not yet claimed by a header field.
    pub fn payload_offset(&self) -> u64 {
        self.start + (self.total_size - self.payload_size)
    }

    /// The region holding child boxes, starting `consumed` bytes into the payload.
    pub fn children(&self, consumed: u64) -> Extent {
        Extent {
            typ: self.typ,
            start: self.payload_offset() + consumed,
            size: self.payload_size.saturating_sub(consumed),
            open_ended: self.is_open_ended(),
        }
    }
}

/// A box header followed by the 1-byte version and 24-bit flags of a full box.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FullHeader {
    #[serde(flatten)]
    pub header: BoxHeader,
    pub version: u8,
    pub flags: u32,
}

impl FullHeader {
    pub fn new(header: BoxHeader) -> Self {
        Self { header, version: 0, flags: 0 }
    }

    /// Read version and flags, taking their 4 bytes off the payload.
    pub fn parse_version_flag(&mut self, r: &mut dyn Read) -> Result<()> {
        let typ = self.header.typ;
        if !KnownBox::from(typ).is_full_box() {
            return Err(ParseError::NotFullBox(typ));
        }
        if self.header.payload_size < 4 {
            return Err(ParseError::TruncatedInput(format!(
                "{} payload of {} bytes has no room for version/flags",
                typ, self.header.payload_size
            )));
        }
        self.version = r.read_u8()?;
        let mut f = [0u8; 3];
        r.read_exact(&mut f)?;
        self.flags = ((f[0] as u32) << 16) | ((f[1] as u32) << 8) | (f[2] as u32);
        self.header.payload_size -= 4;
        Ok(())
    }
}

/// A run of child boxes inside a parent payload.
#[derive(Debug, Clone, Copy)]
pub struct Extent {
    pub typ: FourCC, // owner, for diagnostics
    pub start: u64, // stream offset of the first child
    pub size: u64,
    pub open_ended: bool, // a final child may declare size 0
}
