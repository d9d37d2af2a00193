use super::{c_string, lang_from_u16};
use crate::boxes::{BoxHeader, FullHeader};
use crate::error::Result;
use crate::known_boxes::KnownBox;
use crate::parser::parse_children;
use crate::registry::{Container, Dispatch, Mp4Box, decode_into, decode_push};
use crate::util::{ByteCursor, hex_bytes};
use byteorder::{BigEndian, ReadBytesExt};
use serde::Serialize;
use std::io::Read;

/// User data box.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UdtaBox {
    #[serde(flatten)]
    pub header: BoxHeader,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cprt: Vec<CprtBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaBox>,
}

impl UdtaBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { header, ..Default::default() }
    }
}

impl Mp4Box for UdtaBox {
    fn header(&self) -> &BoxHeader {
        &self.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        let extent = self.header.children(0);
        parse_children(self, r, extent)?;
        Ok(())
    }
}

impl Container for UdtaBox {
    fn create_child(&mut self, hdr: BoxHeader, r: &mut dyn Read) -> Result<Dispatch> {
        match KnownBox::from(hdr.typ) {
            KnownBox::Cprt => decode_push(&mut self.cprt, CprtBox::new(hdr), r),
            KnownBox::Meta => decode_into(&mut self.meta, MetaBox::new(hdr), r),
            _ => Ok(Dispatch::Unknown),
        }
    }
}

/// Copyright notice in one language.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CprtBox {
    #[serde(flatten)]
    pub full: FullHeader,
    pub language: String,
    pub notice: String,
}

impl CprtBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }
}

impl Mp4Box for CprtBox {
    fn header(&self) -> &BoxHeader {
        &self.full.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        self.full.parse_version_flag(r)?;
        let mut c = ByteCursor::new(r);
        self.language = lang_from_u16(c.read_u16::<BigEndian>()? & 0x7FFF);
        self.notice = c_string(&c.read_rest(&self.full.header)?);
        c.finish(&self.full.header)
    }
}

/// Metadata box. Its handler-specific contents are kept undecoded.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetaBox {
    #[serde(flatten)]
    pub full: FullHeader,
    #[serde(serialize_with = "hex_bytes")]
    pub data: Vec<u8>,
}

impl MetaBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }
}

impl Mp4Box for MetaBox {
    fn header(&self) -> &BoxHeader {
        &self.full.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        self.full.parse_version_flag(r)?;
        let mut c = ByteCursor::new(r);
        self.data = c.read_rest(&self.full.header)?;
        c.finish(&self.full.header)
    }
}
