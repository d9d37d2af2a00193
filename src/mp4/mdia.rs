use super::{MinfBox, c_string, lang_from_u16, read_versioned};
use crate::boxes::{BoxHeader, FourCC, FullHeader};
use crate::error::Result;
use crate::known_boxes::KnownBox;
use crate::parser::parse_children;
use crate::registry::{Container, Dispatch, Mp4Box, decode_into};
use crate::util::ByteCursor;
use byteorder::{BigEndian, ReadBytesExt};
use serde::Serialize;
use std::io::Read;

#[derive(Debug, Clone, Default, Serialize)]
pub struct MdiaBox {
    #[serde(flatten)]
    pub header: BoxHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mdhd: Option<MdhdBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hdlr: Option<HdlrBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minf: Option<MinfBox>,
}

impl MdiaBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { header, ..Default::default() }
    }
}

impl Mp4Box for MdiaBox {
    fn header(&self) -> &BoxHeader {
        &self.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        let extent = self.header.children(0);
        parse_children(self, r, extent)?;
        Ok(())
    }
}

impl Container for MdiaBox {
    fn create_child(&mut self, hdr: BoxHeader, r: &mut dyn Read) -> Result<Dispatch> {
        match KnownBox::from(hdr.typ) {
            KnownBox::Mdhd => decode_into(&mut self.mdhd, MdhdBox::new(hdr), r),
            KnownBox::Hdlr => decode_into(&mut self.hdlr, HdlrBox::new(hdr), r),
            KnownBox::Minf => decode_into(&mut self.minf, MinfBox::new(hdr), r),
            _ => Ok(Dispatch::Unknown),
        }
    }
}

/// Media header box.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MdhdBox {
    #[serde(flatten)]
    pub full: FullHeader,
    pub creation_time: u64,
    pub modification_time: u64,
    pub timescale: u32,
    pub duration: u64,
    pub language: String,
}

impl MdhdBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }
}

impl Mp4Box for MdhdBox {
    fn header(&self) -> &BoxHeader {
        &self.full.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        self.full.parse_version_flag(r)?;
        let version = self.full.version;
        let mut c = ByteCursor::new(r);
        self.creation_time = read_versioned(&mut c, version)?;
        self.modification_time = read_versioned(&mut c, version)?;
        self.timescale = c.read_u32::<BigEndian>()?;
        self.duration = read_versioned(&mut c, version)?;
        self.language = lang_from_u16(c.read_u16::<BigEndian>()? & 0x7FFF);
        c.skip(2)?; // pre_defined
        c.finish(&self.full.header)
    }
}

/// Handler reference box.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HdlrBox {
    #[serde(flatten)]
    pub full: FullHeader,
    pub handler_type: String,
    pub name: String,
}

impl HdlrBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }
}

impl Mp4Box for HdlrBox {
    fn header(&self) -> &BoxHeader {
        &self.full.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        self.full.parse_version_flag(r)?;
        let mut c = ByteCursor::new(r);
        c.skip(4)?; // pre_defined
        self.handler_type = FourCC(c.read_array()?).as_str_lossy();
        c.skip(12)?; // reserved
        self.name = c_string(&c.read_rest(&self.full.header)?);
        c.finish(&self.full.header)
    }
}
