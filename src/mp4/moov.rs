use super::{TrakBox, UdtaBox, read_versioned};
use crate::boxes::{BoxHeader, FullHeader};
use crate::error::Result;
use crate::known_boxes::KnownBox;
use crate::parser::parse_children;
use crate::registry::{Container, Dispatch, Mp4Box, decode_into, decode_push};
use crate::util::ByteCursor;
use byteorder::{BigEndian, ReadBytesExt};
use serde::Serialize;
use std::io::Read;

#[derive(Debug, Clone, Default, Serialize)]
pub struct MoovBox {
    #[serde(flatten)]
    pub header: BoxHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mvhd: Option<MvhdBox>,
    pub trak: Vec<TrakBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udta: Option<UdtaBox>,
}

impl MoovBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { header, ..Default::default() }
    }
}

impl Mp4Box for MoovBox {
    fn header(&self) -> &BoxHeader {
        &self.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        let extent = self.header.children(0);
        parse_children(self, r, extent)?;
        Ok(())
    }
}

impl Container for MoovBox {
    fn create_child(&mut self, hdr: BoxHeader, r: &mut dyn Read) -> Result<Dispatch> {
        match KnownBox::from(hdr.typ) {
            KnownBox::Mvhd => decode_into(&mut self.mvhd, MvhdBox::new(hdr), r),
            KnownBox::Trak => decode_push(&mut self.trak, TrakBox::new(hdr), r),
            KnownBox::Udta => decode_into(&mut self.udta, UdtaBox::new(hdr), r),
            _ => Ok(Dispatch::Unknown),
        }
    }
}

/// Movie header box.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MvhdBox {
    #[serde(flatten)]
    pub full: FullHeader,
    pub creation_time: u64,
    pub modification_time: u64,
    pub timescale: u32,
    pub duration: u64,
    /// 16.16 fixed point, 0x00010000 is normal speed.
    pub rate: u32,
    /// 8.8 fixed point.
    pub volume: u16,
    pub matrix: [i32; 9],
    pub next_track_id: u32,
}

impl MvhdBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }
}

impl Mp4Box for MvhdBox {
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
        self.rate = c.read_u32::<BigEndian>()?;
        self.volume = c.read_u16::<BigEndian>()?;
        c.skip(2 + 8)?; // reserved
        for m in self.matrix.iter_mut() {
            *m = c.read_i32::<BigEndian>()?;
        }
        c.skip(6 * 4)?; // pre_defined
        self.next_track_id = c.read_u32::<BigEndian>()?;
        c.finish(&self.full.header)
    }
}
