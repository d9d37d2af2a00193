use super::{MdiaBox, StblBox, read_versioned};
use crate::boxes::{BoxHeader, FullHeader};
use crate::error::Result;
use crate::known_boxes::KnownBox;
use crate::parser::parse_children;
use crate::registry::{Container, Dispatch, Mp4Box, decode_into};
use crate::util::ByteCursor;
use byteorder::{BigEndian, ReadBytesExt};
use serde::Serialize;
use std::io::Read;

#[derive(Debug, Clone, Default, Serialize)]
pub struct TrakBox {
    #[serde(flatten)]
    pub header: BoxHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tkhd: Option<TkhdBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edts: Option<EdtsBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mdia: Option<MdiaBox>,
}

impl TrakBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { header, ..Default::default() }
    }

    /// Handler type of the track's media, e.g. `vide` or `soun`.
    pub fn handler_type(&self) -> Option<&str> {
        self.mdia.as_ref()?.hdlr.as_ref().map(|h| h.handler_type.as_str())
    }

    pub fn stbl(&self) -> Option<&StblBox> {
        self.mdia.as_ref()?.minf.as_ref()?.stbl.as_ref()
    }
}

impl Mp4Box for TrakBox {
    fn header(&self) -> &BoxHeader {
        &self.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        let extent = self.header.children(0);
        parse_children(self, r, extent)?;
        Ok(())
    }
}

impl Container for TrakBox {
    fn create_child(&mut self, hdr: BoxHeader, r: &mut dyn Read) -> Result<Dispatch> {
        match KnownBox::from(hdr.typ) {
            KnownBox::Tkhd => decode_into(&mut self.tkhd, TkhdBox::new(hdr), r),
            KnownBox::Edts => decode_into(&mut self.edts, EdtsBox::new(hdr), r),
            KnownBox::Mdia => decode_into(&mut self.mdia, MdiaBox::new(hdr), r),
            _ => Ok(Dispatch::Unknown),
        }
    }
}

/// Track header box.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TkhdBox {
    #[serde(flatten)]
    pub full: FullHeader,
    pub creation_time: u64,
    pub modification_time: u64,
    pub track_id: u32,
    pub duration: u64,
    pub layer: i16,
    pub alternate_group: i16,
    pub volume: i16,
    pub matrix: [i32; 9],
    /// 16.16 fixed point.
    pub width: u32,
    /// 16.16 fixed point.
    pub height: u32,
}

impl TkhdBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }
}

impl Mp4Box for TkhdBox {
    fn header(&self) -> &BoxHeader {
        &self.full.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        self.full.parse_version_flag(r)?;
        let version = self.full.version;
        let mut c = ByteCursor::new(r);
        self.creation_time = read_versioned(&mut c, version)?;
        self.modification_time = read_versioned(&mut c, version)?;
        self.track_id = c.read_u32::<BigEndian>()?;
        c.skip(4)?; // reserved
        self.duration = read_versioned(&mut c, version)?;
        c.skip(8)?; // reserved
        self.layer = c.read_i16::<BigEndian>()?;
        self.alternate_group = c.read_i16::<BigEndian>()?;
        self.volume = c.read_i16::<BigEndian>()?;
        c.skip(2)?; // reserved
        for m in self.matrix.iter_mut() {
            *m = c.read_i32::<BigEndian>()?;
        }
        self.width = c.read_u32::<BigEndian>()?;
        self.height = c.read_u32::<BigEndian>()?;
        c.finish(&self.full.header)
    }
}

/// Edit box.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EdtsBox {
    #[serde(flatten)]
    pub header: BoxHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elst: Option<ElstBox>,
}

impl EdtsBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { header, ..Default::default() }
    }
}

impl Mp4Box for EdtsBox {
    fn header(&self) -> &BoxHeader {
        &self.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        let extent = self.header.children(0);
        parse_children(self, r, extent)?;
        Ok(())
    }
}

impl Container for EdtsBox {
    fn create_child(&mut self, hdr: BoxHeader, r: &mut dyn Read) -> Result<Dispatch> {
        match KnownBox::from(hdr.typ) {
            KnownBox::Elst => decode_into(&mut self.elst, ElstBox::new(hdr), r),
            _ => Ok(Dispatch::Unknown),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ElstEntry {
    pub segment_duration: u64,
    /// -1 marks an empty edit.
    pub media_time: i64,
    pub media_rate_integer: i16,
    pub media_rate_fraction: i16,
}

/// Edit list box.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ElstBox {
    #[serde(flatten)]
    pub full: FullHeader,
    pub entry_count: u32,
    pub entries: Vec<ElstEntry>,
}

impl ElstBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }
}

impl Mp4Box for ElstBox {
    fn header(&self) -> &BoxHeader {
        &self.full.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        self.full.parse_version_flag(r)?;
        let version = self.full.version;
        let mut c = ByteCursor::new(r);
        self.entry_count = c.read_u32::<BigEndian>()?;
        let entry_size = if version == 1 { 20 } else { 12 };
        self.entries = c.read_entries(&self.full.header, self.entry_count, entry_size, |c| {
            let segment_duration = read_versioned(c, version)?;
            let media_time = if version == 1 {
                c.read_i64::<BigEndian>()?
            } else {
                c.read_i32::<BigEndian>()? as i64
            };
            Ok(ElstEntry {
                segment_duration,
                media_time,
                media_rate_integer: c.read_i16::<BigEndian>()?,
                media_rate_fraction: c.read_i16::<BigEndian>()?,
            })
        })?;
        c.finish(&self.full.header)
    }
}
