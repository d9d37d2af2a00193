use super::{AvcCBox, EsdsBox};
use crate::boxes::{BoxHeader, FullHeader};
use crate::error::Result;
use crate::known_boxes::KnownBox;
use crate::parser::parse_children;
use crate::registry::{Container, Dispatch, Mp4Box, decode_into, decode_push};
use crate::util::ByteCursor;
use byteorder::{BigEndian, ReadBytesExt};
use log::warn;
use serde::Serialize;
use std::io::Read;

/// Sample description box.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StsdBox {
    #[serde(flatten)]
    pub full: FullHeader,
    pub entry_count: u32,
    pub entries: Vec<SampleEntry>,
}

impl StsdBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }

    /// The first AVC visual sample entry, if any.
    pub fn avc(&self) -> Option<&VisualSampleEntry> {
        self.entries.iter().find_map(|e| match e {
            SampleEntry::Visual(v) => Some(v),
            _ => None,
        })
    }
}

impl Mp4Box for StsdBox {
    fn header(&self) -> &BoxHeader {
        &self.full.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        self.full.parse_version_flag(r)?;
        self.entry_count = r.read_u32::<BigEndian>()?;
        let extent = self.full.header.children(4);
        let walked = parse_children(self, r, extent)?;
        if walked != self.entry_count as usize {
            warn!("stsd declares {} entries but holds {}", self.entry_count, walked);
        }
        Ok(())
    }
}

impl Container for StsdBox {
    fn create_child(&mut self, hdr: BoxHeader, r: &mut dyn Read) -> Result<Dispatch> {
        match KnownBox::from(hdr.typ) {
            KnownBox::Avc1 | KnownBox::Avc3 => {
                decode_push(&mut self.entries, SampleEntry::Visual(VisualSampleEntry::new(hdr)), r)
            }
            KnownBox::Mp4a => {
                decode_push(&mut self.entries, SampleEntry::Audio(AudioSampleEntry::new(hdr)), r)
            }
            _ => Ok(Dispatch::Unknown),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SampleEntry {
    Visual(VisualSampleEntry),
    Audio(AudioSampleEntry),
}

impl Mp4Box for SampleEntry {
    fn header(&self) -> &BoxHeader {
        match self {
            SampleEntry::Visual(v) => v.header(),
            SampleEntry::Audio(a) => a.header(),
        }
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        match self {
            SampleEntry::Visual(v) => v.parse_payload(r),
            SampleEntry::Audio(a) => a.parse_payload(r),
        }
    }
}

/// `avc1` / `avc3` sample entry: the visual fields followed by child boxes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VisualSampleEntry {
    #[serde(flatten)]
    pub header: BoxHeader,
    pub data_reference_index: u16,
    pub width: u16,
    pub height: u16,
    /// 16.16 fixed point pixels per inch.
    pub horizresolution: u32,
    pub vertresolution: u32,
    pub frame_count: u16,
    pub compressorname: String,
    pub depth: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avcc: Option<AvcCBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub btrt: Option<BtrtBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pasp: Option<PaspBox>,
}

impl VisualSampleEntry {
    pub fn new(header: BoxHeader) -> Self {
        Self { header, ..Default::default() }
    }
}

impl Mp4Box for VisualSampleEntry {
    fn header(&self) -> &BoxHeader {
        &self.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        let mut c = ByteCursor::new(r);
        c.skip(6)?; // reserved
        self.data_reference_index = c.read_u16::<BigEndian>()?;
        c.skip(2 + 2 + 12)?; // pre_defined, reserved, pre_defined
        self.width = c.read_u16::<BigEndian>()?;
        self.height = c.read_u16::<BigEndian>()?;
        self.horizresolution = c.read_u32::<BigEndian>()?;
        self.vertresolution = c.read_u32::<BigEndian>()?;
        c.skip(4)?; // reserved
        self.frame_count = c.read_u16::<BigEndian>()?;
        let name: [u8; 32] = c.read_array()?;
        let len = (name[0] as usize).min(31);
        self.compressorname = String::from_utf8_lossy(&name[1..1 + len]).into_owned();
        self.depth = c.read_u16::<BigEndian>()?;
        c.skip(2)?; // pre_defined
        let consumed = c.consumed();

        let extent = self.header.children(consumed);
        parse_children(self, r, extent)?;
        Ok(())
    }
}

impl Container for VisualSampleEntry {
    fn create_child(&mut self, hdr: BoxHeader, r: &mut dyn Read) -> Result<Dispatch> {
        match KnownBox::from(hdr.typ) {
            KnownBox::Avcc => decode_into(&mut self.avcc, AvcCBox::new(hdr), r),
            KnownBox::Btrt => decode_into(&mut self.btrt, BtrtBox::new(hdr), r),
            KnownBox::Pasp => decode_into(&mut self.pasp, PaspBox::new(hdr), r),
            _ => Ok(Dispatch::Unknown),
        }
    }
}

/// `mp4a` sample entry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AudioSampleEntry {
    #[serde(flatten)]
    pub header: BoxHeader,
    pub data_reference_index: u16,
    /// QuickTime sound description version; 1 and 2 append extra fields.
    pub qt_version: u16,
    pub channel_count: u16,
    pub sample_size: u16,
    /// 16.16 fixed point.
    pub sample_rate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub esds: Option<EsdsBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub btrt: Option<BtrtBox>,
}

impl AudioSampleEntry {
    pub fn new(header: BoxHeader) -> Self {
        Self { header, ..Default::default() }
    }
}

impl Mp4Box for AudioSampleEntry {
    fn header(&self) -> &BoxHeader {
        &self.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        let mut c = ByteCursor::new(r);
        c.skip(6)?; // reserved
        self.data_reference_index = c.read_u16::<BigEndian>()?;
        self.qt_version = c.read_u16::<BigEndian>()?;
        c.skip(6)?; // revision, vendor
        self.channel_count = c.read_u16::<BigEndian>()?;
        self.sample_size = c.read_u16::<BigEndian>()?;
        c.skip(4)?; // pre_defined, reserved
        self.sample_rate = c.read_u32::<BigEndian>()?;
        match self.qt_version {
            1 => c.skip(16)?,
            2 => c.skip(36)?,
            _ => {}
        }
        let consumed = c.consumed();

        let extent = self.header.children(consumed);
        parse_children(self, r, extent)?;
        Ok(())
    }
}

impl Container for AudioSampleEntry {
    fn create_child(&mut self, hdr: BoxHeader, r: &mut dyn Read) -> Result<Dispatch> {
        match KnownBox::from(hdr.typ) {
            KnownBox::Esds => decode_into(&mut self.esds, EsdsBox::new(hdr), r),
            KnownBox::Btrt => decode_into(&mut self.btrt, BtrtBox::new(hdr), r),
            _ => Ok(Dispatch::Unknown),
        }
    }
}

/// Bit rate box.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BtrtBox {
    #[serde(flatten)]
    pub header: BoxHeader,
    pub buffer_size_db: u32,
    pub max_bitrate: u32,
    pub avg_bitrate: u32,
}

impl BtrtBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { header, ..Default::default() }
    }
}

impl Mp4Box for BtrtBox {
    fn header(&self) -> &BoxHeader {
        &self.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        let mut c = ByteCursor::new(r);
        self.buffer_size_db = c.read_u32::<BigEndian>()?;
        self.max_bitrate = c.read_u32::<BigEndian>()?;
        self.avg_bitrate = c.read_u32::<BigEndian>()?;
        c.finish(&self.header)
    }
}

/// Pixel aspect ratio box.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PaspBox {
    #[serde(flatten)]
    pub header: BoxHeader,
    pub h_spacing: u32,
    pub v_spacing: u32,
}

impl PaspBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { header, ..Default::default() }
    }
}

impl Mp4Box for PaspBox {
    fn header(&self) -> &BoxHeader {
        &self.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        let mut c = ByteCursor::new(r);
        self.h_spacing = c.read_u32::<BigEndian>()?;
        self.v_spacing = c.read_u32::<BigEndian>()?;
        c.finish(&self.header)
    }
}
