use super::StsdBox;
use crate::boxes::{BoxHeader, FullHeader};
use crate::error::Result;
use crate::known_boxes::KnownBox;
use crate::parser::parse_children;
use crate::registry::{Container, Dispatch, Mp4Box, decode_into};
use crate::util::ByteCursor;
use byteorder::{BigEndian, ReadBytesExt};
use serde::Serialize;
use std::io::Read;

/// Sample table box.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StblBox {
    #[serde(flatten)]
    pub header: BoxHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stsd: Option<StsdBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stts: Option<SttsBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctts: Option<CttsBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stss: Option<StssBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stsc: Option<StscBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stsz: Option<StszBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stco: Option<StcoBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co64: Option<Co64Box>,
}

impl StblBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { header, ..Default::default() }
    }
}

impl Mp4Box for StblBox {
    fn header(&self) -> &BoxHeader {
        &self.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        let extent = self.header.children(0);
        parse_children(self, r, extent)?;
        Ok(())
    }
}

impl Container for StblBox {
    fn create_child(&mut self, hdr: BoxHeader, r: &mut dyn Read) -> Result<Dispatch> {
        match KnownBox::from(hdr.typ) {
            KnownBox::Stsd => decode_into(&mut self.stsd, StsdBox::new(hdr), r),
            KnownBox::Stts => decode_into(&mut self.stts, SttsBox::new(hdr), r),
            KnownBox::Ctts => decode_into(&mut self.ctts, CttsBox::new(hdr), r),
            KnownBox::Stss => decode_into(&mut self.stss, StssBox::new(hdr), r),
            KnownBox::Stsc => decode_into(&mut self.stsc, StscBox::new(hdr), r),
            KnownBox::Stsz => decode_into(&mut self.stsz, StszBox::new(hdr), r),
            KnownBox::Stco => decode_into(&mut self.stco, StcoBox::new(hdr), r),
            KnownBox::Co64 => decode_into(&mut self.co64, Co64Box::new(hdr), r),
            _ => Ok(Dispatch::Unknown),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SttsEntry {
    pub sample_count: u32,
    pub sample_delta: u32,
}

/// Decoding time-to-sample box.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SttsBox {
    #[serde(flatten)]
    pub full: FullHeader,
    pub entry_count: u32,
    pub entries: Vec<SttsEntry>,
}

impl SttsBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }
}

impl Mp4Box for SttsBox {
    fn header(&self) -> &BoxHeader {
        &self.full.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        self.full.parse_version_flag(r)?;
        let mut c = ByteCursor::new(r);
        self.entry_count = c.read_u32::<BigEndian>()?;
        self.entries = c.read_entries(&self.full.header, self.entry_count, 8, |c| {
            Ok(SttsEntry {
                sample_count: c.read_u32::<BigEndian>()?,
                sample_delta: c.read_u32::<BigEndian>()?,
            })
        })?;
        c.finish(&self.full.header)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CttsEntry {
    pub sample_count: u32,
    pub sample_offset: i64, // signed in version 1
}

/// Composition time-to-sample box.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CttsBox {
    #[serde(flatten)]
    pub full: FullHeader,
    pub entry_count: u32,
    pub entries: Vec<CttsEntry>,
}

impl CttsBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }
}

impl Mp4Box for CttsBox {
    fn header(&self) -> &BoxHeader {
        &self.full.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        self.full.parse_version_flag(r)?;
        let version = self.full.version;
        let mut c = ByteCursor::new(r);
        self.entry_count = c.read_u32::<BigEndian>()?;
        self.entries = c.read_entries(&self.full.header, self.entry_count, 8, |c| {
            let sample_count = c.read_u32::<BigEndian>()?;
            let sample_offset = if version == 1 {
                c.read_i32::<BigEndian>()? as i64
            } else {
                c.read_u32::<BigEndian>()? as i64
            };
            Ok(CttsEntry { sample_count, sample_offset })
        })?;
        c.finish(&self.full.header)
    }
}

/// Sync sample box: 1-based numbers of the key frames.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StssBox {
    #[serde(flatten)]
    pub full: FullHeader,
    pub entry_count: u32,
    pub sample_number: Vec<u32>,
}

impl StssBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }
}

impl Mp4Box for StssBox {
    fn header(&self) -> &BoxHeader {
        &self.full.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        self.full.parse_version_flag(r)?;
        let mut c = ByteCursor::new(r);
        self.entry_count = c.read_u32::<BigEndian>()?;
        self.sample_number = c.read_entries(&self.full.header, self.entry_count, 4, |c| {
            Ok(c.read_u32::<BigEndian>()?)
        })?;
        c.finish(&self.full.header)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StscEntry {
    pub first_chunk: u32,
    pub samples_per_chunk: u32,
    pub sample_description_index: u32,
}

/// Sample-to-chunk box.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StscBox {
    #[serde(flatten)]
    pub full: FullHeader,
    pub entry_count: u32,
    pub entries: Vec<StscEntry>,
}

impl StscBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }
}

impl Mp4Box for StscBox {
    fn header(&self) -> &BoxHeader {
        &self.full.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        self.full.parse_version_flag(r)?;
        let mut c = ByteCursor::new(r);
        self.entry_count = c.read_u32::<BigEndian>()?;
        self.entries = c.read_entries(&self.full.header, self.entry_count, 12, |c| {
            Ok(StscEntry {
                first_chunk: c.read_u32::<BigEndian>()?,
                samples_per_chunk: c.read_u32::<BigEndian>()?,
                sample_description_index: c.read_u32::<BigEndian>()?,
            })
        })?;
        c.finish(&self.full.header)
    }
}

/// Sample size box. `entry_size` is empty when every sample has `sample_size` bytes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StszBox {
    #[serde(flatten)]
    pub full: FullHeader,
    pub sample_size: u32,
    pub sample_count: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entry_size: Vec<u32>,
}

impl StszBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }

    /// Size of the 0-based sample `index`.
    pub fn size_of(&self, index: usize) -> Option<u32> {
        if self.sample_size != 0 {
            (index < self.sample_count as usize).then_some(self.sample_size)
        } else {
            self.entry_size.get(index).copied()
        }
    }
}

impl Mp4Box for StszBox {
    fn header(&self) -> &BoxHeader {
        &self.full.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        self.full.parse_version_flag(r)?;
        let mut c = ByteCursor::new(r);
        self.sample_size = c.read_u32::<BigEndian>()?;
        self.sample_count = c.read_u32::<BigEndian>()?;
        if self.sample_size == 0 {
            self.entry_size = c.read_entries(&self.full.header, self.sample_count, 4, |c| {
                Ok(c.read_u32::<BigEndian>()?)
            })?;
        }
        c.finish(&self.full.header)
    }
}

/// Chunk offset box with 32-bit offsets.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StcoBox {
    #[serde(flatten)]
    pub full: FullHeader,
    pub entry_count: u32,
    pub chunk_offset: Vec<u32>,
}

impl StcoBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }
}

impl Mp4Box for StcoBox {
    fn header(&self) -> &BoxHeader {
        &self.full.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        self.full.parse_version_flag(r)?;
        let mut c = ByteCursor::new(r);
        self.entry_count = c.read_u32::<BigEndian>()?;
        self.chunk_offset = c.read_entries(&self.full.header, self.entry_count, 4, |c| {
            Ok(c.read_u32::<BigEndian>()?)
        })?;
        c.finish(&self.full.header)
    }
}

/// Chunk offset box with 64-bit offsets.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Co64Box {
    #[serde(flatten)]
    pub full: FullHeader,
    pub entry_count: u32,
    pub chunk_offset: Vec<u64>,
}

impl Co64Box {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }
}

impl Mp4Box for Co64Box {
    fn header(&self) -> &BoxHeader {
        &self.full.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        self.full.parse_version_flag(r)?;
        let mut c = ByteCursor::new(r);
        self.entry_count = c.read_u32::<BigEndian>()?;
        self.chunk_offset = c.read_entries(&self.full.header, self.entry_count, 8, |c| {
            Ok(c.read_u64::<BigEndian>()?)
        })?;
        c.finish(&self.full.header)
    }
}
