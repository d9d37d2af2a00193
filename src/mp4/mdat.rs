use crate::boxes::BoxHeader;
use crate::error::Result;
use crate::registry::Mp4Box;
use crate::util::ByteCursor;
use serde::Serialize;
use std::io::Read;

/// Media data box. The payload is kept in memory for sample extraction.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MdatBox {
    #[serde(flatten)]
    pub header: BoxHeader,
    /// Stream offset of `data[0]`.
    pub data_offset: u64,
    pub data_size: u64,
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl MdatBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { header, ..Default::default() }
    }

    /// Bytes `[offset, offset + size)` of the file, if they lie inside this box.
    pub fn slice(&self, offset: u64, size: u64) -> Option<&[u8]> {
        let from = offset.checked_sub(self.data_offset)?;
        let to = from.checked_add(size)?;
        if to > self.data.len() as u64 {
            return None;
        }
        Some(&self.data[from as usize..to as usize])
    }
}

impl Mp4Box for MdatBox {
    fn header(&self) -> &BoxHeader {
        &self.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        let mut c = ByteCursor::new(r);
        self.data_offset = self.header.payload_offset();
        self.data = c.read_rest(&self.header)?;
        self.data_size = self.data.len() as u64;
        c.finish(&self.header)
    }
}

/// `free` / `skip` padding. Only the envelope is kept.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FreeBox {
    #[serde(flatten)]
    pub header: BoxHeader,
}

impl FreeBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { header }
    }
}

impl Mp4Box for FreeBox {
    fn header(&self) -> &BoxHeader {
        &self.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        let mut c = ByteCursor::new(r);
        c.skip(self.header.payload_size)?;
        c.finish(&self.header)
    }
}
