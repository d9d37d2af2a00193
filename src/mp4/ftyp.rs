use crate::boxes::{BoxHeader, FourCC};
use crate::error::Result;
use crate::registry::Mp4Box;
use crate::util::ByteCursor;
use byteorder::{BigEndian, ReadBytesExt};
use serde::Serialize;
use std::io::Read;

/// File type box: major brand, minor version and every compatible brand.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FtypBox {
    #[serde(flatten)]
    pub header: BoxHeader,
    pub major_brand: FourCC,
    pub minor_version: u32,
    pub compatible_brands: Vec<FourCC>,
}

impl FtypBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { header, ..Default::default() }
    }
}

impl Mp4Box for FtypBox {
    fn header(&self) -> &BoxHeader {
        &self.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        let mut c = ByteCursor::new(r);
        self.major_brand = FourCC(c.read_array()?);
        self.minor_version = c.read_u32::<BigEndian>()?;
        let brands = c.remaining(&self.header) / 4;
        for _ in 0..brands {
            self.compatible_brands.push(FourCC(c.read_array()?));
        }
        c.finish(&self.header)
    }
}
