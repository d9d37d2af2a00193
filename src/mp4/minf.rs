use super::{StblBox, c_string};
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

#[derive(Debug, Clone, Default, Serialize)]
pub struct MinfBox {
    #[serde(flatten)]
    pub header: BoxHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vmhd: Option<VmhdBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smhd: Option<SmhdBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dinf: Option<DinfBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stbl: Option<StblBox>,
}

impl MinfBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { header, ..Default::default() }
    }
}

impl Mp4Box for MinfBox {
    fn header(&self) -> &BoxHeader {
        &self.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        let extent = self.header.children(0);
        parse_children(self, r, extent)?;
        Ok(())
    }
}

impl Container for MinfBox {
    fn create_child(&mut self, hdr: BoxHeader, r: &mut dyn Read) -> Result<Dispatch> {
        match KnownBox::from(hdr.typ) {
            KnownBox::Vmhd => decode_into(&mut self.vmhd, VmhdBox::new(hdr), r),
            KnownBox::Smhd => decode_into(&mut self.smhd, SmhdBox::new(hdr), r),
            KnownBox::Dinf => decode_into(&mut self.dinf, DinfBox::new(hdr), r),
            KnownBox::Stbl => decode_into(&mut self.stbl, StblBox::new(hdr), r),
            _ => Ok(Dispatch::Unknown),
        }
    }
}

/// Video media header box.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VmhdBox {
    #[serde(flatten)]
    pub full: FullHeader,
    pub graphics_mode: u16,
    pub opcolor: [u16; 3],
}

impl VmhdBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }
}

impl Mp4Box for VmhdBox {
    fn header(&self) -> &BoxHeader {
        &self.full.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        self.full.parse_version_flag(r)?;
        let mut c = ByteCursor::new(r);
        self.graphics_mode = c.read_u16::<BigEndian>()?;
        for v in self.opcolor.iter_mut() {
            *v = c.read_u16::<BigEndian>()?;
        }
        c.finish(&self.full.header)
    }
}

/// Sound media header box.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SmhdBox {
    #[serde(flatten)]
    pub full: FullHeader,
    /// 8.8 fixed point, 0 is centre.
    pub balance: i16,
}

impl SmhdBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }
}

impl Mp4Box for SmhdBox {
    fn header(&self) -> &BoxHeader {
        &self.full.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        self.full.parse_version_flag(r)?;
        let mut c = ByteCursor::new(r);
        self.balance = c.read_i16::<BigEndian>()?;
        c.skip(2)?; // reserved
        c.finish(&self.full.header)
    }
}

/// Data information box.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DinfBox {
    #[serde(flatten)]
    pub header: BoxHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dref: Option<DrefBox>,
}

impl DinfBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { header, ..Default::default() }
    }
}

impl Mp4Box for DinfBox {
    fn header(&self) -> &BoxHeader {
        &self.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        let extent = self.header.children(0);
        parse_children(self, r, extent)?;
        Ok(())
    }
}

impl Container for DinfBox {
    fn create_child(&mut self, hdr: BoxHeader, r: &mut dyn Read) -> Result<Dispatch> {
        match KnownBox::from(hdr.typ) {
            KnownBox::Dref => decode_into(&mut self.dref, DrefBox::new(hdr), r),
            _ => Ok(Dispatch::Unknown),
        }
    }
}

/// Data reference box: a counted list of `url ` / `urn ` entries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DrefBox {
    #[serde(flatten)]
    pub full: FullHeader,
    pub entry_count: u32,
    pub entries: Vec<DataEntryBox>,
}

impl DrefBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }
}

impl Mp4Box for DrefBox {
    fn header(&self) -> &BoxHeader {
        &self.full.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        self.full.parse_version_flag(r)?;
        self.entry_count = r.read_u32::<BigEndian>()?;
        let extent = self.full.header.children(4);
        let walked = parse_children(self, r, extent)?;
        if walked != self.entry_count as usize {
            warn!("dref declares {} entries but holds {}", self.entry_count, walked);
        }
        Ok(())
    }
}

impl Container for DrefBox {
    fn create_child(&mut self, hdr: BoxHeader, r: &mut dyn Read) -> Result<Dispatch> {
        match KnownBox::from(hdr.typ) {
            KnownBox::Url | KnownBox::Urn => decode_push(&mut self.entries, DataEntryBox::new(hdr), r),
            _ => Ok(Dispatch::Unknown),
        }
    }
}

/// `url ` or `urn ` data entry. Flag 0x1 means the media is in this file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DataEntryBox {
    #[serde(flatten)]
    pub full: FullHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl DataEntryBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }

    pub fn is_self_contained(&self) -> bool {
        self.full.flags & 0x1 != 0
    }
}

impl Mp4Box for DataEntryBox {
    fn header(&self) -> &BoxHeader {
        &self.full.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        self.full.parse_version_flag(r)?;
        let mut c = ByteCursor::new(r);
        let rest = c.read_rest(&self.full.header)?;
        if !rest.is_empty() {
            let mut strings = rest.split(|&b| b == 0).map(c_string);
            if &self.full.header.typ.0 == b"urn " {
                self.name = strings.next();
            }
            self.location = strings.next().filter(|s| !s.is_empty());
        }
        c.finish(&self.full.header)
    }
}
