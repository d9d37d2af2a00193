use crate::avc::NalUnit;
use crate::boxes::BoxHeader;
use crate::error::Result;
use crate::registry::Mp4Box;
use crate::util::{ByteCursor, hex_bytes};
use byteorder::{BigEndian, ReadBytesExt};
use serde::Serialize;
use std::io::Read;

/// One SPS or PPS NAL unit as stored in the configuration record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParameterSet(#[serde(serialize_with = "hex_bytes")] pub Vec<u8>);

/// Trailer carried by the high profiles.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AvcConfigExt {
    pub chroma_format: u8,
    pub bit_depth_luma_minus8: u8,
    pub bit_depth_chroma_minus8: u8,
    pub sequence_parameter_set_ext: Vec<ParameterSet>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AvcDecoderConfigurationRecord {
    pub configuration_version: u8,
    pub avc_profile_indication: u8,
    pub profile_compatibility: u8,
    pub avc_level_indication: u8,
    pub length_size_minus_one: u8,
    pub sequence_parameter_sets: Vec<ParameterSet>,
    pub picture_parameter_sets: Vec<ParameterSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<AvcConfigExt>,
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "hex_bytes")]
    pub trailing: Vec<u8>,
}

impl AvcDecoderConfigurationRecord {
    /// Width in bytes of the NAL unit length prefix inside samples.
    pub fn length_size(&self) -> u8 {
        self.length_size_minus_one + 1
    }

    /// Decode the stored SPS then PPS NAL units.
    pub fn parameter_set_nalus(&self) -> Result<Vec<NalUnit>> {
        self.sequence_parameter_sets
            .iter()
            .chain(&self.picture_parameter_sets)
            .map(|ps| NalUnit::from_raw(ps.0.clone()))
            .collect()
    }

    fn parse(&mut self, c: &mut ByteCursor, hdr: &BoxHeader) -> Result<()> {
        self.configuration_version = c.read_u8()?;
        self.avc_profile_indication = c.read_u8()?;
        self.profile_compatibility = c.read_u8()?;
        self.avc_level_indication = c.read_u8()?;
        self.length_size_minus_one = c.read_u8()? & 0x03;
        let num_sps = c.read_u8()? & 0x1F;
        self.sequence_parameter_sets = read_parameter_sets(c, num_sps)?;
        let num_pps = c.read_u8()?;
        self.picture_parameter_sets = read_parameter_sets(c, num_pps)?;

        if matches!(self.avc_profile_indication, 100 | 110 | 122 | 144) && c.remaining(hdr) >= 4 {
            let chroma_format = c.read_u8()? & 0x03;
            let bit_depth_luma_minus8 = c.read_u8()? & 0x07;
            let bit_depth_chroma_minus8 = c.read_u8()? & 0x07;
            let num_ext = c.read_u8()?;
            self.ext = Some(AvcConfigExt {
                chroma_format,
                bit_depth_luma_minus8,
                bit_depth_chroma_minus8,
                sequence_parameter_set_ext: read_parameter_sets(c, num_ext)?,
            });
        }
        self.trailing = c.read_rest(hdr)?;
        Ok(())
    }
}

fn read_parameter_sets(c: &mut ByteCursor, count: u8) -> Result<Vec<ParameterSet>> {
    let mut sets = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let len = c.read_u16::<BigEndian>()?;
        sets.push(ParameterSet(c.read_bytes(len as u64)?));
    }
    Ok(sets)
}

/// AVC configuration box.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AvcCBox {
    #[serde(flatten)]
    pub header: BoxHeader,
    #[serde(flatten)]
    pub record: AvcDecoderConfigurationRecord,
}

impl AvcCBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { header, ..Default::default() }
    }
}

impl Mp4Box for AvcCBox {
    fn header(&self) -> &BoxHeader {
        &self.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        let mut c = ByteCursor::new(r);
        self.record.parse(&mut c, &self.header)?;
        c.finish(&self.header)
    }
}
