use super::{AccessUnitDelimiter, SeiMessage, SequenceParameterSetData};
use crate::error::{ParseError, Result};
use crate::util::hex_opt;
use log::warn;
use serde::Serialize;
use std::io::Read;

/// `nal_unit_type` values defined by ISO/IEC 14496-10 Table 7-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NaluType {
    Slice = 1,
    SliceDataA = 2,
    SliceDataB = 3,
    SliceDataC = 4,
    IdrSlice = 5,
    Sei = 6,
    Sps = 7,
    Pps = 8,
    AccessUnitDelimiter = 9,
    EndOfSequence = 10,
    EndOfStream = 11,
    FillerData = 12,
    SpsExtension = 13,
    Prefix = 14,
    SubsetSps = 15,
    DepthParameterSet = 16,
    AuxiliarySlice = 19,
    SliceExtension = 20,
    SliceExtensionDepth = 21,
}

impl NaluType {
    pub fn from_u8(t: u8) -> Option<Self> {
        Some(match t {
            1 => NaluType::Slice,
            2 => NaluType::SliceDataA,
            3 => NaluType::SliceDataB,
            4 => NaluType::SliceDataC,
            5 => NaluType::IdrSlice,
            6 => NaluType::Sei,
            7 => NaluType::Sps,
            8 => NaluType::Pps,
            9 => NaluType::AccessUnitDelimiter,
            10 => NaluType::EndOfSequence,
            11 => NaluType::EndOfStream,
            12 => NaluType::FillerData,
            13 => NaluType::SpsExtension,
            14 => NaluType::Prefix,
            15 => NaluType::SubsetSps,
            16 => NaluType::DepthParameterSet,
            19 => NaluType::AuxiliarySlice,
            20 => NaluType::SliceExtension,
            21 => NaluType::SliceExtensionDepth,
            _ => return None,
        })
    }

    /// Types followed by two bytes of SVC header extension.
    pub fn has_svc_extension(self) -> bool {
        matches!(self, NaluType::Prefix | NaluType::SliceExtension)
    }
}

/// The decoded RBSP of a NAL unit, for the types that are interpreted.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NaluPayload {
    #[serde(rename = "seq_parameter_set_data")]
    Sps(SequenceParameterSetData),
    #[serde(rename = "sei_message")]
    Sei(SeiMessage),
    #[serde(rename = "access_unit_delimiter")]
    Aud(AccessUnitDelimiter),
    #[default]
    Ignored,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NalUnit {
    pub forbidden_zero_bit: u8, // 1 bit, must be 0
    pub nal_ref_idc: u8, // 2 bits
    pub nal_unit_type: u8, // 5 bits
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "hex_opt")]
    pub svc_extension: Option<[u8; 2]>, // not interpreted
    /// Length of `raw_bytes`.
    pub size: usize,
    #[serde(skip)]
    pub raw_bytes: Vec<u8>,
    #[serde(skip)]
    pub rbsp: Vec<u8>,
    pub payload: NaluPayload,
}

impl NalUnit {
    /// Split the header byte of `raw` without validating it.
    pub fn new(raw: Vec<u8>) -> Result<Self> {
        let header = *raw
            .first()
            .ok_or_else(|| ParseError::TruncatedInput("empty nal unit".into()))?;
        Ok(Self {
            forbidden_zero_bit: (header >> 7) & 0x1,
            nal_ref_idc: (header >> 5) & 0x3,
            nal_unit_type: header & 0x1F,
            svc_extension: None,
            size: raw.len(),
            raw_bytes: raw,
            rbsp: Vec::new(),
            payload: NaluPayload::Ignored,
        })
    }

    /// Decode one NAL unit occupying exactly `size` bytes of `r`.
    pub fn parse(r: &mut dyn Read, size: usize) -> Result<Self> {
        let mut raw = Vec::new();
        Read::take(&mut *r, size as u64).read_to_end(&mut raw)?;
        if raw.len() < size {
            return Err(ParseError::TruncatedInput(format!(
                "nal unit of {} bytes ends after {}",
                size,
                raw.len()
            )));
        }
        Self::from_raw(raw)
    }

    /// Decode a complete NAL unit, failing on an unknown type.
    pub fn from_raw(raw: Vec<u8>) -> Result<Self> {
        let mut nalu = Self::new(raw)?;
        nalu.decode()?;
        Ok(nalu)
    }

    /// Like [`NalUnit::from_raw`], but an unknown type keeps its header
    /// fields and leaves the payload ignored.
    pub fn from_stream_bytes(raw: Vec<u8>) -> Result<Self> {
        let mut nalu = Self::new(raw)?;
        match nalu.decode() {
            Err(ParseError::UnknownNaluType(t)) => {
                warn!("unknown nal_unit_type {}, payload ignored", t);
                Ok(nalu)
            }
            Err(e) => Err(e),
            Ok(()) => Ok(nalu),
        }
    }

    pub fn nalu_type(&self) -> Option<NaluType> {
        NaluType::from_u8(self.nal_unit_type)
    }

    /// Validate the header, unescape the RBSP and decode the payload.
    fn decode(&mut self) -> Result<()> {
        if self.forbidden_zero_bit != 0 {
            return Err(ParseError::MalformedNalu);
        }
        let kind = self
            .nalu_type()
            .ok_or(ParseError::UnknownNaluType(self.nal_unit_type))?;

        let mut header_len = 1;
        if kind.has_svc_extension() {
            let ext = self.raw_bytes.get(1..3).ok_or_else(|| {
                ParseError::TruncatedInput(format!("nal unit type {} lacks its svc extension", self.nal_unit_type))
            })?;
            self.svc_extension = Some([ext[0], ext[1]]);
            header_len += 2;
            warn!("nal unit type {}: svc extension header left undecoded", self.nal_unit_type);
        }

        self.rbsp = remove_emulation_prevention(&self.raw_bytes[header_len..]);
        self.payload = match kind {
            NaluType::Sps => NaluPayload::Sps(SequenceParameterSetData::parse(&self.rbsp)?),
            NaluType::Sei => NaluPayload::Sei(SeiMessage::parse(&self.rbsp)?),
            NaluType::AccessUnitDelimiter => NaluPayload::Aud(AccessUnitDelimiter::parse(&self.rbsp)?),
            _ => NaluPayload::Ignored,
        };
        Ok(())
    }
}

/// Drop the `0x03` of every `00 00 03` triple, scanning left to right.
pub fn remove_emulation_prevention(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if i + 2 < data.len() && data[i] == 0x00 && data[i + 1] == 0x00 && data[i + 2] == 0x03 {
            out.extend_from_slice(&[0x00, 0x00]);
            i += 3;
        } else {
            out.push(data[i]);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescapes_every_triple() {
        let escaped = [0x00, 0x00, 0x03, 0x01, 0x00, 0x00, 0x03, 0x00, 0x00, 0x03];
        assert_eq!(
            remove_emulation_prevention(&escaped),
            vec![0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn leaves_unescaped_data_alone() {
        let data = [0x67, 0x00, 0x03, 0x00, 0x00, 0x01, 0x03];
        assert_eq!(remove_emulation_prevention(&data), data.to_vec());
    }
}
