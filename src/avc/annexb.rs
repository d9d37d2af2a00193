//! Start-code delimited (Annex B) byte streams.

use super::NalUnit;
use crate::error::Result;
use log::{debug, warn};
use serde::Serialize;
use std::io::Read;

/// Split an Annex B byte stream on `00 00 01` start codes.
///
/// A preceding zero byte (the 4-byte start code form) and trailing zero
/// bytes are dropped from each unit. Bytes before the first start code and
/// empty units are discarded.
pub fn split_annex_b(data: &[u8]) -> Vec<&[u8]> {
    let mut starts = Vec::new();
    let mut i = 0;
    while i + 3 <= data.len() {
        if data[i] == 0x00 && data[i + 1] == 0x00 && data[i + 2] == 0x01 {
            starts.push(i + 3);
            i += 3;
        } else {
            i += 1;
        }
    }

    let mut units = Vec::with_capacity(starts.len());
    for (n, &start) in starts.iter().enumerate() {
        let end = starts.get(n + 1).map(|&next| next - 3).unwrap_or(data.len());
        let mut unit = &data[start..end];
        while let [rest @ .., 0x00] = unit {
            unit = rest;
        }
        if !unit.is_empty() {
            units.push(unit);
        }
    }
    units
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnnexBStream {
    pub nalu: Vec<NalUnit>,
}

impl AnnexBStream {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let units = split_annex_b(data);
        if units.is_empty() && !data.is_empty() {
            warn!("no start code in {} bytes", data.len());
        }
        let mut stream = Self::default();
        for unit in units {
            let nalu = NalUnit::from_stream_bytes(unit.to_vec())?;
            debug!("nal unit type {} ({} bytes)", nalu.nal_unit_type, nalu.size);
            stream.nalu.push(nalu);
        }
        Ok(stream)
    }

    /// Read `r` to the end and decode it.
    pub fn parse(r: &mut dyn Read) -> Result<Self> {
        let mut data = Vec::new();
        r.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }
}
