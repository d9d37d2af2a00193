//! Length-prefixed NAL units, as stored in MP4 samples (ISO/IEC 14496-15 5.2.3).

use super::NalUnit;
use crate::error::{ParseError, Result};
use crate::util::ByteCursor;
use byteorder::{BigEndian, ReadBytesExt};
use log::debug;
use serde::Serialize;
use std::io::Read;

#[derive(Debug, Clone, Serialize)]
pub struct LengthNalu {
    pub length: u32,
    pub nalu: NalUnit,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElementaryStream {
    pub length_size: u8,
    pub length_nalu: Vec<LengthNalu>,
}

impl ElementaryStream {
    /// `length_size` is the width of each length prefix, 1 to 4 bytes.
    pub fn new(length_size: u8) -> Result<Self> {
        if !(1..=4).contains(&length_size) {
            return Err(ParseError::InvalidLengthSize(length_size));
        }
        Ok(Self { length_size, length_nalu: Vec::new() })
    }

    /// Decode the `size` bytes of `r` as length-prefixed NAL units,
    /// appending them. May be called once per sample.
    pub fn parse(&mut self, r: &mut dyn Read, size: u64) -> Result<u64> {
        let mut c = ByteCursor::new(r);
        while c.consumed() < size {
            let left = size - c.consumed();
            if left < self.length_size as u64 {
                return Err(ParseError::TruncatedInput(format!(
                    "{} bytes left for a {}-byte nal unit length",
                    left, self.length_size
                )));
            }
            let length = c.read_uint::<BigEndian>(self.length_size as usize)? as u32;
            let left = size - c.consumed();
            if length as u64 > left {
                return Err(ParseError::TruncatedInput(format!(
                    "nal unit of {} bytes, {} left in range",
                    length, left
                )));
            }
            let raw = c.read_bytes(length as u64)?;
            let nalu = NalUnit::from_stream_bytes(raw)?;
            debug!("nal unit type {} ({} bytes)", nalu.nal_unit_type, length);
            self.length_nalu.push(LengthNalu { length, nalu });
        }
        Ok(c.consumed())
    }
}
