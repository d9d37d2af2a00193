//! Exponential-Golomb codes, `ue(v)` and `se(v)`.
//!
//! Decoders take the leftover bits of the previous field and return the
//! leftover bits of their own, so consecutive fields can share a byte.

use super::reader::{BitReader, RemainBits};
use crate::error::{ParseError, Result};
use serde::{Serialize, Serializer};
use std::io::Read;

const MAX_LEADING_ZEROS: u32 = 63;

/// Unsigned Exp-Golomb value plus the number of bits its code occupied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unsigned {
    pub value: u64,
    pub cost_bits: u64,
}

impl Unsigned {
    /// Count leading zeros `k`, then read a `k`-bit suffix: `2^k - 1 + suffix`.
    pub fn parse(r: &mut dyn Read, remain: RemainBits) -> Result<(Self, RemainBits)> {
        let mut br = BitReader::resume(r, remain);
        let mut leading_zeros = 0u32;
        while br.read_bit()? == 0 {
            leading_zeros += 1;
            if leading_zeros > MAX_LEADING_ZEROS {
                return Err(ParseError::ExpGolombOverflow(MAX_LEADING_ZEROS));
            }
        }
        let suffix = br.read_bits(leading_zeros)?;
        let value = ((1u64 << leading_zeros) - 1) + suffix;
        Ok((Unsigned { value, cost_bits: br.bits_read() }, br.remain()))
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

/// Signed Exp-Golomb value: code number `k` maps to `(-1)^(k+1) * ceil(k/2)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signed {
    pub value: i64,
    pub cost_bits: u64,
}

impl Signed {
    pub fn parse(r: &mut dyn Read, remain: RemainBits) -> Result<(Self, RemainBits)> {
        let (code, remain) = Unsigned::parse(r, remain)?;
        let k = code.value;
        let magnitude = (k / 2 + k % 2) as i64;
        let value = if k % 2 == 1 { magnitude } else { -magnitude };
        Ok((Signed { value, cost_bits: code.cost_bits }, remain))
    }

    pub fn value(&self) -> i64 {
        self.value
    }
}

impl Serialize for Unsigned {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_u64(self.value)
    }
}

impl Serialize for Signed {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_i64(self.value)
    }
}
