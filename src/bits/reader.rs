use crate::error::{ParseError, Result};
use byteorder::ReadBytesExt;
use serde::Serialize;
use std::io::Read;

const BITS_PER_BYTE: u8 = 8;

/// The unconsumed low bits of a partly read byte.
///
/// Bitstream fields are not byte aligned, so every field decode takes the
/// bits left over by the previous field and returns what it leaves behind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemainBits {
    pub byte: u8,
    /// 0..=8; only the low `bits_left` bits of `byte` are still unread.
    pub bits_left: u8,
}

impl RemainBits {
    pub fn new(byte: u8, bits_left: u8) -> Self {
        Self { byte, bits_left: bits_left.min(BITS_PER_BYTE) }
    }

    pub fn is_empty(&self) -> bool {
        self.bits_left == 0
    }
}

/// MSB-first bit reader over a byte source, caching one byte at a time.
pub struct BitReader<'a> {
    inner: &'a mut dyn Read,
    cache: u8,
    cached_bits: u8,
    bits_read: u64,
}

impl<'a> BitReader<'a> {
    pub fn new(inner: &'a mut dyn Read) -> Self {
        Self::resume(inner, RemainBits::default())
    }

    /// Continue from bits another reader left in a partly consumed byte.
    pub fn resume(inner: &'a mut dyn Read, remain: RemainBits) -> Self {
        Self {
            inner,
            cache: remain.byte,
            cached_bits: remain.bits_left.min(BITS_PER_BYTE),
            bits_read: 0,
        }
    }

    /// Bits of the cached byte not yet handed out.
    pub fn cached_bits_count(&self) -> u8 {
        self.cached_bits
    }

    /// Bits handed out since construction.
    pub fn bits_read(&self) -> u64 {
        self.bits_read
    }

    pub fn remain(&self) -> RemainBits {
        RemainBits { byte: self.cache, bits_left: self.cached_bits }
    }

    fn refill(&mut self) -> Result<()> {
        self.cache = self.inner.read_u8()?;
        self.cached_bits = BITS_PER_BYTE;
        Ok(())
    }

    pub fn read_bit(&mut self) -> Result<u8> {
        if self.cached_bits == 0 {
            self.refill()?;
        }
        self.cached_bits -= 1;
        self.bits_read += 1;
        Ok((self.cache >> self.cached_bits) & 0x1)
    }

    pub fn read_flag(&mut self) -> Result<bool> {
        Ok(self.read_bit()? == 1)
    }

    /// Read `n` bits, at most 64, as a big-endian unsigned value.
    pub fn read_bits(&mut self, n: u32) -> Result<u64> {
        if n > 64 {
            return Err(ParseError::InvalidBitCount(n));
        }
        let mut value = 0u64;
        let mut left = n;
        while left > 0 {
            if self.cached_bits == 0 {
                self.refill()?;
            }
            let take = left.min(self.cached_bits as u32);
            let shift = self.cached_bits as u32 - take;
            let bits = ((self.cache as u32 >> shift) & ((1u32 << take) - 1)) as u64;
            value = (value << take) | bits;
            self.cached_bits -= take as u8;
            self.bits_read += take as u64;
            left -= take;
        }
        Ok(value)
    }
}

/// Read a single flag bit, continuing from `remain`.
pub fn read_flag(r: &mut dyn Read, remain: RemainBits) -> Result<(bool, RemainBits)> {
    let mut br = BitReader::resume(r, remain);
    let flag = br.read_flag()?;
    Ok((flag, br.remain()))
}
