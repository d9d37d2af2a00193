use crate::boxes::BoxHeader;
use crate::error::{ParseError, Result};
use serde::Serializer;
use std::io::{self, Read};

/// Sequential byte reader that counts how much of a payload has been consumed.
///
/// Every box decoder reads through one of these so it can check its field
/// accounting against the declared payload size when it is done.
pub struct ByteCursor<'a> {
    inner: &'a mut dyn Read,
    consumed: u64,
}

impl<'a> ByteCursor<'a> {
    pub fn new(inner: &'a mut dyn Read) -> Self {
        Self { inner, consumed: 0 }
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Read exactly `n` bytes or fail with `TruncatedInput`.
    pub fn read_bytes(&mut self, n: u64) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        (&mut *self).take(n).read_to_end(&mut buf)?;
        if (buf.len() as u64) < n {
            return Err(ParseError::TruncatedInput(format!(
                "wanted {} bytes, got {}",
                n,
                buf.len()
            )));
        }
        Ok(buf)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Consume and discard `n` bytes without seeking.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        let copied = io::copy(&mut (&mut *self).take(n), &mut io::sink())?;
        if copied < n {
            return Err(ParseError::TruncatedInput(format!(
                "wanted to skip {} bytes, got {}",
                n, copied
            )));
        }
        Ok(())
    }

    /// Bytes of `hdr`'s payload not yet consumed.
    pub fn remaining(&self, hdr: &BoxHeader) -> u64 {
        hdr.payload_size.saturating_sub(self.consumed)
    }

    /// Read whatever is left of `hdr`'s payload.
    pub fn read_rest(&mut self, hdr: &BoxHeader) -> Result<Vec<u8>> {
        let n = self.remaining(hdr);
        self.read_bytes(n)
    }

    /// Fail before allocating when `count` entries cannot fit in the rest of the payload.
    pub fn ensure_entries(&self, hdr: &BoxHeader, count: u64, entry_size: u64) -> Result<()> {
        let available = self.remaining(hdr);
        if count.saturating_mul(entry_size) > available {
            return Err(ParseError::EntryCountOverflow {
                typ: hdr.typ,
                count,
                entry_size,
                available,
            });
        }
        Ok(())
    }

    /// Read `count` fixed-width table entries, bounded by the rest of the payload.
    pub fn read_entries<T>(
        &mut self,
        hdr: &BoxHeader,
        count: u32,
        entry_size: u64,
        mut read: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        self.ensure_entries(hdr, count as u64, entry_size)?;
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            entries.push(read(self)?);
        }
        Ok(entries)
    }

    /// Check that the decoder consumed exactly the declared payload.
    pub fn finish(&self, hdr: &BoxHeader) -> Result<()> {
        if self.consumed != hdr.payload_size {
            return Err(ParseError::FieldAccounting {
                typ: hdr.typ,
                parsed: self.consumed,
                expected: hdr.payload_size,
            });
        }
        Ok(())
    }
}

impl Read for ByteCursor<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed += n as u64;
        Ok(n)
    }
}

/// Read into `buf`, returning `false` if the source was already exhausted.
///
/// A source that ends part-way through `buf` is a truncation.
pub fn read_exact_or_eof(r: &mut dyn Read, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(ParseError::TruncatedInput(format!(
                    "wanted {} bytes, got {}",
                    buf.len(),
                    filled
                )));
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

pub fn hex_bytes<T: AsRef<[u8]>, S: Serializer>(bytes: &T, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(bytes))
}

pub fn hex_opt<T: AsRef<[u8]>, S: Serializer>(
    bytes: &Option<T>,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    match bytes {
        Some(b) => s.serialize_str(&hex::encode(b)),
        None => s.serialize_none(),
    }
}
