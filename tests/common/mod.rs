#![allow(dead_code)]

/// A plain box: 32-bit size, type, payload.
pub fn boxed(typ: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::with_capacity(8 + payload.len());
    v.extend_from_slice(&(8 + payload.len() as u32).to_be_bytes());
    v.extend_from_slice(typ);
    v.extend_from_slice(payload);
    v
}

/// A full box: version and 24-bit flags ahead of `payload`.
pub fn full_boxed(typ: &[u8; 4], version: u8, flags: u32, payload: &[u8]) -> Vec<u8> {
    let mut p = Vec::with_capacity(4 + payload.len());
    p.push(version);
    p.extend_from_slice(&flags.to_be_bytes()[1..]);
    p.extend_from_slice(payload);
    boxed(typ, &p)
}

/// Concatenate byte vectors.
pub fn cat(parts: &[Vec<u8>]) -> Vec<u8> {
    parts.concat()
}

/// A fixed-width entry table: 32-bit count followed by the entries.
pub fn table(entries: &[&[u32]]) -> Vec<u8> {
    let mut v = (entries.len() as u32).to_be_bytes().to_vec();
    for e in entries {
        for field in *e {
            v.extend_from_slice(&field.to_be_bytes());
        }
    }
    v
}

/// `ftyp` with major brand `isom`, minor version 512 and one compatible brand.
pub fn ftyp() -> Vec<u8> {
    boxed(b"ftyp", b"isom\x00\x00\x02\x00isom")
}

/// Version 0 `mvhd`.
pub fn mvhd(timescale: u32, duration: u32) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&0u32.to_be_bytes()); // creation_time
    p.extend_from_slice(&0u32.to_be_bytes()); // modification_time
    p.extend_from_slice(&timescale.to_be_bytes());
    p.extend_from_slice(&duration.to_be_bytes());
    p.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // rate
    p.extend_from_slice(&0x0100u16.to_be_bytes()); // volume
    p.extend_from_slice(&[0u8; 10]); // reserved
    for m in [0x0001_0000i32, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000] {
        p.extend_from_slice(&m.to_be_bytes());
    }
    p.extend_from_slice(&[0u8; 24]); // pre_defined
    p.extend_from_slice(&2u32.to_be_bytes()); // next_track_id
    full_boxed(b"mvhd", 0, 0, &p)
}

/// Version 0 `tkhd`; `width`/`height` in whole pixels.
pub fn tkhd(track_id: u32, width: u32, height: u32) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&0u32.to_be_bytes()); // creation_time
    p.extend_from_slice(&0u32.to_be_bytes()); // modification_time
    p.extend_from_slice(&track_id.to_be_bytes());
    p.extend_from_slice(&[0u8; 4]); // reserved
    p.extend_from_slice(&0u32.to_be_bytes()); // duration
    p.extend_from_slice(&[0u8; 8]); // reserved
    p.extend_from_slice(&[0u8; 8]); // layer, alternate_group, volume, reserved
    for m in [0x0001_0000i32, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000] {
        p.extend_from_slice(&m.to_be_bytes());
    }
    p.extend_from_slice(&(width << 16).to_be_bytes());
    p.extend_from_slice(&(height << 16).to_be_bytes());
    full_boxed(b"tkhd", 0, 3, &p)
}

/// Version 0 `mdhd` with language `und`.
pub fn mdhd(timescale: u32, duration: u32) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&0u32.to_be_bytes());
    p.extend_from_slice(&0u32.to_be_bytes());
    p.extend_from_slice(&timescale.to_be_bytes());
    p.extend_from_slice(&duration.to_be_bytes());
    p.extend_from_slice(&0x55C4u16.to_be_bytes()); // "und"
    p.extend_from_slice(&0u16.to_be_bytes());
    full_boxed(b"mdhd", 0, 0, &p)
}

pub fn hdlr(handler: &[u8; 4], name: &str) -> Vec<u8> {
    let mut p = vec![0u8; 4]; // pre_defined
    p.extend_from_slice(handler);
    p.extend_from_slice(&[0u8; 12]);
    p.extend_from_slice(name.as_bytes());
    p.push(0);
    full_boxed(b"hdlr", 0, 0, &p)
}

/// `avc1` sample entry around the given child boxes.
pub fn avc1(width: u16, height: u16, children: &[u8]) -> Vec<u8> {
    let mut p = vec![0u8; 6]; // reserved
    p.extend_from_slice(&1u16.to_be_bytes()); // data_reference_index
    p.extend_from_slice(&[0u8; 16]); // pre_defined, reserved, pre_defined
    p.extend_from_slice(&width.to_be_bytes());
    p.extend_from_slice(&height.to_be_bytes());
    p.extend_from_slice(&0x0048_0000u32.to_be_bytes());
    p.extend_from_slice(&0x0048_0000u32.to_be_bytes());
    p.extend_from_slice(&[0u8; 4]); // reserved
    p.extend_from_slice(&1u16.to_be_bytes()); // frame_count
    let mut name = [0u8; 32];
    name[0] = 4;
    name[1..5].copy_from_slice(b"test");
    p.extend_from_slice(&name);
    p.extend_from_slice(&0x0018u16.to_be_bytes()); // depth
    p.extend_from_slice(&0xFFFFu16.to_be_bytes()); // pre_defined
    p.extend_from_slice(children);
    boxed(b"avc1", &p)
}

/// `avcC` holding one SPS and one PPS, 4-byte NAL lengths.
pub fn avcc(sps: &[u8], pps: &[u8]) -> Vec<u8> {
    let mut p = vec![1, sps[1], sps[2], sps[3], 0xFF, 0xE1];
    p.extend_from_slice(&(sps.len() as u16).to_be_bytes());
    p.extend_from_slice(sps);
    p.push(1);
    p.extend_from_slice(&(pps.len() as u16).to_be_bytes());
    p.extend_from_slice(pps);
    boxed(b"avcC", &p)
}

/// Baseline SPS NAL unit for a 128x96 picture.
pub const SPS_NALU: [u8; 7] = [0x67, 0x42, 0x00, 0x0A, 0xF8, 0x41, 0xA2];
pub const PPS_NALU: [u8; 4] = [0x68, 0xCE, 0x38, 0x80];

/// Writes MSB-first bit fields, for building bitstreams by hand.
#[derive(Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_count: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit(&mut self, b: bool) -> &mut Self {
        if self.bit_count % 8 == 0 {
            self.bytes.push(0);
        }
        if b {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 0x80 >> (self.bit_count % 8);
        }
        self.bit_count += 1;
        self
    }

    pub fn bits(&mut self, value: u64, n: u32) -> &mut Self {
        for i in (0..n).rev() {
            self.bit((value >> i) & 1 == 1);
        }
        self
    }

    pub fn ue(&mut self, v: u64) -> &mut Self {
        let code = v + 1;
        let len = 64 - code.leading_zeros();
        self.bits(0, len - 1);
        self.bits(code, len)
    }

    pub fn se(&mut self, v: i64) -> &mut Self {
        let code = if v > 0 { 2 * v as u64 - 1 } else { 2 * v.unsigned_abs() };
        self.ue(code)
    }

    pub fn bit_len(&self) -> usize {
        self.bit_count
    }

    /// The written bits, zero padded to a byte boundary.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Append `rbsp_trailing_bits()` and return the bytes.
    pub fn finish_rbsp(mut self) -> Vec<u8> {
        self.bit(true);
        while self.bit_count % 8 != 0 {
            self.bit(false);
        }
        self.bytes
    }
}
