//! Per-sample layout of a track, resolved from its sample tables.

use crate::error::{ParseError, Result};
use crate::mp4::{Boxes, CttsBox, StblBox, StssBox, SttsBox, TrakBox};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SampleInfo {
    /// 0-based sample index
    pub index: u32,

    /// Absolute file offset of the first byte (from stsc + stco/co64)
    pub offset: u64,

    /// Sample size in bytes (from stsz)
    pub size: u32,

    /// Decode time in track timescale units (from stts)
    pub dts: u64,

    /// Duration in track timescale units (from stts)
    pub duration: u32,

    /// Presentation minus decode time (from ctts, 0 without one)
    pub composition_offset: i64,

    /// Sync sample / keyframe (from stss; every sample when absent)
    pub is_sync: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackSamples {
    pub track_id: u32,
    pub handler_type: String, // "vide", "soun", etc.
    pub timescale: u32,
    pub duration: u64, // in track timescale units
    pub sample_count: u32,
    pub samples: Vec<SampleInfo>,
}

/// Resolve every track of `boxes`.
pub fn track_samples(boxes: &Boxes) -> Result<Vec<TrackSamples>> {
    boxes.tracks().iter().map(track_samples_of).collect()
}

pub fn track_samples_of(trak: &TrakBox) -> Result<TrackSamples> {
    let mdhd = trak.mdia.as_ref().and_then(|m| m.mdhd.as_ref());
    let samples = sample_ranges(trak)?;
    Ok(TrackSamples {
        track_id: trak.tkhd.as_ref().map(|t| t.track_id).unwrap_or(0),
        handler_type: trak.handler_type().unwrap_or_default().to_string(),
        timescale: mdhd.map(|m| m.timescale).unwrap_or(0),
        duration: mdhd.map(|m| m.duration).unwrap_or(0),
        sample_count: samples.len() as u32,
        samples,
    })
}

/// Lay out the samples of `trak` in decode order.
///
/// A track without a sample table or `stsz` has no samples.
pub fn sample_ranges(trak: &TrakBox) -> Result<Vec<SampleInfo>> {
    let Some(stbl) = trak.stbl() else {
        return Ok(Vec::new());
    };
    let Some(stsz) = stbl.stsz.as_ref() else {
        return Ok(Vec::new());
    };
    let sample_count = stsz.sample_count;
    let chunk_offsets = chunk_offsets(stbl);
    let per_chunk = samples_per_chunk(stbl, chunk_offsets.len());
    let mut durations = Durations::new(stbl.stts.as_ref());
    let mut offsets = CompositionOffsets::new(stbl.ctts.as_ref());
    let mut sync = SyncSamples::new(stbl.stss.as_ref());

    // stsz may declare far more samples than the chunks hold
    let laid_out = per_chunk.iter().fold(0u64, |n, &c| n.saturating_add(c as u64));
    let mut samples = Vec::with_capacity(laid_out.min(sample_count as u64) as usize);
    let mut index = 0u32;
    let mut dts = 0u64;
    'chunks: for (&chunk_offset, &count) in chunk_offsets.iter().zip(&per_chunk) {
        let mut offset = chunk_offset;
        for _ in 0..count {
            if index >= sample_count {
                break 'chunks;
            }
            let size = stsz.size_of(index as usize).ok_or_else(|| {
                ParseError::TruncatedInput(format!("stsz has no size for sample {}", index))
            })?;
            let duration = durations.next();
            samples.push(SampleInfo {
                index,
                offset,
                size,
                dts,
                duration,
                composition_offset: offsets.next(),
                is_sync: sync.contains(index + 1),
            });
            offset = offset.checked_add(size as u64).ok_or_else(|| {
                ParseError::TruncatedInput(format!("sample {} at {} runs past the end of the file", index, offset))
            })?;
            dts = dts.saturating_add(duration as u64);
            index += 1;
        }
    }

    if index < sample_count {
        return Err(ParseError::TruncatedInput(format!(
            "chunks hold {} of {} samples",
            index, sample_count
        )));
    }
    Ok(samples)
}

/// Slice the bytes of every sample of `trak` out of the `mdat` payload.
pub fn extract_samples<'a>(boxes: &'a Boxes, trak: &TrakBox) -> Result<Vec<&'a [u8]>> {
    let ranges = sample_ranges(trak)?;
    if ranges.is_empty() {
        return Ok(Vec::new());
    }
    let mdat = boxes
        .mdat
        .as_ref()
        .ok_or_else(|| ParseError::TruncatedInput("samples without an mdat box".into()))?;
    ranges
        .iter()
        .map(|s| {
            mdat.slice(s.offset, s.size as u64).ok_or_else(|| {
                ParseError::TruncatedInput(format!(
                    "sample {} at {}+{} lies outside mdat",
                    s.index, s.offset, s.size
                ))
            })
        })
        .collect()
}

fn chunk_offsets(stbl: &StblBox) -> Vec<u64> {
    if let Some(stco) = &stbl.stco {
        stco.chunk_offset.iter().map(|&o| o as u64).collect()
    } else if let Some(co64) = &stbl.co64 {
        co64.chunk_offset.clone()
    } else {
        Vec::new()
    }
}

/// Samples per chunk from the stsc runs, one entry per chunk.
fn samples_per_chunk(stbl: &StblBox, chunk_count: usize) -> Vec<u32> {
    let runs = stbl.stsc.as_ref().map(|s| s.entries.as_slice()).unwrap_or(&[]);
    let mut run = 0;
    let mut counts = Vec::with_capacity(chunk_count);
    for chunk_idx in 0..chunk_count {
        let chunk_number = chunk_idx as u32 + 1;
        while runs.get(run + 1).is_some_and(|next| next.first_chunk <= chunk_number) {
            run += 1;
        }
        let count = match runs.get(run) {
            Some(e) if e.first_chunk <= chunk_number => e.samples_per_chunk,
            _ => 0,
        };
        counts.push(count);
    }
    counts
}

/// stss sample numbers, queried in increasing order; every sample is sync without stss.
struct SyncSamples {
    numbers: Option<Vec<u32>>,
    pos: usize,
}

impl SyncSamples {
    fn new(stss: Option<&StssBox>) -> Self {
        let numbers = stss.map(|s| {
            let mut numbers = s.sample_number.clone();
            numbers.sort_unstable();
            numbers
        });
        Self { numbers, pos: 0 }
    }

    fn contains(&mut self, sample_number: u32) -> bool {
        let Some(numbers) = &self.numbers else {
            return true;
        };
        while numbers.get(self.pos).is_some_and(|&n| n < sample_number) {
            self.pos += 1;
        }
        numbers.get(self.pos) == Some(&sample_number)
    }
}

/// Walks stts run by run; past the last run the last delta repeats.
struct Durations<'a> {
    entries: &'a [crate::mp4::stbl::SttsEntry],
    entry: usize,
    used: u32,
}

impl<'a> Durations<'a> {
    fn new(stts: Option<&'a SttsBox>) -> Self {
        Self { entries: stts.map(|s| s.entries.as_slice()).unwrap_or(&[]), entry: 0, used: 0 }
    }

    fn next(&mut self) -> u32 {
        while let Some(e) = self.entries.get(self.entry) {
            if self.used < e.sample_count {
                self.used += 1;
                return e.sample_delta;
            }
            self.entry += 1;
            self.used = 0;
        }
        self.entries.last().map(|e| e.sample_delta).unwrap_or(0)
    }
}

/// Walks ctts run by run; 0 outside the table.
struct CompositionOffsets<'a> {
    entries: &'a [crate::mp4::stbl::CttsEntry],
    entry: usize,
    used: u32,
}

impl<'a> CompositionOffsets<'a> {
    fn new(ctts: Option<&'a CttsBox>) -> Self {
        Self { entries: ctts.map(|c| c.entries.as_slice()).unwrap_or(&[]), entry: 0, used: 0 }
    }

    fn next(&mut self) -> i64 {
        while let Some(e) = self.entries.get(self.entry) {
            if self.used < e.sample_count {
                self.used += 1;
                return e.sample_offset;
            }
            self.entry += 1;
            self.used = 0;
        }
        0
    }
}
