use anyhow::Context;
use clap::Parser;
use mp4avc::avc::NaluPayload;
use mp4avc::mp4::{SampleEntry, TrakBox};
use mp4avc::registry::Mp4Box;
use mp4avc::samples::{SampleInfo, track_samples_of};
use mp4avc::{Boxes, get_boxes};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Summarise the brands, tracks and H.264 parameters of an MP4 file")]
struct Args {
    /// MP4/ISOBMFF file path
    path: String,

    /// Output as JSON instead of human-readable text
    #[arg(long)]
    json: bool,

    /// Only report this track (1-based, in file order)
    #[arg(long)]
    track: Option<usize>,

    /// Include the per-sample table of each reported track
    #[arg(long)]
    samples: bool,
}

#[derive(Debug, Serialize)]
struct TrackInfo {
    index: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    track_id: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    track_type: Option<String>, // "video" / "audio" / "other"

    #[serde(skip_serializing_if = "Option::is_none")]
    codec: Option<String>, // e.g. "avc1", "mp4a"

    #[serde(skip_serializing_if = "Option::is_none")]
    profile_idc: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    level_idc: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    timescale: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    duration_ticks: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    duration_seconds: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,

    sample_count: u32,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    samples: Vec<SampleInfo>,
}

#[derive(Debug, Serialize)]
struct MediaInfo {
    file: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    major_brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minor_version: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    compatible_brands: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    movie_timescale: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    movie_duration_ticks: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    movie_duration_seconds: Option<f64>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    tracks: Vec<TrackInfo>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let path = PathBuf::from(&args.path);

    let file = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
    let boxes = get_boxes(&mut BufReader::new(file)).with_context(|| format!("parsing {}", path.display()))?;

    let mut info = media_info(&boxes, path.display().to_string());
    for (i, trak) in boxes.tracks().iter().enumerate() {
        let index = i + 1;
        if args.track.is_some_and(|t| t != index) {
            continue;
        }
        info.tracks.push(track_info(trak, index, args.samples)?);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print_human(&info);
    }

    Ok(())
}

fn media_info(boxes: &Boxes, file: String) -> MediaInfo {
    let mut info = MediaInfo {
        file,
        major_brand: None,
        minor_version: None,
        compatible_brands: Vec::new(),
        movie_timescale: None,
        movie_duration_ticks: None,
        movie_duration_seconds: None,
        tracks: Vec::new(),
    };

    if let Some(ftyp) = &boxes.ftyp {
        info.major_brand = Some(ftyp.major_brand.to_string());
        info.minor_version = Some(ftyp.minor_version);
        info.compatible_brands = ftyp.compatible_brands.iter().map(|b| b.to_string()).collect();
    }

    if let Some(mvhd) = boxes.moov.as_ref().and_then(|m| m.mvhd.as_ref()) {
        info.movie_timescale = Some(mvhd.timescale);
        info.movie_duration_ticks = Some(mvhd.duration);
        info.movie_duration_seconds = seconds(mvhd.duration, mvhd.timescale);
    }
    info
}

fn track_info(trak: &TrakBox, index: usize, with_samples: bool) -> anyhow::Result<TrackInfo> {
    let layout = track_samples_of(trak).with_context(|| format!("resolving samples of track {}", index))?;
    let mut ti = TrackInfo {
        index,
        track_id: trak.tkhd.as_ref().map(|t| t.track_id),
        track_type: trak.handler_type().map(|h| track_type(h).to_string()),
        codec: None,
        profile_idc: None,
        level_idc: None,
        width: None,
        height: None,
        timescale: None,
        duration_ticks: None,
        duration_seconds: None,
        language: None,
        sample_count: layout.sample_count,
        samples: if with_samples { layout.samples } else { Vec::new() },
    };

    // tkhd dimensions are 16.16 fixed point
    if let Some(tkhd) = &trak.tkhd
        && tkhd.width != 0
    {
        ti.width = Some((tkhd.width >> 16) as u64);
        ti.height = Some((tkhd.height >> 16) as u64);
    }

    if let Some(mdhd) = trak.mdia.as_ref().and_then(|m| m.mdhd.as_ref()) {
        ti.timescale = Some(mdhd.timescale);
        ti.duration_ticks = Some(mdhd.duration);
        ti.duration_seconds = seconds(mdhd.duration, mdhd.timescale);
        ti.language = Some(mdhd.language.clone());
    }

    let entry = trak.stbl().and_then(|s| s.stsd.as_ref()).and_then(|s| s.entries.first());
    if let Some(entry) = entry {
        ti.codec = Some(entry.header().typ.to_string());
    }

    // The coded size from the SPS is more precise than tkhd's display size.
    if let Some(SampleEntry::Visual(visual)) = entry
        && let Some(avcc) = &visual.avcc
    {
        let nalus = avcc.record.parameter_set_nalus().context("decoding avcC parameter sets")?;
        for nalu in nalus {
            if let NaluPayload::Sps(sps) = &nalu.payload {
                ti.profile_idc = Some(sps.profile_idc);
                ti.level_idc = Some(sps.level_idc);
                ti.width = Some(sps.width());
                ti.height = Some(sps.height());
                break;
            }
        }
    }

    Ok(ti)
}

fn track_type(handler: &str) -> &'static str {
    match handler {
        "vide" => "video",
        "soun" => "audio",
        _ => "other",
    }
}

fn seconds(ticks: u64, timescale: u32) -> Option<f64> {
    (timescale != 0).then(|| ticks as f64 / timescale as f64)
}

fn print_human(info: &MediaInfo) {
    println!("File: {}", info.file);
    if let Some(major) = &info.major_brand {
        println!("Major brand: {}", major);
    }
    if let Some(minor) = info.minor_version {
        println!("Minor version: {}", minor);
    }
    if !info.compatible_brands.is_empty() {
        println!("Compatible brands: {}", info.compatible_brands.join(", "));
    }
    if let Some(dur) = info.movie_duration_ticks {
        match info.movie_duration_seconds {
            Some(sec) => println!("Movie duration: {} ticks -> {:.3} s", dur, sec),
            None => println!("Movie duration: {} ticks", dur),
        }
    }

    if info.tracks.is_empty() {
        println!("Tracks: (none)");
        return;
    }

    println!("Tracks:");
    for t in &info.tracks {
        println!("  Track {}:", t.index);

        if let Some(id) = t.track_id {
            println!("    id: {}", id);
        }
        if let Some(tt) = &t.track_type {
            println!("    type: {}", tt);
        }
        if let Some(codec) = &t.codec {
            println!("    codec: {}", codec);
        }
        if let (Some(profile), Some(level)) = (t.profile_idc, t.level_idc) {
            println!("    profile/level: {}/{}", profile, level);
        }
        if let (Some(w), Some(h)) = (t.width, t.height) {
            println!("    size: {}x{}", w, h);
        }
        if let Some(ts) = t.timescale {
            println!("    timescale: {}", ts);
        }
        if let Some(dur) = t.duration_ticks {
            if let Some(sec) = t.duration_seconds {
                println!("    duration: {} ticks -> {:.3} s", dur, sec);
            } else {
                println!("    duration: {} ticks", dur);
            }
        }
        if let Some(lang) = &t.language {
            println!("    language: {}", lang);
        }
        println!("    samples: {}", t.sample_count);
        for s in &t.samples {
            println!(
                "      #{:<6} offset={:<10} size={:<8} dts={:<10} cto={:<6}{}",
                s.index,
                s.offset,
                s.size,
                s.dts,
                s.composition_offset,
                if s.is_sync { " sync" } else { "" }
            );
        }
    }
}
