use crate::avc::{AnnexBStream, ElementaryStream};
use crate::error::Result;
use crate::mp4::{AvcDecoderConfigurationRecord, Boxes, TrakBox};
use crate::samples::extract_samples;
use log::debug;
use std::io::Read;

/// Parse an MP4/ISOBMFF stream into its typed box tree.
///
/// The source is read front to back exactly once; it does not need to be
/// seekable. On failure the boxes decoded so far are lost; call
/// [`Boxes::parse`] on a [`Boxes::new`] value directly to keep them.
///
/// # Example
/// ```no_run
/// use mp4avc::get_boxes;
/// use std::fs::File;
///
/// let mut file = File::open("video.mp4")?;
/// let boxes = get_boxes(&mut file)?;
/// println!("{} tracks", boxes.tracks().len());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn get_boxes(r: &mut dyn Read) -> Result<Boxes> {
    let mut boxes = Boxes::new();
    boxes.parse(r)?;
    Ok(boxes)
}

/// The first `vide` track that carries an AVC configuration record.
pub fn video_track(boxes: &Boxes) -> Option<(&TrakBox, &AvcDecoderConfigurationRecord)> {
    boxes.tracks().iter().find_map(|trak| {
        if trak.handler_type() != Some("vide") {
            return None;
        }
        let avcc = trak.stbl()?.stsd.as_ref()?.avc()?.avcc.as_ref()?;
        Some((trak, &avcc.record))
    })
}

/// Decode the samples of the first AVC video track as length-prefixed NAL units.
///
/// Every sample is handed to the elementary stream parser on its own, so a
/// NAL unit can never run across a sample boundary. Returns `None` when
/// the file has no AVC video track.
///
/// # Example
/// ```no_run
/// use mp4avc::{get_boxes, video_elementary_stream};
/// use std::fs::File;
///
/// let boxes = get_boxes(&mut File::open("video.mp4")?)?;
/// if let Some(es) = video_elementary_stream(&boxes)? {
///     println!("{} nal units", es.length_nalu.len());
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn video_elementary_stream(boxes: &Boxes) -> Result<Option<ElementaryStream>> {
    let Some((trak, record)) = video_track(boxes) else {
        return Ok(None);
    };
    let mut es = ElementaryStream::new(record.length_size())?;
    for (i, sample) in extract_samples(boxes, trak)?.into_iter().enumerate() {
        let mut src = sample;
        let parsed = es.parse(&mut src, sample.len() as u64)?;
        debug!("sample {}: {} bytes", i, parsed);
    }
    Ok(Some(es))
}

/// Decode a raw H.264 Annex B byte stream (`.h264`).
pub fn parse_annexb(r: &mut dyn Read) -> Result<AnnexBStream> {
    AnnexBStream::parse(r)
}
