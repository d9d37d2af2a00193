mod common;

use common::{PPS_NALU, SPS_NALU, avc1, avcc, boxed, cat, ftyp, full_boxed, hdlr, mdhd, mvhd, table, tkhd};
use mp4avc::avc::{AnnexBStream, ElementaryStream, NaluPayload};
use mp4avc::mp4::SampleEntry;
use mp4avc::samples::extract_samples;
use mp4avc::{ParseError, get_boxes, parse_annexb, video_elementary_stream, video_track};

fn nalu_types(es: &ElementaryStream) -> Vec<u8> {
    es.length_nalu.iter().map(|l| l.nalu.nal_unit_type).collect()
}

#[test]
fn four_byte_lengths() {
    let mut data = vec![0, 0, 0, 2, 0x09, 0xF0, 0, 0, 0, 7];
    data.extend_from_slice(&SPS_NALU);
    data.extend_from_slice(&[0, 0, 0, 3, 0x65, 0x88, 0x84]);

    let mut es = ElementaryStream::new(4).unwrap();
    let mut src = &data[..];
    assert_eq!(es.parse(&mut src, data.len() as u64).unwrap(), data.len() as u64);
    assert_eq!(nalu_types(&es), vec![9, 7, 5]);
    let lengths: Vec<u32> = es.length_nalu.iter().map(|l| l.length).collect();
    assert_eq!(lengths, vec![2, 7, 3]);
    assert!(matches!(es.length_nalu[1].nalu.payload, NaluPayload::Sps(_)));
}

#[test]
fn narrow_lengths() {
    let cases: [(u8, Vec<u8>); 3] = [
        (1, vec![2, 0x09, 0xF0, 3, 0x41, 0x9A, 0x02]),
        (2, vec![0, 2, 0x09, 0xF0, 0, 3, 0x41, 0x9A, 0x02]),
        (3, vec![0, 0, 2, 0x09, 0xF0, 0, 0, 3, 0x41, 0x9A, 0x02]),
    ];
    for (length_size, data) in cases {
        let mut es = ElementaryStream::new(length_size).unwrap();
        let mut src = &data[..];
        es.parse(&mut src, data.len() as u64).unwrap();
        assert_eq!(nalu_types(&es), vec![9, 1], "length size {}", length_size);
    }
}

#[test]
fn length_size_must_be_one_to_four() {
    assert!(matches!(ElementaryStream::new(0), Err(ParseError::InvalidLengthSize(0))));
    assert!(matches!(ElementaryStream::new(5), Err(ParseError::InvalidLengthSize(5))));
}

#[test]
fn length_past_the_range_is_truncation() {
    let data = [0, 0, 0, 9, 0x41, 0x9A];
    let mut es = ElementaryStream::new(4).unwrap();
    let mut src = &data[..];
    assert!(matches!(es.parse(&mut src, 6), Err(ParseError::TruncatedInput(_))));
}

#[test]
fn partial_length_prefix_is_truncation() {
    let data = [0, 2, 0x09, 0xF0, 0];
    let mut es = ElementaryStream::new(2).unwrap();
    let mut src = &data[..];
    assert!(matches!(es.parse(&mut src, 5), Err(ParseError::TruncatedInput(_))));
}

#[test]
fn zero_length_unit_is_truncation() {
    let data = [0, 0];
    let mut es = ElementaryStream::new(2).unwrap();
    let mut src = &data[..];
    assert!(matches!(es.parse(&mut src, 2), Err(ParseError::TruncatedInput(_))));
}

#[test]
fn reads_only_the_given_range() {
    let data = [0, 0, 0, 2, 0x09, 0xF0, 0xFF];
    let mut es = ElementaryStream::new(4).unwrap();
    let mut src = &data[..];
    assert_eq!(es.parse(&mut src, 6).unwrap(), 6);
    assert_eq!(src, &[0xFF]);
}

#[test]
fn later_ranges_append() {
    let mut es = ElementaryStream::new(1).unwrap();
    let first = [2, 0x09, 0xF0];
    let second = [3, 0x41, 0x9A, 0x02];
    es.parse(&mut &first[..], 3).unwrap();
    es.parse(&mut &second[..], 4).unwrap();
    assert_eq!(nalu_types(&es), vec![9, 1]);
}

#[test]
fn unknown_type_in_a_stream_is_kept() {
    let data = [2, 0x00, 0xAB, 2, 0x09, 0xF0];
    let mut es = ElementaryStream::new(1).unwrap();
    es.parse(&mut &data[..], 6).unwrap();
    assert_eq!(nalu_types(&es), vec![0, 9]);
    assert!(matches!(es.length_nalu[0].nalu.payload, NaluPayload::Ignored));
}

#[test]
fn forbidden_bit_in_a_stream_fails() {
    let data = [2, 0x89, 0xF0];
    let mut es = ElementaryStream::new(1).unwrap();
    assert!(matches!(es.parse(&mut &data[..], 3), Err(ParseError::MalformedNalu)));
}

fn annex_b_bytes() -> Vec<u8> {
    let mut data = vec![0, 0, 0, 1, 0x09, 0xF0, 0, 0, 1];
    data.extend_from_slice(&SPS_NALU);
    data.extend_from_slice(&[0, 0, 1]);
    data.extend_from_slice(&PPS_NALU);
    data.extend_from_slice(&[0, 0, 0, 1, 0x65, 0x88, 0x84, 0x00]);
    data
}

#[test]
fn annex_b_stream() {
    let stream = AnnexBStream::from_bytes(&annex_b_bytes()).unwrap();
    let types: Vec<u8> = stream.nalu.iter().map(|n| n.nal_unit_type).collect();
    assert_eq!(types, vec![9, 7, 8, 5]);
    // trailing zero stripped from the last unit
    assert_eq!(stream.nalu[3].raw_bytes, vec![0x65, 0x88, 0x84]);

    let json = serde_json::to_value(&stream).unwrap();
    assert_eq!(json["nalu"][1]["payload"]["seq_parameter_set_data"]["profile_idc"], 66);
}

#[test]
fn annex_b_from_a_reader() {
    let data = annex_b_bytes();
    let stream = parse_annexb(&mut data.as_slice()).unwrap();
    assert_eq!(stream.nalu.len(), 4);

    let empty = parse_annexb(&mut &[0x67u8, 0x42][..]).unwrap();
    assert!(empty.nalu.is_empty());
}

/// `moov` with one track whose `stbl` holds `stsd` plus the given tables.
fn moov(handler: &[u8; 4], sample_entry: Vec<u8>, tables: &[Vec<u8>]) -> Vec<u8> {
    let mut stsd = 1u32.to_be_bytes().to_vec();
    stsd.extend_from_slice(&sample_entry);
    let mut stbl = full_boxed(b"stsd", 0, 0, &stsd);
    stbl.extend_from_slice(&tables.concat());
    let minf = boxed(b"minf", &boxed(b"stbl", &stbl));
    let mdia = boxed(b"mdia", &cat(&[mdhd(12800, 1024), hdlr(handler, "Handler"), minf]));
    let trak = boxed(b"trak", &cat(&[tkhd(1, 128, 96), mdia]));
    boxed(b"moov", &cat(&[mvhd(1000, 80), trak]))
}

fn stsz(sizes: &[u32]) -> Vec<u8> {
    let mut p = 0u32.to_be_bytes().to_vec();
    p.extend_from_slice(&(sizes.len() as u32).to_be_bytes());
    for s in sizes {
        p.extend_from_slice(&s.to_be_bytes());
    }
    full_boxed(b"stsz", 0, 0, &p)
}

/// ftyp (20 bytes), then mdat whose payload starts at offset 28.
const MDAT_DATA_OFFSET: u32 = 28;

fn video_samples() -> Vec<u8> {
    let mut sample0 = vec![0, 0, 0, 2, 0x09, 0xF0, 0, 0, 0, 7];
    sample0.extend_from_slice(&SPS_NALU);
    sample0.extend_from_slice(&[0, 0, 0, 3, 0x65, 0x88, 0x84]);
    let sample1 = vec![0, 0, 0, 3, 0x41, 0x9A, 0x02];
    cat(&[sample0, sample1])
}

fn video_file(sample_sizes: &[u32]) -> Vec<u8> {
    let entry = avc1(128, 96, &avcc(&SPS_NALU, &PPS_NALU));
    let tables = [
        full_boxed(b"stts", 0, 0, &table(&[&[sample_sizes.len() as u32, 512]])),
        full_boxed(b"stsc", 0, 0, &table(&[&[1, sample_sizes.len() as u32, 1]])),
        stsz(sample_sizes),
        full_boxed(b"stco", 0, 0, &table(&[&[MDAT_DATA_OFFSET]])),
    ];
    cat(&[ftyp(), boxed(b"mdat", &video_samples()), moov(b"vide", entry, &tables)])
}

#[test]
fn mp4_video_track_to_nal_units() {
    let data = video_file(&[24, 7]);
    let boxes = get_boxes(&mut data.as_slice()).unwrap();
    assert_eq!(boxes.mdat.as_ref().map(|m| m.data_offset), Some(MDAT_DATA_OFFSET as u64));

    let (trak, record) = video_track(&boxes).expect("no video track");
    assert_eq!(record.length_size(), 4);
    assert_eq!(record.avc_profile_indication, 66);
    let params = record.parameter_set_nalus().unwrap();
    assert_eq!(params.len(), 2);
    let NaluPayload::Sps(sps) = &params[0].payload else {
        panic!("first parameter set is not an sps");
    };
    assert_eq!((sps.width(), sps.height()), (128, 96));
    assert_eq!(params[1].nal_unit_type, 8);

    let samples = extract_samples(&boxes, trak).unwrap();
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[1], &[0, 0, 0, 3, 0x41, 0x9A, 0x02]);

    let es = video_elementary_stream(&boxes).unwrap().expect("no elementary stream");
    assert_eq!(es.length_size, 4);
    assert_eq!(nalu_types(&es), vec![9, 7, 5, 1]);
}

#[test]
fn nal_unit_cannot_cross_a_sample_boundary() {
    let data = video_file(&[20, 11]);
    let boxes = get_boxes(&mut data.as_slice()).unwrap();
    assert!(matches!(video_elementary_stream(&boxes), Err(ParseError::TruncatedInput(_))));
}

fn mp4a_with_esds() -> Vec<u8> {
    let mut p = vec![0u8; 6];
    p.extend_from_slice(&1u16.to_be_bytes()); // data_reference_index
    p.extend_from_slice(&[0u8; 8]); // version, revision, vendor
    p.extend_from_slice(&2u16.to_be_bytes()); // channel_count
    p.extend_from_slice(&16u16.to_be_bytes()); // sample_size
    p.extend_from_slice(&[0u8; 4]);
    p.extend_from_slice(&(44100u32 << 16).to_be_bytes());

    let dsi = [0x05, 0x02, 0x12, 0x10];
    let mut dcd = vec![0x04, 17, 0x40, 0x15, 0x00, 0x18, 0x00];
    dcd.extend_from_slice(&128_000u32.to_be_bytes());
    dcd.extend_from_slice(&96_000u32.to_be_bytes());
    dcd.extend_from_slice(&dsi);
    let mut es = vec![0x03, 25, 0x00, 0x02, 0x00];
    es.extend_from_slice(&dcd);
    es.extend_from_slice(&[0x06, 0x01, 0x02]);
    p.extend_from_slice(&full_boxed(b"esds", 0, 0, &es));
    boxed(b"mp4a", &p)
}

#[test]
fn audio_only_file_has_no_video_stream() {
    let data = cat(&[ftyp(), moov(b"soun", mp4a_with_esds(), &[])]);
    let boxes = get_boxes(&mut data.as_slice()).unwrap();
    assert!(video_track(&boxes).is_none());
    assert!(video_elementary_stream(&boxes).unwrap().is_none());

    let stsd = boxes.tracks()[0].stbl().and_then(|s| s.stsd.as_ref()).unwrap();
    let SampleEntry::Audio(mp4a) = &stsd.entries[0] else {
        panic!("expected an audio sample entry");
    };
    assert_eq!(mp4a.channel_count, 2);
    assert_eq!(mp4a.sample_rate >> 16, 44100);
    let es = mp4a.esds.as_ref().and_then(|e| e.es_descriptor.as_ref()).unwrap();
    assert_eq!(es.es_id, 2);
    assert_eq!(es.sl_config_predefined, Some(2));
    let dc = es.decoder_config.as_ref().unwrap();
    assert_eq!(dc.object_type_indication, 0x40);
    assert_eq!(dc.stream_type, 5);
    assert_eq!(dc.buffer_size_db, 0x1800);
    assert_eq!(dc.max_bitrate, 128_000);
    assert_eq!(dc.audio_object_type(), Some(2));
}
