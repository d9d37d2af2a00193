mod common;

use common::BitWriter;
use mp4avc::ParseError;
use mp4avc::avc::SequenceParameterSetData;

/// Prefix the fixed profile/constraint/level bytes to bit-level fields.
fn rbsp(profile_idc: u8, level_idc: u8, fields: Vec<u8>) -> Vec<u8> {
    let mut v = vec![profile_idc, 0x00, level_idc];
    v.extend(fields);
    v
}

#[test]
fn baseline_vector() {
    let data = [0x42, 0x00, 0x0A, 0xF8, 0x41, 0xA2];
    let mut src = &data[..];
    let (sps, consumed) = SequenceParameterSetData::parse_from(&mut src, data.len() as u64).unwrap();
    assert_eq!(consumed, 6);
    assert_eq!(sps.profile_idc, 66);
    assert_eq!(sps.level_idc, 10);
    assert_eq!(sps.seq_parameter_set_id.value, 0);
    assert_eq!(sps.chroma_format_idc, None);
    assert_eq!(sps.pic_order_cnt_type.value, 0);
    assert_eq!(sps.log2_max_pic_order_cnt_lsb_minus4.map(|v| v.value), Some(0));
    assert_eq!(sps.pic_width_in_mbs_minus1.value, 7);
    assert_eq!(sps.pic_height_in_map_units_minus1.value, 5);
    assert_eq!(sps.frame_mbs_only_flag, 1);
    assert_eq!(sps.mb_adaptive_frame_field_flag, None);
    assert_eq!(sps.frame_cropping_flag, 0);
    assert_eq!(sps.vui_parameters_present_flag, 0);
    assert!(sps.vui_tail.is_none());
    assert_eq!((sps.width(), sps.height()), (128, 96));
}

#[test]
fn constraint_flags_come_from_the_second_byte() {
    let sps = SequenceParameterSetData::parse(&[0x42, 0b1010_0100, 0x0A, 0xF8, 0x41, 0xA2]).unwrap();
    assert_eq!(sps.constraint_set0_flag, 1);
    assert_eq!(sps.constraint_set1_flag, 0);
    assert_eq!(sps.constraint_set2_flag, 1);
    assert_eq!(sps.constraint_set3_flag, 0);
    assert_eq!(sps.constraint_set4_flag, 0);
    assert_eq!(sps.constraint_set5_flag, 1);
}

#[test]
fn high_profile_with_scaling_lists_and_cropping() {
    let mut w = BitWriter::new();
    w.ue(0) // seq_parameter_set_id
        .ue(1) // chroma_format_idc
        .ue(0)
        .ue(0)
        .bit(false) // qpprime_y_zero_transform_bypass_flag
        .bit(true); // seq_scaling_matrix_present_flag
    // list 0: a first delta of -8 selects the default matrix
    w.bit(true).se(-8);
    for _ in 1..6 {
        w.bit(false);
    }
    // list 6: 8 + 8 = 16, held by 63 zero deltas
    w.bit(true).se(8);
    for _ in 1..64 {
        w.se(0);
    }
    w.bit(false);
    w.ue(4) // log2_max_frame_num_minus4
        .ue(2) // pic_order_cnt_type
        .ue(4) // max_num_ref_frames
        .bit(false)
        .ue(119)
        .ue(67)
        .bit(true) // frame_mbs_only_flag
        .bit(true)
        .bit(true) // frame_cropping_flag
        .ue(0)
        .ue(0)
        .ue(0)
        .ue(4)
        .bit(false); // vui_parameters_present_flag
    let field_bits = w.bit_len() as u64;
    let data = rbsp(100, 40, w.finish_rbsp());

    let mut src = &data[..];
    let (sps, consumed) = SequenceParameterSetData::parse_from(&mut src, data.len() as u64).unwrap();
    assert_eq!(consumed, 3 + field_bits.div_ceil(8));
    assert_eq!(sps.chroma_format_idc.map(|v| v.value), Some(1));
    assert_eq!(sps.separate_colour_plane_flag, None);
    assert_eq!(sps.seq_scaling_matrix_present_flag, Some(1));
    assert_eq!(sps.seq_scaling_list_present_flag, vec![1, 0, 0, 0, 0, 0, 1, 0]);

    assert_eq!(sps.scaling_list_4x4.len(), 1);
    let list = &sps.scaling_list_4x4[0];
    assert_eq!(list.index, 0);
    assert!(list.use_default_scaling_matrix_flag);
    assert_eq!(list.scaling_list.len(), 16);

    assert_eq!(sps.scaling_list_8x8.len(), 1);
    let list = &sps.scaling_list_8x8[0];
    assert_eq!(list.index, 6);
    assert_eq!(list.delta_scale.len(), 64);
    assert!(!list.use_default_scaling_matrix_flag);
    assert!(list.scaling_list.iter().all(|&s| s == 16));

    assert_eq!(sps.log2_max_frame_num_minus4.value, 4);
    assert_eq!(sps.log2_max_pic_order_cnt_lsb_minus4, None);
    assert_eq!(sps.frame_crop_bottom_offset.map(|v| v.value), Some(4));
    assert_eq!((sps.width(), sps.height()), (1920, 1080));
}

#[test]
fn chroma_444_reads_twelve_list_flags() {
    let mut w = BitWriter::new();
    w.ue(0).ue(3).bit(false).ue(2).ue(2).bit(false).bit(true);
    for _ in 0..12 {
        w.bit(false);
    }
    w.ue(0).ue(0).ue(0).ue(1).bit(false).ue(9).ue(8).bit(true).bit(true).bit(false).bit(false);
    let data = rbsp(244, 51, w.finish_rbsp());

    let sps = SequenceParameterSetData::parse(&data).unwrap();
    assert_eq!(sps.chroma_format_idc.map(|v| v.value), Some(3));
    assert_eq!(sps.separate_colour_plane_flag, Some(0));
    assert_eq!(sps.bit_depth_luma_minus8.map(|v| v.value), Some(2));
    assert_eq!(sps.seq_scaling_list_present_flag.len(), 12);
    assert!(sps.scaling_list_4x4.is_empty() && sps.scaling_list_8x8.is_empty());
    assert_eq!((sps.width(), sps.height()), (160, 144));
}

#[test]
fn poc_type_one_and_interlaced_height() {
    let mut w = BitWriter::new();
    w.ue(1) // seq_parameter_set_id
        .ue(0)
        .ue(1) // pic_order_cnt_type
        .bit(false)
        .se(-3)
        .se(2)
        .ue(2)
        .se(5)
        .se(-5)
        .ue(1)
        .bit(false)
        .ue(10)
        .ue(8)
        .bit(false) // frame_mbs_only_flag
        .bit(true) // mb_adaptive_frame_field_flag
        .bit(true)
        .bit(false)
        .bit(false);
    let data = rbsp(77, 30, w.finish_rbsp());

    let sps = SequenceParameterSetData::parse(&data).unwrap();
    assert_eq!(sps.seq_parameter_set_id.value, 1);
    assert_eq!(sps.delta_pic_order_always_zero_flag, Some(0));
    assert_eq!(sps.offset_for_non_ref_pic.map(|v| v.value), Some(-3));
    assert_eq!(sps.offset_for_top_to_bottom_field.map(|v| v.value), Some(2));
    assert_eq!(sps.num_ref_frames_in_pic_order_cnt_cycle.map(|v| v.value), Some(2));
    let offsets: Vec<i64> = sps.offset_for_ref_frame.iter().map(|v| v.value).collect();
    assert_eq!(offsets, vec![5, -5]);
    assert_eq!(sps.mb_adaptive_frame_field_flag, Some(1));
    assert_eq!((sps.width(), sps.height()), (176, 288));
}

#[test]
fn oversized_dimensions_saturate() {
    let mut w = BitWriter::new();
    w.ue(0)
        .ue(0)
        .ue(0)
        .ue(0)
        .ue(0)
        .bit(false)
        .ue(u64::MAX / 8) // pic_width_in_mbs_minus1
        .ue(u64::MAX / 8) // pic_height_in_map_units_minus1
        .bit(false) // frame_mbs_only_flag
        .bit(false)
        .bit(false)
        .bit(true) // frame_cropping_flag
        .ue(u64::MAX / 2)
        .ue(0)
        .ue(0)
        .ue(u64::MAX / 2)
        .bit(false);
    let data = rbsp(66, 10, w.finish_rbsp());

    let sps = SequenceParameterSetData::parse(&data).unwrap();
    assert_eq!(sps.pic_width_in_mbs_minus1.value, u64::MAX / 8);
    // u64::MAX less a crop of 2 * (u64::MAX / 2)
    assert_eq!(sps.width(), 1);
    assert_eq!(sps.height(), 0);
}

#[test]
fn vui_is_kept_as_raw_remainder() {
    let mut w = BitWriter::new();
    w.ue(0).ue(0).ue(0).ue(0).ue(0).bit(false).ue(7).ue(5).bit(true).bit(false).bit(false).bit(true);
    let field_bits = w.bit_len();
    assert_eq!(field_bits, 22);
    let mut fields = w.into_bytes();
    fields.extend_from_slice(&[0xAB, 0xCD]);
    let data = rbsp(66, 10, fields);

    let mut src = &data[..];
    let (sps, consumed) = SequenceParameterSetData::parse_from(&mut src, data.len() as u64).unwrap();
    assert_eq!(consumed, 6);
    assert_eq!(sps.vui_parameters_present_flag, 1);
    let tail = sps.vui_tail.as_ref().unwrap();
    assert_eq!(tail.remain.bits_left, 2);
    assert_eq!(tail.bytes, vec![0xAB, 0xCD]);

    let json = serde_json::to_value(&sps).unwrap();
    assert_eq!(json["vui_tail"]["bytes"], "abcd");
}

#[test]
fn truncated_sps_fails() {
    assert!(matches!(
        SequenceParameterSetData::parse(&[0x42, 0x00]),
        Err(ParseError::TruncatedInput(_))
    ));
    assert!(matches!(
        SequenceParameterSetData::parse(&[0x42, 0x00, 0x0A, 0xF8]),
        Err(ParseError::TruncatedInput(_))
    ));
}

#[test]
fn json_uses_field_names_and_drops_absent_branches() {
    let sps = SequenceParameterSetData::parse(&[0x42, 0x00, 0x0A, 0xF8, 0x41, 0xA2]).unwrap();
    let json = serde_json::to_value(&sps).unwrap();
    assert_eq!(json["profile_idc"], 66);
    assert_eq!(json["log2_max_pic_order_cnt_lsb_minus4"], 0);
    assert!(json.get("chroma_format_idc").is_none());
    assert!(json.get("offset_for_ref_frame").is_none());
    assert!(json.get("vui_tail").is_none());
}
