//! Sequence parameter set, ISO/IEC 14496-10 7.3.2.1.1.

use crate::bits::{RemainBits, Signed, Unsigned, read_flag};
use crate::error::Result;
use crate::util::hex_bytes;
use byteorder::ReadBytesExt;
use log::{trace, warn};
use serde::Serialize;
use std::io::Read;

/// Profiles whose SPS carries chroma format, bit depth and scaling matrices.
const HIGH_PROFILES: [u8; 9] = [100, 110, 122, 244, 44, 83, 86, 118, 128];

/// Bytes before the first bit-level field.
const FIXED_BYTES: u64 = 3;

/// Bits of a parameter set that are kept but not interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawRemainder {
    /// Unread low bits of the byte the decoded fields ended in.
    pub remain: RemainBits,
    #[serde(serialize_with = "hex_bytes")]
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScalingList {
    /// Position among the `seq_scaling_list_present_flag`s.
    pub index: usize,
    pub delta_scale: Vec<Signed>,
    pub scaling_list: Vec<u8>,
    pub use_default_scaling_matrix_flag: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SequenceParameterSetData {
    pub profile_idc: u8,
    pub constraint_set0_flag: u8,
    pub constraint_set1_flag: u8,
    pub constraint_set2_flag: u8,
    pub constraint_set3_flag: u8,
    pub constraint_set4_flag: u8,
    pub constraint_set5_flag: u8,
    pub level_idc: u8,
    pub seq_parameter_set_id: Unsigned,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chroma_format_idc: Option<Unsigned>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separate_colour_plane_flag: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_depth_luma_minus8: Option<Unsigned>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_depth_chroma_minus8: Option<Unsigned>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qpprime_y_zero_transform_bypass_flag: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq_scaling_matrix_present_flag: Option<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub seq_scaling_list_present_flag: Vec<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scaling_list_4x4: Vec<ScalingList>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scaling_list_8x8: Vec<ScalingList>,

    pub log2_max_frame_num_minus4: Unsigned,
    pub pic_order_cnt_type: Unsigned,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log2_max_pic_order_cnt_lsb_minus4: Option<Unsigned>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_pic_order_always_zero_flag: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_for_non_ref_pic: Option<Signed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_for_top_to_bottom_field: Option<Signed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_ref_frames_in_pic_order_cnt_cycle: Option<Unsigned>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub offset_for_ref_frame: Vec<Signed>,

    pub max_num_ref_frames: Unsigned,
    pub gaps_in_frame_num_value_allowed_flag: u8,
    pub pic_width_in_mbs_minus1: Unsigned,
    pub pic_height_in_map_units_minus1: Unsigned,
    pub frame_mbs_only_flag: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mb_adaptive_frame_field_flag: Option<u8>,
    pub direct_8x8_inference_flag: u8,
    pub frame_cropping_flag: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_crop_left_offset: Option<Unsigned>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_crop_right_offset: Option<Unsigned>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_crop_top_offset: Option<Unsigned>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_crop_bottom_offset: Option<Unsigned>,
    pub vui_parameters_present_flag: u8,
    /// `vui_parameters()` and everything after it, undecoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vui_tail: Option<RawRemainder>,
}

/// Reads consecutive bit-level fields, handing each decode the bits the
/// previous one left behind and summing their cost.
struct FieldReader<'a> {
    inner: &'a mut dyn Read,
    remain: RemainBits,
    bits: u64,
}

impl<'a> FieldReader<'a> {
    fn new(inner: &'a mut dyn Read) -> Self {
        Self { inner, remain: RemainBits::default(), bits: 0 }
    }

    fn ue(&mut self) -> Result<Unsigned> {
        let (v, remain) = Unsigned::parse(self.inner, self.remain)?;
        self.remain = remain;
        self.bits += v.cost_bits;
        Ok(v)
    }

    fn se(&mut self) -> Result<Signed> {
        let (v, remain) = Signed::parse(self.inner, self.remain)?;
        self.remain = remain;
        self.bits += v.cost_bits;
        Ok(v)
    }

    fn flag(&mut self) -> Result<u8> {
        let (f, remain) = read_flag(self.inner, self.remain)?;
        self.remain = remain;
        self.bits += 1;
        Ok(f as u8)
    }

    /// Bytes the decoded fields touched, the last one possibly in part.
    fn consumed_bytes(&self) -> u64 {
        self.bits.div_ceil(8)
    }

    /// Keep the unread bits and every byte after them.
    fn into_remainder(self) -> Result<RawRemainder> {
        let mut bytes = Vec::new();
        self.inner.read_to_end(&mut bytes)?;
        Ok(RawRemainder { remain: self.remain, bytes })
    }
}

impl ScalingList {
    fn parse(f: &mut FieldReader, index: usize, size: usize) -> Result<Self> {
        let mut list = ScalingList { index, scaling_list: Vec::with_capacity(size), ..Default::default() };
        let mut last_scale: i64 = 8;
        let mut next_scale: i64 = 8;
        for j in 0..size {
            if next_scale != 0 {
                let delta = f.se()?;
                list.delta_scale.push(delta);
                next_scale = (last_scale + delta.value.rem_euclid(256)) % 256;
                list.use_default_scaling_matrix_flag = j == 0 && next_scale == 0;
            }
            let scale = if next_scale == 0 { last_scale } else { next_scale };
            list.scaling_list.push(scale as u8);
            last_scale = scale;
        }
        Ok(list)
    }
}

impl SequenceParameterSetData {
    /// Decode an unescaped SPS payload (the RBSP after the NAL header).
    pub fn parse(rbsp: &[u8]) -> Result<Self> {
        let mut r = rbsp;
        let (sps, _) = Self::parse_from(&mut r, rbsp.len() as u64)?;
        Ok(sps)
    }

    /// Decode from `r`, which holds `size` bytes of RBSP, and return the
    /// decoded set with the number of bytes its fields occupied.
    pub fn parse_from(r: &mut dyn Read, size: u64) -> Result<(Self, u64)> {
        let mut sps = Self { profile_idc: r.read_u8()?, ..Default::default() };
        let flags = r.read_u8()?;
        sps.constraint_set0_flag = (flags >> 7) & 0x1;
        sps.constraint_set1_flag = (flags >> 6) & 0x1;
        sps.constraint_set2_flag = (flags >> 5) & 0x1;
        sps.constraint_set3_flag = (flags >> 4) & 0x1;
        sps.constraint_set4_flag = (flags >> 3) & 0x1;
        sps.constraint_set5_flag = (flags >> 2) & 0x1;
        sps.level_idc = r.read_u8()?;

        let mut f = FieldReader::new(r);
        sps.seq_parameter_set_id = f.ue()?;

        if HIGH_PROFILES.contains(&sps.profile_idc) {
            sps.parse_chroma_and_scaling(&mut f)?;
        }

        sps.log2_max_frame_num_minus4 = f.ue()?;
        sps.pic_order_cnt_type = f.ue()?;
        match sps.pic_order_cnt_type.value {
            0 => sps.log2_max_pic_order_cnt_lsb_minus4 = Some(f.ue()?),
            1 => {
                sps.delta_pic_order_always_zero_flag = Some(f.flag()?);
                sps.offset_for_non_ref_pic = Some(f.se()?);
                sps.offset_for_top_to_bottom_field = Some(f.se()?);
                let cycle = f.ue()?;
                sps.num_ref_frames_in_pic_order_cnt_cycle = Some(cycle);
                for _ in 0..cycle.value {
                    sps.offset_for_ref_frame.push(f.se()?);
                }
            }
            _ => {}
        }

        sps.max_num_ref_frames = f.ue()?;
        sps.gaps_in_frame_num_value_allowed_flag = f.flag()?;
        sps.pic_width_in_mbs_minus1 = f.ue()?;
        sps.pic_height_in_map_units_minus1 = f.ue()?;
        sps.frame_mbs_only_flag = f.flag()?;
        if sps.frame_mbs_only_flag == 0 {
            sps.mb_adaptive_frame_field_flag = Some(f.flag()?);
        }
        sps.direct_8x8_inference_flag = f.flag()?;
        sps.frame_cropping_flag = f.flag()?;
        if sps.frame_cropping_flag != 0 {
            sps.frame_crop_left_offset = Some(f.ue()?);
            sps.frame_crop_right_offset = Some(f.ue()?);
            sps.frame_crop_top_offset = Some(f.ue()?);
            sps.frame_crop_bottom_offset = Some(f.ue()?);
        }
        sps.vui_parameters_present_flag = f.flag()?;

        let consumed = FIXED_BYTES + f.consumed_bytes();
        trace!("sps: {} bits after the fixed bytes", f.bits);
        if sps.vui_parameters_present_flag != 0 {
            warn!("sps: vui_parameters left undecoded");
            sps.vui_tail = Some(f.into_remainder()?);
        }
        if consumed != size {
            warn!("sps: fields occupy {} bytes of {}", consumed, size);
        }
        Ok((sps, consumed))
    }

    fn parse_chroma_and_scaling(&mut self, f: &mut FieldReader) -> Result<()> {
        let chroma = f.ue()?;
        self.chroma_format_idc = Some(chroma);
        if chroma.value == 3 {
            self.separate_colour_plane_flag = Some(f.flag()?);
        }
        self.bit_depth_luma_minus8 = Some(f.ue()?);
        self.bit_depth_chroma_minus8 = Some(f.ue()?);
        self.qpprime_y_zero_transform_bypass_flag = Some(f.flag()?);
        let matrix_present = f.flag()?;
        self.seq_scaling_matrix_present_flag = Some(matrix_present);
        if matrix_present == 0 {
            return Ok(());
        }

        let list_count = if chroma.value != 3 { 8 } else { 12 };
        for i in 0..list_count {
            let present = f.flag()?;
            self.seq_scaling_list_present_flag.push(present);
            if present == 0 {
                continue;
            }
            if i < 6 {
                self.scaling_list_4x4.push(ScalingList::parse(f, i, 16)?);
            } else {
                self.scaling_list_8x8.push(ScalingList::parse(f, i, 64)?);
            }
        }
        Ok(())
    }

    /// `ChromaArrayType`: 0 for monochrome or separately coded planes.
    fn chroma_array_type(&self) -> u64 {
        if self.separate_colour_plane_flag == Some(1) {
            0
        } else {
            self.chroma_format_idc.map(|c| c.value).unwrap_or(1)
        }
    }

    /// Crop units along x and y.
    fn crop_units(&self) -> (u64, u64) {
        let frame_factor = 2 - self.frame_mbs_only_flag.min(1) as u64;
        let (sub_width, sub_height) = match self.chroma_array_type() {
            0 => return (1, frame_factor),
            1 => (2, 2),
            2 => (2, 1),
            _ => (1, 1),
        };
        (sub_width, sub_height * frame_factor)
    }

    /// Picture width in luma samples after frame cropping.
    ///
    /// Saturates rather than overflowing on nonsensical sizes.
    pub fn width(&self) -> u64 {
        let full = self.pic_width_in_mbs_minus1.value.saturating_add(1).saturating_mul(16);
        let (unit_x, _) = self.crop_units();
        let crop = offset_value(self.frame_crop_left_offset)
            .saturating_add(offset_value(self.frame_crop_right_offset));
        full.saturating_sub(crop.saturating_mul(unit_x))
    }

    /// Picture height in luma samples after frame cropping.
    pub fn height(&self) -> u64 {
        let frame_factor = 2 - self.frame_mbs_only_flag.min(1) as u64;
        let full = self
            .pic_height_in_map_units_minus1
            .value
            .saturating_add(1)
            .saturating_mul(16)
            .saturating_mul(frame_factor);
        let (_, unit_y) = self.crop_units();
        let crop = offset_value(self.frame_crop_top_offset)
            .saturating_add(offset_value(self.frame_crop_bottom_offset));
        full.saturating_sub(crop.saturating_mul(unit_y))
    }
}

fn offset_value(offset: Option<Unsigned>) -> u64 {
    offset.map(|v| v.value).unwrap_or(0)
}
