//! H.264 / AVC bitstream structures.

pub mod annexb;
pub mod aud;
pub mod es;
pub mod nalu;
pub mod sei;
pub mod sps;

pub use annexb::{AnnexBStream, split_annex_b};
pub use aud::AccessUnitDelimiter;
pub use es::{ElementaryStream, LengthNalu};
pub use nalu::{NalUnit, NaluPayload, NaluType, remove_emulation_prevention};
pub use sei::{SeiMessage, SeiPayload, UserDataUnregistered};
pub use sps::{RawRemainder, ScalingList, SequenceParameterSetData};
