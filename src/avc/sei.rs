//! Supplemental enhancement information, ISO/IEC 14496-10 7.3.2.3.

use crate::error::{ParseError, Result};
use crate::util::hex_bytes;
use serde::Serialize;

const USER_DATA_UNREGISTERED: u64 = 5;
const RBSP_TRAILING_BITS: u8 = 0x80;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SeiMessage {
    pub payloads: Vec<SeiPayload>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SeiPayload {
    pub payload_type: u64,
    pub payload_size: u64,
    #[serde(serialize_with = "hex_bytes")]
    pub data: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data_unregistered: Option<UserDataUnregistered>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserDataUnregistered {
    #[serde(serialize_with = "hex_bytes")]
    pub uuid_iso_iec_11578: [u8; 16],
    #[serde(serialize_with = "hex_bytes")]
    pub user_data_payload_byte: Vec<u8>,
}

impl SeiMessage {
    /// Decode every `sei_message()` up to the trailing bits.
    pub fn parse(rbsp: &[u8]) -> Result<Self> {
        let mut msg = SeiMessage::default();
        let mut rest = rbsp;
        while !rest.is_empty() && rest != &[RBSP_TRAILING_BITS][..] {
            let payload_type = read_ff_coded(&mut rest)?;
            let payload_size = read_ff_coded(&mut rest)?;
            if payload_size > rest.len() as u64 {
                return Err(ParseError::TruncatedInput(format!(
                    "sei payload {} of {} bytes, {} left",
                    payload_type,
                    payload_size,
                    rest.len()
                )));
            }
            let (data, tail) = rest.split_at(payload_size as usize);
            rest = tail;

            let user_data_unregistered = if payload_type == USER_DATA_UNREGISTERED {
                UserDataUnregistered::parse(data)
            } else {
                None
            };
            msg.payloads.push(SeiPayload {
                payload_type,
                payload_size,
                data: data.to_vec(),
                user_data_unregistered,
            });
        }
        Ok(msg)
    }
}

impl UserDataUnregistered {
    fn parse(data: &[u8]) -> Option<Self> {
        let (uuid, payload) = data.split_first_chunk::<16>()?;
        Some(Self { uuid_iso_iec_11578: *uuid, user_data_payload_byte: payload.to_vec() })
    }
}

/// A value written as a run of `0xFF` bytes, each adding 255, then a final byte.
fn read_ff_coded(rest: &mut &[u8]) -> Result<u64> {
    let mut value = 0u64;
    loop {
        let (&b, tail) = rest
            .split_first()
            .ok_or_else(|| ParseError::TruncatedInput("sei message header".into()))?;
        *rest = tail;
        value += b as u64;
        if b != 0xFF {
            return Ok(value);
        }
    }
}
