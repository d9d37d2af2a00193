use crate::boxes::{BoxHeader, FullHeader};
use crate::error::{ParseError, Result};
use crate::registry::Mp4Box;
use crate::util::{ByteCursor, hex_bytes};
use byteorder::{BigEndian, ReadBytesExt};
use log::debug;
use serde::Serialize;
use std::io::Read;

const ES_DESCR_TAG: u8 = 0x03;
const DECODER_CONFIG_DESCR_TAG: u8 = 0x04;
const DEC_SPECIFIC_INFO_TAG: u8 = 0x05;
const SL_CONFIG_DESCR_TAG: u8 = 0x06;

/// Elementary stream descriptor box (MPEG-4 systems descriptors).
#[derive(Debug, Clone, Default, Serialize)]
pub struct EsdsBox {
    #[serde(flatten)]
    pub full: FullHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub es_descriptor: Option<EsDescriptor>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EsDescriptor {
    pub es_id: u16,
    pub stream_priority: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on_es_id: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_es_id: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoder_config: Option<DecoderConfigDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sl_config_predefined: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DecoderConfigDescriptor {
    pub object_type_indication: u8,
    pub stream_type: u8,
    pub up_stream: bool,
    pub buffer_size_db: u32,
    pub max_bitrate: u32,
    pub avg_bitrate: u32,
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "hex_bytes")]
    pub decoder_specific_info: Vec<u8>,
}

impl DecoderConfigDescriptor {
    /// MPEG-4 audio object type from the AudioSpecificConfig, e.g. 2 for AAC LC.
    pub fn audio_object_type(&self) -> Option<u8> {
        let dsi = &self.decoder_specific_info;
        let aot = *dsi.first()? >> 3;
        if aot == 31 {
            let ext = ((dsi.first()? & 0x07) << 3) | (dsi.get(1)? >> 5);
            Some(32 + ext)
        } else {
            Some(aot)
        }
    }
}

impl EsdsBox {
    pub fn new(header: BoxHeader) -> Self {
        Self { full: FullHeader::new(header), ..Default::default() }
    }
}

impl Mp4Box for EsdsBox {
    fn header(&self) -> &BoxHeader {
        &self.full.header
    }

    fn parse_payload(&mut self, r: &mut dyn Read) -> Result<()> {
        self.full.parse_version_flag(r)?;
        let mut c = ByteCursor::new(r);
        let data = c.read_rest(&self.full.header)?;
        let mut buf = data.as_slice();
        while !buf.is_empty() {
            let (tag, body) = read_descriptor(&mut buf)?;
            if tag == ES_DESCR_TAG {
                self.es_descriptor = Some(parse_es_descriptor(body)?);
            } else {
                debug!("esds: skipping descriptor tag 0x{:02x} ({} bytes)", tag, body.len());
            }
        }
        c.finish(&self.full.header)
    }
}

fn take_bytes<'a>(buf: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
    let all: &'a [u8] = *buf;
    if n > all.len() {
        return Err(ParseError::TruncatedInput(format!(
            "descriptor field needs {} bytes, {} left",
            n,
            all.len()
        )));
    }
    let (head, rest) = all.split_at(n);
    *buf = rest;
    Ok(head)
}

/// Split one descriptor off `buf`: its tag and body.
///
/// The size is 1 to 4 bytes of 7 bits each, high bit set on all but the last.
fn read_descriptor<'a>(buf: &mut &'a [u8]) -> Result<(u8, &'a [u8])> {
    let tag = buf.read_u8()?;
    let mut size = 0usize;
    for _ in 0..4 {
        let b = buf.read_u8()?;
        size = (size << 7) | (b & 0x7F) as usize;
        if b & 0x80 == 0 {
            break;
        }
    }
    Ok((tag, take_bytes(buf, size)?))
}

fn parse_es_descriptor(mut body: &[u8]) -> Result<EsDescriptor> {
    let mut es = EsDescriptor {
        es_id: body.read_u16::<BigEndian>()?,
        ..Default::default()
    };
    let flags = body.read_u8()?;
    es.stream_priority = flags & 0x1F;
    if flags & 0x80 != 0 {
        es.depends_on_es_id = Some(body.read_u16::<BigEndian>()?);
    }
    if flags & 0x40 != 0 {
        let len = body.read_u8()? as usize;
        es.url = Some(String::from_utf8_lossy(take_bytes(&mut body, len)?).into_owned());
    }
    if flags & 0x20 != 0 {
        es.ocr_es_id = Some(body.read_u16::<BigEndian>()?);
    }

    while !body.is_empty() {
        let (tag, mut inner) = read_descriptor(&mut body)?;
        match tag {
            DECODER_CONFIG_DESCR_TAG => es.decoder_config = Some(parse_decoder_config(inner)?),
            SL_CONFIG_DESCR_TAG => es.sl_config_predefined = Some(inner.read_u8()?),
            _ => debug!("esds: skipping ES sub-descriptor tag 0x{:02x}", tag),
        }
    }
    Ok(es)
}

fn parse_decoder_config(mut body: &[u8]) -> Result<DecoderConfigDescriptor> {
    let object_type_indication = body.read_u8()?;
    let b = body.read_u8()?;
    let mut dc = DecoderConfigDescriptor {
        object_type_indication,
        stream_type: b >> 2,
        up_stream: b & 0x02 != 0,
        buffer_size_db: body.read_u24::<BigEndian>()?,
        max_bitrate: body.read_u32::<BigEndian>()?,
        avg_bitrate: body.read_u32::<BigEndian>()?,
        decoder_specific_info: Vec::new(),
    };
    while !body.is_empty() {
        let (tag, inner) = read_descriptor(&mut body)?;
        if tag == DEC_SPECIFIC_INFO_TAG {
            dc.decoder_specific_info = inner.to_vec();
        }
    }
    Ok(dc)
}
