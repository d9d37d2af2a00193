use crate::error::{ParseError, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccessUnitDelimiter {
    pub primary_pic_type: u8, // 3 bits
}

impl AccessUnitDelimiter {
    pub fn parse(rbsp: &[u8]) -> Result<Self> {
        let first = rbsp
            .first()
            .ok_or_else(|| ParseError::TruncatedInput("empty access unit delimiter".into()))?;
        Ok(Self { primary_pic_type: first >> 5 })
    }
}
