use crate::boxes::FourCC;
use std::io;

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("io: {0}")]
    Io(io::Error),
    /// Clean end of input at a box or stream boundary.
    #[error("end of stream")]
    EndOfStream,
    #[error("truncated input: {0}")]
    TruncatedInput(String),
    #[error("box {typ}: declared size {size} is smaller than its {header_size}-byte header")]
    NegativePayload { typ: FourCC, size: u64, header_size: u64 },
    #[error("unknown box type {0}")]
    UnknownBoxType(FourCC),
    #[error("box {0} has no version/flags header")]
    NotFullBox(FourCC),
    #[error("box {typ}: decoded {parsed} bytes but payload is {expected} bytes")]
    FieldAccounting { typ: FourCC, parsed: u64, expected: u64 },
    #[error("box {typ}: children span {parsed} bytes but payload is {expected} bytes")]
    SizeMismatch { typ: FourCC, parsed: u64, expected: u64 },
    #[error("box {0} declares size 0 inside a bounded parent")]
    OpenEndedBox(FourCC),
    #[error("box {typ}: {count} entries of {entry_size} bytes exceed the {available} bytes left")]
    EntryCountOverflow { typ: FourCC, count: u64, entry_size: u64, available: u64 },
    #[error("nal unit: forbidden_zero_bit is set")]
    MalformedNalu,
    #[error("nal unit: unknown nal_unit_type {0}")]
    UnknownNaluType(u8),
    #[error("nal unit length size must be 1..=4, got {0}")]
    InvalidLengthSize(u8),
    #[error("cannot read {0} bits at once")]
    InvalidBitCount(u32),
    #[error("exp-golomb code has more than {0} leading zero bits")]
    ExpGolombOverflow(u32),
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            ParseError::TruncatedInput(e.to_string())
        } else {
            ParseError::Io(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
