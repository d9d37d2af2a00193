pub mod api;
pub mod avc;
pub mod bits;
pub mod boxes;
pub mod error;
pub mod known_boxes;
pub mod mp4;
pub mod parser;
pub mod registry;
pub mod samples;
pub mod util;

pub use api::{get_boxes, parse_annexb, video_elementary_stream, video_track};
pub use boxes::{BoxHeader, FourCC, FullHeader};
pub use error::{ParseError, Result};
pub use mp4::Boxes;
pub use parser::{parse_children, read_box_header};
