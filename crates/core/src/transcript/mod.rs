pub mod noise;
pub mod parser;
pub mod timecode;

pub use noise::NoiseClassifier;
pub use parser::{LineParser, render_for_inference};
pub use timecode::{canonicalize, format_timestamp, is_canonical, parse_timestamp};
