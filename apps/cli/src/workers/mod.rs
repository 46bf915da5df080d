pub mod cli_completion_sink;
pub mod events;
pub mod materialize_chapters;
pub mod parse_transcript;
pub mod segment_chapters;
