//! Channel layer for prompt matching and session transcripts.

mod buffer;
pub mod transcript;

pub use buffer::PatternBuffer;
pub use transcript::Transcript;
