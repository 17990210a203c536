//! Common utility functions

pub mod duration;

pub use duration::{parse_duration, DurationParseError};
