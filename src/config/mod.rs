//! Command line value parsers.

pub mod duration;

pub use duration::parse_duration;
