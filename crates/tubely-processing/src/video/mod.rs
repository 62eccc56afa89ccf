//! Video processing module

pub mod command;
pub mod probe;
pub mod remux;

pub use probe::{parse_probe_output, FfprobeProbe, MediaProbe, VideoDimensions};
pub use remux::{remux_output_path, FfmpegRemuxer, MediaRemuxer};
