//! FFmpeg CLI wrapper for the vidforge pipeline.
//!
//! Provides lossless chunk concatenation (concat demuxer, stream copy),
//! a command builder/runner for the ffmpeg binary, and
//! collision-resistant temp-file helpers.

pub mod command;
pub mod concat;
pub mod error;
pub mod temp;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use concat::concat_copy;
pub use error::{MediaError, MediaResult};
pub use temp::{assembled_output_path, chunk_download_path, remove_files_best_effort, RunToken};
