//! Lossless concatenation of same-codec chunk files.
//!
//! Chunks are rendered with identical composition settings, so the concat
//! demuxer with stream copy joins them bit-exactly: no re-encoded seams,
//! no quality loss, and per-chunk audio/video sync is preserved.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Concatenate `inputs` in order into `output` without re-encoding.
///
/// Writes an ffconcat manifest next to the output, invokes the concat
/// demuxer with `-c copy`, and removes the manifest on every exit path.
/// Any failure aborts the whole operation; there is no partial output.
pub async fn concat_copy(inputs: &[PathBuf], output: impl AsRef<Path>) -> MediaResult<()> {
    let output = output.as_ref();

    if inputs.is_empty() {
        return Err(MediaError::ConcatEmpty);
    }
    for input in inputs {
        if !input.exists() {
            return Err(MediaError::ConcatInputMissing(input.clone()));
        }
    }

    let manifest_path = manifest_path_for(output);
    fs::write(&manifest_path, build_manifest(inputs)).await?;
    debug!(
        "Wrote concat manifest with {} entries: {}",
        inputs.len(),
        manifest_path.display()
    );

    let cmd = FfmpegCommand::new(&manifest_path, output)
        .concat_demuxer()
        .codec_copy();

    let result = FfmpegRunner::new().run(&cmd).await;

    // The manifest is scratch state; remove it whether ffmpeg succeeded or not.
    if let Err(e) = fs::remove_file(&manifest_path).await {
        tracing::warn!(
            "Failed to remove concat manifest {}: {}",
            manifest_path.display(),
            e
        );
    }

    result?;
    info!(
        "Concatenated {} chunks into {}",
        inputs.len(),
        output.display()
    );
    Ok(())
}

/// Manifest location derived from the output path.
fn manifest_path_for(output: &Path) -> PathBuf {
    output.with_extension("concat.txt")
}

/// Build the ffconcat manifest body.
///
/// Single quotes inside paths are escaped per the ffconcat grammar
/// (`'` closes the quote, `\'` emits one, then the quote reopens).
fn build_manifest(inputs: &[PathBuf]) -> String {
    let mut manifest = String::from("ffconcat version 1.0\n");
    for input in inputs {
        let escaped = input.to_string_lossy().replace('\'', "'\\''");
        manifest.push_str(&format!("file '{}'\n", escaped));
    }
    manifest
}
