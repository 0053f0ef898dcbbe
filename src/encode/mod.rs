//! Encoding sinks.
//!
//! Sinks consume composited frames in output order and forward audio verbatim. Container and
//! codec work happens here, never inside the compositor.

/// `ffmpeg`-based muxed video sink.
pub mod ffmpeg;
/// PNG sequence + WAV raw export sink.
pub mod raw;
/// Sink traits and the in-memory sink.
pub mod sink;

use crate::session::config::RenderSessionConfig;
use std::path::Path;

/// Open the sink matching `cfg.raw_export`.
///
/// Raw export treats `out` as a directory; muxed mode treats it as the output video file.
pub fn open_sink_for_config(cfg: &RenderSessionConfig, out: &Path) -> Box<dyn sink::MediaSink> {
    if cfg.raw_export {
        Box::new(raw::RawExportSink::new(out))
    } else {
        Box::new(ffmpeg::FfmpegSink::new(ffmpeg::FfmpegSinkOpts::new(out)))
    }
}
