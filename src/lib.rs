//! Shutterline renders recorded sessions into movies offline.
//!
//! A host renderer drives a [`RenderSession`] once per engine tick. The session models a
//! virtual camera shutter: while it is open, every tick renders one sub-sample (optionally
//! jittered for antialiasing) and blends it into a ping-pong accumulation buffer; once enough
//! sub-samples exist the composited frame is written to a [`FrameSink`]. Audio buffers are
//! forwarded verbatim to the [`AudioSink`], aligned to the frame whose sync sample was rendered
//! last.
//!
//! - Build a [`RenderSessionConfig`] and validate it
//! - Open a sink ([`FfmpegSink`], [`RawExportSink`] or [`InMemorySink`])
//! - Call [`RenderSession::on_tick`] and [`RenderSession::on_audio_samples`] from the host loop
//! - Finish with [`RenderSession::shutdown`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Encoding sinks.
pub mod encode;
/// Frames, accumulation, jitter tables and sampling policy.
pub mod render;
/// Session configuration, shutter and compositor.
pub mod session;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, Vec2};
pub use crate::foundation::error::{RenderError, RenderResult};

pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::open_sink_for_config;
pub use crate::encode::raw::RawExportSink;
pub use crate::encode::sink::{AudioSink, FrameSink, InMemorySink, MediaSink, SinkConfig};
pub use crate::render::accum::{AccumulationBuffer, running_weight};
pub use crate::render::camera::CameraPoseProvider;
pub use crate::render::frame::FrameRGBA;
pub use crate::render::jitter::{SUPPORTED_SAMPLE_COUNTS, jitter_table};
pub use crate::render::policy::{
    motion_blur_time_steps, required_host_fps, samples_per_time_step, total_samples,
};
pub use crate::render::sweep::SweepScene;
pub use crate::session::config::{
    AudioFormat, MAX_MOTION_BLUR_QUALITY, MotionBlurSettings, RenderSessionConfig, VideoCodec,
};
pub use crate::session::render_session::{
    CompositedFrame, RenderProgress, RenderSession, TickOutcome,
};
pub use crate::session::shutter::{SamplePlan, ShutterPhase, ShutterState, TickAction};
