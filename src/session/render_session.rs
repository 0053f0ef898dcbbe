use crate::encode::sink::{MediaSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex, Vec2};
use crate::foundation::error::{RenderError, RenderResult};
use crate::render::accum::{AccumulationBuffer, running_weight};
use crate::render::camera::CameraPoseProvider;
use crate::render::frame::FrameRGBA;
use crate::render::jitter::jitter_table;
use crate::render::policy::{required_host_fps, total_samples};
use crate::session::config::RenderSessionConfig;
use crate::session::shutter::{SamplePlan, ShutterState, TickAction};
use std::sync::Arc;

/// Radius, in pixels, that unit-disk jitter offsets are scaled to.
pub const JITTER_RADIUS_PX: f64 = 0.5;

/// A finished output frame, handed to the sink and returned to the caller.
#[derive(Clone, Debug)]
pub struct CompositedFrame {
    /// Output frame index.
    pub index: FrameIndex,
    /// Nominal timestamp, `index / fps`.
    pub timestamp_secs: f64,
    /// Simulation time of the sample the next audio buffer aligns to.
    pub audio_sync_time_secs: f64,
    /// Composited pixels.
    pub pixels: FrameRGBA,
}

/// What a single [`RenderSession::on_tick`] call did.
#[derive(Clone, Debug)]
pub enum TickOutcome {
    /// Shutter closed; nothing was rendered.
    Skipped,
    /// One sub-sample was rendered and blended; the frame is not complete yet.
    Accumulated {
        /// Frame being accumulated.
        frame: FrameIndex,
        /// Index of the blended sample within the frame.
        sample_index: u32,
    },
    /// The last sub-sample completed a frame, which was written to the sink.
    Emitted(CompositedFrame),
}

impl TickOutcome {
    /// The emitted frame, if this tick completed one.
    pub fn into_frame(self) -> Option<CompositedFrame> {
        match self {
            Self::Emitted(frame) => Some(frame),
            _ => None,
        }
    }

    /// Return `true` when this tick issued a render.
    pub fn rendered(&self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

/// Read-only progress snapshot for UI polling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderProgress {
    /// Output frames written to the sink.
    pub frames_emitted: u64,
    /// Estimated total output frames, when the source duration is known.
    pub estimated_total_frames: Option<u64>,
    /// The session shut down cleanly.
    pub complete: bool,
    /// The session hit a fatal error.
    pub failed: bool,
}

impl RenderProgress {
    /// Progress in `[0, 1]`, when an estimate exists.
    pub fn fraction(&self) -> Option<f64> {
        if self.complete {
            return Some(1.0);
        }
        let total = self.estimated_total_frames?;
        if total == 0 {
            return Some(1.0);
        }
        Some((self.frames_emitted as f64 / total as f64).min(1.0))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionState {
    Running,
    Failed,
    Closed,
}

/// One offline render: drives the shutter, accumulates sub-samples and streams finished frames
/// and audio into a [`MediaSink`].
///
/// The host calls [`RenderSession::on_tick`] once per engine frame on its render thread. Every
/// call renders exactly one sub-sample or nothing; it never waits on the encoder beyond the
/// sink's own write.
pub struct RenderSession<S: MediaSink> {
    cfg: Arc<RenderSessionConfig>,
    shutter: ShutterState,
    accum: AccumulationBuffer,
    jitter: Option<&'static [Vec2]>,
    sink: S,

    state: SessionState,
    failed: bool,
    frames_emitted: u64,
    complete: bool,
    pending_audio_sync: Option<FrameIndex>,
    audio_sync_time_secs: f64,
    audio_samples_forwarded: u64,
}

impl<S: MediaSink> RenderSession<S> {
    /// Validate `cfg`, allocate accumulation storage and start `sink`.
    ///
    /// Every configuration or allocation problem surfaces here, before any tick is accepted.
    pub fn new(cfg: RenderSessionConfig, mut sink: S) -> RenderResult<Self> {
        cfg.validate()?;

        let jitter = if cfg.motion_blur.enabled {
            let table = jitter_table(total_samples(&cfg))?;
            cfg.antialiasing.then_some(table)
        } else {
            None
        };
        let accum = AccumulationBuffer::new(cfg.canvas)?;
        let shutter = ShutterState::new(&cfg);

        sink.begin(SinkConfig {
            width: cfg.canvas.width,
            height: cfg.canvas.height,
            fps: cfg.fps,
            audio: cfg.audio,
            codec: cfg.codec,
            encoding_quality: cfg.encoding_quality,
        })?;

        tracing::info!(
            width = cfg.canvas.width,
            height = cfg.canvas.height,
            fps = %format!("{}/{}", cfg.fps.num, cfg.fps.den),
            motion_blur = cfg.motion_blur.enabled,
            samples_per_frame = shutter.samples_per_frame(),
            antialiasing = jitter.is_some(),
            raw_export = cfg.raw_export,
            "render session started"
        );

        Ok(Self {
            cfg: Arc::new(cfg),
            shutter,
            accum,
            jitter,
            sink,
            state: SessionState::Running,
            failed: false,
            frames_emitted: 0,
            complete: false,
            pending_audio_sync: None,
            audio_sync_time_secs: 0.0,
            audio_samples_forwarded: 0,
        })
    }

    /// Frozen session configuration.
    pub fn config(&self) -> &Arc<RenderSessionConfig> {
        &self.cfg
    }

    /// Shutter state, for inspection.
    pub fn shutter(&self) -> &ShutterState {
        &self.shutter
    }

    /// Borrow the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the session and return the sink. Call [`RenderSession::shutdown`] first.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Engine frame rate the host must run at for this session.
    pub fn required_host_fps(&self) -> RenderResult<Fps> {
        required_host_fps(&self.cfg)
    }

    /// Output frame the next audio buffer belongs to, if its sync sample has been rendered.
    pub fn pending_audio_sync(&self) -> Option<FrameIndex> {
        self.pending_audio_sync
    }

    /// Audio sample frames forwarded to the sink so far.
    pub fn audio_samples_forwarded(&self) -> u64 {
        self.audio_samples_forwarded
    }

    /// Current progress snapshot.
    pub fn progress(&self) -> RenderProgress {
        RenderProgress {
            frames_emitted: self.frames_emitted,
            estimated_total_frames: self.cfg.estimated_total_frames(),
            complete: self.complete,
            failed: self.failed,
        }
    }

    /// Advance one engine tick.
    ///
    /// Renders at most one sub-sample through `camera`. When that sample completes a frame the
    /// frame is pushed to the sink and returned. Any error is fatal: the session stops accepting
    /// ticks and nothing further reaches the sink.
    pub fn on_tick(&mut self, camera: &mut dyn CameraPoseProvider) -> RenderResult<TickOutcome> {
        self.ensure_running()?;
        match self.shutter.step() {
            TickAction::SkipTick => {
                tracing::trace!(
                    frame = self.shutter.output_frame_index(),
                    "shutter closed, skipping tick"
                );
                Ok(TickOutcome::Skipped)
            }
            TickAction::RenderAndAccumulate(plan) => {
                let res = self.render_sample(plan, camera);
                if let Err(e) = &res {
                    self.fail(e);
                }
                res
            }
        }
    }

    /// Forward one interleaved audio buffer to the sink unchanged.
    pub fn on_audio_samples(&mut self, samples: &[f32], sample_count: usize) -> RenderResult<()> {
        self.ensure_running()?;
        if let Some(frame) = self.pending_audio_sync.take() {
            tracing::trace!(
                frame = frame.0,
                sync_time = self.audio_sync_time_secs,
                sample_count,
                "audio buffer aligned to sync frame"
            );
        }
        let res = self
            .sink
            .push_audio(samples, sample_count)
            .map_err(as_sink_error);
        match res {
            Ok(()) => {
                self.audio_samples_forwarded += sample_count as u64;
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Release accumulation storage and finalize the sink.
    ///
    /// Idempotent. A partially accumulated frame is discarded, never written. The sink is
    /// finalized even after a fatal error so the host can close a truncated file.
    pub fn shutdown(&mut self) -> RenderResult<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        let failed = self.failed;
        if self.accum.samples_in_frame() > 0 || self.shutter.is_mid_frame() {
            tracing::debug!(
                frame = self.shutter.output_frame_index(),
                samples = self.accum.samples_in_frame(),
                "discarding partially accumulated frame"
            );
        }
        self.accum.release();
        self.state = SessionState::Closed;

        match self.sink.end().map_err(as_sink_error) {
            Ok(()) => {
                self.complete = !failed;
                tracing::info!(
                    frames = self.frames_emitted,
                    audio_samples = self.audio_samples_forwarded,
                    failed,
                    "render session shut down"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to finalize sink");
                Err(e)
            }
        }
    }

    fn ensure_running(&self) -> RenderResult<()> {
        match self.state {
            SessionState::Running => Ok(()),
            SessionState::Failed => Err(RenderError::SessionFailed),
            SessionState::Closed => Err(RenderError::SessionClosed),
        }
    }

    fn fail(&mut self, err: &RenderError) {
        tracing::error!(
            error = %err,
            frame = self.shutter.output_frame_index(),
            "render session failed"
        );
        self.state = SessionState::Failed;
        self.failed = true;
        self.accum.clear_to_black();
    }

    fn jitter_for(&self, sample_index: u32) -> Vec2 {
        match self.jitter {
            Some(table) => table[sample_index as usize % table.len()] * JITTER_RADIUS_PX,
            None => Vec2::ZERO,
        }
    }

    fn render_sample(
        &mut self,
        plan: SamplePlan,
        camera: &mut dyn CameraPoseProvider,
    ) -> RenderResult<TickOutcome> {
        let jitter = self.jitter_for(plan.sample_index_in_frame);
        tracing::trace!(
            frame = plan.output_frame.0,
            sample = plan.sample_index_in_frame,
            time = plan.sample_time_secs,
            jitter_x = jitter.x,
            jitter_y = jitter.y,
            "rendering sub-sample"
        );

        let target = self.accum.begin_sample();
        camera.render_frame_at(plan.sample_time_secs, jitter, target)?;

        let weight = running_weight(plan.sample_index_in_frame);
        self.accum
            .blend_sample(weight, plan.sample_index_in_frame == 0)?;

        if plan.is_audio_sync_frame {
            self.pending_audio_sync = Some(plan.output_frame);
            self.audio_sync_time_secs = plan.sample_time_secs;
        }

        if !plan.is_last_sample_of_frame {
            return Ok(TickOutcome::Accumulated {
                frame: plan.output_frame,
                sample_index: plan.sample_index_in_frame,
            });
        }

        let pixels = self.accum.finalize()?;
        self.accum.end_frame();
        self.sink
            .push_frame(plan.output_frame, &pixels)
            .map_err(as_sink_error)?;
        self.frames_emitted += 1;

        tracing::debug!(
            frame = plan.output_frame.0,
            emitted = self.frames_emitted,
            "emitted composited frame"
        );

        Ok(TickOutcome::Emitted(CompositedFrame {
            index: plan.output_frame,
            timestamp_secs: self.cfg.fps.frames_to_secs(plan.output_frame.0),
            audio_sync_time_secs: self.audio_sync_time_secs,
            pixels,
        }))
    }
}

fn as_sink_error(err: RenderError) -> RenderError {
    match err {
        RenderError::SinkWrite(_) => err,
        other => RenderError::sink_write(other.to_string()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/render_session.rs"]
mod tests;
