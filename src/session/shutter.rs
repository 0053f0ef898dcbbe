//! Virtual camera shutter: decides, tick by tick, whether a sub-sample is rendered.
//!
//! With motion blur the shutter alternates between an open span of `time_steps` ticks, each
//! rendering one sub-sample, and a closed span of equal length in which ticks are no-ops. Without
//! motion blur every tick renders and completes one output frame.

use crate::foundation::core::{Fps, FrameIndex};
use crate::render::policy::{motion_blur_time_steps, samples_per_time_step};
use crate::session::config::RenderSessionConfig;

/// Fraction of a frame duration the shutter stays open (a 180 degree shutter).
pub const SHUTTER_FRACTION: f64 = 0.5;

/// Shutter phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutterPhase {
    /// Sub-samples are being rendered.
    Open,
    /// Waiting for the engine to advance to the next output frame.
    Closed,
}

/// Work planned for one rendered sub-sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplePlan {
    /// Output frame the sample contributes to.
    pub output_frame: FrameIndex,
    /// Simulation time at which to render the sample.
    pub sample_time_secs: f64,
    /// 0-based index of the sample within its output frame.
    pub sample_index_in_frame: u32,
    /// The frame is complete once this sample is blended.
    pub is_last_sample_of_frame: bool,
    /// The next audio buffer aligns to this sample.
    pub is_audio_sync_frame: bool,
}

/// Outcome of one shutter step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickAction {
    /// Render one sub-sample and blend it. When `is_last_sample_of_frame` is set, the
    /// composited frame is emitted within the same tick.
    RenderAndAccumulate(SamplePlan),
    /// Shutter closed; no render work this tick.
    SkipTick,
}

/// Per-session shutter state.
#[derive(Clone, Debug)]
pub struct ShutterState {
    fps: Fps,
    motion_blur: bool,
    time_steps: u32,
    samples_per_step: u32,

    phase: ShutterPhase,
    current_sample_index: u32,
    current_sub_sample: u32,
    current_time_step: u32,
    output_frame_index: u64,
    current_sample_time: f64,
}

impl ShutterState {
    /// Initial state: open, at the first sample of frame 0.
    pub fn new(cfg: &RenderSessionConfig) -> Self {
        Self {
            fps: cfg.fps,
            motion_blur: cfg.motion_blur.enabled,
            time_steps: motion_blur_time_steps(cfg),
            samples_per_step: samples_per_time_step(cfg),
            phase: ShutterPhase::Open,
            current_sample_index: 0,
            current_sub_sample: 0,
            current_time_step: 0,
            output_frame_index: 0,
            current_sample_time: 0.0,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> ShutterPhase {
        self.phase
    }

    /// Index of the next sample within the current output frame.
    pub fn current_sample_index(&self) -> u32 {
        self.current_sample_index
    }

    /// Time slices elapsed since the shutter last changed phase.
    pub fn current_time_step(&self) -> u32 {
        self.current_time_step
    }

    /// Output frames completed so far; also the index of the frame being accumulated.
    pub fn output_frame_index(&self) -> u64 {
        self.output_frame_index
    }

    /// Simulation time of the most recently planned sample.
    pub fn current_sample_time(&self) -> f64 {
        self.current_sample_time
    }

    /// Shutter time slices per output frame.
    pub fn time_steps(&self) -> u32 {
        self.time_steps
    }

    /// Sub-samples accumulated per output frame.
    pub fn samples_per_frame(&self) -> u32 {
        self.time_steps * self.samples_per_step
    }

    /// Return `true` while a frame has received some, but not all, of its samples.
    pub fn is_mid_frame(&self) -> bool {
        self.phase == ShutterPhase::Open && self.current_sample_index > 0
    }

    /// Advance one driver tick and report the work to do.
    pub fn step(&mut self) -> TickAction {
        if !self.motion_blur {
            return TickAction::RenderAndAccumulate(self.step_single());
        }
        match self.phase {
            ShutterPhase::Open => TickAction::RenderAndAccumulate(self.step_open()),
            ShutterPhase::Closed => {
                self.current_time_step += 1;
                if self.current_time_step == self.time_steps {
                    self.current_time_step = 0;
                    self.phase = ShutterPhase::Open;
                }
                TickAction::SkipTick
            }
        }
    }

    fn step_single(&mut self) -> SamplePlan {
        let frame = FrameIndex(self.output_frame_index);
        self.current_sample_time = self.fps.frames_to_secs(frame.0);
        self.output_frame_index += 1;
        SamplePlan {
            output_frame: frame,
            sample_time_secs: self.current_sample_time,
            sample_index_in_frame: 0,
            is_last_sample_of_frame: true,
            is_audio_sync_frame: true,
        }
    }

    fn step_open(&mut self) -> SamplePlan {
        let frame = FrameIndex(self.output_frame_index);
        let shutter_speed = SHUTTER_FRACTION * self.fps.frame_duration_secs();
        let slice = shutter_speed / f64::from(self.time_steps);
        let frame_start = self.fps.frames_to_secs(frame.0);
        self.current_sample_time =
            frame_start - shutter_speed * 0.5 + f64::from(self.current_time_step) * slice;

        let sample_index = self.current_sample_index;
        let is_audio_sync = self.current_time_step == 0 && self.current_sub_sample == 0;

        self.current_sample_index += 1;
        self.current_sub_sample += 1;
        if self.current_sub_sample == self.samples_per_step {
            self.current_sub_sample = 0;
            self.current_time_step += 1;
        }

        let is_last = self.current_time_step == self.time_steps;
        if is_last {
            self.output_frame_index += 1;
            self.current_time_step = 0;
            self.current_sample_index = 0;
            self.phase = ShutterPhase::Closed;
        }

        SamplePlan {
            output_frame: frame,
            sample_time_secs: self.current_sample_time,
            sample_index_in_frame: sample_index,
            is_last_sample_of_frame: is_last,
            is_audio_sync_frame: is_audio_sync,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/shutter.rs"]
mod tests;
