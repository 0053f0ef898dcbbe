use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{RenderError, RenderResult};
use crate::render::frame::FrameRGBA;
use crate::session::config::{AudioFormat, VideoCodec};

/// Configuration provided to a sink when the session starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
    /// Format of the interleaved audio delivered through [`AudioSink::push_audio`].
    pub audio: AudioFormat,
    /// Requested video codec (muxed sinks only).
    pub codec: VideoCodec,
    /// Encoder quality in `[0, 100]` (muxed sinks only).
    pub encoding_quality: u8,
}

/// Sink contract for composited output frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order, and
/// never again after an error was returned.
pub trait FrameSink: Send {
    /// Called once before any frames or audio are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> RenderResult<()>;
    /// Push one frame in strictly increasing order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> RenderResult<()>;
    /// Flush and close the output. Called once, after the last frame.
    fn end(&mut self) -> RenderResult<()>;
}

/// Sink contract for the host's audio stream.
pub trait AudioSink: Send {
    /// Append `sample_count` interleaved sample frames. `samples` holds
    /// `sample_count * channels` values.
    fn push_audio(&mut self, samples: &[f32], sample_count: usize) -> RenderResult<()>;
}

/// A sink that accepts both video frames and audio.
pub trait MediaSink: FrameSink + AudioSink {}

impl<T: FrameSink + AudioSink + ?Sized> MediaSink for T {}

impl<T: FrameSink + ?Sized> FrameSink for Box<T> {
    fn begin(&mut self, cfg: SinkConfig) -> RenderResult<()> {
        (**self).begin(cfg)
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> RenderResult<()> {
        (**self).push_frame(idx, frame)
    }

    fn end(&mut self) -> RenderResult<()> {
        (**self).end()
    }
}

impl<T: AudioSink + ?Sized> AudioSink for Box<T> {
    fn push_audio(&mut self, samples: &[f32], sample_count: usize) -> RenderResult<()> {
        (**self).push_audio(samples, sample_count)
    }
}

/// Reject a frame index that does not follow `last`.
pub(crate) fn check_frame_order(last: Option<FrameIndex>, idx: FrameIndex) -> RenderResult<()> {
    if let Some(last) = last
        && idx <= last
    {
        return Err(RenderError::sink_write(format!(
            "out-of-order frame index {} after {}",
            idx.0, last.0
        )));
    }
    Ok(())
}

/// Reject an audio buffer whose length disagrees with `sample_count * channels`.
pub(crate) fn check_audio_len(
    samples: &[f32],
    sample_count: usize,
    channels: u16,
) -> RenderResult<()> {
    let expected = sample_count.saturating_mul(usize::from(channels));
    if samples.len() != expected {
        return Err(RenderError::sink_write(format!(
            "audio buffer holds {} values, expected {sample_count} x {channels} = {expected}",
            samples.len()
        )));
    }
    Ok(())
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    audio: Vec<f32>,
    audio_calls: Vec<usize>,
    ended: bool,
    fail_after_frames: Option<usize>,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that accepts `n` frames and rejects the next one, as a full disk would.
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after_frames: Some(n),
            ..Self::default()
        }
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Borrow the captured frames in push order.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// Borrow all captured interleaved audio samples.
    pub fn audio(&self) -> &[f32] {
        &self.audio
    }

    /// `sample_count` of every `push_audio` call, in order.
    pub fn audio_calls(&self) -> &[usize] {
        &self.audio_calls
    }

    /// Return `true` once `end` has been called.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> RenderResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.audio.clear();
        self.audio_calls.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> RenderResult<()> {
        if self.ended {
            return Err(RenderError::sink_write("in-memory sink already ended"));
        }
        if self.fail_after_frames == Some(self.frames.len()) {
            return Err(RenderError::sink_write("simulated write failure"));
        }
        check_frame_order(self.frames.last().map(|(i, _)| *i), idx)?;
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> RenderResult<()> {
        self.ended = true;
        Ok(())
    }
}

impl AudioSink for InMemorySink {
    fn push_audio(&mut self, samples: &[f32], sample_count: usize) -> RenderResult<()> {
        let channels = self
            .cfg
            .as_ref()
            .map(|c| c.audio.channels)
            .ok_or_else(|| RenderError::sink_write("in-memory sink not started"))?;
        check_audio_len(samples, sample_count, channels)?;
        self.audio.extend_from_slice(samples);
        self.audio_calls.push(sample_count);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
