use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{RenderError, RenderResult};
use crate::render::jitter::jitter_table;
use crate::render::policy::total_samples;
use anyhow::Context as _;
use std::path::Path;

/// Highest selectable motion-blur quality level.
///
/// The top level maps to 64 sub-samples, for which no jitter table exists; selecting it with motion
/// blur enabled is rejected at validation.
pub const MAX_MOTION_BLUR_QUALITY: u8 = 3;

/// Highest encoding quality accepted by [`RenderSessionConfig::encoding_quality`].
pub const MAX_ENCODING_QUALITY: u8 = 100;

/// Video codec requested for muxed output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    /// H.264 / AVC.
    #[default]
    H264,
    /// H.265 / HEVC.
    Hevc,
    /// VP9.
    Vp9,
}

/// Motion-blur settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MotionBlurSettings {
    /// Accumulate several shutter sub-samples per output frame.
    pub enabled: bool,
    /// Quality level in `[0, MAX_MOTION_BLUR_QUALITY]`.
    #[serde(default)]
    pub quality: u8,
}

/// Interleaved audio stream format delivered by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AudioFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
        }
    }
}

/// Immutable configuration snapshot for one render session.
///
/// A session freezes its configuration at construction; rendering with different parameters
/// requires a new session.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderSessionConfig {
    /// Output resolution.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Codec used in muxed mode.
    #[serde(default)]
    pub codec: VideoCodec,
    /// Encoder quality in `[0, 100]`, higher is better.
    #[serde(default = "default_encoding_quality")]
    pub encoding_quality: u8,
    /// Motion-blur settings.
    #[serde(default)]
    pub motion_blur: MotionBlurSettings,
    /// Jitter sub-samples for antialiasing.
    #[serde(default)]
    pub antialiasing: bool,
    /// Export individual images plus a wave file instead of a muxed video.
    #[serde(default)]
    pub raw_export: bool,
    /// Audio stream format.
    #[serde(default)]
    pub audio: AudioFormat,
    /// Length of the recorded session, used only to estimate progress.
    #[serde(default)]
    pub source_duration_secs: Option<f64>,
}

fn default_encoding_quality() -> u8 {
    80
}

impl RenderSessionConfig {
    /// Create a config with defaults for everything except resolution and frame rate.
    pub fn new(canvas: Canvas, fps: Fps) -> Self {
        Self {
            canvas,
            fps,
            codec: VideoCodec::default(),
            encoding_quality: default_encoding_quality(),
            motion_blur: MotionBlurSettings::default(),
            antialiasing: false,
            raw_export: false,
            audio: AudioFormat::default(),
            source_duration_secs: None,
        }
    }

    /// Enable motion blur at the given quality level.
    pub fn with_motion_blur(mut self, quality: u8) -> Self {
        self.motion_blur = MotionBlurSettings {
            enabled: true,
            quality,
        };
        self
    }

    /// Parse a config from JSON without validating it.
    pub fn from_json_str(s: &str) -> RenderResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| RenderError::configuration(format!("invalid session config json: {e}")))
    }

    /// Read and parse a JSON config file without validating it.
    pub fn from_path(path: impl AsRef<Path>) -> RenderResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read session config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Check every setup-time invariant.
    ///
    /// Sessions call this before allocating anything; no tick is accepted for an invalid config.
    pub fn validate(&self) -> RenderResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(RenderError::configuration(format!(
                "canvas must be non-empty, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }
        self.fps.validate()?;
        if self.motion_blur.quality > MAX_MOTION_BLUR_QUALITY {
            return Err(RenderError::configuration(format!(
                "motion blur quality {} exceeds maximum {MAX_MOTION_BLUR_QUALITY}",
                self.motion_blur.quality
            )));
        }
        if self.encoding_quality > MAX_ENCODING_QUALITY {
            return Err(RenderError::configuration(format!(
                "encoding quality {} exceeds maximum {MAX_ENCODING_QUALITY}",
                self.encoding_quality
            )));
        }
        if self.audio.sample_rate == 0 || self.audio.channels == 0 {
            return Err(RenderError::configuration(
                "audio sample_rate and channels must be non-zero",
            ));
        }
        if let Some(secs) = self.source_duration_secs
            && (!secs.is_finite() || secs < 0.0)
        {
            return Err(RenderError::configuration(
                "source_duration_secs must be finite and >= 0",
            ));
        }
        if self.motion_blur.enabled {
            jitter_table(total_samples(self))?;
        }
        Ok(())
    }

    /// Estimated number of output frames, when the source duration is known.
    pub fn estimated_total_frames(&self) -> Option<u64> {
        self.source_duration_secs
            .map(|secs| self.fps.secs_to_frames_ceil(secs))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/config.rs"]
mod tests;
