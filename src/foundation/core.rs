use crate::foundation::error::{RenderError, RenderResult};

pub use kurbo::Vec2;

/// Absolute 0-based index of an output frame in the rendered movie.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
///
/// Kept rational so long renders accumulate no timestamp drift.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> RenderResult<Self> {
        let fps = Self { num, den };
        fps.validate()?;
        Ok(fps)
    }

    /// Reject zero numerators and denominators.
    pub fn validate(self) -> RenderResult<()> {
        if self.den == 0 {
            return Err(RenderError::configuration("fps den must be > 0"));
        }
        if self.num == 0 {
            return Err(RenderError::configuration("fps num must be > 0"));
        }
        Ok(())
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Timestamp of the start of frame `frames`, computed from the exact rational.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        let num = u128::from(frames) * u128::from(self.den);
        (num as f64) / f64::from(self.num)
    }

    /// Number of frames needed to cover `secs`, rounding partial frames up.
    pub fn secs_to_frames_ceil(self, secs: f64) -> u64 {
        (secs * self.as_f64()).ceil().max(0.0) as u64
    }

    /// Multiply the rate by an integer factor, keeping it exact.
    pub fn scaled(self, factor: u32) -> RenderResult<Self> {
        let num = self.num.checked_mul(factor).ok_or_else(|| {
            RenderError::configuration(format!(
                "fps {}/{} scaled by {factor} overflows",
                self.num, self.den
            ))
        })?;
        Self::new(num, self.den)
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Number of pixels covered by the canvas.
    pub fn pixel_count(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Byte length of a tightly packed RGBA8 image of this size.
    pub fn rgba8_len(self) -> usize {
        self.pixel_count().saturating_mul(4)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
