//! Mapping from motion-blur settings to per-frame sample counts.

use crate::foundation::core::Fps;
use crate::foundation::error::RenderResult;
use crate::session::config::RenderSessionConfig;

/// Number of shutter time slices per output frame.
///
/// `1` without motion blur, otherwise `2^(quality + 3)`: 8, 16, 32 or 64.
pub fn motion_blur_time_steps(cfg: &RenderSessionConfig) -> u32 {
    if !cfg.motion_blur.enabled {
        return 1;
    }
    1u32 << (u32::from(cfg.motion_blur.quality.min(crate::MAX_MOTION_BLUR_QUALITY)) + 3)
}

/// Samples rendered per time slice.
///
/// Always 1: there is no depth-of-field multiplier.
pub fn samples_per_time_step(_cfg: &RenderSessionConfig) -> u32 {
    1
}

/// Sub-samples accumulated into one output frame.
pub fn total_samples(cfg: &RenderSessionConfig) -> u32 {
    motion_blur_time_steps(cfg) * samples_per_time_step(cfg)
}

/// Engine frame rate the host must run at so every tick lands on a shutter slice.
///
/// Open and closed spans each take `time_steps` ticks, so motion blur needs
/// `fps * 2 * time_steps` engine frames per second.
pub fn required_host_fps(cfg: &RenderSessionConfig) -> RenderResult<Fps> {
    if !cfg.motion_blur.enabled {
        return Ok(cfg.fps);
    }
    cfg.fps.scaled(2 * motion_blur_time_steps(cfg))
}

#[cfg(test)]
#[path = "../../tests/unit/render/policy.rs"]
mod tests;
