use crate::foundation::core::Vec2;
use crate::foundation::error::RenderResult;
use crate::render::camera::CameraPoseProvider;
use crate::render::frame::FrameRGBA;

/// Procedural scene: a bright disc sweeping horizontally across a dark background.
///
/// Used by the CLI and by tests to drive a full session without a host renderer.
#[derive(Clone, Debug)]
pub struct SweepScene {
    /// Horizontal speed in canvas widths per second.
    pub speed: f64,
    /// Disc radius as a fraction of canvas height.
    pub radius: f64,
    /// Disc color.
    pub fg: [u8; 4],
    /// Background color.
    pub bg: [u8; 4],
}

impl Default for SweepScene {
    fn default() -> Self {
        Self {
            speed: 0.5,
            radius: 0.15,
            fg: [255, 220, 64, 255],
            bg: [16, 18, 24, 255],
        }
    }
}

impl SweepScene {
    fn center(&self, time_secs: f64, width: f64, height: f64) -> (f64, f64) {
        let phase = (time_secs * self.speed).rem_euclid(1.0);
        (phase * width, height * 0.5)
    }
}

impl CameraPoseProvider for SweepScene {
    fn render_frame_at(
        &mut self,
        time_secs: f64,
        jitter_px: Vec2,
        target: &mut FrameRGBA,
    ) -> RenderResult<()> {
        let (w, h) = (f64::from(target.width), f64::from(target.height));
        let (cx, cy) = self.center(time_secs, w, h);
        let r = self.radius * h;
        let r2 = r * r;
        let width = target.width as usize;

        for (i, px) in target.data.chunks_exact_mut(4).enumerate() {
            let x = (i % width) as f64 + 0.5 + jitter_px.x;
            let y = (i / width) as f64 + 0.5 + jitter_px.y;
            let (dx, dy) = (x - cx, y - cy);
            let inside = dx * dx + dy * dy <= r2;
            px.copy_from_slice(if inside { &self.fg } else { &self.bg });
        }
        Ok(())
    }
}
