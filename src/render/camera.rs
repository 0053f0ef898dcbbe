use crate::foundation::core::Vec2;
use crate::foundation::error::RenderResult;
use crate::render::frame::FrameRGBA;

/// Host renderer hook that draws the scene for one sub-sample.
///
/// `time_secs` is the simulation time of the sample; `jitter_px` is the sub-pixel frustum skew in
/// pixels (zero when antialiasing is off). Implementations overwrite every pixel of `target`,
/// which is sized to the session canvas.
pub trait CameraPoseProvider {
    /// Render one sample at `time_secs` into `target`.
    fn render_frame_at(
        &mut self,
        time_secs: f64,
        jitter_px: Vec2,
        target: &mut FrameRGBA,
    ) -> RenderResult<()>;
}

impl<F> CameraPoseProvider for F
where
    F: FnMut(f64, Vec2, &mut FrameRGBA) -> RenderResult<()>,
{
    fn render_frame_at(
        &mut self,
        time_secs: f64,
        jitter_px: Vec2,
        target: &mut FrameRGBA,
    ) -> RenderResult<()> {
        self(time_secs, jitter_px, target)
    }
}
