//! Ping-pong accumulation of sub-samples into one output frame.

use crate::foundation::core::Canvas;
use crate::foundation::error::{RenderError, RenderResult};
use crate::render::frame::FrameRGBA;

/// Running-average weight for the `k`-th (0-based) sample of a frame.
///
/// Blending sample `k` with weight `1 / (k + 1)` leaves every sample with an equal share of the
/// final frame, whatever the total sample count.
pub fn running_weight(sample_index_in_frame: u32) -> f32 {
    1.0 / (sample_index_in_frame as f32 + 1.0)
}

/// Two full-resolution `f32` RGBA buffers used alternately as accumulated result and blend
/// target, plus an RGBA8 scratch frame that receives each freshly rendered sample.
#[derive(Debug)]
pub struct AccumulationBuffer {
    canvas: Canvas,
    buffers: [Vec<f32>; 2],
    active: usize,
    scratch: FrameRGBA,
    samples_in_frame: u32,
}

impl AccumulationBuffer {
    /// Allocate storage for `canvas`.
    ///
    /// Allocation failure is reported as [`RenderError::ResourceAllocation`] rather than aborting.
    pub fn new(canvas: Canvas) -> RenderResult<Self> {
        let len = canvas.rgba8_len();
        if len == 0 {
            return Err(RenderError::resource_allocation(
                "accumulation buffer canvas must be non-empty",
            ));
        }
        let a = alloc_zeroed::<f32>(len)?;
        let b = alloc_zeroed::<f32>(len)?;
        let scratch = FrameRGBA {
            width: canvas.width,
            height: canvas.height,
            data: alloc_zeroed::<u8>(len)?,
        };
        Ok(Self {
            canvas,
            buffers: [a, b],
            active: 0,
            scratch,
            samples_in_frame: 0,
        })
    }

    /// Canvas the buffers were sized for.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Index (0 or 1) of the buffer holding the accumulated result.
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Samples blended into the frame currently being accumulated.
    pub fn samples_in_frame(&self) -> u32 {
        self.samples_in_frame
    }

    /// Return the scratch frame to render the next sample into.
    ///
    /// Never touches the accumulation buffers.
    pub fn begin_sample(&mut self) -> &mut FrameRGBA {
        &mut self.scratch
    }

    /// Blend the scratch sample into the accumulated result and swap buffers.
    ///
    /// The first sample of a frame is copied verbatim into the inactive buffer. Later samples
    /// compute `active + weight * (scratch - active)` into the inactive buffer, which equals
    /// `weight * scratch + (1 - weight) * active` and stays exact for identical inputs.
    pub fn blend_sample(&mut self, weight: f32, first_of_frame: bool) -> RenderResult<()> {
        if self.scratch.data.len() != self.buffers[0].len() {
            return Err(RenderError::camera(format!(
                "sample size mismatch: got {}x{} ({} bytes), expected {}x{}",
                self.scratch.width,
                self.scratch.height,
                self.scratch.data.len(),
                self.canvas.width,
                self.canvas.height
            )));
        }
        if !first_of_frame && self.samples_in_frame == 0 {
            return Err(RenderError::invalid_state(
                "blend into an empty frame must be marked as the first sample",
            ));
        }

        let (lo, hi) = self.buffers.split_at_mut(1);
        let (src, dst) = if self.active == 0 {
            (&lo[0], &mut hi[0])
        } else {
            (&hi[0], &mut lo[0])
        };

        if first_of_frame {
            for (d, &s) in dst.iter_mut().zip(&self.scratch.data) {
                *d = f32::from(s);
            }
            self.samples_in_frame = 1;
        } else {
            for ((d, &a), &s) in dst.iter_mut().zip(src.iter()).zip(&self.scratch.data) {
                *d = a + weight * (f32::from(s) - a);
            }
            self.samples_in_frame = self.samples_in_frame.saturating_add(1);
        }

        self.active ^= 1;
        Ok(())
    }

    /// Reset both accumulation buffers to zero and forget the in-progress frame.
    pub fn clear_to_black(&mut self) {
        for buf in &mut self.buffers {
            buf.fill(0.0);
        }
        self.samples_in_frame = 0;
    }

    /// Quantize the accumulated result to RGBA8 without mutating it.
    pub fn finalize(&self) -> RenderResult<FrameRGBA> {
        if self.samples_in_frame == 0 {
            return Err(RenderError::invalid_state(
                "finalize called before any sample was blended",
            ));
        }
        let data = self.buffers[self.active]
            .iter()
            .map(|&v| v.round().clamp(0.0, 255.0) as u8)
            .collect();
        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data,
        })
    }

    /// Mark the accumulated frame as consumed so the next blend must start a new frame.
    pub fn end_frame(&mut self) {
        self.samples_in_frame = 0;
    }

    /// Drop all pixel storage. The buffer is unusable afterwards.
    pub fn release(&mut self) {
        self.buffers = [Vec::new(), Vec::new()];
        self.scratch.data = Vec::new();
        self.samples_in_frame = 0;
    }

    /// Return `true` once [`AccumulationBuffer::release`] has run.
    pub fn is_released(&self) -> bool {
        self.buffers[0].is_empty()
    }
}

fn alloc_zeroed<T: Clone + Default>(len: usize) -> RenderResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|e| {
        RenderError::resource_allocation(format!("failed to allocate {len} elements: {e}"))
    })?;
    v.resize(len, T::default());
    Ok(v)
}

#[cfg(test)]
#[path = "../../tests/unit/render/accum.rs"]
mod tests;
