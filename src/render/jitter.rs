//! Poisson-disk sub-pixel offset tables used to jitter sample frustums.
//!
//! Offsets lie inside the unit disk; callers scale them to a pixel radius.

use crate::foundation::core::Vec2;
use crate::foundation::error::{RenderError, RenderResult};

/// Sample counts that have a registered table.
pub const SUPPORTED_SAMPLE_COUNTS: [u32; 4] = [4, 8, 16, 32];

const JITTER_4: [Vec2; 4] = [
    Vec2::new(-0.0952, 0.1195),
    Vec2::new(0.8484, -0.0687),
    Vec2::new(-0.8118, -0.3932),
    Vec2::new(0.3869, -0.9162),
];

const JITTER_8: [Vec2; 8] = [
    Vec2::new(0.1841, -0.1525),
    Vec2::new(0.0602, -0.7394),
    Vec2::new(-0.6160, -0.1109),
    Vec2::new(0.0253, 0.4684),
    Vec2::new(0.9415, -0.2744),
    Vec2::new(-0.5681, -0.7930),
    Vec2::new(-0.7068, 0.6749),
    Vec2::new(0.8303, 0.3095),
];

const JITTER_16: [Vec2; 16] = [
    Vec2::new(0.3640, -0.8168),
    Vec2::new(0.2356, 0.6838),
    Vec2::new(0.6691, 0.0300),
    Vec2::new(0.2621, -0.2615),
    Vec2::new(-0.4362, -0.2429),
    Vec2::new(-0.8497, -0.4228),
    Vec2::new(-0.2778, 0.4099),
    Vec2::new(-0.9319, 0.0533),
    Vec2::new(-0.2963, -0.6814),
    Vec2::new(0.7212, 0.4561),
    Vec2::new(0.7931, -0.5641),
    Vec2::new(-0.8251, 0.4781),
    Vec2::new(-0.4924, 0.8374),
    Vec2::new(-0.0674, 0.0354),
    Vec2::new(0.3129, 0.2636),
    Vec2::new(-0.0890, 0.9747),
];

const JITTER_32: [Vec2; 32] = [
    Vec2::new(-0.0487, 0.0717),
    Vec2::new(0.2124, -0.4579),
    Vec2::new(0.3645, -0.7025),
    Vec2::new(0.7152, 0.1426),
    Vec2::new(-0.8274, -0.0308),
    Vec2::new(0.5643, -0.4393),
    Vec2::new(0.3406, 0.0206),
    Vec2::new(0.0971, 0.3283),
    Vec2::new(-0.0763, -0.4087),
    Vec2::new(0.0863, -0.8729),
    Vec2::new(0.3984, 0.6901),
    Vec2::new(-0.3682, 0.3400),
    Vec2::new(0.5798, 0.3896),
    Vec2::new(0.9116, -0.1056),
    Vec2::new(-0.0362, 0.9145),
    Vec2::new(-0.2602, -0.1704),
    Vec2::new(0.8727, 0.4283),
    Vec2::new(-0.6922, -0.7017),
    Vec2::new(-0.3601, -0.4540),
    Vec2::new(-0.4126, 0.7243),
    Vec2::new(-0.8194, -0.4325),
    Vec2::new(-0.5440, -0.2366),
    Vec2::new(-0.6965, 0.3841),
    Vec2::new(-0.4765, 0.0388),
    Vec2::new(-0.3062, -0.8363),
    Vec2::new(-0.9557, 0.2500),
    Vec2::new(-0.0890, 0.5678),
    Vec2::new(-0.7272, 0.6796),
    Vec2::new(0.9015, -0.4097),
    Vec2::new(0.1285, -0.1909),
    Vec2::new(0.5561, -0.1555),
    Vec2::new(0.6409, -0.7481),
];

/// Look up the offset table for `sample_count`.
///
/// Counts without a registered table fail with [`RenderError::UnsupportedSampleCount`]; there is no
/// fallback table.
pub fn jitter_table(sample_count: u32) -> RenderResult<&'static [Vec2]> {
    match sample_count {
        4 => Ok(&JITTER_4),
        8 => Ok(&JITTER_8),
        16 => Ok(&JITTER_16),
        32 => Ok(&JITTER_32),
        other => Err(RenderError::UnsupportedSampleCount(other)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/jitter.rs"]
mod tests;
