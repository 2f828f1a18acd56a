//! SIMD-accelerated kernel using the `wide` crate.
//!
//! Squared magnitudes and spectrum values are loaded four bins at a time into
//! `f64x4` lanes; the remainder is handled by a scalar tail.

use crate::kernel::Kernel;
use crate::series::FilterSample;
use wide::f64x4;

const LANES: usize = 4;

/// Horizontal sum of f64x4.
#[inline]
fn hsum(v: f64x4) -> f64 {
    let arr = v.to_array();
    arr[0] + arr[1] + arr[2] + arr[3]
}

/// SIMD accumulation in double precision.
pub struct PowerSimd;

impl Kernel for PowerSimd {
    fn weighted_power<T: FilterSample>(filter: &[T], psd: &[f64]) -> f64 {
        let len = filter.len().min(psd.len());
        let simd_end = len / LANES * LANES;

        let mut acc = f64x4::ZERO;
        for k in (0..simd_end).step_by(LANES) {
            let power = f64x4::from([
                filter[k].norm_sqr_f64(),
                filter[k + 1].norm_sqr_f64(),
                filter[k + 2].norm_sqr_f64(),
                filter[k + 3].norm_sqr_f64(),
            ]);
            let weight = f64x4::from([psd[k], psd[k + 1], psd[k + 2], psd[k + 3]]);
            acc += power / weight;
        }

        let mut tail = 0.0f64;
        for k in simd_end..len {
            tail += filter[k].norm_sqr_f64() / psd[k];
        }
        hsum(acc) + tail
    }
}
