//! Scalar reference kernel for noise-weighted power.

use crate::kernel::Kernel;
use crate::series::FilterSample;

/// Scalar accumulation in double precision.
pub struct PowerScalar;

impl Kernel for PowerScalar {
    fn weighted_power<T: FilterSample>(filter: &[T], psd: &[f64]) -> f64 {
        filter
            .iter()
            .zip(psd.iter())
            .map(|(h, s)| h.norm_sqr_f64() / s)
            .sum()
    }
}
