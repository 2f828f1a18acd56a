//! Noise-weighted inner-product kernels.
//!
//! `sigmasq` is the band-limited matched-filter normalization
//! `4 Δf Σ_{k=kmin}^{kmax-1} |h_k|² / S_k`. The per-bin accumulation is
//! delegated to a [`Kernel`] so the SIMD path can replace the scalar one.

use crate::series::{FilterSample, Psd};
use crate::util::math::bin_index;

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(not(feature = "simd"))]
use scalar::PowerScalar as Power;
#[cfg(feature = "simd")]
use simd::PowerSimd as Power;

/// Kernel trait for noise-weighted power accumulation.
pub trait Kernel {
    /// Returns `Σ |filter[k]|² / psd[k]` over the common length of both slices.
    fn weighted_power<T: FilterSample>(filter: &[T], psd: &[f64]) -> f64;
}

/// Returns the `[kmin, kmax)` bin range covered by `sigmasq`.
///
/// `kmax` defaults to `len` and never exceeds it.
pub fn band_indices(
    len: usize,
    delta_f: f64,
    f_lower: f64,
    f_upper: Option<f64>,
) -> (usize, usize) {
    let kmin = bin_index(f_lower, delta_f).min(len);
    let kmax = f_upper
        .map(|f| bin_index(f, delta_f))
        .unwrap_or(len)
        .min(len);
    (kmin, kmax.max(kmin))
}

/// Computes the matched-filter normalization of `filter` against `psd`.
///
/// The band starts at `floor(f_lower / delta_f)` and ends before
/// `floor(f_upper / delta_f)`, or at the end of the shorter of the filter and
/// the spectrum when no upper cutoff is given.
pub fn sigmasq<T: FilterSample>(
    filter: &[T],
    psd: &Psd,
    delta_f: f64,
    f_lower: f64,
    f_upper: Option<f64>,
) -> f64 {
    let len = filter.len().min(psd.len());
    let (kmin, kmax) = band_indices(len, delta_f, f_lower, f_upper);
    let power = Power::weighted_power(&filter[kmin..kmax], &psd.as_slice()[kmin..kmax]);
    4.0 * delta_f * power
}

#[cfg(test)]
mod tests {
    use super::{band_indices, sigmasq};
    use crate::series::Psd;
    use rustfft::num_complex::{Complex32, Complex64};

    #[test]
    fn band_indices_clamp_to_length() {
        assert_eq!(band_indices(100, 1.0, 10.0, None), (10, 100));
        assert_eq!(band_indices(100, 1.0, 10.0, Some(50.5)), (10, 50));
        assert_eq!(band_indices(100, 1.0, 10.0, Some(500.0)), (10, 100));
        assert_eq!(band_indices(100, 1.0, 200.0, None), (100, 100));
        assert_eq!(band_indices(100, 1.0, 20.0, Some(5.0)), (20, 20));
    }

    #[test]
    fn sigmasq_weights_by_inverse_psd() {
        let filter = vec![Complex64::new(1.0, 1.0); 8];
        let mut values = vec![1.0; 8];
        values[4] = 2.0;
        let psd = Psd::new(values, 0.5).unwrap();

        // Bins 2..8 with |h|² = 2, one of them at half weight.
        let expected = 4.0 * 0.5 * (5.0 * 2.0 + 1.0);
        let got = sigmasq(&filter, &psd, 0.5, 1.0, None);
        assert!((got - expected).abs() < 1e-12);

        let upper = sigmasq(&filter, &psd, 0.5, 1.0, Some(2.0));
        assert!((upper - 4.0 * 0.5 * 4.0).abs() < 1e-12);
    }

    #[test]
    fn sigmasq_matches_across_precisions() {
        let wide: Vec<Complex64> = (0..37)
            .map(|k| Complex64::new(k as f64 * 0.5, -(k as f64) * 0.25))
            .collect();
        let narrow: Vec<Complex32> = wide
            .iter()
            .map(|c| Complex32::new(c.re as f32, c.im as f32))
            .collect();
        let psd = Psd::flat(37, 1.0, 3.0).unwrap();
        let a = sigmasq(&wide, &psd, 1.0, 3.0, None);
        let b = sigmasq(&narrow, &psd, 1.0, 3.0, None);
        assert!((a - b).abs() <= 1e-9 * a);
    }

    #[test]
    fn sigmasq_uses_shorter_of_filter_and_psd() {
        let filter = vec![Complex64::new(1.0, 0.0); 10];
        let psd = Psd::flat(6, 1.0, 1.0).unwrap();
        let got = sigmasq(&filter, &psd, 1.0, 0.0, None);
        assert!((got - 24.0).abs() < 1e-12);
    }
}
