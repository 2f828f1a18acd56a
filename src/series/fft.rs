//! Real time series to one-sided spectrum conversion.
//!
//! Transforms carry the sample interval as a scale factor, so a spectrum bin
//! approximates the continuous Fourier integral `∫ h(t) e^{-2πift} dt` and the
//! inverse reproduces the original samples exactly.

use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;

/// Transforms `samples` taken at `sample_rate` into `len/2 + 1` one-sided bins.
///
/// The output spacing is `sample_rate / samples.len()`.
pub fn real_to_frequency(samples: &[f64], sample_rate: f64) -> Vec<Complex64> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }
    let delta_t = 1.0 / sample_rate;
    let mut buffer: Vec<Complex64> = samples.iter().map(|&x| Complex64::new(x, 0.0)).collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    buffer.truncate(n / 2 + 1);
    for bin in buffer.iter_mut() {
        *bin *= delta_t;
    }
    buffer
}

/// Inverts a one-sided spectrum back to `n` real samples at `sample_rate`.
///
/// Missing bins are treated as zero and imaginary parts of the DC and Nyquist
/// bins are ignored.
pub fn frequency_to_real(bins: &[Complex64], n: usize, sample_rate: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let half = n / 2 + 1;
    let mut buffer = vec![Complex64::new(0.0, 0.0); n];
    for (k, bin) in bins.iter().take(half).enumerate() {
        buffer[k] = *bin;
        if k > 0 && n - k != k {
            buffer[n - k] = bin.conj();
        }
    }

    let mut planner = FftPlanner::new();
    let ifft = planner.plan_fft_inverse(n);
    ifft.process(&mut buffer);

    let delta_f = sample_rate / n as f64;
    buffer.into_iter().map(|c| c.re * delta_f).collect()
}
