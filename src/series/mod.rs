//! Sample types, noise spectra and buffer utilities.
//!
//! Filters are stored as contiguous complex arrays indexed by frequency bin.
//! `FilterSample` abstracts over the two supported output precisions so that a
//! bank can commit its results to either `Complex32` or `Complex64`.

use crate::util::math::rel_close;
use crate::util::{GwBankError, GwBankResult};
use rustfft::num_complex::{Complex32, Complex64};

pub mod fft;

/// Complex sample type a filter can be stored in.
pub trait FilterSample: Copy + Send + Sync + PartialEq + std::fmt::Debug + 'static {
    /// The additive identity.
    const ZERO: Self;

    /// Converts a double-precision value into this precision.
    fn from_complex64(value: Complex64) -> Self;

    /// Widens this value to double precision.
    fn to_complex64(self) -> Complex64;

    /// Squared magnitude in double precision.
    #[inline]
    fn norm_sqr_f64(self) -> f64 {
        self.to_complex64().norm_sqr()
    }
}

impl FilterSample for Complex64 {
    const ZERO: Self = Complex64::new(0.0, 0.0);

    #[inline]
    fn from_complex64(value: Complex64) -> Self {
        value
    }

    #[inline]
    fn to_complex64(self) -> Complex64 {
        self
    }
}

impl FilterSample for Complex32 {
    const ZERO: Self = Complex32::new(0.0, 0.0);

    #[inline]
    fn from_complex64(value: Complex64) -> Self {
        Complex32::new(value.re as f32, value.im as f32)
    }

    #[inline]
    fn to_complex64(self) -> Complex64 {
        Complex64::new(self.re as f64, self.im as f64)
    }
}

/// One-sided noise power spectral density sampled on a uniform grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Psd {
    data: Vec<f64>,
    delta_f: f64,
}

impl Psd {
    /// Creates a spectrum from per-bin values with spacing `delta_f`.
    pub fn new(data: Vec<f64>, delta_f: f64) -> GwBankResult<Self> {
        if data.is_empty() {
            return Err(GwBankError::InvalidInput("psd must not be empty"));
        }
        if !delta_f.is_finite() || delta_f <= 0.0 {
            return Err(GwBankError::InvalidInput("psd delta_f must be > 0"));
        }
        Ok(Self { data, delta_f })
    }

    /// Creates a constant spectrum of `len` bins.
    pub fn flat(len: usize, delta_f: f64, level: f64) -> GwBankResult<Self> {
        Self::new(vec![level; len], delta_f)
    }

    /// Returns the frequency spacing in Hz.
    pub fn delta_f(&self) -> f64 {
        self.delta_f
    }

    /// Returns the number of bins.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the spectrum has no bins.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the per-bin values.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Checks that the spectrum can weight filters of `filter_length` bins
    /// spaced by `delta_f`, starting at bin `kmin`.
    pub fn check_aligned(
        &self,
        filter_length: usize,
        delta_f: f64,
        kmin: usize,
    ) -> GwBankResult<()> {
        if !rel_close(self.delta_f, delta_f, 1e-9) {
            return Err(GwBankError::PsdMismatch {
                reason: format!(
                    "psd delta_f {} differs from bank delta_f {}",
                    self.delta_f, delta_f
                ),
            });
        }
        if self.data.len() < filter_length {
            return Err(GwBankError::PsdMismatch {
                reason: format!(
                    "psd has {} bins, bank needs {}",
                    self.data.len(),
                    filter_length
                ),
            });
        }
        let band = self.data.get(kmin..filter_length).unwrap_or(&[]);
        if let Some(k) = band
            .iter()
            .position(|v| !v.is_finite() || *v <= 0.0)
        {
            return Err(GwBankError::PsdMismatch {
                reason: format!("psd bin {} is not finite and positive", kmin + k),
            });
        }
        Ok(())
    }
}

/// Overwrites every element with zero.
pub fn zero_fill<T: FilterSample>(buf: &mut [T]) {
    buf.fill(T::ZERO);
}

/// Zero-pads or truncates `data` to exactly `len` elements.
pub fn resize_zero<T: Clone>(data: &mut Vec<T>, len: usize, zero: T) {
    data.resize(len, zero);
}

/// Cyclically shifts `data` toward lower indices by `shift` places.
///
/// Element `i` moves to `(i - shift) mod len`, matching a negative roll.
pub fn roll_backward<T>(data: &mut [T], shift: usize) {
    if data.is_empty() {
        return;
    }
    let shift = shift % data.len();
    data.rotate_left(shift);
}
