//! Precomputed normalization lookup.
//!
//! For template families whose frequency-domain amplitude is a fixed shape
//! times a per-template constant, `sigmasq` up to any end bin is a cumulative
//! sum that only depends on the noise spectrum. Building that sum once per bank
//! turns the per-template normalization into a table lookup.

use crate::series::Psd;
use crate::util::{GwBankError, GwBankResult};

/// Cumulative normalization indexed by end-frequency bin.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizationVector {
    values: Vec<f64>,
}

impl NormalizationVector {
    /// Wraps precomputed values, one per addressable end bin.
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Builds `4 Δf Σ_{j=kmin}^{k} shape(j)² / S_j` for every `k < length`.
    ///
    /// Entries below `kmin` are zero. `shape(j)` is the unit-amplitude filter
    /// magnitude at bin `j`.
    pub fn cumulative<F>(
        psd: &Psd,
        length: usize,
        delta_f: f64,
        kmin: usize,
        shape: F,
    ) -> GwBankResult<Self>
    where
        F: Fn(usize) -> f64,
    {
        if psd.len() < length {
            return Err(GwBankError::PsdMismatch {
                reason: format!("psd has {} bins, normalization needs {}", psd.len(), length),
            });
        }
        let weights = psd.as_slice();
        let mut values = vec![0.0; length];
        let mut running = 0.0f64;
        for k in kmin..length {
            let amp = shape(k);
            running += amp * amp / weights[k];
            values[k] = running * 4.0 * delta_f;
        }
        Ok(Self { values })
    }

    /// Returns the normalization for templates ending at bin `end_idx`.
    pub fn at(&self, end_idx: usize) -> GwBankResult<f64> {
        self.values
            .get(end_idx)
            .copied()
            .ok_or(GwBankError::IndexOutOfBounds {
                index: end_idx,
                len: self.values.len(),
                context: "end_idx",
            })
    }

    /// Returns the number of addressable end bins.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no end bin is addressable.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns all values.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}
