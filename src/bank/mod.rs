//! Lazily evaluated template filter banks.
//!
//! A bank owns a template table and turns row `i` into a frequency-domain
//! filter only when asked. [`FilterBank`] synthesizes filters through a
//! [`WaveformGenerator`]; [`CachedFilterBank`] replays time-domain templates
//! from a [`FilterCache`](crate::cache::FilterCache).
//!
//! Both expose two access modes. `get` allocates a fresh buffer per call and
//! is safe to use from many threads. `get_into` writes into a caller buffer
//! that the returned filter borrows, so the next call cannot overwrite a
//! result that is still in use.
//!
//! When a noise spectrum is supplied and the generator reports
//! [`NormSupport::Precomputed`], the normalization vector is built once at
//! construction and each `sigma_squared` becomes a lookup. Otherwise the
//! normalization is integrated per template.

mod cached;
mod filter;

pub use cached::{CachedBankConfig, CachedFilterBank, DEFAULT_CACHE_SAMPLE_RATE};
pub use filter::TemplateFilter;

use crate::kernel::sigmasq;
use crate::norm::NormalizationVector;
use crate::series::{zero_fill, FilterSample, Psd};
use crate::table::{LoadStatus, TemplateParams, TemplateTable};
use crate::trace::{trace_event, trace_span};
use crate::util::math::bin_index;
use crate::util::{GwBankError, GwBankResult, DYN_RANGE_FAC};
use crate::waveform::{
    Approximant, GenerationRequest, GeneratorOptions, NormSupport, WaveformGenerator,
};
use filter::FilterMeta;
use rustfft::num_complex::Complex64;
use std::borrow::Cow;
use std::marker::PhantomData;
use std::path::Path;

/// Configuration for a synthesizing filter bank.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterBankConfig {
    /// Number of frequency bins per filter.
    pub filter_length: usize,
    /// Bin spacing in Hz.
    pub delta_f: f64,
    /// Low-frequency cutoff in Hz.
    pub f_lower: f64,
    /// Waveform family used for every template.
    pub approximant: Approximant,
    /// Family-specific generator options.
    pub options: GeneratorOptions,
}

impl FilterBankConfig {
    /// Creates a configuration with default generator options.
    pub fn new(
        approximant: Approximant,
        filter_length: usize,
        delta_f: f64,
        f_lower: f64,
    ) -> Self {
        Self {
            filter_length,
            delta_f,
            f_lower,
            approximant,
            options: GeneratorOptions::default(),
        }
    }

    /// Replaces the generator options.
    pub fn with_options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    /// Checks ranges and option support, returning `kmin`.
    pub fn validate(&self) -> GwBankResult<usize> {
        let kmin = validate_grid(self.filter_length, self.delta_f, self.f_lower)?;
        self.options.validate(self.approximant)?;
        Ok(kmin)
    }
}

/// Validates the frequency grid shared by both bank kinds and returns `kmin`.
pub(crate) fn validate_grid(
    filter_length: usize,
    delta_f: f64,
    f_lower: f64,
) -> GwBankResult<usize> {
    if filter_length < 2 {
        return Err(GwBankError::InvalidConfig {
            reason: "filter_length must be >= 2",
        });
    }
    if !delta_f.is_finite() || delta_f <= 0.0 {
        return Err(GwBankError::InvalidConfig {
            reason: "delta_f must be finite and > 0",
        });
    }
    if !f_lower.is_finite() || f_lower < 0.0 {
        return Err(GwBankError::InvalidConfig {
            reason: "f_lower must be finite and >= 0",
        });
    }
    let kmin = bin_index(f_lower, delta_f);
    if kmin >= filter_length {
        return Err(GwBankError::InvalidConfig {
            reason: "f_lower must lie below the last frequency bin",
        });
    }
    Ok(kmin)
}

/// Caps a generator end frequency to the last representable bin.
///
/// Undefined, non-finite, non-positive and out-of-band values all map to
/// `(filter_length - 1) * delta_f`.
pub(crate) fn clamp_end_frequency(
    natural: Option<f64>,
    filter_length: usize,
    delta_f: f64,
) -> f64 {
    let last = (filter_length - 1) as f64 * delta_f;
    match natural {
        Some(f) if f.is_finite() && f > 0.0 && f <= last => f,
        _ => last,
    }
}

/// Bank that synthesizes each filter on demand.
///
/// `T` is the output precision, `Complex64` or `Complex32`.
pub struct FilterBank<G, T = Complex64> {
    table: TemplateTable,
    status: LoadStatus,
    generator: G,
    cfg: FilterBankConfig,
    psd: Option<Psd>,
    norm: Option<NormalizationVector>,
    kmin: usize,
    time_length: usize,
    delta_t: f64,
    _sample: PhantomData<T>,
}

impl<G: WaveformGenerator, T: FilterSample> FilterBank<G, T> {
    /// Loads the template file at `path` and prepares the bank.
    ///
    /// An unreadable or malformed file yields an empty bank; the reason is
    /// available from [`load_status`](Self::load_status). Configuration and
    /// spectrum problems are errors.
    pub fn open<P: AsRef<Path>>(
        path: P,
        cfg: FilterBankConfig,
        generator: G,
        psd: Option<Psd>,
    ) -> GwBankResult<Self> {
        let (table, status) = TemplateTable::load_or_empty(path).into_parts();
        let mut bank = Self::from_table(table, cfg, generator, psd)?;
        bank.status = status;
        Ok(bank)
    }

    /// Prepares a bank over an in-memory table.
    pub fn from_table(
        table: TemplateTable,
        cfg: FilterBankConfig,
        generator: G,
        psd: Option<Psd>,
    ) -> GwBankResult<Self> {
        let kmin = cfg.validate()?;
        let _span = trace_span!(
            "filter_bank_open",
            templates = table.len(),
            filter_length = cfg.filter_length
        )
        .entered();

        if let Some(psd) = &psd {
            psd.check_aligned(cfg.filter_length, cfg.delta_f, kmin)?;
        }

        let norm = match &psd {
            Some(psd) if generator.norm_support(cfg.approximant) == NormSupport::Precomputed => {
                let norm = generator.filter_norm(
                    cfg.approximant,
                    psd,
                    cfg.filter_length,
                    cfg.delta_f,
                    cfg.f_lower,
                )?;
                if norm.len() < cfg.filter_length {
                    return Err(GwBankError::InvalidInput(
                        "normalization vector shorter than filter_length",
                    ));
                }
                trace_event!("normalization_vector_built", bins = norm.len());
                Some(norm)
            }
            _ => None,
        };

        let time_length = 2 * (cfg.filter_length - 1);
        let delta_t = 1.0 / (time_length as f64 * cfg.delta_f);
        Ok(Self {
            table,
            status: LoadStatus::Parsed,
            generator,
            cfg,
            psd,
            norm,
            kmin,
            time_length,
            delta_t,
            _sample: PhantomData,
        })
    }

    /// Returns the number of templates.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if the bank has no templates.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the parameter row for `index`.
    pub fn params(&self, index: usize) -> Option<&TemplateParams> {
        self.table.get(index)
    }

    /// Returns the template table.
    pub fn table(&self) -> &TemplateTable {
        &self.table
    }

    /// Reports whether the template file parsed.
    pub fn load_status(&self) -> &LoadStatus {
        &self.status
    }

    /// Returns the bank configuration.
    pub fn config(&self) -> &FilterBankConfig {
        &self.cfg
    }

    /// Returns the noise spectrum, if one was supplied.
    pub fn psd(&self) -> Option<&Psd> {
        self.psd.as_ref()
    }

    /// Returns the precomputed normalization, if the generator supports one.
    pub fn normalization(&self) -> Option<&NormalizationVector> {
        self.norm.as_ref()
    }

    /// Returns the bin of the low-frequency cutoff.
    pub fn kmin(&self) -> usize {
        self.kmin
    }

    /// Returns the time-domain length `2 * (filter_length - 1)`.
    pub fn time_length(&self) -> usize {
        self.time_length
    }

    /// Returns the time-domain sample interval in seconds.
    pub fn delta_t(&self) -> f64 {
        self.delta_t
    }

    /// Builds the filter for `index` in a freshly allocated buffer.
    pub fn get(&self, index: usize) -> GwBankResult<TemplateFilter<'_, T>> {
        let params = self.table.row(index)?;
        let mut data = vec![T::ZERO; self.cfg.filter_length];
        let meta = self.fill(index, params, &mut data)?;
        Ok(meta.with_data(Cow::Owned(data)))
    }

    /// Builds the filter for `index` in `out`, which must hold at least
    /// `filter_length` samples.
    ///
    /// Only the first `filter_length` samples are used; they are cleared first.
    /// The returned filter borrows `out` until it is dropped.
    pub fn get_into<'a>(
        &'a self,
        index: usize,
        out: &'a mut [T],
    ) -> GwBankResult<TemplateFilter<'a, T>> {
        let needed = self.cfg.filter_length;
        if out.len() < needed {
            return Err(GwBankError::BufferTooSmall {
                needed,
                got: out.len(),
            });
        }
        let params = self.table.row(index)?;
        let buf = &mut out[..needed];
        zero_fill(buf);
        let meta = self.fill(index, params, buf)?;
        let view: &'a [T] = buf;
        Ok(meta.with_data(Cow::Borrowed(view)))
    }

    /// Iterates over all filters in index order with private allocation.
    pub fn iter(&self) -> impl Iterator<Item = GwBankResult<TemplateFilter<'_, T>>> + '_ {
        (0..self.len()).map(move |index| self.get(index))
    }

    fn fill<'a>(
        &'a self,
        index: usize,
        params: &'a TemplateParams,
        buf: &mut [T],
    ) -> GwBankResult<FilterMeta<'a>> {
        let _span = trace_span!("filter_bank_get", index = index).entered();
        let cfg = &self.cfg;

        let natural = self
            .generator
            .end_frequency(params, cfg.approximant, &cfg.options);
        let end_frequency = clamp_end_frequency(natural, cfg.filter_length, cfg.delta_f);

        let request = GenerationRequest {
            f_lower: cfg.f_lower,
            delta_f: cfg.delta_f,
            delta_t: self.delta_t,
            distance: 1.0 / DYN_RANGE_FAC,
            options: &cfg.options,
        };
        let generated = self
            .generator
            .generate(buf, params, cfg.approximant, &request)?;

        let end_idx = bin_index(end_frequency, cfg.delta_f).min(cfg.filter_length - 1);

        let sigma_squared = match (&self.psd, &self.norm) {
            (None, _) => None,
            (Some(_), Some(norm)) => {
                let amp_norm = self
                    .generator
                    .amplitude_norm(params, cfg.approximant, &cfg.options)
                    .unwrap_or(1.0);
                let scale = DYN_RANGE_FAC * amp_norm;
                Some(norm.at(end_idx)? * scale * scale)
            }
            (Some(psd), None) => Some(sigmasq(buf, psd, cfg.delta_f, cfg.f_lower, None)),
        };

        if let Some(seconds) = generated.length_in_time {
            params.set_template_duration(seconds);
        }

        Ok(FilterMeta {
            delta_f: cfg.delta_f,
            end_frequency: Some(end_frequency),
            end_idx: Some(end_idx),
            sigma_squared,
            params,
            length_in_time: generated.length_in_time,
        })
    }
}

#[cfg(feature = "rayon")]
impl<G: WaveformGenerator + Sync, T: FilterSample> FilterBank<G, T> {
    /// Builds every filter in parallel with private allocation.
    ///
    /// Results are in index order; the first failure is returned.
    pub fn par_get_all(&self) -> GwBankResult<Vec<TemplateFilter<'_, T>>> {
        use rayon::prelude::*;

        let _span = trace_span!("filter_bank_par_get_all", templates = self.len()).entered();
        (0..self.len())
            .into_par_iter()
            .map(|index| self.get(index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{clamp_end_frequency, validate_grid};
    use crate::util::GwBankError;

    #[test]
    fn clamp_caps_missing_and_out_of_band_values() {
        let last = 1024.0 * 0.25;
        assert_eq!(clamp_end_frequency(None, 1025, 0.25), last);
        assert_eq!(clamp_end_frequency(Some(1e6), 1025, 0.25), last);
        assert_eq!(clamp_end_frequency(Some(1025.0 * 0.25), 1025, 0.25), last);
        assert_eq!(clamp_end_frequency(Some(256.1), 1025, 0.25), last);
        assert_eq!(clamp_end_frequency(Some(f64::NAN), 1025, 0.25), last);
        assert_eq!(clamp_end_frequency(Some(0.0), 1025, 0.25), last);
        assert_eq!(clamp_end_frequency(Some(100.0), 1025, 0.25), 100.0);
    }

    #[test]
    fn grid_validation_rejects_bad_values() {
        assert_eq!(validate_grid(1025, 0.25, 30.0).unwrap(), 120);
        assert_eq!(
            validate_grid(1, 0.25, 30.0).err().unwrap(),
            GwBankError::InvalidConfig {
                reason: "filter_length must be >= 2",
            }
        );
        assert!(validate_grid(1025, 0.0, 30.0).is_err());
        assert!(validate_grid(1025, 0.25, -1.0).is_err());
        assert!(validate_grid(1025, 0.25, 300.0).is_err());
    }
}
