//! Replay bank over cached time-domain templates.
//!
//! Cached templates are real series at a fixed sample rate. Each one is
//! zero-padded to the bank's time length, rolled back by its own length so the
//! waveform ends at the wrap point, transformed, and trimmed to
//! `filter_length` bins. The normalization is always integrated against the
//! noise spectrum since the generation amplitude is not known.

use super::filter::FilterMeta;
use super::{validate_grid, TemplateFilter};
use crate::cache::FilterCache;
use crate::kernel::sigmasq;
use crate::series::fft::real_to_frequency;
use crate::series::{resize_zero, roll_backward, FilterSample, Psd};
use crate::table::{LoadStatus, TemplateParams, TemplateTable};
use crate::trace::trace_span;
use crate::util::math::rel_close;
use crate::util::{GwBankError, GwBankResult};
use rustfft::num_complex::Complex64;
use std::borrow::Cow;
use std::marker::PhantomData;
use std::path::Path;

/// Sample rate cached templates were produced at, in Hz.
pub const DEFAULT_CACHE_SAMPLE_RATE: f64 = 4096.0;

/// Configuration for a replay bank.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedBankConfig {
    /// Number of frequency bins per filter.
    pub filter_length: usize,
    /// Bin spacing in Hz; must equal `sample_rate / (2 * (filter_length - 1))`.
    pub delta_f: f64,
    /// Low-frequency cutoff in Hz.
    pub f_lower: f64,
    /// Rate of the cached samples in Hz.
    pub sample_rate: f64,
}

impl CachedBankConfig {
    /// Creates a configuration at the default cache sample rate.
    pub fn new(filter_length: usize, delta_f: f64, f_lower: f64) -> Self {
        Self {
            filter_length,
            delta_f,
            f_lower,
            sample_rate: DEFAULT_CACHE_SAMPLE_RATE,
        }
    }

    /// Checks ranges and rate consistency, returning `kmin`.
    pub fn validate(&self) -> GwBankResult<usize> {
        let kmin = validate_grid(self.filter_length, self.delta_f, self.f_lower)?;
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(GwBankError::InvalidConfig {
                reason: "sample_rate must be finite and > 0",
            });
        }
        let time_length = 2 * (self.filter_length - 1);
        let implied_rate = self.delta_f * time_length as f64;
        if !rel_close(implied_rate, self.sample_rate, 1e-9) {
            return Err(GwBankError::SampleRateMismatch {
                expected: implied_rate,
                got: self.sample_rate,
            });
        }
        Ok(kmin)
    }
}

/// Bank that replays cached time-domain templates.
pub struct CachedFilterBank<C, T = Complex64> {
    table: TemplateTable,
    status: LoadStatus,
    cache: C,
    cfg: CachedBankConfig,
    psd: Psd,
    time_length: usize,
    _sample: PhantomData<T>,
}

impl<C: FilterCache, T: FilterSample> CachedFilterBank<C, T> {
    /// Loads the template file at `path` and attaches an opened cache.
    ///
    /// An unreadable template file yields an empty bank.
    pub fn open<P: AsRef<Path>>(
        path: P,
        cache: C,
        cfg: CachedBankConfig,
        psd: Psd,
    ) -> GwBankResult<Self> {
        let (table, status) = TemplateTable::load_or_empty(path).into_parts();
        let mut bank = Self::from_table(table, cache, cfg, psd)?;
        bank.status = status;
        Ok(bank)
    }

    /// Prepares a bank over an in-memory table.
    pub fn from_table(
        table: TemplateTable,
        cache: C,
        cfg: CachedBankConfig,
        psd: Psd,
    ) -> GwBankResult<Self> {
        let kmin = cfg.validate()?;
        psd.check_aligned(cfg.filter_length, cfg.delta_f, kmin)?;
        let time_length = 2 * (cfg.filter_length - 1);
        Ok(Self {
            table,
            status: LoadStatus::Parsed,
            cache,
            cfg,
            psd,
            time_length,
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

    /// Reports whether the template file parsed.
    pub fn load_status(&self) -> &LoadStatus {
        &self.status
    }

    /// Returns the bank configuration.
    pub fn config(&self) -> &CachedBankConfig {
        &self.cfg
    }

    /// Returns the time-domain length `2 * (filter_length - 1)`.
    pub fn time_length(&self) -> usize {
        self.time_length
    }

    /// Replays the template at `index` into a freshly allocated buffer.
    pub fn get(&self, index: usize) -> GwBankResult<TemplateFilter<'_, T>> {
        let mut data = vec![T::ZERO; self.cfg.filter_length];
        let meta = self.fill(index, &mut data)?;
        Ok(meta.with_data(Cow::Owned(data)))
    }

    /// Replays the template at `index` into the first `filter_length`
    /// samples of `out`.
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
        let buf = &mut out[..needed];
        let meta = self.fill(index, buf)?;
        let view: &'a [T] = buf;
        Ok(meta.with_data(Cow::Borrowed(view)))
    }

    /// Iterates over all filters in index order with private allocation.
    pub fn iter(&self) -> impl Iterator<Item = GwBankResult<TemplateFilter<'_, T>>> + '_ {
        (0..self.len()).map(move |index| self.get(index))
    }

    fn fill(&self, index: usize, buf: &mut [T]) -> GwBankResult<FilterMeta<'_>> {
        let params = self.table.row(index)?;
        let _span = trace_span!("cached_bank_get", index = index).entered();
        let cfg = &self.cfg;

        let entry = self.cache.fetch(&index.to_string())?;
        if let Some(rate) = entry.sample_rate {
            if !rel_close(rate, cfg.sample_rate, 1e-9) {
                return Err(GwBankError::SampleRateMismatch {
                    expected: cfg.sample_rate,
                    got: rate,
                });
            }
        }

        let mut samples = entry.samples;
        let original_len = samples.len();
        resize_zero(&mut samples, self.time_length, 0.0);
        roll_backward(&mut samples, original_len);

        let mut spectrum = real_to_frequency(&samples, cfg.sample_rate);
        resize_zero(&mut spectrum, cfg.filter_length, Complex64::new(0.0, 0.0));
        for (dst, src) in buf.iter_mut().zip(spectrum) {
            *dst = T::from_complex64(src);
        }

        let sigma_squared = sigmasq(buf, &self.psd, cfg.delta_f, cfg.f_lower, None);
        Ok(FilterMeta {
            delta_f: cfg.delta_f,
            end_frequency: None,
            end_idx: None,
            sigma_squared: Some(sigma_squared),
            params,
            length_in_time: None,
        })
    }
}
