//! Frequency-domain filter handed out by a bank.

use crate::series::FilterSample;
use crate::table::TemplateParams;
use std::borrow::Cow;

/// A template filter with its matched-filter metadata.
///
/// `data` is either owned by the filter or borrowed from a caller buffer; in
/// the borrowed case the buffer stays locked until the filter is dropped.
#[derive(Clone, Debug)]
pub struct TemplateFilter<'a, T: FilterSample> {
    data: Cow<'a, [T]>,
    delta_f: f64,
    end_frequency: Option<f64>,
    end_idx: Option<usize>,
    sigma_squared: Option<f64>,
    params: &'a TemplateParams,
    length_in_time: Option<f64>,
}

/// Everything about a filter except its samples.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FilterMeta<'a> {
    pub(crate) delta_f: f64,
    pub(crate) end_frequency: Option<f64>,
    pub(crate) end_idx: Option<usize>,
    pub(crate) sigma_squared: Option<f64>,
    pub(crate) params: &'a TemplateParams,
    pub(crate) length_in_time: Option<f64>,
}

impl<'a> FilterMeta<'a> {
    pub(crate) fn with_data<T: FilterSample>(self, data: Cow<'a, [T]>) -> TemplateFilter<'a, T> {
        TemplateFilter {
            data,
            delta_f: self.delta_f,
            end_frequency: self.end_frequency,
            end_idx: self.end_idx,
            sigma_squared: self.sigma_squared,
            params: self.params,
            length_in_time: self.length_in_time,
        }
    }
}

impl<'a, T: FilterSample> TemplateFilter<'a, T> {
    /// Returns the frequency-domain samples.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Returns the number of frequency bins.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the filter has no bins.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if the samples live in a caller-supplied buffer.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.data, Cow::Borrowed(_))
    }

    /// Returns the bin spacing in Hz.
    pub fn delta_f(&self) -> f64 {
        self.delta_f
    }

    /// Returns the frequency of bin `k` in Hz.
    pub fn frequency(&self, k: usize) -> f64 {
        k as f64 * self.delta_f
    }

    /// Returns the highest physically valid frequency, for synthesized filters.
    pub fn end_frequency(&self) -> Option<f64> {
        self.end_frequency
    }

    /// Returns the bin of [`end_frequency`](Self::end_frequency).
    pub fn end_idx(&self) -> Option<usize> {
        self.end_idx
    }

    /// Returns the matched-filter normalization, if a noise spectrum was given.
    pub fn sigma_squared(&self) -> Option<f64> {
        self.sigma_squared
    }

    /// Returns `sqrt(sigma_squared)`.
    pub fn sigma(&self) -> Option<f64> {
        self.sigma_squared.map(f64::sqrt)
    }

    /// Returns the parameter row this filter was built from.
    pub fn params(&self) -> &'a TemplateParams {
        self.params
    }

    /// Returns the waveform duration in seconds, if the generator reported one.
    pub fn length_in_time(&self) -> Option<f64> {
        self.length_in_time
    }

    /// Consumes the filter, returning its samples.
    pub fn into_data(self) -> Vec<T> {
        self.data.into_owned()
    }
}
