//! GwBank is a lazy, memoized matched-filter template bank for compact-binary
//! gravitational-wave searches.
//!
//! A bank is built from a table of template parameters and turns row `i` into
//! a frequency-domain filter only when that index is requested. Synthesized
//! banks ([`FilterBank`]) delegate waveform generation to a
//! [`WaveformGenerator`]; replay banks ([`CachedFilterBank`]) transform
//! cached time-domain templates. Optional parallelism is available via the
//! `rayon` feature and SIMD accumulation via `simd`.

pub mod bank;
pub mod cache;
pub mod kernel;
pub mod lowlevel;
pub mod norm;
pub mod series;
pub mod table;
mod trace;
pub mod util;
pub mod waveform;

pub use bank::{
    CachedBankConfig, CachedFilterBank, FilterBank, FilterBankConfig, TemplateFilter,
    DEFAULT_CACHE_SAMPLE_RATE,
};
pub use cache::{CachedSamples, FilterCache, JsonCache, MemoryCache};
pub use kernel::sigmasq;
pub use norm::NormalizationVector;
pub use series::{FilterSample, Psd};
pub use table::{LoadStatus, TableLoad, TemplateParams, TemplateTable};
pub use util::{GwBankError, GwBankResult, DYN_RANGE_FAC};
pub use waveform::{
    Approximant, GeneratorOptions, NormSupport, SpaGenerator, WaveformGenerator,
};

pub use rustfft::num_complex;
