//! Waveform generator interface.
//!
//! A bank does not know how to synthesize waveforms; it asks a
//! [`WaveformGenerator`] for capability answers (end frequency, amplitude
//! norm, whether a precomputed normalization exists) and to fill a
//! frequency-domain buffer. [`SpaGenerator`] is the built-in implementation.

use crate::norm::NormalizationVector;
use crate::series::{FilterSample, Psd};
use crate::table::TemplateParams;
use crate::util::{GwBankError, GwBankResult};
use std::fmt;
use std::str::FromStr;

mod spa;

pub use spa::SpaGenerator;

/// Waveform family selecting the generation algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Approximant {
    /// Stationary-phase template with a factored-out amplitude.
    SpaTmplt,
    /// Frequency-domain post-Newtonian inspiral.
    TaylorF2,
}

impl Approximant {
    /// All known approximants.
    pub const ALL: [Approximant; 2] = [Approximant::SpaTmplt, Approximant::TaylorF2];

    /// Returns the canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Approximant::SpaTmplt => "SPAtmplt",
            Approximant::TaylorF2 => "TaylorF2",
        }
    }

    /// Returns the generator options this family understands.
    pub fn recognized_options(self) -> &'static [OptionKey] {
        match self {
            Approximant::SpaTmplt => &[OptionKey::PhaseOrder],
            Approximant::TaylorF2 => &[OptionKey::PhaseOrder, OptionKey::FinalFrequency],
        }
    }
}

impl fmt::Display for Approximant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Approximant {
    type Err = GwBankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Approximant::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| GwBankError::UnknownApproximant {
                name: s.to_string(),
            })
    }
}

/// Whether a family's normalization can be tabulated once per bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NormSupport {
    /// `sigmasq` is a lookup in a cumulative vector times an amplitude scale.
    Precomputed,
    /// `sigmasq` must be integrated per template.
    Direct,
}

/// Keys accepted in [`GeneratorOptions`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionKey {
    PhaseOrder,
    FinalFrequency,
}

impl OptionKey {
    /// Returns the option name as written in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            OptionKey::PhaseOrder => "phase_order",
            OptionKey::FinalFrequency => "f_final",
        }
    }
}

/// Highest supported phase order, in units of 0.5PN.
pub const MAX_PHASE_ORDER: u32 = 4;

/// Generator-specific options.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeneratorOptions {
    /// Post-Newtonian phase order in units of 0.5PN, `0..=4`. Defaults to 4.
    pub phase_order: Option<u32>,
    /// Termination frequency in Hz.
    pub f_final: Option<f64>,
}

impl GeneratorOptions {
    fn present(&self) -> impl Iterator<Item = OptionKey> + '_ {
        let keys = [
            (OptionKey::PhaseOrder, self.phase_order.is_some()),
            (OptionKey::FinalFrequency, self.f_final.is_some()),
        ];
        keys.into_iter().filter(|(_, set)| *set).map(|(key, _)| key)
    }

    /// Checks that every set option is recognized by `approximant` and in range.
    pub fn validate(&self, approximant: Approximant) -> GwBankResult<()> {
        let recognized = approximant.recognized_options();
        if let Some(key) = self.present().find(|key| !recognized.contains(key)) {
            return Err(GwBankError::UnsupportedOption {
                option: key.name(),
                approximant: approximant.name(),
            });
        }
        if self.phase_order.is_some_and(|order| order > MAX_PHASE_ORDER) {
            return Err(GwBankError::InvalidConfig {
                reason: "phase_order must be in 0..=4",
            });
        }
        if self.f_final.is_some_and(|f| !f.is_finite() || f <= 0.0) {
            return Err(GwBankError::InvalidConfig {
                reason: "f_final must be finite and > 0",
            });
        }
        Ok(())
    }
}

/// Numerical settings passed to a generator for one fill.
#[derive(Clone, Copy, Debug)]
pub struct GenerationRequest<'a> {
    pub f_lower: f64,
    pub delta_f: f64,
    pub delta_t: f64,
    /// Luminosity distance in Mpc.
    pub distance: f64,
    pub options: &'a GeneratorOptions,
}

/// Side information returned by a fill.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GeneratedFilter {
    /// Physical duration of the waveform in seconds, if known.
    pub length_in_time: Option<f64>,
}

/// Source of frequency-domain template filters.
pub trait WaveformGenerator {
    /// Reports whether `approximant` supports a precomputed normalization.
    fn norm_support(&self, approximant: Approximant) -> NormSupport;

    /// Builds the normalization vector for `approximant` against `psd`.
    ///
    /// Only called when [`norm_support`](Self::norm_support) returns
    /// [`NormSupport::Precomputed`].
    fn filter_norm(
        &self,
        approximant: Approximant,
        psd: &Psd,
        filter_length: usize,
        delta_f: f64,
        f_lower: f64,
    ) -> GwBankResult<NormalizationVector>;

    /// Natural end frequency of a template in Hz, if the family defines one.
    fn end_frequency(
        &self,
        params: &TemplateParams,
        approximant: Approximant,
        options: &GeneratorOptions,
    ) -> Option<f64>;

    /// Per-template amplitude scale used with the normalization vector.
    fn amplitude_norm(
        &self,
        params: &TemplateParams,
        approximant: Approximant,
        options: &GeneratorOptions,
    ) -> Option<f64>;

    /// Writes the filter for `params` into `out`, which arrives zeroed.
    fn generate<T: FilterSample>(
        &self,
        out: &mut [T],
        params: &TemplateParams,
        approximant: Approximant,
        request: &GenerationRequest<'_>,
    ) -> GwBankResult<GeneratedFilter>;
}
