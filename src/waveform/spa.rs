//! Stationary-phase inspiral generator.
//!
//! The filter is `A f^(-7/6) exp(-iΨ(f))` between `f_lower` and the end
//! frequency, with the non-spinning post-Newtonian phase
//!
//! ```text
//! Ψ(f) = -φ_c - π/4 + 3 / (128 η v^5) Σ_k ψ_k v^k,   v = (π M f)^(1/3)
//! ```
//!
//! truncated at the requested phase order. Because the shape `f^(-7/6)` is
//! the same for every template, SPAtmplt factors the mass-dependent amplitude
//! out and supports a precomputed normalization.

use super::{
    Approximant, GeneratedFilter, GenerationRequest, GeneratorOptions, NormSupport,
    WaveformGenerator, MAX_PHASE_ORDER,
};
use crate::norm::NormalizationVector;
use crate::series::{FilterSample, Psd};
use crate::table::TemplateParams;
use crate::util::math::{bin_index, MRSUN_SI, MTSUN_SI, PC_SI};
use crate::util::{GwBankError, GwBankResult};
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

/// Reference generator for the `SPAtmplt` and `TaylorF2` families.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpaGenerator;

/// Unit-amplitude SPA shape `f^(-7/6)` at bin `k`, zero at DC.
pub(crate) fn spa_shape(k: usize, delta_f: f64) -> f64 {
    if k == 0 {
        return 0.0;
    }
    (k as f64 * delta_f).powf(-7.0 / 6.0)
}

/// Innermost stable circular orbit frequency for total mass `m_total` (M_sun).
pub(crate) fn isco_frequency(m_total: f64) -> f64 {
    1.0 / (6.0f64.powf(1.5) * PI * m_total * MTSUN_SI)
}

/// Amplitude constant of the SPA waveform at 1 Mpc.
pub(crate) fn spa_amplitude_factor(mass1: f64, mass2: f64) -> f64 {
    let m_total = mass1 + mass2;
    let eta = mass1 * mass2 / (m_total * m_total);
    let ft_newt = 32.0 * eta * eta / 5.0;
    let de_newt = -eta;
    let pi_m = PI * m_total * MTSUN_SI;
    let amp0 = 4.0 * mass1 * mass2 / (1e6 * PC_SI) * MRSUN_SI * MTSUN_SI * (PI / 12.0).sqrt();
    (-de_newt / ft_newt).sqrt() * amp0 * pi_m.powf(-7.0 / 6.0)
}

/// Newtonian chirp time from `f_lower` to coalescence, in seconds.
pub(crate) fn newtonian_chirp_time(mass1: f64, mass2: f64, f_lower: f64) -> f64 {
    let m_total = mass1 + mass2;
    let eta = mass1 * mass2 / (m_total * m_total);
    let m_sec = m_total * MTSUN_SI;
    let v = (PI * m_sec * f_lower).cbrt();
    5.0 * m_sec / (256.0 * eta * v.powi(8))
}

/// Phase coefficients `ψ_0..ψ_4` for symmetric mass ratio `eta`.
fn phase_coefficients(eta: f64) -> [f64; 5] {
    [
        1.0,
        0.0,
        3715.0 / 756.0 + 55.0 / 9.0 * eta,
        -16.0 * PI,
        15_293_365.0 / 508_032.0 + 27145.0 / 504.0 * eta + 3085.0 / 72.0 * eta * eta,
    ]
}

fn check_masses(params: &TemplateParams) -> GwBankResult<()> {
    let valid = |m: f64| m.is_finite() && m > 0.0;
    if !valid(params.mass1) || !valid(params.mass2) {
        return Err(GwBankError::InvalidParameters {
            reason: format!(
                "component masses must be finite and > 0 (mass1={}, mass2={})",
                params.mass1, params.mass2
            ),
        });
    }
    Ok(())
}

impl WaveformGenerator for SpaGenerator {
    fn norm_support(&self, approximant: Approximant) -> NormSupport {
        match approximant {
            Approximant::SpaTmplt => NormSupport::Precomputed,
            Approximant::TaylorF2 => NormSupport::Direct,
        }
    }

    fn filter_norm(
        &self,
        approximant: Approximant,
        psd: &Psd,
        filter_length: usize,
        delta_f: f64,
        f_lower: f64,
    ) -> GwBankResult<NormalizationVector> {
        if self.norm_support(approximant) != NormSupport::Precomputed {
            return Err(GwBankError::InvalidInput(
                "approximant has no precomputed normalization",
            ));
        }
        let kmin = bin_index(f_lower, delta_f);
        NormalizationVector::cumulative(psd, filter_length, delta_f, kmin, |k| {
            spa_shape(k, delta_f)
        })
    }

    fn end_frequency(
        &self,
        params: &TemplateParams,
        approximant: Approximant,
        options: &GeneratorOptions,
    ) -> Option<f64> {
        match approximant {
            Approximant::SpaTmplt => {
                check_masses(params).ok()?;
                Some(isco_frequency(params.total_mass()))
            }
            Approximant::TaylorF2 => options.f_final,
        }
    }

    fn amplitude_norm(
        &self,
        params: &TemplateParams,
        approximant: Approximant,
        _options: &GeneratorOptions,
    ) -> Option<f64> {
        match approximant {
            Approximant::SpaTmplt => {
                check_masses(params).ok()?;
                Some(spa_amplitude_factor(params.mass1, params.mass2))
            }
            Approximant::TaylorF2 => None,
        }
    }

    fn generate<T: FilterSample>(
        &self,
        out: &mut [T],
        params: &TemplateParams,
        approximant: Approximant,
        request: &GenerationRequest<'_>,
    ) -> GwBankResult<GeneratedFilter> {
        check_masses(params)?;
        if out.is_empty() {
            return Ok(GeneratedFilter::default());
        }
        if !request.distance.is_finite() || request.distance <= 0.0 {
            return Err(GwBankError::InvalidParameters {
                reason: format!("distance must be > 0, got {}", request.distance),
            });
        }

        let delta_f = request.delta_f;
        let m_total = params.total_mass();
        let eta = params.symmetric_mass_ratio();
        let pi_m = PI * m_total * MTSUN_SI;

        let f_end = match approximant {
            Approximant::SpaTmplt => isco_frequency(m_total),
            Approximant::TaylorF2 => request
                .options
                .f_final
                .unwrap_or_else(|| isco_frequency(m_total)),
        };
        let kmin = bin_index(request.f_lower, delta_f).max(1);
        let kend = bin_index(f_end, delta_f).min(out.len() - 1);

        let order = request.options.phase_order.unwrap_or(MAX_PHASE_ORDER) as usize;
        let coeffs = phase_coefficients(eta);
        let newt = 3.0 / (128.0 * eta);
        let amp = spa_amplitude_factor(params.mass1, params.mass2) / request.distance;

        for k in kmin..=kend {
            let v = (pi_m * k as f64 * delta_f).cbrt();
            let mut series = 0.0;
            let mut v_pow = 1.0;
            for coeff in coeffs.iter().take(order + 1) {
                series += coeff * v_pow;
                v_pow *= v;
            }
            let psi = -params.coa_phase - PI / 4.0 + newt * series / v.powi(5);
            let value = Complex64::from_polar(amp * spa_shape(k, delta_f), -psi);
            out[k] = T::from_complex64(value);
        }

        let length_in_time = match approximant {
            Approximant::SpaTmplt if request.f_lower > 0.0 => Some(newtonian_chirp_time(
                params.mass1,
                params.mass2,
                request.f_lower,
            )),
            _ => None,
        };
        Ok(GeneratedFilter { length_in_time })
    }
}

#[cfg(test)]
mod tests {
    use super::{isco_frequency, newtonian_chirp_time, spa_amplitude_factor, SpaGenerator};
    use crate::series::Psd;
    use crate::table::TemplateParams;
    use crate::util::GwBankError;
    use crate::waveform::{
        Approximant, GenerationRequest, GeneratorOptions, NormSupport, WaveformGenerator,
    };
    use rustfft::num_complex::Complex64;

    fn request(options: &GeneratorOptions) -> GenerationRequest<'_> {
        GenerationRequest {
            f_lower: 30.0,
            delta_f: 0.25,
            delta_t: 1.0 / 512.0,
            distance: 1.0,
            options,
        }
    }

    #[test]
    fn isco_of_binary_neutron_star() {
        // 2.8 M_sun total mass terminates near 1570 Hz.
        let f = isco_frequency(2.8);
        assert!((f - 1570.4).abs() < 1.0, "isco {f}");
    }

    #[test]
    fn chirp_time_decreases_with_frequency() {
        let low = newtonian_chirp_time(1.4, 1.4, 30.0);
        let high = newtonian_chirp_time(1.4, 1.4, 40.0);
        assert!(low > high);
        // Roughly a minute for a BNS from 30 Hz.
        assert!(low > 40.0 && low < 80.0, "tau0 {low}");
    }

    #[test]
    fn spa_fills_only_the_band() {
        let gen = SpaGenerator;
        let params = TemplateParams::new(10.0, 10.0);
        let options = GeneratorOptions::default();
        let mut out = vec![Complex64::new(0.0, 0.0); 1025];
        let info = gen
            .generate(&mut out, &params, Approximant::SpaTmplt, &request(&options))
            .unwrap();

        let kmin = 120;
        let kend = (isco_frequency(20.0) / 0.25).floor() as usize;
        assert!(out[..kmin].iter().all(|c| c.norm_sqr() == 0.0));
        assert!(out[kmin..=kend].iter().all(|c| c.norm_sqr() > 0.0));
        assert!(out[kend + 1..].iter().all(|c| c.norm_sqr() == 0.0));
        assert!(info.length_in_time.is_some());

        let expected = spa_amplitude_factor(10.0, 10.0) * (kmin as f64 * 0.25).powf(-7.0 / 6.0);
        assert!((out[kmin].norm() - expected).abs() <= 1e-12 * expected);
    }

    #[test]
    fn capabilities_differ_by_family() {
        let gen = SpaGenerator;
        let params = TemplateParams::new(1.4, 1.4);
        let options = GeneratorOptions::default();
        assert_eq!(gen.norm_support(Approximant::SpaTmplt), NormSupport::Precomputed);
        assert_eq!(gen.norm_support(Approximant::TaylorF2), NormSupport::Direct);
        assert!(gen
            .end_frequency(&params, Approximant::SpaTmplt, &options)
            .is_some());
        assert!(gen
            .end_frequency(&params, Approximant::TaylorF2, &options)
            .is_none());
        assert!(gen
            .amplitude_norm(&params, Approximant::TaylorF2, &options)
            .is_none());

        let psd = Psd::flat(16, 1.0, 1.0).unwrap();
        assert!(gen
            .filter_norm(Approximant::TaylorF2, &psd, 16, 1.0, 2.0)
            .is_err());
    }

    #[test]
    fn taylorf2_respects_final_frequency() {
        let gen = SpaGenerator;
        let params = TemplateParams::new(1.4, 1.4);
        let options = GeneratorOptions {
            f_final: Some(100.0),
            ..GeneratorOptions::default()
        };
        let mut out = vec![Complex64::new(0.0, 0.0); 1025];
        let info = gen
            .generate(&mut out, &params, Approximant::TaylorF2, &request(&options))
            .unwrap();
        assert!(out[400].norm_sqr() > 0.0);
        assert!(out[401..].iter().all(|c| c.norm_sqr() == 0.0));
        assert!(info.length_in_time.is_none());
    }

    #[test]
    fn rejects_nonphysical_masses() {
        let gen = SpaGenerator;
        let params = TemplateParams::new(-1.0, 1.4);
        let options = GeneratorOptions::default();
        let mut out = vec![Complex64::new(0.0, 0.0); 64];
        let err = gen
            .generate(&mut out, &params, Approximant::SpaTmplt, &request(&options))
            .err()
            .unwrap();
        assert!(matches!(err, GwBankError::InvalidParameters { .. }));
        assert!(gen
            .end_frequency(&params, Approximant::SpaTmplt, &options)
            .is_none());
    }
}
