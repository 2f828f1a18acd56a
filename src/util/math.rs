//! Numerical constants and small helpers shared by the bank and generators.

/// Dynamic-range rescaling factor applied to strain amplitudes.
///
/// Waveforms are generated at a distance of `1 / DYN_RANGE_FAC` so that filter
/// values stay well inside the representable range of single precision.
pub const DYN_RANGE_FAC: f64 = 5.902_958_103_587_056_5e20;

/// Geometrized solar mass in seconds (G M_sun / c^3).
pub(crate) const MTSUN_SI: f64 = 4.925_491_025_543_576e-6;

/// Geometrized solar mass in meters (G M_sun / c^2).
pub(crate) const MRSUN_SI: f64 = 1.476_625_061_404_649_4e3;

/// One parsec in meters.
pub(crate) const PC_SI: f64 = 3.085_677_581_491_367e16;

/// Returns the bin index `floor(freq / delta_f)`, saturating at zero.
///
/// A frequency that is a whole multiple of `delta_f` up to rounding error maps
/// to that multiple rather than the bin below it.
pub(crate) fn bin_index(freq: f64, delta_f: f64) -> usize {
    let idx = (freq / delta_f + 1e-9).floor();
    if idx.is_finite() && idx > 0.0 {
        idx as usize
    } else {
        0
    }
}

/// Returns true if `a` and `b` agree to the given relative tolerance.
pub(crate) fn rel_close(a: f64, b: f64, rel_tol: f64) -> bool {
    let scale = a.abs().max(b.abs());
    (a - b).abs() <= rel_tol * scale
}

#[cfg(test)]
mod tests {
    use super::{bin_index, rel_close};

    #[test]
    fn bin_index_floors_and_saturates() {
        assert_eq!(bin_index(30.0, 0.25), 120);
        assert_eq!(bin_index(30.1, 0.25), 120);
        assert_eq!(bin_index(-1.0, 0.25), 0);
        assert_eq!(bin_index(f64::NAN, 0.25), 0);
        assert_eq!(bin_index(1023.0 * 0.1, 0.1), 1023);
    }

    #[test]
    fn rel_close_scales_with_magnitude() {
        assert!(rel_close(1.0e20, 1.0e20 + 1.0e8, 1e-9));
        assert!(!rel_close(1.0, 1.001, 1e-9));
        assert!(rel_close(0.0, 0.0, 1e-9));
    }
}
