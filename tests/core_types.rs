use gwbank::lowlevel::{band_indices, real_to_frequency};
use gwbank::num_complex::Complex64;
use gwbank::series::fft::frequency_to_real;
use gwbank::{
    sigmasq, Approximant, FilterBank, FilterBankConfig, LoadStatus, Psd, SpaGenerator,
    TemplateParams, TemplateTable,
};
use std::io::Write;

#[test]
fn table_loads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"sngl_inspiral": [{{"mass1": 1.4, "mass2": 1.4}}, {{"mass1": 8.0, "mass2": 1.2}}]}}"#
    )
    .unwrap();
    let table = TemplateTable::load(file.path()).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows()[1], TemplateParams::new(8.0, 1.2));
}

#[test]
fn sigmasq_of_unit_filter_counts_bins() {
    let filter = vec![Complex64::new(1.0, 0.0); 100];
    let psd = Psd::flat(100, 0.5, 1.0).unwrap();
    // Bins 20..100 are inside the band.
    let value = sigmasq(&filter, &psd, 0.5, 10.0, None);
    assert!((value - 4.0 * 0.5 * 80.0).abs() < 1e-9);

    let capped = sigmasq(&filter, &psd, 0.5, 10.0, Some(30.0));
    assert!((capped - 4.0 * 0.5 * 40.0).abs() < 1e-9);
    assert_eq!(band_indices(100, 0.5, 10.0, Some(1e6)), (20, 100));
}

#[test]
fn sigmasq_uses_the_shorter_length() {
    let filter = vec![Complex64::new(0.0, 2.0); 64];
    let psd = Psd::flat(32, 1.0, 2.0).unwrap();
    let value = sigmasq(&filter, &psd, 1.0, 0.0, None);
    assert!((value - 4.0 * 32.0 * 2.0).abs() < 1e-9);
}

#[test]
fn fft_helpers_invert_each_other() {
    let samples: Vec<f64> = (0..64).map(|i| (i as f64 * 0.3).sin()).collect();
    let bins = real_to_frequency(&samples, 256.0);
    assert_eq!(bins.len(), 33);
    let back = frequency_to_real(&bins, 64, 256.0);
    for (a, b) in samples.iter().zip(back.iter()) {
        assert!((a - b).abs() < 1e-9);
    }
}

#[test]
fn filter_accessors_report_grid_and_sigma() {
    let table = TemplateTable::from_json_str(
        r#"{"sngl_inspiral": [{"mass1": 1.4, "mass2": 1.4, "event_id": "t0"}]}"#,
    )
    .unwrap();
    let cfg = FilterBankConfig::new(Approximant::SpaTmplt, 513, 0.5, 20.0);
    let psd = Psd::flat(513, 0.5, 4.0).unwrap();
    let bank: FilterBank<_> = FilterBank::from_table(table, cfg, SpaGenerator, Some(psd)).unwrap();
    assert_eq!(bank.load_status(), &LoadStatus::Parsed);

    let filter = bank.get(0).unwrap();
    assert_eq!(filter.frequency(40), 20.0);
    assert_eq!(filter.params().event_id.as_deref(), Some("t0"));
    let sigma = filter.sigma().unwrap();
    let sigma_squared = filter.sigma_squared().unwrap();
    assert!((sigma * sigma - sigma_squared).abs() <= 1e-12 * sigma_squared);
}
