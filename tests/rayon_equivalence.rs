#![cfg(feature = "rayon")]

use gwbank::{
    Approximant, FilterBank, FilterBankConfig, Psd, SpaGenerator, TemplateParams, TemplateTable,
};

fn table() -> TemplateTable {
    let rows = (0..24)
        .map(|i| TemplateParams::new(1.0 + i as f64 * 0.75, 1.0 + (i % 5) as f64))
        .collect();
    TemplateTable::from_rows(rows)
}

#[test]
fn parallel_matches_sequential() {
    for approximant in Approximant::ALL {
        let cfg = FilterBankConfig::new(approximant, 1025, 0.25, 30.0);
        let psd = Psd::flat(1025, 0.25, 1.0).unwrap();
        let bank: FilterBank<_> =
            FilterBank::from_table(table(), cfg, SpaGenerator, Some(psd)).unwrap();

        let parallel = bank.par_get_all().unwrap();
        assert_eq!(parallel.len(), bank.len());
        for (index, par) in parallel.iter().enumerate() {
            let seq = bank.get(index).unwrap();
            assert_eq!(par.data(), seq.data());
            assert_eq!(par.sigma_squared(), seq.sigma_squared());
            assert_eq!(par.end_idx(), seq.end_idx());
            assert_eq!(par.params(), seq.params());
        }
    }
}
