//! Template parameter tables.
//!
//! A table is an ordered, index-stable list of single-inspiral parameter rows
//! read from a JSON document of the form `{"sngl_inspiral": [row, ...]}`.
//! Banks are often built speculatively, so the bank-facing loader never fails:
//! [`TemplateTable::load_or_empty`] reports a parse failure as
//! [`TableLoad::Fallback`] carrying an empty table instead of an error.
//!
//! Rows are immutable except for `template_duration`, which a bank fills in
//! the first time a generator reports the waveform length. The cell is atomic
//! so that banks can hand out filters from `&self` and be shared across
//! threads.

use crate::trace::{trace_event, trace_warn};
use crate::util::{GwBankError, GwBankResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

const UNSET_BITS: u64 = u64::MAX;

/// Write-once-per-value cache of a template's duration in seconds.
pub struct TemplateDuration(AtomicU64);

impl TemplateDuration {
    /// Creates a cell holding `value`.
    pub fn new(value: Option<f64>) -> Self {
        Self(AtomicU64::new(value.map_or(UNSET_BITS, f64::to_bits)))
    }

    /// Returns the cached duration, if any.
    pub fn get(&self) -> Option<f64> {
        let bits = self.0.load(Ordering::Relaxed);
        (bits != UNSET_BITS).then(|| f64::from_bits(bits))
    }

    /// Stores a duration, replacing any previous value.
    pub fn set(&self, seconds: f64) {
        self.0.store(seconds.to_bits(), Ordering::Relaxed);
    }
}

impl Default for TemplateDuration {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Clone for TemplateDuration {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

impl PartialEq for TemplateDuration {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl fmt::Debug for TemplateDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.get().fmt(f)
    }
}

impl Serialize for TemplateDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.get().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TemplateDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<f64>::deserialize(deserializer).map(Self::new)
    }
}

/// Physical parameters of one template.
///
/// Masses are in solar masses, frequencies in Hz and times in seconds.
/// Columns that are not modelled explicitly are preserved in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateParams {
    pub mass1: f64,
    pub mass2: f64,
    #[serde(default)]
    pub spin1x: f64,
    #[serde(default)]
    pub spin1y: f64,
    #[serde(default)]
    pub spin1z: f64,
    #[serde(default)]
    pub spin2x: f64,
    #[serde(default)]
    pub spin2y: f64,
    #[serde(default)]
    pub spin2z: f64,
    /// Coalescence phase in radians.
    #[serde(default)]
    pub coa_phase: f64,
    /// Termination frequency recorded by the bank generator, zero if unset.
    #[serde(default)]
    pub f_final: f64,
    #[serde(default)]
    pub mchirp: f64,
    #[serde(default)]
    pub eta: f64,
    #[serde(default)]
    pub tau0: f64,
    #[serde(default)]
    pub tau3: f64,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    template_duration: TemplateDuration,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TemplateParams {
    /// Creates a row with the given component masses and no other columns.
    pub fn new(mass1: f64, mass2: f64) -> Self {
        Self {
            mass1,
            mass2,
            ..Self::default()
        }
    }

    /// Total mass in solar masses.
    pub fn total_mass(&self) -> f64 {
        self.mass1 + self.mass2
    }

    /// Symmetric mass ratio `m1 m2 / M²`.
    pub fn symmetric_mass_ratio(&self) -> f64 {
        let total = self.total_mass();
        self.mass1 * self.mass2 / (total * total)
    }

    /// Chirp mass `M η^(3/5)` in solar masses.
    pub fn chirp_mass(&self) -> f64 {
        self.total_mass() * self.symmetric_mass_ratio().powf(0.6)
    }

    /// Returns the cached waveform duration in seconds.
    pub fn template_duration(&self) -> Option<f64> {
        self.template_duration.get()
    }

    /// Caches the waveform duration in seconds.
    ///
    /// Takes `&self`; repeated calls with the same value are harmless.
    pub fn set_template_duration(&self, seconds: f64) {
        self.template_duration.set(seconds);
    }
}

#[derive(Deserialize)]
struct TableDocument {
    sngl_inspiral: Vec<TemplateParams>,
}

/// Ordered, index-stable sequence of template rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TemplateTable {
    rows: Vec<TemplateParams>,
}

/// Outcome of a load that never fails.
#[derive(Debug)]
pub enum TableLoad {
    /// The document parsed; the table holds its rows.
    Parsed(TemplateTable),
    /// The document could not be read or parsed; the table is empty.
    Fallback {
        table: TemplateTable,
        reason: GwBankError,
    },
}

impl TableLoad {
    /// Splits the outcome into the table and a status record.
    pub fn into_parts(self) -> (TemplateTable, LoadStatus) {
        match self {
            TableLoad::Parsed(table) => (table, LoadStatus::Parsed),
            TableLoad::Fallback { table, reason } => (table, LoadStatus::Fallback { reason }),
        }
    }

    /// Returns the table, discarding the status.
    pub fn into_table(self) -> TemplateTable {
        self.into_parts().0
    }

    /// Returns true if the document parsed.
    pub fn is_parsed(&self) -> bool {
        matches!(self, TableLoad::Parsed(_))
    }
}

/// How a bank's table was obtained.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadStatus {
    /// Rows came from the document.
    Parsed,
    /// The document was unusable and the bank is empty.
    Fallback { reason: GwBankError },
}

impl TemplateTable {
    /// Creates a table from rows.
    pub fn from_rows(rows: Vec<TemplateParams>) -> Self {
        Self { rows }
    }

    /// Parses a template document from a JSON string.
    pub fn from_json_str(text: &str) -> GwBankResult<Self> {
        let doc: TableDocument =
            serde_json::from_str(text).map_err(|err| GwBankError::TableParse {
                reason: err.to_string(),
            })?;
        Ok(Self::from_rows(doc.sngl_inspiral))
    }

    /// Reads and parses a template document, returning any failure.
    pub fn load<P: AsRef<Path>>(path: P) -> GwBankResult<Self> {
        let text = fs::read_to_string(path.as_ref()).map_err(|err| GwBankError::TableParse {
            reason: format!("{}: {err}", path.as_ref().display()),
        })?;
        Self::from_json_str(&text)
    }

    /// Reads a template document, degrading to an empty table on failure.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> TableLoad {
        match Self::load(path) {
            Ok(table) => {
                trace_event!("template_table_loaded", rows = table.len());
                TableLoad::Parsed(table)
            }
            Err(reason) => {
                trace_warn!("template_table_fallback", reason = reason.to_string().as_str());
                TableLoad::Fallback {
                    table: Self::default(),
                    reason,
                }
            }
        }
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns row `index`, if present.
    pub fn get(&self, index: usize) -> Option<&TemplateParams> {
        self.rows.get(index)
    }

    /// Returns row `index` or an out-of-bounds error.
    pub fn row(&self, index: usize) -> GwBankResult<&TemplateParams> {
        self.rows.get(index).ok_or(GwBankError::IndexOutOfBounds {
            index,
            len: self.rows.len(),
            context: "template",
        })
    }

    /// Iterates over rows in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, TemplateParams> {
        self.rows.iter()
    }

    /// Returns all rows.
    pub fn rows(&self) -> &[TemplateParams] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::{TableLoad, TemplateParams, TemplateTable};
    use crate::util::GwBankError;

    #[test]
    fn parses_rows_and_keeps_unknown_columns() {
        let text = r#"{"sngl_inspiral": [
            {"mass1": 1.4, "mass2": 1.3, "spin1z": 0.1, "ifo": "H1"},
            {"mass1": 10, "mass2": 5, "template_duration": 2.5}
        ]}"#;
        let table = TemplateTable::from_json_str(text).unwrap();
        assert_eq!(table.len(), 2);

        let first = table.get(0).unwrap();
        assert_eq!(first.mass1, 1.4);
        assert_eq!(first.spin1z, 0.1);
        assert_eq!(first.template_duration(), None);
        assert_eq!(first.extra.get("ifo").and_then(|v| v.as_str()), Some("H1"));

        let second = table.get(1).unwrap();
        assert_eq!(second.mass1, 10.0);
        assert_eq!(second.template_duration(), Some(2.5));
        assert!(table.get(2).is_none());
    }

    #[test]
    fn wrong_schema_is_a_parse_error() {
        let err = TemplateTable::from_json_str(r#"{"process": []}"#)
            .err()
            .unwrap();
        assert!(matches!(err, GwBankError::TableParse { .. }));

        let err = TemplateTable::from_json_str(r#"{"sngl_inspiral": [{"mass2": 1.0}]}"#)
            .err()
            .unwrap();
        assert!(matches!(err, GwBankError::TableParse { .. }));
    }

    #[test]
    fn missing_file_falls_back_to_empty() {
        let load = TemplateTable::load_or_empty("/nonexistent/gwbank/bank.json");
        assert!(!load.is_parsed());
        let table = load.into_table();
        assert!(table.is_empty());
    }

    #[test]
    fn row_reports_out_of_bounds() {
        let table = TemplateTable::from_rows(vec![TemplateParams::new(1.0, 1.0)]);
        let err = table.row(3).err().unwrap();
        assert_eq!(
            err,
            GwBankError::IndexOutOfBounds {
                index: 3,
                len: 1,
                context: "template",
            }
        );
        assert_eq!(TableLoad::Parsed(table).into_table().len(), 1);
    }

    #[test]
    fn duration_cell_is_writable_through_shared_reference() {
        let row = TemplateParams::new(1.4, 1.4);
        assert_eq!(row.template_duration(), None);
        row.set_template_duration(12.5);
        row.set_template_duration(12.5);
        assert_eq!(row.template_duration(), Some(12.5));
        assert_eq!(row.clone().template_duration(), Some(12.5));
    }

    #[test]
    fn mass_combinations() {
        let row = TemplateParams::new(3.0, 1.0);
        assert_eq!(row.total_mass(), 4.0);
        assert!((row.symmetric_mass_ratio() - 0.1875).abs() < 1e-12);
        let expected = 4.0 * 0.1875f64.powf(0.6);
        assert!((row.chirp_mass() - expected).abs() < 1e-12);
    }
}
