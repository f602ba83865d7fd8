//! Per-trial records, the results CSV and run aggregates.

use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{Error, Result};

pub const CSV_HEADER: &str = "\"Iteration\",\"Encrypted time (ms)\",\"Unencrypted time (ms)\",\"Encrypted distance (km)\",\"Unencrypted distance (km)\",\"Karney distance ref (km)\"";

/// Outcome of one recorded trial.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub iteration: usize,
    pub encrypted_time_ms: f64,
    pub plaintext_time_ms: f64,
    pub encrypted_distance_km: f64,
    pub plaintext_distance_km: f64,
    pub reference_distance_km: f64,
}

impl TrialRecord {
    fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{:.5},{:.5},{:.5}",
            self.iteration,
            self.encrypted_time_ms,
            self.plaintext_time_ms,
            self.encrypted_distance_km,
            self.plaintext_distance_km,
            self.reference_distance_km
        )
    }

    fn from_csv_row(line: &str, line_no: usize) -> Result<Self> {
        let parse_err = |reason: String| Error::Parse {
            line: line_no,
            reason,
        };
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 6 {
            return Err(parse_err(format!("expected 6 fields, found {}", fields.len())));
        }
        let iteration = fields[0]
            .parse()
            .map_err(|e| parse_err(format!("iteration {:?}: {e}", fields[0])))?;
        let mut numbers = [0.0; 5];
        for (slot, field) in numbers.iter_mut().zip(&fields[1..]) {
            *slot = field
                .parse()
                .map_err(|e| parse_err(format!("{field:?}: {e}")))?;
        }
        let [
            encrypted_time_ms,
            plaintext_time_ms,
            encrypted_distance_km,
            plaintext_distance_km,
            reference_distance_km,
        ] = numbers;
        Ok(Self {
            iteration,
            encrypted_time_ms,
            plaintext_time_ms,
            encrypted_distance_km,
            plaintext_distance_km,
            reference_distance_km,
        })
    }
}

/// Receives each record as soon as its trial has completed.
pub trait RecordSink {
    fn record(&mut self, record: &TrialRecord) -> Result<()>;
}

impl RecordSink for Vec<TrialRecord> {
    fn record(&mut self, record: &TrialRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Results CSV, flushed row by row so an aborted run keeps every completed trial.
pub struct ResultsWriter {
    path: PathBuf,
    out: BufWriter<File>,
}

impl ResultsWriter {
    /// Replaces any file already at `path` and writes the header.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            warn!("Replacing existing results file {}", path.display());
            fs::remove_file(path)?;
        }
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "{CSV_HEADER}")?;
        out.flush()?;
        Ok(Self {
            path: path.to_path_buf(),
            out,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for ResultsWriter {
    fn record(&mut self, record: &TrialRecord) -> Result<()> {
        writeln!(self.out, "{}", record.to_csv_row())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Parses a results CSV written by [`ResultsWriter`].
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<TrialRecord>> {
    let mut lines = reader.lines();
    let header = lines.next().transpose()?.unwrap_or_default();
    if header.trim() != CSV_HEADER {
        return Err(Error::Parse {
            line: 1,
            reason: "missing results header".into(),
        });
    }
    let mut records = Vec::new();
    for (idx, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(TrialRecord::from_csv_row(&line, idx + 2)?);
    }
    Ok(records)
}

/// Running aggregates over the recorded trials.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub trials: usize,
    total_encrypted_ms: f64,
    total_plaintext_ms: f64,
    total_abs_error_km: f64,
    max_abs_error_km: f64,
    total_reference_gap_km: f64,
}

impl RunSummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a TrialRecord>) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.push(record);
        }
        summary
    }

    pub fn push(&mut self, record: &TrialRecord) {
        let error = (record.encrypted_distance_km - record.plaintext_distance_km).abs();
        self.trials += 1;
        self.total_encrypted_ms += record.encrypted_time_ms;
        self.total_plaintext_ms += record.plaintext_time_ms;
        self.total_abs_error_km += error;
        self.max_abs_error_km = self.max_abs_error_km.max(error);
        self.total_reference_gap_km +=
            (record.plaintext_distance_km - record.reference_distance_km).abs();
    }

    fn mean(&self, total: f64) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            total / self.trials as f64
        }
    }

    pub fn mean_encrypted_ms(&self) -> f64 {
        self.mean(self.total_encrypted_ms)
    }

    pub fn mean_plaintext_ms(&self) -> f64 {
        self.mean(self.total_plaintext_ms)
    }

    /// Mean |encrypted - plaintext| distance.
    pub fn mean_abs_error_km(&self) -> f64 {
        self.mean(self.total_abs_error_km)
    }

    pub fn max_abs_error_km(&self) -> f64 {
        self.max_abs_error_km
    }

    /// Mean |plaintext chord - ellipsoidal geodesic|.
    pub fn mean_reference_gap_km(&self) -> f64 {
        self.mean(self.total_reference_gap_km)
    }

    fn rows(&self) -> [(&'static str, String); 6] {
        [
            ("Trials", self.trials.to_string()),
            ("Encrypted time (ms, mean)", format!("{:.6}", self.mean_encrypted_ms())),
            ("Unencrypted time (ms, mean)", format!("{:.6}", self.mean_plaintext_ms())),
            ("|Encrypted - unencrypted| (km, mean)", format!("{:.6}", self.mean_abs_error_km())),
            ("|Encrypted - unencrypted| (km, max)", format!("{:.6}", self.max_abs_error_km())),
            ("|Unencrypted - Karney| (km, mean)", format!("{:.6}", self.mean_reference_gap_km())),
        ]
    }
}

/// Renders one column per named summary, aligned like:
///
/// ```text
/// Metric | run.csv
/// -------+--------
/// Trials |     100
/// ```
pub fn format_table(columns: &[(String, RunSummary)]) -> String {
    let label_rows: Vec<[(&str, String); 6]> = columns.iter().map(|(_, s)| s.rows()).collect();
    let labels: Vec<&str> = RunSummary::default().rows().iter().map(|(l, _)| *l).collect();

    let label_w = labels.iter().map(|l| l.len()).chain(["Metric".len()]).max().unwrap_or(0);
    let widths: Vec<usize> = columns
        .iter()
        .zip(&label_rows)
        .map(|((name, _), rows)| {
            rows.iter()
                .map(|(_, v)| v.len())
                .chain([name.len()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut header = format!("{:<label_w$}", "Metric");
    let mut sep = "-".repeat(label_w);
    for ((name, _), w) in columns.iter().zip(&widths) {
        header.push_str(&format!(" | {name:>w$}"));
        sep.push_str(&format!("-+-{}", "-".repeat(*w)));
    }
    let mut lines = vec![header, sep];
    for (i, label) in labels.iter().enumerate() {
        let mut line = format!("{label:<label_w$}");
        for (rows, w) in label_rows.iter().zip(&widths) {
            line.push_str(&format!(" | {:>w$}", rows[i].1));
        }
        lines.push(line);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn record(iteration: usize, encrypted: f64, plain: f64, reference: f64) -> TrialRecord {
        TrialRecord {
            iteration,
            encrypted_time_ms: 12.5,
            plaintext_time_ms: 0.000125,
            encrypted_distance_km: encrypted,
            plaintext_distance_km: plain,
            reference_distance_km: reference,
        }
    }

    #[test]
    fn test_csv_row_format() {
        let row = record(3, 1830.0381234, 1830.038119, 1831.4777377).to_csv_row();
        assert_eq!(row, "3,12.5,0.000125,1830.03812,1830.03812,1831.47774");
    }

    #[test]
    fn test_read_back_rows() {
        let text = format!("{CSV_HEADER}\n1,10,0.001,100.00001,100.00000,101.25000\n\n2,11.5,0.002,7.5,7.5,7.25\n");
        let records = read_records(Cursor::new(text)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].iteration, 1);
        assert_eq!(records[1].encrypted_time_ms, 11.5);
        assert_eq!(records[1].reference_distance_km, 7.25);
    }

    #[test]
    fn test_read_rejects_malformed_input() {
        assert!(matches!(
            read_records(Cursor::new("iteration,time\n")),
            Err(Error::Parse { line: 1, .. })
        ));
        let text = format!("{CSV_HEADER}\n1,10,0.001,100.0,100.0\n");
        assert!(matches!(
            read_records(Cursor::new(text)),
            Err(Error::Parse { line: 2, .. })
        ));
        let text = format!("{CSV_HEADER}\n1,10,fast,100.0,100.0,100.0\n");
        assert!(matches!(
            read_records(Cursor::new(text)),
            Err(Error::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_summary_aggregates() {
        let records = [record(1, 101.0, 100.0, 99.0), record(2, 49.0, 50.0, 53.0)];
        let summary = RunSummary::from_records(&records);
        assert_eq!(summary.trials, 2);
        assert_eq!(summary.mean_encrypted_ms(), 12.5);
        assert_eq!(summary.mean_abs_error_km(), 1.0);
        assert_eq!(summary.max_abs_error_km(), 1.0);
        assert_eq!(summary.mean_reference_gap_km(), 2.0);
        assert_eq!(RunSummary::default().mean_abs_error_km(), 0.0);
    }

    #[test]
    fn test_format_table_aligns_columns() {
        let summary = RunSummary::from_records(&[record(1, 101.0, 100.0, 99.0)]);
        let table = format_table(&[("a.csv".into(), summary.clone()), ("b.csv".into(), summary)]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[0].starts_with("Metric"));
        assert!(lines[0].contains("a.csv |"));
        assert!(lines[0].ends_with("b.csv"));
        let width = lines[0].len();
        assert!(lines.iter().all(|l| l.len() == width), "{table}");
    }
}
