//! Case records and the sinks that render them.

use std::io::Write;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::config::RunConfig;
use crate::error::CheckFailure;
use crate::HarnessResult;

/// How a case ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Declared-invalid dimensions, rejected by the device.
    InvalidSize,
    /// Logically empty problem.
    QuickReturn,
    /// Query-only run.
    MemoryQuery {
        /// Scratch bytes the routine asked for
        bytes: usize,
    },
    /// Correctness and/or performance were measured.
    Measured {
        /// Discrepancy, when computed
        error: Option<f64>,
        /// Mean host time in microseconds, when measured
        cpu_time_us: Option<f64>,
        /// Mean device time in microseconds, when measured
        gpu_time_us: Option<f64>,
    },
}

/// Everything reported about one case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseRecord {
    /// Routine name
    pub routine: String,
    /// Precision character
    pub precision: char,
    /// Case parameters in report order
    #[serde(serialize_with = "ordered_map")]
    pub arguments: Vec<(String, String)>,
    /// How the case ended
    pub outcome: Outcome,
    /// Non-fatal failures
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<CheckFailure>,
}

fn ordered_map<S: Serializer>(pairs: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(pairs.len()))?;
    for (key, value) in pairs {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

impl CaseRecord {
    /// Record with no outcome measured yet.
    pub fn new(routine: &str, precision: char, arguments: Vec<(&'static str, String)>) -> Self {
        Self {
            routine: routine.to_string(),
            precision,
            arguments: arguments
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            outcome: Outcome::Measured {
                error: None,
                cpu_time_us: None,
                gpu_time_us: None,
            },
            failures: Vec::new(),
        }
    }

    /// True when no check failed.
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Discrepancy, when one was computed.
    pub fn error(&self) -> Option<f64> {
        match self.outcome {
            Outcome::Measured { error, .. } => error,
            _ => None,
        }
    }
}

/// Receives case records.
pub trait Reporter {
    /// Render or store one record.
    fn report(&mut self, record: &CaseRecord, config: &RunConfig) -> HarnessResult<()>;
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, record: &CaseRecord, config: &RunConfig) -> HarnessResult<()> {
        (**self).report(record, config)
    }
}

/// Absent values are shown as `n/a`.
fn render(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v}"))
}

const RULE: &str = "============================================";

/// Human-readable bench output.
///
/// A full run prints an `Arguments:` block and a `Results:` block. In
/// performance-only mode a single line holds the device time (and the error,
/// when it was computed).
pub struct BenchTable<W: Write> {
    out: W,
}

impl<W: Write> BenchTable<W> {
    /// Table writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn header(&mut self, title: &str) -> std::io::Result<()> {
        writeln!(self.out, "\n{RULE}\n{title}\n{RULE}")
    }

    fn row<S: AsRef<str>>(&mut self, cells: &[S]) -> std::io::Result<()> {
        let line: String = cells
            .iter()
            .map(|cell| format!("{:<15}", cell.as_ref()))
            .collect();
        writeln!(self.out, "{}", line.trim_end())
    }
}

impl<W: Write> Reporter for BenchTable<W> {
    fn report(&mut self, record: &CaseRecord, config: &RunConfig) -> HarnessResult<()> {
        match &record.outcome {
            Outcome::InvalidSize => writeln!(self.out, "Invalid value in size computation")?,
            Outcome::QuickReturn => writeln!(self.out, "Quick return")?,
            Outcome::MemoryQuery { bytes } => {
                writeln!(self.out, "Memory size query: {bytes} bytes")?
            }
            Outcome::Measured {
                error,
                cpu_time_us,
                gpu_time_us,
            } => {
                if config.perf {
                    let mut cells = vec![render(*gpu_time_us)];
                    if config.norm_check {
                        cells.push(render(*error));
                    }
                    self.row(&cells)?;
                } else {
                    self.header("Arguments:")?;
                    let (keys, values): (Vec<&str>, Vec<&str>) = record
                        .arguments
                        .iter()
                        .map(|(k, v)| (k.as_str(), v.as_str()))
                        .unzip();
                    self.row(&keys)?;
                    self.row(&values)?;

                    self.header("Results:")?;
                    let mut keys = vec!["cpu_time_us", "gpu_time_us"];
                    let mut values = vec![render(*cpu_time_us), render(*gpu_time_us)];
                    if config.norm_check {
                        keys.push("error");
                        values.push(render(*error));
                    }
                    self.row(&keys)?;
                    self.row(&values)?;
                    writeln!(self.out)?;
                }
            }
        }
        for failure in &record.failures {
            writeln!(self.out, "FAILED: {failure}")?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// One JSON object per record, newline separated.
pub struct JsonLinesReporter<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesReporter<W> {
    /// Reporter writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for JsonLinesReporter<W> {
    fn report(&mut self, record: &CaseRecord, _config: &RunConfig) -> HarnessResult<()> {
        serde_json::to_writer(&mut self.out, record)?;
        writeln!(self.out)?;
        Ok(())
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct Collector {
    records: Vec<CaseRecord>,
}

impl Collector {
    /// Empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records received so far.
    pub fn records(&self) -> &[CaseRecord] {
        &self.records
    }

    /// Number of records with a failure.
    pub fn failed(&self) -> usize {
        self.records.iter().filter(|r| !r.passed()).count()
    }
}

impl Reporter for Collector {
    fn report(&mut self, record: &CaseRecord, _config: &RunConfig) -> HarnessResult<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measured() -> CaseRecord {
        let mut record = CaseRecord::new("larfg", 'd', vec![("n", "2".into()), ("inc", "1".into())]);
        record.outcome = Outcome::Measured {
            error: Some(0.5),
            cpu_time_us: None,
            gpu_time_us: Some(12.0),
        };
        record
    }

    #[test]
    fn test_bench_table_blocks() {
        let mut table = BenchTable::new(Vec::new());
        table.report(&measured(), &RunConfig::bench()).unwrap();
        let text = String::from_utf8(table.into_inner()).unwrap();

        assert!(text.contains("Arguments:"));
        assert!(text.contains("Results:"));
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.contains(&"n              inc"));
        assert!(lines.contains(&"cpu_time_us    gpu_time_us    error"));
        assert!(lines.contains(&"n/a            12             0.5"));
    }

    #[test]
    fn test_bench_table_perf_line() {
        let mut table = BenchTable::new(Vec::new());
        table
            .report(&measured(), &RunConfig::bench().with_perf(true))
            .unwrap();
        let text = String::from_utf8(table.into_inner()).unwrap();
        assert_eq!(text, "12             0.5\n");
    }

    #[test]
    fn test_json_lines() {
        let mut reporter = JsonLinesReporter::new(Vec::new());
        let mut record = CaseRecord::new("lacgv", 'c', vec![("n", "0".into())]);
        record.outcome = Outcome::QuickReturn;
        reporter.report(&record, &RunConfig::default()).unwrap();
        reporter.report(&measured(), &RunConfig::default()).unwrap();

        let text = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines[0]["outcome"]["status"], "quick_return");
        assert_eq!(lines[0]["arguments"]["n"], "0");
        assert_eq!(lines[1]["outcome"]["cpu_time_us"], serde_json::Value::Null);
        assert_eq!(lines[1]["outcome"]["error"], 0.5);
    }

    #[test]
    fn test_collector_counts_failures() {
        let mut collector = Collector::new();
        let mut failing = measured();
        failing.failures.push(CheckFailure::ToleranceExceeded {
            error: 0.5,
            tolerance: 1e-15,
        });
        collector.report(&measured(), &RunConfig::default()).unwrap();
        collector.report(&failing, &RunConfig::default()).unwrap();

        assert_eq!(collector.records().len(), 2);
        assert_eq!(collector.failed(), 1);
    }
}
