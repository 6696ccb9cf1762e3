//! Side-by-side reporting for one or more evaluated runs.

use crate::metrics::{EvalResult, METRIC_NAMES};
use ragbench_core::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Render runs as an aligned plain-text comparison table.
pub fn format_comparison_table(rows: &[(String, EvalResult)]) -> String {
    let name_width = rows
        .iter()
        .map(|(name, _)| name.len())
        .chain(std::iter::once("Run".len()))
        .max()
        .unwrap_or(3);

    let mut out = String::new();
    out.push_str(&format!("{:<name_width$}", "Run"));
    for metric in METRIC_NAMES {
        out.push_str(&format!("  {metric:>10}"));
    }
    out.push('\n');

    for (name, result) in rows {
        out.push_str(&format!("{name:<name_width$}"));
        for metric in METRIC_NAMES {
            let value = result.metrics.get(metric).copied().unwrap_or(0.0);
            out.push_str(&format!("  {value:>10.4}"));
        }
        out.push('\n');
    }
    out
}

/// Write runs as CSV, one row per run.
pub fn write_csv(path: &Path, rows: &[(String, EvalResult)]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "run,{}", METRIC_NAMES.join(","))?;
    for (name, result) in rows {
        write!(writer, "{name}")?;
        for metric in METRIC_NAMES {
            let value = result.metrics.get(metric).copied().unwrap_or(0.0);
            write!(writer, ",{value:.4}")?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::fs;

    fn result(value: f64) -> EvalResult {
        EvalResult {
            metrics: METRIC_NAMES
                .iter()
                .map(|name| (name.to_string(), value))
                .collect::<BTreeMap<String, f64>>(),
            num_queries: 7,
        }
    }

    #[test]
    fn test_table_has_header_and_one_row_per_run() {
        let rows = vec![
            ("local.bm25".to_string(), result(0.5)),
            ("local.hybrid".to_string(), result(0.75)),
        ];
        let table = format_comparison_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Run"));
        assert!(lines[0].contains("nDCG@10"));
        assert!(lines[1].starts_with("local.bm25"));
        assert!(lines[2].contains("0.7500"));
    }

    #[test]
    fn test_csv_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        write_csv(&path, &[("local.bm25".to_string(), result(0.5))]).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "run,nDCG@10,Recall@10,Recall@100,MRR@10,MAP\n\
             local.bm25,0.5000,0.5000,0.5000,0.5000,0.5000\n"
        );
    }
}
