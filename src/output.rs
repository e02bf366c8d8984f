//! Submission file output

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Writer for the whitespace-delimited submission file: one row per image,
/// one column per class, rows in dataset order.
pub struct SubmissionWriter {
    path: PathBuf,
}

impl SubmissionWriter {
    /// Create a writer targeting `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Target path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write all score rows, creating the parent directory if needed
    pub fn write(&self, rows: &[Vec<f64>]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let file = File::create(&self.path)
            .with_context(|| format!("failed to create {}", self.path.display()))?;
        let mut out = BufWriter::new(file);

        for row in rows {
            for (column, value) in row.iter().enumerate() {
                if column > 0 {
                    write!(out, " ")?;
                }
                write!(out, "{:.18e}", value)?;
            }
            writeln!(out)?;
        }
        out.flush()?;

        info!(
            rows = rows.len(),
            path = %self.path.display(),
            "Predictions written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tta-{}-{}.txt", name, std::process::id()))
    }

    #[test]
    fn test_rows_round_trip() {
        let path = temp_path("round-trip");
        let rows = vec![vec![-0.5, -1.25, -2.0], vec![-3.75, -0.001, -10.0]];

        SubmissionWriter::new(&path).write(&rows).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).unwrap();

        let parsed: Vec<Vec<f64>> = text
            .lines()
            .map(|line| {
                line.split_whitespace()
                    .map(|v| v.parse().unwrap())
                    .collect()
            })
            .collect();

        assert_eq!(parsed.len(), 2);
        for (row, expected) in parsed.iter().zip(&rows) {
            assert_eq!(row.len(), expected.len());
            for (a, b) in row.iter().zip(expected) {
                assert!((a - b).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn test_missing_parent_directory_is_created() {
        let dir = std::env::temp_dir().join(format!("tta-nested-{}", std::process::id()));
        let path = dir.join("deep").join("submit.txt");

        SubmissionWriter::new(&path).write(&[vec![-1.0]]).unwrap();
        assert!(path.is_file());

        fs::remove_dir_all(&dir).unwrap();
    }
}
