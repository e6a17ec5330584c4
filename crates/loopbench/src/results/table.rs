//! Append-only CSV result tables.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::HarnessError;

/// Header of wall-clock tables.
pub const RUNTIME_HEADER: &str = "inputs,time";
/// Header of metric tables.
pub const METRIC_HEADER: &str = "rms,cost";

/// Decimal places used for wall-clock seconds in persisted rows.
pub const TIME_PRECISION: usize = 5;

/// An ordered, uniform-schema result table persisted as CSV.
///
/// The header is written exactly once, before any row, and always
/// matches the schema of every row that follows: rows enter through
/// typed writers, so a mismatched row cannot be constructed. Each
/// appended row is fully materialized in memory and then written with a
/// single write call followed by a flush, so interrupting the process
/// between appends leaves a file holding the header plus only whole
/// rows.
///
/// Rows are also retained in memory for [`ResultTable::flush_to`],
/// which rewrites a whole table elsewhere. That is fine for
/// experiment-sized tables (tens to low thousands of rows); true
/// streaming would be needed beyond that.
pub struct ResultTable {
    path: PathBuf,
    file: File,
    header: &'static str,
    rows: Vec<String>,
}

impl ResultTable {
    /// Create (or truncate) the table at `path` and persist the header.
    pub fn create(path: &Path, header: &'static str) -> Result<Self, HarnessError> {
        let mut file = File::create(path).map_err(|e| HarnessError::io(path, e))?;
        file.write_all(header.as_bytes())
            .and_then(|()| file.write_all(b"\n"))
            .and_then(|()| file.flush())
            .map_err(|e| HarnessError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            header,
            rows: Vec::new(),
        })
    }

    /// Persist one fully-built row: single write, then flush.
    fn append_row(&mut self, row: String) -> Result<(), HarnessError> {
        let mut line = row;
        line.push('\n');
        self.file
            .write_all(line.as_bytes())
            .and_then(|()| self.file.flush())
            .map_err(|e| HarnessError::io(&self.path, e))?;
        line.pop();
        self.rows.push(line);
        Ok(())
    }

    /// Append one wall-clock observation row (`inputs,time` schema).
    pub fn push_run(&mut self, input_size: u64, wall_seconds: f64) -> Result<(), HarnessError> {
        self.append_row(format!(
            "{input_size},{wall_seconds:.prec$}",
            prec = TIME_PRECISION
        ))
    }

    /// Append one already-validated metric row (`rms,cost` schema); the
    /// original text is preserved verbatim.
    pub fn push_metric_line(&mut self, line: &str) -> Result<(), HarnessError> {
        self.append_row(line.trim().to_string())
    }

    /// Rows appended so far, in insertion order.
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no data rows yet.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Path the table persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the whole table at `path` from the in-memory rows.
    pub fn flush_to(&self, path: &Path) -> Result<(), HarnessError> {
        let mut out = String::with_capacity(self.header.len() + 1 + self.rows.len() * 16);
        out.push_str(self.header);
        out.push('\n');
        for row in &self.rows {
            out.push_str(row);
            out.push('\n');
        }
        fs::write(path, out).map_err(|e| HarnessError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_written_once_before_any_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.csv");
        let table = ResultTable::create(&path, RUNTIME_HEADER).unwrap();
        assert!(table.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "inputs,time\n");
    }

    #[test]
    fn rows_are_persisted_as_they_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.csv");
        let mut table = ResultTable::create(&path, RUNTIME_HEADER).unwrap();

        table.push_run(500, 0.123456).unwrap();
        // Visible on disk immediately: a crash here loses nothing.
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "inputs,time\n500,0.12346\n"
        );

        table.push_run(1000, 2.0).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "inputs,time\n500,0.12346\n1000,2.00000\n"
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.csv");
        let mut table = ResultTable::create(&path, RUNTIME_HEADER).unwrap();
        for size in [1500, 500, 1000] {
            table.push_run(size, 0.0).unwrap();
        }
        let sizes: Vec<&str> = table
            .rows()
            .iter()
            .map(|r| r.split(',').next().unwrap())
            .collect();
        assert_eq!(sizes, vec!["1500", "500", "1000"]);
    }

    #[test]
    fn flush_to_rewrites_the_whole_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mem.csv");
        let mut table = ResultTable::create(&path, METRIC_HEADER).unwrap();
        table.push_metric_line("10,1").unwrap();
        table.push_metric_line("20,2").unwrap();

        let copy = dir.path().join("copy.csv");
        table.flush_to(&copy).unwrap();
        assert_eq!(
            fs::read_to_string(&copy).unwrap(),
            "rms,cost\n10,1\n20,2\n"
        );
    }
}
