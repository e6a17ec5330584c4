//! Synthetic input corpus generation and discovery.
//!
//! Inputs are plain-text files whose content is a filler byte repeated
//! `size` times followed by the fixed marker token, so generation is a
//! pure function of the size: same size, same path, same bytes.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::MARKER_TOKEN;
use crate::error::HarnessError;

/// Filler byte repeated `size` times in every generated input.
const FILL_BYTE: u8 = b'a';

/// Arithmetic progression of input sizes, half-open (`start..stop`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRange {
    /// First size.
    pub start: u64,
    /// Exclusive upper bound.
    pub stop: u64,
    /// Increment, > 0.
    pub step: u64,
}

impl SizeRange {
    /// Build a range, rejecting a zero step.
    pub fn new(start: u64, stop: u64, step: u64) -> Result<Self, HarnessError> {
        if step == 0 {
            return Err(HarnessError::Config("size step must be > 0".into()));
        }
        Ok(Self { start, stop, step })
    }

    /// Sizes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + use<> {
        let step = self.step;
        let stop = self.stop;
        std::iter::successors(Some(self.start), move |&s| s.checked_add(step))
            .take_while(move |&s| s < stop)
    }
}

impl Default for SizeRange {
    fn default() -> Self {
        // The progression the original experiments swept.
        Self {
            start: 500,
            stop: 5500,
            step: 500,
        }
    }
}

impl std::str::FromStr for SizeRange {
    type Err = HarnessError;

    /// Parse `START:STOP:STEP`, e.g. `500:5500:500`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split(':');
        let (Some(start), Some(stop), Some(step), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(HarnessError::parse("size range", s));
        };
        let parse = |field: &str| {
            field
                .trim()
                .parse::<u64>()
                .map_err(|_| HarnessError::parse("size range", s))
        };
        Self::new(parse(start)?, parse(stop)?, parse(step)?)
    }
}

/// File name for an input of `size` filler bytes.
fn input_file_name(size: u64) -> String {
    format!("input_case_{size}.txt")
}

/// Write the input file for `size` into `dir`, overwriting any previous
/// content. Returns the file path.
pub fn generate(dir: &Path, size: u64) -> Result<PathBuf, HarnessError> {
    let path = dir.join(input_file_name(size));
    let mut content = vec![FILL_BYTE; usize::try_from(size).expect("size fits usize")];
    content.extend_from_slice(MARKER_TOKEN.as_bytes());
    fs::write(&path, &content).map_err(|e| HarnessError::io(&path, e))?;
    Ok(path)
}

/// Generate one input per size of the progression, in ascending order.
pub fn generate_range(dir: &Path, range: SizeRange) -> Result<Vec<(u64, PathBuf)>, HarnessError> {
    range
        .iter()
        .map(|size| generate(dir, size).map(|path| (size, path)))
        .collect()
}

/// Parse the size encoded in an input file name:
/// `input_case_1000.txt` -> 1000.
fn parse_size(name: &str) -> Result<u64, HarnessError> {
    let field = name
        .split('_')
        .nth(2)
        .ok_or_else(|| HarnessError::parse("input file name", name))?;
    let digits = field.split('.').next().unwrap_or(field);
    digits
        .parse()
        .map_err(|_| HarnessError::parse("input file name", name))
}

/// List an existing inputs directory, returning `(size, path)` pairs
/// sorted by parsed size. Directory iteration order is never trusted.
/// Non-conforming names are skipped with a warning.
pub fn discover(dir: &Path) -> Result<Vec<(u64, PathBuf)>, HarnessError> {
    let entries = fs::read_dir(dir).map_err(|e| HarnessError::io(dir, e))?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| HarnessError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        match parse_size(&name) {
            Ok(size) => found.push((size, path)),
            Err(err) => warn!("skipping input {name}: {err}"),
        }
    }

    found.sort_by_key(|&(size, _)| size);
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_range_parsing() {
        let range: SizeRange = "500:5500:500".parse().unwrap();
        assert_eq!(range, SizeRange::new(500, 5500, 500).unwrap());
        assert!("500:5500".parse::<SizeRange>().is_err());
        assert!("a:b:c".parse::<SizeRange>().is_err());
        assert!("500:5500:0".parse::<SizeRange>().is_err());
    }

    #[test]
    fn size_range_iteration_is_half_open() {
        let range = SizeRange::new(500, 2000, 500).unwrap();
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![500, 1000, 1500]);
    }

    #[test]
    fn generated_content_is_fill_plus_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = generate(dir.path(), 8).unwrap();
        let content = fs::read(&path).unwrap();
        assert_eq!(content, b"aaaaaaaasong");
    }

    #[test]
    fn generation_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let first = generate(dir.path(), 100).unwrap();
        let bytes_first = fs::read(&first).unwrap();
        let second = generate(dir.path(), 100).unwrap();
        let bytes_second = fs::read(&second).unwrap();
        assert_eq!(first, second);
        assert_eq!(bytes_first, bytes_second);
    }

    #[test]
    fn lengths_differ_by_size_delta() {
        let dir = tempfile::tempdir().unwrap();
        let a = fs::read(generate(dir.path(), 500).unwrap()).unwrap();
        let b = fs::read(generate(dir.path(), 1300).unwrap()).unwrap();
        assert_eq!(b.len() - a.len(), 800);
        assert!(a.ends_with(MARKER_TOKEN.as_bytes()));
        assert!(b.ends_with(MARKER_TOKEN.as_bytes()));
    }

    #[test]
    fn parse_size_handles_the_naming_convention() {
        assert_eq!(parse_size("input_case_1000.txt").unwrap(), 1000);
        assert!(parse_size("notes.txt").is_err());
        assert!(parse_size("input_case_abc.txt").is_err());
    }

    #[test]
    fn discover_sorts_by_size_and_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        for size in [1500, 500, 1000] {
            generate(dir.path(), size).unwrap();
        }
        fs::write(dir.path().join("README"), "not an input").unwrap();

        let found = discover(dir.path()).unwrap();
        let sizes: Vec<u64> = found.iter().map(|&(s, _)| s).collect();
        assert_eq!(sizes, vec![500, 1000, 1500]);
    }
}
