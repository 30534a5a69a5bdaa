use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::StringRecord;

/// Header lookup for loosely-specified CSV inputs: columns are found by any
/// of several accepted names, case-insensitively.
#[derive(Debug, Clone)]
pub struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    pub fn from_headers(headers: &StringRecord) -> Self {
        let mut index = HashMap::with_capacity(headers.len());
        for (idx, name) in headers.iter().enumerate() {
            index
                .entry(name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase())
                .or_insert(idx);
        }
        Self { index }
    }

    pub fn position(&self, names: &[&str]) -> Option<usize> {
        names
            .iter()
            .find_map(|name| self.index.get(&name.to_ascii_lowercase()).copied())
    }

    pub fn has(&self, names: &[&str]) -> bool {
        self.position(names).is_some()
    }

    pub fn get<'r>(&self, record: &'r StringRecord, names: &[&str]) -> Option<&'r str> {
        let idx = self.position(names)?;
        let raw = record.get(idx)?.trim();
        if raw.is_empty() { None } else { Some(raw) }
    }

    pub fn get_f64(&self, record: &StringRecord, names: &[&str]) -> Option<f64> {
        self.get(record, names)?.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Counts are stored as floats by some exporters ("3.0").
    pub fn get_u32(&self, record: &StringRecord, names: &[&str]) -> Option<u32> {
        let v = self.get_f64(record, names)?;
        if v < 0.0 || v.fract() != 0.0 || v > u32::MAX as f64 {
            return None;
        }
        Some(v as u32)
    }
}

pub fn csv_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let path = entry
            .with_context(|| format!("read dir entry in {}", dir.display()))?
            .path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

pub fn open_reader(path: &Path) -> Result<csv::Reader<fs::File>> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open csv {}", path.display()))
}
