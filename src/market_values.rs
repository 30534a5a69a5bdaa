use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::normalize::normalize_name;
use crate::table::{Columns, csv_files_in, open_reader};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerValueRecord {
    pub season: String,
    pub team: String,
    pub name: String,
    pub market_value: f64,
}

#[derive(Debug, Clone)]
pub struct CatalogueEntry {
    pub season: String,
    pub team_norm: String,
    pub name: String,
    pub name_norm: String,
    pub market_value: f64,
}

/// Read-only value catalogue. Rows keep their load order; every lookup goes
/// through a (season, normalized team) scope first.
#[derive(Debug, Clone, Default)]
pub struct PlayerValueCatalogue {
    entries: Vec<CatalogueEntry>,
    by_scope: HashMap<(String, String), Vec<usize>>,
}

impl PlayerValueCatalogue {
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = PlayerValueRecord>,
    {
        let mut catalogue = Self::default();
        for record in records {
            catalogue.push(record);
        }
        catalogue
    }

    pub fn push(&mut self, record: PlayerValueRecord) {
        let idx = self.entries.len();
        let entry = CatalogueEntry {
            team_norm: normalize_name(&record.team),
            name_norm: normalize_name(&record.name),
            season: record.season,
            name: record.name,
            market_value: record.market_value,
        };
        self.by_scope
            .entry((entry.season.clone(), entry.team_norm.clone()))
            .or_default()
            .push(idx);
        self.entries.push(entry);
    }

    /// Entry indices for one scope, in catalogue order. `team_norm` must
    /// already be normalized.
    pub fn scope(&self, season: &str, team_norm: &str) -> &[usize] {
        self.by_scope
            .get(&(season.to_string(), team_norm.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn entry(&self, idx: usize) -> Option<&CatalogueEntry> {
        self.entries.get(idx)
    }

    pub fn entries(&self) -> &[CatalogueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn seasons(&self) -> Vec<&str> {
        let mut out = self
            .by_scope
            .keys()
            .map(|(season, _)| season.as_str())
            .collect::<Vec<_>>();
        out.sort_unstable();
        out.dedup();
        out
    }
}

pub fn load_catalogue_dir(dir: &Path) -> Result<PlayerValueCatalogue> {
    let files = csv_files_in(dir)?;
    if files.is_empty() {
        return Err(anyhow!("no market value csv files in {}", dir.display()));
    }
    let mut catalogue = PlayerValueCatalogue::default();
    for path in &files {
        let season = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(season_from_file_name);
        for record in read_value_csv(path, season.as_deref())? {
            catalogue.push(record);
        }
    }
    info!(
        files = files.len(),
        players = catalogue.len(),
        seasons = ?catalogue.seasons(),
        "market value catalogue loaded"
    );
    Ok(catalogue)
}

pub fn load_catalogue_file(path: &Path) -> Result<PlayerValueCatalogue> {
    let season = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(season_from_file_name);
    let records = read_value_csv(path, season.as_deref())?;
    Ok(PlayerValueCatalogue::from_records(records))
}

fn read_value_csv(path: &Path, file_season: Option<&str>) -> Result<Vec<PlayerValueRecord>> {
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .with_context(|| format!("read headers {}", path.display()))?
        .clone();
    let cols = Columns::from_headers(&headers);
    if !cols.has(&["name"]) || !cols.has(&["team"]) {
        return Err(anyhow!(
            "{}: expected `name` and `team` columns",
            path.display()
        ));
    }
    if !cols.has(&["season"]) && file_season.is_none() {
        return Err(anyhow!(
            "{}: no `season` column and no season in the file name",
            path.display()
        ));
    }

    let mut out = Vec::new();
    for (row_idx, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("{} row {}", path.display(), row_idx + 1))?;
        let Some(season) = cols
            .get(&row, &["season"])
            .map(str::to_string)
            .or_else(|| file_season.map(str::to_string))
        else {
            warn!(file = %path.display(), row = row_idx + 1, "row without season skipped");
            continue;
        };
        out.push(PlayerValueRecord {
            season,
            team: cols.get(&row, &["team"]).unwrap_or_default().to_string(),
            name: cols.get(&row, &["name"]).unwrap_or_default().to_string(),
            market_value: cols
                .get(&row, &["market_value", "value"])
                .map(parse_market_value)
                .unwrap_or(0.0),
        });
    }
    Ok(out)
}

/// `players_laliga_2022-2023.csv` -> `2022_23`. The season is the third
/// `_`-separated field of the stem, written `YYYY-YYYY`.
pub fn season_from_file_name(file_name: &str) -> Option<String> {
    let stem = file_name
        .strip_suffix(".csv")
        .or_else(|| file_name.strip_suffix(".CSV"))
        .unwrap_or(file_name);
    let field = stem.split('_').nth(2)?;
    let (start, end) = field.split_once('-')?;
    if start.len() != 4 || !start.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if end.len() < 2 || !end.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{start}_{}", &end[end.len() - 2..]))
}

/// Scraped value strings to whole euros: `"€1,50 mill."` -> 1_500_000,
/// `"500 mil €"` -> 500_000. Plain numbers pass through (truncated).
/// Anything without a number is 0.
pub fn parse_market_value(raw: &str) -> f64 {
    if let Ok(v) = raw.trim().parse::<f64>() {
        return if v.is_finite() { v.trunc() } else { 0.0 };
    }

    let s = raw
        .trim()
        .to_lowercase()
        .replace(',', ".")
        .replace("â‚¬", "")
        .replace('€', "")
        .replace("millones", "m")
        .replace("millon", "m")
        .replace("mill.", "m")
        .replace("mill", "m")
        .replace(" mil", "k");

    let number: String = s
        .chars()
        .skip_while(|c| !(c.is_ascii_digit() || *c == '.'))
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if number.is_empty() {
        return 0.0;
    }
    let Ok(mut n) = number.parse::<f64>() else {
        return 0.0;
    };

    if s.contains('m') {
        n *= 1_000_000.0;
    } else if s.contains('k') {
        n *= 1_000.0;
    }
    n.trunc()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(season: &str, team: &str, name: &str, value: f64) -> PlayerValueRecord {
        PlayerValueRecord {
            season: season.into(),
            team: team.into(),
            name: name.into(),
            market_value: value,
        }
    }

    #[test]
    fn parse_market_value_handles_scraped_formats() {
        assert_eq!(parse_market_value("1,50 mill. €"), 1_500_000.0);
        assert_eq!(parse_market_value("€45 millones"), 45_000_000.0);
        assert_eq!(parse_market_value("800 mil €"), 800_000.0);
        assert_eq!(parse_market_value("â‚¬2,5m"), 2_500_000.0);
        assert_eq!(parse_market_value("12500000"), 12_500_000.0);
        assert_eq!(parse_market_value("300000.75"), 300_000.0);
        assert_eq!(parse_market_value("-"), 0.0);
        assert_eq!(parse_market_value(""), 0.0);
        assert_eq!(parse_market_value("1.2.3 mill"), 0.0);
    }

    #[test]
    fn season_from_file_name_formats_short_end_year() {
        assert_eq!(
            season_from_file_name("values_laliga_2022-2023.csv").as_deref(),
            Some("2022_23")
        );
        assert_eq!(
            season_from_file_name("tm_values_1999-2000.csv").as_deref(),
            Some("1999_00")
        );
        assert_eq!(season_from_file_name("values.csv"), None);
        assert_eq!(season_from_file_name("a_b_22-23.csv"), None);
    }

    #[test]
    fn scope_is_keyed_by_season_and_normalized_team() {
        let cat = PlayerValueCatalogue::from_records(vec![
            record("2022_23", "Atlético", "Koke", 10.0),
            record("2022_23", "Betis", "Isco", 5.0),
            record("2021_22", "Atlético", "Koke", 20.0),
            record("2022_23", "atletico", "Oblak", 30.0),
        ]);
        let scope = cat.scope("2022_23", "atletico");
        assert_eq!(scope, &[0, 3]);
        assert_eq!(cat.entry(scope[1]).unwrap().name_norm, "oblak");
        assert!(cat.scope("2022_23", "Atlético").is_empty());
        assert!(cat.scope("2023_24", "atletico").is_empty());
        assert_eq!(cat.seasons(), vec!["2021_22", "2022_23"]);
    }
}
