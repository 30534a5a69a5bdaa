use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use crate::match_record::{MatchKey, TeamAliases, parse_match_date};
use crate::table::{Columns, open_reader};
use crate::team_value::parse_lineup;

const DATE_COLUMNS: &[&str] = &["Date", "date_time"];
const HOME_TEAM_COLUMNS: &[&str] = &["HomeTeam", "home_team"];
const AWAY_TEAM_COLUMNS: &[&str] = &["AwayTeam", "away_team"];
const HOME_LINEUP_COLUMNS: &[&str] = &[
    "home_lineup_names",
    "Home_Lineup_List",
    "HomeLineup",
    "home_lineup",
];
const AWAY_LINEUP_COLUMNS: &[&str] = &[
    "away_lineup_names",
    "Away_Lineup_List",
    "AwayLineup",
    "away_lineup",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineupPair {
    pub home: Vec<String>,
    pub away: Vec<String>,
}

/// Externally supplied lineups keyed by (date, home, away).
#[derive(Debug, Clone, Default)]
pub struct LineupCatalogue {
    by_key: HashMap<MatchKey, LineupPair>,
}

impl LineupCatalogue {
    /// First row wins when a key repeats.
    pub fn insert(&mut self, key: MatchKey, pair: LineupPair) -> bool {
        if self.by_key.contains_key(&key) {
            return false;
        }
        self.by_key.insert(key, pair);
        true
    }

    pub fn get(&self, key: &MatchKey) -> Option<&LineupPair> {
        self.by_key.get(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn load_csv(path: &Path, aliases: &TeamAliases) -> Result<Self> {
        let mut reader = open_reader(path)?;
        let headers = reader
            .headers()
            .with_context(|| format!("read headers {}", path.display()))?
            .clone();
        let cols = Columns::from_headers(&headers);
        for (what, names) in [
            ("date", DATE_COLUMNS),
            ("home team", HOME_TEAM_COLUMNS),
            ("away team", AWAY_TEAM_COLUMNS),
            ("home lineup", HOME_LINEUP_COLUMNS),
            ("away lineup", AWAY_LINEUP_COLUMNS),
        ] {
            if !cols.has(names) {
                return Err(anyhow!("{}: no {what} column", path.display()));
            }
        }

        let mut out = Self::default();
        let mut skipped = 0usize;
        let mut duplicates = 0usize;
        for (row_idx, row) in reader.records().enumerate() {
            let row = row.with_context(|| format!("{} row {}", path.display(), row_idx + 1))?;
            let date = cols.get(&row, DATE_COLUMNS).and_then(parse_match_date);
            let home = cols.get(&row, HOME_TEAM_COLUMNS);
            let away = cols.get(&row, AWAY_TEAM_COLUMNS);
            let (Some(date), Some(home), Some(away)) = (date, home, away) else {
                skipped += 1;
                warn!(file = %path.display(), row = row_idx + 2, "unparseable lineup row skipped");
                continue;
            };
            let key = MatchKey::new(date, &aliases.canonical(home), &aliases.canonical(away));
            let pair = LineupPair {
                home: cols
                    .get(&row, HOME_LINEUP_COLUMNS)
                    .map(parse_lineup)
                    .unwrap_or_default(),
                away: cols
                    .get(&row, AWAY_LINEUP_COLUMNS)
                    .map(parse_lineup)
                    .unwrap_or_default(),
            };
            if !out.insert(key, pair) {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            warn!(file = %path.display(), duplicates, "repeated lineup keys, first row kept");
        }
        info!(file = %path.display(), lineups = out.len(), skipped, "lineup csv loaded");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn insert_keeps_first_row() {
        let date = NaiveDate::from_ymd_opt(2022, 8, 14).unwrap();
        let mut cat = LineupCatalogue::default();
        let first = LineupPair {
            home: vec!["Pedri".into()],
            away: vec![],
        };
        assert!(cat.insert(MatchKey::new(date, "Barcelona", "Rayo Vallecano"), first.clone()));
        assert!(!cat.insert(
            MatchKey::new(date, "barcelona", "Rayo  Vallecano"),
            LineupPair::default()
        ));
        assert_eq!(cat.len(), 1);
        assert_eq!(
            cat.get(&MatchKey::new(date, "BARCELONA", "rayo vallecano")),
            Some(&first)
        );
    }
}
