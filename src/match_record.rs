use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::normalize::normalize_name;
use crate::table::{Columns, csv_files_in, open_reader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    pub fn from_goals(home_goals: u32, away_goals: u32) -> Self {
        match home_goals.cmp(&away_goals) {
            std::cmp::Ordering::Greater => Outcome::Home,
            std::cmp::Ordering::Less => Outcome::Away,
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    pub fn from_code(raw: &str) -> Option<Self> {
        match raw.trim() {
            "H" | "h" => Some(Outcome::Home),
            "D" | "d" => Some(Outcome::Draw),
            "A" | "a" => Some(Outcome::Away),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            Outcome::Home => 'H',
            Outcome::Draw => 'D',
            Outcome::Away => 'A',
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchStats {
    pub home_shots: Option<u32>,
    pub away_shots: Option<u32>,
    pub home_shots_on_target: Option<u32>,
    pub away_shots_on_target: Option<u32>,
    pub home_fouls: Option<u32>,
    pub away_fouls: Option<u32>,
    pub home_corners: Option<u32>,
    pub away_corners: Option<u32>,
    pub home_yellows: Option<u32>,
    pub away_yellows: Option<u32>,
    pub home_reds: Option<u32>,
    pub away_reds: Option<u32>,
}

/// Bet365 decimal odds. Present on a record when the source carries the
/// three odds columns; individual cells may still be blank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BookOdds {
    pub home: Option<f64>,
    pub draw: Option<f64>,
    pub away: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
    pub result: Outcome,
    #[serde(default)]
    pub ht_home_goals: Option<u32>,
    #[serde(default)]
    pub ht_away_goals: Option<u32>,
    #[serde(default)]
    pub ht_result: Option<Outcome>,
    #[serde(default)]
    pub stats: MatchStats,
    #[serde(default)]
    pub odds: Option<BookOdds>,
    #[serde(default)]
    pub home_lineup: Option<Vec<String>>,
    #[serde(default)]
    pub away_lineup: Option<Vec<String>>,
}

impl MatchRecord {
    pub fn new(
        date: NaiveDate,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        home_goals: u32,
        away_goals: u32,
    ) -> Self {
        Self {
            date,
            division: None,
            season: None,
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_goals,
            away_goals,
            result: Outcome::from_goals(home_goals, away_goals),
            ht_home_goals: None,
            ht_away_goals: None,
            ht_result: None,
            stats: MatchStats::default(),
            odds: None,
            home_lineup: None,
            away_lineup: None,
        }
    }

    pub fn key(&self) -> MatchKey {
        MatchKey::new(self.date, &self.home_team, &self.away_team)
    }

    /// Outcome from the goal counts; the stored `result` code is not trusted
    /// for scoring.
    pub fn outcome(&self) -> Outcome {
        Outcome::from_goals(self.home_goals, self.away_goals)
    }

    pub fn season_or_derived(&self, start_month: u32) -> String {
        self.season
            .clone()
            .unwrap_or_else(|| season_for_date(self.date, start_month))
    }
}

/// Natural key joining matches to lineup rows: date plus both teams in
/// normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchKey {
    pub date: NaiveDate,
    pub home_norm: String,
    pub away_norm: String,
}

impl MatchKey {
    pub fn new(date: NaiveDate, home_team: &str, away_team: &str) -> Self {
        Self {
            date,
            home_norm: normalize_name(home_team),
            away_norm: normalize_name(away_team),
        }
    }
}

/// `YYYY_YY` season label. Dates from `start_month` onwards open a new season,
/// so fixtures of a season that overran past that month (2019-20 ended in
/// July 2020) land in the next one. Rows with a `Season` column avoid this.
pub fn season_for_date(date: NaiveDate, start_month: u32) -> String {
    let start_year = if date.month() >= start_month.clamp(1, 12) {
        date.year()
    } else {
        date.year() - 1
    };
    format!("{start_year}_{:02}", (start_year + 1).rem_euclid(100))
}

pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() == 3 {
        let fmt = if parts[2].len() == 2 { "%d/%m/%y" } else { "%d/%m/%Y" };
        return NaiveDate::parse_from_str(raw, fmt).ok();
    }
    let date_part = raw
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamAliases {
    map: HashMap<String, String>,
}

impl TeamAliases {
    pub fn from_map(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read team aliases {}", path.display()))?;
        let map = serde_json::from_str::<HashMap<String, String>>(&raw)
            .with_context(|| format!("parse team aliases {}", path.display()))?;
        Ok(Self { map })
    }

    pub fn canonical(&self, raw: &str) -> String {
        let raw = raw.trim();
        self.map
            .get(raw)
            .cloned()
            .unwrap_or_else(|| raw.to_string())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

const ODDS_COLUMNS: [&str; 3] = ["B365H", "B365D", "B365A"];

/// Reads a football-data style match CSV. Rows without a parseable date,
/// teams or full-time goals are skipped with a warning.
pub fn load_matches_csv(path: &Path, aliases: &TeamAliases) -> Result<Vec<MatchRecord>> {
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .with_context(|| format!("read headers {}", path.display()))?
        .clone();
    let cols = Columns::from_headers(&headers);
    for required in ["Date", "HomeTeam", "AwayTeam", "FTHG", "FTAG"] {
        if !cols.has(&[required]) {
            return Err(anyhow!("{}: missing column {required}", path.display()));
        }
    }
    let has_odds = ODDS_COLUMNS.iter().all(|c| cols.has(&[c]));

    let mut out = Vec::new();
    let mut skipped = 0usize;
    for (row_idx, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("{} row {}", path.display(), row_idx + 1))?;
        let date = cols.get(&row, &["Date"]).and_then(parse_match_date);
        let home = cols.get(&row, &["HomeTeam"]);
        let away = cols.get(&row, &["AwayTeam"]);
        let fthg = cols.get_u32(&row, &["FTHG"]);
        let ftag = cols.get_u32(&row, &["FTAG"]);
        let (Some(date), Some(home), Some(away), Some(fthg), Some(ftag)) =
            (date, home, away, fthg, ftag)
        else {
            skipped += 1;
            warn!(file = %path.display(), row = row_idx + 2, "unparseable match row skipped");
            continue;
        };

        let mut record = MatchRecord::new(
            date,
            aliases.canonical(home),
            aliases.canonical(away),
            fthg,
            ftag,
        );
        record.division = cols.get(&row, &["Div"]).map(str::to_string);
        record.season = cols.get(&row, &["Season"]).map(str::to_string);
        record.result = cols
            .get(&row, &["FTR"])
            .and_then(Outcome::from_code)
            .unwrap_or(record.result);
        record.ht_home_goals = cols.get_u32(&row, &["HTHG"]);
        record.ht_away_goals = cols.get_u32(&row, &["HTAG"]);
        record.ht_result = cols.get(&row, &["HTR"]).and_then(Outcome::from_code).or(
            match (record.ht_home_goals, record.ht_away_goals) {
                (Some(h), Some(a)) => Some(Outcome::from_goals(h, a)),
                _ => None,
            },
        );
        record.stats = MatchStats {
            home_shots: cols.get_u32(&row, &["HS"]),
            away_shots: cols.get_u32(&row, &["AS"]),
            home_shots_on_target: cols.get_u32(&row, &["HST"]),
            away_shots_on_target: cols.get_u32(&row, &["AST"]),
            home_fouls: cols.get_u32(&row, &["HF"]),
            away_fouls: cols.get_u32(&row, &["AF"]),
            home_corners: cols.get_u32(&row, &["HC"]),
            away_corners: cols.get_u32(&row, &["AC"]),
            home_yellows: cols.get_u32(&row, &["HY"]),
            away_yellows: cols.get_u32(&row, &["AY"]),
            home_reds: cols.get_u32(&row, &["HR"]),
            away_reds: cols.get_u32(&row, &["AR"]),
        };
        if has_odds {
            record.odds = Some(BookOdds {
                home: cols.get_f64(&row, &["B365H"]),
                draw: cols.get_f64(&row, &["B365D"]),
                away: cols.get_f64(&row, &["B365A"]),
            });
        }
        out.push(record);
    }

    let before = out.len();
    dedup_matches(&mut out);
    info!(
        file = %path.display(),
        matches = out.len(),
        skipped,
        duplicates = before - out.len(),
        "match csv loaded"
    );
    Ok(out)
}

pub fn load_matches_dir(dir: &Path, aliases: &TeamAliases) -> Result<Vec<MatchRecord>> {
    let files = csv_files_in(dir)?;
    if files.is_empty() {
        return Err(anyhow!("no match csv files in {}", dir.display()));
    }
    let mut out = Vec::new();
    for path in &files {
        out.extend(load_matches_csv(path, aliases)?);
    }
    dedup_matches(&mut out);
    Ok(out)
}

/// Drops rows identical in every field. Rows that only share a match key
/// are both kept, with a warning.
fn dedup_matches(matches: &mut Vec<MatchRecord>) {
    let mut by_key: HashMap<MatchKey, Vec<usize>> = HashMap::new();
    let mut kept: Vec<MatchRecord> = Vec::with_capacity(matches.len());
    for m in matches.drain(..) {
        let slots = by_key.entry(m.key()).or_default();
        if slots.iter().any(|&idx| kept[idx] == m) {
            continue;
        }
        if !slots.is_empty() {
            warn!(
                date = %m.date,
                home = %m.home_team,
                away = %m.away_team,
                "rows share a match key but differ; both kept"
            );
        }
        slots.push(kept.len());
        kept.push(m);
    }
    *matches = kept;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_match_date_formats() {
        assert_eq!(parse_match_date("19/08/2022"), Some(date(2022, 8, 19)));
        assert_eq!(parse_match_date("19/08/07"), Some(date(2007, 8, 19)));
        assert_eq!(parse_match_date("2022-08-19"), Some(date(2022, 8, 19)));
        assert_eq!(parse_match_date("2022-08-19 21:00:00"), Some(date(2022, 8, 19)));
        assert_eq!(parse_match_date("2022-08-19T21:00:00Z"), Some(date(2022, 8, 19)));
        assert_eq!(parse_match_date("32/08/2022"), None);
        assert_eq!(parse_match_date(""), None);
    }

    #[test]
    fn season_for_date_splits_on_start_month() {
        assert_eq!(season_for_date(date(2022, 8, 13), 7), "2022_23");
        assert_eq!(season_for_date(date(2023, 5, 28), 7), "2022_23");
        assert_eq!(season_for_date(date(1999, 9, 1), 7), "1999_00");
        assert_eq!(season_for_date(date(2023, 1, 1), 1), "2023_24");
    }

    #[test]
    fn outcome_codes() {
        assert_eq!(Outcome::from_goals(2, 1), Outcome::Home);
        assert_eq!(Outcome::from_goals(0, 0), Outcome::Draw);
        assert_eq!(Outcome::from_goals(0, 3), Outcome::Away);
        assert_eq!(Outcome::from_code(" A "), Some(Outcome::Away));
        assert_eq!(Outcome::Draw.code(), 'D');
    }

    #[test]
    fn match_key_ignores_accents_and_case() {
        let a = MatchKey::new(date(2022, 8, 13), "Atlético", "Cádiz");
        let b = MatchKey::new(date(2022, 8, 13), "atletico", "CADIZ ");
        assert_eq!(a, b);
    }

    #[test]
    fn dedup_drops_only_identical_rows() {
        let first = MatchRecord::new(date(2022, 8, 13), "Getafe", "Cadiz", 1, 0);
        let mut other_stats = first.clone();
        other_stats.stats.home_corners = Some(7);
        let mut matches = vec![first.clone(), first.clone(), other_stats.clone()];
        dedup_matches(&mut matches);
        assert_eq!(matches, vec![first, other_stats]);
    }

    #[test]
    fn aliases_pass_unknown_names_through() {
        let aliases = TeamAliases::from_map(HashMap::from([(
            "Ath Madrid".to_string(),
            "Atlético".to_string(),
        )]));
        assert_eq!(aliases.canonical(" Ath Madrid "), "Atlético");
        assert_eq!(aliases.canonical("Getafe"), "Getafe");
        assert!(!aliases.is_empty());
        assert!(TeamAliases::default().is_empty());
    }
}
