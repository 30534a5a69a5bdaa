use serde::Serialize;

use crate::elo::EloFeatures;
use crate::indices::{MarketProbabilities, SideIndices};
use crate::match_record::{MatchRecord, Outcome};
use crate::rolling_form::{FormFeatures, FormMetric, Side};
use crate::team_value::TeamValue;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub record: MatchRecord,
    pub season: String,
    pub elo: EloFeatures,
    pub form: FormFeatures,
    pub home_indices: SideIndices,
    pub away_indices: SideIndices,
    /// `None` when the input carries no odds columns.
    pub market: Option<MarketProbabilities>,
    /// `None` when no lineup was found for the match.
    pub home_value: Option<TeamValue>,
    pub away_value: Option<TeamValue>,
}

impl FeatureRow {
    pub fn goal_diff_form(&self, side: Side) -> Option<f64> {
        match side {
            Side::Home => self.form.home.goal_diff(),
            Side::Away => self.form.away.goal_diff(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn opt_num(v: Option<f64>) -> Self {
        v.map_or(Cell::Empty, Cell::Number)
    }

    fn opt_count(v: Option<u32>) -> Self {
        v.map_or(Cell::Empty, |v| Cell::Number(f64::from(v)))
    }

    fn opt_text(v: Option<&str>) -> Self {
        v.map_or(Cell::Empty, |s| Cell::Text(s.to_string()))
    }

    fn outcome(v: Option<Outcome>) -> Self {
        v.map_or(Cell::Empty, |o| Cell::Text(o.code().to_string()))
    }

    pub fn render(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(v) => v.to_string(),
            Cell::Empty => String::new(),
        }
    }
}

/// Input stat columns paired with the rolling metric built from them.
const STAT_COLUMNS: [(FormMetric, &str, &str); 6] = [
    (FormMetric::Shots, "HS", "AS"),
    (FormMetric::ShotsOnTarget, "HST", "AST"),
    (FormMetric::Fouls, "HF", "AF"),
    (FormMetric::Corners, "HC", "AC"),
    (FormMetric::Yellows, "HY", "AY"),
    (FormMetric::Reds, "HR", "AR"),
];

/// Which optional column groups the table carries. Decided once from the
/// whole match set so every row has the same shape.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureColumns {
    pub window: usize,
    pub metrics: Vec<FormMetric>,
    pub division: bool,
    pub half_time: bool,
    pub odds: bool,
    pub lineups: bool,
}

impl FeatureColumns {
    pub fn detect(rows: &[FeatureRow], window: usize) -> Self {
        let records = || rows.iter().map(|r| &r.record);
        let metrics = FormMetric::ALL
            .into_iter()
            .filter(|metric| {
                records().any(|m| {
                    metric.observe(m, Side::Home).is_some()
                        || metric.observe(m, Side::Away).is_some()
                })
            })
            .collect();
        Self {
            window,
            metrics,
            division: records().any(|m| m.division.is_some()),
            half_time: records().any(|m| m.ht_home_goals.is_some() || m.ht_away_goals.is_some()),
            odds: rows.iter().any(|r| r.market.is_some()),
            lineups: rows
                .iter()
                .any(|r| r.home_value.is_some() || r.away_value.is_some()),
        }
    }

    fn has(&self, metric: FormMetric) -> bool {
        self.metrics.contains(&metric)
    }

    pub fn rolling_column(&self, side: Side, metric: FormMetric) -> String {
        format!("{}_avg_{}_{}", side.prefix(), metric.slug(), self.window)
    }

    pub fn headers(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut push = |name: &str| out.push(name.to_string());
        if self.division {
            push("Div");
        }
        for name in ["Date", "HomeTeam", "AwayTeam", "FTHG", "FTAG", "FTR"] {
            push(name);
        }
        if self.half_time {
            for name in ["HTHG", "HTAG", "HTR"] {
                push(name);
            }
        }
        for (metric, home, away) in STAT_COLUMNS {
            if self.has(metric) {
                push(home);
                push(away);
            }
        }
        if self.odds {
            for name in ["B365H", "B365D", "B365A"] {
                push(name);
            }
        }
        for name in ["Season", "elo_home", "elo_away", "elo_diff"] {
            push(name);
        }

        for metric in [FormMetric::GoalsScored, FormMetric::GoalsConceded] {
            out.push(self.rolling_column(Side::Home, metric));
            out.push(self.rolling_column(Side::Away, metric));
        }
        out.push("goal_diff_form_home".to_string());
        out.push("goal_diff_form_away".to_string());
        for (metric, _, _) in STAT_COLUMNS {
            if self.has(metric) {
                out.push(self.rolling_column(Side::Home, metric));
                out.push(self.rolling_column(Side::Away, metric));
            }
        }

        for name in [
            "attack_strength_home",
            "attack_strength_away",
            "defense_strength_home",
            "defense_strength_away",
            "discipline_index_home",
            "discipline_index_away",
        ] {
            out.push(name.to_string());
        }
        if self.odds {
            for name in [
                "B365H_prob",
                "B365D_prob",
                "B365A_prob",
                "prob_diff_home_away",
                "prob_fav_margin",
            ] {
                out.push(name.to_string());
            }
        }
        if self.lineups {
            for name in [
                "home_team_value",
                "away_team_value",
                "home_lineup_coverage",
                "away_lineup_coverage",
            ] {
                out.push(name.to_string());
            }
        }
        out
    }

    pub fn cells(&self, row: &FeatureRow) -> Vec<Cell> {
        let m = &row.record;
        let mut out = Vec::with_capacity(64);
        if self.division {
            out.push(Cell::opt_text(m.division.as_deref()));
        }
        out.push(Cell::Text(m.date.format("%Y-%m-%d").to_string()));
        out.push(Cell::Text(m.home_team.clone()));
        out.push(Cell::Text(m.away_team.clone()));
        out.push(Cell::Number(f64::from(m.home_goals)));
        out.push(Cell::Number(f64::from(m.away_goals)));
        out.push(Cell::outcome(Some(m.result)));
        if self.half_time {
            out.push(Cell::opt_count(m.ht_home_goals));
            out.push(Cell::opt_count(m.ht_away_goals));
            out.push(Cell::outcome(m.ht_result));
        }
        for (metric, _, _) in STAT_COLUMNS {
            if self.has(metric) {
                out.push(Cell::opt_num(metric.observe(m, Side::Home)));
                out.push(Cell::opt_num(metric.observe(m, Side::Away)));
            }
        }
        if self.odds {
            let odds = m.odds.unwrap_or_default();
            out.push(Cell::opt_num(odds.home));
            out.push(Cell::opt_num(odds.draw));
            out.push(Cell::opt_num(odds.away));
        }
        out.push(Cell::Text(row.season.clone()));
        out.push(Cell::Number(row.elo.home));
        out.push(Cell::Number(row.elo.away));
        out.push(Cell::Number(row.elo.diff));

        for metric in [FormMetric::GoalsScored, FormMetric::GoalsConceded] {
            out.push(Cell::opt_num(row.form.home.get(metric)));
            out.push(Cell::opt_num(row.form.away.get(metric)));
        }
        out.push(Cell::opt_num(row.goal_diff_form(Side::Home)));
        out.push(Cell::opt_num(row.goal_diff_form(Side::Away)));
        for (metric, _, _) in STAT_COLUMNS {
            if self.has(metric) {
                out.push(Cell::opt_num(row.form.home.get(metric)));
                out.push(Cell::opt_num(row.form.away.get(metric)));
            }
        }

        let (h, a) = (&row.home_indices, &row.away_indices);
        out.push(Cell::opt_num(h.attack_strength));
        out.push(Cell::opt_num(a.attack_strength));
        out.push(Cell::opt_num(h.defense_strength));
        out.push(Cell::opt_num(a.defense_strength));
        out.push(Cell::opt_num(h.discipline_index));
        out.push(Cell::opt_num(a.discipline_index));

        if self.odds {
            // Rows without odds of their own still get zeros, like blank odds.
            let p = row.market.unwrap_or_default();
            out.push(Cell::Number(p.home));
            out.push(Cell::Number(p.draw));
            out.push(Cell::Number(p.away));
            out.push(Cell::Number(p.diff_home_away));
            out.push(Cell::Number(p.fav_margin));
        }
        if self.lineups {
            out.push(Cell::opt_num(row.home_value.map(|v| v.total)));
            out.push(Cell::opt_num(row.away_value.map(|v| v.total)));
            out.push(Cell::opt_num(row.home_value.and_then(|v| v.coverage())));
            out.push(Cell::opt_num(row.away_value.and_then(|v| v.coverage())));
        }
        out
    }
}
