use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::match_record::MatchRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn prefix(self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormMetric {
    GoalsScored,
    GoalsConceded,
    Shots,
    ShotsOnTarget,
    Corners,
    Fouls,
    Yellows,
    Reds,
}

impl FormMetric {
    pub const ALL: [FormMetric; 8] = [
        FormMetric::GoalsScored,
        FormMetric::GoalsConceded,
        FormMetric::Shots,
        FormMetric::ShotsOnTarget,
        FormMetric::Corners,
        FormMetric::Fouls,
        FormMetric::Yellows,
        FormMetric::Reds,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            FormMetric::GoalsScored => "goals_scored",
            FormMetric::GoalsConceded => "goals_conceded",
            FormMetric::Shots => "shots",
            FormMetric::ShotsOnTarget => "shots_on_target",
            FormMetric::Corners => "corners",
            FormMetric::Fouls => "fouls",
            FormMetric::Yellows => "yellows",
            FormMetric::Reds => "reds",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    pub fn observe(self, m: &MatchRecord, side: Side) -> Option<f64> {
        let s = &m.stats;
        let raw = match (self, side) {
            (FormMetric::GoalsScored, Side::Home) => Some(m.home_goals),
            (FormMetric::GoalsScored, Side::Away) => Some(m.away_goals),
            (FormMetric::GoalsConceded, Side::Home) => Some(m.away_goals),
            (FormMetric::GoalsConceded, Side::Away) => Some(m.home_goals),
            (FormMetric::Shots, Side::Home) => s.home_shots,
            (FormMetric::Shots, Side::Away) => s.away_shots,
            (FormMetric::ShotsOnTarget, Side::Home) => s.home_shots_on_target,
            (FormMetric::ShotsOnTarget, Side::Away) => s.away_shots_on_target,
            (FormMetric::Corners, Side::Home) => s.home_corners,
            (FormMetric::Corners, Side::Away) => s.away_corners,
            (FormMetric::Fouls, Side::Home) => s.home_fouls,
            (FormMetric::Fouls, Side::Away) => s.away_fouls,
            (FormMetric::Yellows, Side::Home) => s.home_yellows,
            (FormMetric::Yellows, Side::Away) => s.away_yellows,
            (FormMetric::Reds, Side::Home) => s.home_reds,
            (FormMetric::Reds, Side::Away) => s.away_reds,
        };
        raw.map(f64::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormWindow {
    pub window: usize,
    /// Non-missing observations needed inside the window before a mean is
    /// reported.
    pub min_periods: usize,
}

impl FormWindow {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            min_periods: window,
        }
    }

    pub fn with_min_periods(self, min_periods: usize) -> Self {
        Self {
            min_periods: min_periods.clamp(1, self.window),
            ..self
        }
    }
}

impl Default for FormWindow {
    fn default() -> Self {
        Self::new(7)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TeamHistory {
    values: [VecDeque<Option<f64>>; 8],
}

impl TeamHistory {
    fn mean(&self, metric: FormMetric, cfg: FormWindow) -> Option<f64> {
        let history = &self.values[metric.index()];
        let mut sum = 0.0;
        let mut n = 0usize;
        for v in history.iter().rev().take(cfg.window).flatten() {
            sum += v;
            n += 1;
        }
        if n == 0 || n < cfg.min_periods {
            return None;
        }
        Some(sum / n as f64)
    }

    fn push(&mut self, metric: FormMetric, value: Option<f64>, cfg: FormWindow) {
        let history = &mut self.values[metric.index()];
        history.push_back(value);
        while history.len() > cfg.window {
            history.pop_front();
        }
    }

    pub fn observations(&self, metric: FormMetric) -> usize {
        self.values[metric.index()].len()
    }
}

/// Histories keyed by (team, role). Home and away form are tracked
/// separately: a team's home features only ever see its home matches.
pub type FormState = HashMap<(String, Side), TeamHistory>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SideForm {
    values: [Option<f64>; 8],
}

impl SideForm {
    pub fn get(&self, metric: FormMetric) -> Option<f64> {
        self.values[metric.index()]
    }

    pub fn set(&mut self, metric: FormMetric, value: Option<f64>) {
        self.values[metric.index()] = value;
    }

    pub fn goal_diff(&self) -> Option<f64> {
        Some(self.get(FormMetric::GoalsScored)? - self.get(FormMetric::GoalsConceded)?)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FormFeatures {
    pub home: SideForm,
    pub away: SideForm,
}

/// Reads both sides' windows, then appends this match's observations. The
/// match never sees its own values.
pub fn form_features(state: &mut FormState, m: &MatchRecord, cfg: FormWindow) -> FormFeatures {
    let mut out = FormFeatures::default();
    for (side, team, slot) in [
        (Side::Home, &m.home_team, &mut out.home),
        (Side::Away, &m.away_team, &mut out.away),
    ] {
        let history = state.entry((team.clone(), side)).or_default();
        for metric in FormMetric::ALL {
            slot.set(metric, history.mean(metric, cfg));
        }
        for metric in FormMetric::ALL {
            history.push(metric, metric.observe(m, side), cfg);
        }
    }
    out
}

pub fn compute_form_features(
    matches: &[MatchRecord],
    state: &mut FormState,
    cfg: FormWindow,
) -> Vec<FormFeatures> {
    matches
        .iter()
        .map(|m| form_features(state, m, cfg))
        .collect()
}
