use serde::{Deserialize, Serialize};

use crate::match_record::BookOdds;
use crate::rolling_form::{FormMetric, SideForm};

/// Keeps the defense index finite for a side that concedes nothing.
pub const DEFENSE_EPSILON: f64 = 1e-3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SideIndices {
    pub attack_strength: Option<f64>,
    pub defense_strength: Option<f64>,
    pub discipline_index: Option<f64>,
}

pub fn attack_strength(goals_scored: f64, shots_on_target: f64) -> f64 {
    goals_scored + 0.1 * shots_on_target
}

pub fn defense_strength(goals_conceded: f64, yellows: f64) -> f64 {
    1.0 / (goals_conceded + 0.1 * yellows + DEFENSE_EPSILON)
}

pub fn discipline_index(yellows: f64, reds: f64) -> f64 {
    1.0 - (0.5 * yellows + 1.5 * reds) / 10.0
}

pub fn side_indices(form: &SideForm) -> SideIndices {
    let gs = form.get(FormMetric::GoalsScored);
    let gc = form.get(FormMetric::GoalsConceded);
    let sot = form.get(FormMetric::ShotsOnTarget);
    let y = form.get(FormMetric::Yellows);
    let r = form.get(FormMetric::Reds);
    SideIndices {
        attack_strength: gs.zip(sot).map(|(gs, sot)| attack_strength(gs, sot)),
        defense_strength: gc.zip(y).map(|(gc, y)| defense_strength(gc, y)),
        discipline_index: y.zip(r).map(|(y, r)| discipline_index(y, r)),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketProbabilities {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
    pub diff_home_away: f64,
    pub fav_margin: f64,
}

/// Bookmaker margin removed: `1/odds` per outcome, rescaled to sum to 1.
/// Blank odds drop out of the sum and the max/min; every value that ends up
/// infinite or undefined is reported as 0.
pub fn implied_probabilities(odds: &BookOdds) -> MarketProbabilities {
    let inverse = |o: Option<f64>| o.map_or(f64::NAN, |o| 1.0 / o);
    let raw = [inverse(odds.home), inverse(odds.draw), inverse(odds.away)];
    let total: f64 = raw.iter().filter(|v| !v.is_nan()).sum();
    let p = raw.map(|v| v / total);

    let present = || p.iter().copied().filter(|v| !v.is_nan());
    let max = present().fold(f64::NAN, f64::max);
    let min = present().fold(f64::NAN, f64::min);

    MarketProbabilities {
        home: finite_or_zero(p[0]),
        draw: finite_or_zero(p[1]),
        away: finite_or_zero(p[2]),
        diff_home_away: finite_or_zero(p[0] - p[2]),
        fav_margin: finite_or_zero(max - min),
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}
