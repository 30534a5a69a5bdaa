use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::match_record::{MatchRecord, Outcome};

pub type RatingTable = HashMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EloConfig {
    pub k: f64,
    pub initial: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            k: 20.0,
            initial: 1500.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EloFeatures {
    pub home: f64,
    pub away: f64,
    pub diff: f64,
}

pub fn rate_match(ratings: &mut RatingTable, m: &MatchRecord, cfg: EloConfig) -> EloFeatures {
    let eh = *ratings.entry(m.home_team.clone()).or_insert(cfg.initial);
    let ea = *ratings.entry(m.away_team.clone()).or_insert(cfg.initial);

    let (s_home, s_away) = match m.outcome() {
        Outcome::Home => (1.0, 0.0),
        Outcome::Away => (0.0, 1.0),
        Outcome::Draw => (0.5, 0.5),
    };
    let expected_home = expected_score(eh, ea);
    let expected_away = 1.0 - expected_home;

    ratings.insert(m.home_team.clone(), eh + cfg.k * (s_home - expected_home));
    ratings.insert(m.away_team.clone(), ea + cfg.k * (s_away - expected_away));

    EloFeatures {
        home: eh,
        away: ea,
        diff: eh - ea,
    }
}

pub fn compute_elo_features(
    matches: &[MatchRecord],
    ratings: &mut RatingTable,
    cfg: EloConfig,
) -> Vec<EloFeatures> {
    matches
        .iter()
        .map(|m| rate_match(ratings, m, cfg))
        .collect()
}

pub fn expected_score(r_a: f64, r_b: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((r_b - r_a) / 400.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixture(day: u32, home: &str, away: &str, hg: u32, ag: u32) -> MatchRecord {
        MatchRecord::new(
            NaiveDate::from_ymd_opt(2022, 8, day).unwrap(),
            home,
            away,
            hg,
            ag,
        )
    }

    #[test]
    fn draw_between_equal_teams_keeps_initial_ratings() {
        let mut ratings = RatingTable::new();
        let f = rate_match(&mut ratings, &fixture(1, "A", "B", 1, 1), EloConfig::default());
        assert_eq!((f.home, f.away, f.diff), (1500.0, 1500.0, 0.0));
        assert_eq!(ratings["A"], 1500.0);
        assert_eq!(ratings["B"], 1500.0);
    }

    #[test]
    fn home_win_moves_ratings_symmetrically() {
        let mut ratings = RatingTable::new();
        rate_match(&mut ratings, &fixture(1, "A", "B", 2, 0), EloConfig::default());
        assert_eq!(ratings["A"], 1510.0);
        assert_eq!(ratings["B"], 1490.0);
    }

    #[test]
    fn features_are_pre_match_ratings() {
        let mut ratings = RatingTable::new();
        let feats = compute_elo_features(
            &[fixture(1, "A", "B", 0, 1), fixture(8, "B", "C", 3, 3)],
            &mut ratings,
            EloConfig::default(),
        );
        assert_eq!(feats[0].diff, 0.0);
        assert_eq!(feats[1].home, 1510.0);
        assert_eq!(feats[1].away, 1500.0);
        assert!((feats[1].diff - 10.0).abs() < 1e-12);
        // Favourite drawing loses points, underdog gains the same amount.
        let moved = 1510.0 - ratings["B"];
        assert!(moved > 0.0);
        assert!((ratings["C"] - 1500.0 - moved).abs() < 1e-9);
    }

    #[test]
    fn expected_score_is_logistic_in_rating_gap() {
        assert_eq!(expected_score(1500.0, 1500.0), 0.5);
        assert!((expected_score(1900.0, 1500.0) - 10.0 / 11.0).abs() < 1e-12);
        assert!(
            (expected_score(1600.0, 1500.0) + expected_score(1500.0, 1600.0) - 1.0).abs() < 1e-12
        );
    }

    #[test]
    fn custom_k_and_initial() {
        let cfg = EloConfig {
            k: 32.0,
            initial: 1000.0,
        };
        let mut ratings = RatingTable::new();
        rate_match(&mut ratings, &fixture(1, "A", "B", 0, 2), cfg);
        assert_eq!(ratings["A"], 984.0);
        assert_eq!(ratings["B"], 1016.0);
    }
}
