use std::collections::BTreeSet;

use anyhow::{Result, bail};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::elo::{RatingTable, rate_match};
use crate::features::FeatureRow;
use crate::identity::IdentityResolver;
use crate::indices::{implied_probabilities, side_indices};
use crate::lineups::LineupCatalogue;
use crate::market_values::PlayerValueCatalogue;
use crate::match_record::MatchRecord;
use crate::normalize::normalize_name;
use crate::rolling_form::{FormState, form_features};
use crate::team_value::{TeamValue, team_value};

/// Mutable per-team state for one chronological pass. Owned by the caller
/// so a pass can be resumed or inspected after it finishes.
#[derive(Debug, Clone, Default)]
pub struct PassState {
    pub ratings: RatingTable,
    pub form: FormState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub matches: usize,
    pub teams: usize,
    pub with_odds: usize,
    pub with_lineups: usize,
    pub players_seen: usize,
    pub players_resolved: usize,
}

/// Errors out on the first match dated before its predecessor.
pub fn ensure_chronological(matches: &[MatchRecord]) -> Result<()> {
    for (idx, pair) in matches.windows(2).enumerate() {
        if pair[1].date < pair[0].date {
            bail!(
                "match {} ({} {} v {}) is dated before match {} ({}); input must be sorted by date",
                idx + 1,
                pair[1].date,
                pair[1].home_team,
                pair[1].away_team,
                idx,
                pair[0].date
            );
        }
    }
    Ok(())
}

pub struct FeaturePipeline<'a> {
    config: PipelineConfig,
    values: Option<&'a PlayerValueCatalogue>,
    lineups: Option<&'a LineupCatalogue>,
}

impl<'a> FeaturePipeline<'a> {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            values: None,
            lineups: None,
        }
    }

    pub fn with_values(mut self, values: &'a PlayerValueCatalogue) -> Self {
        self.values = Some(values);
        self
    }

    pub fn with_lineups(mut self, lineups: &'a LineupCatalogue) -> Self {
        self.lineups = Some(lineups);
        self
    }

    /// Stable-sorts by date, then scores every match from a fresh state.
    pub fn run(&self, mut matches: Vec<MatchRecord>) -> Vec<FeatureRow> {
        matches.sort_by_key(|m| m.date);
        let mut state = PassState::default();
        self.score(matches, &mut state).0
    }

    /// Trusts nothing: unsorted input is rejected instead of re-sorted.
    pub fn run_presorted(
        &self,
        matches: Vec<MatchRecord>,
        state: &mut PassState,
    ) -> Result<(Vec<FeatureRow>, RunSummary)> {
        ensure_chronological(&matches)?;
        Ok(self.score(matches, state))
    }

    fn score(
        &self,
        matches: Vec<MatchRecord>,
        state: &mut PassState,
    ) -> (Vec<FeatureRow>, RunSummary) {
        let with_odds = matches.iter().filter(|m| m.odds.is_some()).count();
        if with_odds == 0 && !matches.is_empty() {
            warn!("no bookmaker odds in input; market probability columns skipped");
        }

        let mut rows = Vec::with_capacity(matches.len());
        for record in matches {
            let elo = rate_match(&mut state.ratings, &record, self.config.elo);
            let form = form_features(&mut state.form, &record, self.config.form);
            let market = record.odds.as_ref().map(implied_probabilities);
            rows.push(FeatureRow {
                season: record.season_or_derived(self.config.season_start_month),
                home_indices: side_indices(&form.home),
                away_indices: side_indices(&form.away),
                elo,
                form,
                market,
                home_value: None,
                away_value: None,
                record,
            });
        }

        let mut summary = RunSummary {
            matches: rows.len(),
            teams: state.ratings.len(),
            with_odds,
            ..RunSummary::default()
        };
        if let Some(values) = self.values {
            self.attach_team_values(&mut rows, values);
            for v in rows.iter().flat_map(|r| [r.home_value, r.away_value]).flatten() {
                summary.players_seen += v.seen;
                summary.players_resolved += v.resolved;
            }
            summary.with_lineups = rows
                .iter()
                .filter(|r| r.home_value.is_some() || r.away_value.is_some())
                .count();
        } else if self.lineups.is_some() {
            warn!("lineups supplied without a market-value catalogue; team values skipped");
        }

        info!(
            matches = summary.matches,
            teams = summary.teams,
            with_odds = summary.with_odds,
            with_lineups = summary.with_lineups,
            players_seen = summary.players_seen,
            players_resolved = summary.players_resolved,
            "feature pass complete"
        );
        (rows, summary)
    }

    fn attach_team_values(&self, rows: &mut [FeatureRow], values: &PlayerValueCatalogue) {
        let resolver = IdentityResolver::new(values, self.config.resolver);
        let fill = |row: &mut FeatureRow| {
            let (home, away) = self.values_for(&resolver, row);
            row.home_value = home;
            row.away_value = away;
        };
        if self.config.parallel_lineups {
            rows.par_iter_mut().for_each(fill);
        } else {
            rows.iter_mut().for_each(fill);
        }
        for (season, team) in unscoped_lineups(rows, values) {
            warn!(%season, %team, "lineup team has no market values for its season");
        }
    }

    /// Lineups carried on the record win over the external join table.
    /// A match with neither keeps both values absent.
    fn values_for(
        &self,
        resolver: &IdentityResolver<'_>,
        row: &FeatureRow,
    ) -> (Option<TeamValue>, Option<TeamValue>) {
        let m = &row.record;
        let joined = self.lineups.and_then(|l| l.get(&m.key()));
        let home = m
            .home_lineup
            .as_deref()
            .or(joined.map(|p| p.home.as_slice()));
        let away = m
            .away_lineup
            .as_deref()
            .or(joined.map(|p| p.away.as_slice()));
        if home.is_none() && away.is_none() {
            debug!(date = %m.date, home = %m.home_team, away = %m.away_team, "no lineup");
            return (None, None);
        }

        let side = |lineup: Option<&[String]>, team: &str| {
            lineup.map(|names| {
                team_value(
                    resolver,
                    names.iter().map(String::as_str),
                    &normalize_name(team),
                    &row.season,
                )
            })
        };
        (side(home, &m.home_team), side(away, &m.away_team))
    }
}

/// (season, normalized team) pairs that had a lineup but no catalogue rows.
/// Usually a season label that does not match the catalogue's.
fn unscoped_lineups(
    rows: &[FeatureRow],
    values: &PlayerValueCatalogue,
) -> BTreeSet<(String, String)> {
    let mut out = BTreeSet::new();
    for row in rows {
        for (value, team) in [
            (row.home_value, &row.record.home_team),
            (row.away_value, &row.record.away_team),
        ] {
            let Some(value) = value else {
                continue;
            };
            let team_norm = normalize_name(team);
            if value.seen > 0 && values.scope(&row.season, &team_norm).is_empty() {
                out.insert((row.season.clone(), team_norm));
            }
        }
    }
    out
}
