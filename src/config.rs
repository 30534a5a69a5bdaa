use std::env;

use serde::{Deserialize, Serialize};

use crate::elo::EloConfig;
use crate::identity::{ResolverConfig, SimilarityMetric};
use crate::rolling_form::FormWindow;

pub const DEFAULT_SEASON_START_MONTH: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub elo: EloConfig,
    pub form: FormWindow,
    pub resolver: ResolverConfig,
    pub season_start_month: u32,
    pub parallel_lineups: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            elo: EloConfig::default(),
            form: FormWindow::default(),
            resolver: ResolverConfig::default(),
            season_start_month: DEFAULT_SEASON_START_MONTH,
            parallel_lineups: true,
        }
    }
}

/// Command-line flags and the variable each one overrides.
const FLAG_OVERRIDES: [(&str, &str); 3] = [
    ("--k", "FEATURES_ELO_K"),
    ("--window", "FEATURES_WINDOW"),
    ("--min-periods", "FEATURES_MIN_PERIODS"),
];

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_env_and_args(args: &[String]) -> Self {
        Self::from_lookup_with_args(|key| env::var(key).ok(), args)
    }

    /// Flags win over their variables. Window and min periods are read
    /// together, so overriding one keeps the other.
    pub fn from_lookup_with_args(
        lookup: impl Fn(&str) -> Option<String>,
        args: &[String],
    ) -> Self {
        Self::from_lookup(|key| {
            FLAG_OVERRIDES
                .iter()
                .find(|(_, var)| *var == key)
                .and_then(|(flag, _)| arg_value(args, flag))
                .or_else(|| lookup(key))
        })
    }

    /// Unparseable values are ignored; parsed ones are clamped to usable
    /// ranges.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        let f64_var = |key: &str| {
            lookup(key)
                .and_then(|raw| raw.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };
        let usize_var = |key: &str| lookup(key).and_then(|raw| raw.trim().parse::<usize>().ok());

        if let Some(k) = f64_var("FEATURES_ELO_K") {
            cfg.elo.k = k.clamp(0.0, 200.0);
        }
        if let Some(initial) = f64_var("FEATURES_ELO_INITIAL") {
            cfg.elo.initial = initial;
        }
        if let Some(window) = usize_var("FEATURES_WINDOW") {
            cfg.form = FormWindow::new(window.clamp(1, 100));
        }
        if let Some(min_periods) = usize_var("FEATURES_MIN_PERIODS") {
            cfg.form = cfg.form.with_min_periods(min_periods);
        }
        if let Some(gate) = f64_var("FEATURES_TOKEN_GATE") {
            cfg.resolver.token_gate = gate.clamp(0.0, 1.0);
        }
        if let Some(floor) = f64_var("FEATURES_ACCEPT_FLOOR") {
            cfg.resolver.accept_floor = floor.clamp(0.0, 1.0);
        }
        if let Some(metric) =
            lookup("FEATURES_SIMILARITY").and_then(|raw| SimilarityMetric::parse(&raw))
        {
            cfg.resolver.similarity = metric;
        }
        if let Some(month) = usize_var("FEATURES_SEASON_START_MONTH") {
            cfg.season_start_month = month.clamp(1, 12) as u32;
        }
        if let Some(raw) = lookup("FEATURES_PARALLEL_LINEUPS") {
            cfg.parallel_lineups = !matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            );
        }
        cfg
    }
}

pub fn arg_value(args: &[String], name: &str) -> Option<String> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(name).and_then(|rest| rest.strip_prefix('='))
            && !raw.trim().is_empty()
        {
            return Some(raw.trim().to_string());
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
