use chrono::{Duration, NaiveDate};
use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

use match_features::config::PipelineConfig;
use match_features::identity::{IdentityResolver, ResolverConfig, gestalt_ratio};
use match_features::market_values::{PlayerValueCatalogue, PlayerValueRecord};
use match_features::match_record::{BookOdds, MatchRecord};
use match_features::normalize::normalize_name;
use match_features::pipeline::FeaturePipeline;

const TEAMS: usize = 20;
const SQUAD: usize = 28;
const SEASON: &str = "2022_23";
const FIRST: &[&str] = &["José", "Íñigo", "Marc", "Ousmane", "Jan", "Álex", "Kai", "Luka"];
const LAST: &[&str] = &[
    "García", "Müller", "Oblak", "ter Stegen", "Dembélé", "Modrić", "O'Brien", "Núñez",
];

/// Letters, not digits: digits normalize away and would merge scopes.
fn team_name(idx: usize) -> String {
    format!("Club {}", char::from(b'A' + idx as u8))
}

fn player_name(rng: &mut StdRng) -> String {
    let first = FIRST[rng.gen_range(0..FIRST.len())];
    let last = LAST[rng.gen_range(0..LAST.len())];
    format!("{first} {last} {}", rng.gen_range(1..100))
}

fn synthetic_catalogue(rng: &mut StdRng) -> PlayerValueCatalogue {
    let mut records = Vec::with_capacity(TEAMS * SQUAD);
    for team in 0..TEAMS {
        for _ in 0..SQUAD {
            records.push(PlayerValueRecord {
                season: SEASON.to_string(),
                team: team_name(team),
                name: player_name(rng),
                market_value: f64::from(rng.gen_range(1..80u32)) * 500_000.0,
            });
        }
    }
    PlayerValueCatalogue::from_records(records)
}

fn synthetic_season(rng: &mut StdRng, catalogue: &PlayerValueCatalogue) -> Vec<MatchRecord> {
    let start = NaiveDate::from_ymd_opt(2022, 8, 13).unwrap();
    let mut out = Vec::new();
    for round in 0..(2 * (TEAMS - 1)) {
        let date = start + Duration::days(7 * round as i64);
        for pair in 0..TEAMS / 2 {
            let home = (round + pair) % TEAMS;
            let away = (round + TEAMS - 1 - pair) % TEAMS;
            let mut m = MatchRecord::new(
                date,
                team_name(home),
                team_name(away),
                rng.gen_range(0..5),
                rng.gen_range(0..4),
            );
            m.stats.home_shots_on_target = Some(rng.gen_range(0..10));
            m.stats.away_shots_on_target = Some(rng.gen_range(0..8));
            m.stats.home_yellows = Some(rng.gen_range(0..5));
            m.stats.away_yellows = Some(rng.gen_range(0..5));
            m.stats.home_reds = Some(u32::from(rng.gen_bool(0.05)));
            m.stats.away_reds = Some(u32::from(rng.gen_bool(0.05)));
            m.odds = Some(BookOdds {
                home: Some(rng.gen_range(1.2..6.0)),
                draw: Some(rng.gen_range(2.8..4.5)),
                away: Some(rng.gen_range(1.2..9.0)),
            });
            m.home_lineup = Some(lineup_for(rng, catalogue, home));
            m.away_lineup = Some(lineup_for(rng, catalogue, away));
            out.push(m);
        }
    }
    out
}

/// Eleven scope names, some misspelled so the fuzzy passes run.
fn lineup_for(rng: &mut StdRng, catalogue: &PlayerValueCatalogue, team: usize) -> Vec<String> {
    let scope = catalogue.scope(SEASON, &normalize_name(&team_name(team)));
    (0..11)
        .map(|_| {
            let idx = scope[rng.gen_range(0..scope.len())];
            let name = catalogue.entry(idx).unwrap().name.clone();
            if rng.gen_bool(0.3) {
                name.chars().skip(1).collect()
            } else {
                name
            }
        })
        .collect()
}

fn bench_gestalt_ratio(c: &mut Criterion) {
    c.bench_function("gestalt_ratio", |b| {
        b.iter(|| gestalt_ratio(black_box("marc andre ter stegen"), black_box("marc ter stegn")))
    });
}

fn bench_resolve_fuzzy(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let catalogue = synthetic_catalogue(&mut rng);
    let resolver = IdentityResolver::new(&catalogue, ResolverConfig::default());
    let team = normalize_name(&team_name(3));
    c.bench_function("resolve_fuzzy", |b| {
        b.iter(|| resolver.resolve(black_box("Ousman Dembele"), SEASON, &team))
    });
}

fn bench_full_season(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(11);
    let catalogue = synthetic_catalogue(&mut rng);
    let matches = synthetic_season(&mut rng, &catalogue);
    let mut group = c.benchmark_group("full_season");
    for (label, parallel) in [("parallel", true), ("sequential", false)] {
        let config = PipelineConfig {
            parallel_lineups: parallel,
            ..PipelineConfig::default()
        };
        let pipeline = FeaturePipeline::new(config).with_values(&catalogue);
        group.bench_function(label, |b| {
            b.iter(|| black_box(pipeline.run(black_box(matches.clone())).len()))
        });
    }
    group.finish();
}

criterion_group!(perf, bench_gestalt_ratio, bench_resolve_fuzzy, bench_full_season);
criterion_main!(perf);
