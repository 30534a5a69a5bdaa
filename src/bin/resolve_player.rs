use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use match_features::config::PipelineConfig;
use match_features::identity::{IdentityResolver, Resolution, token_overlap_score};
use match_features::market_values::{
    PlayerValueCatalogue, load_catalogue_dir, load_catalogue_file,
};
use match_features::normalize::{normalize_name, tokens};

const TOP_N: usize = 5;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let values_path = parse_str_arg("--values")
        .map(PathBuf::from)
        .context("missing --values <file-or-dir>")?;
    let season = parse_str_arg("--season").context("missing --season (e.g. 2022_23)")?;
    let team = parse_str_arg("--team").context("missing --team")?;
    let name = parse_str_arg("--name").context("missing --name")?;

    let catalogue = load_values(&values_path)?;
    let config = PipelineConfig::from_env();
    let resolver = IdentityResolver::new(&catalogue, config.resolver);
    let team_norm = normalize_name(&team);
    let query = normalize_name(&name);
    let scope = catalogue.scope(&season, &team_norm);

    println!("Query: {name:?} -> {query:?}");
    println!(
        "Scope: season={season} team={team_norm:?} candidates={}",
        scope.len()
    );
    if scope.is_empty() {
        let seasons = catalogue.seasons();
        if !seasons.contains(&season.as_str()) {
            return Err(anyhow!("season {season} not in catalogue (have {seasons:?})"));
        }
    }

    let query_tokens: HashSet<&str> = tokens(&query).collect();
    let mut ranked = scope
        .iter()
        .filter_map(|&idx| catalogue.entry(idx).map(|e| (idx, e)))
        .map(|(idx, e)| {
            let token = token_overlap_score(&query_tokens, &e.name_norm);
            let chars = config.resolver.similarity.score(&query, &e.name_norm);
            (idx, e, token, chars)
        })
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| {
        b.2.total_cmp(&a.2)
            .then(b.3.total_cmp(&a.3))
            .then(a.0.cmp(&b.0))
    });
    for (idx, entry, token, chars) in ranked.iter().take(TOP_N) {
        println!(
            "  #{idx:<5} {:<28} token={token:.3} chars={chars:.3} value={}",
            entry.name, entry.market_value
        );
    }

    match resolver.resolve(&name, &season, &team_norm) {
        Resolution::Matched {
            entry,
            pass,
            score,
            value,
        } => {
            let label = catalogue
                .entry(entry)
                .map(|e| e.name.as_str())
                .unwrap_or("?");
            println!("Resolved via {pass:?} to {label:?} (score {score:.3}), value {value}");
        }
        Resolution::NotFound(reason) => println!("Unresolved: {reason:?}"),
    }
    Ok(())
}

fn load_values(path: &Path) -> Result<PlayerValueCatalogue> {
    if path.is_dir() {
        load_catalogue_dir(path)
    } else {
        load_catalogue_file(path)
    }
}

fn parse_str_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}=")) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
