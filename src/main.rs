use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::info;
use tracing_subscriber::EnvFilter;

use match_features::config::PipelineConfig;
use match_features::export::{write_features_csv, write_features_xlsx};
use match_features::features::FeatureColumns;
use match_features::lineups::LineupCatalogue;
use match_features::market_values::{
    PlayerValueCatalogue, load_catalogue_dir, load_catalogue_file,
};
use match_features::match_record::{
    MatchRecord, TeamAliases, load_matches_csv, load_matches_dir,
};
use match_features::pipeline::{FeaturePipeline, PassState};

const DEFAULT_OUT: &str = "features.csv";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches_path = parse_path_arg("--matches")
        .or_else(|| std::env::var("FEATURES_MATCHES").ok().map(PathBuf::from))
        .context("missing --matches <file-or-dir>")?;
    let out_path = parse_path_arg("--out").unwrap_or_else(|| PathBuf::from(DEFAULT_OUT));

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut config = PipelineConfig::from_env_and_args(&args);
    if has_flag("--sequential") {
        config.parallel_lineups = false;
    }

    let aliases = match parse_path_arg("--aliases") {
        Some(path) => TeamAliases::load_json(&path)?,
        None => TeamAliases::default(),
    };
    let matches = load_matches(&matches_path, &aliases)?;
    if matches.is_empty() {
        return Err(anyhow!("no matches found in {}", matches_path.display()));
    }

    let values = parse_path_arg("--values")
        .map(|path| load_values(&path))
        .transpose()?;
    let lineups = parse_path_arg("--lineups")
        .map(|path| LineupCatalogue::load_csv(&path, &aliases))
        .transpose()?;

    let mut pipeline = FeaturePipeline::new(config);
    if let Some(values) = values.as_ref() {
        pipeline = pipeline.with_values(values);
    }
    if let Some(lineups) = lineups.as_ref() {
        pipeline = pipeline.with_lineups(lineups);
    }

    let rows = if has_flag("--presorted") {
        pipeline.run_presorted(matches, &mut PassState::default())?.0
    } else {
        pipeline.run(matches)
    };

    let columns = FeatureColumns::detect(&rows, config.form.window);
    let report = write_features_csv(&out_path, &columns, &rows)?;
    info!(
        rows = report.rows,
        columns = report.columns,
        path = %out_path.display(),
        "wrote feature table"
    );
    if let Some(xlsx_path) = parse_path_arg("--xlsx") {
        write_features_xlsx(&xlsx_path, &columns, &rows)?;
        info!(path = %xlsx_path.display(), "wrote workbook");
    }

    println!("Feature table complete");
    println!("Matches: {}", report.rows);
    println!("Columns: {}", report.columns);
    println!("Output: {}", out_path.display());
    Ok(())
}

fn load_matches(path: &Path, aliases: &TeamAliases) -> Result<Vec<MatchRecord>> {
    if path.is_dir() {
        load_matches_dir(path, aliases)
    } else {
        load_matches_csv(path, aliases)
    }
}

fn load_values(path: &Path) -> Result<PlayerValueCatalogue> {
    if path.is_dir() {
        load_catalogue_dir(path)
    } else {
        load_catalogue_file(path)
    }
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&format!("{name}=")) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}
