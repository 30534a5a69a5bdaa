use std::fs;
use std::path::PathBuf;

use match_features::config::PipelineConfig;
use match_features::export::{write_features_csv, write_features_xlsx};
use match_features::features::FeatureColumns;
use match_features::lineups::LineupCatalogue;
use match_features::market_values::load_catalogue_dir;
use match_features::match_record::{TeamAliases, load_matches_csv};
use match_features::pipeline::FeaturePipeline;

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn fixture_rows() -> (FeatureColumns, Vec<match_features::features::FeatureRow>) {
    let aliases = TeamAliases::load_json(&fixture("aliases.json")).unwrap();
    let matches = load_matches_csv(&fixture("matches.csv"), &aliases).unwrap();
    let values = load_catalogue_dir(&fixture("values")).unwrap();
    let lineups = LineupCatalogue::load_csv(&fixture("lineups.csv"), &aliases).unwrap();
    let config = PipelineConfig::default();
    let rows = FeaturePipeline::new(config)
        .with_values(&values)
        .with_lineups(&lineups)
        .run(matches);
    (FeatureColumns::detect(&rows, config.form.window), rows)
}

#[test]
fn csv_export_writes_header_and_one_line_per_match() {
    let (columns, rows) = fixture_rows();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("features.csv");
    let report = write_features_csv(&path, &columns, &rows).unwrap();
    assert_eq!(report.rows, 3);

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), report.columns);
    let names = headers.iter().collect::<Vec<_>>();
    assert_eq!(&names[..4], &["Div", "Date", "HomeTeam", "AwayTeam"]);
    for name in [
        "Season",
        "elo_diff",
        "home_avg_goals_scored_7",
        "away_avg_reds_7",
        "goal_diff_form_home",
        "discipline_index_away",
        "B365H_prob",
        "prob_fav_margin",
        "home_team_value",
        "away_lineup_coverage",
    ] {
        assert!(names.contains(&name), "missing column {name}");
    }

    let records = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(records.len(), 3);
    let col = |name: &str| names.iter().position(|h| *h == name).unwrap();
    assert_eq!(&records[0][col("Date")], "2022-08-13");
    assert_eq!(&records[0][col("home_team_value")], "12500000");
    assert_eq!(&records[1][col("elo_diff")], "-20");
    // Window not yet filled, lineup not supplied: both blank.
    assert_eq!(&records[1][col("home_avg_goals_scored_7")], "");
    assert_eq!(&records[1][col("home_team_value")], "");
}

#[test]
fn xlsx_export_saves_a_workbook() {
    let (columns, rows) = fixture_rows();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("features.xlsx");
    let report = write_features_xlsx(&path, &columns, &rows).unwrap();
    assert_eq!(report.rows, rows.len());
    assert_eq!(report.columns, columns.headers().len());
    let meta = fs::metadata(&path).unwrap();
    assert!(meta.len() > 0);
}
