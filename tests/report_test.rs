//! Report generation from a populated store

use chrono::NaiveDate;

use winter_stream::report::{generate_report, ReportFormat, CHART_TITLE};
use winter_stream::{Category, Database, ScoreRecord};

fn populated() -> Database {
    let db = Database::open_in_memory().unwrap();
    let timestamp = NaiveDate::from_ymd_opt(2025, 1, 29).unwrap().and_hms_opt(9, 0, 0).unwrap();

    for (author, category, score) in [
        ("Prince", Category::Skating, 0.6),
        ("Bob", Category::Skating, 0.2),
        ("Judy", Category::Museum, -0.4),
        ("Walter", Category::BoatShow, 0.0),
    ] {
        db.insert_score(&ScoreRecord {
            author: author.to_string(),
            category,
            sentiment_score: score,
            timestamp,
        })
        .unwrap();
    }
    db
}

#[test]
fn test_both_formats() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("reports").join("chart.svg");

    let written = generate_report(&populated(), &output, ReportFormat::Both).unwrap();
    assert_eq!(written, vec![output.clone(), output.with_extension("csv")]);

    let svg = std::fs::read_to_string(&output).unwrap();
    assert!(svg.contains(CHART_TITLE));

    let csv = std::fs::read_to_string(output.with_extension("csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[1], "boat_show,events,1,0.0000,0.0000,0.0000");
    assert_eq!(lines[2], "museum,indoor activities,1,-0.4000,-0.4000,-0.4000");
    assert_eq!(lines[3], "skating,winter sports,2,0.4000,0.2000,0.6000");
}

#[test]
fn test_csv_only() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("chart.svg");

    let written = generate_report(&populated(), &output, ReportFormat::Csv).unwrap();
    assert_eq!(written, vec![output.with_extension("csv")]);
    assert!(!output.exists());
}

#[test]
fn test_empty_store_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("chart.svg");
    let db = Database::open_in_memory().unwrap();

    assert!(generate_report(&db, &output, ReportFormat::Both).unwrap().is_empty());
    assert!(!output.exists());
}
