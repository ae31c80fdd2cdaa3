//! On-demand visualization of stored scores.
//!
//! Reads the whole table, averages per category and writes an SVG bar chart
//! and/or a CSV summary.

use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::{info, warn};

use crate::db::Database;
use crate::error::{PipelineError, Result};
use crate::logging::OperationTimer;
use crate::models::CategorySummary;
use crate::sentiment::{MAX_SCORE, MIN_SCORE};

/// Chart title
pub const CHART_TITLE: &str = "Average Sentiment by Category - Winter Activities";

/// Which report files to write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    /// SVG histogram only
    Svg,
    /// CSV summary only
    Csv,
    /// Both files
    #[default]
    Both,
}

fn chart_error(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Chart(e.to_string())
}

/// Render one bar per category showing its average score
pub fn render_histogram(summaries: &[CategorySummary], path: &Path) -> Result<()> {
    if summaries.is_empty() {
        return Err(PipelineError::Chart("no scores to plot".to_string()));
    }

    let labels: Vec<String> = summaries.iter().map(|s| s.category.to_string()).collect();
    let bars = u32::try_from(summaries.len()).map_err(chart_error)?;

    let root = SVGBackend::new(path, (1200, 640)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(CHART_TITLE, ("sans-serif", 28).into_font())
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(60)
        .build_cartesian_2d((0u32..bars).into_segmented(), MIN_SCORE..MAX_SCORE)
        .map_err(chart_error)?;

    let label_for = |value: &SegmentValue<u32>| match value {
        SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
            labels.get(*i as usize).cloned().unwrap_or_default()
        },
        SegmentValue::Last => String::new(),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Category")
        .y_desc("Average Sentiment")
        .x_label_formatter(&label_for)
        .draw()
        .map_err(chart_error)?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(BLUE.mix(0.6).filled())
                .margin(12)
                .data((0u32..).zip(summaries.iter().map(|s| s.average_score))),
        )
        .map_err(chart_error)?;

    chart
        .draw_series((0u32..).zip(summaries.iter()).map(|(i, s)| {
            Text::new(
                format!("{:.2}", s.average_score),
                (SegmentValue::CenterOf(i), s.average_score.max(0.0) + 0.04),
                ("sans-serif", 14).into_font(),
            )
        }))
        .map_err(chart_error)?;

    root.present().map_err(chart_error)?;
    Ok(())
}

/// Write `category,group,count,average,min,max` rows
pub fn write_summary_csv(summaries: &[CategorySummary], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["category", "group", "count", "average", "min", "max"])?;

    for summary in summaries {
        writer.write_record([
            summary.category.as_str().to_string(),
            summary.category.group().to_string(),
            summary.count.to_string(),
            format!("{:.4}", summary.average_score),
            format!("{:.4}", summary.min_score),
            format!("{:.4}", summary.max_score),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Query the store and write the requested report files
///
/// The CSV goes next to `output` with a `.csv` extension. Returns the paths
/// written; an empty store writes nothing.
pub fn generate_report(db: &Database, output: &Path, format: ReportFormat) -> Result<Vec<PathBuf>> {
    let timer = OperationTimer::new("generate_report");
    let summaries = db.category_summaries()?;

    if summaries.is_empty() {
        warn!("No stored scores yet, nothing to report");
        return Ok(Vec::new());
    }

    for summary in &summaries {
        info!(
            category = %summary.category,
            count = summary.count,
            average = summary.average_score,
            "Category summary"
        );
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut written = Vec::new();
    if matches!(format, ReportFormat::Svg | ReportFormat::Both) {
        render_histogram(&summaries, output)?;
        written.push(output.to_path_buf());
    }
    if matches!(format, ReportFormat::Csv | ReportFormat::Both) {
        let csv_path = output.with_extension("csv");
        write_summary_csv(&summaries, &csv_path)?;
        written.push(csv_path);
    }

    timer.finish();
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn summary(category: Category, average: f64) -> CategorySummary {
        CategorySummary {
            category,
            count: 2,
            average_score: average,
            min_score: average - 0.1,
            max_score: average + 0.1,
        }
    }

    #[test]
    fn test_csv_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        write_summary_csv(&[summary(Category::IceFishing, 0.25)], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("category,group,count,average,min,max"));
        assert_eq!(lines.next(), Some("ice_fishing,outdoor recreation,2,0.2500,0.1500,0.3500"));
    }

    #[test]
    fn test_histogram_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        render_histogram(&[summary(Category::Skating, 0.5), summary(Category::Museum, -0.3)], &path).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("skating"));
    }

    #[test]
    fn test_empty_histogram_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(render_histogram(&[], &dir.path().join("empty.svg")).is_err());
    }
}
