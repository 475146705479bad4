/*!
chartdeck Command Line Interface

Runs the dashboard pipeline against local files: inspect a dataset, print
its numeric summary, export filtered rows, and render chart figures or a
full PDF report.
*/

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chartdeck::dataset::summarize;
use chartdeck::filter::{to_csv_bytes, FilterSelection};
use chartdeck::{build_figures, load_dataset, render_report, ChartSpec, Dataset, Theme, VERSION};

#[derive(Parser)]
#[command(name = "chartdeck")]
#[command(about = "Upload, filter and visualize tabular data, then export a PDF report")]
#[command(version = VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a data file and show its shape, column roles and first rows
    Inspect {
        /// Path to the data file (.csv, .xls, .xlsx, .json or .txt)
        file: PathBuf,

        /// How many leading rows to show
        #[arg(long, default_value = "10")]
        rows: usize,
    },

    /// Print summary statistics for every numeric column
    Summary {
        /// Path to the data file
        file: PathBuf,
    },

    /// Filter rows by categorical values and write the result as CSV
    Filter {
        /// Path to the data file
        file: PathBuf,

        /// Keep only these values of a column, as column=v1,v2 (repeatable)
        #[arg(long = "select")]
        selections: Vec<String>,

        /// Output CSV path
        #[arg(long)]
        output: PathBuf,
    },

    /// Render chart figures to numbered PNG files
    Render {
        /// Path to the data file
        file: PathBuf,

        /// Path to a JSON array of chart specs
        #[arg(long)]
        charts: PathBuf,

        /// Directory for the rendered chart-XX.png files
        #[arg(long)]
        out_dir: PathBuf,

        /// Figure styling (light or dark)
        #[arg(long, default_value = "light")]
        theme: Theme,

        /// Keep only these values of a column, as column=v1,v2 (repeatable)
        #[arg(long = "select")]
        selections: Vec<String>,
    },

    /// Render chart figures and assemble them into a PDF report
    Report {
        /// Path to the data file
        file: PathBuf,

        /// Path to a JSON array of chart specs
        #[arg(long)]
        charts: PathBuf,

        /// Output PDF path
        #[arg(long)]
        output: PathBuf,

        /// Figure styling (light or dark)
        #[arg(long, default_value = "light")]
        theme: Theme,

        /// Keep only these values of a column, as column=v1,v2 (repeatable)
        #[arg(long = "select")]
        selections: Vec<String>,
    },
}

/// Parse one --select flag of the form column=v1,v2.
fn parse_selection(raw: &str) -> anyhow::Result<(String, Vec<String>)> {
    let (column, values) = raw
        .split_once('=')
        .with_context(|| format!("--select needs column=v1,v2, got \"{raw}\""))?;
    let values = values.split(',').map(|v| v.trim().to_string()).collect();
    Ok((column.trim().to_string(), values))
}

fn selection_from_flags(flags: &[String]) -> anyhow::Result<FilterSelection> {
    let mut selection = FilterSelection::empty();
    for flag in flags {
        let (column, values) = parse_selection(flag)?;
        selection.set(column, values);
    }
    Ok(selection)
}

fn load_file(path: &Path) -> anyhow::Result<Dataset> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid file name: {}", path.display()))?;
    let bytes =
        std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    Ok(load_dataset(name, &bytes)?)
}

/// The dataset narrowed by the given --select flags; no flags keep every row.
fn narrowed(dataset: &Dataset, flags: &[String]) -> anyhow::Result<Dataset> {
    let selection = selection_from_flags(flags)?;
    Ok(selection.apply(dataset)?)
}

fn read_chart_specs(path: &Path) -> anyhow::Result<Vec<ChartSpec>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let specs = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid chart spec list", path.display()))?;
    Ok(specs)
}

fn fmt_stat(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.4}"),
        None => "-".to_string(),
    }
}

fn cmd_inspect(file: &Path, rows: usize) -> anyhow::Result<()> {
    let dataset = load_file(file)?;

    println!("File: {}", file.display());
    println!(
        "Shape: {} row(s) x {} column(s)",
        dataset.height(),
        dataset.width()
    );
    println!("\nColumn roles:");
    for (column, role) in dataset.roles() {
        println!("  {:<24} {}", column, role);
    }
    println!("\nFirst {} row(s):", rows.min(dataset.height()));
    println!("{}", dataset.head(rows));

    Ok(())
}

fn cmd_summary(file: &Path) -> anyhow::Result<()> {
    let dataset = load_file(file)?;
    let summaries = summarize(&dataset)?;

    if summaries.is_empty() {
        println!("No numeric columns in {}", file.display());
        return Ok(());
    }

    println!(
        "{:<24} {:>8} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    for s in &summaries {
        println!(
            "{:<24} {:>8} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
            s.column,
            s.count,
            fmt_stat(s.mean),
            fmt_stat(s.std),
            fmt_stat(s.min),
            fmt_stat(s.q25),
            fmt_stat(s.median),
            fmt_stat(s.q75),
            fmt_stat(s.max),
        );
    }

    Ok(())
}

fn cmd_filter(file: &Path, flags: &[String], output: &Path) -> anyhow::Result<()> {
    let dataset = load_file(file)?;
    let result = narrowed(&dataset, flags)?;
    let csv = to_csv_bytes(&result)?;

    std::fs::write(output, &csv)
        .with_context(|| format!("cannot write {}", output.display()))?;
    println!(
        "Kept {} of {} row(s), written to {}",
        result.height(),
        dataset.height(),
        output.display()
    );

    Ok(())
}

fn cmd_render(
    file: &Path,
    charts: &Path,
    out_dir: &Path,
    theme: Theme,
    flags: &[String],
) -> anyhow::Result<()> {
    let dataset = load_file(file)?;
    let result = narrowed(&dataset, flags)?;
    let specs = read_chart_specs(charts)?;
    let figures = build_figures(&result, &specs, theme)?;

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("cannot create {}", out_dir.display()))?;
    for (i, figure) in figures.iter().enumerate() {
        let path = out_dir.join(format!("chart-{:02}.png", i + 1));
        std::fs::write(&path, &figure.png)
            .with_context(|| format!("cannot write {}", path.display()))?;
        println!(
            "Wrote {} ({}x{}, \"{}\")",
            path.display(),
            figure.width,
            figure.height,
            figure.caption
        );
    }

    Ok(())
}

fn cmd_report(
    file: &Path,
    charts: &Path,
    output: &Path,
    theme: Theme,
    flags: &[String],
) -> anyhow::Result<()> {
    let dataset = load_file(file)?;
    let result = narrowed(&dataset, flags)?;
    let specs = read_chart_specs(charts)?;
    let figures = build_figures(&result, &specs, theme)?;
    let pdf = render_report(&figures)?;

    std::fs::write(output, &pdf)
        .with_context(|| format!("cannot write {}", output.display()))?;
    println!(
        "Report with {} page(s) written to {}",
        figures.len(),
        output.display()
    );

    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chartdeck=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { file, rows } => cmd_inspect(&file, rows),
        Commands::Summary { file } => cmd_summary(&file),
        Commands::Filter {
            file,
            selections,
            output,
        } => cmd_filter(&file, &selections, &output),
        Commands::Render {
            file,
            charts,
            out_dir,
            theme,
            selections,
        } => cmd_render(&file, &charts, &out_dir, theme, &selections),
        Commands::Report {
            file,
            charts,
            output,
            theme,
            selections,
        } => cmd_report(&file, &charts, &output, theme, &selections),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const STAFF_CSV: &[u8] = b"dept,salary\nSales,50000\nEngineering,60000\nSales,52000\n";

    #[test]
    fn test_parse_selection_splits_column_and_values() {
        let (column, values) = parse_selection("dept=Sales,Engineering").unwrap();
        assert_eq!(column, "dept");
        assert_eq!(values, vec!["Sales", "Engineering"]);

        let (column, values) = parse_selection("dept = Sales , HR").unwrap();
        assert_eq!(column, "dept");
        assert_eq!(values, vec!["Sales", "HR"]);
    }

    #[test]
    fn test_parse_selection_without_equals_fails() {
        let err = parse_selection("dept").unwrap_err();
        assert!(err.to_string().contains("--select"));
    }

    #[test]
    fn test_filter_command_writes_csv() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("staff.csv");
        std::fs::write(&input, STAFF_CSV).unwrap();
        let output = dir.path().join("filtered.csv");

        cmd_filter(&input, &["dept=Sales".to_string()], &output).unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text, "dept,salary\nSales,50000\nSales,52000\n");
    }

    #[test]
    fn test_filter_on_unknown_column_fails() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("staff.csv");
        std::fs::write(&input, STAFF_CSV).unwrap();
        let output = dir.path().join("filtered.csv");

        let err = cmd_filter(&input, &["city=Berlin".to_string()], &output).unwrap_err();
        assert!(err.to_string().contains("unknown column"));
        assert!(!output.exists());
    }

    #[test]
    fn test_render_command_writes_numbered_pngs() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("staff.csv");
        std::fs::write(&input, STAFF_CSV).unwrap();
        let charts = dir.path().join("charts.json");
        std::fs::write(
            &charts,
            r#"[{"kind": "bar", "column": "dept", "caption": "Headcount"},
                {"kind": "histogram", "column": "salary"}]"#,
        )
        .unwrap();
        let out_dir = dir.path().join("figures");

        cmd_render(&input, &charts, &out_dir, Theme::Light, &[]).unwrap();

        let first = std::fs::read(out_dir.join("chart-01.png")).unwrap();
        let second = std::fs::read(out_dir.join("chart-02.png")).unwrap();
        assert!(first.starts_with(b"\x89PNG\r\n\x1a\n"));
        assert!(second.starts_with(b"\x89PNG\r\n\x1a\n"));
        assert!(!out_dir.join("chart-03.png").exists());
    }

    #[test]
    fn test_report_command_writes_pdf() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("staff.csv");
        std::fs::write(&input, STAFF_CSV).unwrap();
        let charts = dir.path().join("charts.json");
        std::fs::write(&charts, r#"[{"kind": "pie", "column": "dept"}]"#).unwrap();
        let output = dir.path().join("report.pdf");

        cmd_report(&input, &charts, &output, Theme::Dark, &[]).unwrap();

        let pdf = std::fs::read(&output).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_chart_specs_file_must_be_json() {
        let dir = tempdir().unwrap();
        let charts = dir.path().join("charts.json");
        std::fs::write(&charts, "not json").unwrap();

        let err = read_chart_specs(&charts).unwrap_err();
        assert!(err.to_string().contains("chart spec list"));
    }
}
