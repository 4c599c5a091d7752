//! CLI entry point for the bike rental report.
//!
//! Provides subcommands for printing the filtered dashboard report, exporting
//! the filtered days, drawing charts, and listing the available filter values.

use anyhow::Result;
use bike_rental_report::{
    charts::write_charts,
    dataset::Dataset,
    domain::{DayType, Season},
    filter::FilterSelection,
    output::{TextReport, default_export_path, export_csv, log_summary, to_json},
    report::render,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bike_rental_report")]
#[command(about = "Filtered usage report for daily bike rental data", long_about = None)]
struct Cli {
    /// Path or URL of the daily rental CSV (optionally gzip-compressed)
    #[arg(long, global = true, env = "BIKE_RENTAL_DATA", default_value = "main_data.csv")]
    data: String,

    #[command(subcommand)]
    command: Commands,
}

/// Filter values. An omitted flag selects every value in the dataset.
#[derive(Args)]
struct FilterArgs {
    /// Years to include (e.g. 2011,2012)
    #[arg(long = "year", value_delimiter = ',')]
    years: Vec<i32>,

    /// Seasons to include (Spring, Summer, Fall, Winter)
    #[arg(long = "season", value_delimiter = ',')]
    seasons: Vec<Season>,

    /// Day types to include ("Working Day", "Weekend/Holiday")
    #[arg(long = "day-type", value_delimiter = ',')]
    day_types: Vec<DayType>,
}

impl FilterArgs {
    fn selection(&self, dataset: &Dataset) -> FilterSelection {
        FilterSelection::or_all(dataset, &self.years, &self.seasons, &self.day_types)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the dashboard report for a filter selection
    Report {
        #[command(flatten)]
        filters: FilterArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Export the filtered days as CSV with the input's columns
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// CSV file to write [default: bike_rental_filtered.csv, plus .gz with --gzip]
        #[arg(short, long)]
        output: Option<String>,

        /// Gzip compress the exported file
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Draw the report charts as SVG files
    Charts {
        #[command(flatten)]
        filters: FilterArgs,

        /// Directory to write the SVG files into
        #[arg(short = 'd', long, default_value = "charts")]
        output_dir: PathBuf,
    },
    /// List the filter values present in the dataset
    Options,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/bike_rental_report.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bike_rental_report.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let dataset = Dataset::load(&cli.data)?;

    match cli.command {
        Commands::Report { filters, format } => {
            let view = render(&dataset, &filters.selection(&dataset));
            log_summary(&view);

            match format {
                Format::Text => print!("{}", TextReport(&view)),
                Format::Json => println!("{}", to_json(&view)?),
            }
        }
        Commands::Export {
            filters,
            output,
            gzip,
        } => {
            let output = output.unwrap_or_else(|| default_export_path(gzip));
            let rows = export_csv(&output, &dataset, &filters.selection(&dataset), gzip)?;
            println!("Exported {rows} days to {output}");
        }
        Commands::Charts {
            filters,
            output_dir,
        } => {
            let view = render(&dataset, &filters.selection(&dataset));
            for path in write_charts(&view, &output_dir)? {
                println!("{}", path.display());
            }
        }
        Commands::Options => {
            let years: Vec<String> = dataset.years().iter().map(i32::to_string).collect();
            let seasons: Vec<&str> = dataset.seasons().iter().map(|s| s.label()).collect();
            let day_types: Vec<&str> = dataset.day_types().iter().map(|d| d.label()).collect();

            info!(
                days = dataset.len(),
                years = years.len(),
                seasons = seasons.len(),
                "Filter options listed"
            );

            println!("Years:     {}", years.join(", "));
            println!("Seasons:   {}", seasons.join(", "));
            println!("Day types: {}", day_types.join(", "));
        }
    }

    Ok(())
}
