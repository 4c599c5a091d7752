//! Output formatting and persistence for rendered reports.
//!
//! Supports a plain-text report, JSON serialization of the view-model, and
//! CSV export of the filtered days.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fmt::{self, Display, Formatter};
use std::fs::File;
use std::io::Write;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::{debug, info};

use crate::aggregate::GroupMeans;
use crate::dataset::{Dataset, RentalRecord};
use crate::filter::{FilterSelection, filter};
use crate::insights::{Change, Insight, Ranking, direction};
use crate::report::DashboardView;

const USER_TYPES: &[&str] = &[
    "Casual users rent without a membership and mostly ride for recreation.",
    "Registered users hold a membership and mostly ride for daily or routine trips.",
];

const TREND_NOTES: &[&str] = &[
    "There is a clear seasonal pattern, with higher usage in the warm months (summer and fall).",
    "Registered users consistently outnumber casual users.",
];

const SEASON_NOTES: &[&str] = &[
    "Summer and fall show the most rentals, while spring is consistently the weakest season.",
    "Registered users are steadier across the year; casual users react more to the season.",
    "Warmer temperatures and better weather in summer and fall appear to drive the increase.",
];

const WEEKLY_NOTES: &[&str] = &[
    "Working days and weekends show clearly different usage patterns.",
    "Casual usage rises on weekends, which points to recreational riding.",
    "Registered usage peaks on working days, which points to commuting.",
    "The casual share is highest on weekends; the registered share dominates working days.",
];

const WEATHER_NOTES: &[&str] = &[
    "Weather has a significant impact on the number of rentals.",
    "Clear weather consistently yields the most rentals; rain reduces them drastically.",
    "Casual users are more sensitive to weather than registered users.",
    "Registered users keep riding across conditions, relying on bikes as primary transport.",
];

const CONCLUSIONS: &[&str] = &[
    "Casual users prefer weekends and holidays; registered users dominate working days.",
    "Fall and summer have the highest rentals; spring has the lowest.",
    "Weekly usage follows a clear pattern: casual riders on weekends, members Monday to Friday.",
    "Clear and cloudy days have the most rentals; rain cuts rentals sharply.",
];

const RECOMMENDATIONS: &[&str] = &[
    "Fleet distribution: more bikes near offices on working days, near parks on weekends.",
    "Marketing: weekday promotions for casual users and weekend loyalty programs for members.",
    "Seasonal planning: grow the fleet for summer and fall, schedule maintenance in spring.",
    "Weather: use forecasts to plan distribution and offer rain-day incentives.",
];

/// Formats an integer with `,` thousands separators.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn join<T: Display>(values: impl IntoIterator<Item = T>) -> String {
    let joined: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
    if joined.is_empty() {
        "(none)".to_string()
    } else {
        joined.join(", ")
    }
}

fn write_notes(f: &mut Formatter<'_>, notes: &[&str]) -> fmt::Result {
    for note in notes {
        writeln!(f, "- {note}")?;
    }
    Ok(())
}

/// One line of a grouped-means table.
#[derive(Debug, Tabled)]
struct TableRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Days")]
    days: usize,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Casual")]
    casual: String,
    #[tabled(rename = "Registered")]
    registered: String,
    #[tabled(rename = "Casual %")]
    casual_share: String,
    #[tabled(rename = "Registered %")]
    registered_share: String,
}

impl<K: Display> From<&GroupMeans<K>> for TableRow {
    fn from(row: &GroupMeans<K>) -> Self {
        TableRow {
            group: row.key.to_string(),
            days: row.days,
            total: format!("{:.2}", row.total),
            casual: format!("{:.2}", row.casual),
            registered: format!("{:.2}", row.registered),
            casual_share: format!("{:.1}%", row.casual_share),
            registered_share: format!("{:.1}%", row.registered_share),
        }
    }
}

fn write_table<K: Display>(
    f: &mut Formatter<'_>,
    title: &str,
    rows: &[GroupMeans<K>],
) -> fmt::Result {
    let mut table = Table::new(rows.iter().map(TableRow::from));
    table.with(Style::markdown());

    writeln!(f, "By {title}:")?;
    writeln!(f, "{table}")?;
    writeln!(f)
}

fn write_change(f: &mut Formatter<'_>, change: &Insight<Change>, context: &str) -> fmt::Result {
    match change {
        Insight::Available(change) => {
            writeln!(
                f,
                "- Casual users: {} of {:.1}% {context}",
                direction(change.casual),
                change.casual.abs()
            )?;
            writeln!(
                f,
                "- Registered users: {} of {:.1}% {context}",
                direction(change.registered),
                change.registered.abs()
            )
        }
        Insight::Placeholder(message) => writeln!(f, "{message}"),
    }
}

/// Writes best/worst lines for each user type. `with_decline` adds the drop
/// from the best to the worst group.
fn write_ranking<K: Display>(
    f: &mut Formatter<'_>,
    ranking: &Ranking<K>,
    unit: &str,
    with_decline: bool,
) -> fmt::Result {
    let groups = [
        ("Casual users", &ranking.casual),
        ("Registered users", &ranking.registered),
    ];
    for (name, ext) in groups {
        writeln!(f, "- {name}:")?;
        writeln!(
            f,
            "  * highest {unit} {} ({:.2}/day)",
            ext.highest.key,
            ext.highest_value()
        )?;
        writeln!(
            f,
            "  * lowest {unit} {} ({:.2}/day)",
            ext.lowest.key,
            ext.lowest_value()
        )?;
        if with_decline {
            writeln!(f, "  * decline: {:.1}%", ext.decline())?;
        }
    }
    Ok(())
}

/// Plain-text rendering of a [`DashboardView`].
pub struct TextReport<'a>(pub &'a DashboardView);

impl Display for TextReport<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let view = self.0;
        let headline = &view.headline;

        writeln!(f, "Bike Rental Report")?;
        writeln!(f, "==================")?;
        writeln!(
            f,
            "Filters: years {} | seasons {} | day types {}",
            join(&view.filters.years),
            join(&view.filters.seasons),
            join(&view.filters.day_types)
        )?;
        writeln!(f, "Days: {} of {}", view.filtered_days(), view.dataset_days)?;
        writeln!(f)?;
        writeln!(f, "Total rentals:    {}", thousands(headline.totals.total))?;
        writeln!(
            f,
            "Casual users:     {} ({:.1}% of total)",
            thousands(headline.totals.casual),
            headline.casual_share
        )?;
        writeln!(
            f,
            "Registered users: {} ({:.1}% of total)",
            thousands(headline.totals.registered),
            headline.registered_share
        )?;
        writeln!(f)?;
        write_notes(f, USER_TYPES)?;

        // Trend
        writeln!(f)?;
        writeln!(f, "## Usage over time")?;
        write_table(f, "period", &view.trend.table)?;
        match &view.trend.peak_and_lowest {
            Insight::Available(ext) => {
                let periods = [("Peak period", &ext.highest), ("Lowest period", &ext.lowest)];
                for (label, row) in periods {
                    writeln!(
                        f,
                        "{label}: {} ({:.2} rentals/day, casual {:.2}/day, registered {:.2}/day)",
                        row.key, row.total, row.casual, row.registered
                    )?;
                }
            }
            Insight::Placeholder(message) => writeln!(f, "{message}")?,
        }
        if let Some(trend) = view.trend.directions.available() {
            writeln!(
                f,
                "- Casual usage is {} over the displayed periods",
                trend.casual.label()
            )?;
            writeln!(
                f,
                "- Registered usage is {} over the displayed periods",
                trend.registered.label()
            )?;
            write_notes(f, TREND_NOTES)?;
        }

        // Day types
        let day_types = &view.day_types;
        writeln!(f)?;
        writeln!(f, "## Working days vs days off")?;
        write_table(f, "day type", &day_types.working_vs_weekend)?;
        write_change(
            f,
            &day_types.weekend_change,
            "on weekends/holidays compared to working days",
        )?;
        writeln!(f)?;
        write_table(f, "holiday", &day_types.regular_vs_holiday)?;
        write_change(
            f,
            &day_types.holiday_change,
            "on public holidays compared to regular days",
        )?;
        writeln!(f)?;
        match &day_types.conclusion {
            Insight::Available(lines) => write_notes(f, lines)?,
            Insight::Placeholder(message) => writeln!(f, "{message}")?,
        }

        // Seasons
        writeln!(f)?;
        writeln!(f, "## Seasons")?;
        write_table(f, "season", &view.seasons.table)?;
        match &view.seasons.ranking {
            Insight::Available(ranking) => {
                writeln!(
                    f,
                    "- Most rentals: {} ({:.2} rentals/day)",
                    ranking.total.highest.key,
                    ranking.total.highest_value()
                )?;
                writeln!(
                    f,
                    "- Fewest rentals: {} ({:.2} rentals/day)",
                    ranking.total.lowest.key,
                    ranking.total.lowest_value()
                )?;
                writeln!(f, "- Difference: {:.1}% higher", ranking.total.spread())?;
                write_ranking(f, ranking, "in", false)?;
                writeln!(
                    f,
                    "- The casual share is highest in {}, pointing to more recreational riding",
                    ranking.highest_casual_share
                )?;
                write_notes(f, SEASON_NOTES)?;
            }
            Insight::Placeholder(message) => writeln!(f, "{message}")?,
        }

        // Weekly
        writeln!(f)?;
        writeln!(f, "## Weekly pattern")?;
        write_table(f, "day", &view.weekly.table)?;
        match &view.weekly.ranking {
            Insight::Available(ranking) => {
                writeln!(
                    f,
                    "- Busiest day: {} with {:.2} rentals on average",
                    ranking.total.highest.key,
                    ranking.total.highest_value()
                )?;
                writeln!(
                    f,
                    "- Slowest day: {} with {:.2} rentals on average",
                    ranking.total.lowest.key,
                    ranking.total.lowest_value()
                )?;
                match &view.weekly.weekend_level {
                    Insight::Available(level) => writeln!(
                        f,
                        "- Weekends (Saturday-Sunday) show {} usage than weekdays",
                        if level.weekend_is_higher() { "higher" } else { "lower" }
                    )?,
                    Insight::Placeholder(message) => writeln!(f, "- {message}")?,
                }
                write_ranking(f, ranking, "on", false)?;
                write_notes(f, WEEKLY_NOTES)?;
            }
            Insight::Placeholder(message) => writeln!(f, "{message}")?,
        }

        // Weather
        writeln!(f)?;
        writeln!(f, "## Weather")?;
        write_table(f, "weather", &view.weather.table)?;
        match &view.weather.ranking {
            Insight::Available(ranking) => {
                writeln!(
                    f,
                    "- Best conditions for renting: {} ({:.2} rentals/day)",
                    ranking.total.highest.key,
                    ranking.total.highest_value()
                )?;
                writeln!(
                    f,
                    "- Worst conditions for renting: {} ({:.2} rentals/day)",
                    ranking.total.lowest.key,
                    ranking.total.lowest_value()
                )?;
                writeln!(f, "- Decline: {:.1}% from best to worst", ranking.total.decline())?;
                write_ranking(f, ranking, "when", true)?;
                writeln!(
                    f,
                    "- The casual share is highest when {}, so good weather draws leisure riders",
                    ranking.highest_casual_share
                )?;
                write_notes(f, WEATHER_NOTES)?;
            }
            Insight::Placeholder(message) => writeln!(f, "{message}")?,
        }

        writeln!(f)?;
        writeln!(f, "## Conclusions")?;
        write_notes(f, CONCLUSIONS)?;
        writeln!(f)?;
        writeln!(f, "## Recommendations")?;
        write_notes(f, RECOMMENDATIONS)
    }
}

/// Serializes the view-model as pretty-printed JSON.
pub fn to_json(view: &DashboardView) -> Result<String> {
    Ok(serde_json::to_string_pretty(view)?)
}

/// Logs the headline numbers of a rendered view.
pub fn log_summary(view: &DashboardView) {
    info!(
        days = view.filtered_days(),
        dataset_days = view.dataset_days,
        total = view.headline.totals.total,
        casual_share = view.headline.casual_share,
        "Report rendered"
    );
}

/// File written by `export` when no path is given.
pub const DEFAULT_EXPORT_PATH: &str = "bike_rental_filtered.csv";

/// Default export path, with `.gz` appended for gzip output.
pub fn default_export_path(gzip: bool) -> String {
    if gzip {
        format!("{DEFAULT_EXPORT_PATH}.gz")
    } else {
        DEFAULT_EXPORT_PATH.to_string()
    }
}

/// Writes the header and the verbatim rows of `subset` as CSV.
pub fn write_rows<W: Write>(writer: W, dataset: &Dataset, subset: &[&RentalRecord]) -> Result<()> {
    let mut csv = WriterBuilder::new().from_writer(writer);

    csv.write_record(dataset.headers())?;
    for record in subset {
        csv.write_record(record.raw())?;
    }
    csv.flush()?;

    Ok(())
}

/// Exports the days matching `filters` to `path`, with the dataset's own
/// header and column order. Returns the number of rows written.
pub fn export_csv(
    path: &str,
    dataset: &Dataset,
    filters: &FilterSelection,
    gzip: bool,
) -> Result<usize> {
    let subset = filter(dataset.records(), filters);
    debug!(path, gzip, rows = subset.len(), "Exporting filtered rows");

    let file = File::create(path).with_context(|| format!("failed to create '{path}'"))?;
    if gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        write_rows(&mut encoder, dataset, &subset)?;
        encoder.finish()?;
    } else {
        write_rows(file, dataset, &subset)?;
    }

    info!(path, rows = subset.len(), "Filtered data exported");
    Ok(subset.len())
}
