//! SVG charts for each report section.
//!
//! Every chart shares one layout: categories on the x axis at integer
//! positions, values on the y axis. Category labels are mapped back from the
//! x key points.

use anyhow::{Context, Result};
use plotters::prelude::*;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::aggregate::{GroupMeans, Measure};
use crate::report::DashboardView;

const SIZE: (u32, u32) = (1000, 600);

const TOTAL_COLOR: RGBColor = RGBColor(54, 144, 192);
const CASUAL_COLOR: RGBColor = RGBColor(240, 173, 78);
const REGISTERED_COLOR: RGBColor = RGBColor(92, 184, 92);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Lines,
    GroupedBars,
    /// Bars stacked in series order, first series at the bottom.
    StackedBars,
}

#[derive(Debug, Clone)]
pub struct Series {
    pub name: &'static str,
    pub values: Vec<f64>,
    pub color: RGBColor,
}

#[derive(Debug, Clone)]
pub struct Chart {
    pub title: String,
    pub y_desc: &'static str,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

/// Label for an x key point, or an empty string between categories.
fn category_label(labels: &[String], x: f64) -> String {
    let rounded = x.round();
    if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

impl Chart {
    fn y_max(&self) -> f64 {
        let peak = match self.kind {
            ChartKind::StackedBars => (0..self.labels.len())
                .map(|i| self.series.iter().filter_map(|s| s.values.get(i)).sum::<f64>())
                .fold(0.0, f64::max),
            _ => self
                .series
                .iter()
                .flat_map(|s| s.values.iter().copied())
                .fold(0.0, f64::max),
        };
        if peak > 0.0 { peak * 1.1 } else { 1.0 }
    }

    /// Draws the chart into an SVG document.
    pub fn to_svg(&self) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, SIZE).into_drawing_area();
            root.fill(&WHITE)?;

            let n = self.labels.len().max(1);
            let mut chart = ChartBuilder::on(&root)
                .caption(&self.title, ("sans-serif", 24.0))
                .margin(20)
                .x_label_area_size(40)
                .y_label_area_size(70)
                .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..self.y_max())?;

            let formatter = |x: &f64| category_label(&self.labels, *x);
            {
                let mut mesh = chart.configure_mesh();
                if self.kind != ChartKind::Lines {
                    mesh.disable_x_mesh();
                }
                mesh.x_labels(n)
                    .x_label_formatter(&formatter)
                    .y_desc(self.y_desc)
                    .draw()?;
            }

            let bar_width = 0.8 / self.series.len().max(1) as f64;
            let mut bases = vec![0.0; self.labels.len()];

            for (idx, series) in self.series.iter().enumerate() {
                let color = series.color;
                match self.kind {
                    ChartKind::Lines => {
                        let points: Vec<(f64, f64)> =
                            series.values.iter().enumerate().map(|(i, v)| (i as f64, *v)).collect();
                        chart
                            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?
                            .label(series.name)
                            .legend(move |(x, y)| {
                                PathElement::new(vec![(x, y), (x + 20, y)], color)
                            });
                        chart.draw_series(
                            points.into_iter().map(|p| Circle::new(p, 3, color.filled())),
                        )?;
                    }
                    ChartKind::GroupedBars => {
                        let offset = -0.4 + idx as f64 * bar_width;
                        chart
                            .draw_series(series.values.iter().enumerate().map(|(i, v)| {
                                let x0 = i as f64 + offset;
                                Rectangle::new([(x0, 0.0), (x0 + bar_width, *v)], color.filled())
                            }))?
                            .label(series.name)
                            .legend(move |(x, y)| {
                                Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                            });
                    }
                    ChartKind::StackedBars => {
                        let bars: Vec<_> = series
                            .values
                            .iter()
                            .zip(bases.iter_mut())
                            .enumerate()
                            .map(|(i, (v, base))| {
                                let bottom = *base;
                                *base += *v;
                                let x = i as f64;
                                let corners = [(x - 0.3, bottom), (x + 0.3, *base)];
                                Rectangle::new(corners, color.filled())
                            })
                            .collect();
                        chart
                            .draw_series(bars)?
                            .label(series.name)
                            .legend(move |(x, y)| {
                                Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                            });
                    }
                }
            }

            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
            root.present()?;
        }
        Ok(svg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let svg = self.to_svg().with_context(|| format!("failed to draw '{}'", self.title))?;
        fs::write(path, svg).with_context(|| format!("failed to write {}", path.display()))?;
        debug!(path = %path.display(), "Chart written");
        Ok(())
    }
}

fn labels<K: Display>(table: &[GroupMeans<K>]) -> Vec<String> {
    table.iter().map(|row| row.key.to_string()).collect()
}

fn measure_series<K>(table: &[GroupMeans<K>], measures: &[Measure]) -> Vec<Series> {
    measures
        .iter()
        .map(|&measure| {
            let color = match measure {
                Measure::Total => TOTAL_COLOR,
                Measure::Casual => CASUAL_COLOR,
                Measure::Registered => REGISTERED_COLOR,
            };
            Series {
                name: measure.label(),
                values: table.iter().map(|row| measure.of(row)).collect(),
                color,
            }
        })
        .collect()
}

fn share_series<K>(table: &[GroupMeans<K>]) -> Vec<Series> {
    vec![
        Series {
            name: "Registered %",
            values: table.iter().map(|row| row.registered_share).collect(),
            color: REGISTERED_COLOR,
        },
        Series {
            name: "Casual %",
            values: table.iter().map(|row| row.casual_share).collect(),
            color: CASUAL_COLOR,
        },
    ]
}

fn chart<K: Display>(
    title: &str,
    y_desc: &'static str,
    kind: ChartKind,
    table: &[GroupMeans<K>],
    series: Vec<Series>,
) -> Chart {
    Chart {
        title: title.to_string(),
        y_desc,
        kind,
        labels: labels(table),
        series,
    }
}

/// All charts of the dashboard, keyed by file name.
pub fn dashboard_charts(view: &DashboardView) -> Vec<(&'static str, Chart)> {
    use Measure::{Casual, Registered, Total};

    let trend = &view.trend.table;
    let day_types = &view.day_types.working_vs_weekend;
    let holidays = &view.day_types.regular_vs_holiday;
    let seasons = &view.seasons.table;
    let days = &view.weekly.table;
    let weather = &view.weather.table;

    vec![
        (
            "monthly_trend.svg",
            chart(
                "Average daily rentals per month",
                "Average rentals",
                ChartKind::Lines,
                trend,
                measure_series(trend, &[Total, Casual, Registered]),
            ),
        ),
        (
            "day_type.svg",
            chart(
                "Working days vs weekends/holidays",
                "Average users",
                ChartKind::GroupedBars,
                day_types,
                measure_series(day_types, &[Casual, Registered]),
            ),
        ),
        (
            "holiday.svg",
            chart(
                "Regular days vs public holidays",
                "Average users",
                ChartKind::GroupedBars,
                holidays,
                measure_series(holidays, &[Casual, Registered]),
            ),
        ),
        (
            "season.svg",
            chart(
                "Average daily rentals by season",
                "Average rentals per day",
                ChartKind::GroupedBars,
                seasons,
                measure_series(seasons, &[Total, Casual, Registered]),
            ),
        ),
        (
            "season_share.svg",
            chart(
                "Casual vs registered share by season",
                "Percent",
                ChartKind::StackedBars,
                seasons,
                share_series(seasons),
            ),
        ),
        (
            "weekday.svg",
            chart(
                "Usage across the week",
                "Average rentals",
                ChartKind::Lines,
                days,
                measure_series(days, &[Total, Casual, Registered]),
            ),
        ),
        (
            "weekday_share.svg",
            chart(
                "User type share by day",
                "Percent",
                ChartKind::StackedBars,
                days,
                share_series(days),
            ),
        ),
        (
            "weather.svg",
            chart(
                "Average daily rentals by weather",
                "Average rentals",
                ChartKind::GroupedBars,
                weather,
                measure_series(weather, &[Total, Casual, Registered]),
            ),
        ),
        (
            "weather_share.svg",
            chart(
                "User type share by weather",
                "Percent",
                ChartKind::StackedBars,
                weather,
                share_series(weather),
            ),
        ),
    ]
}

/// Writes every dashboard chart into `dir`, creating it if needed.
pub fn write_charts(view: &DashboardView, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let mut written = Vec::new();
    for (file_name, chart) in dashboard_charts(view) {
        let path = dir.join(file_name);
        chart.save(&path)?;
        written.push(path);
    }

    info!(dir = %dir.display(), charts = written.len(), "Charts written");
    Ok(written)
}
