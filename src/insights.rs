//! Narrative facts derived from grouped tables.
//!
//! Every derivation returns an [`Insight`]: either the computed facts or a
//! fixed placeholder message when the filtered data cannot support the
//! comparison. Nothing here fails.

use serde::Serialize;

use crate::aggregate::{GroupMeans, Measure, find_row, max_row, max_row_by, min_row};
use crate::domain::DayOfWeek;
use crate::stats::{mean, pct_change, percent_of_total};

pub const NO_DATA_PLACEHOLDER: &str = "No data matches the current filter selection.";

pub const DAY_TYPE_PLACEHOLDER: &str =
    "Select both day types (Working Day and Weekend/Holiday) to see the comparison.";

pub const HOLIDAY_PLACEHOLDER: &str =
    "Select both day types (Regular Day and Public Holiday) to see the comparison.";

pub const CONCLUSION_PLACEHOLDER: &str =
    "Select all day types to see the complete analysis of working days versus days off.";

pub const WEEKEND_PLACEHOLDER: &str =
    "Select both weekdays and weekend days to compare weekly usage.";

/// Fixed conclusion shown when both day-type comparisons are available.
pub const DAY_TYPE_CONCLUSION: &[&str] = &[
    "Casual users show a strong preference for riding on weekends and holidays.",
    "Registered users ride more consistently on working days.",
    "Registered users appear to use bikes as daily transport to work or routine activities.",
    "Casual users lean towards recreational or social rides on days off.",
];

/// Either derived facts or the message shown in their place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Insight<T> {
    Available(T),
    Placeholder(&'static str),
}

impl<T> Insight<T> {
    pub fn available(&self) -> Option<&T> {
        match self {
            Insight::Available(value) => Some(value),
            Insight::Placeholder(_) => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Insight::Placeholder(_))
    }

    fn from_option(value: Option<T>, placeholder: &'static str) -> Self {
        match value {
            Some(value) => Insight::Available(value),
            None => Insight::Placeholder(placeholder),
        }
    }
}

/// Highest and lowest rows of a table for one measure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extremes<K> {
    pub measure: Measure,
    pub highest: GroupMeans<K>,
    pub lowest: GroupMeans<K>,
}

impl<K> Extremes<K> {
    pub fn highest_value(&self) -> f64 {
        self.measure.of(&self.highest)
    }

    pub fn lowest_value(&self) -> f64 {
        self.measure.of(&self.lowest)
    }

    /// How much higher the highest value is than the lowest, in percent of the lowest.
    pub fn spread(&self) -> f64 {
        pct_change(self.highest_value(), self.lowest_value())
    }

    /// Drop from the highest value to the lowest, in percent of the highest.
    pub fn decline(&self) -> f64 {
        percent_of_total(self.highest_value() - self.lowest_value(), self.highest_value())
    }
}

pub fn extremes<K: Clone>(table: &[GroupMeans<K>], measure: Measure) -> Option<Extremes<K>> {
    let highest = max_row(table, measure)?;
    let lowest = min_row(table, measure)?;
    Some(Extremes {
        measure,
        highest: highest.clone(),
        lowest: lowest.clone(),
    })
}

/// Percent change of each user type from a baseline group to another group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Change {
    pub casual: f64,
    pub registered: f64,
}

/// Compares `other` against `baseline`. Both groups must be present in `table`.
pub fn compare<K: PartialEq>(
    table: &[GroupMeans<K>],
    baseline: K,
    other: K,
    placeholder: &'static str,
) -> Insight<Change> {
    let change = match (find_row(table, baseline), find_row(table, other)) {
        (Some(base), Some(cmp)) => Some(Change {
            casual: pct_change(cmp.casual, base.casual),
            registered: pct_change(cmp.registered, base.registered),
        }),
        _ => None,
    };
    Insight::from_option(change, placeholder)
}

/// Word used for the sign of a percent change.
pub fn direction(change: f64) -> &'static str {
    if change > 0.0 { "increase" } else { "decrease" }
}

/// Direction of a series between its first and last period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
}

impl Trend {
    pub fn label(self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
        }
    }
}

/// Casual and registered trend over a chronologically ordered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendDirections {
    pub casual: Trend,
    pub registered: Trend,
}

pub fn trend_directions<K>(table: &[GroupMeans<K>]) -> Insight<TrendDirections> {
    let directions = match (table.first(), table.last()) {
        (Some(first), Some(last)) => {
            let trend = |measure: Measure| {
                if measure.of(last) > measure.of(first) {
                    Trend::Increasing
                } else {
                    Trend::Decreasing
                }
            };
            Some(TrendDirections {
                casual: trend(Measure::Casual),
                registered: trend(Measure::Registered),
            })
        }
        _ => None,
    };
    Insight::from_option(directions, NO_DATA_PLACEHOLDER)
}

/// Best and worst groups per user type, and the group where casual riders
/// make up the largest share.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking<K> {
    pub total: Extremes<K>,
    pub casual: Extremes<K>,
    pub registered: Extremes<K>,
    pub highest_casual_share: K,
}

pub fn rank<K: Clone>(table: &[GroupMeans<K>]) -> Insight<Ranking<K>> {
    let ranking = (|| {
        Some(Ranking {
            total: extremes(table, Measure::Total)?,
            casual: extremes(table, Measure::Casual)?,
            registered: extremes(table, Measure::Registered)?,
            highest_casual_share: max_row_by(table, |row| row.casual_share)?.key.clone(),
        })
    })();
    Insight::from_option(ranking, NO_DATA_PLACEHOLDER)
}

/// Average of the daily means on Saturday and Sunday against the other days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeekendLevel {
    pub weekend_mean: f64,
    pub weekday_mean: f64,
}

impl WeekendLevel {
    pub fn weekend_is_higher(&self) -> bool {
        self.weekend_mean > self.weekday_mean
    }
}

pub fn weekend_level(table: &[GroupMeans<DayOfWeek>]) -> Insight<WeekendLevel> {
    let (weekend, weekdays): (Vec<_>, Vec<_>) = table.iter().partition(|row| row.key.is_weekend());

    if weekend.is_empty() || weekdays.is_empty() {
        return Insight::Placeholder(WEEKEND_PLACEHOLDER);
    }

    let mean_total = |rows: Vec<&GroupMeans<DayOfWeek>>| {
        mean(&rows.iter().map(|row| row.total).collect::<Vec<_>>())
    };
    Insight::Available(WeekendLevel {
        weekend_mean: mean_total(weekend),
        weekday_mean: mean_total(weekdays),
    })
}

/// The combined day-type conclusion needs more than one group on each table.
pub fn day_type_conclusion<A, B>(
    working_days: &[GroupMeans<A>],
    holidays: &[GroupMeans<B>],
) -> Insight<&'static [&'static str]> {
    if working_days.len() > 1 && holidays.len() > 1 {
        Insight::Available(DAY_TYPE_CONCLUSION)
    } else {
        Insight::Placeholder(CONCLUSION_PLACEHOLDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{by_day_of_week, by_day_type, by_season};
    use crate::dataset::RentalRecord;
    use crate::domain::{DayType, HolidayClass, Season, Weather};
    use chrono::NaiveDate;

    fn day(
        date: (i32, u32, u32),
        season: Season,
        day_type: DayType,
        casual: u32,
        registered: u32,
    ) -> RentalRecord {
        RentalRecord::new(
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            season,
            HolidayClass::RegularDay,
            day_type,
            Weather::Clear,
            casual,
            registered,
        )
    }

    fn records() -> Vec<RentalRecord> {
        vec![
            // Monday, Tuesday working; Saturday, Sunday weekend
            day((2011, 1, 3), Season::Spring, DayType::WorkingDay, 100, 1000),
            day((2011, 1, 4), Season::Spring, DayType::WorkingDay, 100, 1200),
            day((2011, 7, 2), Season::Fall, DayType::WeekendOrHoliday, 300, 800),
            day((2011, 7, 3), Season::Fall, DayType::WeekendOrHoliday, 500, 600),
        ]
    }

    #[test]
    fn test_compare_both_present() {
        let records = records();
        let subset: Vec<&RentalRecord> = records.iter().collect();
        let table = by_day_type(&subset);

        let change = compare(
            &table,
            DayType::WorkingDay,
            DayType::WeekendOrHoliday,
            DAY_TYPE_PLACEHOLDER,
        );
        let change = change.available().unwrap();
        assert_eq!(change.casual, 300.0);
        assert!((change.registered + 36.363636363636).abs() < 1e-9);
        assert_eq!(direction(change.casual), "increase");
        assert_eq!(direction(change.registered), "decrease");
    }

    #[test]
    fn test_compare_missing_category_degrades() {
        let records = records();
        let subset: Vec<&RentalRecord> = records
            .iter()
            .filter(|r| r.day_type == DayType::WorkingDay)
            .collect();
        let table = by_day_type(&subset);

        let insight = compare(
            &table,
            DayType::WorkingDay,
            DayType::WeekendOrHoliday,
            DAY_TYPE_PLACEHOLDER,
        );
        assert_eq!(insight, Insight::Placeholder(DAY_TYPE_PLACEHOLDER));
    }

    #[test]
    fn test_extremes_spread_and_decline() {
        let records = records();
        let subset: Vec<&RentalRecord> = records.iter().collect();
        let table = by_season(&subset);

        // Spring mean total 1200, Fall mean total 1100
        let ext = extremes(&table, Measure::Total).unwrap();
        assert_eq!(ext.highest.key, Season::Spring);
        assert_eq!(ext.lowest.key, Season::Fall);
        assert!((ext.spread() - 9.090909090909092).abs() < 1e-9);
        assert!((ext.decline() - 8.333333333333334).abs() < 1e-9);
    }

    #[test]
    fn test_rank_empty_table_is_placeholder() {
        let ranking = rank::<Season>(&[]);
        assert_eq!(ranking, Insight::Placeholder(NO_DATA_PLACEHOLDER));
    }

    #[test]
    fn test_rank_highest_casual_share() {
        let records = records();
        let subset: Vec<&RentalRecord> = records.iter().collect();
        let table = by_season(&subset);

        let ranking = rank(&table);
        let ranking = ranking.available().unwrap();
        assert_eq!(ranking.highest_casual_share, Season::Fall);
        assert_eq!(ranking.casual.highest.key, Season::Fall);
        assert_eq!(ranking.registered.highest.key, Season::Spring);
    }

    #[test]
    fn test_trend_directions() {
        let records = records();
        let subset: Vec<&RentalRecord> = records.iter().collect();
        let table = crate::aggregate::monthly(&subset);

        let trend = trend_directions(&table);
        let trend = trend.available().unwrap();
        assert_eq!(trend.casual, Trend::Increasing);
        assert_eq!(trend.registered, Trend::Decreasing);

        assert!(trend_directions::<Season>(&[]).is_placeholder());
    }

    #[test]
    fn test_single_period_trend_is_decreasing() {
        let records = records();
        let subset: Vec<&RentalRecord> = records.iter().take(1).collect();
        let table = crate::aggregate::monthly(&subset);
        let trend = trend_directions(&table);
        assert_eq!(trend.available().unwrap().casual, Trend::Decreasing);
    }

    #[test]
    fn test_weekend_level() {
        let records = records();
        let subset: Vec<&RentalRecord> = records.iter().collect();
        let table = by_day_of_week(&subset);

        let level = weekend_level(&table);
        let level = level.available().unwrap();
        assert_eq!(level.weekend_mean, 1100.0);
        assert_eq!(level.weekday_mean, 1200.0);
        assert!(!level.weekend_is_higher());
    }

    #[test]
    fn test_weekend_level_without_weekend() {
        let records = records();
        let subset: Vec<&RentalRecord> = records.iter().take(2).collect();
        let table = by_day_of_week(&subset);
        assert_eq!(weekend_level(&table), Insight::Placeholder(WEEKEND_PLACEHOLDER));
    }

    #[test]
    fn test_day_type_conclusion() {
        let records = records();
        let subset: Vec<&RentalRecord> = records.iter().collect();
        let working = by_day_type(&subset);
        let holidays = crate::aggregate::by_holiday(&subset);

        // every record is a regular day, so only one holiday group
        assert_eq!(
            day_type_conclusion(&working, &holidays),
            Insight::Placeholder(CONCLUSION_PLACEHOLDER)
        );
        assert!(!day_type_conclusion(&working, &working).is_placeholder());
    }

    #[test]
    fn test_insight_serializes_with_status() {
        let insight: Insight<Change> = Insight::Placeholder(DAY_TYPE_PLACEHOLDER);
        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["status"], "placeholder");
        assert_eq!(json["detail"], DAY_TYPE_PLACEHOLDER);
    }
}
