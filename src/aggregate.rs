//! Grouped means over a filtered subset.
//!
//! Tables are produced through a `BTreeMap` keyed by the group key, so their
//! order is the key's `Ord`: domain order for categorical keys and
//! chronological order for [`YearMonth`]. Groups with no records never appear.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::dataset::RentalRecord;
use crate::domain::{DayOfWeek, DayType, HolidayClass, Season, Weather, YearMonth};
use crate::stats::percent_of_total;

/// A per-day rental count that can be averaged or compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    Total,
    Casual,
    Registered,
}

impl Measure {
    pub fn of<K>(self, row: &GroupMeans<K>) -> f64 {
        match self {
            Measure::Total => row.total,
            Measure::Casual => row.casual,
            Measure::Registered => row.registered,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Measure::Total => "Total",
            Measure::Casual => "Casual",
            Measure::Registered => "Registered",
        }
    }
}

/// Mean daily rentals for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMeans<K> {
    pub key: K,
    pub days: usize,
    pub total: f64,
    pub casual: f64,
    pub registered: f64,
    /// Casual share of the mean total, in percent.
    pub casual_share: f64,
    /// Registered share of the mean total, in percent.
    pub registered_share: f64,
}

#[derive(Default)]
struct Sums {
    days: usize,
    total: u64,
    casual: u64,
    registered: u64,
}

impl Sums {
    fn add(&mut self, record: &RentalRecord) {
        self.days += 1;
        self.total += record.total;
        self.casual += u64::from(record.casual);
        self.registered += u64::from(record.registered);
    }
}

/// Groups `subset` by `key` and averages each count per group.
pub fn aggregate_by<K: Ord>(
    subset: &[&RentalRecord],
    key: impl Fn(&RentalRecord) -> K,
) -> Vec<GroupMeans<K>> {
    let mut groups: BTreeMap<K, Sums> = BTreeMap::new();

    for &record in subset {
        groups.entry(key(record)).or_default().add(record);
    }

    groups
        .into_iter()
        .map(|(key, sums)| {
            let days = sums.days as f64;
            let total = sums.total as f64 / days;
            let casual = sums.casual as f64 / days;
            let registered = sums.registered as f64 / days;

            GroupMeans {
                key,
                days: sums.days,
                total,
                casual,
                registered,
                casual_share: percent_of_total(casual, total),
                registered_share: percent_of_total(registered, total),
            }
        })
        .collect()
}

pub fn monthly(subset: &[&RentalRecord]) -> Vec<GroupMeans<YearMonth>> {
    aggregate_by(subset, RentalRecord::year_month)
}

pub fn by_day_type(subset: &[&RentalRecord]) -> Vec<GroupMeans<DayType>> {
    aggregate_by(subset, |r| r.day_type)
}

pub fn by_holiday(subset: &[&RentalRecord]) -> Vec<GroupMeans<HolidayClass>> {
    aggregate_by(subset, |r| r.holiday)
}

pub fn by_season(subset: &[&RentalRecord]) -> Vec<GroupMeans<Season>> {
    aggregate_by(subset, |r| r.season)
}

pub fn by_day_of_week(subset: &[&RentalRecord]) -> Vec<GroupMeans<DayOfWeek>> {
    aggregate_by(subset, |r| r.day_of_week)
}

pub fn by_weather(subset: &[&RentalRecord]) -> Vec<GroupMeans<Weather>> {
    aggregate_by(subset, |r| r.weather)
}

/// Row with the largest `value`. The first such row wins a tie.
pub fn max_row_by<K>(
    table: &[GroupMeans<K>],
    value: impl Fn(&GroupMeans<K>) -> f64,
) -> Option<&GroupMeans<K>> {
    table.iter().fold(None, |best, row| match best {
        Some(b) if value(b) >= value(row) => Some(b),
        _ => Some(row),
    })
}

/// Row with the smallest `value`. The first such row wins a tie.
pub fn min_row_by<K>(
    table: &[GroupMeans<K>],
    value: impl Fn(&GroupMeans<K>) -> f64,
) -> Option<&GroupMeans<K>> {
    table.iter().fold(None, |best, row| match best {
        Some(b) if value(b) <= value(row) => Some(b),
        _ => Some(row),
    })
}

pub fn max_row<K>(table: &[GroupMeans<K>], measure: Measure) -> Option<&GroupMeans<K>> {
    max_row_by(table, |row| measure.of(row))
}

pub fn min_row<K>(table: &[GroupMeans<K>], measure: Measure) -> Option<&GroupMeans<K>> {
    min_row_by(table, |row| measure.of(row))
}

pub fn find_row<K: PartialEq>(table: &[GroupMeans<K>], key: K) -> Option<&GroupMeans<K>> {
    table.iter().find(|row| row.key == key)
}

/// Sums of each count over a subset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub days: usize,
    pub total: u64,
    pub casual: u64,
    pub registered: u64,
}

impl Totals {
    pub fn of(subset: &[&RentalRecord]) -> Self {
        subset.iter().fold(Totals::default(), |mut acc, r| {
            acc.days += 1;
            acc.total += r.total;
            acc.casual += u64::from(r.casual);
            acc.registered += u64::from(r.registered);
            acc
        })
    }

    pub fn casual_share(&self) -> f64 {
        percent_of_total(self.casual as f64, self.total as f64)
    }

    pub fn registered_share(&self) -> f64 {
        percent_of_total(self.registered as f64, self.total as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(
        date: (i32, u32, u32),
        season: Season,
        weather: Weather,
        day_type: DayType,
        casual: u32,
        registered: u32,
    ) -> RentalRecord {
        RentalRecord::new(
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            season,
            HolidayClass::RegularDay,
            day_type,
            weather,
            casual,
            registered,
        )
    }

    fn records() -> Vec<RentalRecord> {
        let working = DayType::WorkingDay;
        let off = DayType::WeekendOrHoliday;
        vec![
            day((2012, 2, 4), Season::Winter, Weather::LightRain, off, 100, 300),
            day((2011, 7, 5), Season::Fall, Weather::Clear, working, 900, 3100),
            day((2011, 4, 6), Season::Summer, Weather::Cloudy, working, 500, 2500),
            day((2011, 1, 3), Season::Spring, Weather::Clear, working, 50, 950),
            day((2011, 1, 8), Season::Spring, Weather::HeavyRain, off, 11, 20),
        ]
    }

    #[test]
    fn test_grouped_means() {
        let records = records();
        let subset: Vec<&RentalRecord> = records.iter().collect();
        let table = by_season(&subset);

        let spring = find_row(&table, Season::Spring).unwrap();
        assert_eq!(spring.days, 2);
        assert_eq!(spring.casual, 30.5);
        assert_eq!(spring.registered, 485.0);
        assert_eq!(spring.total, 515.5);
    }

    #[test]
    fn test_categorical_tables_follow_domain_order() {
        let records = records();
        let subset: Vec<&RentalRecord> = records.iter().collect();

        let seasons: Vec<_> = by_season(&subset).iter().map(|r| r.key).collect();
        assert_eq!(seasons, Season::ALL);

        let weather: Vec<_> = by_weather(&subset).iter().map(|r| r.key).collect();
        assert_eq!(weather, Weather::ALL);

        let days: Vec<_> = by_day_of_week(&subset).iter().map(|r| r.key).collect();
        assert_eq!(
            days,
            vec![
                DayOfWeek::Monday,
                DayOfWeek::Tuesday,
                DayOfWeek::Wednesday,
                DayOfWeek::Saturday
            ]
        );
    }

    #[test]
    fn test_monthly_is_chronological() {
        let records = records();
        let subset: Vec<&RentalRecord> = records.iter().collect();
        let periods: Vec<String> = monthly(&subset).iter().map(|r| r.key.to_string()).collect();
        assert_eq!(periods, vec!["2011-01", "2011-04", "2011-07", "2012-02"]);
    }

    #[test]
    fn test_absent_groups_are_not_emitted() {
        let records = records();
        let subset: Vec<&RentalRecord> = records
            .iter()
            .filter(|r| r.day_type == DayType::WorkingDay)
            .collect();
        let table = by_day_type(&subset);
        assert_eq!(table.len(), 1);
        assert!(find_row(&table, DayType::WeekendOrHoliday).is_none());
    }

    #[test]
    fn test_empty_subset() {
        assert!(by_weather(&[]).is_empty());
        assert!(max_row::<Weather>(&[], Measure::Total).is_none());
        assert_eq!(Totals::of(&[]), Totals::default());
        assert_eq!(Totals::of(&[]).casual_share(), 0.0);
    }

    #[test]
    fn test_mean_of_sums_is_sum_of_means() {
        let records = records();
        let subset: Vec<&RentalRecord> = records.iter().collect();
        for row in monthly(&subset) {
            assert!((row.casual + row.registered - row.total).abs() < 1e-9);
            assert!((row.casual_share + row.registered_share - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_max_min_rows() {
        let records = records();
        let subset: Vec<&RentalRecord> = records.iter().collect();
        let table = by_weather(&subset);

        assert_eq!(max_row(&table, Measure::Total).unwrap().key, Weather::Cloudy);
        assert_eq!(min_row(&table, Measure::Total).unwrap().key, Weather::HeavyRain);
        assert_eq!(max_row(&table, Measure::Casual).unwrap().key, Weather::Cloudy);
    }

    #[test]
    fn test_ties_keep_first_row() {
        let records = vec![
            day((2011, 1, 3), Season::Spring, Weather::Clear, DayType::WorkingDay, 10, 10),
            day((2011, 1, 4), Season::Summer, Weather::Clear, DayType::WorkingDay, 10, 10),
        ];
        let subset: Vec<&RentalRecord> = records.iter().collect();
        let table = by_season(&subset);

        assert_eq!(max_row(&table, Measure::Total).unwrap().key, Season::Spring);
        assert_eq!(min_row(&table, Measure::Total).unwrap().key, Season::Spring);
    }

    #[test]
    fn test_totals() {
        let records = records();
        let subset: Vec<&RentalRecord> = records.iter().collect();
        let totals = Totals::of(&subset);

        assert_eq!(totals.days, 5);
        assert_eq!(totals.casual, 1561);
        assert_eq!(totals.registered, 6870);
        assert_eq!(totals.total, 8431);
    }
}
