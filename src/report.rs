//! The dashboard view-model.
//!
//! [`render`] is the single entry point: a pure function of the loaded
//! dataset and one filter selection. Every output format (text, JSON, charts)
//! is produced from the returned [`DashboardView`].

use serde::Serialize;
use tracing::debug;

use crate::aggregate::{
    GroupMeans, Measure, Totals, by_day_of_week, by_day_type, by_holiday, by_season, by_weather,
    monthly,
};
use crate::dataset::Dataset;
use crate::domain::{DayOfWeek, DayType, HolidayClass, Season, Weather, YearMonth};
use crate::filter::{FilterSelection, filter};
use crate::insights::{
    Change, DAY_TYPE_PLACEHOLDER, Extremes, HOLIDAY_PLACEHOLDER, Insight, NO_DATA_PLACEHOLDER,
    Ranking, TrendDirections, WeekendLevel, compare, day_type_conclusion, extremes, rank,
    trend_directions, weekend_level,
};

/// Overall sums for the filtered days.
#[derive(Debug, Clone, Serialize)]
pub struct Headline {
    #[serde(flatten)]
    pub totals: Totals,
    pub casual_share: f64,
    pub registered_share: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendSection {
    pub table: Vec<GroupMeans<YearMonth>>,
    pub peak_and_lowest: Insight<Extremes<YearMonth>>,
    pub directions: Insight<TrendDirections>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayTypeSection {
    pub working_vs_weekend: Vec<GroupMeans<DayType>>,
    /// Weekend/holiday change relative to working days.
    pub weekend_change: Insight<Change>,
    pub regular_vs_holiday: Vec<GroupMeans<HolidayClass>>,
    /// Public holiday change relative to regular days.
    pub holiday_change: Insight<Change>,
    pub conclusion: Insight<&'static [&'static str]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeasonSection {
    pub table: Vec<GroupMeans<Season>>,
    pub ranking: Insight<Ranking<Season>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklySection {
    pub table: Vec<GroupMeans<DayOfWeek>>,
    pub ranking: Insight<Ranking<DayOfWeek>>,
    pub weekend_level: Insight<WeekendLevel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeatherSection {
    pub table: Vec<GroupMeans<Weather>>,
    pub ranking: Insight<Ranking<Weather>>,
}

/// Everything the report shows for one filter selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub filters: FilterSelection,
    pub dataset_days: usize,
    pub headline: Headline,
    pub trend: TrendSection,
    pub day_types: DayTypeSection,
    pub seasons: SeasonSection,
    pub weekly: WeeklySection,
    pub weather: WeatherSection,
}

/// Filters `dataset` and derives every report section from the subset.
#[tracing::instrument(skip_all, fields(dataset_days = dataset.len()))]
pub fn render(dataset: &Dataset, filters: &FilterSelection) -> DashboardView {
    let subset = filter(dataset.records(), filters);
    debug!(subset_days = subset.len(), "Filter applied");

    let totals = Totals::of(&subset);
    let headline = Headline {
        totals,
        casual_share: totals.casual_share(),
        registered_share: totals.registered_share(),
    };

    let months = monthly(&subset);
    let peak_and_lowest = match extremes(&months, Measure::Total) {
        Some(ext) => Insight::Available(ext),
        None => Insight::Placeholder(NO_DATA_PLACEHOLDER),
    };
    let trend = TrendSection {
        directions: trend_directions(&months),
        peak_and_lowest,
        table: months,
    };

    let working = by_day_type(&subset);
    let holidays = by_holiday(&subset);
    let day_types = DayTypeSection {
        weekend_change: compare(
            &working,
            DayType::WorkingDay,
            DayType::WeekendOrHoliday,
            DAY_TYPE_PLACEHOLDER,
        ),
        holiday_change: compare(
            &holidays,
            HolidayClass::RegularDay,
            HolidayClass::Holiday,
            HOLIDAY_PLACEHOLDER,
        ),
        conclusion: day_type_conclusion(&working, &holidays),
        working_vs_weekend: working,
        regular_vs_holiday: holidays,
    };

    let seasons = by_season(&subset);
    let seasons = SeasonSection {
        ranking: rank(&seasons),
        table: seasons,
    };

    let days = by_day_of_week(&subset);
    let weekly = WeeklySection {
        ranking: rank(&days),
        weekend_level: weekend_level(&days),
        table: days,
    };

    let conditions = by_weather(&subset);
    let weather = WeatherSection {
        ranking: rank(&conditions),
        table: conditions,
    };

    DashboardView {
        filters: filters.clone(),
        dataset_days: dataset.len(),
        headline,
        trend,
        day_types,
        seasons,
        weekly,
        weather,
    }
}

impl DashboardView {
    /// Number of days left after filtering.
    pub fn filtered_days(&self) -> usize {
        self.headline.totals.days
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RentalRecord;
    use chrono::NaiveDate;

    fn two_day_dataset() -> Dataset {
        Dataset::from_records(vec![
            RentalRecord::new(
                NaiveDate::from_ymd_opt(2011, 3, 14).unwrap(),
                Season::Spring,
                HolidayClass::RegularDay,
                DayType::WorkingDay,
                Weather::Clear,
                10,
                40,
            ),
            RentalRecord::new(
                NaiveDate::from_ymd_opt(2012, 6, 23).unwrap(),
                Season::Summer,
                HolidayClass::RegularDay,
                DayType::WeekendOrHoliday,
                Weather::Cloudy,
                30,
                20,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_single_record_selection() {
        let dataset = two_day_dataset();
        let filters = FilterSelection::new([2011], [Season::Spring], [DayType::WorkingDay]);
        let view = render(&dataset, &filters);

        assert_eq!(view.filtered_days(), 1);
        assert_eq!(view.dataset_days, 2);
        assert_eq!(view.trend.table.len(), 1);
        assert_eq!(view.trend.table[0].total, 50.0);
        assert_eq!(view.headline.casual_share, 20.0);
        assert_eq!(view.seasons.table[0].casual_share, 20.0);
    }

    #[test]
    fn test_working_days_only_degrades_comparisons() {
        let dataset = two_day_dataset();
        let filters = FilterSelection::new(
            [2011, 2012],
            [Season::Spring, Season::Summer],
            [DayType::WorkingDay],
        );
        let view = render(&dataset, &filters);

        assert_eq!(
            view.day_types.weekend_change,
            Insight::Placeholder(DAY_TYPE_PLACEHOLDER)
        );
        assert_eq!(
            view.day_types.holiday_change,
            Insight::Placeholder(HOLIDAY_PLACEHOLDER)
        );
        assert!(view.day_types.conclusion.is_placeholder());
        assert!(view.weekly.weekend_level.is_placeholder());
    }

    #[test]
    fn test_empty_selection_renders_placeholders() {
        let dataset = two_day_dataset();
        let view = render(&dataset, &FilterSelection::default());

        assert_eq!(view.filtered_days(), 0);
        assert_eq!(view.headline.casual_share, 0.0);
        assert!(view.trend.table.is_empty());
        assert!(view.trend.peak_and_lowest.is_placeholder());
        assert!(view.trend.directions.is_placeholder());
        assert!(view.seasons.ranking.is_placeholder());
        assert!(view.weekly.ranking.is_placeholder());
        assert!(view.weather.ranking.is_placeholder());
    }

    #[test]
    fn test_full_selection_compares_day_types() {
        let dataset = two_day_dataset();
        let view = render(&dataset, &FilterSelection::all(&dataset));

        let change = view.day_types.weekend_change.available().unwrap();
        assert_eq!(change.casual, 200.0);
        assert_eq!(change.registered, -50.0);
    }

    #[test]
    fn test_view_serializes() {
        let dataset = two_day_dataset();
        let view = render(&dataset, &FilterSelection::all(&dataset));
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["headline"]["total"], 100);
        assert_eq!(json["seasons"]["table"][0]["key"], "Spring");
        assert_eq!(json["filters"]["day_types"][1], "Weekend/Holiday");
    }
}
