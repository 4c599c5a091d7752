//! Record selection by year, season and day type.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::dataset::{Dataset, RentalRecord};
use crate::domain::{DayType, Season};

/// The values selected on each filter dimension.
///
/// An empty set selects nothing on that dimension; there is no implicit
/// "select all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub years: BTreeSet<i32>,
    pub seasons: BTreeSet<Season>,
    pub day_types: BTreeSet<DayType>,
}

impl FilterSelection {
    pub fn new(
        years: impl IntoIterator<Item = i32>,
        seasons: impl IntoIterator<Item = Season>,
        day_types: impl IntoIterator<Item = DayType>,
    ) -> Self {
        FilterSelection {
            years: years.into_iter().collect(),
            seasons: seasons.into_iter().collect(),
            day_types: day_types.into_iter().collect(),
        }
    }

    /// Selects every value present in `dataset`.
    pub fn all(dataset: &Dataset) -> Self {
        Self::new(dataset.years(), dataset.seasons(), dataset.day_types())
    }

    /// Builds a selection from command-line values, where an omitted
    /// dimension means every value present in `dataset`.
    pub fn or_all(
        dataset: &Dataset,
        years: &[i32],
        seasons: &[Season],
        day_types: &[DayType],
    ) -> Self {
        fn given_or<T: Ord + Copy>(given: &[T], all: BTreeSet<T>) -> BTreeSet<T> {
            if given.is_empty() {
                all
            } else {
                given.iter().copied().collect()
            }
        }

        let all = Self::all(dataset);
        FilterSelection {
            years: given_or(years, all.years),
            seasons: given_or(seasons, all.seasons),
            day_types: given_or(day_types, all.day_types),
        }
    }

    pub fn matches(&self, record: &RentalRecord) -> bool {
        self.years.contains(&record.year)
            && self.seasons.contains(&record.season)
            && self.day_types.contains(&record.day_type)
    }
}

/// Returns the records that satisfy every dimension of `selection`, in input order.
pub fn filter<'a>(
    records: &'a [RentalRecord],
    selection: &FilterSelection,
) -> Vec<&'a RentalRecord> {
    records.iter().filter(|r| selection.matches(r)).collect()
}
