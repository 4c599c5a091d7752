//! Categorical dimensions of a rental day.
//!
//! Every dimension is a closed enumeration whose variant order is its display
//! order, so deriving `Ord` is enough to sort grouped tables correctly.
//! The numeric codes are the ones used by the daily bike-sharing dataset.

use anyhow::{Result, anyhow};
use chrono::Weekday;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Lowercases and strips everything but ASCII alphanumerics, so that
/// `"Weekend/Holiday"`, `"weekend-holiday"` and `"WEEKEND HOLIDAY"` compare equal.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

macro_rules! category {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident = $code:literal => $label:literal $([$($alias:literal),*])?),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in display order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn code(self) -> u8 {
                match self {
                    $($name::$variant => $code,)+
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            fn aliases(self) -> &'static [&'static str] {
                match self {
                    $($name::$variant => &[$($($alias),*)?],)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self> {
                let wanted = normalize(s);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| {
                        normalize(v.label()) == wanted || v.aliases().contains(&wanted.as_str())
                    })
                    .ok_or_else(|| {
                        let expected: Vec<&str> = Self::ALL.iter().map(|v| v.label()).collect();
                        anyhow!(
                            "unknown {} '{}', expected one of: {}",
                            stringify!($name),
                            s,
                            expected.join(", ")
                        )
                    })
            }
        }
    };
}

category! {
    /// Meteorological season of the day (`season` column, codes 1..=4).
    Season {
        Spring = 1 => "Spring",
        Summer = 2 => "Summer",
        Fall = 3 => "Fall" ["autumn"],
        Winter = 4 => "Winter",
    }
}

category! {
    /// Weather situation of the day (`weathersit` column, codes 1..=4),
    /// ordered from best to worst for display.
    Weather {
        Clear = 1 => "Clear" ["sunny"],
        Cloudy = 2 => "Cloudy/Misty" ["cloudy", "misty", "mist"],
        LightRain = 3 => "Light Rain" ["rain", "lightsnow"],
        HeavyRain = 4 => "Heavy Rain" ["storm"],
    }
}

category! {
    /// Working-day classification used by the day-type filter
    /// (`workingday` column: 1 = working day, 0 = weekend or holiday).
    DayType {
        WorkingDay = 1 => "Working Day" ["working", "workday", "weekday"],
        WeekendOrHoliday = 0 => "Weekend/Holiday" ["weekend", "holiday", "offday"],
    }
}

category! {
    /// Public-holiday classification (`holiday` column: 1 = public holiday).
    HolidayClass {
        RegularDay = 0 => "Regular Day" ["regular"],
        Holiday = 1 => "Public Holiday" ["holiday"],
    }
}

category! {
    /// Day of the week, Monday first. Codes count days from Monday.
    DayOfWeek {
        Monday = 0 => "Monday" ["mon"],
        Tuesday = 1 => "Tuesday" ["tue"],
        Wednesday = 2 => "Wednesday" ["wed"],
        Thursday = 3 => "Thursday" ["thu"],
        Friday = 4 => "Friday" ["fri"],
        Saturday = 5 => "Saturday" ["sat"],
        Sunday = 6 => "Sunday" ["sun"],
    }
}

impl DayOfWeek {
    pub fn is_weekend(self) -> bool {
        matches!(self, DayOfWeek::Saturday | DayOfWeek::Sunday)
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

/// Calendar month of a given year. Field order makes the derived `Ord`
/// chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_codes() {
        assert_eq!(Season::from_code(1), Some(Season::Spring));
        assert_eq!(Season::from_code(4), Some(Season::Winter));
        assert_eq!(Season::from_code(0), None);
        assert_eq!(Season::from_code(5), None);
        assert_eq!(Season::Fall.code(), 3);
    }

    #[test]
    fn test_day_type_codes() {
        assert_eq!(DayType::from_code(1), Some(DayType::WorkingDay));
        assert_eq!(DayType::from_code(0), Some(DayType::WeekendOrHoliday));
        assert_eq!(DayType::from_code(2), None);
    }

    #[test]
    fn test_domain_order_is_display_order() {
        let mut seasons = vec![Season::Winter, Season::Spring, Season::Fall, Season::Summer];
        seasons.sort();
        assert_eq!(seasons, Season::ALL);

        let mut weather = vec![
            Weather::HeavyRain,
            Weather::Clear,
            Weather::LightRain,
            Weather::Cloudy,
        ];
        weather.sort();
        assert_eq!(weather, Weather::ALL);

        assert!(DayType::WorkingDay < DayType::WeekendOrHoliday);
        assert!(DayOfWeek::Monday < DayOfWeek::Sunday);
    }

    #[test]
    fn test_parse_labels_and_aliases() {
        assert_eq!("spring".parse::<Season>().unwrap(), Season::Spring);
        assert_eq!("Autumn".parse::<Season>().unwrap(), Season::Fall);
        assert_eq!("Cloudy/Misty".parse::<Weather>().unwrap(), Weather::Cloudy);
        assert_eq!("working-day".parse::<DayType>().unwrap(), DayType::WorkingDay);
        assert_eq!("weekend".parse::<DayType>().unwrap(), DayType::WeekendOrHoliday);
        assert_eq!("Weekend/Holiday".parse::<DayType>().unwrap(), DayType::WeekendOrHoliday);
    }

    #[test]
    fn test_parse_unknown_lists_expected() {
        let err = "monsoon".parse::<Season>().unwrap_err();
        assert!(err.to_string().contains("Spring, Summer, Fall, Winter"));
    }

    #[test]
    fn test_weekday_conversion() {
        assert_eq!(DayOfWeek::from(Weekday::Mon), DayOfWeek::Monday);
        assert!(DayOfWeek::from(Weekday::Sun).is_weekend());
        assert!(!DayOfWeek::Friday.is_weekend());
    }

    #[test]
    fn test_year_month_display_and_order() {
        let a = YearMonth { year: 2011, month: 12 };
        let b = YearMonth { year: 2012, month: 1 };
        assert!(a < b);
        assert_eq!(a.to_string(), "2011-12");
        assert_eq!(serde_json::to_string(&b).unwrap(), "\"2012-01\"");
    }

    #[test]
    fn test_labels_serialize() {
        assert_eq!(serde_json::to_string(&Weather::LightRain).unwrap(), "\"Light Rain\"");
    }
}
