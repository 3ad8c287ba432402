use crate::types::traits::types::{DateTimeBounds, Month, Year};
use crate::types::traits::utils::days_in_month;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Anything that can be resolved to an inclusive span of UTC instants.
///
/// Instants resolve to a zero-length span, calendar periods ([`NaiveDate`],
/// [`Month`], [`Year`]) to their first and last microsecond.
pub trait AnyDateTime {
    fn datetime_bounds(self) -> Option<DateTimeBounds>;
}

fn instant(dt: DateTime<Utc>) -> Option<DateTimeBounds> {
    Some(DateTimeBounds { start: dt, end: dt })
}

fn day_span(first: NaiveDate, last: NaiveDate) -> Option<DateTimeBounds> {
    let start = first.and_hms_opt(0, 0, 0)?;
    let end = last.and_hms_micro_opt(23, 59, 59, 999_999)?;
    Some(DateTimeBounds {
        start: Utc.from_utc_datetime(&start),
        end: Utc.from_utc_datetime(&end),
    })
}

impl AnyDateTime for NaiveDateTime {
    fn datetime_bounds(self) -> Option<DateTimeBounds> {
        instant(Utc.from_utc_datetime(&self))
    }
}

impl AnyDateTime for DateTime<Utc> {
    fn datetime_bounds(self) -> Option<DateTimeBounds> {
        instant(self)
    }
}

impl AnyDateTime for DateTime<FixedOffset> {
    fn datetime_bounds(self) -> Option<DateTimeBounds> {
        instant(self.with_timezone(&Utc))
    }
}

impl AnyDateTime for NaiveDate {
    fn datetime_bounds(self) -> Option<DateTimeBounds> {
        day_span(self, self)
    }
}

impl AnyDateTime for Year {
    fn datetime_bounds(self) -> Option<DateTimeBounds> {
        day_span(
            NaiveDate::from_ymd_opt(self.0, 1, 1)?,
            NaiveDate::from_ymd_opt(self.0, 12, 31)?,
        )
    }
}

impl AnyDateTime for Month {
    fn datetime_bounds(self) -> Option<DateTimeBounds> {
        let (year, month) = (self.year(), self.month());
        day_span(
            NaiveDate::from_ymd_opt(year, month, 1)?,
            NaiveDate::from_ymd_opt(year, month, days_in_month(year, month)?)?,
        )
    }
}

impl AnyDateTime for &str {
    fn datetime_bounds(self) -> Option<DateTimeBounds> {
        let text = self.trim();
        if let Ok(dt) = text.parse::<DateTime<Utc>>() {
            return dt.datetime_bounds();
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return dt.datetime_bounds();
        }
        for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                return naive.datetime_bounds();
            }
        }
        // Hour precision, e.g. "2020-06-15T12"
        if let Some((date, hour)) = text.split_once('T') {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
            let hour = hour.parse::<u32>().ok()?;
            return date.and_hms_opt(hour, 0, 0)?.datetime_bounds();
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return date.datetime_bounds();
        }
        if let Some((year, month)) = text.split_once('-') {
            let year = year.parse::<i32>().ok()?;
            let month = month.parse::<u32>().ok()?;
            return Month(year, month).datetime_bounds();
        }
        if text.len() == 4 {
            return Year(text.parse::<i32>().ok()?).datetime_bounds();
        }
        None
    }
}

impl AnyDateTime for String {
    fn datetime_bounds(self) -> Option<DateTimeBounds> {
        self.as_str().datetime_bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instant_resolves_to_zero_length_span() {
        let dt = Utc.with_ymd_and_hms(2022, 1, 2, 0, 0, 0).unwrap();
        let bounds = dt.datetime_bounds().unwrap();
        assert_eq!(bounds.start, dt);
        assert_eq!(bounds.end, dt);
    }

    #[test]
    fn test_month_spans_whole_month() {
        let bounds = Month(2024, 2).datetime_bounds().unwrap();
        assert_eq!(bounds.start, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(
            bounds.end.date_naive(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_string_formats() {
        let hour = "2020-06-15T12".datetime_bounds().unwrap();
        assert_eq!(hour.start, Utc.with_ymd_and_hms(2020, 6, 15, 12, 0, 0).unwrap());
        assert_eq!(hour.start, hour.end);

        let day = "2020-05-01".datetime_bounds().unwrap();
        assert_eq!(day.start, Utc.with_ymd_and_hms(2020, 5, 1, 0, 0, 0).unwrap());
        assert_eq!(day.end.date_naive(), NaiveDate::from_ymd_opt(2020, 5, 1).unwrap());

        let month = "2017-01".datetime_bounds().unwrap();
        assert_eq!(month.end.date_naive(), NaiveDate::from_ymd_opt(2017, 1, 31).unwrap());

        let year = "2019".datetime_bounds().unwrap();
        assert_eq!(year.end.date_naive(), NaiveDate::from_ymd_opt(2019, 12, 31).unwrap());

        let rfc = "2022-01-02T00:00:00+00:00".datetime_bounds().unwrap();
        assert_eq!(rfc.start, Utc.with_ymd_and_hms(2022, 1, 2, 0, 0, 0).unwrap());

        assert!("not a date".datetime_bounds().is_none());
        assert!("2020-13".datetime_bounds().is_none());
    }
}
