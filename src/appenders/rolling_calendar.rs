//! Rollover boundaries for the daily rolling file appender

use crate::layout::DatePattern;
use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike, Utc, Weekday,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How often a date pattern changes its rendered value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Periodicity {
    TopOfMinute,
    TopOfHour,
    HalfDay,
    TopOfDay,
    TopOfWeek,
    TopOfMonth,
}

impl Periodicity {
    /// Candidates in the order they are probed
    pub const ALL: [Periodicity; 6] = [
        Periodicity::TopOfMinute,
        Periodicity::TopOfHour,
        Periodicity::HalfDay,
        Periodicity::TopOfDay,
        Periodicity::TopOfWeek,
        Periodicity::TopOfMonth,
    ];

    /// Find the shortest period whose boundary changes the rendering of
    /// `pattern`, probing in UTC from the epoch.
    pub fn infer(pattern: &DatePattern, first_day_of_week: Weekday) -> Option<Periodicity> {
        let epoch = DateTime::<Utc>::from(std::time::UNIX_EPOCH);
        let at_epoch = pattern.format(&epoch);
        Self::ALL.into_iter().find(|&periodicity| {
            let next = RollingCalendar::new(periodicity, first_day_of_week).next_boundary(&epoch);
            pattern.format(&next) != at_epoch
        })
    }
}

impl fmt::Display for Periodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Periodicity::TopOfMinute => "every minute",
            Periodicity::TopOfHour => "at the top of every hour",
            Periodicity::HalfDay => "at midday and midnight",
            Periodicity::TopOfDay => "at midnight",
            Periodicity::TopOfWeek => "at the start of week",
            Periodicity::TopOfMonth => "at start of every month",
        };
        f.write_str(text)
    }
}

/// Computes the start of the interval following a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingCalendar {
    periodicity: Periodicity,
    first_day_of_week: Weekday,
}

impl RollingCalendar {
    pub fn new(periodicity: Periodicity, first_day_of_week: Weekday) -> Self {
        Self {
            periodicity,
            first_day_of_week,
        }
    }

    pub fn periodicity(&self) -> Periodicity {
        self.periodicity
    }

    /// Next boundary in wall-clock terms; all finer fields are zeroed
    pub fn next_boundary_naive(&self, now: NaiveDateTime) -> NaiveDateTime {
        let date = now.date();
        let midnight = |d: NaiveDate| d.and_time(NaiveTime::MIN);
        match self.periodicity {
            Periodicity::TopOfMinute => {
                truncate(now, now.hour(), now.minute()) + Duration::minutes(1)
            }
            Periodicity::TopOfHour => truncate(now, now.hour(), 0) + Duration::hours(1),
            Periodicity::HalfDay => {
                if now.hour() < 12 {
                    truncate(now, 12, 0)
                } else {
                    midnight(date + Duration::days(1))
                }
            }
            Periodicity::TopOfDay => midnight(date + Duration::days(1)),
            Periodicity::TopOfWeek => {
                let back = (7 + date.weekday().num_days_from_monday()
                    - self.first_day_of_week.num_days_from_monday())
                    % 7;
                midnight(date - Duration::days(i64::from(back)) + Duration::days(7))
            }
            Periodicity::TopOfMonth => {
                let (year, month) = if date.month() == 12 {
                    (date.year() + 1, 1)
                } else {
                    (date.year(), date.month() + 1)
                };
                NaiveDate::from_ymd_opt(year, month, 1)
                    .map(midnight)
                    .unwrap_or_else(|| midnight(date + Duration::days(31)))
            }
        }
    }

    /// Next boundary in `now`'s time zone. A boundary that falls into a
    /// daylight-saving gap moves to the first instant after the gap; an
    /// ambiguous one resolves to the earlier instant.
    pub fn next_boundary<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let timezone = now.timezone();
        let naive = self.next_boundary_naive(now.naive_local());
        match timezone.from_local_datetime(&naive) {
            LocalResult::Single(boundary) => boundary,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => {
                let mut probe = naive;
                for _ in 0..4 {
                    probe += Duration::minutes(30);
                    if let Some(boundary) = timezone.from_local_datetime(&probe).earliest() {
                        return boundary;
                    }
                }
                timezone.from_utc_datetime(&naive)
            }
        }
    }
}

fn truncate(now: NaiveDateTime, hour: u32, minute: u32) -> NaiveDateTime {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    now.date().and_time(time)
}
