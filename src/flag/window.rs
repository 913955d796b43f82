use chrono::{Datelike, NaiveTime, TimeDelta, Timelike, Weekday};
use chrono_tz::Tz;
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

use super::{windows_zones, Timestamp};

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A daily time-of-day window, evaluated in a time zone and restricted to a set of weekdays.
///
/// A window whose start and end are both midnight is the "no window" sentinel: see
/// [`has_window`](TimeZoneWindow::has_window). A window whose start is after its end spans
/// midnight (e.g. `22:00–06:00`). Both ends are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "WindowWire")]
pub struct TimeZoneWindow {
    window_start_time: NaiveTime,
    window_end_time: NaiveTime,
    time_zone: Tz,
    window_days: Vec<Weekday>,
}

/// Outcome of checking a window at an instant.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum WindowStatus {
    #[display("No operational window set")]
    NoWindow,
    #[display("Invalid timezone: {_0}")]
    InvalidTimeZone(String),
    #[display("Outside allowed days")]
    OutsideAllowedDays,
    #[display("Outside time window")]
    OutsideTimeWindow,
    #[display("Within time window")]
    WithinTimeWindow,
}

impl WindowStatus {
    /// `NoWindow` counts as active: a flag without a window is always operational.
    pub fn is_active(&self) -> bool {
        matches!(self, WindowStatus::NoWindow | WindowStatus::WithinTimeWindow)
    }
}

impl Default for TimeZoneWindow {
    fn default() -> Self {
        Self::none()
    }
}

impl TimeZoneWindow {
    /// The "no window" value.
    pub fn none() -> Self {
        TimeZoneWindow {
            window_start_time: NaiveTime::MIN,
            window_end_time: NaiveTime::MIN,
            time_zone: Tz::UTC,
            window_days: ALL_DAYS.to_vec(),
        }
    }

    /// Create a window from `start` to `end`, both measured from local midnight in `time_zone`.
    ///
    /// `start` and `end` must lie within `[00:00:00, 23:59:59]` and `time_zone` must be a known
    /// IANA or Windows identifier. Duplicate days are dropped; no days means every day.
    pub fn create(
        start: TimeDelta,
        end: TimeDelta,
        time_zone: &str,
        days: &[Weekday],
    ) -> Result<Self> {
        let window_start_time = time_of_day("start", start)?;
        let window_end_time = time_of_day("end", end)?;
        let time_zone = resolve_time_zone(time_zone).ok_or_else(|| {
            Error::invalid_argument("time_zone", format!("unknown time zone `{time_zone}`"))
        })?;

        Ok(TimeZoneWindow {
            window_start_time,
            window_end_time,
            time_zone,
            window_days: normalize_days(days),
        })
    }

    pub fn window_start_time(&self) -> NaiveTime {
        self.window_start_time
    }

    pub fn window_end_time(&self) -> NaiveTime {
        self.window_end_time
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    pub fn window_days(&self) -> &[Weekday] {
        &self.window_days
    }

    pub fn has_window(&self) -> bool {
        !(self.window_start_time == NaiveTime::MIN && self.window_end_time == NaiveTime::MIN)
    }

    /// Check whether `instant` falls inside the window, in `time_zone_override` if given and in
    /// the window's own zone otherwise.
    pub fn is_active_at(
        &self,
        instant: Timestamp,
        time_zone_override: Option<&str>,
    ) -> WindowStatus {
        if !self.has_window() {
            return WindowStatus::NoWindow;
        }

        let time_zone = match time_zone_override {
            Some(id) => match resolve_time_zone(id) {
                Some(tz) => tz,
                None => return WindowStatus::InvalidTimeZone(id.to_owned()),
            },
            None => self.time_zone,
        };

        let local = instant.with_timezone(&time_zone);
        if !self.window_days.contains(&local.weekday()) {
            return WindowStatus::OutsideAllowedDays;
        }

        let now = local.time();
        let start = self.window_start_time;
        let end = self.window_end_time;
        let within = if start <= end {
            start <= now && now <= end
        } else {
            now >= start || now <= end
        };

        if within {
            WindowStatus::WithinTimeWindow
        } else {
            WindowStatus::OutsideTimeWindow
        }
    }
}

fn time_of_day(argument: &'static str, offset: TimeDelta) -> Result<NaiveTime> {
    let max = TimeDelta::seconds(24 * 60 * 60 - 1);
    if offset < TimeDelta::zero() || offset > max {
        return Err(Error::invalid_argument(
            argument,
            "time of day must be between 00:00:00 and 23:59:59",
        ));
    }
    let seconds = offset.num_seconds() as u32;
    let nanos = offset.subsec_nanos() as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, nanos).ok_or_else(|| {
        Error::invalid_argument(argument, "time of day must be between 00:00:00 and 23:59:59")
    })
}

/// Resolve an IANA id, falling back to the Windows id table.
fn resolve_time_zone(id: &str) -> Option<Tz> {
    let id = id.trim();
    id.parse::<Tz>()
        .ok()
        .or_else(|| windows_zones::from_windows_id(id))
}

fn normalize_days(days: &[Weekday]) -> Vec<Weekday> {
    let mut unique = Vec::with_capacity(days.len());
    for day in days {
        if !unique.contains(day) {
            unique.push(*day);
        }
    }
    if unique.is_empty() {
        ALL_DAYS.to_vec()
    } else {
        unique
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WindowWire {
    #[serde(default = "midnight")]
    window_start_time: NaiveTime,
    #[serde(default = "midnight")]
    window_end_time: NaiveTime,
    #[serde(default = "utc")]
    time_zone: String,
    #[serde(default)]
    window_days: Vec<Weekday>,
}

fn midnight() -> NaiveTime {
    NaiveTime::MIN
}

fn utc() -> String {
    "UTC".to_owned()
}

impl TryFrom<WindowWire> for TimeZoneWindow {
    type Error = Error;

    fn try_from(wire: WindowWire) -> Result<Self> {
        let since_midnight = |t: NaiveTime| {
            TimeDelta::seconds(i64::from(t.num_seconds_from_midnight()))
                + TimeDelta::nanoseconds(i64::from(t.nanosecond()))
        };
        TimeZoneWindow::create(
            since_midnight(wire.window_start_time),
            since_midnight(wire.window_end_time),
            &wire.time_zone,
            &wire.window_days,
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeDelta, TimeZone, Utc, Weekday};

    use super::{TimeZoneWindow, WindowStatus};
    use crate::Error;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        // 2024-03-06 is a Wednesday.
        Utc.with_ymd_and_hms(2024, 3, 6, h, m, s).unwrap()
    }

    fn window(start_h: i64, end_h: i64) -> TimeZoneWindow {
        TimeZoneWindow::create(
            TimeDelta::hours(start_h),
            TimeDelta::hours(end_h),
            "UTC",
            &[],
        )
        .unwrap()
    }

    #[test]
    fn overnight_window() {
        let w = window(22, 6);
        let status = w.is_active_at(at(2, 0, 0), None);
        assert_eq!(status, WindowStatus::WithinTimeWindow);
        assert_eq!(status.to_string(), "Within time window");

        let status = w.is_active_at(at(12, 0, 0), None);
        assert_eq!(status, WindowStatus::OutsideTimeWindow);
        assert_eq!(status.to_string(), "Outside time window");

        assert!(w.is_active_at(at(23, 30, 0), None).is_active());
    }

    #[test]
    fn same_day_window_is_inclusive() {
        let w = window(9, 17);
        assert!(w.is_active_at(at(9, 0, 0), None).is_active());
        assert!(w.is_active_at(at(17, 0, 0), None).is_active());
        assert!(!w.is_active_at(at(8, 59, 59), None).is_active());
        assert!(!w.is_active_at(at(17, 0, 1), None).is_active());
    }

    #[test]
    fn allowed_days_use_local_day() {
        // 09:00-17:00 on Thursdays in Auckland (UTC+13 in March).
        let w = TimeZoneWindow::create(
            TimeDelta::hours(9),
            TimeDelta::hours(17),
            "Pacific/Auckland",
            &[Weekday::Thu],
        )
        .unwrap();

        // Wednesday 22:00 UTC is Thursday 11:00 in Auckland.
        assert_eq!(
            w.is_active_at(at(22, 0, 0), None),
            WindowStatus::WithinTimeWindow
        );
        // Wednesday 02:00 UTC is Wednesday 15:00 in Auckland.
        let status = w.is_active_at(at(2, 0, 0), None);
        assert_eq!(status, WindowStatus::OutsideAllowedDays);
        assert_eq!(status.to_string(), "Outside allowed days");
    }

    #[test]
    fn context_time_zone_override() {
        let w = window(9, 17);
        // 20:00 UTC is 15:00 in New York (EST, UTC-5 on 2024-03-06).
        assert!(!w.is_active_at(at(20, 0, 0), None).is_active());
        assert!(w
            .is_active_at(at(20, 0, 0), Some("America/New_York"))
            .is_active());

        let status = w.is_active_at(at(12, 0, 0), Some("Mars/Olympus_Mons"));
        assert!(!status.is_active());
        assert_eq!(status.to_string(), "Invalid timezone: Mars/Olympus_Mons");
    }

    #[test]
    fn windows_time_zone_ids() {
        let w = TimeZoneWindow::create(
            TimeDelta::hours(9),
            TimeDelta::hours(17),
            "Eastern Standard Time",
            &[],
        )
        .unwrap();
        assert_eq!(w.time_zone(), chrono_tz::America::New_York);
        // 20:00 UTC is 15:00 EST.
        assert!(w.is_active_at(at(20, 0, 0), None).is_active());

        // 20:00 UTC is 12:00 PST, 16:00 UTC is 08:00 PST.
        let w = window(9, 17);
        assert!(w
            .is_active_at(at(20, 0, 0), Some("Pacific Standard Time"))
            .is_active());
        assert_eq!(
            w.is_active_at(at(16, 0, 0), Some(" Pacific Standard Time ")),
            WindowStatus::OutsideTimeWindow
        );

        let w: TimeZoneWindow = serde_json::from_str(
            r#"{"windowStartTime": "09:00:00", "windowEndTime": "10:00:00", "timeZone": "Tokyo Standard Time"}"#,
        )
        .unwrap();
        assert_eq!(w.time_zone(), chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn overnight_window_bounds_are_inclusive() {
        let w = window(22, 6);
        assert_eq!(
            w.is_active_at(at(22, 0, 0), None),
            WindowStatus::WithinTimeWindow
        );
        assert_eq!(
            w.is_active_at(at(6, 0, 0), None),
            WindowStatus::WithinTimeWindow
        );
        assert_eq!(
            w.is_active_at(at(21, 59, 59), None),
            WindowStatus::OutsideTimeWindow
        );
        assert_eq!(
            w.is_active_at(at(6, 0, 1), None),
            WindowStatus::OutsideTimeWindow
        );
    }

    #[test]
    fn allowed_days_west_of_utc() {
        // 18:00-20:00 on Tuesdays in Los Angeles (PST, UTC-8 on 2024-03-06).
        let w = TimeZoneWindow::create(
            TimeDelta::hours(18),
            TimeDelta::hours(20),
            "America/Los_Angeles",
            &[Weekday::Tue],
        )
        .unwrap();

        // Wednesday 02:00 UTC is Tuesday 18:00 in Los Angeles.
        assert_eq!(
            w.is_active_at(at(2, 0, 0), None),
            WindowStatus::WithinTimeWindow
        );
        // Wednesday 22:00 UTC is Wednesday 14:00 in Los Angeles.
        assert_eq!(
            w.is_active_at(at(22, 0, 0), None),
            WindowStatus::OutsideAllowedDays
        );
    }

    #[test]
    fn zero_length_window_means_no_window() {
        let w = window(0, 0);
        assert!(!w.has_window());
        assert_eq!(w, TimeZoneWindow::none());
        assert_eq!(w.is_active_at(at(12, 0, 0), None), WindowStatus::NoWindow);
        assert!(window(0, 1).has_window());
    }

    #[test]
    fn days_are_deduplicated_and_default_to_all() {
        let w = TimeZoneWindow::create(
            TimeDelta::hours(1),
            TimeDelta::hours(2),
            "UTC",
            &[Weekday::Mon, Weekday::Mon, Weekday::Fri],
        )
        .unwrap();
        assert_eq!(w.window_days(), &[Weekday::Mon, Weekday::Fri]);
        assert_eq!(window(1, 2).window_days().len(), 7);
    }

    #[test]
    fn rejects_out_of_range_times_and_unknown_zones() {
        let create = |start: TimeDelta, end: TimeDelta, tz: &str| {
            TimeZoneWindow::create(start, end, tz, &[])
        };
        assert!(matches!(
            create(TimeDelta::seconds(-1), TimeDelta::hours(1), "UTC"),
            Err(Error::InvalidArgument {
                argument: "start",
                ..
            })
        ));
        assert!(matches!(
            create(TimeDelta::hours(1), TimeDelta::hours(24), "UTC"),
            Err(Error::InvalidArgument { argument: "end", .. })
        ));
        assert!(create(
            TimeDelta::zero(),
            TimeDelta::seconds(24 * 60 * 60 - 1),
            "UTC"
        )
        .is_ok());
        assert!(matches!(
            create(TimeDelta::hours(1), TimeDelta::hours(2), "Not/AZone"),
            Err(Error::InvalidArgument {
                argument: "time_zone",
                ..
            })
        ));
    }

    #[test]
    fn deserializes_with_validation() {
        let w: TimeZoneWindow = serde_json::from_str(
            r#"{
                "windowStartTime": "22:00:00",
                "windowEndTime": "06:00:00",
                "timeZone": "Europe/Berlin",
                "windowDays": ["Mon", "Tue"]
            }"#,
        )
        .unwrap();
        assert_eq!(w.time_zone(), chrono_tz::Europe::Berlin);
        assert_eq!(w.window_days(), &[Weekday::Mon, Weekday::Tue]);

        let w: TimeZoneWindow = serde_json::from_str("{}").unwrap();
        assert!(!w.has_window());

        assert!(serde_json::from_str::<TimeZoneWindow>(
            r#"{"windowStartTime": "09:00:00", "windowEndTime": "10:00:00", "timeZone": "Nowhere"}"#
        )
        .is_err());
    }
}
