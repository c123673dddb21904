use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

pub const MORNING_START_HOUR: u32 = 4;
pub const AFTERNOON_START_HOUR: u32 = 12;
pub const EVENING_START_HOUR: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CarePhase {
    Morning,
    Afternoon,
    Evening,
}

impl CarePhase {
    /// Morning [4,12), afternoon [12,16), evening [16,24) and [0,4).
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            MORNING_START_HOUR..AFTERNOON_START_HOUR => CarePhase::Morning,
            AFTERNOON_START_HOUR..EVENING_START_HOUR => CarePhase::Afternoon,
            _ => CarePhase::Evening,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CarePhase::Morning => "morning",
            CarePhase::Afternoon => "afternoon",
            CarePhase::Evening => "evening",
        }
    }
}

/// Half-open `[start, end)` span of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// The care period a wall-clock reading falls in.
///
/// Morning and afternoon share the window that opens at 04:00, so a morning
/// feeding still counts through the afternoon. The evening window opens at
/// 16:00 and runs to 04:00 the next day, which is why the small hours look
/// back to the previous day's 16:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarePeriod {
    pub phase: CarePhase,
    pub window: Interval,
    pub local_hour: u32,
}

impl CarePeriod {
    pub fn at(now: DateTime<Utc>, tz: Tz) -> Self {
        let local = now.with_timezone(&tz);
        let hour = local.hour();
        let today = local.date_naive();
        let yesterday = today.pred_opt().unwrap_or(today);
        let tomorrow = today.succ_opt().unwrap_or(today);

        let (start, end) = match hour {
            MORNING_START_HOUR..EVENING_START_HOUR => (
                (today, MORNING_START_HOUR),
                (today, EVENING_START_HOUR),
            ),
            EVENING_START_HOUR.. => ((today, EVENING_START_HOUR), (tomorrow, MORNING_START_HOUR)),
            _ => ((yesterday, EVENING_START_HOUR), (today, MORNING_START_HOUR)),
        };

        CarePeriod {
            phase: CarePhase::from_hour(hour),
            window: Interval {
                start: local_instant(tz, start.0, start.1),
                end: local_instant(tz, end.0, end.1),
            },
            local_hour: hour,
        }
    }

    /// Late-night rest: the banner stays quiet between midnight and 04:00.
    pub fn is_quiet_hours(&self) -> bool {
        self.local_hour < MORNING_START_HOUR
    }
}

/// Local calendar day containing `now`.
pub fn local_day(now: DateTime<Utc>, tz: Tz) -> Interval {
    let today = now.with_timezone(&tz).date_naive();
    let tomorrow = today.succ_opt().unwrap_or(today);
    Interval {
        start: local_instant(tz, today, 0),
        end: local_instant(tz, tomorrow, 0),
    }
}

/// Resolve an IANA name; missing or blank means UTC.
pub fn parse_timezone(name: Option<&str>) -> Result<Tz, String> {
    match name.map(str::trim) {
        None | Some("") => Ok(Tz::UTC),
        Some(name) => name
            .parse::<Tz>()
            .map_err(|_| format!("Unknown timezone: {name}")),
    }
}

/// `hour:00` local time on `date`, as UTC. Skipped local times (DST gaps)
/// move forward to the first valid quarter hour; repeated ones take the
/// earlier instant.
fn local_instant(tz: Tz, date: NaiveDate, hour: u32) -> DateTime<Utc> {
    let naive: NaiveDateTime = date.and_time(NaiveTime::MIN) + Duration::hours(i64::from(hour));
    let mut candidate = naive;
    for _ in 0..16 {
        if let Some(resolved) = tz.from_local_datetime(&candidate).earliest() {
            return resolved.with_timezone(&Utc);
        }
        candidate += Duration::minutes(15);
    }
    Utc.from_utc_datetime(&naive)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn phases_follow_local_hour() {
        assert_eq!(CarePhase::from_hour(0), CarePhase::Evening);
        assert_eq!(CarePhase::from_hour(3), CarePhase::Evening);
        assert_eq!(CarePhase::from_hour(4), CarePhase::Morning);
        assert_eq!(CarePhase::from_hour(11), CarePhase::Morning);
        assert_eq!(CarePhase::from_hour(12), CarePhase::Afternoon);
        assert_eq!(CarePhase::from_hour(15), CarePhase::Afternoon);
        assert_eq!(CarePhase::from_hour(16), CarePhase::Evening);
        assert_eq!(CarePhase::from_hour(23), CarePhase::Evening);
    }

    #[test]
    fn morning_window_opens_at_four_and_runs_to_four_pm() {
        let period = CarePeriod::at(utc("2025-03-10T10:00:00Z"), Tz::UTC);
        assert_eq!(period.phase, CarePhase::Morning);
        assert_eq!(period.window.start, utc("2025-03-10T04:00:00Z"));
        assert_eq!(period.window.end, utc("2025-03-10T16:00:00Z"));
    }

    #[test]
    fn afternoon_keeps_the_morning_window() {
        let period = CarePeriod::at(utc("2025-03-10T14:30:00Z"), Tz::UTC);
        assert_eq!(period.phase, CarePhase::Afternoon);
        assert_eq!(period.window.start, utc("2025-03-10T04:00:00Z"));
    }

    #[test]
    fn evening_window_spans_midnight() {
        let period = CarePeriod::at(utc("2025-03-10T20:00:00Z"), Tz::UTC);
        assert_eq!(period.phase, CarePhase::Evening);
        assert_eq!(period.window.start, utc("2025-03-10T16:00:00Z"));
        assert_eq!(period.window.end, utc("2025-03-11T04:00:00Z"));
    }

    #[test]
    fn small_hours_look_back_to_previous_evening() {
        let period = CarePeriod::at(utc("2025-03-11T02:00:00Z"), Tz::UTC);
        assert_eq!(period.phase, CarePhase::Evening);
        assert!(period.is_quiet_hours());
        assert_eq!(period.window.start, utc("2025-03-10T16:00:00Z"));
        assert_eq!(period.window.end, utc("2025-03-11T04:00:00Z"));
    }

    #[test]
    fn window_boundaries_are_half_open() {
        let period = CarePeriod::at(utc("2025-03-10T10:00:00Z"), Tz::UTC);
        assert!(period.window.contains(utc("2025-03-10T04:00:00Z")));
        assert!(!period.window.contains(utc("2025-03-10T03:59:59Z")));
        assert!(!period.window.contains(utc("2025-03-10T16:00:00Z")));
    }

    #[test]
    fn boundaries_are_computed_in_the_requested_timezone() {
        // 14:00 UTC is 10:00 in New York (EDT, UTC-4) on this date.
        let tz: Tz = "America/New_York".parse().unwrap();
        let period = CarePeriod::at(utc("2025-06-02T14:00:00Z"), tz);
        assert_eq!(period.phase, CarePhase::Morning);
        assert_eq!(period.window.start, utc("2025-06-02T08:00:00Z"));
        assert_eq!(period.window.end, utc("2025-06-02T20:00:00Z"));
    }

    #[test]
    fn local_day_uses_local_midnight() {
        let tz: Tz = "Asia/Tokyo".parse().unwrap();
        // 20:00 UTC on the 1st is 05:00 on the 2nd in Tokyo.
        let day = local_day(utc("2025-06-01T20:00:00Z"), tz);
        assert_eq!(day.start, utc("2025-06-01T15:00:00Z"));
        assert_eq!(day.end, utc("2025-06-02T15:00:00Z"));
    }

    #[test]
    fn dst_gap_at_midnight_moves_forward() {
        // Santiago skipped 00:00-01:00 local on 2024-09-08.
        let tz: Tz = "America/Santiago".parse().unwrap();
        let day = local_day(utc("2024-09-08T12:00:00Z"), tz);
        assert_eq!(day.start, utc("2024-09-08T04:00:00Z"));
    }

    #[test]
    fn timezone_parsing_defaults_to_utc() {
        assert_eq!(parse_timezone(None).unwrap(), Tz::UTC);
        assert_eq!(parse_timezone(Some("  ")).unwrap(), Tz::UTC);
        assert!(parse_timezone(Some("Mars/Olympus")).is_err());
    }
}
