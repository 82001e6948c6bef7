//! Tick arithmetic for DATE, TIME_OF_DAY and DATE_AND_TIME values.
//!
//! Ticks are 100 ns units. Dates count from 0001-01-01T00:00:00, times of day
//! from midnight.

pub const TICKS_PER_MILLISECOND: i64 = 10_000;
pub const TICKS_PER_SECOND: i64 = 10_000_000;
pub const TICKS_PER_MINUTE: i64 = 60 * TICKS_PER_SECOND;
pub const TICKS_PER_HOUR: i64 = 60 * TICKS_PER_MINUTE;
pub const TICKS_PER_DAY: i64 = 24 * TICKS_PER_HOUR;

/// Days between 0001-01-01 and the Unix epoch.
const DAYS_TO_UNIX_EPOCH: i64 = 719_162;

/// Calendar fields of a tick value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CivilDateTime {
    pub year: i64,
    pub month: i64,
    pub day: i64,
    pub hour: i64,
    pub minute: i64,
    pub second: i64,
}

fn days_from_civil(year: i64, month: i64, day: i64) -> Option<i64> {
    if !(1..=12).contains(&month) || !(1..=days_in_month(year, month)).contains(&day) {
        return None;
    }
    let y = year - i64::from(month <= 2);
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let m = month + if month > 2 { -3 } else { 9 };
    let doy = (153 * m + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    Some(era * 146_097 + doe - 719_468)
}

fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

fn is_leap(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i64, month: i64) -> i64 {
    match month {
        2 if is_leap(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Ticks at midnight of the given calendar date.
#[must_use]
pub fn date_to_ticks(year: i64, month: i64, day: i64) -> Option<i64> {
    if !(1..=9999).contains(&year) {
        return None;
    }
    let days = days_from_civil(year, month, day)? + DAYS_TO_UNIX_EPOCH;
    days.checked_mul(TICKS_PER_DAY)
}

/// Ticks since midnight.
#[must_use]
pub fn time_of_day_to_ticks(hour: i64, minute: i64, second: i64, millis: i64) -> Option<i64> {
    if !(0..24).contains(&hour)
        || !(0..60).contains(&minute)
        || !(0..60).contains(&second)
        || !(0..1000).contains(&millis)
    {
        return None;
    }
    Some(
        hour * TICKS_PER_HOUR
            + minute * TICKS_PER_MINUTE
            + second * TICKS_PER_SECOND
            + millis * TICKS_PER_MILLISECOND,
    )
}

/// Splits an absolute tick value into calendar fields.
#[must_use]
pub fn civil_from_ticks(ticks: i64) -> CivilDateTime {
    let days = ticks.div_euclid(TICKS_PER_DAY);
    let within = ticks.rem_euclid(TICKS_PER_DAY);
    let (year, month, day) = civil_from_days(days - DAYS_TO_UNIX_EPOCH);
    CivilDateTime {
        year,
        month,
        day,
        hour: within / TICKS_PER_HOUR,
        minute: (within / TICKS_PER_MINUTE) % 60,
        second: (within / TICKS_PER_SECOND) % 60,
    }
}

/// Midnight of the day containing `ticks`.
#[must_use]
pub fn date_part(ticks: i64) -> i64 {
    ticks - ticks.rem_euclid(TICKS_PER_DAY)
}

/// Time-of-day portion of `ticks`.
#[must_use]
pub fn time_of_day_part(ticks: i64) -> i64 {
    ticks.rem_euclid(TICKS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_epoch_in_ticks() {
        assert_eq!(date_to_ticks(1970, 1, 1), Some(621_355_968_000_000_000));
        assert_eq!(date_to_ticks(1, 1, 1), Some(0));
    }

    #[test]
    fn civil_roundtrip_through_leap_day() {
        let ticks = date_to_ticks(2024, 2, 29).unwrap() + time_of_day_to_ticks(13, 5, 9, 0).unwrap();
        let civil = civil_from_ticks(ticks);
        assert_eq!(
            civil,
            CivilDateTime {
                year: 2024,
                month: 2,
                day: 29,
                hour: 13,
                minute: 5,
                second: 9
            }
        );
        assert_eq!(date_part(ticks), date_to_ticks(2024, 2, 29).unwrap());
        assert_eq!(time_of_day_part(ticks), time_of_day_to_ticks(13, 5, 9, 0).unwrap());
    }

    #[test]
    fn rejects_invalid_dates() {
        assert_eq!(date_to_ticks(2023, 2, 29), None);
        assert_eq!(date_to_ticks(2024, 13, 1), None);
        assert_eq!(time_of_day_to_ticks(24, 0, 0, 0), None);
    }
}
