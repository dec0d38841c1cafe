//! # Epochs and time systems
//!
//! This module wraps [`hifitime`] into the small epoch surface the rest of the crate
//! needs: build an epoch from an OEM date string and a `TIME_SYSTEM`, subtract two
//! epochs to get elapsed seconds, order them, shift them, and format them back.
//!
//! ## Calendars
//!
//! * `UTC` labels are mapped onto TAI with hifitime's IERS leap-second table.
//!   `23:59:60` is accepted on days that end with a leap second and formatted back
//!   as such.
//! * `TAI`, `TT` and `GPS` are uniform scales; their calendar labels are mapped onto
//!   a uniform (TAI) calendar, which keeps elapsed seconds exact.
//! * Every other `TIME_SYSTEM` (`TDB`, `UT1`, `MET`, `SCLK`, ...) is not supported by the
//!   time library. These degrade to the same naive uniform calendar and a warning is
//!   logged when the time system is resolved.
//!
//! Epochs built in different calendars are not comparable in any physical sense; a
//! message is required to carry a single `TIME_SYSTEM` for this reason.
//!
//! ## Formats
//!
//! Input accepts `YYYY-MM-DDThh:mm:ss[.f*][Z]` and the day-of-year form
//! `YYYY-DDDThh:mm:ss[.f*][Z]`. Output is always `YYYY-MM-DDThh:mm:ss.ffffff`.
use std::cmp::Ordering;
use std::fmt;
use std::ops::Sub;
use std::sync::LazyLock;

use hifitime::{Duration, Epoch, TimeScale, Unit};
use regex::Regex;

use crate::constants::EPOCH_FRACTION_DIGITS;
use crate::oem_errors::OemError;

static CALENDAR_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})(?:\.(\d*))?Z?$")
        .expect("calendar date pattern")
});

static ORDINAL_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{3})T(\d{2}):(\d{2}):(\d{2})(?:\.(\d*))?Z?$")
        .expect("ordinal date pattern")
});

/// Calendar used to map an OEM date label onto an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Calendar {
    /// Leap-second aware UTC calendar
    Utc,
    /// Uniform calendar without leap seconds (TAI labelling)
    Uniform,
}

/// Value of the `TIME_SYSTEM` metadata keyword.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimeSystem {
    Utc,
    Tai,
    Tt,
    Gps,
    Tdb,
    Tcb,
    Tcg,
    Ut1,
    Gmst,
    Met,
    Mrt,
    Sclk,
    Other(String),
}

impl TimeSystem {
    /// Resolve a `TIME_SYSTEM` value.
    ///
    /// Unknown names are kept verbatim in [`TimeSystem::Other`]. Time systems the time
    /// library cannot handle exactly are accepted with a warning; their epochs use naive
    /// uniform calendar arithmetic.
    pub fn resolve(name: &str) -> Self {
        let system = Self::from_name(name);
        if !system.is_supported() {
            tracing::warn!(
                time_system = system.as_str(),
                "Unsupported time system, falling back to naive calendar arithmetic"
            );
        }
        system
    }

    /// Same as [`TimeSystem::resolve`] without the warning.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "UTC" => TimeSystem::Utc,
            "TAI" => TimeSystem::Tai,
            "TT" => TimeSystem::Tt,
            "GPS" => TimeSystem::Gps,
            "TDB" => TimeSystem::Tdb,
            "TCB" => TimeSystem::Tcb,
            "TCG" => TimeSystem::Tcg,
            "UT1" => TimeSystem::Ut1,
            "GMST" => TimeSystem::Gmst,
            "MET" => TimeSystem::Met,
            "MRT" => TimeSystem::Mrt,
            "SCLK" => TimeSystem::Sclk,
            _ => TimeSystem::Other(name.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TimeSystem::Utc => "UTC",
            TimeSystem::Tai => "TAI",
            TimeSystem::Tt => "TT",
            TimeSystem::Gps => "GPS",
            TimeSystem::Tdb => "TDB",
            TimeSystem::Tcb => "TCB",
            TimeSystem::Tcg => "TCG",
            TimeSystem::Ut1 => "UT1",
            TimeSystem::Gmst => "GMST",
            TimeSystem::Met => "MET",
            TimeSystem::Mrt => "MRT",
            TimeSystem::Sclk => "SCLK",
            TimeSystem::Other(name) => name,
        }
    }

    /// `true` when epochs in this system are handled exactly by the time library.
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            TimeSystem::Utc | TimeSystem::Tai | TimeSystem::Tt | TimeSystem::Gps
        )
    }

    pub fn calendar(&self) -> Calendar {
        match self {
            TimeSystem::Utc => Calendar::Utc,
            _ => Calendar::Uniform,
        }
    }
}

impl fmt::Display for TimeSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque OEM epoch.
///
/// Supports ordering, subtraction to elapsed seconds (`a - b`), shifting by seconds
/// and formatting back to the standard OEM string.
#[derive(Debug, Clone, Copy)]
pub struct OemEpoch {
    /// Always held on the TAI scale
    instant: Epoch,
    calendar: Calendar,
}

impl OemEpoch {
    /// Parse an OEM date string labelled in the given calendar.
    ///
    /// Arguments
    /// -----------------
    /// * `text`: calendar (`YYYY-MM-DDThh:mm:ss.f`) or ordinal (`YYYY-DDDThh:mm:ss.f`) date.
    /// * `calendar`: calendar of the owning `TIME_SYSTEM`.
    ///
    /// Return
    /// ----------
    /// * The epoch, or [`OemError::Validation`] if the text is not a valid date.
    ///   Fractional seconds beyond nanoseconds are truncated.
    pub fn parse(text: &str, calendar: Calendar) -> Result<Self, OemError> {
        let text = text.trim();
        let invalid = || OemError::Validation(format!("Invalid epoch: '{text}'"));

        let (year, month, day, hour, minute, second, fraction) =
            if let Some(caps) = CALENDAR_DATE.captures(text) {
                (
                    caps[1].parse::<i32>().map_err(|_| invalid())?,
                    caps[2].parse::<u8>().map_err(|_| invalid())?,
                    caps[3].parse::<u8>().map_err(|_| invalid())?,
                    caps[4].parse::<u8>().map_err(|_| invalid())?,
                    caps[5].parse::<u8>().map_err(|_| invalid())?,
                    caps[6].parse::<u8>().map_err(|_| invalid())?,
                    caps.get(7).map(|m| m.as_str()).unwrap_or(""),
                )
            } else if let Some(caps) = ORDINAL_DATE.captures(text) {
                let year = caps[1].parse::<i32>().map_err(|_| invalid())?;
                let ordinal = caps[2].parse::<u16>().map_err(|_| invalid())?;
                let (month, day) = month_day_from_ordinal(year, ordinal).ok_or_else(invalid)?;
                (
                    year,
                    month,
                    day,
                    caps[3].parse::<u8>().map_err(|_| invalid())?,
                    caps[4].parse::<u8>().map_err(|_| invalid())?,
                    caps[5].parse::<u8>().map_err(|_| invalid())?,
                    caps.get(6).map(|m| m.as_str()).unwrap_or(""),
                )
            } else {
                return Err(invalid());
            };

        if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
            return Err(invalid());
        }
        if hour > 23 || minute > 59 || second > 60 {
            return Err(invalid());
        }
        let leap = second == 60;
        if leap && (calendar != Calendar::Utc || hour != 23 || minute != 59) {
            return Err(invalid());
        }

        let nanos = fraction_to_nanos(fraction);
        // calendar reading in seconds since J1900, leap seconds not counted
        let reading = Epoch::maybe_from_gregorian(
            year,
            month,
            day,
            hour,
            minute,
            second.min(59),
            nanos,
            TimeScale::TAI,
        )
        .map_err(|err| OemError::Validation(format!("Invalid epoch '{text}': {err}")))?
        .to_tai_duration();

        let tai = match calendar {
            Calendar::Uniform => reading,
            Calendar::Utc if leap => {
                let offset = leap_seconds_at(reading);
                let midnight = reading - Unit::Nanosecond * f64::from(nanos) + Unit::Second * 1.0;
                if leap_seconds_at(midnight) - offset != 1.0 {
                    return Err(OemError::Validation(format!(
                        "Invalid epoch '{text}': no leap second at the end of this day"
                    )));
                }
                reading + Unit::Second * (offset + 1.0)
            }
            Calendar::Utc => reading + Unit::Second * leap_seconds_at(reading),
        };

        Ok(OemEpoch {
            instant: Epoch::from_tai_duration(tai),
            calendar,
        })
    }

    /// Build an epoch from a hifitime instant, labelled in the given calendar.
    pub fn from_hifitime(instant: Epoch, calendar: Calendar) -> Self {
        OemEpoch {
            instant: Epoch::from_tai_duration(instant.to_tai_duration()),
            calendar,
        }
    }

    pub fn instant(&self) -> Epoch {
        self.instant
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    /// Elapsed seconds from `origin` to `self`.
    pub fn seconds_since(&self, origin: &OemEpoch) -> f64 {
        (self.instant.to_tai_duration() - origin.instant.to_tai_duration()).to_seconds()
    }

    /// Epoch shifted by `seconds` (may be negative).
    pub fn add_seconds(&self, seconds: f64) -> Self {
        OemEpoch {
            instant: self.instant + Unit::Second * seconds,
            calendar: self.calendar,
        }
    }

    /// Format as `YYYY-MM-DDThh:mm:ss.ffffff`, rounded to [`EPOCH_FRACTION_DIGITS`] digits.
    pub fn format(&self) -> String {
        let scale = 10u32.pow(9 - EPOCH_FRACTION_DIGITS as u32);
        let tai = self
            .instant
            .round(Unit::Nanosecond * f64::from(scale))
            .to_tai_duration();
        let (reading, leap) = match self.calendar {
            Calendar::Utc => utc_reading(tai),
            Calendar::Uniform => (tai, false),
        };
        let (year, month, day, hour, minute, second, nanos) =
            Epoch::from_tai_duration(reading).to_gregorian_tai();
        let second = if leap { 60 } else { second };
        format!(
            "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}.{:0width$}",
            nanos / scale,
            width = EPOCH_FRACTION_DIGITS
        )
    }
}

impl PartialEq for OemEpoch {
    fn eq(&self, other: &Self) -> bool {
        self.calendar == other.calendar
            && self.instant.to_tai_duration() == other.instant.to_tai_duration()
    }
}

impl Eq for OemEpoch {}

impl PartialOrd for OemEpoch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OemEpoch {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant
            .to_tai_duration()
            .cmp(&other.instant.to_tai_duration())
            .then(self.calendar.cmp(&other.calendar))
    }
}

/// `a - b` is the elapsed time from `b` to `a`, in seconds.
impl Sub for OemEpoch {
    type Output = f64;

    fn sub(self, rhs: Self) -> f64 {
        self.seconds_since(&rhs)
    }
}

impl fmt::Display for OemEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// Parse an OEM date string in the calendar of `time_system`.
pub fn parse_epoch(text: &str, time_system: &TimeSystem) -> Result<OemEpoch, OemError> {
    OemEpoch::parse(text, time_system.calendar())
}

pub fn format_epoch(epoch: &OemEpoch) -> String {
    epoch.format()
}

/// IERS leap-second count (TAI - UTC) in effect at a duration since J1900.
fn leap_seconds_at(duration: Duration) -> f64 {
    Epoch::from_tai_duration(duration)
        .leap_seconds(true)
        .unwrap_or(0.0)
}

/// UTC calendar reading of a TAI duration, and whether it lies inside a leap second.
///
/// During a leap second the reading is the preceding `23:59:59` second.
fn utc_reading(tai: Duration) -> (Duration, bool) {
    let after = leap_seconds_at(tai);
    let reading = tai - Unit::Second * after;
    let before = leap_seconds_at(reading);
    if before == after {
        return (reading, false);
    }
    let earlier = tai - Unit::Second * before;
    if leap_seconds_at(earlier) == before {
        return (earlier, false);
    }
    (reading, true)
}

fn fraction_to_nanos(fraction: &str) -> u32 {
    let digits: String = fraction.chars().take(9).collect();
    if digits.is_empty() {
        return 0;
    }
    let value = digits.parse::<u32>().unwrap_or(0);
    value * 10u32.pow(9 - digits.len() as u32)
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

fn month_day_from_ordinal(year: i32, ordinal: u16) -> Option<(u8, u8)> {
    let mut remaining = ordinal;
    if remaining == 0 {
        return None;
    }
    for month in 1..=12u8 {
        let days = days_in_month(year, month) as u16;
        if remaining <= days {
            return Some((month, remaining as u8));
        }
        remaining -= days;
    }
    None
}

/// Fixed-step epoch iterator over `[start, stop]`.
///
/// Yields `start + k * step` while strictly before `stop`, then `stop` itself, so the
/// closing epoch of the range is always sampled.
#[derive(Debug, Clone)]
pub struct TimeRange {
    start: OemEpoch,
    stop: OemEpoch,
    step: f64,
    index: u64,
    done: bool,
}

impl TimeRange {
    pub fn new(start: OemEpoch, stop: OemEpoch, step: f64) -> Result<Self, OemError> {
        if !(step.is_finite() && step > 0.0) {
            return Err(OemError::Validation(format!(
                "Step size must be a positive number of seconds, got {step}"
            )));
        }
        Ok(TimeRange {
            start,
            stop,
            step,
            index: 0,
            done: stop < start,
        })
    }
}

impl Iterator for TimeRange {
    type Item = OemEpoch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let epoch = self.start.add_seconds(self.index as f64 * self.step);
        self.index += 1;
        if epoch < self.stop {
            Some(epoch)
        } else {
            self.done = true;
            Some(self.stop)
        }
    }
}
