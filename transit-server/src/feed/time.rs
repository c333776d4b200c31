//! Service-day time handling.
//!
//! Feeds give arrival and departure times as "HH:MM:SS" strings measured
//! from the start of the service day. Hours may reach 24 or beyond for
//! trips that run past midnight, so these are not wall-clock times and
//! cannot be represented by `NaiveTime`.

use std::cmp::Ordering;
use std::fmt;

use chrono::{Duration, Local, NaiveTime, Timelike};

use super::error::TimeError;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;

/// A time of the service day, possibly past midnight.
///
/// # Examples
///
/// ```
/// use transit_server::feed::ServiceTime;
///
/// let late = ServiceTime::parse("25:10:00").unwrap();
/// assert_eq!(late.hour(), 25);
/// assert_eq!(late.to_string(), "25:10:00");
///
/// // Seconds may be omitted when reading
/// assert_eq!(ServiceTime::parse("08:30").unwrap().to_string(), "08:30:00");
///
/// assert!(ServiceTime::parse("0830").is_err());
/// assert!(ServiceTime::parse("ab:30:00").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceTime {
    secs: u64,
}

impl ServiceTime {
    /// Create a time from its components.
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Self {
        Self {
            secs: hour as u64 * SECS_PER_HOUR + minute as u64 * SECS_PER_MINUTE + second as u64,
        }
    }

    /// Create a time from a wall-clock time, dropping fractional seconds.
    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self::from_hms(time.hour(), time.minute(), time.second())
    }

    /// The current local wall-clock time.
    pub fn now() -> Self {
        Self::from_naive_time(Local::now().time())
    }

    /// Parse a colon-separated time leniently.
    ///
    /// Accepts two or three numeric components (`HH:MM` or `HH:MM:SS`).
    /// Component ranges are not checked, so "10:75:00" reads as 11:15:00.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() < 2 {
            return Err(TimeError::new(s, "expected HH:MM:SS"));
        }
        if parts.len() > 3 {
            return Err(TimeError::new(s, "too many components"));
        }

        let mut components = [0u32; 3];
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = part
                .trim()
                .parse()
                .map_err(|_| TimeError::new(s, "non-numeric component"))?;
        }

        Ok(Self::from_hms(components[0], components[1], components[2]))
    }

    /// Parse a time in strict "HH:MM:SS" form.
    ///
    /// Hours need at least two digits and may exceed 23; minutes and seconds
    /// are exactly two digits in 00-59. This is the form accepted when a
    /// time is edited, as opposed to [`ServiceTime::parse`] used for reading.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_server::feed::ServiceTime;
    ///
    /// assert!(ServiceTime::parse_hms("08:30:00").is_ok());
    /// assert!(ServiceTime::parse_hms("24:05:00").is_ok());
    ///
    /// assert!(ServiceTime::parse_hms("08:30").is_err());
    /// assert!(ServiceTime::parse_hms("8:30:00").is_err());
    /// assert!(ServiceTime::parse_hms("08:60:00").is_err());
    /// ```
    pub fn parse_hms(s: &str) -> Result<Self, TimeError> {
        let mut parts = s.split(':');
        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TimeError::new(s, "expected HH:MM:SS"));
        };

        if h.len() < 2 || !h.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TimeError::new(s, "invalid hour digits"));
        }
        let hour = h
            .parse()
            .map_err(|_| TimeError::new(s, "hour out of range"))?;

        let minute = parse_two_digits(m).ok_or_else(|| TimeError::new(s, "invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new(s, "minute must be 0-59"));
        }

        let second = parse_two_digits(sec).ok_or_else(|| TimeError::new(s, "invalid second digits"))?;
        if second > 59 {
            return Err(TimeError::new(s, "second must be 0-59"));
        }

        Ok(Self::from_hms(hour, minute, second))
    }

    /// Seconds since the start of the service day.
    pub fn total_seconds(&self) -> u64 {
        self.secs
    }

    pub fn hour(&self) -> u64 {
        self.secs / SECS_PER_HOUR
    }

    pub fn minute(&self) -> u64 {
        self.secs % SECS_PER_HOUR / SECS_PER_MINUTE
    }

    pub fn second(&self) -> u64 {
        self.secs % SECS_PER_MINUTE
    }

    /// Returns the signed duration from `self` until `later`.
    ///
    /// Negative if `later` is actually earlier than `self`.
    pub fn duration_until(&self, later: ServiceTime) -> Duration {
        Duration::seconds(later.secs as i64 - self.secs as i64)
    }
}

/// Signed difference between two "HH:MM:SS" strings, `t2` minus `t1`.
///
/// Both sides are converted to seconds since the start of the service day
/// before subtracting, so the result is non-negative exactly when `t2` is
/// not earlier than `t1`.
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use transit_server::feed::time_difference;
///
/// assert_eq!(time_difference("00:10:00", "00:00:30").unwrap(), Duration::seconds(-570));
/// assert_eq!(time_difference("23:50:00", "24:10:00").unwrap(), Duration::minutes(20));
/// assert!(time_difference("noon", "13:00:00").is_err());
/// ```
pub fn time_difference(t1: &str, t2: &str) -> Result<Duration, TimeError> {
    let from = ServiceTime::parse(t1)?;
    let to = ServiceTime::parse(t2)?;
    Ok(from.duration_until(to))
}

impl Ord for ServiceTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.secs.cmp(&other.secs)
    }
}

impl PartialOrd for ServiceTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceTime({self})")
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

/// Parse exactly two ASCII digits into a u32.
fn parse_two_digits(s: &str) -> Option<u32> {
    let bytes = s.as_bytes();
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Difference is negative exactly when the second time is earlier
        #[test]
        fn difference_sign_matches_order(a in 0u32..100_000, b in 0u32..100_000) {
            let t1 = ServiceTime::from_hms(0, 0, a);
            let t2 = ServiceTime::from_hms(0, 0, b);
            let diff = time_difference(&t1.to_string(), &t2.to_string()).unwrap();
            prop_assert_eq!(diff < Duration::zero(), t2 < t1);
            prop_assert_eq!(diff.num_seconds(), b as i64 - a as i64);
        }

        /// Strictly formatted times always parse strictly
        #[test]
        fn display_parses_strictly(h in 0u32..48, m in 0u32..60, s in 0u32..60) {
            let t = ServiceTime::from_hms(h, m, s);
            prop_assert_eq!(ServiceTime::parse_hms(&t.to_string()).unwrap(), t);
        }
    }
}
