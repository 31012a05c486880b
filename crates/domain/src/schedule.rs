use crate::errors::DomainError;
use chrono::Weekday;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduleMode {
    Sleep,
    Custom,
}

/// Minute-of-day window, validated `00:00..23:59`, with optional
/// midnight wrap (spec §4.2 "Schedule active-now").
#[derive(Debug, Clone)]
pub struct Schedule {
    pub id: Option<i64>,
    pub days: Vec<Weekday>,
    pub start_minute: u16,
    pub end_minute: u16,
    pub active: bool,
    pub mode: ScheduleMode,
    pub block_all: Option<bool>,
    pub blocked_categories: Vec<String>,
    pub blocked_apps: Vec<String>,
}

/// Parse `"HH:MM"` into minutes since midnight, validating the range.
pub fn parse_time_to_minutes(s: &str) -> Result<u16, DomainError> {
    let (h, m) = s
        .split_once(':')
        .ok_or_else(|| DomainError::InvalidTime(s.to_string()))?;
    let h: u16 = h.parse().map_err(|_| DomainError::InvalidTime(s.to_string()))?;
    let m: u16 = m.parse().map_err(|_| DomainError::InvalidTime(s.to_string()))?;
    if h > 23 || m > 59 {
        return Err(DomainError::InvalidTime(s.to_string()));
    }
    Ok(h * 60 + m)
}

impl Schedule {
    pub fn new(
        days: Vec<Weekday>,
        start_time: &str,
        end_time: &str,
        mode: ScheduleMode,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id: None,
            days,
            start_minute: parse_time_to_minutes(start_time)?,
            end_minute: parse_time_to_minutes(end_time)?,
            active: true,
            mode,
            block_all: None,
            blocked_categories: Vec::new(),
            blocked_apps: Vec::new(),
        })
    }

    /// Whether this schedule is in effect at `now` (local time).
    ///
    /// A schedule with `start > end` wraps midnight: active iff
    /// minute-of-day is at or after `start` OR strictly before `end`, and
    /// today is one of `days`. Non-wrapping: `start <= now < end`.
    pub fn is_active_at(&self, weekday: Weekday, minute_of_day: u16) -> bool {
        if !self.active || !self.days.contains(&weekday) {
            return false;
        }

        if self.start_minute > self.end_minute {
            minute_of_day >= self.start_minute || minute_of_day < self.end_minute
        } else {
            minute_of_day >= self.start_minute && minute_of_day < self.end_minute
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday::*;

    #[test]
    fn parse_time_bounds() {
        assert_eq!(parse_time_to_minutes("00:00").unwrap(), 0);
        assert_eq!(parse_time_to_minutes("23:59").unwrap(), 23 * 60 + 59);
        assert!(parse_time_to_minutes("24:00").is_err());
        assert!(parse_time_to_minutes("12:60").is_err());
        assert!(parse_time_to_minutes("garbage").is_err());
    }

    #[test]
    fn non_wrapping_window() {
        let s = Schedule::new(vec![Mon, Tue], "09:00", "17:00", ScheduleMode::Custom).unwrap();
        assert!(s.is_active_at(Mon, 9 * 60));
        assert!(s.is_active_at(Mon, 16 * 60 + 59));
        assert!(!s.is_active_at(Mon, 17 * 60));
        assert!(!s.is_active_at(Wed, 10 * 60));
    }

    #[test]
    fn wrapping_window() {
        let s = Schedule::new(vec![Fri, Sat], "22:00", "06:00", ScheduleMode::Sleep).unwrap();
        assert!(s.is_active_at(Fri, 23 * 60));
        assert!(s.is_active_at(Sat, 1 * 60));
        assert!(!s.is_active_at(Fri, 12 * 60));
        assert!(!s.is_active_at(Sun, 1 * 60));
    }
}
